// Injury lifecycle service: recording, availability, recovery sweeps, and
// the injured-reserve state machine with its NFL-style numeric constraints.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::audit::AuditLog;
use crate::config::Rules;
use crate::db::{
    tx_increment_ir_slots, tx_ir_injury_for_player, tx_ir_slots_used, tx_mark_activated, Database,
};
use crate::roster::{RosterProvider, RosterStatus};

use super::types::Injury;

/// One cut-and-activate pair inside an atomic batch.
#[derive(Debug, Clone)]
pub struct IrActivation {
    /// IR player to bring back to the active roster.
    pub activate_player_id: String,
    /// Active-roster player released to make room.
    pub cut_player_id: String,
}

/// Result of an atomic batch of IR activations. On `success == false` no
/// mutation from any pair was retained.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub success: bool,
    /// Player ids activated from IR.
    pub activated: Vec<String>,
    /// Player ids released to make room.
    pub released: Vec<String>,
    /// Human-readable reasons when the batch aborted.
    pub errors: Vec<String>,
}

/// Internal sentinel distinguishing a validation abort (reported in the
/// outcome) from a real storage failure (propagated).
#[derive(Debug, Error)]
#[error("{reason}")]
struct BatchAbort {
    reason: String,
}

fn abort(reason: String) -> anyhow::Error {
    anyhow::Error::new(BatchAbort { reason })
}

/// CRUD and state transitions over injury records for one dynasty season.
///
/// Holds no injury state in memory: every read re-queries storage, which is
/// what keeps availability answers fresh when several call sites check the
/// same player within one simulation tick.
pub struct InjuryService {
    db: Arc<Database>,
    roster: Arc<dyn RosterProvider>,
    audit: Arc<dyn AuditLog>,
    rules: Rules,
    dynasty_id: String,
    season: u32,
}

impl InjuryService {
    pub fn new(
        db: Arc<Database>,
        roster: Arc<dyn RosterProvider>,
        audit: Arc<dyn AuditLog>,
        rules: Rules,
        dynasty_id: impl Into<String>,
        season: u32,
    ) -> Self {
        InjuryService {
            db,
            roster,
            audit,
            rules,
            dynasty_id: dynasty_id.into(),
            season,
        }
    }

    pub fn dynasty_id(&self) -> &str {
        &self.dynasty_id
    }

    pub fn season(&self) -> u32 {
        self.season
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Best-effort audit: failures become a warning and never surface.
    fn audit_event(
        &self,
        kind: &str,
        player_id: &str,
        team_id: &str,
        details: serde_json::Value,
    ) {
        if let Err(err) = self.audit.log(kind, player_id, team_id, details) {
            warn!(kind, player_id, error = %err, "audit log failed; continuing");
        }
    }

    // ------------------------------------------------------------------
    // Recording and availability
    // ------------------------------------------------------------------

    /// Persist a new active injury and return its row id.
    pub fn record(&self, injury: &Injury) -> Result<i64> {
        let id = self.db.insert_injury(&self.dynasty_id, injury)?;
        self.audit_event(
            "injury",
            &injury.player_id,
            &injury.team_id,
            serde_json::json!({
                "injury_id": id,
                "injury_type": injury.injury_type.display_str(),
                "severity": injury.severity.display_str(),
                "weeks_out": injury.weeks_out,
                "week_occurred": injury.week_occurred,
                "occurred_during": injury.occurred_during.display_str(),
            }),
        );
        Ok(id)
    }

    /// Whether the player can take the field: true iff they carry no active
    /// injury. Generation callers use this to skip unavailable players, which
    /// is what keeps "at most one active injury per player" an invariant.
    pub fn is_available(&self, player_id: &str) -> Result<bool> {
        Ok(!self.db.has_active_injury(&self.dynasty_id, player_id)?)
    }

    /// Load a single injury by id.
    pub fn get(&self, injury_id: i64) -> Result<Option<Injury>> {
        self.db.get_injury(&self.dynasty_id, injury_id)
    }

    /// All active injuries for a team this season.
    pub fn team_injuries(&self, team_id: &str) -> Result<Vec<Injury>> {
        self.db
            .active_injuries_for_team(&self.dynasty_id, team_id, self.season)
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    /// Active, non-IR injuries whose estimated return week has arrived.
    /// Read-only; callers clear each injury explicitly.
    pub fn check_recovery(&self, current_week: u32) -> Result<Vec<Injury>> {
        self.db
            .recoverable_injuries(&self.dynasty_id, self.season, current_week)
    }

    /// Confirm a recovery: deactivate the injury. When `actual_weeks_out` is
    /// omitted the original estimate is recorded. Returns `false` if the
    /// injury does not exist.
    pub fn clear(&self, injury_id: i64, actual_weeks_out: Option<u32>) -> Result<bool> {
        let Some(injury) = self.db.get_injury(&self.dynasty_id, injury_id)? else {
            debug!(injury_id, "clear: injury not found");
            return Ok(false);
        };
        let actual = actual_weeks_out.unwrap_or(injury.weeks_out);
        self.db.clear_injury(&self.dynasty_id, injury_id, actual)?;
        self.audit_event(
            "injury_cleared",
            &injury.player_id,
            &injury.team_id,
            serde_json::json!({ "injury_id": injury_id, "actual_weeks_out": actual }),
        );
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Injured reserve
    // ------------------------------------------------------------------

    /// Place a player on injured reserve. Returns `false` (never errors) when
    /// the injury is missing or inactive, the player is already on IR, or the
    /// estimated absence is below the IR minimum.
    pub fn place_on_ir(&self, player_id: &str, injury_id: i64) -> Result<bool> {
        let Some(injury) = self.db.get_injury(&self.dynasty_id, injury_id)? else {
            debug!(injury_id, "place_on_ir: injury not found");
            return Ok(false);
        };
        if injury.player_id != player_id || !injury.is_active {
            debug!(injury_id, player_id, "place_on_ir: no active injury for player");
            return Ok(false);
        }
        if injury.on_ir {
            debug!(injury_id, player_id, "place_on_ir: already on IR");
            return Ok(false);
        }
        if injury.weeks_out < self.rules.roster.ir_min_weeks {
            debug!(
                injury_id,
                weeks_out = injury.weeks_out,
                "place_on_ir: injury too short for IR"
            );
            return Ok(false);
        }

        let placement_date = today();
        self.db
            .mark_on_ir(&self.dynasty_id, injury_id, &placement_date)?;
        self.roster
            .set_roster_status(&self.dynasty_id, player_id, RosterStatus::InjuredReserve)
            .context("failed to flip roster status to injured reserve")?;
        self.audit_event(
            "ir_placement",
            player_id,
            &injury.team_id,
            serde_json::json!({
                "injury_id": injury_id,
                "weeks_out": injury.weeks_out,
                "placement_date": placement_date,
            }),
        );
        Ok(true)
    }

    /// Activate a player from injured reserve. Returns `false` when there is
    /// no active IR injury, fewer than the minimum weeks have elapsed, the
    /// team has no return slots left, or the active roster is at the cap.
    pub fn activate_from_ir(&self, player_id: &str, current_week: u32) -> Result<bool> {
        let Some(injury) = self.db.ir_injury_for_player(&self.dynasty_id, player_id)? else {
            debug!(player_id, "activate_from_ir: no active IR injury");
            return Ok(false);
        };
        let injury_id = injury.id.context("stored injury missing row id")?;

        if current_week.saturating_sub(injury.week_occurred) < self.rules.roster.ir_min_weeks {
            debug!(player_id, current_week, "activate_from_ir: too soon");
            return Ok(false);
        }
        if self.ir_return_slots_remaining(&injury.team_id)? == 0 {
            debug!(player_id, "activate_from_ir: no IR-return slots left");
            return Ok(false);
        }
        let roster_count = self
            .roster
            .active_roster_count(&self.dynasty_id, &injury.team_id)?;
        if roster_count >= self.rules.roster.active_roster_cap {
            debug!(player_id, roster_count, "activate_from_ir: roster at cap");
            return Ok(false);
        }

        let return_date = today();
        self.db.with_exclusive(|tx| {
            tx_mark_activated(tx, &self.dynasty_id, injury_id, &return_date)?;
            tx_increment_ir_slots(tx, &self.dynasty_id, &injury.team_id, self.season)
        })?;
        self.roster
            .set_roster_status(&self.dynasty_id, player_id, RosterStatus::Active)
            .context("failed to restore roster status")?;
        self.audit_event(
            "ir_activation",
            player_id,
            &injury.team_id,
            serde_json::json!({ "injury_id": injury_id, "return_date": return_date }),
        );
        Ok(true)
    }

    /// IR-return activations a team may still use this season.
    pub fn ir_return_slots_remaining(&self, team_id: &str) -> Result<u32> {
        let used = self
            .db
            .ir_slots_used(&self.dynasty_id, team_id, self.season)?;
        Ok(self.rules.roster.ir_return_slots.saturating_sub(used))
    }

    // ------------------------------------------------------------------
    // Atomic batch IR activation
    // ------------------------------------------------------------------

    /// Execute a batch of cut-and-activate pairs atomically: either every
    /// pair's roster, IR, and slot mutations stick, or none do.
    ///
    /// The connection mutex plus a single transaction form the exclusive
    /// write scope; roster-status changes through the collaborator are
    /// recorded and compensated in reverse order on abort, so no partial
    /// application is observable afterwards.
    pub fn execute_batch_ir_activations(
        &self,
        team_id: &str,
        pairs: &[IrActivation],
        current_week: u32,
    ) -> Result<BatchOutcome> {
        if pairs.is_empty() {
            return Ok(BatchOutcome {
                success: true,
                ..BatchOutcome::default()
            });
        }

        let today = today();
        let mut roster_undo: Vec<(String, RosterStatus)> = Vec::new();
        let result = self.db.with_exclusive(|tx| {
            let mut activated: Vec<String> = Vec::new();
            let mut released: Vec<String> = Vec::new();

            for pair in pairs {
                let injury =
                    tx_ir_injury_for_player(tx, &self.dynasty_id, &pair.activate_player_id)?
                        .ok_or_else(|| {
                            abort(format!(
                                "no active IR injury for player {}",
                                pair.activate_player_id
                            ))
                        })?;
                let injury_id = injury.id.context("stored injury missing row id")?;
                if injury.team_id != team_id {
                    return Err(abort(format!(
                        "player {} is not on team {team_id}",
                        pair.activate_player_id
                    )));
                }
                if current_week.saturating_sub(injury.week_occurred)
                    < self.rules.roster.ir_min_weeks
                {
                    return Err(abort(format!(
                        "player {} has not served the IR minimum",
                        pair.activate_player_id
                    )));
                }
                let used = tx_ir_slots_used(tx, &self.dynasty_id, team_id, self.season)?;
                if used >= self.rules.roster.ir_return_slots {
                    return Err(abort(format!(
                        "team {team_id} has no IR-return slots remaining"
                    )));
                }

                // Cut first so the activation's roster-cap check sees the
                // freed spot.
                let cut_status = self
                    .roster
                    .roster_status(&self.dynasty_id, &pair.cut_player_id)?
                    .ok_or_else(|| {
                        abort(format!("cut candidate {} not found", pair.cut_player_id))
                    })?;
                if cut_status != RosterStatus::Active {
                    return Err(abort(format!(
                        "cut candidate {} is not on the active roster",
                        pair.cut_player_id
                    )));
                }
                self.roster.set_roster_status(
                    &self.dynasty_id,
                    &pair.cut_player_id,
                    RosterStatus::Released,
                )?;
                roster_undo.push((pair.cut_player_id.clone(), cut_status));

                let roster_count = self.roster.active_roster_count(&self.dynasty_id, team_id)?;
                if roster_count >= self.rules.roster.active_roster_cap {
                    return Err(abort(format!(
                        "team {team_id} active roster is at the cap"
                    )));
                }

                tx_mark_activated(tx, &self.dynasty_id, injury_id, &today)?;
                tx_increment_ir_slots(tx, &self.dynasty_id, team_id, self.season)?;
                self.roster.set_roster_status(
                    &self.dynasty_id,
                    &pair.activate_player_id,
                    RosterStatus::Active,
                )?;
                roster_undo.push((pair.activate_player_id.clone(), RosterStatus::InjuredReserve));

                activated.push(pair.activate_player_id.clone());
                released.push(pair.cut_player_id.clone());
            }

            Ok((activated, released))
        });

        match result {
            Ok((activated, released)) => {
                for (activated_id, released_id) in activated.iter().zip(&released) {
                    self.audit_event(
                        "ir_batch_activation",
                        activated_id,
                        team_id,
                        serde_json::json!({ "released": released_id, "week": current_week }),
                    );
                }
                Ok(BatchOutcome {
                    success: true,
                    activated,
                    released,
                    errors: Vec::new(),
                })
            }
            Err(err) => {
                // The transaction already rolled back; compensate the roster
                // collaborator in reverse order.
                for (player_id, status) in roster_undo.iter().rev() {
                    if let Err(undo_err) =
                        self.roster
                            .set_roster_status(&self.dynasty_id, player_id, *status)
                    {
                        warn!(player_id, error = %undo_err, "failed to undo roster mutation");
                    }
                }
                match err.downcast::<BatchAbort>() {
                    Ok(aborted) => {
                        debug!(team_id, reason = %aborted.reason, "IR batch aborted");
                        Ok(BatchOutcome {
                            success: false,
                            activated: Vec::new(),
                            released: Vec::new(),
                            errors: vec![aborted.reason],
                        })
                    }
                    Err(storage_err) => Err(storage_err),
                }
            }
        }
    }
}

/// UTC calendar date used for IR placement/return stamps.
fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}
