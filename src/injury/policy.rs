// AI roster-management policy: weekly per-team IR escalation/activation
// sweep plus the selective, cut-aware batch path.

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::roster::{CutRanking, RosterProvider};

use super::service::{BatchOutcome, InjuryService, IrActivation};
use super::types::{Injury, InjurySeverity};

/// Per-team, per-week sweep results handed back to the season orchestrator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WeeklySummary {
    pub team_id: String,
    pub week: u32,
    pub ir_placements: u32,
    pub ir_activations: u32,
    /// Human-readable event strings for the week's transactions.
    pub events: Vec<String>,
}

/// Outcome of the selective batch path for one team.
#[derive(Debug, Clone, Serialize)]
pub struct SelectiveSummary {
    pub team_id: String,
    pub outcome: BatchOutcome,
    /// Activations considered but skipped, with reasons. Skips are events,
    /// not errors.
    pub skipped: Vec<String>,
}

/// Automated IR management for AI-controlled teams.
///
/// Escalations always run before activations within a team: moving a hurt
/// player to IR changes the roster occupancy the activation cap-check reads.
pub struct RosterPolicy {
    service: Arc<InjuryService>,
    roster: Arc<dyn RosterProvider>,
    cuts: Arc<dyn CutRanking>,
}

impl RosterPolicy {
    pub fn new(
        service: Arc<InjuryService>,
        roster: Arc<dyn RosterProvider>,
        cuts: Arc<dyn CutRanking>,
    ) -> Self {
        RosterPolicy {
            service,
            roster,
            cuts,
        }
    }

    /// Whether the weekly sweep should move this injury to IR.
    fn should_escalate(&self, injury: &Injury) -> bool {
        injury.severity >= InjurySeverity::Severe
            || injury.weeks_out >= self.service.rules().roster.ir_min_weeks
    }

    /// Run the weekly sweep for one AI-controlled team.
    pub fn run_week(&self, team_id: &str, current_week: u32) -> Result<WeeklySummary> {
        let mut summary = WeeklySummary {
            team_id: team_id.to_string(),
            week: current_week,
            ..WeeklySummary::default()
        };

        let injuries = self.service.team_injuries(team_id)?;

        // Escalations first.
        for injury in injuries.iter().filter(|i| !i.on_ir) {
            if !self.should_escalate(injury) {
                continue;
            }
            let Some(injury_id) = injury.id else { continue };
            if self.service.place_on_ir(&injury.player_id, injury_id)? {
                summary.ir_placements += 1;
                summary.events.push(format!(
                    "{} placed on IR ({}, out ~{} weeks)",
                    injury.player_name,
                    injury.injury_type.display_str(),
                    injury.weeks_out
                ));
            }
        }

        // Activations for IR players whose estimated return has arrived.
        for injury in injuries.iter().filter(|i| i.on_ir) {
            if injury.estimated_return_week() > current_week {
                continue;
            }
            if self.service.ir_return_slots_remaining(team_id)? == 0 {
                debug!(team_id, "weekly sweep: IR-return slots exhausted");
                break;
            }
            if self.service.activate_from_ir(&injury.player_id, current_week)? {
                summary.ir_activations += 1;
                summary
                    .events
                    .push(format!("{} activated from IR", injury.player_name));
            }
        }

        info!(
            team_id,
            week = current_week,
            placements = summary.ir_placements,
            activations = summary.ir_activations,
            "weekly IR sweep complete"
        );
        Ok(summary)
    }

    /// Run the weekly sweep for every AI team, skipping the user-controlled
    /// team entirely.
    pub fn run_league_week(
        &self,
        team_ids: &[String],
        user_team_id: Option<&str>,
        current_week: u32,
    ) -> Result<Vec<WeeklySummary>> {
        let mut summaries = Vec::new();
        for team_id in team_ids {
            if Some(team_id.as_str()) == user_team_id {
                continue;
            }
            summaries.push(self.run_week(team_id, current_week)?);
        }
        Ok(summaries)
    }

    /// Whether the selective heuristic wants this IR player back on the
    /// roster. Keeps marginal backups on IR late in the season.
    fn wants_activation(
        &self,
        overall: u8,
        healthy_depth: usize,
        same_position_injuries: usize,
        weeks_remaining: u32,
    ) -> bool {
        let policy = &self.service.rules().policy;
        if weeks_remaining < policy.min_weeks_remaining {
            return false;
        }
        if overall < policy.min_activation_overall {
            return false;
        }
        let thin = healthy_depth < policy.position_depth_floor;
        let star_with_runway = overall >= policy.aggressive_activation_overall
            && weeks_remaining >= policy.aggressive_weeks_remaining;
        let emergency = same_position_injuries >= policy.position_injury_emergency;
        thin || star_with_runway || emergency
    }

    /// Selective, cut-aware activation for one team: pick IR players worth
    /// bringing back, pair each with the worst unprotected roster player, and
    /// execute all pairs as one atomic batch.
    pub fn run_selective_activations(
        &self,
        team_id: &str,
        current_week: u32,
        season_length: u32,
    ) -> Result<SelectiveSummary> {
        let dynasty_id = self.service.dynasty_id().to_string();
        let weeks_remaining = season_length.saturating_sub(current_week);
        let injuries = self.service.team_injuries(team_id)?;
        let active = self.roster.active_players(&dynasty_id, team_id)?;

        let mut skipped: Vec<String> = Vec::new();
        let mut pairs: Vec<IrActivation> = Vec::new();
        let mut claimed_cuts: Vec<String> = Vec::new();

        let mut slots = self.service.ir_return_slots_remaining(team_id)?;
        for injury in injuries.iter().filter(|i| i.on_ir) {
            if injury.estimated_return_week() > current_week {
                continue;
            }
            if slots == 0 {
                skipped.push(format!(
                    "{}: no IR-return slots remaining",
                    injury.player_name
                ));
                break;
            }
            let Some(snapshot) = self.roster.player(&dynasty_id, &injury.player_id)? else {
                skipped.push(format!("{}: not found on roster", injury.player_name));
                continue;
            };

            // Depth counts only healthy players: actives carrying an injury
            // of their own don't help the position.
            let healthy_depth = active
                .iter()
                .filter(|p| {
                    p.position == injury.position
                        && !injuries.iter().any(|i| i.player_id == p.player_id)
                })
                .count();
            let same_position_injuries = injuries
                .iter()
                .filter(|i| i.position == injury.position && i.player_id != injury.player_id)
                .count();

            if !self.wants_activation(
                snapshot.overall,
                healthy_depth,
                same_position_injuries,
                weeks_remaining,
            ) {
                debug!(
                    player = %injury.player_name,
                    overall = snapshot.overall,
                    healthy_depth,
                    weeks_remaining,
                    "selective activation: not worth a roster move"
                );
                continue;
            }

            // Worst unprotected player not already claimed by an earlier pair.
            let candidates = self
                .cuts
                .cut_candidates(&dynasty_id, team_id, pairs.len() + 1)?;
            let cut = candidates
                .iter()
                .find(|c| !c.protected && !claimed_cuts.contains(&c.player_id));
            let Some(cut) = cut else {
                skipped.push(format!(
                    "{}: no unprotected cut candidate available",
                    injury.player_name
                ));
                continue;
            };

            claimed_cuts.push(cut.player_id.clone());
            pairs.push(IrActivation {
                activate_player_id: injury.player_id.clone(),
                cut_player_id: cut.player_id.clone(),
            });
            slots -= 1;
        }

        let outcome = self
            .service
            .execute_batch_ir_activations(team_id, &pairs, current_week)?;
        for event in &skipped {
            info!(team_id, %event, "selective activation skipped");
        }
        Ok(SelectiveSummary {
            team_id: team_id.to_string(),
            outcome,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAudit;
    use crate::config::Rules;
    use crate::db::Database;
    use crate::injury::types::{BodyPart, GameContext, InjuryType};
    use crate::roster::{MemoryRoster, PlayerSnapshot, RosterStatus};

    const DYN: &str = "dyn_pol";
    const TEAM: &str = "team_1";
    const SEASON: u32 = 2025;

    struct Fixture {
        service: Arc<InjuryService>,
        roster: Arc<MemoryRoster>,
        policy: RosterPolicy,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(Database::open(":memory:").unwrap());
        let roster = Arc::new(MemoryRoster::new());
        let service = Arc::new(InjuryService::new(
            db,
            roster.clone(),
            Arc::new(MemoryAudit::new()),
            Rules::default(),
            DYN,
            SEASON,
        ));
        let policy = RosterPolicy::new(service.clone(), roster.clone(), roster.clone());
        Fixture {
            service,
            roster,
            policy,
        }
    }

    fn snapshot(id: &str, pos: &str, overall: u8) -> PlayerSnapshot {
        PlayerSnapshot {
            player_id: id.to_string(),
            name: format!("Player {id}"),
            team_id: TEAM.to_string(),
            position: pos.to_string(),
            durability: 80,
            age: 26,
            injury_history_count: 0,
            overall,
        }
    }

    fn injury(
        player_id: &str,
        pos: &str,
        severity: InjurySeverity,
        weeks_out: u32,
        week_occurred: u32,
    ) -> Injury {
        Injury {
            id: None,
            player_id: player_id.to_string(),
            player_name: format!("Player {player_id}"),
            team_id: TEAM.to_string(),
            position: pos.to_string(),
            injury_type: InjuryType::HamstringStrain,
            body_part: BodyPart::Hamstring,
            severity,
            weeks_out,
            actual_weeks_out: None,
            week_occurred,
            season: SEASON,
            occurred_during: GameContext::Game,
            game_id: None,
            play_description: None,
            is_active: true,
            on_ir: false,
            ir_placement_date: None,
            ir_return_date: None,
        }
    }

    fn add_active(fx: &Fixture, id: &str, pos: &str, overall: u8) {
        fx.roster
            .add_player(DYN, snapshot(id, pos, overall), RosterStatus::Active);
    }

    /// Injure `id`, escalate to IR at week `week_occurred`.
    fn put_on_ir(fx: &Fixture, id: &str, pos: &str, overall: u8, weeks_out: u32, week: u32) {
        fx.roster
            .add_player(DYN, snapshot(id, pos, overall), RosterStatus::Active);
        let injury_id = fx
            .service
            .record(&injury(id, pos, InjurySeverity::Severe, weeks_out, week))
            .unwrap();
        assert!(fx.service.place_on_ir(id, injury_id).unwrap());
    }

    // ------------------------------------------------------------------
    // Weekly sweep
    // ------------------------------------------------------------------

    #[test]
    fn sweep_escalates_severe_injuries_only() {
        let fx = fixture();
        add_active(&fx, "minor", "WR", 70);
        add_active(&fx, "severe", "RB", 80);
        fx.service
            .record(&injury("minor", "WR", InjurySeverity::Minor, 2, 1))
            .unwrap();
        fx.service
            .record(&injury("severe", "RB", InjurySeverity::Severe, 6, 1))
            .unwrap();

        let summary = fx.policy.run_week(TEAM, 1).unwrap();
        assert_eq!(summary.ir_placements, 1);
        assert_eq!(
            fx.roster.roster_status(DYN, "severe").unwrap(),
            Some(RosterStatus::InjuredReserve)
        );
        assert_eq!(
            fx.roster.roster_status(DYN, "minor").unwrap(),
            Some(RosterStatus::Active)
        );
    }

    #[test]
    fn sweep_escalates_long_moderate_injury() {
        let fx = fixture();
        add_active(&fx, "p1", "TE", 74);
        // Moderate but 4 weeks out crosses the IR-eligibility threshold.
        fx.service
            .record(&injury("p1", "TE", InjurySeverity::Moderate, 4, 2))
            .unwrap();

        let summary = fx.policy.run_week(TEAM, 2).unwrap();
        assert_eq!(summary.ir_placements, 1);
    }

    #[test]
    fn sweep_activates_when_return_week_arrives() {
        let fx = fixture();
        put_on_ir(&fx, "p1", "RB", 80, 5, 1); // return week 6

        let early = fx.policy.run_week(TEAM, 5).unwrap();
        assert_eq!(early.ir_activations, 0);

        let due = fx.policy.run_week(TEAM, 6).unwrap();
        assert_eq!(due.ir_activations, 1);
        assert_eq!(
            fx.roster.roster_status(DYN, "p1").unwrap(),
            Some(RosterStatus::Active)
        );
    }

    #[test]
    fn sweep_escalation_frees_roster_room_for_activation() {
        let fx = fixture();
        put_on_ir(&fx, "returning", "WR", 82, 4, 1); // return week 5

        // Fill the active roster to the cap, then hurt one of them badly.
        for i in 0..53 {
            add_active(&fx, &format!("fill_{i}"), "OLB", 70);
        }
        fx.service
            .record(&injury("fill_0", "OLB", InjurySeverity::SeasonEnding, 12, 5))
            .unwrap();

        let summary = fx.policy.run_week(TEAM, 6).unwrap();
        // The escalation runs first and opens the spot the activation needs.
        assert_eq!(summary.ir_placements, 1);
        assert_eq!(summary.ir_activations, 1);
        assert_eq!(fx.roster.active_roster_count(DYN, TEAM).unwrap(), 53);
    }

    #[test]
    fn league_sweep_skips_user_team() {
        let fx = fixture();
        add_active(&fx, "p1", "RB", 80);
        fx.service
            .record(&injury("p1", "RB", InjurySeverity::Severe, 6, 1))
            .unwrap();

        let summaries = fx
            .policy
            .run_league_week(&[TEAM.to_string()], Some(TEAM), 1)
            .unwrap();
        assert!(summaries.is_empty());
        // The user's injured player is untouched.
        assert_eq!(
            fx.roster.roster_status(DYN, "p1").unwrap(),
            Some(RosterStatus::Active)
        );
    }

    // ------------------------------------------------------------------
    // Selective batch path
    // ------------------------------------------------------------------

    #[test]
    fn selective_skips_marginal_backup() {
        let fx = fixture();
        put_on_ir(&fx, "backup", "WR", 68, 4, 1);
        for i in 0..4 {
            add_active(&fx, &format!("wr_{i}"), "WR", 75);
        }

        let summary = fx.policy.run_selective_activations(TEAM, 10, 18).unwrap();
        assert!(summary.outcome.success);
        assert!(summary.outcome.activated.is_empty());
        assert_eq!(
            fx.roster.roster_status(DYN, "backup").unwrap(),
            Some(RosterStatus::InjuredReserve)
        );
    }

    #[test]
    fn selective_activates_star_with_season_left() {
        let fx = fixture();
        put_on_ir(&fx, "star", "WR", 85, 4, 1);
        for i in 0..4 {
            add_active(&fx, &format!("wr_{i}"), "WR", 70 + i as u8);
        }

        // Week 10 of 18: 8 weeks remaining, star path applies.
        let summary = fx.policy.run_selective_activations(TEAM, 10, 18).unwrap();
        assert!(summary.outcome.success);
        assert_eq!(summary.outcome.activated, vec!["star".to_string()]);
        // Worst-overall unprotected player got cut.
        assert_eq!(summary.outcome.released, vec!["wr_0".to_string()]);
        assert_eq!(
            fx.roster.roster_status(DYN, "wr_0").unwrap(),
            Some(RosterStatus::Released)
        );
    }

    #[test]
    fn selective_respects_minimum_weeks_remaining() {
        let fx = fixture();
        put_on_ir(&fx, "star", "WR", 90, 4, 1);
        add_active(&fx, "wr_depth", "WR", 70);

        // Week 16 of 18: only 2 weeks left, below the floor of 4.
        let summary = fx.policy.run_selective_activations(TEAM, 16, 18).unwrap();
        assert!(summary.outcome.activated.is_empty());
    }

    #[test]
    fn selective_activates_for_thin_depth() {
        let fx = fixture();
        // 76 overall: below the aggressive bar, but the position is thin.
        put_on_ir(&fx, "rb_starter", "RB", 76, 4, 1);
        add_active(&fx, "rb_backup", "RB", 65);
        add_active(&fx, "wr_filler", "WR", 72);

        let summary = fx.policy.run_selective_activations(TEAM, 8, 18).unwrap();
        assert_eq!(summary.outcome.activated, vec!["rb_starter".to_string()]);
    }

    #[test]
    fn selective_activates_for_position_emergency() {
        let fx = fixture();
        // Healthy depth is fine, but two other WRs are hurt.
        put_on_ir(&fx, "wr_ir", "WR", 77, 4, 1);
        for i in 0..4 {
            add_active(&fx, &format!("wr_{i}"), "WR", 72);
        }
        add_active(&fx, "wr_hurt_a", "WR", 70);
        add_active(&fx, "wr_hurt_b", "WR", 70);
        fx.service
            .record(&injury("wr_hurt_a", "WR", InjurySeverity::Moderate, 3, 7))
            .unwrap();
        fx.service
            .record(&injury("wr_hurt_b", "WR", InjurySeverity::Minor, 2, 7))
            .unwrap();

        let summary = fx.policy.run_selective_activations(TEAM, 8, 18).unwrap();
        assert_eq!(summary.outcome.activated, vec!["wr_ir".to_string()]);
    }

    #[test]
    fn selective_skip_when_only_protected_cuts() {
        let fx = fixture();
        put_on_ir(&fx, "star", "WR", 90, 4, 1);
        // Remaining roster is all protected positions at their depth floor.
        add_active(&fx, "qb1", "QB", 80);
        add_active(&fx, "qb2", "QB", 62);
        add_active(&fx, "k1", "K", 70);

        let summary = fx.policy.run_selective_activations(TEAM, 8, 18).unwrap();
        assert!(summary.outcome.success);
        assert!(summary.outcome.activated.is_empty());
        assert_eq!(summary.skipped.len(), 1);
        assert!(summary.skipped[0].contains("no unprotected cut candidate"));
        // Skipping is an event, never an error; nothing changed.
        assert_eq!(
            fx.roster.roster_status(DYN, "star").unwrap(),
            Some(RosterStatus::InjuredReserve)
        );
    }

    #[test]
    fn selective_pairs_two_activations_with_distinct_cuts() {
        let fx = fixture();
        put_on_ir(&fx, "star_a", "WR", 85, 4, 1);
        put_on_ir(&fx, "star_b", "TE", 86, 4, 1);
        add_active(&fx, "cut_low", "CB", 60);
        add_active(&fx, "cut_mid", "OLB", 63);
        add_active(&fx, "keeper", "FS", 84);

        let summary = fx.policy.run_selective_activations(TEAM, 8, 18).unwrap();
        assert!(summary.outcome.success);
        assert_eq!(summary.outcome.activated.len(), 2);
        let mut released = summary.outcome.released.clone();
        released.sort();
        assert_eq!(released, vec!["cut_low".to_string(), "cut_mid".to_string()]);
        assert_eq!(fx.service.ir_return_slots_remaining(TEAM).unwrap(), 6);
    }
}
