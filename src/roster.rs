// Roster collaborator surfaces: position vocabulary, player snapshots, and
// the provider/cut-ranking traits the injury core is handed by the
// season orchestrator. Ships an in-memory implementation used by the
// orchestrator's exhibition mode and by tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Football positions used for risk lookup and depth accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Quarterback,
    RunningBack,
    Fullback,
    WideReceiver,
    TightEnd,
    LeftTackle,
    LeftGuard,
    Center,
    RightGuard,
    RightTackle,
    DefensiveEnd,
    DefensiveTackle,
    NoseTackle,
    EdgeRusher,
    OutsideLinebacker,
    InsideLinebacker,
    MiddleLinebacker,
    Cornerback,
    NickelBack,
    FreeSafety,
    StrongSafety,
    Kicker,
    Punter,
    LongSnapper,
}

impl Position {
    /// Parse a position string into a Position enum.
    ///
    /// Handles the standard NFL abbreviations ("QB", "RB", "LT", ...). Returns
    /// `None` for unrecognized strings; risk lookup falls back to a default
    /// profile rather than failing, so unknown positions are never an error.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" | "HB" => Some(Position::RunningBack),
            "FB" => Some(Position::Fullback),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "LT" => Some(Position::LeftTackle),
            "LG" => Some(Position::LeftGuard),
            "C" => Some(Position::Center),
            "RG" => Some(Position::RightGuard),
            "RT" => Some(Position::RightTackle),
            "DE" => Some(Position::DefensiveEnd),
            "DT" => Some(Position::DefensiveTackle),
            "NT" => Some(Position::NoseTackle),
            "EDGE" => Some(Position::EdgeRusher),
            "OLB" => Some(Position::OutsideLinebacker),
            "ILB" => Some(Position::InsideLinebacker),
            "MLB" | "LB" => Some(Position::MiddleLinebacker),
            "CB" => Some(Position::Cornerback),
            "NB" => Some(Position::NickelBack),
            "FS" => Some(Position::FreeSafety),
            "SS" | "S" => Some(Position::StrongSafety),
            "K" => Some(Position::Kicker),
            "P" => Some(Position::Punter),
            "LS" => Some(Position::LongSnapper),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::Fullback => "FB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::LeftTackle => "LT",
            Position::LeftGuard => "LG",
            Position::Center => "C",
            Position::RightGuard => "RG",
            Position::RightTackle => "RT",
            Position::DefensiveEnd => "DE",
            Position::DefensiveTackle => "DT",
            Position::NoseTackle => "NT",
            Position::EdgeRusher => "EDGE",
            Position::OutsideLinebacker => "OLB",
            Position::InsideLinebacker => "ILB",
            Position::MiddleLinebacker => "MLB",
            Position::Cornerback => "CB",
            Position::NickelBack => "NB",
            Position::FreeSafety => "FS",
            Position::StrongSafety => "SS",
            Position::Kicker => "K",
            Position::Punter => "P",
            Position::LongSnapper => "LS",
        }
    }
}

/// Roster designation tracked by the roster collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterStatus {
    /// Counts against the 53-man active roster.
    Active,
    /// On injured reserve; removed from the active count.
    InjuredReserve,
    /// Cut from the roster.
    Released,
}

/// Strongly-typed player attributes captured once at the call boundary.
///
/// The engine never reads player data from anywhere else, so everything the
/// probability model needs travels in this one struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player_id: String,
    pub name: String,
    pub team_id: String,
    /// Position string as the roster stores it (e.g. "RB"). Unknown strings
    /// are tolerated everywhere downstream.
    pub position: String,
    /// 0-100; inversely correlated with injury probability.
    pub durability: u8,
    pub age: u8,
    /// Number of prior recorded injuries.
    pub injury_history_count: u32,
    /// Overall rating, used by the AI activation heuristics.
    pub overall: u8,
}

/// A player the cut-ranking collaborator proposes releasing, worst-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutCandidate {
    pub player_id: String,
    pub player_name: String,
    pub position: String,
    pub overall: u8,
    /// Protected players (position-minimum depth) must never be cut.
    pub protected: bool,
}

/// Roster/depth-chart provider. All queries are dynasty-scoped and re-read
/// backing state on every call; the injury core caches nothing.
pub trait RosterProvider: Send + Sync {
    /// Players currently on the active roster for `team_id`, excluding anyone
    /// carried on a non-active designation.
    fn active_players(&self, dynasty_id: &str, team_id: &str) -> Result<Vec<PlayerSnapshot>>;

    /// Number of players counting against the 53-man active roster.
    fn active_roster_count(&self, dynasty_id: &str, team_id: &str) -> Result<usize>;

    /// Flip a player's roster designation.
    fn set_roster_status(
        &self,
        dynasty_id: &str,
        player_id: &str,
        status: RosterStatus,
    ) -> Result<()>;

    /// The player's current designation, if the roster knows them.
    fn roster_status(&self, dynasty_id: &str, player_id: &str) -> Result<Option<RosterStatus>>;

    /// Attribute snapshot for a single player regardless of designation.
    /// Activation heuristics need ratings for players who are on IR and
    /// therefore absent from `active_players`.
    fn player(&self, dynasty_id: &str, player_id: &str) -> Result<Option<PlayerSnapshot>>;
}

/// Player-value ranking used to pick IR-activation trade-offs.
pub trait CutRanking: Send + Sync {
    /// Rank-ordered (worst value first) cuttable players for `team_id`,
    /// enough to free `slots_needed` roster spots. Protected players are
    /// included but flagged; callers must never cut them.
    fn cut_candidates(
        &self,
        dynasty_id: &str,
        team_id: &str,
        slots_needed: usize,
    ) -> Result<Vec<CutCandidate>>;
}

#[derive(Debug, Clone)]
struct RosterEntry {
    snapshot: PlayerSnapshot,
    status: RosterStatus,
}

/// In-memory roster keyed by (dynasty, team). Implements both collaborator
/// traits: cut candidates are ranked by overall rating ascending, with
/// position-minimum protection.
pub struct MemoryRoster {
    /// (dynasty_id, team_id) -> entries.
    teams: Mutex<HashMap<(String, String), Vec<RosterEntry>>>,
    /// Minimum healthy depth per position; players at or below the floor are
    /// flagged protected in cut rankings.
    position_minimums: HashMap<Position, usize>,
}

impl MemoryRoster {
    pub fn new() -> Self {
        MemoryRoster {
            teams: Mutex::new(HashMap::new()),
            position_minimums: Self::default_minimums(),
        }
    }

    pub fn with_position_minimums(minimums: HashMap<Position, usize>) -> Self {
        MemoryRoster {
            teams: Mutex::new(HashMap::new()),
            position_minimums: minimums,
        }
    }

    /// Depth floors below which a position's players are never proposed as
    /// cuts. Specialists and quarterbacks are effectively always protected.
    fn default_minimums() -> HashMap<Position, usize> {
        let mut m = HashMap::new();
        m.insert(Position::Quarterback, 2);
        m.insert(Position::Kicker, 1);
        m.insert(Position::Punter, 1);
        m.insert(Position::LongSnapper, 1);
        m.insert(Position::LeftTackle, 1);
        m.insert(Position::Center, 1);
        m
    }

    /// Add a player to a team with the given designation.
    pub fn add_player(&self, dynasty_id: &str, snapshot: PlayerSnapshot, status: RosterStatus) {
        let mut teams = self.teams.lock().expect("roster mutex poisoned");
        teams
            .entry((dynasty_id.to_string(), snapshot.team_id.clone()))
            .or_default()
            .push(RosterEntry { snapshot, status });
    }

    fn entries_for(&self, dynasty_id: &str, team_id: &str) -> Vec<RosterEntry> {
        let teams = self.teams.lock().expect("roster mutex poisoned");
        teams
            .get(&(dynasty_id.to_string(), team_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for MemoryRoster {
    fn default() -> Self {
        Self::new()
    }
}

impl RosterProvider for MemoryRoster {
    fn active_players(&self, dynasty_id: &str, team_id: &str) -> Result<Vec<PlayerSnapshot>> {
        Ok(self
            .entries_for(dynasty_id, team_id)
            .into_iter()
            .filter(|e| e.status == RosterStatus::Active)
            .map(|e| e.snapshot)
            .collect())
    }

    fn active_roster_count(&self, dynasty_id: &str, team_id: &str) -> Result<usize> {
        Ok(self
            .entries_for(dynasty_id, team_id)
            .iter()
            .filter(|e| e.status == RosterStatus::Active)
            .count())
    }

    fn set_roster_status(
        &self,
        dynasty_id: &str,
        player_id: &str,
        status: RosterStatus,
    ) -> Result<()> {
        let mut teams = self.teams.lock().expect("roster mutex poisoned");
        for ((dyn_id, _), entries) in teams.iter_mut() {
            if dyn_id != dynasty_id {
                continue;
            }
            if let Some(entry) = entries
                .iter_mut()
                .find(|e| e.snapshot.player_id == player_id)
            {
                entry.status = status;
                return Ok(());
            }
        }
        anyhow::bail!("player {player_id} not found in dynasty {dynasty_id}")
    }

    fn roster_status(&self, dynasty_id: &str, player_id: &str) -> Result<Option<RosterStatus>> {
        let teams = self.teams.lock().expect("roster mutex poisoned");
        for ((dyn_id, _), entries) in teams.iter() {
            if dyn_id != dynasty_id {
                continue;
            }
            if let Some(entry) = entries.iter().find(|e| e.snapshot.player_id == player_id) {
                return Ok(Some(entry.status));
            }
        }
        Ok(None)
    }

    fn player(&self, dynasty_id: &str, player_id: &str) -> Result<Option<PlayerSnapshot>> {
        let teams = self.teams.lock().expect("roster mutex poisoned");
        for ((dyn_id, _), entries) in teams.iter() {
            if dyn_id != dynasty_id {
                continue;
            }
            if let Some(entry) = entries.iter().find(|e| e.snapshot.player_id == player_id) {
                return Ok(Some(entry.snapshot.clone()));
            }
        }
        Ok(None)
    }
}

impl CutRanking for MemoryRoster {
    fn cut_candidates(
        &self,
        dynasty_id: &str,
        team_id: &str,
        slots_needed: usize,
    ) -> Result<Vec<CutCandidate>> {
        let entries = self.entries_for(dynasty_id, team_id);
        let active: Vec<&RosterEntry> = entries
            .iter()
            .filter(|e| e.status == RosterStatus::Active)
            .collect();

        // Current depth per parsed position, for protection flags.
        let mut depth: HashMap<Position, usize> = HashMap::new();
        for entry in &active {
            if let Some(pos) = Position::from_str_pos(&entry.snapshot.position) {
                *depth.entry(pos).or_insert(0) += 1;
            }
        }

        let mut candidates: Vec<CutCandidate> = active
            .iter()
            .map(|e| {
                let protected = Position::from_str_pos(&e.snapshot.position)
                    .map(|pos| {
                        let min = self.position_minimums.get(&pos).copied().unwrap_or(0);
                        depth.get(&pos).copied().unwrap_or(0) <= min
                    })
                    .unwrap_or(false);
                CutCandidate {
                    player_id: e.snapshot.player_id.clone(),
                    player_name: e.snapshot.name.clone(),
                    position: e.snapshot.position.clone(),
                    overall: e.snapshot.overall,
                    protected,
                }
            })
            .collect();

        // Worst value first; stable tie-break on player id for determinism.
        candidates.sort_by(|a, b| {
            a.overall
                .cmp(&b.overall)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        // Return enough unprotected candidates plus the protected ones the
        // caller may want to report on, capped for sanity.
        let unprotected_needed = slots_needed.max(1);
        let mut kept = Vec::new();
        let mut unprotected_seen = 0usize;
        for cand in candidates {
            let was_protected = cand.protected;
            kept.push(cand);
            if !was_protected {
                unprotected_seen += 1;
                if unprotected_seen >= unprotected_needed + 2 {
                    break;
                }
            }
        }
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str, team: &str, pos: &str, overall: u8) -> PlayerSnapshot {
        PlayerSnapshot {
            player_id: id.to_string(),
            name: format!("Player {id}"),
            team_id: team.to_string(),
            position: pos.to_string(),
            durability: 80,
            age: 25,
            injury_history_count: 0,
            overall,
        }
    }

    #[test]
    fn position_parsing_round_trip() {
        for s in [
            "QB", "RB", "FB", "WR", "TE", "LT", "LG", "C", "RG", "RT", "DE", "DT", "NT", "EDGE",
            "OLB", "ILB", "MLB", "CB", "NB", "FS", "SS", "K", "P", "LS",
        ] {
            let pos = Position::from_str_pos(s).expect("known position");
            assert_eq!(pos.display_str(), s);
        }
    }

    #[test]
    fn position_parsing_is_case_insensitive() {
        assert_eq!(Position::from_str_pos("rb"), Some(Position::RunningBack));
        assert_eq!(Position::from_str_pos("wr"), Some(Position::WideReceiver));
    }

    #[test]
    fn unknown_position_returns_none() {
        assert_eq!(Position::from_str_pos("XX"), None);
    }

    #[test]
    fn active_players_excludes_non_active_designations() {
        let roster = MemoryRoster::new();
        roster.add_player("dyn1", snapshot("p1", "team_1", "RB", 80), RosterStatus::Active);
        roster.add_player(
            "dyn1",
            snapshot("p2", "team_1", "WR", 75),
            RosterStatus::InjuredReserve,
        );

        let active = roster.active_players("dyn1", "team_1").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].player_id, "p1");
        assert_eq!(roster.active_roster_count("dyn1", "team_1").unwrap(), 1);
    }

    #[test]
    fn set_roster_status_flips_designation() {
        let roster = MemoryRoster::new();
        roster.add_player("dyn1", snapshot("p1", "team_1", "RB", 80), RosterStatus::Active);

        roster
            .set_roster_status("dyn1", "p1", RosterStatus::InjuredReserve)
            .unwrap();
        assert_eq!(
            roster.roster_status("dyn1", "p1").unwrap(),
            Some(RosterStatus::InjuredReserve)
        );
        assert_eq!(roster.active_roster_count("dyn1", "team_1").unwrap(), 0);

        roster
            .set_roster_status("dyn1", "p1", RosterStatus::Active)
            .unwrap();
        assert_eq!(roster.active_roster_count("dyn1", "team_1").unwrap(), 1);
    }

    #[test]
    fn set_roster_status_unknown_player_errors() {
        let roster = MemoryRoster::new();
        assert!(roster
            .set_roster_status("dyn1", "ghost", RosterStatus::Released)
            .is_err());
    }

    #[test]
    fn rosters_are_dynasty_scoped() {
        let roster = MemoryRoster::new();
        roster.add_player("dyn1", snapshot("p1", "team_1", "RB", 80), RosterStatus::Active);
        roster.add_player("dyn2", snapshot("p2", "team_1", "RB", 70), RosterStatus::Active);

        let dyn1 = roster.active_players("dyn1", "team_1").unwrap();
        assert_eq!(dyn1.len(), 1);
        assert_eq!(dyn1[0].player_id, "p1");
        assert!(roster.roster_status("dyn1", "p2").unwrap().is_none());
    }

    #[test]
    fn player_lookup_includes_ir_players() {
        let roster = MemoryRoster::new();
        roster.add_player(
            "dyn1",
            snapshot("p1", "team_1", "RB", 88),
            RosterStatus::InjuredReserve,
        );
        let snap = roster.player("dyn1", "p1").unwrap().expect("known player");
        assert_eq!(snap.overall, 88);
        assert!(roster.player("dyn1", "ghost").unwrap().is_none());
    }

    #[test]
    fn cut_candidates_worst_value_first() {
        let roster = MemoryRoster::new();
        roster.add_player("dyn1", snapshot("p1", "team_1", "WR", 85), RosterStatus::Active);
        roster.add_player("dyn1", snapshot("p2", "team_1", "WR", 62), RosterStatus::Active);
        roster.add_player("dyn1", snapshot("p3", "team_1", "WR", 71), RosterStatus::Active);

        let candidates = roster.cut_candidates("dyn1", "team_1", 1).unwrap();
        assert_eq!(candidates[0].player_id, "p2");
        assert_eq!(candidates[0].overall, 62);
        assert!(!candidates[0].protected);
    }

    #[test]
    fn cut_candidates_protect_position_minimums() {
        let roster = MemoryRoster::new();
        // Two QBs at the default minimum of 2: both protected.
        roster.add_player("dyn1", snapshot("qb1", "team_1", "QB", 80), RosterStatus::Active);
        roster.add_player("dyn1", snapshot("qb2", "team_1", "QB", 60), RosterStatus::Active);
        roster.add_player("dyn1", snapshot("wr1", "team_1", "WR", 65), RosterStatus::Active);

        let candidates = roster.cut_candidates("dyn1", "team_1", 1).unwrap();
        for cand in &candidates {
            if cand.position == "QB" {
                assert!(cand.protected, "QBs at the depth floor must be protected");
            }
        }
        assert!(candidates.iter().any(|c| c.player_id == "wr1" && !c.protected));
    }

    #[test]
    fn cut_candidates_released_players_excluded() {
        let roster = MemoryRoster::new();
        roster.add_player("dyn1", snapshot("p1", "team_1", "WR", 55), RosterStatus::Released);
        roster.add_player("dyn1", snapshot("p2", "team_1", "WR", 70), RosterStatus::Active);

        let candidates = roster.cut_candidates("dyn1", "team_1", 1).unwrap();
        assert!(candidates.iter().all(|c| c.player_id != "p1"));
    }
}
