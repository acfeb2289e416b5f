// Static per-position injury risk table.

use serde::Serialize;

use crate::roster::Position;

use super::types::{BodyPart, InjuryType};

/// Immutable reference data describing how injury-prone a position is.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiskProfile {
    /// Per-game injury probability for an average-durability player.
    pub base_injury_chance: f64,
    /// Body regions this position stresses the most.
    pub high_risk_body_parts: &'static [BodyPart],
    /// Candidate list for the 70% "positionally typical" sampling path.
    pub common_injuries: &'static [InjuryType],
}

/// Fallback for unrecognized position strings. The engine never rejects an
/// unknown position; it just treats it as an average-risk player.
pub const DEFAULT_PROFILE: RiskProfile = RiskProfile {
    base_injury_chance: 0.05,
    high_risk_body_parts: &[BodyPart::Knee, BodyPart::Ankle],
    common_injuries: &[InjuryType::AnkleSprain, InjuryType::MclSprain],
};

/// Look up the risk profile for a position string, falling back to
/// `DEFAULT_PROFILE` when the string is unrecognized.
pub fn risk_profile_for(position: &str) -> RiskProfile {
    match Position::from_str_pos(position) {
        Some(pos) => risk_profile(pos),
        None => DEFAULT_PROFILE,
    }
}

/// The static risk table.
///
/// Base chances follow real NFL injury-rate ordering: running backs above
/// the other skill positions, skill positions above the lines, specialists
/// far below everyone.
pub fn risk_profile(position: Position) -> RiskProfile {
    use BodyPart::*;
    use InjuryType::*;
    match position {
        Position::RunningBack => RiskProfile {
            base_injury_chance: 0.090,
            high_risk_body_parts: &[Knee, Ankle, Hamstring],
            common_injuries: &[
                HamstringStrain,
                AnkleSprain,
                HighAnkleSprain,
                MclSprain,
                AclTear,
            ],
        },
        Position::Fullback => RiskProfile {
            base_injury_chance: 0.066,
            high_risk_body_parts: &[Shoulder, Neck, Knee],
            common_injuries: &[ShoulderSeparation, NeckStrain, Concussion],
        },
        Position::WideReceiver => RiskProfile {
            base_injury_chance: 0.070,
            high_risk_body_parts: &[Hamstring, Ankle, Knee],
            common_injuries: &[HamstringStrain, AnkleSprain, HighAnkleSprain, AclTear],
        },
        Position::TightEnd => RiskProfile {
            base_injury_chance: 0.068,
            high_risk_body_parts: &[Knee, Ankle, Shoulder],
            common_injuries: &[MclSprain, AnkleSprain, ShoulderSeparation],
        },
        Position::Quarterback => RiskProfile {
            base_injury_chance: 0.048,
            high_risk_body_parts: &[Shoulder, Ribs, Knee],
            common_injuries: &[ShoulderSeparation, RibFracture, Concussion, AnkleSprain],
        },
        Position::LeftTackle
        | Position::LeftGuard
        | Position::Center
        | Position::RightGuard
        | Position::RightTackle => RiskProfile {
            base_injury_chance: 0.050,
            high_risk_body_parts: &[Knee, Ankle, Back],
            common_injuries: &[MclSprain, HighAnkleSprain, BackSpasms, ElbowSprain],
        },
        Position::DefensiveEnd => RiskProfile {
            base_injury_chance: 0.055,
            high_risk_body_parts: &[Knee, Shoulder, Ankle],
            common_injuries: &[MclSprain, ShoulderSeparation, AnkleSprain, CalfStrain],
        },
        Position::DefensiveTackle | Position::NoseTackle => RiskProfile {
            base_injury_chance: 0.052,
            high_risk_body_parts: &[Knee, Shoulder, Back],
            common_injuries: &[MclSprain, ShoulderSeparation, BackSpasms],
        },
        Position::EdgeRusher => RiskProfile {
            base_injury_chance: 0.068,
            high_risk_body_parts: &[Hamstring, Knee, Shoulder],
            common_injuries: &[HamstringStrain, MclSprain, ShoulderSeparation],
        },
        Position::OutsideLinebacker
        | Position::InsideLinebacker
        | Position::MiddleLinebacker => RiskProfile {
            base_injury_chance: 0.070,
            high_risk_body_parts: &[Hamstring, Knee, Shoulder],
            common_injuries: &[HamstringStrain, MclSprain, ShoulderSeparation, Concussion],
        },
        Position::Cornerback | Position::NickelBack => RiskProfile {
            base_injury_chance: 0.064,
            high_risk_body_parts: &[Hamstring, Ankle, Groin],
            common_injuries: &[HamstringStrain, GroinPull, AnkleSprain, HighAnkleSprain],
        },
        Position::FreeSafety | Position::StrongSafety => RiskProfile {
            base_injury_chance: 0.066,
            high_risk_body_parts: &[Hamstring, Shoulder, Head],
            common_injuries: &[HamstringStrain, Concussion, ShoulderSeparation],
        },
        Position::Kicker | Position::Punter => RiskProfile {
            base_injury_chance: 0.012,
            high_risk_body_parts: &[Groin, Quadriceps, Hip],
            common_injuries: &[GroinPull, QuadStrain, HipFlexorStrain],
        },
        Position::LongSnapper => RiskProfile {
            base_injury_chance: 0.015,
            high_risk_body_parts: &[Back, Knee],
            common_injuries: &[BackSpasms, MclSprain],
        },
    }
}
