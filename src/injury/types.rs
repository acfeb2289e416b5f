// Injury domain model: injury types, severities, body parts, and the
// persisted `Injury` entity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How long a player is expected to be out, in weeks. Ordered from mildest
/// to worst; the derived `Ord` is relied on by the IR-escalation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InjurySeverity {
    Minor,
    Moderate,
    Severe,
    SeasonEnding,
}

impl InjurySeverity {
    /// Inclusive `(min, max)` range of weeks out for this severity.
    ///
    /// Fixed lookup, not computed: Minor 1-2, Moderate 3-4, Severe 5-8,
    /// SeasonEnding 10-18.
    pub fn week_range(&self) -> (u32, u32) {
        match self {
            InjurySeverity::Minor => (1, 2),
            InjurySeverity::Moderate => (3, 4),
            InjurySeverity::Severe => (5, 8),
            InjurySeverity::SeasonEnding => (10, 18),
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            InjurySeverity::Minor => "Minor",
            InjurySeverity::Moderate => "Moderate",
            InjurySeverity::Severe => "Severe",
            InjurySeverity::SeasonEnding => "Season-Ending",
        }
    }

    /// Parse the storage string produced by `display_str`.
    pub fn from_str_sev(s: &str) -> Option<Self> {
        match s {
            "Minor" => Some(InjurySeverity::Minor),
            "Moderate" => Some(InjurySeverity::Moderate),
            "Severe" => Some(InjurySeverity::Severe),
            "Season-Ending" => Some(InjurySeverity::SeasonEnding),
            _ => None,
        }
    }
}

impl fmt::Display for InjurySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// Anatomical location of an injury. Purely descriptive; always derived from
/// the injury type via `InjuryType::body_part`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Head,
    Neck,
    Shoulder,
    Elbow,
    Hand,
    Ribs,
    Back,
    Hip,
    Groin,
    Hamstring,
    Quadriceps,
    Knee,
    Ankle,
    LowerLeg,
    Foot,
}

impl BodyPart {
    pub fn display_str(&self) -> &'static str {
        match self {
            BodyPart::Head => "Head",
            BodyPart::Neck => "Neck",
            BodyPart::Shoulder => "Shoulder",
            BodyPart::Elbow => "Elbow",
            BodyPart::Hand => "Hand",
            BodyPart::Ribs => "Ribs",
            BodyPart::Back => "Back",
            BodyPart::Hip => "Hip",
            BodyPart::Groin => "Groin",
            BodyPart::Hamstring => "Hamstring",
            BodyPart::Quadriceps => "Quadriceps",
            BodyPart::Knee => "Knee",
            BodyPart::Ankle => "Ankle",
            BodyPart::LowerLeg => "Lower Leg",
            BodyPart::Foot => "Foot",
        }
    }

    pub fn from_str_part(s: &str) -> Option<Self> {
        match s {
            "Head" => Some(BodyPart::Head),
            "Neck" => Some(BodyPart::Neck),
            "Shoulder" => Some(BodyPart::Shoulder),
            "Elbow" => Some(BodyPart::Elbow),
            "Hand" => Some(BodyPart::Hand),
            "Ribs" => Some(BodyPart::Ribs),
            "Back" => Some(BodyPart::Back),
            "Hip" => Some(BodyPart::Hip),
            "Groin" => Some(BodyPart::Groin),
            "Hamstring" => Some(BodyPart::Hamstring),
            "Quadriceps" => Some(BodyPart::Quadriceps),
            "Knee" => Some(BodyPart::Knee),
            "Ankle" => Some(BodyPart::Ankle),
            "Lower Leg" => Some(BodyPart::LowerLeg),
            "Foot" => Some(BodyPart::Foot),
            _ => None,
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// The catalog of injuries the generator can produce.
///
/// Each type has a fixed body part and a fixed, ordered (mildest-first) list
/// of severities it may produce. ACL and Achilles tears are always
/// season-ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjuryType {
    Concussion,
    NeckStrain,
    ShoulderSeparation,
    RotatorCuffTear,
    ElbowSprain,
    HandFracture,
    FingerDislocation,
    RibFracture,
    ObliqueStrain,
    BackSpasms,
    HipFlexorStrain,
    GroinPull,
    HamstringStrain,
    QuadStrain,
    AclTear,
    MclSprain,
    MeniscusTear,
    HighAnkleSprain,
    AnkleSprain,
    AchillesTear,
    CalfStrain,
    FootFracture,
    TurfToe,
}

impl InjuryType {
    /// Every injury type, used for the 30% "any injury" sampling path.
    pub const ALL: [InjuryType; 23] = [
        InjuryType::Concussion,
        InjuryType::NeckStrain,
        InjuryType::ShoulderSeparation,
        InjuryType::RotatorCuffTear,
        InjuryType::ElbowSprain,
        InjuryType::HandFracture,
        InjuryType::FingerDislocation,
        InjuryType::RibFracture,
        InjuryType::ObliqueStrain,
        InjuryType::BackSpasms,
        InjuryType::HipFlexorStrain,
        InjuryType::GroinPull,
        InjuryType::HamstringStrain,
        InjuryType::QuadStrain,
        InjuryType::AclTear,
        InjuryType::MclSprain,
        InjuryType::MeniscusTear,
        InjuryType::HighAnkleSprain,
        InjuryType::AnkleSprain,
        InjuryType::AchillesTear,
        InjuryType::CalfStrain,
        InjuryType::FootFracture,
        InjuryType::TurfToe,
    ];

    /// The anatomical location this injury affects.
    pub fn body_part(&self) -> BodyPart {
        match self {
            InjuryType::Concussion => BodyPart::Head,
            InjuryType::NeckStrain => BodyPart::Neck,
            InjuryType::ShoulderSeparation | InjuryType::RotatorCuffTear => BodyPart::Shoulder,
            InjuryType::ElbowSprain => BodyPart::Elbow,
            InjuryType::HandFracture | InjuryType::FingerDislocation => BodyPart::Hand,
            InjuryType::RibFracture | InjuryType::ObliqueStrain => BodyPart::Ribs,
            InjuryType::BackSpasms => BodyPart::Back,
            InjuryType::HipFlexorStrain => BodyPart::Hip,
            InjuryType::GroinPull => BodyPart::Groin,
            InjuryType::HamstringStrain => BodyPart::Hamstring,
            InjuryType::QuadStrain => BodyPart::Quadriceps,
            InjuryType::AclTear | InjuryType::MclSprain | InjuryType::MeniscusTear => {
                BodyPart::Knee
            }
            InjuryType::HighAnkleSprain | InjuryType::AnkleSprain => BodyPart::Ankle,
            InjuryType::AchillesTear | InjuryType::CalfStrain => BodyPart::LowerLeg,
            InjuryType::FootFracture | InjuryType::TurfToe => BodyPart::Foot,
        }
    }

    /// Severities this injury type may produce, ordered mildest-first.
    ///
    /// The generator's positional severity weights are applied against this
    /// order, so the first entry is always the most likely outcome.
    pub fn valid_severities(&self) -> &'static [InjurySeverity] {
        use InjurySeverity::*;
        match self {
            InjuryType::Concussion => &[Minor, Moderate, Severe],
            InjuryType::NeckStrain => &[Minor, Moderate],
            InjuryType::ShoulderSeparation => &[Moderate, Severe],
            InjuryType::RotatorCuffTear => &[Severe, SeasonEnding],
            InjuryType::ElbowSprain => &[Minor, Moderate],
            InjuryType::HandFracture => &[Moderate, Severe],
            InjuryType::FingerDislocation => &[Minor],
            InjuryType::RibFracture => &[Minor, Moderate],
            InjuryType::ObliqueStrain => &[Minor, Moderate],
            InjuryType::BackSpasms => &[Minor, Moderate],
            InjuryType::HipFlexorStrain => &[Minor, Moderate],
            InjuryType::GroinPull => &[Minor, Moderate],
            InjuryType::HamstringStrain => &[Minor, Moderate, Severe],
            InjuryType::QuadStrain => &[Minor, Moderate],
            InjuryType::AclTear => &[SeasonEnding],
            InjuryType::MclSprain => &[Moderate, Severe],
            InjuryType::MeniscusTear => &[Severe, SeasonEnding],
            InjuryType::HighAnkleSprain => &[Moderate, Severe],
            InjuryType::AnkleSprain => &[Minor, Moderate],
            InjuryType::AchillesTear => &[SeasonEnding],
            InjuryType::CalfStrain => &[Minor, Moderate],
            InjuryType::FootFracture => &[Severe, SeasonEnding],
            InjuryType::TurfToe => &[Minor, Moderate],
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            InjuryType::Concussion => "Concussion",
            InjuryType::NeckStrain => "Neck Strain",
            InjuryType::ShoulderSeparation => "Shoulder Separation",
            InjuryType::RotatorCuffTear => "Rotator Cuff Tear",
            InjuryType::ElbowSprain => "Elbow Sprain",
            InjuryType::HandFracture => "Hand Fracture",
            InjuryType::FingerDislocation => "Finger Dislocation",
            InjuryType::RibFracture => "Rib Fracture",
            InjuryType::ObliqueStrain => "Oblique Strain",
            InjuryType::BackSpasms => "Back Spasms",
            InjuryType::HipFlexorStrain => "Hip Flexor Strain",
            InjuryType::GroinPull => "Groin Pull",
            InjuryType::HamstringStrain => "Hamstring Strain",
            InjuryType::QuadStrain => "Quad Strain",
            InjuryType::AclTear => "Torn ACL",
            InjuryType::MclSprain => "MCL Sprain",
            InjuryType::MeniscusTear => "Meniscus Tear",
            InjuryType::HighAnkleSprain => "High Ankle Sprain",
            InjuryType::AnkleSprain => "Ankle Sprain",
            InjuryType::AchillesTear => "Torn Achilles",
            InjuryType::CalfStrain => "Calf Strain",
            InjuryType::FootFracture => "Foot Fracture",
            InjuryType::TurfToe => "Turf Toe",
        }
    }

    /// Parse the storage string produced by `display_str`.
    pub fn from_str_type(s: &str) -> Option<Self> {
        InjuryType::ALL
            .iter()
            .copied()
            .find(|t| t.display_str() == s)
    }
}

impl fmt::Display for InjuryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// Whether an injury happened in a simulated game or in weekly practice.
/// Practice injuries are rarer by a fixed 0.3x probability multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameContext {
    Game,
    Practice,
}

impl GameContext {
    pub fn display_str(&self) -> &'static str {
        match self {
            GameContext::Game => "game",
            GameContext::Practice => "practice",
        }
    }

    pub fn from_str_ctx(s: &str) -> Option<Self> {
        match s {
            "game" => Some(GameContext::Game),
            "practice" => Some(GameContext::Practice),
            _ => None,
        }
    }
}

/// A single injury record. Owned by the persistent store; the service layer
/// reads and writes rows and holds no long-lived copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Injury {
    /// Row id assigned by the store. None until recorded.
    pub id: Option<i64>,
    pub player_id: String,
    pub player_name: String,
    pub team_id: String,
    /// Position string at the time of injury, for depth accounting while the
    /// player is off the active roster.
    pub position: String,
    pub injury_type: InjuryType,
    pub body_part: BodyPart,
    pub severity: InjurySeverity,
    /// Estimated weeks out, set at generation time.
    pub weeks_out: u32,
    /// Actual weeks missed, set when the injury is cleared.
    pub actual_weeks_out: Option<u32>,
    pub week_occurred: u32,
    pub season: u32,
    pub occurred_during: GameContext,
    pub game_id: Option<String>,
    pub play_description: Option<String>,
    pub is_active: bool,
    pub on_ir: bool,
    /// UTC date the player was placed on injured reserve.
    pub ir_placement_date: Option<String>,
    /// UTC date the player was activated from injured reserve.
    pub ir_return_date: Option<String>,
}

impl Injury {
    /// The week this player is expected back on the field.
    pub fn estimated_return_week(&self) -> u32 {
        self.week_occurred + self.weeks_out
    }
}
