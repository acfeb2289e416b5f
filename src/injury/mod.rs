// Injury simulation core: static risk profiles, the probability/generation
// engine, the lifecycle service, and the AI roster-management policy.

pub mod generator;
pub mod policy;
pub mod risk;
pub mod service;
pub mod types;

pub use generator::InjuryGenerator;
pub use policy::{RosterPolicy, SelectiveSummary, WeeklySummary};
pub use risk::{risk_profile, risk_profile_for, RiskProfile};
pub use service::{BatchOutcome, InjuryService, IrActivation};
pub use types::{BodyPart, GameContext, Injury, InjurySeverity, InjuryType};
