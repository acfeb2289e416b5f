// Injury probability model and stochastic generation.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::roster::PlayerSnapshot;

use super::risk::risk_profile_for;
use super::types::{GameContext, Injury, InjurySeverity, InjuryType};

/// Practice reps carry a fixed fraction of game injury risk.
const PRACTICE_MODIFIER: f64 = 0.3;

/// Positional severity weights, applied against a type's valid-severity list
/// in order (mildest first) and renormalized when the list is shorter than
/// four. The weighting is deliberately positional, not tied to specific
/// severity levels: the first *available* severity is always the heavy
/// favorite, so types with no mild outcome still front-load their mildest
/// option.
const SEVERITY_WEIGHTS: [f64; 4] = [0.6, 0.3, 0.08, 0.02];

/// Stochastic injury generator with an explicit, seedable random source.
///
/// One generator instance is expected to live for a whole simulated season so
/// its RNG stream is consumed in a reproducible order under a fixed seed.
pub struct InjuryGenerator {
    rng: ChaCha8Rng,
}

impl InjuryGenerator {
    /// Generator with an OS-seeded random source.
    pub fn new() -> Self {
        InjuryGenerator {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Deterministic generator for tests and replayable sims.
    pub fn seeded(seed: u64) -> Self {
        InjuryGenerator {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Per-player, per-context injury probability in `[0, 1]`.
    ///
    /// Five multiplicative factors, each independently auditable:
    /// position base rate, durability, age, prior-injury history, and
    /// game-vs-practice context.
    pub fn calculate_probability(
        position: &str,
        durability: u8,
        age: u8,
        injury_history_count: u32,
        context: GameContext,
    ) -> f64 {
        let base = risk_profile_for(position).base_injury_chance;

        // 100 durability halves risk, 0 durability adds half again.
        let durability_mod = 1.5 - f64::from(durability.min(100)) / 100.0;

        let age_mod = if age < 26 {
            0.9
        } else if age <= 30 {
            1.0
        } else {
            1.0 + f64::from(age - 30) * 0.03
        };

        let history_mod = 1.0 + 0.05 * f64::from(injury_history_count);

        let context_mod = match context {
            GameContext::Game => 1.0,
            GameContext::Practice => PRACTICE_MODIFIER,
        };

        (base * durability_mod * age_mod * history_mod * context_mod).clamp(0.0, 1.0)
    }

    /// Run one injury trial for a player. Returns `None` (the common case)
    /// when the trial does not trigger.
    ///
    /// The returned injury is fully populated but NOT persisted; callers pass
    /// it to `InjuryService::record` explicitly so they can batch or reject.
    pub fn generate(
        &mut self,
        player: &PlayerSnapshot,
        week: u32,
        season: u32,
        context: GameContext,
        game_id: Option<&str>,
    ) -> Option<Injury> {
        let probability = Self::calculate_probability(
            &player.position,
            player.durability,
            player.age,
            player.injury_history_count,
            context,
        );

        if self.rng.gen::<f64>() >= probability {
            return None;
        }

        let injury_type = sample_type(&mut self.rng, &player.position);
        let severity = sample_severity(&mut self.rng, injury_type);
        let (min_weeks, max_weeks) = severity.week_range();
        let weeks_out = self.rng.gen_range(min_weeks..=max_weeks);

        Some(Injury {
            id: None,
            player_id: player.player_id.clone(),
            player_name: player.name.clone(),
            team_id: player.team_id.clone(),
            position: player.position.clone(),
            injury_type,
            body_part: injury_type.body_part(),
            severity,
            weeks_out,
            actual_weeks_out: None,
            week_occurred: week,
            season,
            occurred_during: context,
            game_id: game_id.map(|s| s.to_string()),
            play_description: None,
            is_active: true,
            on_ir: false,
            ir_placement_date: None,
            ir_return_date: None,
        })
    }
}

impl Default for InjuryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 70% positionally typical (uniform over the position's common list), 30%
/// uniform over the entire catalog for a long tail of rare injuries.
fn sample_type(rng: &mut impl Rng, position: &str) -> InjuryType {
    let common = risk_profile_for(position).common_injuries;
    if !common.is_empty() && rng.gen::<f64>() < 0.7 {
        *common.choose(rng).expect("non-empty common list")
    } else {
        *InjuryType::ALL.choose(rng).expect("non-empty catalog")
    }
}

/// Draw a severity from the type's valid list using the positional weights.
fn sample_severity(rng: &mut impl Rng, injury_type: InjuryType) -> InjurySeverity {
    let valid = injury_type.valid_severities();
    let weights = &SEVERITY_WEIGHTS[..valid.len().min(SEVERITY_WEIGHTS.len())];
    let total: f64 = weights.iter().sum();

    let mut roll = rng.gen::<f64>() * total;
    for (severity, weight) in valid.iter().zip(weights) {
        if roll < *weight {
            return *severity;
        }
        roll -= weight;
    }
    // Floating-point edge: the roll landed exactly on the upper bound.
    *valid.last().expect("non-empty severity list")
}
