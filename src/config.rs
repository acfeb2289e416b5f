// Configuration loading and parsing (rules.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// rules.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level tables in rules.toml.
#[derive(Debug, Clone, Deserialize)]
struct RulesFile {
    roster: RosterRules,
    #[serde(default)]
    policy: PolicyRules,
}

/// League roster and injured-reserve rules.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterRules {
    /// Active roster cap (the 53-man limit).
    pub active_roster_cap: usize,
    /// Minimum estimated weeks out before a player may be placed on IR.
    pub ir_min_weeks: u32,
    /// IR return activations allowed per team per season.
    pub ir_return_slots: u32,
}

/// Thresholds for the AI roster-management heuristics.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyRules {
    /// Minimum overall rating to bother activating from IR late in a season.
    pub min_activation_overall: u8,
    /// Overall rating that justifies activation with more season left.
    pub aggressive_activation_overall: u8,
    /// Weeks remaining required for the aggressive-activation path.
    pub aggressive_weeks_remaining: u32,
    /// Minimum weeks remaining to activate anyone at all.
    pub min_weeks_remaining: u32,
    /// Healthy-depth floor; below this a position is considered thin.
    pub position_depth_floor: usize,
    /// Other same-position injuries that make a position an emergency.
    pub position_injury_emergency: usize,
}

impl Default for PolicyRules {
    fn default() -> Self {
        PolicyRules {
            min_activation_overall: 75,
            aggressive_activation_overall: 80,
            aggressive_weeks_remaining: 6,
            min_weeks_remaining: 4,
            position_depth_floor: 3,
            position_injury_emergency: 2,
        }
    }
}

/// Assembled engine rules. `Rules::default()` carries the NFL-style
/// constants, so a rules.toml is only needed to deviate from them.
#[derive(Debug, Clone)]
pub struct Rules {
    pub roster: RosterRules,
    pub policy: PolicyRules,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            roster: RosterRules {
                active_roster_cap: 53,
                ir_min_weeks: 4,
                ir_return_slots: 8,
            },
            policy: PolicyRules::default(),
        }
    }
}

impl Rules {
    /// Load rules from a TOML file and validate them.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        let file: RulesFile = toml::from_str(&raw).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = Rules {
            roster: file.roster,
            policy: file.policy,
        };
        rules.validate()?;
        Ok(rules)
    }

    /// Sanity-check numeric fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roster.active_roster_cap == 0 {
            return Err(ConfigError::ValidationError {
                field: "roster.active_roster_cap".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.roster.ir_min_weeks == 0 {
            return Err(ConfigError::ValidationError {
                field: "roster.ir_min_weeks".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.policy.aggressive_activation_overall < self.policy.min_activation_overall {
            return Err(ConfigError::ValidationError {
                field: "policy.aggressive_activation_overall".into(),
                message: "must be >= policy.min_activation_overall".into(),
            });
        }
        if self.policy.aggressive_weeks_remaining < self.policy.min_weeks_remaining {
            return Err(ConfigError::ValidationError {
                field: "policy.aggressive_weeks_remaining".into(),
                message: "must be >= policy.min_weeks_remaining".into(),
            });
        }
        Ok(())
    }
}
