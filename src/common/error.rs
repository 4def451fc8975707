//! Startup configuration errors.
//!
//! Everything recoverable at runtime (cooldown, exhausted pool, disabled weapons)
//! is a plain return value. Only broken configuration is an error, and it is
//! fatal: startup systems return it through Bevy's `Result` and the default
//! error handler aborts.

use std::fmt;

use crate::plugins::projectiles::components::PoolKind;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A pool was configured with zero slots.
    ZeroCapacity { kind: PoolKind },
    /// A pool was initialized without an entity factory.
    MissingFactory { kind: PoolKind },
    /// `critical` must be strictly below `damaged`.
    InvertedHealthThresholds { damaged: f32, critical: f32 },
    /// Cooldowns and lifetimes are durations; a negative one is meaningless.
    NegativeInterval { name: &'static str, value: f64 },
    /// A repeat interval must be a positive, finite number of seconds.
    NonPositiveInterval { name: &'static str, value: f64 },
    /// NaN or infinity where a finite number is required.
    NonFinite { name: &'static str, value: f32 },
    /// A missile that cannot turn can never home.
    NonPositiveTurnRate { value: f32 },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity { kind } => {
                write!(f, "{} pool capacity must be greater than zero", kind.name())
            }
            Self::MissingFactory { kind } => {
                write!(f, "{} pool has no entity factory", kind.name())
            }
            Self::InvertedHealthThresholds { damaged, critical } => write!(
                f,
                "critical health threshold ({critical}) must be below damaged threshold ({damaged})"
            ),
            Self::NegativeInterval { name, value } => {
                write!(f, "{name} must not be negative (got {value})")
            }
            Self::NonPositiveInterval { name, value } => {
                write!(f, "{name} must be positive and finite (got {value})")
            }
            Self::NonFinite { name, value } => {
                write!(f, "{name} must be finite (got {value})")
            }
            Self::NonPositiveTurnRate { value } => {
                write!(f, "missile turn rate limit must be positive (got {value})")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_pool() {
        let err = ConfigurationError::ZeroCapacity { kind: PoolKind::Bomb };
        assert_eq!(err.to_string(), "bomb pool capacity must be greater than zero");
    }

    #[test]
    fn display_reports_both_thresholds() {
        let err = ConfigurationError::InvertedHealthThresholds { damaged: 20.0, critical: 40.0 };
        let msg = err.to_string();
        assert!(msg.contains("40"));
        assert!(msg.contains("20"));
    }
}
