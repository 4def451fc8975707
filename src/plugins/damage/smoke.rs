//! Health with discrete smoke severity.
//!
//! Health is continuous; what the player sees is one of three tiers. The tier is
//! a pure function of health and two thresholds, and only a tier *change* asks
//! presentation to swap effects. Repeated hits inside one tier never restart the
//! running smoke.

use bevy::prelude::*;

use crate::common::error::ConfigurationError;

pub const MAX_HEALTH: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SmokeTier {
    #[default]
    Normal,
    Damaged,
    Critical,
}

/// `damaged > critical`, both on the 0..=100 health scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HealthThresholds {
    damaged: f32,
    critical: f32,
}

impl HealthThresholds {
    pub fn new(damaged: f32, critical: f32) -> Result<Self, ConfigurationError> {
        if critical >= damaged {
            return Err(ConfigurationError::InvertedHealthThresholds { damaged, critical });
        }
        Ok(Self { damaged, critical })
    }

    pub fn classify(&self, health: f32) -> SmokeTier {
        if health > self.damaged {
            SmokeTier::Normal
        } else if health > self.critical {
            SmokeTier::Damaged
        } else {
            SmokeTier::Critical
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierTransition {
    pub from: SmokeTier,
    pub to: SmokeTier,
}

#[derive(Component, Debug, Clone)]
pub struct Health {
    value: f32,
    tier: SmokeTier,
    thresholds: HealthThresholds,
}

impl Health {
    /// Full health.
    pub fn new(thresholds: HealthThresholds) -> Self {
        Self {
            value: MAX_HEALTH,
            tier: thresholds.classify(MAX_HEALTH),
            thresholds,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn tier(&self) -> SmokeTier {
        self.tier
    }

    #[inline]
    pub fn is_wrecked(&self) -> bool {
        self.value <= 0.0
    }

    /// Clamp and store `health`; report a tier change if one happened.
    pub fn set_health(&mut self, health: f32) -> Option<TierTransition> {
        let clamped = health.clamp(0.0, MAX_HEALTH);
        if clamped == self.value {
            return None;
        }
        self.value = clamped;

        let tier = self.thresholds.classify(clamped);
        if tier == self.tier {
            return None;
        }
        let transition = TierTransition { from: self.tier, to: tier };
        self.tier = tier;
        Some(transition)
    }

    #[inline]
    pub fn apply_damage(&mut self, amount: f32) -> Option<TierTransition> {
        self.set_health(self.value - amount)
    }
}
