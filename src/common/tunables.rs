//! Tunable gameplay constants.
//!
//! Durations are `f64` seconds: they are compared against `Time::elapsed_secs_f64`,
//! and keeping both sides in the same type keeps cooldown boundaries exact.

use bevy::prelude::*;

use crate::common::error::ConfigurationError;
use crate::plugins::damage::smoke::HealthThresholds;
use crate::plugins::projectiles::components::PoolKind;

/// Preallocated slots per pooled kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolCapacities {
    pub bullets: usize,
    pub shells: usize,
    pub bombs: usize,
    pub missiles: usize,
}

impl PoolCapacities {
    #[inline]
    pub fn get(&self, kind: PoolKind) -> usize {
        match kind {
            PoolKind::Bullet => self.bullets,
            PoolKind::Shell => self.shells,
            PoolKind::Bomb => self.bombs,
            PoolKind::Missile => self.missiles,
        }
    }
}

impl Default for PoolCapacities {
    fn default() -> Self {
        Self { bullets: 256, shells: 64, bombs: 8, missiles: 16 }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub player_speed: f32,

    pub pools: PoolCapacities,

    // Cooldowns (seconds between accepted shots).
    pub fire_rate: f64,
    pub bomb_cooldown: f64,
    pub missile_cooldown: f64,

    // Lifetimes (seconds a pooled entity may stay active).
    pub bullet_lifetime: f64,
    pub shell_lifetime: f64,
    pub bomb_lifetime: f64,
    pub missile_lifetime: f64,
    pub missile_self_destruct: Option<f64>,

    pub bullet_speed: f32,
    pub bomb_speed: f32,
    pub missile_speed: f32,

    pub bullet_damage: f32,
    pub bomb_damage: f32,
    pub missile_damage: f32,
    pub ram_damage: f32,

    /// Radians per fixed step.
    pub missile_turn_rate: f32,

    /// Distance from the vehicle centre where projectiles appear.
    pub muzzle_offset: f32,
    /// Sideways speed given to an ejected casing.
    pub shell_eject_speed: f32,
    /// Max magnitude of the random spin given to a casing (rad/s).
    pub shell_torque: f32,
    pub shell_clink_delay: f64,

    pub damaged_threshold: f32,
    pub critical_threshold: f32,

    pub radio_interval: Option<f64>,
    pub rng_seed: u64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            player_speed: 420.0,
            pools: PoolCapacities::default(),
            fire_rate: 0.12,
            bomb_cooldown: 1.5,
            missile_cooldown: 0.8,
            bullet_lifetime: 1.5,
            shell_lifetime: 2.0,
            bomb_lifetime: 2.5,
            missile_lifetime: 6.0,
            missile_self_destruct: Some(4.0),
            bullet_speed: 900.0,
            bomb_speed: 260.0,
            missile_speed: 520.0,
            bullet_damage: 4.0,
            bomb_damage: 45.0,
            missile_damage: 30.0,
            ram_damage: 10.0,
            missile_turn_rate: 3.0_f32.to_radians(),
            muzzle_offset: 22.0,
            shell_eject_speed: 140.0,
            shell_torque: 18.0,
            shell_clink_delay: 0.35,
            damaged_threshold: 60.0,
            critical_threshold: 25.0,
            radio_interval: Some(20.0),
            rng_seed: 42,
        }
    }
}

impl Tunables {
    /// Health tier thresholds, validated.
    pub fn health_thresholds(&self) -> Result<HealthThresholds, ConfigurationError> {
        HealthThresholds::new(self.damaged_threshold, self.critical_threshold)
    }

    /// Check every invariant that can be checked without building anything.
    ///
    /// Pool capacities are validated by `ObjectPool::initialize` itself.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.health_thresholds()?;

        let intervals = [
            ("fire_rate", self.fire_rate),
            ("bomb_cooldown", self.bomb_cooldown),
            ("missile_cooldown", self.missile_cooldown),
            ("shell_clink_delay", self.shell_clink_delay),
        ];
        for (name, value) in intervals {
            if !(value >= 0.0) {
                return Err(ConfigurationError::NegativeInterval { name, value });
            }
        }

        if let Some(value) = self.radio_interval {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigurationError::NonPositiveInterval { name: "radio_interval", value });
            }
        }

        let finite = [
            ("shell_eject_speed", self.shell_eject_speed),
            ("shell_torque", self.shell_torque),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFinite { name, value });
            }
        }

        if self.missile_turn_rate <= 0.0 {
            return Err(ConfigurationError::NonPositiveTurnRate { value: self.missile_turn_rate });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Tunables::default().validate(), Ok(()));
    }

    #[test]
    fn radio_interval_must_be_positive_and_finite() {
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let tunables = Tunables { radio_interval: Some(bad), ..Default::default() };
            assert!(
                matches!(
                    tunables.validate(),
                    Err(ConfigurationError::NonPositiveInterval { name: "radio_interval", .. })
                ),
                "accepted radio_interval {bad}"
            );
        }

        let silent = Tunables { radio_interval: None, ..Default::default() };
        assert_eq!(silent.validate(), Ok(()));
    }

    #[test]
    fn casing_spin_and_speed_must_be_finite() {
        let spin = Tunables { shell_torque: f32::NAN, ..Default::default() };
        assert!(matches!(
            spin.validate(),
            Err(ConfigurationError::NonFinite { name: "shell_torque", .. })
        ));

        let speed = Tunables { shell_eject_speed: f32::INFINITY, ..Default::default() };
        assert!(matches!(
            speed.validate(),
            Err(ConfigurationError::NonFinite { name: "shell_eject_speed", .. })
        ));
    }

    #[test]
    fn nan_cooldown_is_rejected() {
        let tunables = Tunables { fire_rate: f64::NAN, ..Default::default() };
        assert!(matches!(
            tunables.validate(),
            Err(ConfigurationError::NegativeInterval { name: "fire_rate", .. })
        ));
    }
}
