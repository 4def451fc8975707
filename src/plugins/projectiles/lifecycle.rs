//! Lifetime budget of pooled entities.
//!
//! A `Lifetime` is armed when fire control activates an entity and is checked once
//! per fixed tick. The check is pure: expiry only marks `PendingReturn`, the pool
//! is touched later by the return commit.

use bevy::prelude::*;

use crate::plugins::effects::{AudioCue, EffectRequest, VisualKind};

use super::components::{Pooled, ProjectileState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeStatus {
    Alive,
    Expired,
}

#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Lifetime {
    pub spawn_time: f64,
    pub budget: f64,
}

impl Lifetime {
    /// Start a new budget at `now`.
    ///
    /// A non-positive budget is a misconfiguration: it is logged and the entity
    /// expires on its next tick.
    pub fn arm(now: f64, budget: f64) -> Self {
        if budget <= 0.0 {
            warn!("armed projectile with non-positive lifetime {budget}s; it expires immediately");
        }
        Self { spawn_time: now, budget }
    }

    #[inline]
    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.spawn_time
    }

    #[inline]
    pub fn expires_at(&self) -> f64 {
        self.spawn_time + self.budget
    }

    #[inline]
    pub fn tick(&self, now: f64) -> LifeStatus {
        if now >= self.expires_at() {
            LifeStatus::Expired
        } else {
            LifeStatus::Alive
        }
    }
}

/// Mark expired active entities for return.
///
/// Bombs and missiles that run out of time detonate where they are.
pub fn expire_projectiles(
    time: Res<Time>,
    mut q: Query<(&Pooled, &Lifetime, &mut ProjectileState, &Transform)>,
    mut effects: MessageWriter<EffectRequest>,
) {
    let now = time.elapsed_secs_f64();

    for (pooled, lifetime, mut state, tf) in &mut q {
        if *state != ProjectileState::Active {
            continue;
        }
        if lifetime.tick(now) == LifeStatus::Alive {
            continue;
        }

        *state = ProjectileState::PendingReturn;

        if pooled.kind.explodes() {
            let position = tf.translation.truncate();
            effects.write(EffectRequest::SpawnVisual {
                kind: VisualKind::Explosion,
                position,
                rotation: 0.0,
            });
            effects.write(EffectRequest::Audio(AudioCue::Explosion));
        }
    }
}
