//! Homing guidance: bounded per-step turning toward a moving target.
//!
//! Guidance only ever changes heading. Forward motion is a constant speed along
//! the heading, handed to physics as a velocity every step.
//!
//! The turn limit is a per-step angle, not a per-second rate, so the law behaves
//! identically regardless of the fixed timestep.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::plugins::effects::{AudioCue, EffectRequest, VisualKind};

use super::components::ProjectileState;
use super::lifecycle::Lifetime;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GuidanceTarget {
    Entity(Entity),
    Point(Vec2),
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Guidance {
    /// Unit vector.
    pub heading: Vec2,
    /// Radians per step.
    pub turn_rate_limit: f32,
    pub speed: f32,
    pub target: Option<GuidanceTarget>,
    /// Hard expiry measured from the lifetime's spawn time.
    pub self_destruct: Option<f64>,
}

impl Default for Guidance {
    fn default() -> Self {
        Self {
            heading: Vec2::X,
            turn_rate_limit: 0.0,
            speed: 0.0,
            target: None,
            self_destruct: None,
        }
    }
}

impl Guidance {
    #[inline]
    pub fn self_destruct_due(&self, lifetime: &Lifetime, now: f64) -> bool {
        self.self_destruct
            .is_some_and(|budget| now >= lifetime.spawn_time + budget)
    }
}

/// One guidance step: rotate `heading` toward `target` by at most `turn_rate_limit`.
///
/// If `position` and `target` coincide there is no direction to steer to and the
/// heading is returned unchanged.
pub fn steer(position: Vec2, heading: Vec2, target: Vec2, turn_rate_limit: f32) -> Vec2 {
    let Some(ideal) = (target - position).try_normalize() else {
        return heading;
    };

    // Signed angle in (-PI, PI]; sign is the turn direction.
    let delta = heading.perp_dot(ideal).atan2(heading.dot(ideal));
    let limit = turn_rate_limit.max(0.0);
    let applied = delta.clamp(-limit, limit);

    Vec2::from_angle(applied).rotate(heading).normalize()
}

/// Steer every live missile one step and push its velocity to physics.
pub fn steer_missiles(
    time: Res<Time>,
    mut q_missiles: Query<(
        &mut ProjectileState,
        &mut Guidance,
        &Lifetime,
        &Transform,
        &mut LinearVelocity,
        &mut Rotation,
    )>,
    q_targets: Query<&Transform, Without<Guidance>>,
    mut effects: MessageWriter<EffectRequest>,
) {
    let now = time.elapsed_secs_f64();

    for (mut state, mut guidance, lifetime, tf, mut vel, mut rot) in &mut q_missiles {
        if *state != ProjectileState::Active {
            continue;
        }

        let position = tf.translation.truncate();

        if guidance.self_destruct_due(lifetime, now) {
            *state = ProjectileState::PendingReturn;
            effects.write(EffectRequest::SpawnVisual {
                kind: VisualKind::SelfDestruct,
                position,
                rotation: guidance.heading.to_angle(),
            });
            effects.write(EffectRequest::Audio(AudioCue::Explosion));
            continue;
        }

        let aim_point = match guidance.target {
            Some(GuidanceTarget::Point(p)) => Some(p),
            Some(GuidanceTarget::Entity(e)) => match q_targets.get(e) {
                Ok(target_tf) => Some(target_tf.translation.truncate()),
                Err(_) => {
                    debug!("missile lost target {e:?}; flying straight");
                    guidance.target = None;
                    None
                }
            },
            None => None,
        };

        if let Some(aim_point) = aim_point {
            guidance.heading = steer(position, guidance.heading, aim_point, guidance.turn_rate_limit);
        }

        vel.0 = guidance.heading * guidance.speed;
        *rot = Rotation::radians(guidance.heading.to_angle());
    }
}
