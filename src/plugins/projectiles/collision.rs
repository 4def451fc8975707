use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::plugins::damage::{apply_damage, smoke::Health};
use crate::plugins::effects::{AudioCue, EffectRequest, VisualKind};

use super::components::{Payload, PoolKind, Pooled, ProjectileState};

#[derive(Clone, Copy, Debug)]
struct CollisionTarget {
    collider: Entity,
    body: Option<Entity>,
}

impl CollisionTarget {
    #[inline]
    fn gameplay_owner(self) -> Entity {
        self.body.unwrap_or(self.collider)
    }
}

#[inline]
fn targets(ev: &CollisionStart) -> (CollisionTarget, CollisionTarget) {
    (
        CollisionTarget {
            collider: ev.collider1,
            body: ev.body1,
        },
        CollisionTarget {
            collider: ev.collider2,
            body: ev.body2,
        },
    )
}

#[inline]
fn is_in_layer(layers: &CollisionLayers, layer: Layer) -> bool {
    layers.memberships.has_all(layer)
}

/// Effects for a projectile that stops at `position`.
pub fn write_detonation(kind: PoolKind, position: Vec2, effects: &mut MessageWriter<EffectRequest>) {
    let (visual, cue) = if kind.explodes() {
        (VisualKind::Explosion, AudioCue::Explosion)
    } else {
        (VisualKind::Impact, AudioCue::Impact)
    };
    effects.write(EffectRequest::SpawnVisual {
        kind: visual,
        position,
        rotation: 0.0,
    });
    effects.write(EffectRequest::Audio(cue));
}

/// Resolve projectile impacts reported by physics.
///
/// Any impact ends the projectile: world hits just stop it, enemy hits also apply
/// its payload. Casings are debris and are skipped.
pub fn process_projectile_impacts(
    mut started: MessageReader<CollisionStart>,
    // Fast "is this pooled?" check
    q_is_pooled: Query<(), With<Pooled>>,
    mut q_projectiles: Query<(&Pooled, &Payload, &mut ProjectileState, &Transform)>,
    // Read layers from collider entities
    q_layers: Query<&CollisionLayers>,
    mut q_health: Query<&mut Health>,
    mut effects: MessageWriter<EffectRequest>,
    // Per-frame dedupe
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let (t1, t2) = targets(ev);

        let p1 = q_is_pooled.contains(t1.collider);
        let p2 = q_is_pooled.contains(t2.collider);
        if !(p1 ^ p2) {
            continue; // must be exactly one pooled entity
        }
        let (projectile_side, other_side) = if p1 { (t1, t2) } else { (t2, t1) };

        if !seen.insert(projectile_side.collider) {
            continue;
        }

        let Ok(other_layers) = q_layers.get(other_side.collider) else {
            continue;
        };

        let Ok((pooled, payload, mut state, tf)) = q_projectiles.get_mut(projectile_side.collider) else {
            continue;
        };

        if !pooled.kind.is_projectile() || *state != ProjectileState::Active {
            continue;
        }

        let position = tf.translation.truncate();

        if is_in_layer(other_layers, Layer::World) {
            *state = ProjectileState::PendingReturn;
            write_detonation(pooled.kind, position, &mut effects);
            continue;
        }

        if is_in_layer(other_layers, Layer::Enemy) {
            let enemy = other_side.gameplay_owner();
            if let Ok(mut health) = q_health.get_mut(enemy) {
                apply_damage(enemy, &mut health, payload.damage, &mut effects);
            }

            *state = ProjectileState::PendingReturn;
            write_detonation(pooled.kind, position, &mut effects);
        }
    }
}
