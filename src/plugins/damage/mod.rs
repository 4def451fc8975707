//! Damage: health, smoke tiers, and the one place damage is applied.

use bevy::prelude::*;

use crate::plugins::effects::EffectRequest;

pub mod smoke;

use smoke::Health;

/// Apply `amount` to `entity`'s health and forward a tier change to presentation.
///
/// Every damage source goes through here so smoke transitions are never missed.
pub fn apply_damage(
    entity: Entity,
    health: &mut Health,
    amount: f32,
    effects: &mut MessageWriter<EffectRequest>,
) {
    if let Some(transition) = health.apply_damage(amount) {
        debug!("{entity:?} smoke {:?} -> {:?}", transition.from, transition.to);
        effects.write(EffectRequest::Smoke {
            entity,
            from: transition.from,
            to: transition.to,
        });
    }
}
