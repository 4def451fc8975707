//! Weapons plugin: fire control for vehicles.
//!
//! ```text
//! FixedUpdate
//!   Produce: (producers) -> FireRequest
//!            disable_wrecked_weapons -> EnableWeapons
//!            apply_enable_weapons
//!   Fire:    process_fire_requests
//!            FireControl::request_fire -> Pools.acquire -> activate slot
//!            -> EffectRequest bundle + FireResolved
//! ```

use bevy::prelude::*;

use crate::common::state::SimSet;
use crate::plugins::damage::smoke::Health;
use crate::plugins::projectiles::pool::Pools;

pub mod control;
pub mod fire;

pub use control::{ChannelKind, ChannelState, FireControl, FireOutcome, Rejection, WeaponChannel};
pub use fire::{FireRequest, FireResolved};

/// Turn a vehicle's weapons on or off.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnableWeapons {
    pub vehicle: Entity,
    pub enabled: bool,
}

pub fn plugin(app: &mut App) {
    app.add_message::<FireRequest>()
        .add_message::<FireResolved>()
        .add_message::<EnableWeapons>()
        .add_systems(
            FixedUpdate,
            (disable_wrecked_weapons, apply_enable_weapons)
                .chain()
                .in_set(SimSet::Produce),
        )
        .add_systems(
            FixedUpdate,
            fire::process_fire_requests
                .in_set(SimSet::Fire)
                .run_if(resource_exists::<Pools>),
        );
}

/// A wrecked vehicle cannot shoot.
pub fn disable_wrecked_weapons(
    q: Query<(Entity, &Health, &FireControl), Changed<Health>>,
    mut writer: MessageWriter<EnableWeapons>,
) {
    for (e, health, fire_control) in &q {
        if health.is_wrecked() && fire_control.enabled() {
            writer.write(EnableWeapons { vehicle: e, enabled: false });
        }
    }
}

pub fn apply_enable_weapons(
    mut reader: MessageReader<EnableWeapons>,
    mut q: Query<&mut FireControl>,
) {
    for msg in reader.read() {
        let Ok(mut fire_control) = q.get_mut(msg.vehicle) else {
            continue;
        };
        if fire_control.enabled() != msg.enabled {
            info!("{:?} weapons {}", msg.vehicle, if msg.enabled { "enabled" } else { "disabled" });
        }
        fire_control.set_enabled(msg.enabled);
    }
}

#[cfg(test)]
mod tests;
