//! Return commit: recycle finished entities back into their pools.
//!
//! This system is the "owner" of the *Inactive invariants*.
//!
//! Invariant: Inactive pooled entities must be:
//! - hidden
//! - at rest (no linear or angular velocity)
//! - colliding with nothing (filters empty)
//! - released in their pool's bookkeeping

use avian2d::prelude::*;
use bevy::prelude::*;

use super::components::{Pooled, ProjectileState};
use super::pool::{Pools, inactive_layers};

pub fn return_to_pool_commit(
    mut pools: ResMut<Pools>,
    mut q: Query<(
        Entity,
        &Pooled,
        &mut ProjectileState,
        &mut Visibility,
        &mut LinearVelocity,
        &mut AngularVelocity,
        &mut CollisionLayers,
    )>,
) {
    for (e, pooled, mut state, mut vis, mut vel, mut spin, mut layers) in &mut q {
        if *state != ProjectileState::PendingReturn {
            continue;
        }

        *state = ProjectileState::Inactive;
        *vis = Visibility::Hidden;
        vel.0 = Vec2::ZERO;
        spin.0 = 0.0;
        *layers = inactive_layers(pooled.kind);

        pools.get_mut(pooled.kind).release(e);
    }
}
