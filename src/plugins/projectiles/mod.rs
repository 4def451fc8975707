//! Projectiles plugin: pooled bullets, casings, bombs and homing missiles.
//!
//! # Philosophy: invariants first
//! Pooled entities are spawned once and never despawned. Their whole life is a
//! value-level state machine:
//!
//! ```text
//!   Inactive --(fire control acquires + activates)--> Active
//!   Active   --(impact | lifetime expiry | self-destruct)--> PendingReturn
//!   PendingReturn --(return commit)--> Inactive
//! ```
//!
//! Exactly two systems touch the pools: the fire consumer (acquire) and the
//! return commit (release). Everything else only writes `ProjectileState`.
//!
//! # Data flow (big picture)
//! ```text
//!   FixedUpdate (fixed dt)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (A) Producer: request_player_fire -> FireRequest                          │
//!│  (B) Consumer: process_fire_requests (weapons)                             │
//!│      - mutates: Pools (acquire), FireControl cooldowns                     │
//!│      - writes: ProjectileState::Active, Lifetime, Guidance, physics state  │
//!│  (C) Guidance: steer_missiles                                              │
//!│      - mutates: Guidance.heading, LinearVelocity, Rotation                 │
//!│      - self-destruct -> PendingReturn                                      │
//!└────────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!   FixedPostUpdate (fixed dt)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (D) Physics emits CollisionStart messages (Avian)                         │
//!│  (E) Resolve: process_projectile_impacts -> PendingReturn + damage         │
//!│  (F) Expire:  expire_projectiles -> PendingReturn                          │
//!│  (G) Commit:  return_to_pool_commit -> Inactive + Pools.release            │
//!└────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Where do we still branch?
//! - Capacity: a pool can be full -> the shot is rejected (capacity decision).
//! - Targets can disappear -> missiles fly straight until they time out.

pub mod collision;
pub mod commit;
pub mod components;
pub mod guidance;
pub mod lifecycle;
pub mod pool;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::prelude::*;

use crate::common::state::SimSet;

pub struct ProjectilesPlugin;

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, pool::init_pools);

        app.add_systems(FixedUpdate, guidance::steer_missiles.in_set(SimSet::Steer));

        app.configure_sets(FixedPostUpdate, SimSet::Resolve.after(CollisionEventSystems));

        app.add_systems(
            FixedPostUpdate,
            (
                collision::process_projectile_impacts.in_set(SimSet::Resolve),
                lifecycle::expire_projectiles.in_set(SimSet::Expire),
                commit::return_to_pool_commit
                    .in_set(SimSet::Commit)
                    .run_if(resource_exists::<pool::Pools>),
            ),
        );
    }
}
