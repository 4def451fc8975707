//! Global state machine and fixed-step ordering.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    InGame,
}

/// Ordering of the fixed simulation tick.
///
/// ```text
/// FixedUpdate:     Schedule -> Produce -> Fire -> Steer
/// FixedPostUpdate: Resolve (after avian collision events) -> Expire -> Commit
/// ```
///
/// Every set reads the clock once; `Commit` is the only place pooled entities go
/// back to the pool.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Due scheduled effects are released.
    Schedule,
    /// Producers write fire intent.
    Produce,
    /// Fire control consumes intent: the single writer that acquires from pools.
    Fire,
    /// Guidance and movement of live entities.
    Steer,
    /// Impacts mark projectiles for return and apply damage.
    Resolve,
    /// Lifetime expiry marks projectiles for return.
    Expire,
    /// Returns are committed to the pools.
    Commit,
}

pub fn plugin(app: &mut App) {
    app.configure_sets(
        FixedUpdate,
        (SimSet::Schedule, SimSet::Produce, SimSet::Fire, SimSet::Steer)
            .chain()
            .run_if(in_state(GameState::InGame)),
    )
    .configure_sets(
        FixedPostUpdate,
        (SimSet::Resolve, SimSet::Expire, SimSet::Commit)
            .chain()
            .run_if(in_state(GameState::InGame)),
    );
}
