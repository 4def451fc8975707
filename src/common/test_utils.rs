//! Test helpers.
//!
//! Systems that use `Commands` enqueue structural changes; we call `world.flush()`
//! after running so queued commands are applied before assertions.

use std::time::Duration;

use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// Put the generic clock at `secs` elapsed (inserting it if missing).
///
/// Simulation systems read `Res<Time>`, which is what `FixedUpdate` exposes.
pub fn set_clock(world: &mut World, secs: f64) {
    if world.get_resource::<Time>().is_none() {
        world.insert_resource(Time::<()>::default());
    }
    world.resource_mut::<Time>().advance_to(Duration::from_secs_f64(secs));
}
