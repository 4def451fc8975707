//! Core plugin: shared resources, the fixed tick and global settings.

use bevy::prelude::*;

use crate::common::rng::SimRng;
use crate::common::state;
use crate::common::tunables::Tunables;

/// Simulation tick rate.
pub const TICK_HZ: f64 = 60.0;

pub fn plugin(app: &mut App) {
    app.init_resource::<Tunables>();
    let seed = app.world().resource::<Tunables>().rng_seed;

    app.insert_resource(SimRng::new(seed));
    app.insert_resource(Time::<Fixed>::from_hz(TICK_HZ));
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));

    state::plugin(app);
}
