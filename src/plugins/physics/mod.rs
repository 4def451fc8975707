//! Physics plugin: avian2d with a top-down (gravity-free) world.
//!
//! Reads `Tunables`, so it must be registered after the core plugin.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::tunables::Tunables;

pub fn plugin(app: &mut App) {
    let ppm = app
        .world()
        .get_resource::<Tunables>()
        .map(|t| t.pixels_per_meter)
        .unwrap_or_else(|| Tunables::default().pixels_per_meter);
    app.add_plugins(PhysicsPlugins::default().with_length_unit(ppm));
    app.insert_resource(Gravity(Vec2::ZERO));
}
