//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `arcade_shooter::game::configure_headless` to install gameplay plugins.
//! - time advances by exactly one fixed tick per `app.update()`.

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use arcade_shooter::common::state::SimSet;
use arcade_shooter::plugins::core::TICK_HZ;
use arcade_shooter::plugins::weapons::FireResolved;

pub fn app_headless() -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
        1.0 / TICK_HZ,
    )));

    arcade_shooter::game::configure_headless(&mut app);
    // `App::run` normally does this; manual `update()` stepping needs it explicitly
    // so plugins can finish setup (e.g. avian registers its diagnostics resources here).
    app.finish();
    app.cleanup();
    app
}

pub fn step(app: &mut App, updates: usize) {
    for _ in 0..updates {
        app.update();
    }
}

/// Every `FireResolved` seen so far, in order.
#[derive(Resource, Default, Debug)]
pub struct ShotLog(pub Vec<FireResolved>);

fn record_shots(mut reader: MessageReader<FireResolved>, mut log: ResMut<ShotLog>) {
    log.0.extend(reader.read().copied());
}

pub fn record_fire_outcomes(app: &mut App) {
    app.init_resource::<ShotLog>()
        .add_systems(FixedUpdate, record_shots.after(SimSet::Fire));
}
