mod common;

use bevy::prelude::*;

use arcade_shooter::common::tunables::PoolCapacities;
use arcade_shooter::plugins::effects::ScheduledEffects;
use arcade_shooter::plugins::enemies::Enemy;
use arcade_shooter::plugins::player::Player;
use arcade_shooter::plugins::projectiles::components::PoolKind;
use arcade_shooter::plugins::projectiles::pool::Pools;

#[test]
fn boots_and_ticks() {
    let mut app = common::app_headless();
    common::step(&mut app, 3);
}

#[test]
fn startup_warms_every_pool() {
    let mut app = common::app_headless();
    common::step(&mut app, 1);

    let caps = PoolCapacities::default();
    let pools = app.world().resource::<Pools>();
    for kind in PoolKind::ALL {
        assert_eq!(pools.get(kind).capacity(), caps.get(kind));
        assert_eq!(pools.get(kind).active_count(), 0);
    }
}

#[test]
fn entering_the_game_spawns_the_scene() {
    let mut app = common::app_headless();
    common::step(&mut app, 2);

    let world = app.world_mut();
    assert_eq!(world.query_filtered::<(), With<Player>>().iter(world).count(), 1);
    assert_eq!(world.query_filtered::<(), With<Enemy>>().iter(world).count(), 3);
    // Radio chatter loop is armed on enter.
    assert!(!world.resource::<ScheduledEffects>().is_empty());
}
