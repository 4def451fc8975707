use std::time::Duration;

use avian2d::prelude::*;
use bevy::{ecs::message::Messages, prelude::*};

use crate::common::test_utils::run_system_once;
use crate::common::tunables::Tunables;
use crate::plugins::damage::smoke::{Health, SmokeTier};
use crate::plugins::effects::{AudioCue, EffectRequest, VisualKind};

use super::*;

fn wrecked_health() -> Health {
    let mut health = Health::new(Tunables::default().health_thresholds().expect("thresholds"));
    health.set_health(0.0);
    health
}

#[test]
fn patrol_velocity_is_the_derivative_of_the_path() {
    let patrol = Patrol {
        anchor: Vec2::new(10.0, -5.0),
        amplitude: Vec2::new(120.0, 40.0),
        frequency: Vec2::new(0.8, 1.6),
        phase: 0.3,
    };
    let position = |t: f32| {
        patrol.anchor
            + Vec2::new(
                patrol.amplitude.x * (patrol.frequency.x * t + patrol.phase).sin(),
                patrol.amplitude.y * (patrol.frequency.y * t + patrol.phase).sin(),
            )
    };

    let (t, h) = (1.3_f32, 1e-3_f32);
    let numeric = (position(t + h) - position(t - h)) / (2.0 * h);
    assert!((numeric - patrol.velocity(t)).length() < 0.5);
}

#[test]
fn spawn_targets_creates_live_damageable_enemies() {
    let mut world = World::new();
    world.insert_resource(Tunables::default());
    run_system_once::<_, Result<(), BevyError>, _>(&mut world, spawn_targets).expect("spawn");

    let mut q = world.query_filtered::<(&Health, &EnemyLifeState, &CollisionLayers), With<Enemy>>();
    let all: Vec<_> = q.iter(&world).collect();
    assert_eq!(all.len(), 3);
    for (health, life, layers) in all {
        assert_eq!(health.value(), 100.0);
        assert!(matches!(life, EnemyLifeState::Alive));
        assert!(layers.filters.has_all(crate::common::layers::Layer::PlayerProjectile));
    }
}

#[test]
fn enemy_smoke_matches_its_starting_tier() {
    let mut world = World::new();
    world.insert_resource(Tunables {
        damaged_threshold: 100.0,
        critical_threshold: 40.0,
        ..Default::default()
    });
    run_system_once::<_, Result<(), BevyError>, _>(&mut world, spawn_targets).expect("spawn");

    let mut q = world.query_filtered::<(&Health, &SmokeEmitter), With<Enemy>>();
    for (health, emitter) in q.iter(&world) {
        assert_eq!(health.tier(), SmokeTier::Damaged);
        assert_eq!(emitter.tier(), health.tier());
    }
}

#[test]
fn wrecked_enemy_starts_dying_and_explodes() {
    let mut world = World::new();
    world.init_resource::<Messages<EffectRequest>>();

    let e = world
        .spawn((
            Enemy,
            wrecked_health(),
            EnemyLifeState::Alive,
            CollisionLayers::new(crate::common::layers::Layer::Enemy, [crate::common::layers::Layer::PlayerProjectile]),
            LinearVelocity(Vec2::new(30.0, 0.0)),
            Transform::from_xyz(4.0, 8.0, 1.0),
        ))
        .id();

    run_system_once(&mut world, enemy_death_trigger);

    assert!(matches!(world.get::<EnemyLifeState>(e), Some(EnemyLifeState::Dying { .. })));
    assert_eq!(world.get::<LinearVelocity>(e).expect("vel").0, Vec2::ZERO);
    let layers = world.get::<CollisionLayers>(e).expect("layers");
    assert!(!layers.filters.has_all(crate::common::layers::Layer::PlayerProjectile));

    let effects = run_system_once(&mut world, |mut r: MessageReader<EffectRequest>| {
        r.read().copied().collect::<Vec<_>>()
    });
    assert_eq!(
        effects,
        vec![
            EffectRequest::SpawnVisual {
                kind: VisualKind::Explosion,
                position: Vec2::new(4.0, 8.0),
                rotation: 0.0,
            },
            EffectRequest::Audio(AudioCue::Explosion),
        ]
    );

    // Already dying: no second explosion.
    run_system_once(&mut world, enemy_death_trigger);
    let effects = run_system_once(&mut world, |mut r: MessageReader<EffectRequest>| {
        r.read().count()
    });
    assert_eq!(effects, 2);
}

#[test]
fn dying_enemy_is_marked_for_despawn_then_removed() {
    let mut world = World::new();
    world.insert_resource(Time::<()>::default());
    world.resource_mut::<Time>().advance_by(Duration::from_secs_f32(0.4));

    let e = world
        .spawn((
            Enemy,
            EnemyLifeState::Dying { timer: Timer::from_seconds(0.35, TimerMode::Once) },
            Sprite::default(),
            Transform::default(),
        ))
        .id();

    run_system_once(&mut world, enemy_death_progress);
    assert!(matches!(world.get::<EnemyLifeState>(e), Some(EnemyLifeState::Dead)));
    assert!(world.get::<PendingDespawn>(e).is_some());

    run_system_once(&mut world, despawn_marked_enemies);
    assert!(world.get_entity(e).is_err());
}

#[test]
fn healthy_enemy_is_left_alone() {
    let mut world = World::new();
    world.init_resource::<Messages<EffectRequest>>();
    let health = Health::new(Tunables::default().health_thresholds().expect("thresholds"));

    let e = world
        .spawn((
            Enemy,
            health,
            EnemyLifeState::Alive,
            CollisionLayers::default(),
            LinearVelocity::ZERO,
            Transform::default(),
        ))
        .id();

    run_system_once(&mut world, enemy_death_trigger);
    assert!(matches!(world.get::<EnemyLifeState>(e), Some(EnemyLifeState::Alive)));
}
