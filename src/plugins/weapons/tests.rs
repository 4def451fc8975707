use avian2d::prelude::*;
use bevy::{ecs::message::Messages, prelude::*};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::common::rng::SimRng;
use crate::common::test_utils::{run_system_once, set_clock};
use crate::common::tunables::{PoolCapacities, Tunables};
use crate::plugins::damage::smoke::{Health, HealthThresholds};
use crate::plugins::effects::{AudioCue, EffectRequest, ScheduledEffects};
use crate::plugins::projectiles::components::{Payload, PoolKind, ProjectileState};
use crate::plugins::projectiles::guidance::{Guidance, GuidanceTarget};
use crate::plugins::projectiles::pool::{self, EntityFactory, ObjectPool, Pools};

use super::fire::{self, FireRequest, FireResolved};
use super::{
    ChannelKind, ChannelState, EnableWeapons, FireControl, FireOutcome, Rejection,
    apply_enable_weapons, disable_wrecked_weapons,
};

// --------------------------------------------------------------------------------------
// Helpers
// --------------------------------------------------------------------------------------

fn pool_of(world: &mut World, kind: PoolKind, capacity: usize) -> ObjectPool {
    let mut spawn = || world.spawn_empty().id();
    let factory: &mut dyn EntityFactory = &mut spawn;
    ObjectPool::initialize(kind, capacity, Some(factory)).expect("valid pool")
}

fn ok(_: Entity) -> Result<(), ()> {
    Ok(())
}

fn try_fire(fc: &mut FireControl, kind: ChannelKind, now: f64, pool: &mut ObjectPool) -> FireOutcome {
    fc.request_fire(kind, now, pool, ok)
}

// --------------------------------------------------------------------------------------
// FireControl state machine
// --------------------------------------------------------------------------------------

#[test]
fn cooldown_gates_the_gun() {
    let mut world = World::new();
    let mut pool = pool_of(&mut world, PoolKind::Bullet, 8);
    let mut fc = FireControl::new(0.2, 1.0, 1.0);

    assert!(try_fire(&mut fc, ChannelKind::Gun, 0.0, &mut pool).fired().is_some());
    assert_eq!(
        try_fire(&mut fc, ChannelKind::Gun, 0.15, &mut pool),
        FireOutcome::Rejected(Rejection::Cooling)
    );
    assert!(try_fire(&mut fc, ChannelKind::Gun, 0.20, &mut pool).fired().is_some());
    assert_eq!(pool.active_count(), 2);
}

#[test]
fn channel_state_follows_the_clock() {
    let mut world = World::new();
    let mut pool = pool_of(&mut world, PoolKind::Bomb, 2);
    let mut fc = FireControl::new(0.2, 1.5, 1.0);

    assert_eq!(fc.channel(ChannelKind::Bomb).state(0.0), ChannelState::Ready);
    try_fire(&mut fc, ChannelKind::Bomb, 0.5, &mut pool);

    let bomb = fc.channel(ChannelKind::Bomb);
    assert_eq!(bomb.next_fire_time(), 2.0);
    assert_eq!(bomb.state(1.999), ChannelState::Cooling);
    assert_eq!(bomb.state(2.0), ChannelState::Ready);
}

#[test]
fn cooling_rejection_costs_nothing() {
    let mut world = World::new();
    let mut pool = pool_of(&mut world, PoolKind::Bullet, 4);
    let mut fc = FireControl::new(0.2, 1.0, 1.0);

    try_fire(&mut fc, ChannelKind::Gun, 0.0, &mut pool);
    let before = *fc.channel(ChannelKind::Gun);

    for t in [0.01, 0.05, 0.1, 0.19] {
        assert_eq!(
            try_fire(&mut fc, ChannelKind::Gun, t, &mut pool),
            FireOutcome::Rejected(Rejection::Cooling)
        );
    }

    assert_eq!(*fc.channel(ChannelKind::Gun), before);
    assert_eq!(pool.active_count(), 1);
}

#[test]
fn channels_cool_down_independently() {
    let mut world = World::new();
    let mut bullets = pool_of(&mut world, PoolKind::Bullet, 4);
    let mut bombs = pool_of(&mut world, PoolKind::Bomb, 4);
    let mut fc = FireControl::new(0.2, 1.5, 1.0);

    assert!(try_fire(&mut fc, ChannelKind::Gun, 0.0, &mut bullets).fired().is_some());
    assert!(try_fire(&mut fc, ChannelKind::Bomb, 0.0, &mut bombs).fired().is_some());
    assert!(try_fire(&mut fc, ChannelKind::Gun, 0.2, &mut bullets).fired().is_some());
    assert_eq!(
        try_fire(&mut fc, ChannelKind::Bomb, 0.2, &mut bombs),
        FireOutcome::Rejected(Rejection::Cooling)
    );
}

#[test]
fn exhausted_pool_rejects_without_consuming_cooldown() {
    let mut world = World::new();
    let mut pool = pool_of(&mut world, PoolKind::Bullet, 1);
    let mut fc = FireControl::new(0.2, 1.0, 1.0);

    let first = try_fire(&mut fc, ChannelKind::Gun, 0.0, &mut pool).fired().expect("fired");
    assert_eq!(
        try_fire(&mut fc, ChannelKind::Gun, 0.3, &mut pool),
        FireOutcome::Rejected(Rejection::PoolExhausted)
    );
    assert_eq!(fc.channel(ChannelKind::Gun).next_fire_time(), 0.2);

    pool.release(first);
    assert_eq!(try_fire(&mut fc, ChannelKind::Gun, 0.3, &mut pool), FireOutcome::Fired(first));
}

#[test]
fn disabled_rejects_first_and_preserves_cooldown() {
    let mut world = World::new();
    let mut pool = pool_of(&mut world, PoolKind::Bullet, 4);
    let mut fc = FireControl::new(0.2, 1.0, 1.0);

    try_fire(&mut fc, ChannelKind::Gun, 0.0, &mut pool);
    fc.set_enabled(false);

    // Disabled wins over Cooling.
    assert_eq!(
        try_fire(&mut fc, ChannelKind::Gun, 0.1, &mut pool),
        FireOutcome::Rejected(Rejection::Disabled)
    );

    fc.set_enabled(true);
    assert_eq!(
        try_fire(&mut fc, ChannelKind::Gun, 0.15, &mut pool),
        FireOutcome::Rejected(Rejection::Cooling)
    );
    assert!(try_fire(&mut fc, ChannelKind::Gun, 0.2, &mut pool).fired().is_some());
}

#[test]
fn failed_activation_rolls_the_shot_back() {
    let mut world = World::new();
    let mut pool = pool_of(&mut world, PoolKind::Missile, 2);
    let mut fc = FireControl::new(0.2, 1.0, 1.0);

    let outcome = fc.request_fire(ChannelKind::Missile, 0.0, &mut pool, |_| Err("no slot"));

    assert_eq!(outcome, FireOutcome::Rejected(Rejection::SpawnFailed));
    assert_eq!(pool.active_count(), 0);
    assert_eq!(fc.channel(ChannelKind::Missile).state(0.0), ChannelState::Ready);
}

#[test]
fn accepted_shots_are_never_closer_than_the_cooldown() {
    let mut world = World::new();
    let mut pool = pool_of(&mut world, PoolKind::Bullet, 4);
    let mut fc = FireControl::new(0.2, 1.0, 1.0);
    let mut rng = ChaCha8Rng::seed_from_u64(0xF1E);
    let fire_rate = fc.channel(ChannelKind::Gun).cooldown();

    let mut now = 0.0;
    let mut last: Option<f64> = None;
    let mut accepted = 0;
    for _ in 0..5_000 {
        now += rng.gen_range(0.0..0.3);
        match try_fire(&mut fc, ChannelKind::Gun, now, &mut pool) {
            FireOutcome::Fired(e) => {
                if let Some(prev) = last {
                    assert!(now >= prev + fire_rate, "shots at {prev} and {now}");
                }
                last = Some(now);
                accepted += 1;
                pool.release(e);
            }
            FireOutcome::Rejected(reason) => {
                assert_eq!(reason, Rejection::Cooling);
                let prev = last.expect("first request always fires");
                assert!(now < prev + fire_rate);
            }
        }
    }
    assert!(accepted > 0);
}

// --------------------------------------------------------------------------------------
// Fire consumer system
// --------------------------------------------------------------------------------------

fn fire_world(pools: PoolCapacities) -> World {
    let mut world = World::new();
    world.insert_resource(Tunables {
        pools,
        ..Default::default()
    });
    world.insert_resource(SimRng::new(7));
    world.init_resource::<ScheduledEffects>();
    world.init_resource::<Messages<FireRequest>>();
    world.init_resource::<Messages<FireResolved>>();
    world.init_resource::<Messages<EffectRequest>>();
    run_system_once::<_, Result<(), BevyError>, _>(&mut world, pool::init_pools).expect("pools init");
    set_clock(&mut world, 0.0);
    world
}

fn small_pools() -> PoolCapacities {
    PoolCapacities { bullets: 4, shells: 4, bombs: 2, missiles: 2 }
}

struct Shot {
    resolved: Vec<FireResolved>,
    effects: Vec<EffectRequest>,
}

/// Clear last tick's messages, submit `req`, run the consumer once.
fn shoot(world: &mut World, req: FireRequest) -> Shot {
    world.resource_mut::<Messages<FireRequest>>().clear();
    world.resource_mut::<Messages<FireResolved>>().clear();
    world.resource_mut::<Messages<EffectRequest>>().clear();

    world.write_message(req);
    run_system_once(world, fire::process_fire_requests);

    let resolved = run_system_once(world, |mut r: MessageReader<FireResolved>| {
        r.read().copied().collect::<Vec<_>>()
    });
    let effects = run_system_once(world, |mut r: MessageReader<EffectRequest>| {
        r.read().copied().collect::<Vec<_>>()
    });
    Shot { resolved, effects }
}

fn gun_request(shooter: Entity, direction: Vec2) -> FireRequest {
    FireRequest {
        shooter,
        channel: ChannelKind::Gun,
        origin: Vec2::ZERO,
        direction,
        target: None,
    }
}

#[test]
fn gun_shot_activates_a_bullet_and_emits_the_full_bundle() {
    let mut world = fire_world(small_pools());
    let shooter = world.spawn(FireControl::new(0.2, 1.0, 1.0)).id();
    let tunables = world.resource::<Tunables>().clone();

    let shot = shoot(&mut world, gun_request(shooter, Vec2::Y));
    assert_eq!(shot.resolved.len(), 1);
    let bullet = shot.resolved[0].outcome.fired().expect("fired");

    assert_eq!(*world.get::<ProjectileState>(bullet).expect("state"), ProjectileState::Active);
    assert_eq!(*world.get::<Visibility>(bullet).expect("vis"), Visibility::Visible);
    let vel = world.get::<LinearVelocity>(bullet).expect("vel").0;
    assert!((vel - Vec2::Y * tunables.bullet_speed).length() < 1e-3);
    let payload = world.get::<Payload>(bullet).expect("payload");
    assert_eq!(payload.damage, tunables.bullet_damage);
    assert_eq!(payload.owner, Some(shooter));
    assert!(world.resource::<Pools>().bullets.is_active(bullet));

    assert!(shot.effects.contains(&EffectRequest::MuzzleFlash {
        position: Vec2::Y * tunables.muzzle_offset,
        direction: Vec2::Y,
    }));
    assert!(shot.effects.contains(&EffectRequest::Audio(AudioCue::GunShot)));
    assert!(shot.effects.iter().any(|e| matches!(e, EffectRequest::ShellEject { .. })));
}

#[test]
fn gun_shot_ejects_a_spinning_casing_and_schedules_its_clink() {
    let mut world = fire_world(small_pools());
    let shooter = world.spawn(FireControl::new(0.2, 1.0, 1.0)).id();
    let tunables = world.resource::<Tunables>().clone();

    shoot(&mut world, gun_request(shooter, Vec2::X));

    assert_eq!(world.resource::<Pools>().shells.active_count(), 1);
    let shell = world.resource::<Pools>().shells.entries()[0].handle;
    let spin = world.get::<AngularVelocity>(shell).expect("spin").0;
    assert!(spin.abs() <= tunables.shell_torque);

    let mut scheduled = world.resource_mut::<ScheduledEffects>();
    assert_eq!(scheduled.len(), 1);
    let mut released = Vec::new();
    scheduled.release_due(tunables.shell_clink_delay, |r| released.push(r));
    assert_eq!(released, vec![EffectRequest::Audio(AudioCue::ShellClink)]);
}

#[test]
fn cooling_request_is_resolved_but_emits_nothing() {
    let mut world = fire_world(small_pools());
    let shooter = world.spawn(FireControl::new(0.2, 1.0, 1.0)).id();

    shoot(&mut world, gun_request(shooter, Vec2::Y));
    set_clock(&mut world, 0.15);
    let shot = shoot(&mut world, gun_request(shooter, Vec2::Y));

    assert_eq!(
        shot.resolved,
        vec![FireResolved {
            shooter,
            channel: ChannelKind::Gun,
            outcome: FireOutcome::Rejected(Rejection::Cooling),
        }]
    );
    assert!(shot.effects.is_empty());
    assert_eq!(world.resource::<Pools>().bullets.active_count(), 1);

    set_clock(&mut world, 0.2);
    let shot = shoot(&mut world, gun_request(shooter, Vec2::Y));
    assert!(shot.resolved[0].outcome.fired().is_some());
}

#[test]
fn empty_shell_pool_skips_the_casing_not_the_shot() {
    let mut world = fire_world(PoolCapacities { shells: 1, ..small_pools() });
    let shooter = world.spawn(FireControl::new(0.2, 1.0, 1.0)).id();

    shoot(&mut world, gun_request(shooter, Vec2::Y));
    set_clock(&mut world, 0.2);
    let shot = shoot(&mut world, gun_request(shooter, Vec2::Y));

    assert!(shot.resolved[0].outcome.fired().is_some());
    assert!(shot.effects.contains(&EffectRequest::Audio(AudioCue::GunShot)));
    assert!(!shot.effects.iter().any(|e| matches!(e, EffectRequest::ShellEject { .. })));
}

#[test]
fn zero_direction_fires_straight_up() {
    let mut world = fire_world(small_pools());
    let shooter = world.spawn(FireControl::new(0.2, 1.0, 1.0)).id();
    let speed = world.resource::<Tunables>().bullet_speed;

    let shot = shoot(&mut world, gun_request(shooter, Vec2::ZERO));
    let bullet = shot.resolved[0].outcome.fired().expect("fired");
    let vel = world.get::<LinearVelocity>(bullet).expect("vel").0;
    assert!((vel - Vec2::Y * speed).length() < 1e-3);
}

#[test]
fn missile_shot_locks_guidance_onto_the_target() {
    let mut world = fire_world(small_pools());
    let shooter = world.spawn(FireControl::new(0.2, 1.0, 1.0)).id();
    let target = world.spawn(Transform::from_xyz(0.0, 300.0, 0.0)).id();
    let tunables = world.resource::<Tunables>().clone();

    let shot = shoot(
        &mut world,
        FireRequest {
            shooter,
            channel: ChannelKind::Missile,
            origin: Vec2::ZERO,
            direction: Vec2::new(3.0, 4.0),
            target: Some(target),
        },
    );
    let missile = shot.resolved[0].outcome.fired().expect("fired");

    let g = world.get::<Guidance>(missile).expect("guidance");
    assert_eq!(g.target, Some(GuidanceTarget::Entity(target)));
    assert!((g.heading - Vec2::new(0.6, 0.8)).length() < 1e-5);
    assert_eq!(g.speed, tunables.missile_speed);
    assert_eq!(g.self_destruct, tunables.missile_self_destruct);
    assert!(shot.effects.contains(&EffectRequest::Audio(AudioCue::MissileLaunch)));
    assert_eq!(world.resource::<Pools>().shells.active_count(), 0);
}

#[test]
fn bomb_pool_exhaustion_is_reported() {
    let mut world = fire_world(PoolCapacities { bombs: 1, ..small_pools() });
    let shooter = world.spawn(FireControl::new(0.2, 0.5, 1.0)).id();
    let bomb = |shooter| FireRequest {
        shooter,
        channel: ChannelKind::Bomb,
        origin: Vec2::ZERO,
        direction: Vec2::Y,
        target: None,
    };

    let shot = shoot(&mut world, bomb(shooter));
    assert!(shot.effects.contains(&EffectRequest::Audio(AudioCue::BombRelease)));

    set_clock(&mut world, 1.0);
    let shot = shoot(&mut world, bomb(shooter));
    assert_eq!(shot.resolved[0].outcome, FireOutcome::Rejected(Rejection::PoolExhausted));
    assert!(shot.effects.is_empty());
}

// --------------------------------------------------------------------------------------
// Enable / disable
// --------------------------------------------------------------------------------------

#[test]
fn wrecked_vehicle_loses_its_weapons() {
    let mut world = World::new();
    world.init_resource::<Messages<EnableWeapons>>();

    let mut health = Health::new(HealthThresholds::new(60.0, 25.0).expect("thresholds"));
    health.set_health(0.0);
    let vehicle = world.spawn((health, FireControl::new(0.2, 1.0, 1.0))).id();

    run_system_once(&mut world, disable_wrecked_weapons);
    run_system_once(&mut world, apply_enable_weapons);

    assert!(!world.get::<FireControl>(vehicle).expect("fire control").enabled());
}

#[test]
fn enable_message_restores_fire() {
    let mut world = World::new();
    world.init_resource::<Messages<EnableWeapons>>();

    let mut fc = FireControl::new(0.2, 1.0, 1.0);
    fc.set_enabled(false);
    let vehicle = world.spawn(fc).id();

    world.write_message(EnableWeapons { vehicle, enabled: true });
    run_system_once(&mut world, apply_enable_weapons);

    assert!(world.get::<FireControl>(vehicle).expect("fire control").enabled());
}
