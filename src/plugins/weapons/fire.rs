//! Fire consumer: the single writer that takes entities out of the pools.
//!
//! Producers (player input, anything else) only write `FireRequest`. This system
//! resolves each request through the shooter's `FireControl`, activates the
//! acquired slot, and then emits the shot's effect bundle. Effects are written
//! only after activation succeeded, so a shot is all-or-nothing.

use avian2d::prelude::*;
use bevy::prelude::*;
use rand::Rng;

use crate::common::rng::SimRng;
use crate::common::tunables::Tunables;
use crate::plugins::effects::{AudioCue, EffectRequest, ScheduledEffects};
use crate::plugins::projectiles::components::{Payload, PoolKind, Pooled, ProjectileState};
use crate::plugins::projectiles::guidance::{Guidance, GuidanceTarget};
use crate::plugins::projectiles::lifecycle::Lifetime;
use crate::plugins::projectiles::pool::{Pools, active_layers};

use super::control::{ChannelKind, FireControl, FireOutcome};

#[derive(Message, Clone, Copy, Debug)]
pub struct FireRequest {
    pub shooter: Entity,
    pub channel: ChannelKind,
    pub origin: Vec2,
    pub direction: Vec2,
    /// Lock for the missile rack; ignored by the other channels.
    pub target: Option<Entity>,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FireResolved {
    pub shooter: Entity,
    pub channel: ChannelKind,
    pub outcome: FireOutcome,
}

/// The slot an acquired handle must have to be launched.
#[derive(Debug, Clone, Copy)]
pub struct MissingSlot(pub Entity);

pub type SlotQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut ProjectileState,
        &'static mut Lifetime,
        &'static mut Payload,
        &'static mut Transform,
        &'static mut LinearVelocity,
        &'static mut AngularVelocity,
        &'static mut Visibility,
        &'static mut CollisionLayers,
    ),
    With<Pooled>,
>;

/// Everything needed to put one pooled entity into play.
#[derive(Debug, Clone, Copy)]
pub struct Launch {
    pub kind: PoolKind,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub spin: f32,
    pub damage: f32,
    pub owner: Entity,
    pub lifetime: f64,
}

impl Launch {
    pub fn for_channel(
        channel: ChannelKind,
        t: &Tunables,
        position: Vec2,
        direction: Vec2,
        owner: Entity,
    ) -> Self {
        let (speed, damage, lifetime) = match channel {
            ChannelKind::Gun => (t.bullet_speed, t.bullet_damage, t.bullet_lifetime),
            ChannelKind::Bomb => (t.bomb_speed, t.bomb_damage, t.bomb_lifetime),
            ChannelKind::Missile => (t.missile_speed, t.missile_damage, t.missile_lifetime),
        };
        Self {
            kind: channel.pool_kind(),
            position,
            rotation: direction.to_angle(),
            velocity: direction * speed,
            spin: 0.0,
            damage,
            owner,
            lifetime,
        }
    }
}

/// Write the active invariants onto `handle`. Fails before touching anything if
/// the slot is missing components.
pub fn activate(
    slots: &mut SlotQuery,
    handle: Entity,
    launch: &Launch,
    now: f64,
) -> Result<(), MissingSlot> {
    let Ok((mut state, mut lifetime, mut payload, mut tf, mut vel, mut spin, mut vis, mut layers)) =
        slots.get_mut(handle)
    else {
        return Err(MissingSlot(handle));
    };

    *state = ProjectileState::Active;
    *lifetime = Lifetime::arm(now, launch.lifetime);
    payload.reset_for_fire(launch.damage, launch.owner);
    tf.translation = launch.position.extend(2.0);
    tf.rotation = Quat::from_rotation_z(launch.rotation);
    vel.0 = launch.velocity;
    spin.0 = launch.spin;
    *vis = Visibility::Visible;
    *layers = active_layers(launch.kind);

    Ok(())
}

pub fn process_fire_requests(
    time: Res<Time>,
    tunables: Res<Tunables>,
    mut pools: ResMut<Pools>,
    mut rng: ResMut<SimRng>,
    mut scheduled: ResMut<ScheduledEffects>,
    mut reader: MessageReader<FireRequest>,
    mut q_shooters: Query<&mut FireControl>,
    mut slots: SlotQuery,
    mut q_guidance: Query<&mut Guidance>,
    mut effects: MessageWriter<EffectRequest>,
    mut resolved: MessageWriter<FireResolved>,
) {
    let now = time.elapsed_secs_f64();

    for req in reader.read() {
        let Ok(mut fire_control) = q_shooters.get_mut(req.shooter) else {
            debug!("fire request from {:?}, which has no fire control", req.shooter);
            continue;
        };

        let direction = req.direction.try_normalize().unwrap_or(Vec2::Y);
        let muzzle = req.origin + direction * tunables.muzzle_offset;
        let launch = Launch::for_channel(req.channel, &tunables, muzzle, direction, req.shooter);

        let outcome = fire_control.request_fire(
            req.channel,
            now,
            pools.get_mut(req.channel.pool_kind()),
            |handle| match req.channel {
                ChannelKind::Missile => {
                    let Ok(mut guidance) = q_guidance.get_mut(handle) else {
                        return Err(MissingSlot(handle));
                    };
                    activate(&mut slots, handle, &launch, now)?;
                    *guidance = Guidance {
                        heading: direction,
                        turn_rate_limit: tunables.missile_turn_rate,
                        speed: tunables.missile_speed,
                        target: req.target.map(GuidanceTarget::Entity),
                        self_destruct: tunables.missile_self_destruct,
                    };
                    Ok(())
                }
                ChannelKind::Gun | ChannelKind::Bomb => activate(&mut slots, handle, &launch, now),
            },
        );

        resolved.write(FireResolved {
            shooter: req.shooter,
            channel: req.channel,
            outcome,
        });

        if let FireOutcome::Rejected(reason) = outcome {
            debug!("{} request from {:?} rejected: {reason:?}", req.channel.name(), req.shooter);
            continue;
        }

        match req.channel {
            ChannelKind::Gun => {
                effects.write(EffectRequest::MuzzleFlash { position: muzzle, direction });
                effects.write(EffectRequest::Audio(AudioCue::GunShot));
                eject_shell(
                    &tunables,
                    &mut pools,
                    &mut slots,
                    &mut rng,
                    &mut scheduled,
                    &mut effects,
                    req.origin,
                    direction,
                    req.shooter,
                    now,
                );
            }
            ChannelKind::Bomb => {
                effects.write(EffectRequest::Audio(AudioCue::BombRelease));
            }
            ChannelKind::Missile => {
                effects.write(EffectRequest::MuzzleFlash { position: muzzle, direction });
                effects.write(EffectRequest::Audio(AudioCue::MissileLaunch));
            }
        }
    }
}

/// Throw a casing out of the right side of the gun.
///
/// Casings are cosmetic: an empty shell pool skips the casing, never the shot.
#[allow(clippy::too_many_arguments)]
fn eject_shell(
    tunables: &Tunables,
    pools: &mut Pools,
    slots: &mut SlotQuery,
    rng: &mut SimRng,
    scheduled: &mut ScheduledEffects,
    effects: &mut MessageWriter<EffectRequest>,
    origin: Vec2,
    direction: Vec2,
    owner: Entity,
    now: f64,
) {
    let Some(handle) = pools.shells.acquire() else {
        debug!("shell pool exhausted; casing skipped");
        return;
    };

    let eject_dir = (-direction.perp() - direction * 0.3).normalize();
    let max_torque = tunables.shell_torque.abs();
    let torque = rng.rng.gen_range(-max_torque..=max_torque);

    let launch = Launch {
        kind: PoolKind::Shell,
        position: origin,
        rotation: direction.to_angle(),
        velocity: eject_dir * tunables.shell_eject_speed,
        spin: torque,
        damage: 0.0,
        owner,
        lifetime: tunables.shell_lifetime,
    };

    if let Err(err) = activate(slots, handle, &launch, now) {
        pools.shells.release(handle);
        error!("casing skipped, {handle:?} could not be activated: {err:?}");
        return;
    }

    effects.write(EffectRequest::ShellEject {
        position: origin,
        direction: eject_dir,
        speed: tunables.shell_eject_speed,
        torque,
    });
    scheduled.schedule(
        now + tunables.shell_clink_delay,
        EffectRequest::Audio(AudioCue::ShellClink),
    );
}
