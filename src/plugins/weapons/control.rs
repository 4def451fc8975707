//! Fire control: cooldown-gated channels and the shot state machine.
//!
//! Each channel is `Ready` or `Cooling`; `Cooling -> Ready` happens implicitly
//! once the clock reaches `next_fire_time`, so there is nothing to tick.
//!
//! A request is checked in a fixed order: enabled, cooldown, pool. Every
//! rejection is free: it mutates neither the channel nor the pool. Only a shot
//! whose projectile was actually activated consumes the cooldown.

use std::fmt;

use bevy::prelude::*;

use crate::common::tunables::Tunables;
use crate::plugins::projectiles::components::PoolKind;
use crate::plugins::projectiles::pool::ObjectPool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Gun,
    Bomb,
    Missile,
}

impl ChannelKind {
    #[inline]
    pub fn pool_kind(self) -> PoolKind {
        match self {
            Self::Gun => PoolKind::Bullet,
            Self::Bomb => PoolKind::Bomb,
            Self::Missile => PoolKind::Missile,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Gun => "gun",
            Self::Bomb => "bomb bay",
            Self::Missile => "missile rack",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Ready,
    Cooling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Cooling,
    PoolExhausted,
    Disabled,
    /// The acquired slot could not be activated; the shot was rolled back.
    SpawnFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FireOutcome {
    Fired(Entity),
    Rejected(Rejection),
}

impl FireOutcome {
    #[inline]
    pub fn fired(self) -> Option<Entity> {
        match self {
            Self::Fired(e) => Some(e),
            Self::Rejected(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponChannel {
    cooldown: f64,
    next_fire_time: f64,
}

impl WeaponChannel {
    pub fn new(cooldown: f64) -> Self {
        Self { cooldown, next_fire_time: 0.0 }
    }

    #[inline]
    pub fn cooldown(&self) -> f64 {
        self.cooldown
    }

    #[inline]
    pub fn next_fire_time(&self) -> f64 {
        self.next_fire_time
    }

    #[inline]
    pub fn state(&self, now: f64) -> ChannelState {
        if now < self.next_fire_time {
            ChannelState::Cooling
        } else {
            ChannelState::Ready
        }
    }

    #[inline]
    fn commit(&mut self, now: f64) {
        self.next_fire_time = now + self.cooldown;
    }
}

/// Weapon state of one vehicle: gun, bomb bay and missile rack.
#[derive(Component, Debug, Clone)]
pub struct FireControl {
    gun: WeaponChannel,
    bomb: WeaponChannel,
    missile: WeaponChannel,
    enabled: bool,
}

impl FireControl {
    pub fn new(fire_rate: f64, bomb_cooldown: f64, missile_cooldown: f64) -> Self {
        Self {
            gun: WeaponChannel::new(fire_rate),
            bomb: WeaponChannel::new(bomb_cooldown),
            missile: WeaponChannel::new(missile_cooldown),
            enabled: true,
        }
    }

    pub fn from_tunables(t: &Tunables) -> Self {
        Self::new(t.fire_rate, t.bomb_cooldown, t.missile_cooldown)
    }

    pub fn channel(&self, kind: ChannelKind) -> &WeaponChannel {
        match kind {
            ChannelKind::Gun => &self.gun,
            ChannelKind::Bomb => &self.bomb,
            ChannelKind::Missile => &self.missile,
        }
    }

    fn channel_mut(&mut self, kind: ChannelKind) -> &mut WeaponChannel {
        match kind {
            ChannelKind::Gun => &mut self.gun,
            ChannelKind::Bomb => &mut self.bomb,
            ChannelKind::Missile => &mut self.missile,
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Takes effect immediately. Cooldowns in flight are kept as they are.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Try to fire `kind` at `now`.
    ///
    /// On acceptance a slot is taken from `pool` and handed to `activate`. If
    /// activation fails the slot goes straight back and nothing else changes, so
    /// the caller only emits side effects for `Fired`.
    pub fn request_fire<E: fmt::Debug>(
        &mut self,
        kind: ChannelKind,
        now: f64,
        pool: &mut ObjectPool,
        activate: impl FnOnce(Entity) -> Result<(), E>,
    ) -> FireOutcome {
        debug_assert_eq!(pool.kind(), kind.pool_kind());

        if !self.enabled {
            return FireOutcome::Rejected(Rejection::Disabled);
        }

        let channel = self.channel_mut(kind);
        if channel.state(now) == ChannelState::Cooling {
            return FireOutcome::Rejected(Rejection::Cooling);
        }

        let Some(handle) = pool.acquire() else {
            return FireOutcome::Rejected(Rejection::PoolExhausted);
        };

        if let Err(err) = activate(handle) {
            pool.release(handle);
            error!("{} shot aborted, {handle:?} could not be activated: {err:?}", kind.name());
            return FireOutcome::Rejected(Rejection::SpawnFailed);
        }

        channel.commit(now);
        FireOutcome::Fired(handle)
    }
}
