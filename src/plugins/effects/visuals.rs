//! Asset-free presentation for effect requests.
//!
//! Visual requests become short-lived sprites that grow and fade. Smoke
//! transitions retarget a per-vehicle `SmokeEmitter`, which then puffs at a rate
//! set by its tier. None of this feeds back into gameplay.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::state::GameState;
use crate::plugins::damage::smoke::SmokeTier;

use super::{EffectRequest, VisualKind};

/// A transient sprite that scales up and fades out, then despawns.
#[derive(Component, Debug, Clone)]
pub struct EffectVisual {
    timer: Timer,
    growth: f32,
}

impl EffectVisual {
    pub fn new(seconds: f32, growth: f32) -> Self {
        Self {
            timer: Timer::from_seconds(seconds, TimerMode::Once),
            growth,
        }
    }
}

/// Which smoke effect a vehicle is currently showing.
///
/// Always present on damageable vehicles; a tier change replaces the running
/// effect instead of adding or removing components.
#[derive(Component, Debug, Clone)]
pub struct SmokeEmitter {
    tier: SmokeTier,
    puff: Timer,
}

impl SmokeEmitter {
    /// An emitter already showing `tier`; spawn it from the vehicle's starting
    /// `Health::tier`, since no transition is reported for the initial tier.
    pub fn for_tier(tier: SmokeTier) -> Self {
        let mut emitter = Self {
            tier,
            puff: Timer::from_seconds(1.0, TimerMode::Repeating),
        };
        emitter.start(tier);
        emitter
    }

    #[inline]
    pub fn tier(&self) -> SmokeTier {
        self.tier
    }

    /// Stop whatever is running and start the effect for `tier`.
    pub fn start(&mut self, tier: SmokeTier) {
        self.tier = tier;
        if let Some(interval) = puff_interval(tier) {
            self.puff = Timer::from_seconds(interval, TimerMode::Repeating);
        }
    }
}

fn puff_interval(tier: SmokeTier) -> Option<f32> {
    match tier {
        SmokeTier::Normal => None,
        SmokeTier::Damaged => Some(0.25),
        SmokeTier::Critical => Some(0.08),
    }
}

/// (colour, size, seconds, growth)
fn visual_style(kind: VisualKind) -> (Color, f32, f32, f32) {
    match kind {
        VisualKind::Impact => (Color::srgb(1.0, 0.95, 0.6), 10.0, 0.12, 1.5),
        VisualKind::Explosion => (Color::srgb(1.0, 0.55, 0.15), 48.0, 0.45, 1.8),
        VisualKind::SelfDestruct => (Color::srgb(1.0, 0.8, 0.5), 36.0, 0.35, 2.2),
    }
}

pub fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (
            spawn_effect_visuals,
            retarget_smoke_emitters,
            emit_smoke_puffs.after(retarget_smoke_emitters),
            fade_effect_visuals,
        )
            .run_if(in_state(GameState::InGame)),
    );
}

pub fn spawn_effect_visuals(mut commands: Commands, mut reader: MessageReader<EffectRequest>) {
    for request in reader.read() {
        let EffectRequest::SpawnVisual { kind, position, rotation } = *request else {
            continue;
        };
        let (color, size, seconds, growth) = visual_style(kind);

        commands.spawn((
            Name::new(format!("{kind:?}")),
            EffectVisual::new(seconds, growth),
            Sprite {
                color,
                custom_size: Some(Vec2::splat(size)),
                ..default()
            },
            Transform::from_translation(position.extend(5.0))
                .with_rotation(Quat::from_rotation_z(rotation)),
            DespawnOnExit(GameState::InGame),
        ));
    }
}

pub fn retarget_smoke_emitters(
    mut reader: MessageReader<EffectRequest>,
    mut q: Query<&mut SmokeEmitter>,
) {
    for request in reader.read() {
        let EffectRequest::Smoke { entity, to, .. } = *request else {
            continue;
        };
        // The vehicle may already be gone; a late transition is harmless.
        if let Ok(mut emitter) = q.get_mut(entity) {
            emitter.start(to);
        }
    }
}

fn emit_smoke_puffs(
    time: Res<Time>,
    mut commands: Commands,
    mut q: Query<(&Transform, &mut SmokeEmitter)>,
) {
    for (tf, mut emitter) in &mut q {
        if puff_interval(emitter.tier).is_none() {
            continue;
        }
        emitter.puff.tick(time.delta());
        if !emitter.puff.just_finished() {
            continue;
        }

        let color = match emitter.tier {
            SmokeTier::Critical => Color::srgba(0.15, 0.15, 0.15, 0.9),
            _ => Color::srgba(0.55, 0.55, 0.55, 0.7),
        };

        commands.spawn((
            Name::new("SmokePuff"),
            EffectVisual::new(0.6, 2.0),
            Sprite {
                color,
                custom_size: Some(Vec2::splat(12.0)),
                ..default()
            },
            Transform::from_translation(tf.translation.truncate().extend(3.0)),
            DespawnOnExit(GameState::InGame),
        ));
    }
}

pub fn fade_effect_visuals(
    time: Res<Time>,
    mut commands: Commands,
    mut q: Query<(Entity, &mut EffectVisual, &mut Sprite, &mut Transform)>,
) {
    for (e, mut fx, mut sprite, mut tf) in &mut q {
        fx.timer.tick(time.delta());

        let t = fx.timer.fraction();
        tf.scale = Vec3::splat(1.0 + (fx.growth - 1.0) * t);

        let mut c = sprite.color.to_srgba();
        c.alpha = 1.0 - t;
        sprite.color = c.into();

        if fx.timer.is_finished() {
            commands.entity(e).despawn();
        }
    }
}
