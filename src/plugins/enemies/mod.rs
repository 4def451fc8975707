//! Enemies plugin: patrolling target vehicles with health, smoke and a short
//! death state.
//!
//! ---------------------------
//! HOW THIS IS DESIGNED (ECS)
//! ---------------------------
//! 1) FACTS live in components:
//!    - `Health` (with its smoke tier) and `EnemyLifeState` describe gameplay reality.
//!    - `Patrol` describes where the enemy wants to be.
//!
//! 2) RULES mutate facts in predictable places:
//!    - projectile impacts (elsewhere) apply damage to `Health`.
//!    - this module reads `Health` and transitions `EnemyLifeState`.
//!
//! 3) PRESENTATION is derived from facts:
//!    - smoke comes from `EffectRequest::Smoke`, the death fade from `Dying`.
//!
//! We avoid despawning physics entities inside the fixed physics step.
//! Instead, we mark `PendingDespawn` and despawn later in PostUpdate.
//! Missiles locked on a despawned enemy notice the missing target and fly on.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::Occluder2d;

use crate::common::layers::Layer;
use crate::common::state::{GameState, SimSet};
use crate::common::tunables::Tunables;
use crate::plugins::damage::smoke::Health;
use crate::plugins::effects::{AudioCue, EffectRequest, VisualKind, visuals::SmokeEmitter};

#[derive(Component)]
pub struct Enemy;

/// Enemy lifecycle state machine.
///
/// - Alive: normal gameplay.
/// - Dying: short transition animation.
/// - Dead: terminal marker to stop further state transitions.
#[derive(Component, Debug, Clone)]
pub enum EnemyLifeState {
    Alive,
    Dying { timer: Timer },
    Dead,
}

/// Marker: enemy should be removed from the world.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

/// Lissajous patrol around `anchor`.
///
/// Position follows `anchor + amplitude * sin(frequency * t + phase)`; the patrol
/// system writes the matching velocity so physics does the moving.
#[derive(Component, Debug, Clone, Copy)]
pub struct Patrol {
    pub anchor: Vec2,
    pub amplitude: Vec2,
    pub frequency: Vec2,
    pub phase: f32,
}

impl Patrol {
    /// Velocity at time `t` (the derivative of the patrol path).
    #[inline]
    pub fn velocity(&self, t: f32) -> Vec2 {
        Vec2::new(
            self.amplitude.x * self.frequency.x * (self.frequency.x * t + self.phase).cos(),
            self.amplitude.y * self.frequency.y * (self.frequency.y * t + self.phase).cos(),
        )
    }
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_targets);

    app.add_systems(FixedUpdate, patrol.in_set(SimSet::Steer));

    // Death trigger runs after impacts so it sees updated Health.
    app.add_systems(
        FixedPostUpdate,
        (enemy_death_trigger, enemy_death_progress)
            .chain()
            .after(SimSet::Resolve)
            .run_if(in_state(GameState::InGame)),
    );

    // PostUpdate structural cleanup: despawn after fixed-step work is done.
    app.add_systems(
        PostUpdate,
        despawn_marked_enemies.run_if(in_state(GameState::InGame)),
    );
}

/// Collision layers for an enemy that should no longer interact with anything.
#[inline]
fn non_interacting_enemy_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Enemy, [] as [Layer; 0])
}

fn spawn_targets(mut commands: Commands, tunables: Res<Tunables>) -> Result {
    let thresholds = tunables.health_thresholds()?;
    let enemy_layers = CollisionLayers::new(
        Layer::Enemy,
        [Layer::World, Layer::Player, Layer::PlayerProjectile],
    );

    let routes = [
        (Vec2::new(-320.0, 180.0), Vec2::new(120.0, 40.0), Vec2::new(0.8, 1.6), 0.0),
        (Vec2::new(0.0, 260.0), Vec2::new(200.0, 0.0), Vec2::new(0.5, 0.0), 1.0),
        (Vec2::new(320.0, 180.0), Vec2::new(60.0, 90.0), Vec2::new(1.2, 0.6), 2.0),
    ];

    for (i, (anchor, amplitude, frequency, phase)) in routes.into_iter().enumerate() {
        let health = Health::new(thresholds);
        commands.spawn((
            Name::new(format!("EnemyVehicle{i}")),
            Enemy,
            SmokeEmitter::for_tier(health.tier()),
            health,
            EnemyLifeState::Alive,
            Patrol { anchor, amplitude, frequency, phase },
            Sprite {
                color: Color::srgb(0.9, 0.25, 0.25),
                custom_size: Some(Vec2::splat(32.0)),
                ..default()
            },
            Transform::from_translation((anchor + amplitude * phase.sin()).extend(1.0)),
            RigidBody::Dynamic,
            LockedAxes::ROTATION_LOCKED,
            Collider::circle(16.0),
            enemy_layers,
            Occluder2d::circle(16.0),
            DespawnOnExit(GameState::InGame),
        ));
    }
    Ok(())
}

fn patrol(
    time: Res<Time>,
    mut q: Query<(&Patrol, &EnemyLifeState, &mut LinearVelocity), With<Enemy>>,
) {
    let t = time.elapsed_secs();
    for (patrol, life, mut vel) in &mut q {
        if matches!(life, EnemyLifeState::Alive) {
            vel.0 = patrol.velocity(t);
        }
    }
}

/// Transition Alive -> Dying when the hull is wrecked.
///
/// This system does not despawn. It transitions state, stops interaction and
/// asks for the explosion.
fn enemy_death_trigger(
    mut q: Query<(
        &Health,
        &mut EnemyLifeState,
        &mut CollisionLayers,
        &mut LinearVelocity,
        &Transform,
    ), (With<Enemy>, Without<PendingDespawn>)>,
    mut effects: MessageWriter<EffectRequest>,
) {
    for (health, mut life, mut layers, mut vel, tf) in &mut q {
        if !matches!(*life, EnemyLifeState::Alive) || !health.is_wrecked() {
            continue;
        }

        *life = EnemyLifeState::Dying {
            timer: Timer::from_seconds(0.35, TimerMode::Once),
        };
        *layers = non_interacting_enemy_layers();
        vel.0 = Vec2::ZERO;

        effects.write(EffectRequest::SpawnVisual {
            kind: VisualKind::Explosion,
            position: tf.translation.truncate(),
            rotation: 0.0,
        });
        effects.write(EffectRequest::Audio(AudioCue::Explosion));
    }
}

/// Animate Dying state and mark PendingDespawn once finished.
fn enemy_death_progress(
    time: Res<Time>,
    mut commands: Commands,
    mut q: Query<(Entity, &mut EnemyLifeState, &mut Sprite, &mut Transform), (With<Enemy>, Without<PendingDespawn>)>,
) {
    for (e, mut life, mut sprite, mut tf) in &mut q {
        let EnemyLifeState::Dying { timer } = &mut *life else {
            continue;
        };

        timer.tick(time.delta());

        let t = timer.fraction();
        tf.scale = Vec3::splat(1.0 - t);

        let mut c = sprite.color.to_srgba();
        c.alpha = 1.0 - t;
        sprite.color = c.into();

        if timer.is_finished() {
            *life = EnemyLifeState::Dead;
            commands.entity(e).insert(PendingDespawn);
        }
    }
}

/// Centralizing despawn in one system keeps structural changes predictable.
fn despawn_marked_enemies(mut commands: Commands, q: Query<Entity, With<PendingDespawn>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}

#[cfg(test)]
mod tests;
