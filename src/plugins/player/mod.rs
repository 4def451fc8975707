//! Player vehicle plugin.
//!
//! Pipeline:
//! - Update: sample input and cursor, write `PlayerInput` + `Aim` resources
//! - FixedUpdate: apply velocity; turn held triggers into `FireRequest`s
//! - FixedPostUpdate: ramming an enemy damages the hull
//!
//! Triggers are *held* state, not edges: holding fire keeps requesting shots and
//! fire control's cooldown decides which ones become shots.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::{GameState, SimSet};
use crate::common::tunables::Tunables;
use crate::plugins::camera::MainCamera;
use crate::plugins::damage::{apply_damage, smoke::Health};
use crate::plugins::effects::{EffectRequest, visuals::SmokeEmitter};
use crate::plugins::enemies::{Enemy, EnemyLifeState};
use crate::plugins::weapons::{ChannelKind, FireControl, FireRequest};

#[derive(Component)]
pub struct Player;

#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct PlayerInput {
    pub move_axis: Vec2,
    pub fire_gun: bool,
    pub fire_bomb: bool,
    pub fire_missile: bool,
}

/// Cursor in world space; `None` while the cursor is outside the window.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct Aim {
    pub world_cursor: Option<Vec2>,
}

pub fn plugin(app: &mut App) {
    app.insert_resource(PlayerInput::default())
        .insert_resource(Aim::default())
        .add_systems(OnEnter(GameState::InGame), spawn)
        .add_systems(Update, (gather_input, update_aim_from_cursor))
        .add_systems(
            FixedUpdate,
            (
                apply_movement.in_set(SimSet::Steer),
                request_player_fire.in_set(SimSet::Produce),
            ),
        )
        .add_systems(FixedPostUpdate, process_ramming.in_set(SimSet::Resolve));
}

fn spawn(mut commands: Commands, tunables: Res<Tunables>) -> Result {
    let layers = CollisionLayers::new(Layer::Player, [Layer::World, Layer::Enemy]);
    let health = Health::new(tunables.health_thresholds()?);

    commands.spawn((
        Name::new("Player"),
        Player,
        FireControl::from_tunables(&tunables),
        SmokeEmitter::for_tier(health.tier()),
        health,
        Sprite {
            color: Color::srgb(0.2, 0.75, 0.9),
            custom_size: Some(Vec2::splat(26.0)),
            ..default()
        },
        Transform::from_xyz(0.0, -200.0, 1.0),
        RigidBody::Kinematic,
        Collider::circle(13.0),
        layers,
        LinearVelocity::ZERO,
        CollisionEventsEnabled,
        DespawnOnExit(GameState::InGame),
    ));
    Ok(())
}

/// Sample keyboard + mouse. Headless apps have no input resources; the
/// current `PlayerInput` is then left as it is.
fn gather_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    mut input: ResMut<PlayerInput>,
) {
    let (Some(keys), Some(buttons)) = (keys, buttons) else {
        return;
    };

    let mut axis = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        axis.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        axis.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        axis.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        axis.x += 1.0;
    }

    input.move_axis = axis.normalize_or_zero();
    input.fire_gun = buttons.pressed(MouseButton::Left);
    input.fire_bomb = keys.pressed(KeyCode::Space);
    input.fire_missile = buttons.pressed(MouseButton::Right);
}

/// Convert the cursor to world space through the main camera.
fn update_aim_from_cursor(
    windows: Query<&Window>,
    q_camera: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut aim: ResMut<Aim>,
) {
    let (Ok(window), Ok((camera, camera_tf))) = (windows.single(), q_camera.single()) else {
        return;
    };

    aim.world_cursor = window
        .cursor_position()
        .and_then(|cursor| camera.viewport_to_world_2d(camera_tf, cursor).ok());
}

fn apply_movement(
    tunables: Res<Tunables>,
    input: Res<PlayerInput>,
    mut q_player: Query<&mut LinearVelocity, With<Player>>,
) {
    let Ok(mut vel) = q_player.single_mut() else {
        return;
    };
    vel.0 = input.move_axis * tunables.player_speed;
}

/// The live enemy closest to `point`.
fn nearest_enemy<'a>(
    point: Vec2,
    enemies: impl Iterator<Item = (Entity, &'a Transform, &'a EnemyLifeState)>,
) -> Option<Entity> {
    enemies
        .filter(|(_, _, life)| matches!(life, EnemyLifeState::Alive))
        .map(|(e, tf, _)| (e, tf.translation.truncate().distance_squared(point)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(e, _)| e)
}

/// Producer: held triggers -> `FireRequest`s. Never touches the pools.
pub fn request_player_fire(
    input: Res<PlayerInput>,
    aim: Res<Aim>,
    q_player: Query<(Entity, &Transform), With<Player>>,
    q_enemies: Query<(Entity, &Transform, &EnemyLifeState), With<Enemy>>,
    mut writer: MessageWriter<FireRequest>,
) {
    if !(input.fire_gun || input.fire_bomb || input.fire_missile) {
        return;
    }

    let (player_e, player_tf) = match q_player.single() {
        Ok(v) => v,
        Err(e) => { debug!("No single Player Transform: {e:?}"); return; }
    };
    let origin = player_tf.translation.truncate();

    // Without a cursor we shoot straight ahead.
    let aim_point = aim.world_cursor.unwrap_or(origin + Vec2::Y);
    let direction = (aim_point - origin).try_normalize().unwrap_or(Vec2::Y);

    let mut request = |channel: ChannelKind, target: Option<Entity>| {
        writer.write(FireRequest {
            shooter: player_e,
            channel,
            origin,
            direction,
            target,
        });
    };

    if input.fire_gun {
        request(ChannelKind::Gun, None);
    }
    if input.fire_bomb {
        request(ChannelKind::Bomb, None);
    }
    if input.fire_missile {
        request(ChannelKind::Missile, nearest_enemy(aim_point, q_enemies.iter()));
    }
}

/// Ramming a live enemy costs hull.
pub fn process_ramming(
    tunables: Res<Tunables>,
    mut started: MessageReader<CollisionStart>,
    mut q_player: Query<(Entity, &mut Health), With<Player>>,
    q_enemies: Query<(), With<Enemy>>,
    mut effects: MessageWriter<EffectRequest>,
) {
    let Ok((player_e, mut health)) = q_player.single_mut() else {
        return;
    };

    for ev in started.read() {
        let a = ev.body1.unwrap_or(ev.collider1);
        let b = ev.body2.unwrap_or(ev.collider2);

        let other = if a == player_e {
            b
        } else if b == player_e {
            a
        } else {
            continue;
        };

        if q_enemies.contains(other) {
            apply_damage(player_e, &mut health, tunables.ram_damage, &mut effects);
        }
    }
}
