//! Arena plugin: boundary walls and cover blocks.
//!
//! Everything here sits on the `World` layer. Projectiles that reach it stop and
//! go back to their pool; casings bounce off it.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;

pub const HALF_W: f32 = 1024.0;
pub const HALF_H: f32 = 576.0;
const WALL_THICKNESS: f32 = 30.0;

/// Cover blocks: (centre, size).
const COVER: [(Vec2, Vec2); 4] = [
    (Vec2::new(-420.0, -40.0), Vec2::new(90.0, 30.0)),
    (Vec2::new(420.0, -40.0), Vec2::new(90.0, 30.0)),
    (Vec2::new(-160.0, 60.0), Vec2::new(30.0, 110.0)),
    (Vec2::new(160.0, 60.0), Vec2::new(30.0, 110.0)),
];

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_arena);
}

fn arena_blocks() -> impl Iterator<Item = (String, Vec2, Vec2)> {
    let t = WALL_THICKNESS;
    let walls = [
        ("WallTop", Vec2::new(0.0, HALF_H + t * 0.5), Vec2::new(HALF_W * 2.0 + t * 2.0, t)),
        ("WallBottom", Vec2::new(0.0, -HALF_H - t * 0.5), Vec2::new(HALF_W * 2.0 + t * 2.0, t)),
        ("WallLeft", Vec2::new(-HALF_W - t * 0.5, 0.0), Vec2::new(t, HALF_H * 2.0)),
        ("WallRight", Vec2::new(HALF_W + t * 0.5, 0.0), Vec2::new(t, HALF_H * 2.0)),
    ]
    .into_iter()
    .map(|(name, pos, size)| (name.to_string(), pos, size));

    let cover = COVER
        .into_iter()
        .enumerate()
        .map(|(i, (pos, size))| (format!("Cover{i}"), pos, size));

    walls.chain(cover)
}

fn spawn_arena(mut commands: Commands) {
    let layers = CollisionLayers::new(
        Layer::World,
        [Layer::Player, Layer::Enemy, Layer::PlayerProjectile, Layer::Debris],
    );

    for (name, pos, size) in arena_blocks() {
        commands.spawn((
            Name::new(name),
            Sprite {
                color: Color::srgb(0.25, 0.27, 0.33),
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(pos.extend(0.0)),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            layers,
            DespawnOnExit(GameState::InGame),
        ));
    }
}
