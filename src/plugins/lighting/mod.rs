//! Lighting plugin (Firefly) (render-only).
//!
//! A soft headlight follows the player vehicle. A second light sits dark at the
//! muzzle and is the render sink for `EffectRequest::MuzzleFlash`: each flash
//! snaps it to full colour at the muzzle position, then it fades back to black.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::*;

use crate::common::state::GameState;
use crate::plugins::effects::EffectRequest;
use crate::plugins::player::Player;

const FLASH_COLOR: Vec3 = Vec3::new(1.0, 0.8, 0.45);
/// Fraction of flash brightness lost per second.
const FLASH_DECAY: f32 = 14.0;

#[derive(Component)]
pub struct PlayerLight;

#[derive(Component, Debug, Default)]
pub struct MuzzleLight {
    intensity: f32,
}

pub fn plugin(app: &mut App) {
    if !app.is_plugin_added::<FireflyPlugin>() {
        app.add_plugins(FireflyPlugin);
    }

    app.add_systems(OnEnter(GameState::InGame), setup)
        .add_systems(Update, (follow_player_light, flash_muzzle_light));
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Name::new("PlayerLight"),
        PlayerLight,
        PointLight2d {
            color: Color::srgb(1.0, 0.9, 0.75),
            radius: 450.0,
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 10.0),
        DespawnOnExit(GameState::InGame),
    ));

    commands.spawn((
        Name::new("MuzzleLight"),
        MuzzleLight::default(),
        PointLight2d {
            color: Color::BLACK,
            radius: 140.0,
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 10.0),
        DespawnOnExit(GameState::InGame),
    ));
}

fn follow_player_light(
    q_player: Query<&Transform, (With<Player>, Without<PlayerLight>)>,
    mut q_light: Query<&mut Transform, (With<PlayerLight>, Without<Player>)>,
) {
    let (Ok(tf_player), Ok(mut tf_light)) = (q_player.single(), q_light.single_mut()) else {
        return;
    };

    tf_light.translation.x = tf_player.translation.x;
    tf_light.translation.y = tf_player.translation.y;
}

fn flash_muzzle_light(
    time: Res<Time>,
    mut reader: MessageReader<EffectRequest>,
    mut q_light: Query<(&mut MuzzleLight, &mut PointLight2d, &mut Transform)>,
) {
    let Ok((mut muzzle, mut light, mut tf)) = q_light.single_mut() else {
        return;
    };

    for request in reader.read() {
        if let EffectRequest::MuzzleFlash { position, .. } = *request {
            muzzle.intensity = 1.0;
            tf.translation.x = position.x;
            tf.translation.y = position.y;
        }
    }

    muzzle.intensity = (muzzle.intensity - FLASH_DECAY * time.delta_secs()).max(0.0);
    let c = FLASH_COLOR * muzzle.intensity;
    light.color = Color::srgb(c.x, c.y, c.z);
}
