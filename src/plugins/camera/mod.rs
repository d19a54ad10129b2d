//! Camera plugin (render only): a 2D camera that eases toward the player.
//!
//! A system cannot hold `Query<&Transform>` and `Query<&mut Transform>` unless Bevy can prove
//! them disjoint, so both queries carry a `Without<...>` filter for the other side.

use bevy::camera::ScalingMode;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::state::GameState;
use crate::plugins::player::Player;

/// Visible world height, in meters.
const VIEW_HEIGHT: f32 = 14.0;

#[derive(Component)]
pub struct MainCamera {
    pub responsiveness: f32,
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_camera)
        .add_systems(
            PostUpdate,
            follow_player
                .before(TransformSystems::Propagate)
                .run_if(in_state(GameState::InGame)),
        );
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2d,
        MainCamera { responsiveness: 5.0 },
        Projection::from(OrthographicProjection {
            scaling_mode: ScalingMode::FixedVertical {
                viewport_height: VIEW_HEIGHT,
            },
            ..OrthographicProjection::default_2d()
        }),
        Transform::from_xyz(0.0, 0.0, 999.0),
        DespawnOnExit(GameState::InGame),
    ));
}

fn follow_player(
    time: Res<Time>,
    q_player: Query<&Transform, (With<Player>, Without<MainCamera>)>,
    mut q_cam: Query<(&mut Transform, &MainCamera), Without<Player>>,
) {
    let (Ok(tf_player), Ok((mut tf_cam, main_cam))) = (q_player.single(), q_cam.single_mut()) else {
        return;
    };

    let alpha = 1.0 - (-main_cam.responsiveness * time.delta_secs()).exp();
    let target = tf_player.translation.truncate();
    let current = tf_cam.translation.truncate();
    let eased = current + (target - current) * alpha;
    tf_cam.translation.x = eased.x;
    tf_cam.translation.y = eased.y;
}
