//! World plugin: arena walls, floor and the checkpoints that move the fight forward.
//!
//! A checkpoint fires once, when the player first crosses its x coordinate. It closes the arena
//! behind the player with a border wall and emits `CheckpointReached`.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::signals::GameSignal;
use crate::common::state::GameState;
use crate::plugins::core::config::{ArenaConfig, CheckpointConfig};
use crate::plugins::core::{CombatConfig, TickSystems};
use crate::plugins::player::Player;

/// Floor tile edge, in meters.
const TILE: f32 = 4.0;
const WALL_COLOR: Color = Color::srgb(0.25, 0.27, 0.33);

#[derive(Component, Debug, Clone)]
pub struct Checkpoint {
    pub config: CheckpointConfig,
    pub reached: bool,
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ArenaWall;

pub fn plugin(app: &mut App) {
    app.add_systems(
        OnEnter(GameState::InGame),
        (spawn_arena, spawn_floor, spawn_checkpoints),
    )
    .add_systems(
        FixedUpdate,
        detect_checkpoints
            .in_set(TickSystems::Sense)
            .run_if(in_state(GameState::InGame)),
    );
}

pub fn wall_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::World,
        [
            Layer::Player,
            Layer::Enemy,
            Layer::PlayerBullet,
            Layer::EnemyBullet,
        ],
    )
}

fn wall(name: String, center: Vec2, size: Vec2) -> impl Bundle {
    (
        Name::new(name),
        ArenaWall,
        Sprite {
            color: WALL_COLOR,
            custom_size: Some(size),
            ..default()
        },
        Transform::from_translation(center.extend(0.0)),
        RigidBody::Static,
        Collider::rectangle(size.x, size.y),
        wall_layers(),
        DespawnOnExit(GameState::InGame),
    )
}

/// Centers and sizes of the four walls enclosing `arena`.
pub fn wall_rects(arena: &ArenaConfig) -> [(&'static str, Vec2, Vec2); 4] {
    let t = arena.wall_thickness;
    let size = arena.max - arena.min;
    let center = (arena.min + arena.max) * 0.5;
    let horizontal = Vec2::new(size.x + t * 2.0, t);
    let vertical = Vec2::new(t, size.y);
    [
        ("WallTop", Vec2::new(center.x, arena.max.y + t * 0.5), horizontal),
        ("WallBottom", Vec2::new(center.x, arena.min.y - t * 0.5), horizontal),
        ("WallLeft", Vec2::new(arena.min.x - t * 0.5, center.y), vertical),
        ("WallRight", Vec2::new(arena.max.x + t * 0.5, center.y), vertical),
    ]
}

pub fn spawn_arena(mut commands: Commands, config: Res<CombatConfig>) {
    for (name, center, size) in wall_rects(&config.arena) {
        commands.spawn(wall(name.into(), center, size));
    }
}

/// Checkerboard of solid-color sprites under the arena.
fn spawn_floor(mut commands: Commands, config: Res<CombatConfig>) {
    let arena = &config.arena;
    let cols = ((arena.max.x - arena.min.x) / TILE).ceil() as i32;
    let rows = ((arena.max.y - arena.min.y) / TILE).ceil() as i32;

    (0..rows)
        .flat_map(|y| (0..cols).map(move |x| (x, y)))
        .for_each(|(x, y)| {
            let pos = arena.min + (Vec2::new(x as f32, y as f32) + 0.5) * TILE;
            let color = if (x + y) % 2 == 0 {
                Color::srgb(0.14, 0.14, 0.16)
            } else {
                Color::srgb(0.12, 0.12, 0.14)
            };
            commands.spawn((
                Sprite::from_color(color, Vec2::splat(TILE)),
                Transform::from_translation(pos.extend(-1.0)),
                DespawnOnExit(GameState::InGame),
            ));
        });
}

pub fn spawn_checkpoints(mut commands: Commands, config: Res<CombatConfig>) {
    for (i, checkpoint) in config.arena.checkpoints.iter().enumerate() {
        commands.spawn((
            Name::new(format!("Checkpoint{i}")),
            Checkpoint {
                config: checkpoint.clone(),
                reached: false,
            },
            DespawnOnExit(GameState::InGame),
        ));
    }
}

pub fn detect_checkpoints(
    mut commands: Commands,
    config: Res<CombatConfig>,
    q_player: Query<&Transform, With<Player>>,
    mut q_checkpoints: Query<&mut Checkpoint>,
    mut signals: MessageWriter<GameSignal>,
) {
    let Ok(player) = q_player.single() else {
        return;
    };
    let x = player.translation.x;

    for mut checkpoint in &mut q_checkpoints {
        if checkpoint.reached || x < checkpoint.config.x {
            continue;
        }
        checkpoint.reached = true;
        let cp = &checkpoint.config;
        info!("checkpoint at x={} reached", cp.x);

        if cp.border != Vec2::ZERO {
            let arena = &config.arena;
            let height = arena.max.y - arena.min.y;
            let center = Vec2::new(cp.border.x, (arena.min.y + arena.max.y) * 0.5);
            commands.spawn(wall(
                format!("Border{}", cp.x),
                center,
                Vec2::new(arena.wall_thickness, height),
            ));
        }
        signals.write(GameSignal::CheckpointReached {
            phase: cp.phase.clone(),
            position: cp.border,
            last: cp.last,
        });
    }
}
