//! Feature plugins.

use bevy::prelude::*;

pub mod boss;
pub mod collectables;
pub mod combat;
pub mod core;
pub mod enemies;
pub mod physics;
pub mod player;
pub mod pooling;
pub mod projectiles;
pub mod scheduler;
pub mod spawning;
pub mod world;

// Render-only
pub mod camera;

/// Register gameplay plugins that work in headless tests.
///
/// `core` goes first: the others read `CombatConfig` while building.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    pooling::plugin(app);
    scheduler::plugin(app);
    combat::plugin(app);
    projectiles::plugin(app);
    enemies::plugin(app);
    boss::plugin(app);
    player::plugin(app);
    spawning::plugin(app);
    collectables::plugin(app);
    world::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    camera::plugin(app);
    player::input_plugin(app);
}

/// Register all plugins (full app).
pub fn register_all(app: &mut App) {
    register_gameplay(app);
    register_render(app);
}
