//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `boss_arena::game::configure_headless` to install gameplay plugins.
//!
//! Time advances by exactly one fixed step per `app.update()`, so each update runs the
//! FixedUpdate / FixedPostUpdate pipeline once.

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::ecs::query::QueryFilter;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

/// Fixed step, matching the `Time<Fixed>` default of 64 Hz.
pub const STEP: f64 = 1.0 / 64.0;

pub fn app_headless() -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(STEP)));

    boss_arena::game::configure_headless(&mut app);
    // `App::run` would do this; manual `update()` loops must finish plugin setup themselves.
    app.finish();
    app.cleanup();
    app
}

/// Boot, run Startup and enter the game.
pub fn app_in_game() -> App {
    let mut app = app_headless();
    tick(&mut app, 2);
    app
}

pub fn tick(app: &mut App, updates: usize) {
    for _ in 0..updates {
        app.update();
    }
}

/// The one entity matching `F`.
pub fn single<F: QueryFilter>(app: &mut App) -> Entity {
    let world = app.world_mut();
    let mut q = world.query_filtered::<Entity, F>();
    q.single(world).expect("exactly one matching entity")
}
