//! Core plugin: combat config, shared RNG, the signal bus and the tick ordering.
//!
//! # Tick ordering
//! ```text
//!   FixedUpdate       Sense → Think → Act                 (perception, FSMs, intents)
//!   physics           CollisionStart messages
//!   FixedPostUpdate   Collisions → Damage → Reactions → Signals → PoolCommitSystems
//! ```
//!
//! Every other plugin reads `CombatConfig` at build time, so this plugin must be registered
//! first.

pub mod config;
pub mod loader;
pub mod validation;

use std::path::Path;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::common::signals::GameSignal;
use crate::common::state::GameState;
use crate::plugins::pooling::PoolCommitSystems;

pub use config::CombatConfig;

/// Gameplay RNG. Seeded from `CombatConfig::seed` when set, so runs can be replayed.
#[derive(Resource, Debug, Clone, Deref, DerefMut)]
pub struct GameRng(pub ChaCha8Rng);

impl GameRng {
    pub fn new(seed: Option<u64>) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed.unwrap_or_else(rand::random)))
    }
}

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickSystems {
    /// Read positions into per-actor perception.
    Sense,
    /// Advance state machines.
    Think,
    /// Turn intents into velocity, damage requests and shots.
    Act,
}

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveSystems {
    /// Contact events into damage requests and returns.
    Collisions,
    /// The single writer of `HealthResource`.
    Damage,
    /// Owners react to health changes and to signals.
    Reactions,
    /// Systems that emit follow-up signals.
    Signals,
}

pub fn plugin(app: &mut App) {
    let config = match app.world_mut().remove_resource::<CombatConfig>() {
        Some(preset) => prepare_config(preset),
        None => load_or_default(Path::new(loader::CONFIG_PATH)),
    };
    app.insert_resource(GameRng::new(config.seed))
        .insert_resource(config)
        .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)))
        .add_message::<GameSignal>();

    app.configure_sets(
        FixedUpdate,
        (TickSystems::Sense, TickSystems::Think, TickSystems::Act)
            .chain()
            .run_if(in_state(GameState::InGame)),
    )
    .configure_sets(
        FixedPostUpdate,
        (
            ResolveSystems::Collisions,
            ResolveSystems::Damage,
            ResolveSystems::Reactions,
            ResolveSystems::Signals,
        )
            .chain()
            .after(CollisionEventSystems)
            .before(PoolCommitSystems)
            .run_if(in_state(GameState::InGame)),
    );

    app.add_systems(OnEnter(GameState::InGame), announce_run_start);
}

/// Load the config file, falling back to defaults if it is missing or malformed.
pub fn load_or_default(path: &Path) -> CombatConfig {
    let config = match loader::load_config(path) {
        Ok(config) => {
            info!("combat config loaded from {}", path.display());
            config
        }
        Err(e) => {
            warn!("{e}; using built-in combat defaults");
            CombatConfig::default()
        }
    };
    prepare_config(config)
}

/// Normalise and report every validation issue.
pub fn prepare_config(mut config: CombatConfig) -> CombatConfig {
    validation::normalize(&mut config);
    for issue in validation::validate(&config) {
        warn!("combat config: {issue}");
    }
    config
}

fn announce_run_start(mut signals: MessageWriter<GameSignal>) {
    signals.write(GameSignal::RunStarted);
}
