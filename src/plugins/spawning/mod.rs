//! Spawning plugin: keeps enemies and collectables flowing around the player from named tables.
//!
//! Each category has its own [`Spawner`]. On its interval a spawner counts the active actors of
//! its pools and, below the table's ceiling, rolls one entry and acquires it at a spawn point in
//! the distance band around the player.
//!
//! - Act: `run_spawners`
//! - Signals: `react_to_spawn_signals` enables, stops and switches tables

use avian2d::prelude::*;
use bevy::prelude::*;
use rand::Rng;

use crate::common::signals::GameSignal;
use crate::common::state::GameState;
use crate::plugins::core::config::{SpawnDistance, SpawnEntry, SpawnTable, SpawningConfig};
use crate::plugins::core::{CombatConfig, GameRng, ResolveSystems, TickSystems};
use crate::plugins::player::Player;
use crate::plugins::pooling::{ActorPools, Blueprints, CommandsHost, PoolKey};

const ENEMY_Z: f32 = 1.0;
const COLLECTABLE_Z: f32 = 0.5;

/// Pick the entry for a roll `r` in `[0, 1)`: the last entry whose chance exceeds `r`.
///
/// Later entries win over earlier ones, so a table lists its common actors first.
pub fn select_entry(entries: &[SpawnEntry], roll: f32) -> Option<&SpawnEntry> {
    entries.iter().rev().find(|entry| roll < entry.chance)
}

/// Points inside the distance band around `player`.
pub fn points_in_band(points: &[Vec2], player: Vec2, band: SpawnDistance) -> Vec<Vec2> {
    points
        .iter()
        .copied()
        .filter(|p| (band.min..=band.max).contains(&p.distance(player)))
        .collect()
}

/// A random eligible point, jittered by up to `radius`.
pub fn pick_spawn_point(
    points: &[Vec2],
    player: Vec2,
    band: SpawnDistance,
    radius: f32,
    rng: &mut impl Rng,
) -> Option<Vec2> {
    let eligible = points_in_band(points, player, band);
    if eligible.is_empty() {
        return None;
    }
    let point = eligible[rng.random_range(0..eligible.len())];
    if radius <= 0.0 {
        return Some(point);
    }
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    let distance = radius * rng.random::<f32>().sqrt();
    Some(point + Vec2::from_angle(angle) * distance)
}

/// Spawn state of one category.
#[derive(Debug, Clone)]
pub struct Spawner {
    label: &'static str,
    tables: Vec<SpawnTable>,
    current: Option<usize>,
    next_spawn: f32,
    enabled: bool,
    /// Pools counted against the table's ceiling.
    pub keys: Vec<PoolKey>,
    pub points: Vec<Vec2>,
    pub distance: SpawnDistance,
    pub spawn_radius: f32,
    pub z: f32,
}

impl Spawner {
    pub fn new(label: &'static str, tables: Vec<SpawnTable>, initial: &str) -> Self {
        let current = tables.iter().position(|t| t.name == initial);
        if current.is_none() {
            error!("{label} spawn table '{initial}' not found");
        }
        Self {
            label,
            tables,
            current,
            next_spawn: 0.0,
            enabled: false,
            keys: Vec::new(),
            points: Vec::new(),
            distance: SpawnDistance::default(),
            spawn_radius: 0.0,
            z: 0.0,
        }
    }

    pub fn enemies(config: &CombatConfig) -> Self {
        let spawning = &config.spawning;
        Self {
            keys: config.enemy_keys().cloned().collect(),
            points: spawning.enemy_points.clone(),
            distance: spawning.enemy_distance,
            spawn_radius: spawning.spawn_radius,
            z: ENEMY_Z,
            ..Self::new("enemy", spawning.enemy_tables.clone(), &spawning.initial_enemy_table)
        }
    }

    pub fn collectables(config: &CombatConfig) -> Self {
        let spawning: &SpawningConfig = &config.spawning;
        Self {
            keys: config.collectable_keys().cloned().collect(),
            points: spawning.collectable_points.clone(),
            distance: spawning.collectable_distance,
            spawn_radius: spawning.spawn_radius,
            z: COLLECTABLE_Z,
            ..Self::new(
                "collectable",
                spawning.collectable_tables.clone(),
                &spawning.initial_collectable_table,
            )
        }
    }

    #[inline]
    pub fn table(&self) -> Option<&SpawnTable> {
        self.current.and_then(|i| self.tables.get(i))
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn next_spawn(&self) -> f32 {
        self.next_spawn
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name == name)
    }

    /// Make `name` the current table. Returns `true` if it changed.
    pub fn switch_table(&mut self, name: &str) -> bool {
        if self.table().is_some_and(|t| t.name == name) {
            warn!("{} spawning already uses table '{name}'", self.label);
            return false;
        }
        let Some(index) = self.tables.iter().position(|t| t.name == name) else {
            error!("{} spawn table '{name}' not found", self.label);
            return false;
        };
        info!("{} spawning switched to table '{name}'", self.label);
        self.current = Some(index);
        true
    }

    /// Whether a spawn should be attempted at `now` with `active` actors in play.
    pub fn is_due(&self, now: f32, active: usize) -> bool {
        self.enabled
            && now >= self.next_spawn
            && self.table().is_some_and(|t| active < t.max_concurrent)
    }

    /// Roll the current table. Restarts the interval whether or not an entry was chosen.
    pub fn roll(&mut self, now: f32, roll: f32) -> Option<PoolKey> {
        let table = self.table()?;
        let interval = table.interval;
        let chosen = select_entry(&table.entries, roll).map(|e| e.resource.clone());
        self.next_spawn = now + interval;
        chosen
    }

    fn active_count(&self, pools: &ActorPools) -> usize {
        self.keys.iter().map(|k| pools.active_count(k)).sum()
    }
}

#[derive(Resource, Debug, Clone)]
pub struct Spawners {
    pub enemies: Spawner,
    pub collectables: Spawner,
}

impl Spawners {
    pub fn from_config(config: &CombatConfig) -> Self {
        Self {
            enemies: Spawner::enemies(config),
            collectables: Spawner::collectables(config),
        }
    }
}

pub fn plugin(app: &mut App) {
    let spawners = Spawners::from_config(app.world().resource::<CombatConfig>());

    app.insert_resource(spawners)
        .add_systems(
            FixedUpdate,
            run_spawners
                .in_set(TickSystems::Act)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            react_to_spawn_signals
                .in_set(ResolveSystems::Signals)
                .run_if(in_state(GameState::InGame)),
        );
}

#[allow(clippy::too_many_arguments)]
pub fn run_spawners(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    mut pools: ResMut<ActorPools>,
    blueprints: Res<Blueprints>,
    mut rng: ResMut<GameRng>,
    mut spawners: ResMut<Spawners>,
    q_player: Query<&Transform, With<Player>>,
) {
    let Ok(player) = q_player.single() else {
        return;
    };
    let player = player.translation.truncate();
    let now = time.elapsed_secs();

    let Spawners {
        enemies,
        collectables,
    } = &mut *spawners;
    for spawner in [enemies, collectables] {
        if !spawner.is_due(now, spawner.active_count(&pools)) {
            continue;
        }
        let roll = rng.0.random::<f32>();
        let Some(key) = spawner.roll(now, roll) else {
            continue;
        };
        let Some(at) = pick_spawn_point(
            &spawner.points,
            player,
            spawner.distance,
            spawner.spawn_radius,
            &mut rng.0,
        ) else {
            debug!("no {} spawn point near the player", spawner.label);
            continue;
        };

        let e = {
            let mut host = CommandsHost::new(&mut commands, &blueprints);
            match pools.acquire(&key, &mut host) {
                Ok(e) => e,
                Err(err) => {
                    warn!("spawn of '{key}' dropped: {err}");
                    continue;
                }
            }
        };
        debug!("spawned '{key}' at {at}");
        commands.entity(e).insert((
            Transform::from_translation(at.extend(spawner.z)),
            LinearVelocity::ZERO,
        ));
    }
}

pub fn react_to_spawn_signals(mut signals: MessageReader<GameSignal>, mut spawners: ResMut<Spawners>) {
    for signal in signals.read() {
        match signal {
            GameSignal::RunStarted => {
                spawners.enemies.set_enabled(true);
                spawners.collectables.set_enabled(true);
            }
            GameSignal::BossPhaseChanged { phase, .. } => {
                spawners.enemies.switch_table(phase);
            }
            GameSignal::BossDefeated => {
                info!("boss defeated; enemy spawning stopped");
                spawners.enemies.set_enabled(false);
            }
            GameSignal::PlayerDied => {
                spawners.enemies.set_enabled(false);
                spawners.collectables.set_enabled(false);
            }
            GameSignal::CheckpointReached {
                phase: Some(phase),
                ..
            } => {
                spawners.enemies.switch_table(phase);
                if spawners.collectables.has_table(phase) {
                    spawners.collectables.switch_table(phase);
                }
            }
            _ => {}
        }
    }
}
