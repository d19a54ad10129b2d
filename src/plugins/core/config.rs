//! Combat tunables.
//!
//! These structs mirror `assets/data/combat.ron`. Every field has a default taken from the
//! shipped game, so a partial (or missing) file still yields a playable configuration.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::plugins::boss::phases::BossPhase;
use crate::plugins::collectables::CollectableEffect;
use crate::plugins::enemies::archetype::ArchetypeKind;
use crate::plugins::enemies::dash::DashTuning;
use crate::plugins::enemies::fsm::EnemyTuning;
use crate::plugins::enemies::ranged::RangedTuning;
use crate::plugins::pooling::PoolKey;
use crate::plugins::projectiles::patterns::{AttackPattern, PatternDescriptor};
use crate::plugins::projectiles::weapon::{ProjectileType, WeaponConfig};

/// Current layout version of `combat.ron`.
pub const SCHEMA_VERSION: u32 = 1;

/// Versioned envelope around the payload of a data file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataFile<T> {
    pub schema_version: u32,
    pub config: T,
}

#[derive(Resource, Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Seed for `GameRng`. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub physics: PhysicsConfig,
    pub projectiles: Vec<ProjectileSpec>,
    /// Pool used when a projectile type has no spec of its own.
    pub fallback_projectile: PoolKey,
    pub enemies: Vec<EnemyArchetypeConfig>,
    pub boss: BossConfig,
    pub player: PlayerConfig,
    pub spawning: SpawningConfig,
    pub collectables: Vec<CollectableSpec>,
    pub arena: ArenaConfig,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            seed: None,
            physics: PhysicsConfig::default(),
            projectiles: ProjectileType::ALL
                .iter()
                .map(|&kind| ProjectileSpec::for_type(kind))
                .collect(),
            fallback_projectile: PoolKey::from(ProjectileType::Basic.as_str()),
            enemies: vec![
                EnemyArchetypeConfig::chaser(),
                EnemyArchetypeConfig::shooter(),
            ],
            boss: BossConfig::default(),
            player: PlayerConfig::default(),
            spawning: SpawningConfig::default(),
            collectables: vec![
                CollectableSpec::new("Life", CollectableEffect::Life(100.0)),
                CollectableSpec::new("Energy", CollectableEffect::Energy(100.0)),
                CollectableSpec::new("SpecialAttack", CollectableEffect::SpecialAttack),
            ],
            arena: ArenaConfig::default(),
        }
    }
}

impl CombatConfig {
    pub fn enemy(&self, key: &PoolKey) -> Option<&EnemyArchetypeConfig> {
        self.enemies.iter().find(|e| &e.key == key)
    }

    pub fn enemy_keys(&self) -> impl Iterator<Item = &PoolKey> {
        self.enemies.iter().map(|e| &e.key)
    }

    pub fn collectable_keys(&self) -> impl Iterator<Item = &PoolKey> {
        self.collectables.iter().map(|c| &c.key)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Avian length unit. Gameplay distances are in meters.
    pub length_unit: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self { length_unit: 1.0 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectileSpec {
    pub key: PoolKey,
    pub kind: ProjectileType,
    pub damage: f32,
    /// Seconds before an unobstructed projectile returns to its pool.
    pub lifetime: f32,
    pub radius: f32,
    pub pool_size: usize,
}

impl ProjectileSpec {
    pub fn for_type(kind: ProjectileType) -> Self {
        let damage = match kind {
            ProjectileType::Basic => 10.0,
            ProjectileType::Elite => 15.0,
            ProjectileType::ShooterChoco | ProjectileType::ShooterCandy => 10.0,
            ProjectileType::ShotgunChoco | ProjectileType::ShotgunCandy => 8.0,
        };
        Self {
            key: PoolKey::from(kind.as_str()),
            kind,
            damage,
            ..default()
        }
    }
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            key: PoolKey::from(ProjectileType::Basic.as_str()),
            kind: ProjectileType::Basic,
            damage: 1.0,
            lifetime: 5.0,
            radius: 0.15,
            pool_size: 32,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnemyArchetypeConfig {
    pub key: PoolKey,
    pub kind: ArchetypeKind,
    pub max_health: f32,
    pub radius: f32,
    pub pool_size: usize,
    pub tuning: EnemyTuning,
    pub dash: DashTuning,
    pub ranged: RangedTuning,
    pub weapon: WeaponConfig,
    /// Shooter only: one is picked at random every time the actor is spawned.
    pub allowed_projectile_types: Vec<ProjectileType>,
}

impl EnemyArchetypeConfig {
    pub fn chaser() -> Self {
        Self {
            key: PoolKey::from("Chaser"),
            kind: ArchetypeKind::Chaser,
            ..default()
        }
    }

    pub fn shooter() -> Self {
        Self {
            key: PoolKey::from("Shooter"),
            kind: ArchetypeKind::Shooter,
            tuning: EnemyTuning {
                detection_range: 9.0,
                attack_range: 6.0,
                ..default()
            },
            allowed_projectile_types: vec![ProjectileType::ShooterChoco, ProjectileType::ShooterCandy],
            ..default()
        }
    }
}

impl Default for EnemyArchetypeConfig {
    fn default() -> Self {
        Self {
            key: PoolKey::from("Chaser"),
            kind: ArchetypeKind::Chaser,
            max_health: 30.0,
            radius: 0.4,
            pool_size: 4,
            tuning: EnemyTuning::default(),
            dash: DashTuning::default(),
            ranged: RangedTuning::default(),
            weapon: WeaponConfig::default(),
            allowed_projectile_types: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BossConfig {
    pub spawn: Vec2,
    pub max_health: f32,
    pub radius: f32,
    pub patrol_distance: f32,
    pub patrol_speed: f32,
    pub move_speed: f32,
    pub detection_range: f32,
    /// Inside this distance the boss strafes instead of closing in.
    pub min_distance: f32,
    /// Delay between death and removal.
    pub despawn_delay: f32,
    pub weapon: WeaponConfig,
    /// Sorted by descending threshold when loaded.
    pub phases: Vec<BossPhase>,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            spawn: Vec2::new(70.0, 0.0),
            max_health: 300.0,
            radius: 1.0,
            patrol_distance: 5.0,
            patrol_speed: 2.0,
            move_speed: 3.0,
            detection_range: 12.0,
            min_distance: 7.0,
            despawn_delay: 1.0,
            weapon: WeaponConfig::default(),
            phases: vec![
                BossPhase {
                    name: "Phase1".into(),
                    threshold: 100.0,
                    pattern: PatternDescriptor::new(AttackPattern::Single, 8.0),
                    fire_interval: 2.0,
                    projectile_type: ProjectileType::Elite,
                    power_effect: false,
                },
                BossPhase {
                    name: "Phase2".into(),
                    threshold: 50.0,
                    pattern: PatternDescriptor::new(AttackPattern::Circular { count: 12 }, 6.0),
                    fire_interval: 2.5,
                    projectile_type: ProjectileType::ShotgunChoco,
                    power_effect: true,
                },
                BossPhase {
                    name: "Phase3".into(),
                    threshold: 20.0,
                    pattern: PatternDescriptor::new(
                        AttackPattern::Spread {
                            angle_total: 90.0,
                            count: 8,
                        },
                        10.0,
                    ),
                    fire_interval: 1.5,
                    projectile_type: ProjectileType::ShotgunCandy,
                    power_effect: true,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub spawn: Vec2,
    pub radius: f32,
    pub move_speed: f32,
    pub max_health: f32,
    pub max_energy: f32,
    pub energy_regen_amount: f32,
    pub energy_regen_interval: f32,
    pub projectile_type: ProjectileType,
    pub weapon: WeaponConfig,
    pub special_attack: SpecialAttackConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            spawn: Vec2::ZERO,
            radius: 0.4,
            move_speed: 5.0,
            max_health: 100.0,
            max_energy: 100.0,
            energy_regen_amount: 10.0,
            energy_regen_interval: 3.0,
            projectile_type: ProjectileType::Basic,
            weapon: WeaponConfig {
                fire_rate: 4.0,
                ..default()
            },
            special_attack: SpecialAttackConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpecialAttackConfig {
    pub energy_cost: f32,
    pub damage: f32,
    pub radius: f32,
}

impl Default for SpecialAttackConfig {
    fn default() -> Self {
        Self {
            energy_cost: 50.0,
            damage: 30.0,
            radius: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpawnEntry {
    /// Pool key of the actor to spawn.
    pub resource: PoolKey,
    /// In `[0, 1]`. See `spawning::select_entry` for how entries compete.
    pub chance: f32,
}

impl Default for SpawnEntry {
    fn default() -> Self {
        Self {
            resource: PoolKey::from("Chaser"),
            chance: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpawnTable {
    pub name: String,
    pub interval: f32,
    pub entries: Vec<SpawnEntry>,
    pub max_concurrent: usize,
}

impl Default for SpawnTable {
    fn default() -> Self {
        Self {
            name: String::new(),
            interval: 5.0,
            entries: Vec::new(),
            max_concurrent: 3,
        }
    }
}

impl SpawnTable {
    fn new(name: &str, interval: f32, max_concurrent: usize, entries: &[(&str, f32)]) -> Self {
        Self {
            name: name.into(),
            interval,
            max_concurrent,
            entries: entries
                .iter()
                .map(|&(resource, chance)| SpawnEntry {
                    resource: PoolKey::from(resource),
                    chance,
                })
                .collect(),
        }
    }
}

/// Distance band around the player inside which spawn points are eligible.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct SpawnDistance {
    pub min: f32,
    pub max: f32,
}

impl Default for SpawnDistance {
    fn default() -> Self {
        Self { min: 3.0, max: 5.0 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpawningConfig {
    pub enemy_tables: Vec<SpawnTable>,
    pub collectable_tables: Vec<SpawnTable>,
    pub initial_enemy_table: String,
    pub initial_collectable_table: String,
    pub enemy_points: Vec<Vec2>,
    pub collectable_points: Vec<Vec2>,
    pub enemy_distance: SpawnDistance,
    pub collectable_distance: SpawnDistance,
    /// Random offset applied around the chosen spawn point.
    pub spawn_radius: f32,
}

impl Default for SpawningConfig {
    fn default() -> Self {
        let lane = |y: f32| (0..20).map(move |i| Vec2::new(i as f32 * 4.0, y));
        Self {
            enemy_tables: vec![
                SpawnTable::new("Intro", 5.0, 3, &[("Chaser", 1.0), ("Shooter", 0.4)]),
                SpawnTable::new("Midway", 4.0, 4, &[("Chaser", 1.0), ("Shooter", 0.5)]),
                SpawnTable::new("Boss", 6.0, 2, &[("Chaser", 1.0)]),
                SpawnTable::new("Phase2", 5.0, 3, &[("Chaser", 1.0), ("Shooter", 0.3)]),
                SpawnTable::new("Phase3", 4.0, 3, &[("Shooter", 1.0), ("Chaser", 0.5)]),
            ],
            collectable_tables: vec![SpawnTable::new(
                "Intro",
                5.0,
                3,
                &[("Energy", 1.0), ("Life", 0.3), ("SpecialAttack", 0.1)],
            )],
            initial_enemy_table: "Intro".into(),
            initial_collectable_table: "Intro".into(),
            enemy_points: lane(3.0).chain(lane(-3.0)).collect(),
            collectable_points: lane(0.0).collect(),
            enemy_distance: SpawnDistance::default(),
            collectable_distance: SpawnDistance::default(),
            spawn_radius: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectableSpec {
    pub key: PoolKey,
    pub effect: CollectableEffect,
    pub radius: f32,
    pub pool_size: usize,
    /// Seconds between pickup and return to the pool.
    pub return_delay: f32,
}

impl CollectableSpec {
    pub fn new(key: &str, effect: CollectableEffect) -> Self {
        Self {
            key: PoolKey::from(key),
            effect,
            ..default()
        }
    }
}

impl Default for CollectableSpec {
    fn default() -> Self {
        Self {
            key: PoolKey::from("Energy"),
            effect: CollectableEffect::Energy(100.0),
            radius: 0.3,
            pool_size: 4,
            return_delay: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// The player triggers the checkpoint by crossing this x coordinate.
    pub x: f32,
    /// Where the new arena border appears. Reported in `CheckpointReached`.
    pub border: Vec2,
    /// Enemy spawn table to switch to.
    pub phase: Option<String>,
    pub last: bool,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            border: Vec2::ZERO,
            phase: None,
            last: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub min: Vec2,
    pub max: Vec2,
    pub wall_thickness: f32,
    pub checkpoints: Vec<CheckpointConfig>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            min: Vec2::new(-10.0, -6.0),
            max: Vec2::new(90.0, 6.0),
            wall_thickness: 1.0,
            checkpoints: vec![
                CheckpointConfig {
                    x: 25.0,
                    border: Vec2::new(22.0, 0.0),
                    phase: Some("Midway".into()),
                    last: false,
                },
                CheckpointConfig {
                    x: 50.0,
                    border: Vec2::new(47.0, 0.0),
                    phase: Some("Boss".into()),
                    last: true,
                },
            ],
        }
    }
}
