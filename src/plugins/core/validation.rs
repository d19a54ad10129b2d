//! Consistency checks over a loaded `CombatConfig`.
//!
//! Nothing here is fatal: every issue is reported and the game runs with what it has (unknown
//! pool keys fail at acquire time, empty tables simply never fire).

use std::collections::HashSet;

use super::config::{CombatConfig, SpawnTable};
use crate::plugins::boss::phases::sort_phases;
use crate::plugins::pooling::PoolKey;
use crate::plugins::projectiles::patterns::AttackPattern;
use crate::plugins::projectiles::weapon::WeaponConfig;

/// A validation issue with the section it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub section: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.section, self.message)
    }
}

/// Canonical ordering applied after load: boss phases by descending threshold.
pub fn normalize(config: &mut CombatConfig) {
    sort_phases(&mut config.boss.phases);
}

/// Validate every cross-reference in the config.
/// Returns a list of issues, empty if the config is consistent.
pub fn validate(config: &CombatConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let mut push = |section: &'static str, message: String| {
        issues.push(ConfigIssue { section, message });
    };

    // Pool keys must be unique across every pooled category.
    let mut pool_keys: HashSet<&PoolKey> = HashSet::new();
    let all_keys = config
        .projectiles
        .iter()
        .map(|p| &p.key)
        .chain(config.enemy_keys())
        .chain(config.collectable_keys());
    for key in all_keys {
        if !pool_keys.insert(key) {
            push("pools", format!("duplicate pool key '{key}'"));
        }
    }

    if !config.projectiles.iter().any(|p| p.key == config.fallback_projectile) {
        push(
            "projectiles",
            format!(
                "fallback projectile '{}' has no projectile spec",
                config.fallback_projectile
            ),
        );
    }
    for p in &config.projectiles {
        if p.lifetime <= 0.0 {
            push("projectiles", format!("'{}' lifetime must be positive", p.key));
        }
    }

    check_weapon(&mut push, "player", "player", &config.player.weapon);
    check_weapon(&mut push, "boss", "boss", &config.boss.weapon);
    for enemy in &config.enemies {
        check_weapon(&mut push, "enemies", enemy.key.as_str(), &enemy.weapon);
        if enemy.max_health <= 0.0 {
            push("enemies", format!("'{}' max_health must be positive", enemy.key));
        }
    }

    if config.boss.phases.is_empty() {
        push("boss", "phase table is empty; the boss will never attack".into());
    }
    let mut phase_names = HashSet::new();
    for phase in &config.boss.phases {
        if !phase_names.insert(phase.name.as_str()) {
            push("boss", format!("duplicate phase name '{}'", phase.name));
        }
        if !(0.0..=100.0).contains(&phase.threshold) {
            push(
                "boss",
                format!("phase '{}' threshold {} outside 0..=100", phase.name, phase.threshold),
            );
        }
        if let AttackPattern::Spread { count, .. } = phase.pattern.pattern {
            if count < 2 {
                push(
                    "boss",
                    format!("phase '{}' spread count {count} fires a single shot", phase.name),
                );
            }
        }
    }

    let enemy_keys: HashSet<&PoolKey> = config.enemy_keys().collect();
    let collectable_keys: HashSet<&PoolKey> = config.collectable_keys().collect();
    check_tables(&mut push, "spawning.enemy_tables", &config.spawning.enemy_tables, &enemy_keys);
    check_tables(
        &mut push,
        "spawning.collectable_tables",
        &config.spawning.collectable_tables,
        &collectable_keys,
    );

    let has_enemy_table = |name: &str| config.spawning.enemy_tables.iter().any(|t| t.name == name);
    if !has_enemy_table(&config.spawning.initial_enemy_table) {
        push(
            "spawning",
            format!("initial enemy table '{}' not found", config.spawning.initial_enemy_table),
        );
    }
    for cp in &config.arena.checkpoints {
        if let Some(phase) = &cp.phase {
            if !has_enemy_table(phase) {
                push("arena", format!("checkpoint at x={} names unknown table '{phase}'", cp.x));
            }
        }
    }
    // The opening phase is never transitioned into, so it needs no table.
    for phase in config.boss.phases.iter().skip(1) {
        if !has_enemy_table(&phase.name) {
            push(
                "spawning",
                format!("boss phase '{}' has no enemy table; spawning keeps the current one", phase.name),
            );
        }
    }

    if config.arena.min.x >= config.arena.max.x || config.arena.min.y >= config.arena.max.y {
        push("arena", "min must be below max on both axes".into());
    }

    issues
}

fn check_weapon(
    push: &mut impl FnMut(&'static str, String),
    section: &'static str,
    owner: &str,
    weapon: &WeaponConfig,
) {
    if weapon.use_fire_rate && weapon.fire_rate <= 0.0 {
        push(section, format!("'{owner}' fire_rate must be positive when gated"));
    }
}

fn check_tables(
    push: &mut impl FnMut(&'static str, String),
    section: &'static str,
    tables: &[SpawnTable],
    known: &HashSet<&PoolKey>,
) {
    let mut names = HashSet::new();
    for table in tables {
        if !names.insert(table.name.as_str()) {
            push(section, format!("duplicate table name '{}'", table.name));
        }
        if table.entries.is_empty() {
            push(section, format!("table '{}' has no entries", table.name));
        }
        for entry in &table.entries {
            if !known.contains(&entry.resource) {
                push(
                    section,
                    format!("table '{}' references unknown pool '{}'", table.name, entry.resource),
                );
            }
            if !(0.0..=1.0).contains(&entry.chance) {
                push(
                    section,
                    format!(
                        "table '{}' entry '{}' chance {} outside [0, 1]",
                        table.name, entry.resource, entry.chance
                    ),
                );
            }
        }
    }
}
