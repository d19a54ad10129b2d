//! Boss plugin: a single non-pooled actor whose attacks escalate through health-threshold phases.
//!
//! - Act: `drive_boss` moves (patrol / approach / strafe) and attacks on the phase interval
//! - Reactions: `react_to_boss_health` advances phases on damage and handles death
//! - Signals: `react_to_player_death` stops attacks for good
//!
//! A phase change reconfigures the weapon, swaps the power effect children and emits
//! `BossPhaseChanged`; a lethal hit emits `BossDefeated` and despawns the boss after a delay.

pub mod motion;
pub mod phases;

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::signals::GameSignal;
use crate::common::state::GameState;
use crate::plugins::combat::{HealthChange, HealthChanged, HealthResource};
use crate::plugins::core::config::BossConfig;
use crate::plugins::core::{CombatConfig, ResolveSystems, TickSystems};
use crate::plugins::player::Player;
use crate::plugins::pooling::ActorPools;
use crate::plugins::projectiles::weapon::RequestSink;
use crate::plugins::projectiles::{Faction, ProjectileKeys, SpawnProjectileRequest, Weapon};
use crate::plugins::scheduler::DelayedActions;

use motion::BossMotion;
use phases::{PhaseController, PhaseTransition};

const BOSS_Z: f32 = 1.0;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Boss;

#[derive(Component, Debug, Clone)]
pub struct BossBrain {
    pub phases: PhaseController,
    pub motion: BossMotion,
    next_attack: f32,
    target_dead: bool,
    defeated: bool,
}

impl BossBrain {
    pub fn new(config: &BossConfig) -> Self {
        Self {
            phases: PhaseController::new(config.phases.clone()),
            motion: BossMotion::new(config),
            next_attack: 0.0,
            target_dead: false,
            defeated: false,
        }
    }

    #[inline]
    pub fn next_attack(&self) -> f32 {
        self.next_attack
    }

    #[inline]
    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    /// Whether an attack is due at `now` given the target is `in_range`.
    pub fn attack_due(&self, now: f32, in_range: bool) -> bool {
        !self.target_dead
            && !self.defeated
            && in_range
            && self.phases.current().is_some()
            && now >= self.next_attack
    }
}

/// Visual toggle owned by the boss, shown while its phase is active.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasePowerEffect {
    pub phase_index: usize,
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_boss)
        .add_systems(
            FixedUpdate,
            drive_boss
                .in_set(TickSystems::Act)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            (
                react_to_boss_health.in_set(ResolveSystems::Reactions),
                react_to_player_death.in_set(ResolveSystems::Signals),
            )
                .run_if(in_state(GameState::InGame)),
        );
}

pub fn boss_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::Enemy,
        [Layer::World, Layer::Player, Layer::PlayerBullet],
    )
}

pub fn spawn_boss(mut commands: Commands, config: Res<CombatConfig>) {
    let boss = &config.boss;
    let brain = BossBrain::new(boss);

    let mut weapon = Weapon::new(boss.weapon, Faction::Hostile, Default::default());
    if let Some(first) = brain.phases.current() {
        weapon.set_projectile_type(first.projectile_type);
        weapon.set_pattern(Some(first.pattern));
    }

    let effects: Vec<usize> = brain
        .phases
        .phases()
        .iter()
        .enumerate()
        .filter(|(_, phase)| phase.power_effect)
        .map(|(index, _)| index)
        .collect();

    commands
        .spawn((
            Name::new("Boss"),
            Boss,
            brain,
            HealthResource::new(boss.max_health),
            weapon,
            Sprite {
                color: Color::srgb(0.55, 0.15, 0.6),
                custom_size: Some(Vec2::splat(boss.radius * 2.0)),
                ..default()
            },
            Transform::from_translation(boss.spawn.extend(BOSS_Z)),
            RigidBody::Dynamic,
            Collider::circle(boss.radius),
            LockedAxes::ROTATION_LOCKED,
            boss_layers(),
            LinearVelocity::ZERO,
            DespawnOnExit(GameState::InGame),
        ))
        .with_children(|parent| {
            for phase_index in effects {
                let visibility = if phase_index == 0 {
                    Visibility::Visible
                } else {
                    Visibility::Hidden
                };
                parent.spawn((
                    Name::new(format!("BossPowerEffect{phase_index}")),
                    PhasePowerEffect { phase_index },
                    Sprite {
                        color: Color::srgba(1.0, 0.3, 0.2, 0.35),
                        custom_size: Some(Vec2::splat(boss.radius * 3.0)),
                        ..default()
                    },
                    Transform::from_xyz(0.0, 0.0, -0.1),
                    visibility,
                ));
            }
        });
}

#[allow(clippy::too_many_arguments)]
pub fn drive_boss(
    time: Res<Time<Fixed>>,
    pools: Res<ActorPools>,
    keys: Res<ProjectileKeys>,
    q_player: Query<&Transform, (With<Player>, Without<Boss>)>,
    mut q_boss: Query<
        (
            Entity,
            &Transform,
            &mut BossBrain,
            &mut Weapon,
            &mut LinearVelocity,
            &mut Sprite,
        ),
        With<Boss>,
    >,
    mut requests: MessageWriter<SpawnProjectileRequest>,
    mut signals: MessageWriter<GameSignal>,
) {
    let Ok(player) = q_player.single() else {
        return;
    };
    let target = player.translation.truncate();
    let now = time.elapsed_secs();

    for (entity, tf, mut brain, mut weapon, mut velocity, mut sprite) in &mut q_boss {
        if brain.defeated {
            continue;
        }
        let position = tf.translation.truncate();

        let step = brain.motion.step(position, target);
        velocity.0 = step.velocity;
        if let Some(right) = step.face_right {
            sprite.flip_x = !right;
        }

        let in_range = brain.motion.detects(position, target);
        if !brain.attack_due(now, in_range) {
            continue;
        }
        let Some(phase) = brain.phases.current().cloned() else {
            continue;
        };

        signals.write(GameSignal::BossAttack {
            phase: phase.name.clone(),
        });
        let mut sink = RequestSink::new(&pools, &mut requests, Some(entity));
        weapon.shoot(now, position, target - position, &keys, &mut sink);
        brain.next_attack = now + phase.fire_interval;
    }
}

#[allow(clippy::type_complexity)]
pub fn react_to_boss_health(
    config: Res<CombatConfig>,
    mut changes: MessageReader<HealthChanged>,
    mut q_boss: Query<
        (
            &mut BossBrain,
            &HealthResource,
            &mut Weapon,
            &mut LinearVelocity,
            &mut CollisionLayers,
        ),
        With<Boss>,
    >,
    mut q_effects: Query<(&PhasePowerEffect, &ChildOf, &mut Visibility)>,
    mut signals: MessageWriter<GameSignal>,
    mut delayed: ResMut<DelayedActions>,
) {
    for ev in changes.read() {
        let Ok((mut brain, health, mut weapon, mut velocity, mut layers)) = q_boss.get_mut(ev.entity)
        else {
            continue;
        };
        if brain.defeated {
            continue;
        }

        match ev.change {
            HealthChange::Damaged { .. } => {
                for transition in brain.phases.evaluate(health.percent()) {
                    let Some(phase) = brain.phases.phase(transition.to).cloned() else {
                        continue;
                    };
                    info!(
                        "boss enters phase '{}' ({}) at {:.0}% health",
                        phase.name,
                        transition.to,
                        health.percent()
                    );
                    swap_power_effects(ev.entity, transition, &mut q_effects);
                    weapon.set_projectile_type(phase.projectile_type);
                    weapon.set_pattern(Some(phase.pattern));
                    signals.write(GameSignal::BossPhaseChanged {
                        phase: phase.name,
                        index: transition.to,
                    });
                }
            }
            HealthChange::Died => {
                brain.defeated = true;
                velocity.0 = Vec2::ZERO;
                layers.filters = LayerMask::NONE;
                info!("boss defeated");
                signals.write(GameSignal::BossDefeated);
                delayed.despawn(ev.entity, config.boss.despawn_delay);
            }
            HealthChange::Ignored => {}
        }
    }
}

fn swap_power_effects(
    boss: Entity,
    transition: PhaseTransition,
    q_effects: &mut Query<(&PhasePowerEffect, &ChildOf, &mut Visibility)>,
) {
    for (effect, child_of, mut visibility) in q_effects.iter_mut() {
        if child_of.parent() != boss {
            continue;
        }
        if effect.phase_index == transition.from {
            *visibility = Visibility::Hidden;
        } else if effect.phase_index == transition.to {
            *visibility = Visibility::Visible;
        }
    }
}

pub fn react_to_player_death(mut signals: MessageReader<GameSignal>, mut q_boss: Query<&mut BossBrain>) {
    let player_died = signals
        .read()
        .filter(|s| matches!(s, GameSignal::PlayerDied))
        .count()
        > 0;
    if !player_died {
        return;
    }
    for mut brain in &mut q_boss {
        brain.target_dead = true;
    }
}

#[cfg(test)]
mod tests;
