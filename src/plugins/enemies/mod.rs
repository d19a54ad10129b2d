//! Enemies plugin: pooled chaser / shooter actors driven by [`fsm::EnemyFsm`].
//!
//! # Tick
//! ```text
//!   FixedUpdate
//!     Sense  arm_shooters       pick a projectile type for freshly spawned shooters
//!     Think  think_enemies      perceive the player, tick the machine, store the intent
//!     Act    act_enemies        velocity, facing, melee DamageRequest, weapon fire
//!
//!   FixedPostUpdate
//!     Reactions  react_to_health    knockback / death from HealthChanged
//!                turn_at_obstacles  patrol reversal on World contact
//!     Signals    react_to_signals   PlayerDied, boss culls, checkpoints
//!                finish_deaths      EnemyDied signal + delayed return to pool
//! ```
//!
//! Every path to death goes through an [`EnemyDeath`] message so the signal and the delayed
//! return are produced in exactly one place.

pub mod archetype;
pub mod dash;
pub mod fsm;
pub mod ranged;

use avian2d::prelude::*;
use bevy::prelude::*;
use rand::Rng;

use crate::common::layers::{is_in_layer, Layer};
use crate::common::signals::{DeathCause, GameSignal};
use crate::common::state::GameState;
use crate::plugins::combat::{DamageRequest, HealthChange, HealthChanged, HealthResource};
use crate::plugins::core::config::EnemyArchetypeConfig;
use crate::plugins::core::{CombatConfig, GameRng, ResolveSystems, TickSystems};
use crate::plugins::player::Player;
use crate::plugins::pooling::{
    register_poolable, ActiveLayers, ActorPools, Blueprint, Blueprints, PoolSlot, Poolable,
    Pooled, SpawnGeneration,
};
use crate::plugins::projectiles::collision::targets;
use crate::plugins::projectiles::weapon::{ProjectileType, RequestSink};
use crate::plugins::projectiles::{Faction, ProjectileKeys, SpawnProjectileRequest, Weapon};
use crate::plugins::scheduler::DelayedActions;

use archetype::Archetype;
use fsm::{EnemyFsm, Intent, Perception};

/// Seconds between death and return to the pool.
pub const CORPSE_TIME: f32 = 1.0;

/// Enemies left of a reached checkpoint border by more than this are removed.
pub const CHECKPOINT_MARGIN: f32 = 3.0;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Enemy;

/// State machine plus archetype behaviour of one enemy.
#[derive(Component, Debug, Clone)]
pub struct EnemyBrain {
    pub fsm: EnemyFsm,
    pub archetype: Archetype,
}

impl EnemyBrain {
    pub fn from_config(config: &EnemyArchetypeConfig) -> Self {
        Self {
            fsm: EnemyFsm::new(config.tuning),
            archetype: Archetype::from_config(config),
        }
    }

    /// Enter Dead. Returns `false` if the enemy was already dead.
    pub fn die(&mut self) -> bool {
        self.fsm.die(&mut self.archetype)
    }
}

impl Poolable for EnemyBrain {
    fn reset(&mut self) {
        self.fsm.reset();
        self.archetype.reset();
    }
}

/// Intent produced in Think, consumed in Act.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PendingIntent(pub Intent);

impl Poolable for PendingIntent {
    fn reset(&mut self) {
        self.0 = Intent::default();
    }
}

/// Projectile types a shooter may roll on spawn. Empty keeps the weapon's configured type.
#[derive(Component, Debug, Clone, Default)]
pub struct ShooterLoadout {
    pub allowed: Vec<ProjectileType>,
    pub armed: bool,
}

impl Poolable for ShooterLoadout {
    fn reset(&mut self) {
        self.armed = false;
    }
}

/// Internal: one enemy entered Dead this tick.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct EnemyDeath {
    pub enemy: Entity,
    pub cause: DeathCause,
}

pub fn plugin(app: &mut App) {
    let config = app.world().resource::<CombatConfig>().clone();

    register_poolable::<EnemyBrain>(app.world_mut());
    register_poolable::<PendingIntent>(app.world_mut());
    register_poolable::<ShooterLoadout>(app.world_mut());

    {
        let mut blueprints = app.world_mut().get_resource_or_init::<Blueprints>();
        for enemy in &config.enemies {
            blueprints.insert(enemy.key.clone(), enemy_blueprint(enemy));
        }
    }

    app.add_message::<EnemyDeath>()
        .add_systems(
            FixedUpdate,
            (
                arm_shooters.in_set(TickSystems::Sense),
                think_enemies.in_set(TickSystems::Think),
                act_enemies.in_set(TickSystems::Act),
            )
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            (
                (react_to_health, turn_at_obstacles).in_set(ResolveSystems::Reactions),
                (react_to_signals, finish_deaths)
                    .chain()
                    .in_set(ResolveSystems::Signals),
            )
                .run_if(in_state(GameState::InGame)),
        );
}

/// Layers of a living enemy.
pub fn enemy_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::Enemy,
        [Layer::World, Layer::Player, Layer::PlayerBullet],
    )
}

pub fn enemy_blueprint(config: &EnemyArchetypeConfig) -> Blueprint {
    let config = config.clone();
    let color = match config.kind {
        archetype::ArchetypeKind::Chaser => Color::srgb(0.85, 0.25, 0.25),
        archetype::ArchetypeKind::Shooter => Color::srgb(0.95, 0.6, 0.2),
    };

    Blueprint::new(config.pool_size, move |e| {
        e.insert((
            Enemy,
            EnemyBrain::from_config(&config),
            PendingIntent::default(),
            HealthResource::new(config.max_health),
            Weapon::new(config.weapon, Faction::Hostile, ProjectileType::default()),
            ShooterLoadout {
                allowed: config.allowed_projectile_types.clone(),
                armed: false,
            },
            Sprite {
                color,
                custom_size: Some(Vec2::splat(config.radius * 2.0)),
                ..default()
            },
        ));
        e.insert((
            RigidBody::Dynamic,
            Collider::circle(config.radius),
            LockedAxes::ROTATION_LOCKED,
            CollisionEventsEnabled,
            CollisionLayers::new(Layer::Enemy, LayerMask::NONE),
            ActiveLayers(enemy_layers()),
            LinearVelocity::ZERO,
        ));
    })
}

pub fn arm_shooters(
    mut rng: ResMut<GameRng>,
    mut q: Query<(&PoolSlot, &mut ShooterLoadout, &mut Weapon), With<Enemy>>,
) {
    for (slot, mut loadout, mut weapon) in &mut q {
        if *slot != PoolSlot::Active || loadout.armed {
            continue;
        }
        loadout.armed = true;
        if loadout.allowed.is_empty() {
            continue;
        }
        let pick = rng.0.random_range(0..loadout.allowed.len());
        weapon.set_projectile_type(loadout.allowed[pick]);
    }
}

pub fn think_enemies(
    time: Res<Time<Fixed>>,
    q_player: Query<&Transform, With<Player>>,
    mut q: Query<(Entity, &PoolSlot, &Transform, &mut EnemyBrain, &mut PendingIntent), With<Enemy>>,
    mut deaths: MessageWriter<EnemyDeath>,
) {
    let target = q_player.single().ok().map(|tf| tf.translation.truncate());
    let (dt, now) = (time.delta_secs(), time.elapsed_secs());

    for (entity, slot, tf, mut brain, mut pending) in &mut q {
        if *slot != PoolSlot::Active {
            continue;
        }
        let perception = Perception {
            position: tf.translation.truncate(),
            target,
            dt,
            now,
        };
        let brain = &mut *brain;
        let report = brain.fsm.tick(&perception, &mut brain.archetype);
        pending.0 = report.intent;

        if let Some(cause) = report.died {
            deaths.write(EnemyDeath { enemy: entity, cause });
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn act_enemies(
    time: Res<Time<Fixed>>,
    pools: Res<ActorPools>,
    keys: Res<ProjectileKeys>,
    q_player: Query<Entity, With<Player>>,
    mut q: Query<
        (
            Entity,
            &PoolSlot,
            &Transform,
            &mut PendingIntent,
            &mut LinearVelocity,
            &mut Sprite,
            &mut Weapon,
        ),
        With<Enemy>,
    >,
    mut damage: MessageWriter<DamageRequest>,
    mut requests: MessageWriter<SpawnProjectileRequest>,
) {
    let player = q_player.single().ok();
    let now = time.elapsed_secs();

    for (entity, slot, tf, mut pending, mut velocity, mut sprite, mut weapon) in &mut q {
        if *slot != PoolSlot::Active {
            continue;
        }
        let intent = std::mem::take(&mut pending.0);
        let position = tf.translation.truncate();

        if let Some(v) = intent.velocity {
            velocity.0 = v;
        }
        if let Some(right) = intent.face_right {
            sprite.flip_x = !right;
        }
        if let (Some(amount), Some(player)) = (intent.strike, player) {
            damage.write(DamageRequest {
                target: player,
                amount,
                origin: position,
            });
        }
        if let Some(direction) = intent.fire {
            let mut sink = RequestSink::new(&pools, &mut requests, Some(entity));
            weapon.shoot(now, position, direction, &keys, &mut sink);
        }
    }
}

pub fn react_to_health(
    mut changes: MessageReader<HealthChanged>,
    mut q: Query<(&Transform, &mut EnemyBrain, &mut LinearVelocity), With<Enemy>>,
    mut deaths: MessageWriter<EnemyDeath>,
) {
    for ev in changes.read() {
        let Ok((tf, mut brain, mut velocity)) = q.get_mut(ev.entity) else {
            continue;
        };
        match ev.change {
            HealthChange::Damaged { .. } => {
                if brain.fsm.is_dead() {
                    continue;
                }
                let away = (tf.translation.truncate() - ev.origin).normalize_or_zero();
                velocity.0 = away * brain.fsm.tuning.knockback_force;
                brain.fsm.start_knockback();
            }
            HealthChange::Died => {
                if brain.die() {
                    deaths.write(EnemyDeath {
                        enemy: ev.entity,
                        cause: DeathCause::Killed,
                    });
                }
            }
            HealthChange::Ignored => {}
        }
    }
}

pub fn turn_at_obstacles(
    mut started: MessageReader<CollisionStart>,
    q_layers: Query<&CollisionLayers>,
    mut q_brains: Query<&mut EnemyBrain, With<Enemy>>,
) {
    for ev in started.read() {
        let (a, b) = targets(ev);
        for (me, other) in [(a, b), (b, a)] {
            let Ok(mut brain) = q_brains.get_mut(me.gameplay_owner()) else {
                continue;
            };
            let hit_world = q_layers
                .get(other.collider)
                .is_ok_and(|layers| is_in_layer(layers, Layer::World));
            if hit_world {
                brain.fsm.on_obstacle_contact();
            }
        }
    }
}

pub fn react_to_signals(
    mut signals: MessageReader<GameSignal>,
    mut delayed: ResMut<DelayedActions>,
    mut q: Query<(Entity, &Transform, &mut PoolSlot, &mut EnemyBrain), With<Enemy>>,
    mut deaths: MessageWriter<EnemyDeath>,
) {
    for signal in signals.read() {
        match signal {
            GameSignal::PlayerDied => {
                for (_, _, _, mut brain) in &mut q {
                    brain.fsm.on_target_died();
                }
            }
            GameSignal::BossPhaseChanged { .. } | GameSignal::BossDefeated => {
                for (entity, _, slot, mut brain) in &mut q {
                    if *slot == PoolSlot::Active && brain.die() {
                        deaths.write(EnemyDeath {
                            enemy: entity,
                            cause: DeathCause::Culled,
                        });
                    }
                }
            }
            GameSignal::CheckpointReached { position, .. } if *position != Vec2::ZERO => {
                for (entity, tf, mut slot, _) in &mut q {
                    if *slot == PoolSlot::Active && position.x + CHECKPOINT_MARGIN > tf.translation.x {
                        delayed.cancel_for(entity);
                        *slot = PoolSlot::PendingReturn;
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn finish_deaths(
    mut deaths: MessageReader<EnemyDeath>,
    mut signals: MessageWriter<GameSignal>,
    mut delayed: ResMut<DelayedActions>,
    mut q: Query<(&Pooled, &SpawnGeneration, &PoolSlot, &mut LinearVelocity, &mut CollisionLayers), With<Enemy>>,
) {
    for death in deaths.read() {
        let Ok((pooled, generation, slot, mut velocity, mut layers)) = q.get_mut(death.enemy) else {
            continue;
        };
        velocity.0 = Vec2::ZERO;
        layers.filters = LayerMask::NONE;

        signals.write(GameSignal::EnemyDied {
            enemy: death.enemy,
            archetype: pooled.key.clone(),
            cause: death.cause,
        });
        if *slot == PoolSlot::Active {
            delayed.return_to_pool(death.enemy, *generation, CORPSE_TIME);
        }
    }
}
