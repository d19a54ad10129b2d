//! Player plugin: the single target every hostile actor hunts.
//!
//! Pipeline:
//! - Update (full app only): sample the keyboard into the `PlayerInput` resource
//! - FixedUpdate Sense: energy regeneration
//! - FixedUpdate Act: movement, basic shots, special attack
//! - FixedPostUpdate Reactions: health changes into `PlayerTookDamage` / `PlayerDied`
//!
//! Headless runs drive `PlayerInput` directly.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::{is_in_layer, Layer};
use crate::common::signals::GameSignal;
use crate::common::state::GameState;
use crate::plugins::combat::{DamageRequest, HealthChange, HealthChanged, HealthResource};
use crate::plugins::core::{CombatConfig, ResolveSystems, TickSystems};
use crate::plugins::pooling::ActorPools;
use crate::plugins::projectiles::weapon::RequestSink;
use crate::plugins::projectiles::{Faction, ProjectileKeys, SpawnProjectileRequest, Weapon};

const PLAYER_Z: f32 = 2.0;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PlayerController {
    pub facing_right: bool,
    pub moving: bool,
    pub dead: bool,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self {
            facing_right: true,
            moving: false,
            dead: false,
        }
    }
}

impl PlayerController {
    #[inline]
    pub fn facing(&self) -> Vec2 {
        if self.facing_right {
            Vec2::X
        } else {
            Vec2::NEG_X
        }
    }
}

/// Spendable energy plus stored special-attack charges.
///
/// A charge pays for one special attack instead of energy.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Energy {
    current: f32,
    maximum: f32,
    special_charges: u32,
    regen_timer: f32,
}

impl Energy {
    pub fn new(maximum: f32) -> Self {
        let maximum = maximum.max(0.0);
        Self {
            current: maximum,
            maximum,
            special_charges: 0,
            regen_timer: 0.0,
        }
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn maximum(&self) -> f32 {
        self.maximum
    }

    #[inline]
    pub fn special_charges(&self) -> u32 {
        self.special_charges
    }

    pub fn add(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.maximum);
    }

    /// Spend `cost` if there is enough.
    pub fn spend(&mut self, cost: f32) -> bool {
        if self.current < cost {
            return false;
        }
        self.current -= cost;
        true
    }

    pub fn grant_special(&mut self) {
        self.special_charges += 1;
    }

    /// Pay for a special attack with a charge, or with `cost` energy.
    pub fn try_special(&mut self, cost: f32) -> bool {
        if self.special_charges > 0 {
            self.special_charges -= 1;
            return true;
        }
        self.spend(cost)
    }

    /// Advance the regeneration clock. Every `interval` seconds an idle player gains `amount`.
    /// Returns the energy gained.
    pub fn regenerate(&mut self, dt: f32, interval: f32, amount: f32, idle: bool) -> f32 {
        if interval <= 0.0 {
            return 0.0;
        }
        self.regen_timer += dt;
        let before = self.current;
        while self.regen_timer >= interval {
            self.regen_timer -= interval;
            if idle {
                self.add(amount);
            }
        }
        self.current - before
    }
}

/// Player intent for the next fixed tick.
///
/// `special` is a one-shot request: the special attack system clears it.
#[derive(Resource, Default, Debug, Clone, PartialEq)]
pub struct PlayerInput {
    pub move_axis: Vec2,
    pub fire: bool,
    pub special: bool,
}

pub fn plugin(app: &mut App) {
    app.init_resource::<PlayerInput>()
        .add_systems(OnEnter(GameState::InGame), spawn)
        .add_systems(
            FixedUpdate,
            (
                regenerate_energy.in_set(TickSystems::Sense),
                (apply_movement, fire_weapon, special_attack).in_set(TickSystems::Act),
            )
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            react_to_player_damage
                .in_set(ResolveSystems::Reactions)
                .run_if(in_state(GameState::InGame)),
        );
}

/// Keyboard sampling. Registered by the full app only.
pub fn input_plugin(app: &mut App) {
    app.add_systems(Update, gather_input.run_if(in_state(GameState::InGame)));
}

pub fn player_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::Player,
        [Layer::World, Layer::Enemy, Layer::EnemyBullet, Layer::Collectable],
    )
}

pub fn spawn(mut commands: Commands, config: Res<CombatConfig>) {
    let config = &config.player;
    commands.spawn((
        (
            Name::new("Player"),
            Player,
            PlayerController::default(),
            HealthResource::new(config.max_health),
            Energy::new(config.max_energy),
            Weapon::new(config.weapon, Faction::Player, config.projectile_type),
            Sprite {
                color: Color::srgb(0.2, 0.75, 0.9),
                custom_size: Some(Vec2::splat(config.radius * 2.0)),
                ..default()
            },
            Transform::from_translation(config.spawn.extend(PLAYER_Z)),
        ),
        (
            RigidBody::Kinematic,
            Collider::circle(config.radius),
            CollisionEventsEnabled,
            player_layers(),
            LinearVelocity::ZERO,
            DespawnOnExit(GameState::InGame),
        ),
    ));
}

fn gather_input(keys: Res<ButtonInput<KeyCode>>, mut input: ResMut<PlayerInput>) {
    let mut axis = Vec2::ZERO;

    if keys.pressed(KeyCode::KeyW) {
        axis.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        axis.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        axis.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        axis.x += 1.0;
    }

    input.move_axis = axis.normalize_or_zero();
    input.fire = keys.pressed(KeyCode::KeyZ);
    if keys.just_pressed(KeyCode::KeyX) {
        input.special = true;
    }
}

pub fn regenerate_energy(
    time: Res<Time<Fixed>>,
    config: Res<CombatConfig>,
    mut q_player: Query<(&PlayerController, &mut Energy), With<Player>>,
) {
    let Ok((controller, mut energy)) = q_player.single_mut() else {
        return;
    };
    let idle = !controller.dead && !controller.moving;
    energy.regenerate(
        time.delta_secs(),
        config.player.energy_regen_interval,
        config.player.energy_regen_amount,
        idle,
    );
}

pub fn apply_movement(
    config: Res<CombatConfig>,
    input: Res<PlayerInput>,
    mut q_player: Query<(&mut PlayerController, &mut LinearVelocity, &mut Sprite), With<Player>>,
) {
    let Ok((mut controller, mut vel, mut sprite)) = q_player.single_mut() else {
        return;
    };
    if controller.dead {
        vel.0 = Vec2::ZERO;
        controller.moving = false;
        return;
    }

    vel.0 = input.move_axis * config.player.move_speed;
    controller.moving = input.move_axis != Vec2::ZERO;
    if input.move_axis.x != 0.0 {
        controller.facing_right = input.move_axis.x > 0.0;
        sprite.flip_x = !controller.facing_right;
    }
}

pub fn fire_weapon(
    time: Res<Time<Fixed>>,
    input: Res<PlayerInput>,
    pools: Res<ActorPools>,
    keys: Res<ProjectileKeys>,
    mut q_player: Query<(Entity, &PlayerController, &Transform, &mut Weapon), With<Player>>,
    mut requests: MessageWriter<SpawnProjectileRequest>,
) {
    let Ok((entity, controller, tf, mut weapon)) = q_player.single_mut() else {
        return;
    };
    let now = time.elapsed_secs();
    // A held trigger must not keep pushing the cooldown back.
    if !input.fire || controller.dead || !weapon.can_fire(now) {
        return;
    }

    let mut sink = RequestSink::new(&pools, &mut requests, Some(entity));
    weapon.shoot(now, tf.translation.truncate(), controller.facing(), &keys, &mut sink);
}

pub fn special_attack(
    config: Res<CombatConfig>,
    mut input: ResMut<PlayerInput>,
    mut q_player: Query<(Entity, &PlayerController, &Transform, &mut Energy), With<Player>>,
    q_targets: Query<(Entity, &Transform, &CollisionLayers), With<HealthResource>>,
    mut damage: MessageWriter<DamageRequest>,
    mut signals: MessageWriter<GameSignal>,
) {
    if !std::mem::take(&mut input.special) {
        return;
    }
    let Ok((player, controller, tf, mut energy)) = q_player.single_mut() else {
        return;
    };
    let special = &config.player.special_attack;
    if controller.dead || !energy.try_special(special.energy_cost) {
        debug!("not enough energy for the special attack");
        return;
    }

    let origin = tf.translation.truncate();
    let mut hits = 0;
    for (target, target_tf, layers) in &q_targets {
        // Dead or parked actors keep their membership but lose their filters.
        if target == player || !is_in_layer(layers, Layer::Enemy) || layers.filters == LayerMask::NONE {
            continue;
        }
        if origin.distance(target_tf.translation.truncate()) > special.radius {
            continue;
        }
        damage.write(DamageRequest {
            target,
            amount: special.damage,
            origin,
        });
        hits += 1;
    }
    info!("special attack hit {hits} enemies");
    signals.write(GameSignal::PlayerSpecialAttack { hits });
}

pub fn react_to_player_damage(
    mut changes: MessageReader<HealthChanged>,
    mut q_player: Query<(&mut PlayerController, &mut LinearVelocity, &mut CollisionLayers), With<Player>>,
    mut signals: MessageWriter<GameSignal>,
) {
    for ev in changes.read() {
        let Ok((mut controller, mut velocity, mut layers)) = q_player.get_mut(ev.entity) else {
            continue;
        };
        if controller.dead {
            continue;
        }
        match ev.change {
            HealthChange::Damaged { current } => {
                signals.write(GameSignal::PlayerTookDamage {
                    amount: ev.amount,
                    remaining: current,
                });
            }
            HealthChange::Died => {
                controller.dead = true;
                controller.moving = false;
                velocity.0 = Vec2::ZERO;
                layers.filters = LayerMask::NONE;
                info!("player died");
                signals.write(GameSignal::PlayerDied);
            }
            HealthChange::Ignored => {}
        }
    }
}

#[cfg(test)]
mod tests;
