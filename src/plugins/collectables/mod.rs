//! Collectables plugin: pooled pickups that restore health, energy or grant a special attack.
//!
//! - Reactions: `pick_up_collectables` applies the effect once on player contact
//! - Signals: `return_behind_checkpoint` recycles pickups the arena border has passed

use avian2d::prelude::*;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::layers::Layer;
use crate::common::signals::GameSignal;
use crate::common::state::GameState;
use crate::plugins::combat::HealthResource;
use crate::plugins::core::config::CollectableSpec;
use crate::plugins::core::{CombatConfig, ResolveSystems};
use crate::plugins::player::{Energy, Player};
use crate::plugins::pooling::{
    register_poolable, ActiveLayers, Blueprint, Blueprints, PoolSlot, Poolable, SpawnGeneration,
};
use crate::plugins::projectiles::collision::targets;
use crate::plugins::scheduler::DelayedActions;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollectableEffect {
    Life(f32),
    Energy(f32),
    SpecialAttack,
}

impl Default for CollectableEffect {
    fn default() -> Self {
        Self::Energy(100.0)
    }
}

#[derive(Component, Debug, Clone)]
pub struct Collectable {
    pub effect: CollectableEffect,
    pub collected: bool,
    /// Seconds between pickup and return to the pool.
    pub return_delay: f32,
}

impl Poolable for Collectable {
    fn reset(&mut self) {
        self.collected = false;
    }
}

pub fn plugin(app: &mut App) {
    let config = app.world().resource::<CombatConfig>().clone();

    register_poolable::<Collectable>(app.world_mut());
    {
        let mut blueprints = app.world_mut().get_resource_or_init::<Blueprints>();
        for spec in &config.collectables {
            blueprints.insert(spec.key.clone(), collectable_blueprint(spec));
        }
    }

    app.add_systems(
        FixedPostUpdate,
        (
            pick_up_collectables.in_set(ResolveSystems::Reactions),
            return_behind_checkpoint.in_set(ResolveSystems::Signals),
        )
            .run_if(in_state(GameState::InGame)),
    );
}

pub fn collectable_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Collectable, [Layer::Player])
}

pub fn collectable_blueprint(spec: &CollectableSpec) -> Blueprint {
    let spec = spec.clone();
    let color = match spec.effect {
        CollectableEffect::Life(_) => Color::srgb(0.3, 0.9, 0.35),
        CollectableEffect::Energy(_) => Color::srgb(0.3, 0.6, 1.0),
        CollectableEffect::SpecialAttack => Color::srgb(1.0, 0.85, 0.2),
    };

    Blueprint::new(spec.pool_size, move |e| {
        e.insert((
            Collectable {
                effect: spec.effect,
                collected: false,
                return_delay: spec.return_delay,
            },
            Sprite {
                color,
                custom_size: Some(Vec2::splat(spec.radius * 2.0)),
                ..default()
            },
            RigidBody::Static,
            Collider::circle(spec.radius),
            Sensor,
            CollisionEventsEnabled,
            CollisionLayers::new(Layer::Collectable, LayerMask::NONE),
            ActiveLayers(collectable_layers()),
        ));
    })
}

/// Apply `effect` to the player. Returns `false` when nothing could take it (dead player).
pub fn apply_effect(effect: CollectableEffect, health: &mut HealthResource, energy: &mut Energy) -> bool {
    if health.is_dead() {
        return false;
    }
    match effect {
        CollectableEffect::Life(amount) => {
            health.heal(amount);
        }
        CollectableEffect::Energy(amount) => energy.add(amount),
        CollectableEffect::SpecialAttack => energy.grant_special(),
    }
    true
}

#[allow(clippy::type_complexity)]
pub fn pick_up_collectables(
    mut started: MessageReader<CollisionStart>,
    mut delayed: ResMut<DelayedActions>,
    mut q_player: Query<(&mut HealthResource, &mut Energy), With<Player>>,
    mut q_items: Query<(
        &mut Collectable,
        &PoolSlot,
        &SpawnGeneration,
        &mut Visibility,
        &mut CollisionLayers,
    )>,
) {
    for ev in started.read() {
        let (a, b) = targets(ev);
        for (item, other) in [(a, b), (b, a)] {
            let Ok((mut collectable, slot, generation, mut visibility, mut layers)) =
                q_items.get_mut(item.collider)
            else {
                continue;
            };
            if *slot != PoolSlot::Active || collectable.collected {
                continue;
            }
            let Ok((mut health, mut energy)) = q_player.get_mut(other.gameplay_owner()) else {
                continue;
            };
            if !apply_effect(collectable.effect, &mut health, &mut energy) {
                continue;
            }

            debug!("picked up {:?}", collectable.effect);
            collectable.collected = true;
            *visibility = Visibility::Hidden;
            layers.filters = LayerMask::NONE;
            delayed.return_to_pool(item.collider, *generation, collectable.return_delay);
        }
    }
}

pub fn return_behind_checkpoint(
    mut signals: MessageReader<GameSignal>,
    mut delayed: ResMut<DelayedActions>,
    mut q: Query<(Entity, &Transform, &mut PoolSlot), With<Collectable>>,
) {
    for signal in signals.read() {
        let GameSignal::CheckpointReached { position, .. } = signal else {
            continue;
        };
        if *position == Vec2::ZERO {
            continue;
        }
        for (entity, tf, mut slot) in &mut q {
            if *slot == PoolSlot::Active && position.x > tf.translation.x {
                delayed.cancel_for(entity);
                *slot = PoolSlot::PendingReturn;
            }
        }
    }
}
