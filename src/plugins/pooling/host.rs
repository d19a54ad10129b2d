//! ECS side of pooling: pooled-entity components, blueprints and the `Commands` host.
//!
//! Activation and deactivation never add or remove components. A pooled entity is spawned once
//! with everything it will ever need and afterwards only its values change:
//!
//! - inactive: `PoolSlot::Inactive`, hidden, zero velocity, collision filters empty
//! - active:   `PoolSlot::Active`, visible, collision filters from `ActiveLayers`

use std::sync::Arc;

use avian2d::prelude::*;
use bevy::ecs::component::Mutable;
use bevy::prelude::*;

use super::pool::{ActorHost, PoolKey};

/// Restore an actor component to its canonical spawn condition.
pub trait Poolable {
    fn reset(&mut self);
}

/// Which pool an entity belongs to.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Pooled {
    pub key: PoolKey,
}

/// Slot state of a pooled entity.
///
/// `PendingReturn` is a request: any system may set it, the commit system performs the release.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolSlot {
    #[default]
    Inactive,
    Active,
    PendingReturn,
}

/// Bumped on every reset. Delayed tasks carry the value they were scheduled with.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpawnGeneration(pub u32);

/// Collision layers to restore on activation.
#[derive(Component, Debug, Clone, Copy)]
pub struct ActiveLayers(pub CollisionLayers);

/// Reset functions run on every acquired entity, one per registered `Poolable` component.
#[derive(Resource, Default, Clone)]
pub struct ResetHooks(Vec<fn(&mut EntityWorldMut)>);

/// Add `T::reset` to the hooks run on acquire.
pub fn register_poolable<T>(world: &mut World)
where
    T: Component<Mutability = Mutable> + Poolable,
{
    world
        .get_resource_or_init::<ResetHooks>()
        .0
        .push(reset_component::<T>);
}

fn reset_component<T>(entity: &mut EntityWorldMut)
where
    T: Component<Mutability = Mutable> + Poolable,
{
    if let Some(mut component) = entity.get_mut::<T>() {
        component.reset();
    }
}

type BuildFn = dyn Fn(&mut EntityCommands) + Send + Sync;

/// How to construct one pooled actor.
#[derive(Clone)]
pub struct Blueprint {
    pub prewarm: usize,
    build: Arc<BuildFn>,
}

impl Blueprint {
    pub fn new(prewarm: usize, build: impl Fn(&mut EntityCommands) + Send + Sync + 'static) -> Self {
        Self {
            prewarm,
            build: Arc::new(build),
        }
    }
}

impl std::fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blueprint").field("prewarm", &self.prewarm).finish_non_exhaustive()
    }
}

/// Blueprints by pool key, registered by the plugin that owns each actor kind.
#[derive(Resource, Default, Debug)]
pub struct Blueprints(bevy::platform::collections::HashMap<PoolKey, Blueprint>);

impl Blueprints {
    pub fn insert(&mut self, key: PoolKey, blueprint: Blueprint) {
        if self.0.insert(key.clone(), blueprint).is_some() {
            warn!("blueprint for '{key}' replaced");
        }
    }

    pub fn get(&self, key: &PoolKey) -> Option<&Blueprint> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PoolKey, &Blueprint)> {
        self.0.iter()
    }
}

/// [`ActorHost`] over deferred ECS commands.
pub struct CommandsHost<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    blueprints: &'a Blueprints,
}

impl<'a, 'w, 's> CommandsHost<'a, 'w, 's> {
    pub fn new(commands: &'a mut Commands<'w, 's>, blueprints: &'a Blueprints) -> Self {
        Self {
            commands,
            blueprints,
        }
    }
}

impl ActorHost<Entity> for CommandsHost<'_, '_, '_> {
    fn create(&mut self, key: &PoolKey) -> Entity {
        let mut entity = self.commands.spawn((
            Name::new(format!("{key}(Pooled)")),
            Pooled { key: key.clone() },
            PoolSlot::Inactive,
            SpawnGeneration::default(),
            Transform::default(),
            Visibility::Hidden,
        ));

        match self.blueprints.get(key) {
            Some(blueprint) => (blueprint.build)(&mut entity),
            None => warn!("no blueprint for pool '{key}'; spawned a bare actor"),
        }

        entity.id()
    }

    fn activate(&mut self, _key: &PoolKey, handle: Entity) {
        self.commands.entity(handle).queue(activate_entity);
    }

    fn reset(&mut self, _key: &PoolKey, handle: Entity) {
        self.commands.entity(handle).queue(reset_entity);
    }

    fn deactivate(&mut self, _key: &PoolKey, handle: Entity) {
        self.commands.entity(handle).queue(deactivate_entity);
    }

    fn destroy(&mut self, _key: &PoolKey, handle: Entity) {
        self.commands.entity(handle).despawn();
    }
}

fn activate_entity(mut entity: EntityWorldMut) {
    if let Some(ActiveLayers(layers)) = entity.get::<ActiveLayers>().copied() {
        entity.insert(layers);
    }
    entity.insert((PoolSlot::Active, Visibility::Visible));
}

fn reset_entity(mut entity: EntityWorldMut) {
    let hooks = entity.world().get_resource::<ResetHooks>().cloned().unwrap_or_default();
    for hook in &hooks.0 {
        hook(&mut entity);
    }
    if let Some(mut generation) = entity.get_mut::<SpawnGeneration>() {
        generation.0 = generation.0.wrapping_add(1);
    }
}

fn deactivate_entity(mut entity: EntityWorldMut) {
    if let Some(layers) = entity.get::<CollisionLayers>().copied() {
        entity.insert(CollisionLayers::new(layers.memberships, LayerMask::NONE));
    }
    entity.insert((PoolSlot::Inactive, Visibility::Hidden, LinearVelocity::ZERO));
}
