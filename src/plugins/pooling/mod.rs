//! Pooling plugin: keyed, data-driven recycling of every transient actor.
//!
//! # Data flow
//! ```text
//!   build time: owning plugins insert a Blueprint per PoolKey (from CombatConfig)
//!        │
//!        v
//!   Startup: prewarm_pools  → register keys + pre-spawn inactive entities
//!        │
//!        v
//!   FixedUpdate: producers acquire through CommandsHost
//!                (projectile allocator, enemy/collectable spawners)
//!        │
//!        v
//!   any system: PoolSlot = PendingReturn
//!        │
//!        v
//!   FixedPostUpdate (last): return_to_pool_commit → ActorPools::release
//! ```
//!
//! Producers never hand out handles they did not get from `ActorPools`, and only the commit
//! system releases, so a handle cannot be active twice.

pub mod commit;
pub mod host;
pub mod pool;

use bevy::prelude::*;

use crate::common::state::GameState;

pub use host::{
    register_poolable, ActiveLayers, Blueprint, Blueprints, CommandsHost, PoolSlot, Poolable,
    Pooled, SpawnGeneration,
};
pub use pool::{ActorHost, Pool, PoolError, PoolKey, PoolRegistry, Release};

/// Every pool in the game, keyed by [`PoolKey`].
#[derive(Resource, Debug, Default, Deref, DerefMut)]
pub struct ActorPools(pub PoolRegistry<Entity>);

/// Runs after every gameplay system that can mark a return.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolCommitSystems;

pub fn plugin(app: &mut App) {
    app.init_resource::<ActorPools>()
        .init_resource::<Blueprints>()
        .init_resource::<host::ResetHooks>()
        .add_systems(Startup, prewarm_pools)
        .add_systems(
            FixedPostUpdate,
            commit::return_to_pool_commit
                .in_set(PoolCommitSystems)
                .run_if(in_state(GameState::InGame)),
        );
}

/// Register one pool per blueprint and pre-spawn its inactive actors.
pub fn prewarm_pools(mut commands: Commands, mut pools: ResMut<ActorPools>, blueprints: Res<Blueprints>) {
    let mut host = CommandsHost::new(&mut commands, &blueprints);

    for (key, blueprint) in blueprints.iter() {
        if !pools.register(key.clone()) {
            continue;
        }
        if let Err(e) = pools.prewarm(key, blueprint.prewarm, &mut host) {
            warn!("prewarm failed: {e}");
        }
    }
    info!("registered {} actor pool(s)", pools.keys().count());
}
