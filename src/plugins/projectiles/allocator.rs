//! Spawn consumer: acquire projectiles from their pools and launch them.
//!
//! Acquire queues the activation and the `Poolable` resets; the writes below are queued after
//! them, so the launch values are never overwritten by a reset.

use avian2d::prelude::*;
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;

use super::components::{Faction, Projectile};
use super::messages::SpawnProjectileRequest;
use crate::plugins::pooling::{ActiveLayers, ActorPools, Blueprints, CommandsHost};

pub const PROJECTILE_Z: f32 = 2.0;

pub fn allocate_projectiles(
    mut commands: Commands,
    mut pools: ResMut<ActorPools>,
    blueprints: Res<Blueprints>,
    mut reader: MessageReader<SpawnProjectileRequest>,
) {
    for req in reader.read() {
        let e = {
            let mut host = CommandsHost::new(&mut commands, &blueprints);
            match pools.acquire(&req.key, &mut host) {
                Ok(e) => e,
                Err(err) => {
                    warn!("dropped projectile request: {err}");
                    continue;
                }
            }
        };

        let layers = req.faction.active_layers();
        let (faction, owner) = (req.faction, req.owner);
        commands
            .entity(e)
            .insert((
                Transform::from_translation(req.origin.extend(PROJECTILE_Z)),
                LinearVelocity(req.velocity),
                ActiveLayers(layers),
                layers,
            ))
            .queue(move |mut entity: EntityWorldMut| {
                if let Some(mut projectile) = entity.get_mut::<Projectile>() {
                    launch(&mut projectile, faction, owner);
                }
            });
    }
}

#[inline]
fn launch(projectile: &mut Projectile, faction: Faction, owner: Option<Entity>) {
    projectile.faction = faction;
    projectile.owner = owner;
}
