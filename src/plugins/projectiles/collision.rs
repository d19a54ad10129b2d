//! Projectile contacts: damage the victim once, then return the projectile.

use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use super::components::Projectile;
use crate::common::layers::{is_in_layer, Layer};
use crate::plugins::combat::DamageRequest;
use crate::plugins::pooling::PoolSlot;

#[derive(Clone, Copy, Debug)]
pub(crate) struct CollisionTarget {
    pub collider: Entity,
    pub body: Option<Entity>,
}

impl CollisionTarget {
    /// The entity that owns gameplay state (the rigid body when the collider is a child).
    #[inline]
    pub fn gameplay_owner(self) -> Entity {
        self.body.unwrap_or(self.collider)
    }
}

#[inline]
pub(crate) fn targets(ev: &CollisionStart) -> (CollisionTarget, CollisionTarget) {
    (
        CollisionTarget {
            collider: ev.collider1,
            body: ev.body1,
        },
        CollisionTarget {
            collider: ev.collider2,
            body: ev.body2,
        },
    )
}

pub fn resolve_projectile_collisions(
    mut started: MessageReader<CollisionStart>,
    mut damage: MessageWriter<DamageRequest>,
    q_is_projectile: Query<(), With<Projectile>>,
    mut q_projectiles: Query<(&mut Projectile, &mut PoolSlot, &Transform)>,
    q_layers: Query<&CollisionLayers>,
    // Per-tick dedupe
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let (t1, t2) = targets(ev);

        let p1 = q_is_projectile.contains(t1.collider);
        let p2 = q_is_projectile.contains(t2.collider);
        if !(p1 ^ p2) {
            continue; // must be exactly one projectile
        }
        let (projectile_side, other_side) = if p1 { (t1, t2) } else { (t2, t1) };

        if !seen.insert(projectile_side.collider) {
            continue;
        }

        let Ok(other_layers) = q_layers.get(other_side.collider) else {
            continue;
        };
        let Ok((mut projectile, mut slot, tf)) = q_projectiles.get_mut(projectile_side.collider) else {
            continue;
        };
        if *slot != PoolSlot::Active {
            continue;
        }

        if is_in_layer(other_layers, Layer::World) {
            *slot = PoolSlot::PendingReturn;
            continue;
        }

        if is_in_layer(other_layers, projectile.faction.victim()) {
            if !projectile.already_hit {
                projectile.already_hit = true;
                damage.write(DamageRequest {
                    target: other_side.gameplay_owner(),
                    amount: projectile.damage,
                    origin: tf.translation.truncate(),
                });
            }
            *slot = PoolSlot::PendingReturn;
        }
    }
}
