use bevy::prelude::*;

use super::components::Projectile;
use crate::plugins::pooling::PoolSlot;

/// Count down live projectiles; an expired one is marked for return.
pub fn expire_projectiles(time: Res<Time<Fixed>>, mut q: Query<(&mut Projectile, &mut PoolSlot)>) {
    let dt = time.delta_secs();
    for (mut projectile, mut slot) in &mut q {
        if *slot != PoolSlot::Active {
            continue;
        }
        projectile.remaining -= dt;
        if projectile.remaining <= 0.0 {
            *slot = PoolSlot::PendingReturn;
        }
    }
}
