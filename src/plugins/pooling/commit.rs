//! Return commit: recycle actors marked `PoolSlot::PendingReturn`.
//!
//! This system is the single place where actors go back into their pool, whatever marked them
//! (projectile hit, lifetime, delayed return after death, checkpoint cull). It also drops any
//! delayed task still aimed at the entity so nothing fires against the next occupant.

use bevy::prelude::*;

use super::host::{Blueprints, CommandsHost, PoolSlot, Pooled};
use super::pool::{ActorHost, Release};
use super::ActorPools;
use crate::plugins::scheduler::DelayedActions;

pub fn return_to_pool_commit(
    mut commands: Commands,
    mut pools: ResMut<ActorPools>,
    blueprints: Res<Blueprints>,
    mut delayed: ResMut<DelayedActions>,
    q: Query<(Entity, &Pooled, &PoolSlot)>,
) {
    let mut host = CommandsHost::new(&mut commands, &blueprints);

    for (e, pooled, slot) in &q {
        if *slot != PoolSlot::PendingReturn {
            continue;
        }

        let cancelled = delayed.cancel_for(e);
        if cancelled > 0 {
            debug!("cancelled {cancelled} delayed task(s) for returning {e:?}");
        }

        match pools.release(&pooled.key, e, &mut host) {
            Ok(Release::Returned) => {}
            // Not tracked as active: still park it so the slot stops asking.
            Ok(Release::AlreadyFree) | Err(_) => host.deactivate(&pooled.key, e),
        }
    }
}
