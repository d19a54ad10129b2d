//! Buffered spawn requests.
//!
//! Weapons never touch the pools: they write a request and the allocator, the single writer of
//! projectile pools, applies it in the same tick.

use bevy::prelude::*;

use super::components::Faction;
use crate::plugins::pooling::PoolKey;

#[derive(Message, Clone, Debug, PartialEq)]
pub struct SpawnProjectileRequest {
    pub key: PoolKey,
    pub origin: Vec2,
    pub velocity: Vec2,
    pub faction: Faction,
    pub owner: Option<Entity>,
}
