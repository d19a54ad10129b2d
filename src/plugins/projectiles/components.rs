use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::plugins::pooling::Poolable;

/// Who fired a projectile, which decides what it can hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Faction {
    #[default]
    Player,
    Hostile,
}

impl Faction {
    #[inline]
    pub fn membership(self) -> Layer {
        match self {
            Self::Player => Layer::PlayerBullet,
            Self::Hostile => Layer::EnemyBullet,
        }
    }

    /// The actor layer this faction damages.
    #[inline]
    pub fn victim(self) -> Layer {
        match self {
            Self::Player => Layer::Enemy,
            Self::Hostile => Layer::Player,
        }
    }

    #[inline]
    pub fn active_layers(self) -> CollisionLayers {
        CollisionLayers::new(self.membership(), [Layer::World, self.victim()])
    }
}

#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub damage: f32,
    pub lifetime: f32,
    pub remaining: f32,
    /// Set on the first damaging contact; later contacts in the same life deal nothing.
    pub already_hit: bool,
    pub faction: Faction,
    pub owner: Option<Entity>,
}

impl Projectile {
    pub fn new(damage: f32, lifetime: f32) -> Self {
        Self {
            damage,
            lifetime,
            remaining: lifetime,
            already_hit: false,
            faction: Faction::Player,
            owner: None,
        }
    }
}

impl Poolable for Projectile {
    fn reset(&mut self) {
        self.remaining = self.lifetime;
        self.already_hit = false;
        self.owner = None;
    }
}
