//! Health tracking and the damage pipeline.
//!
//! Anything that hurts an actor writes a [`DamageRequest`]. [`apply_damage_requests`] is the only
//! system that mutates [`HealthResource`]; owners learn about the outcome from [`HealthChanged`]
//! in the same fixed tick (`ResolveSystems::Damage` runs before `ResolveSystems::Reactions`).

use bevy::prelude::*;

use crate::plugins::core::ResolveSystems;
use crate::plugins::pooling::{register_poolable, Poolable};

/// Bounded hit points. `0 <= current <= maximum` always holds.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct HealthResource {
    current: f32,
    maximum: f32,
    dead: bool,
}

/// Outcome of one [`HealthResource::apply_damage`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HealthChange {
    /// Already dead, or a non-positive amount.
    Ignored,
    Damaged { current: f32 },
    /// Reported exactly once per life.
    Died,
}

impl HealthResource {
    pub fn new(maximum: f32) -> Self {
        let maximum = maximum.max(0.0);
        Self {
            current: maximum,
            maximum,
            dead: false,
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
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Current health as a percentage of maximum, in `0..=100`.
    pub fn percent(&self) -> f32 {
        if self.maximum <= 0.0 {
            return 0.0;
        }
        self.current / self.maximum * 100.0
    }

    pub fn apply_damage(&mut self, amount: f32) -> HealthChange {
        if self.dead || amount <= 0.0 {
            return HealthChange::Ignored;
        }

        self.current = (self.current - amount).max(0.0);
        if self.current <= 0.0 {
            self.dead = true;
            HealthChange::Died
        } else {
            HealthChange::Damaged {
                current: self.current,
            }
        }
    }

    /// Returns the new value, or `None` when dead.
    pub fn heal(&mut self, amount: f32) -> Option<f32> {
        if self.dead {
            return None;
        }
        self.current = (self.current + amount.max(0.0)).min(self.maximum);
        Some(self.current)
    }
}

impl Poolable for HealthResource {
    fn reset(&mut self) {
        self.current = self.maximum;
        self.dead = false;
    }
}

/// Request to damage `target`. `origin` is where the hit came from (knockback direction).
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct DamageRequest {
    pub target: Entity,
    pub amount: f32,
    pub origin: Vec2,
}

/// Written for every request that changed health.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct HealthChanged {
    pub entity: Entity,
    pub change: HealthChange,
    pub amount: f32,
    pub origin: Vec2,
}

pub fn plugin(app: &mut App) {
    register_poolable::<HealthResource>(app.world_mut());

    app.add_message::<DamageRequest>()
        .add_message::<HealthChanged>()
        .add_systems(
            FixedPostUpdate,
            apply_damage_requests.in_set(ResolveSystems::Damage),
        );
}

pub fn apply_damage_requests(
    mut requests: MessageReader<DamageRequest>,
    mut changed: MessageWriter<HealthChanged>,
    mut q_health: Query<&mut HealthResource>,
) {
    for req in requests.read() {
        let Ok(mut health) = q_health.get_mut(req.target) else {
            debug!("damage request for {:?} without health", req.target);
            continue;
        };

        let change = health.apply_damage(req.amount);
        if change == HealthChange::Ignored {
            continue;
        }
        changed.write(HealthChanged {
            entity: req.target,
            change,
            amount: req.amount,
            origin: req.origin,
        });
    }
}
