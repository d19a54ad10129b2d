//! Weapon: fire-rate gate plus pattern dispatch.
//!
//! A weapon never touches a pool. It resolves its projectile type to a [`PoolKey`] and hands
//! each shot to a [`ProjectileSink`]; in the game that sink writes `SpawnProjectileRequest`
//! messages for the allocator.

use bevy::ecs::message::MessageWriter;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::components::Faction;
use super::messages::SpawnProjectileRequest;
use super::patterns::{AttackPattern, PatternDescriptor};
use crate::plugins::core::CombatConfig;
use crate::plugins::pooling::{ActorPools, PoolError, PoolKey, Poolable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum ProjectileType {
    #[default]
    Basic,
    Elite,
    ShooterChoco,
    ShooterCandy,
    ShotgunChoco,
    ShotgunCandy,
}

impl ProjectileType {
    pub const ALL: [Self; 6] = [
        Self::Basic,
        Self::Elite,
        Self::ShooterChoco,
        Self::ShooterCandy,
        Self::ShotgunChoco,
        Self::ShotgunCandy,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Elite => "Elite",
            Self::ShooterChoco => "ShooterChoco",
            Self::ShooterCandy => "ShooterCandy",
            Self::ShotgunChoco => "ShotgunChoco",
            Self::ShotgunCandy => "ShotgunCandy",
        }
    }
}

/// Projectile type → pool key. Unmapped types resolve to the fallback key.
#[derive(Resource, Debug, Clone)]
pub struct ProjectileKeys {
    keys: HashMap<ProjectileType, PoolKey>,
    fallback: PoolKey,
}

impl ProjectileKeys {
    pub fn new(fallback: PoolKey) -> Self {
        Self {
            keys: HashMap::default(),
            fallback,
        }
    }

    pub fn from_config(config: &CombatConfig) -> Self {
        let mut keys = Self::new(config.fallback_projectile.clone());
        for spec in &config.projectiles {
            keys.insert(spec.kind, spec.key.clone());
        }
        keys
    }

    pub fn insert(&mut self, kind: ProjectileType, key: PoolKey) {
        self.keys.insert(kind, key);
    }

    pub fn key_for(&self, kind: ProjectileType) -> &PoolKey {
        match self.keys.get(&kind) {
            Some(key) => key,
            None => {
                warn!(
                    "no pool mapped for projectile type {}; falling back to '{}'",
                    kind.as_str(),
                    self.fallback
                );
                &self.fallback
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Shots per second.
    pub fire_rate: f32,
    pub use_fire_rate: bool,
    /// Speed of an unpatterned shot when no custom speed is given.
    pub default_speed: f32,
    /// Distance from the owner's centre to where projectiles appear.
    pub muzzle_offset: f32,
    /// When a volley is suppressed because its pool is missing, still start the cooldown.
    pub advance_cooldown_on_suppressed_shot: bool,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            fire_rate: 1.0,
            use_fire_rate: true,
            default_speed: 10.0,
            muzzle_offset: 0.5,
            advance_cooldown_on_suppressed_shot: true,
        }
    }
}

/// One projectile to launch.
#[derive(Debug, Clone, PartialEq)]
pub struct Shot {
    pub key: PoolKey,
    pub origin: Vec2,
    pub velocity: Vec2,
    pub faction: Faction,
}

/// Where a weapon sends its shots.
pub trait ProjectileSink {
    fn fire(&mut self, shot: Shot) -> Result<(), PoolError>;
}

/// Sink that writes spawn requests, refusing keys with no registered pool.
pub struct RequestSink<'a, 'w> {
    pools: &'a ActorPools,
    writer: &'a mut MessageWriter<'w, SpawnProjectileRequest>,
    owner: Option<Entity>,
}

impl<'a, 'w> RequestSink<'a, 'w> {
    pub fn new(
        pools: &'a ActorPools,
        writer: &'a mut MessageWriter<'w, SpawnProjectileRequest>,
        owner: Option<Entity>,
    ) -> Self {
        Self { pools, writer, owner }
    }
}

impl ProjectileSink for RequestSink<'_, '_> {
    fn fire(&mut self, shot: Shot) -> Result<(), PoolError> {
        if !self.pools.contains(&shot.key) {
            return Err(PoolError::UnknownKey(shot.key));
        }
        self.writer.write(SpawnProjectileRequest {
            key: shot.key,
            origin: shot.origin,
            velocity: shot.velocity,
            faction: shot.faction,
            owner: self.owner,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShootOutcome {
    OnCooldown,
    Fired { count: usize },
    /// The volley's pool is not configured; nothing was launched.
    Suppressed(PoolError),
}

#[derive(Component, Debug, Clone)]
pub struct Weapon {
    pub config: WeaponConfig,
    pub faction: Faction,
    pattern: Option<PatternDescriptor>,
    projectile_type: ProjectileType,
    next_fire_time: f32,
}

impl Weapon {
    pub fn new(config: WeaponConfig, faction: Faction, projectile_type: ProjectileType) -> Self {
        Self {
            config,
            faction,
            pattern: None,
            projectile_type,
            next_fire_time: 0.0,
        }
    }

    pub fn with_pattern(mut self, pattern: PatternDescriptor) -> Self {
        self.pattern = Some(pattern);
        self
    }

    #[inline]
    pub fn pattern(&self) -> Option<&PatternDescriptor> {
        self.pattern.as_ref()
    }

    #[inline]
    pub fn projectile_type(&self) -> ProjectileType {
        self.projectile_type
    }

    #[inline]
    pub fn next_fire_time(&self) -> f32 {
        self.next_fire_time
    }

    #[inline]
    pub fn can_fire(&self, now: f32) -> bool {
        !self.config.use_fire_rate || now >= self.next_fire_time
    }

    /// Replace the pattern. `None` is rejected and the current pattern kept.
    pub fn set_pattern(&mut self, pattern: Option<PatternDescriptor>) -> bool {
        match pattern {
            Some(p) => {
                self.pattern = Some(p);
                true
            }
            None => {
                warn!("attempted to set an empty attack pattern; keeping the current one");
                false
            }
        }
    }

    pub fn set_projectile_type(&mut self, projectile_type: ProjectileType) {
        self.projectile_type = projectile_type;
    }

    pub fn shoot(
        &mut self,
        now: f32,
        origin: Vec2,
        direction: Vec2,
        keys: &ProjectileKeys,
        sink: &mut impl ProjectileSink,
    ) -> ShootOutcome {
        self.fire_volley(now, origin, direction, None, keys, sink)
    }

    /// Like [`Weapon::shoot`], but an unpatterned shot flies at `speed`.
    pub fn shoot_at_speed(
        &mut self,
        now: f32,
        origin: Vec2,
        direction: Vec2,
        speed: f32,
        keys: &ProjectileKeys,
        sink: &mut impl ProjectileSink,
    ) -> ShootOutcome {
        self.fire_volley(now, origin, direction, Some(speed), keys, sink)
    }

    fn fire_volley(
        &mut self,
        now: f32,
        origin: Vec2,
        direction: Vec2,
        custom_speed: Option<f32>,
        keys: &ProjectileKeys,
        sink: &mut impl ProjectileSink,
    ) -> ShootOutcome {
        let outcome = if self.can_fire(now) {
            self.dispatch(origin, direction, custom_speed, keys, sink)
        } else {
            ShootOutcome::OnCooldown
        };

        // The cooldown restarts on every call, fired or not.
        if self.config.use_fire_rate {
            let suppressed = matches!(outcome, ShootOutcome::Suppressed(_));
            if !suppressed || self.config.advance_cooldown_on_suppressed_shot {
                self.next_fire_time = now + 1.0 / self.config.fire_rate;
            }
        }
        outcome
    }

    fn dispatch(
        &self,
        origin: Vec2,
        direction: Vec2,
        custom_speed: Option<f32>,
        keys: &ProjectileKeys,
        sink: &mut impl ProjectileSink,
    ) -> ShootOutcome {
        let (dirs, speed) = match self.pattern {
            Some(p) if p.pattern != AttackPattern::None => (p.directions(direction), p.speed),
            _ => (
                vec![direction.try_normalize().unwrap_or(Vec2::X)],
                custom_speed.unwrap_or(self.config.default_speed),
            ),
        };

        let key = keys.key_for(self.projectile_type);
        let mut count = 0;
        for dir in dirs {
            let shot = Shot {
                key: key.clone(),
                origin: origin + dir * self.config.muzzle_offset,
                velocity: dir * speed,
                faction: self.faction,
            };
            if let Err(e) = sink.fire(shot) {
                warn!("weapon volley suppressed: {e}");
                return ShootOutcome::Suppressed(e);
            }
            count += 1;
        }
        ShootOutcome::Fired { count }
    }
}

impl Poolable for Weapon {
    fn reset(&mut self) {
        self.next_fire_time = 0.0;
    }
}
