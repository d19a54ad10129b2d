//! Projectiles plugin: message-based producer → consumer spawning over keyed pools.
//!
//! # Data flow
//! ```text
//!   FixedUpdate
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (A) Producers (TickSystems::Act): player / enemy / boss weapons           │
//!│      - Weapon::shoot → RequestSink                                         │
//!│      - writes: SpawnProjectileRequest message                              │
//!│                                                                            │
//!│  (B) Consumer: allocate_projectiles (after Act)                            │
//!│      - reads: SpawnProjectileRequest messages                              │
//!│      - mutates: ActorPools (acquire), Transform, LinearVelocity, layers    │
//!│                                                                            │
//!│  (C) expire_projectiles: lifetime countdown → PendingReturn                │
//!└────────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!   FixedPostUpdate
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (D) Physics emits CollisionStart messages (Avian)                         │
//!│                                                                            │
//!│  (E) resolve_projectile_collisions (ResolveSystems::Collisions)            │
//!│      - World → PendingReturn                                               │
//!│      - victim layer → DamageRequest (once) + PendingReturn                 │
//!│                                                                            │
//!│  (F) pooling commit releases every PendingReturn                           │
//!└────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Producers never borrow `ActorPools` mutably; the allocator is the only projectile writer.

pub mod allocator;
pub mod collision;
pub mod components;
pub mod lifetime;
pub mod messages;
pub mod patterns;
pub mod weapon;

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::plugins::core::config::ProjectileSpec;
use crate::plugins::core::{CombatConfig, ResolveSystems, TickSystems};
use crate::plugins::pooling::{register_poolable, ActiveLayers, Blueprint, Blueprints};

pub use components::{Faction, Projectile};
pub use messages::SpawnProjectileRequest;
pub use weapon::{ProjectileKeys, ProjectileType, Weapon};

pub fn plugin(app: &mut App) {
    let config = app.world().resource::<CombatConfig>().clone();

    register_poolable::<Projectile>(app.world_mut());
    register_poolable::<Weapon>(app.world_mut());

    {
        let mut blueprints = app.world_mut().get_resource_or_init::<Blueprints>();
        for spec in &config.projectiles {
            blueprints.insert(spec.key.clone(), projectile_blueprint(spec));
        }
    }

    app.insert_resource(ProjectileKeys::from_config(&config))
        .add_message::<SpawnProjectileRequest>()
        .add_systems(
            FixedUpdate,
            (
                allocator::allocate_projectiles.after(TickSystems::Act),
                lifetime::expire_projectiles.in_set(TickSystems::Act),
            )
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            collision::resolve_projectile_collisions.in_set(ResolveSystems::Collisions),
        );
}

fn projectile_color(kind: ProjectileType) -> Color {
    match kind {
        ProjectileType::Basic => Color::srgb(1.0, 0.85, 0.3),
        ProjectileType::Elite => Color::srgb(0.9, 0.3, 0.9),
        ProjectileType::ShooterChoco | ProjectileType::ShotgunChoco => Color::srgb(0.45, 0.25, 0.1),
        ProjectileType::ShooterCandy | ProjectileType::ShotgunCandy => Color::srgb(1.0, 0.45, 0.7),
    }
}

pub fn projectile_blueprint(spec: &ProjectileSpec) -> Blueprint {
    let (damage, lifetime, radius) = (spec.damage, spec.lifetime, spec.radius);
    let color = projectile_color(spec.kind);

    Blueprint::new(spec.pool_size, move |e| {
        let idle = Faction::Player;
        e.insert((
            Projectile::new(damage, lifetime),
            Sprite {
                color,
                custom_size: Some(Vec2::splat(radius * 2.0)),
                ..default()
            },
            RigidBody::Dynamic,
            Collider::circle(radius),
            Sensor,
            CollisionEventsEnabled,
            CollisionLayers::new(idle.membership(), LayerMask::NONE),
            ActiveLayers(idle.active_layers()),
            LinearVelocity::ZERO,
        ));
    })
}

#[cfg(test)]
mod tests;
