mod common;

use avian2d::prelude::*;
use bevy::prelude::*;
use boss_arena::common::layers::Layer;
use boss_arena::plugins::combat::HealthResource;
use boss_arena::plugins::pooling::{ActorPools, PoolKey, PoolSlot, Pooled};
use boss_arena::plugins::projectiles::{Faction, Projectile, SpawnProjectileRequest};

fn active_projectiles(app: &mut App) -> Vec<(Entity, Vec2)> {
    let world = app.world_mut();
    world
        .query_filtered::<(Entity, &PoolSlot, &LinearVelocity), With<Projectile>>()
        .iter(world)
        .filter(|(_, slot, _)| **slot == PoolSlot::Active)
        .map(|(e, _, v)| (e, v.0))
        .collect()
}

#[test]
fn request_launches_hits_once_and_returns() {
    let mut app = common::app_in_game();
    let key = PoolKey::from("Basic");
    let free_before = app.world().resource::<ActorPools>().free_count(&key);

    // Far outside the arena so nothing else touches it.
    app.world_mut().write_message(SpawnProjectileRequest {
        key: key.clone(),
        origin: Vec2::new(0.0, -100.0),
        velocity: Vec2::new(10.0, 0.0),
        faction: Faction::Player,
        owner: None,
    });
    common::tick(&mut app, 2);

    let launched = active_projectiles(&mut app);
    assert_eq!(launched.len(), 1);
    let (projectile, velocity) = launched[0];
    assert_eq!(velocity, Vec2::new(10.0, 0.0));
    assert_eq!(
        app.world().resource::<ActorPools>().free_count(&key),
        free_before - 1
    );

    let target = app
        .world_mut()
        .spawn((
            HealthResource::new(50.0),
            Transform::from_xyz(0.0, -100.0, 0.0),
            CollisionLayers::new(Layer::Enemy, [Layer::PlayerBullet]),
        ))
        .id();
    for _ in 0..2 {
        app.world_mut().write_message(CollisionStart {
            collider1: projectile,
            collider2: target,
            body1: Some(projectile),
            body2: None,
        });
    }
    common::tick(&mut app, 2);

    let health = app.world().get::<HealthResource>(target).map(|h| h.current());
    assert_eq!(health, Some(40.0), "one hit per projectile");
    assert_eq!(app.world().get::<PoolSlot>(projectile), Some(&PoolSlot::Inactive));
    assert_eq!(
        app.world().get::<Pooled>(projectile).map(|p| p.key.clone()),
        Some(key.clone())
    );
    assert_eq!(app.world().resource::<ActorPools>().free_count(&key), free_before);
}

#[test]
fn unknown_key_is_dropped() {
    let mut app = common::app_in_game();
    let before = app.world().resource::<ActorPools>().total_active_count();

    app.world_mut().write_message(SpawnProjectileRequest {
        key: PoolKey::from("Nope"),
        origin: Vec2::new(0.0, -100.0),
        velocity: Vec2::X,
        faction: Faction::Hostile,
        owner: None,
    });
    common::tick(&mut app, 2);

    assert!(active_projectiles(&mut app).is_empty());
    assert_eq!(app.world().resource::<ActorPools>().total_active_count(), before);
}
