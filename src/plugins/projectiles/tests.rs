//! Projectile tests. Collisions are injected as `CollisionStart` messages and the resolve system
//! is run once, so nothing depends on the physics pipeline.

use std::f32::consts::FRAC_1_SQRT_2;

use avian2d::prelude::*;
use bevy::ecs::message::Messages;
use bevy::prelude::*;

use super::allocator::allocate_projectiles;
use super::collision::resolve_projectile_collisions;
use super::lifetime::expire_projectiles;
use super::patterns::{directions, AttackPattern, PatternDescriptor};
use super::weapon::{ProjectileSink, ShootOutcome, Shot, WeaponConfig};
use super::*;
use crate::common::layers::Layer;
use crate::common::test_utils::{drain_messages, fixed_time, run_system_once};
use crate::plugins::combat::DamageRequest;
use crate::plugins::core::config::ProjectileSpec;
use crate::plugins::pooling::{prewarm_pools, ActorPools, PoolError, PoolKey, PoolSlot};

fn assert_vec_eq(a: Vec2, b: Vec2) {
    assert!((a - b).length() < 1e-5, "{a} != {b}");
}

// --------------------------------------------------------------------------------------
// Patterns
// --------------------------------------------------------------------------------------

#[test]
fn spread_fans_evenly_across_the_angle() {
    let dirs = directions(
        AttackPattern::Spread {
            angle_total: 90.0,
            count: 8,
        },
        Vec2::X,
    );

    assert_eq!(dirs.len(), 8);
    assert_vec_eq(dirs[0], Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2));
    assert_vec_eq(dirs[7], Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2));
    for pair in dirs.windows(2) {
        let step = pair[0].angle_to(pair[1]).to_degrees();
        assert!((step - 90.0 / 7.0).abs() < 1e-3, "step {step}");
    }
    for d in &dirs {
        assert!((d.length() - 1.0).abs() < 1e-5);
    }
}

#[test]
fn spread_is_centred_on_the_base_direction() {
    let dirs = directions(
        AttackPattern::Spread {
            angle_total: 60.0,
            count: 3,
        },
        Vec2::new(0.0, -4.0),
    );
    assert_vec_eq(dirs[1], Vec2::NEG_Y);
}

#[test]
fn circular_ignores_the_base_direction() {
    for base in [Vec2::X, Vec2::new(-3.0, 7.0), Vec2::ZERO] {
        let dirs = directions(AttackPattern::Circular { count: 4 }, base);
        assert_eq!(dirs.len(), 4);
        assert_vec_eq(dirs[0], Vec2::X);
        assert_vec_eq(dirs[1], Vec2::Y);
        assert_vec_eq(dirs[2], Vec2::NEG_X);
        assert_vec_eq(dirs[3], Vec2::NEG_Y);
    }
}

#[test]
fn degenerate_patterns() {
    let single_spread = directions(
        AttackPattern::Spread {
            angle_total: 90.0,
            count: 1,
        },
        Vec2::Y,
    );
    assert_eq!(single_spread, vec![Vec2::Y]);
    assert!(directions(AttackPattern::Circular { count: 0 }, Vec2::X).is_empty());
    assert_eq!(directions(AttackPattern::Single, Vec2::ZERO), vec![Vec2::X]);
    assert_eq!(directions(AttackPattern::None, Vec2::new(0.0, 2.0)), vec![Vec2::Y]);
}

// --------------------------------------------------------------------------------------
// Weapon
// --------------------------------------------------------------------------------------

impl ProjectileSink for Vec<Shot> {
    fn fire(&mut self, shot: Shot) -> Result<(), PoolError> {
        self.push(shot);
        Ok(())
    }
}

/// Sink with no pools at all.
struct NoPools;

impl ProjectileSink for NoPools {
    fn fire(&mut self, shot: Shot) -> Result<(), PoolError> {
        Err(PoolError::UnknownKey(shot.key))
    }
}

fn keys() -> ProjectileKeys {
    let mut keys = ProjectileKeys::new(PoolKey::from("Basic"));
    keys.insert(ProjectileType::Basic, PoolKey::from("Basic"));
    keys.insert(ProjectileType::Elite, PoolKey::from("Elite"));
    keys
}

fn weapon(fire_rate: f32) -> Weapon {
    Weapon::new(
        WeaponConfig {
            fire_rate,
            muzzle_offset: 0.0,
            ..default()
        },
        Faction::Hostile,
        ProjectileType::Basic,
    )
}

#[test]
fn fire_rate_gates_and_every_call_restarts_the_cooldown() {
    let mut w = weapon(2.0);
    let mut shots = Vec::new();

    assert_eq!(w.shoot(0.0, Vec2::ZERO, Vec2::X, &keys(), &mut shots), ShootOutcome::Fired { count: 1 });
    assert_eq!(w.next_fire_time(), 0.5);

    assert_eq!(w.shoot(0.25, Vec2::ZERO, Vec2::X, &keys(), &mut shots), ShootOutcome::OnCooldown);
    assert_eq!(w.next_fire_time(), 0.75, "a suppressed call still pushes the cooldown");

    assert_eq!(w.shoot(0.5, Vec2::ZERO, Vec2::X, &keys(), &mut shots), ShootOutcome::OnCooldown);
    assert_eq!(w.shoot(1.0, Vec2::ZERO, Vec2::X, &keys(), &mut shots), ShootOutcome::Fired { count: 1 });
    assert_eq!(shots.len(), 2);
}

#[test]
fn ungated_weapon_always_fires() {
    let mut w = weapon(1.0);
    w.config.use_fire_rate = false;
    let mut shots = Vec::new();
    for _ in 0..3 {
        w.shoot(0.0, Vec2::ZERO, Vec2::X, &keys(), &mut shots);
    }
    assert_eq!(shots.len(), 3);
    assert_eq!(w.next_fire_time(), 0.0);
}

#[test]
fn unpatterned_shot_uses_default_or_custom_speed() {
    let mut w = weapon(1.0);
    w.config.use_fire_rate = false;
    let mut shots = Vec::new();

    w.shoot(0.0, Vec2::new(1.0, 1.0), Vec2::new(0.0, 3.0), &keys(), &mut shots);
    w.shoot_at_speed(0.0, Vec2::ZERO, Vec2::X, 4.0, &keys(), &mut shots);

    assert_eq!(shots[0].velocity, Vec2::new(0.0, 10.0));
    assert_eq!(shots[0].origin, Vec2::new(1.0, 1.0));
    assert_eq!(shots[0].faction, Faction::Hostile);
    assert_eq!(shots[1].velocity, Vec2::new(4.0, 0.0));
}

#[test]
fn pattern_volley_uses_pattern_speed_and_current_type() {
    let mut w = weapon(1.0).with_pattern(PatternDescriptor::new(AttackPattern::Circular { count: 4 }, 6.0));
    w.set_projectile_type(ProjectileType::Elite);
    let mut shots = Vec::new();

    let outcome = w.shoot_at_speed(0.0, Vec2::ZERO, Vec2::Y, 99.0, &keys(), &mut shots);

    assert_eq!(outcome, ShootOutcome::Fired { count: 4 });
    assert!(shots.iter().all(|s| s.key == PoolKey::from("Elite")));
    assert_vec_eq(shots[0].velocity, Vec2::new(6.0, 0.0));
}

#[test]
fn none_pattern_fires_a_single_shot() {
    let mut w = weapon(1.0).with_pattern(PatternDescriptor::new(AttackPattern::None, 1.0));
    let mut shots = Vec::new();
    w.shoot(0.0, Vec2::ZERO, Vec2::X, &keys(), &mut shots);
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0].velocity, Vec2::new(10.0, 0.0));
}

#[test]
fn setting_an_empty_pattern_keeps_the_previous_one() {
    let spread = PatternDescriptor::new(
        AttackPattern::Spread {
            angle_total: 90.0,
            count: 8,
        },
        10.0,
    );
    let mut w = weapon(1.0).with_pattern(spread);
    assert!(!w.set_pattern(None));
    assert_eq!(w.pattern(), Some(&spread));
}

#[test]
fn unmapped_type_falls_back_to_default_key() {
    let keys = keys();
    assert_eq!(keys.key_for(ProjectileType::ShotgunCandy), &PoolKey::from("Basic"));
}

#[test]
fn suppressed_volley_respects_the_cooldown_flag() {
    let mut w = weapon(1.0);
    assert!(matches!(
        w.shoot(2.0, Vec2::ZERO, Vec2::X, &keys(), &mut NoPools),
        ShootOutcome::Suppressed(PoolError::UnknownKey(_))
    ));
    assert_eq!(w.next_fire_time(), 3.0);

    let mut w = weapon(1.0);
    w.config.advance_cooldown_on_suppressed_shot = false;
    w.shoot(2.0, Vec2::ZERO, Vec2::X, &keys(), &mut NoPools);
    assert_eq!(w.next_fire_time(), 0.0);
}

// --------------------------------------------------------------------------------------
// ECS: allocator, lifetime, collisions
// --------------------------------------------------------------------------------------

fn projectile_world() -> World {
    let mut world = World::new();
    world.insert_resource(fixed_time(1.0, 0.25));
    world.init_resource::<Blueprints>();
    world.init_resource::<ActorPools>();
    world.init_resource::<Messages<SpawnProjectileRequest>>();
    world.init_resource::<Messages<CollisionStart>>();
    world.init_resource::<Messages<DamageRequest>>();
    crate::plugins::pooling::register_poolable::<Projectile>(&mut world);

    let spec = ProjectileSpec {
        damage: 12.0,
        lifetime: 0.5,
        pool_size: 2,
        ..ProjectileSpec::for_type(ProjectileType::Basic)
    };
    world
        .resource_mut::<Blueprints>()
        .insert(spec.key.clone(), projectile_blueprint(&spec));
    run_system_once(&mut world, prewarm_pools);
    world
}

fn fire_one(world: &mut World, faction: Faction, owner: Option<Entity>) -> Entity {
    let key = PoolKey::from("Basic");
    let before: Vec<Entity> = world.resource::<ActorPools>().active_handles(&key).collect();

    world.write_message(SpawnProjectileRequest {
        key: key.clone(),
        origin: Vec2::new(2.0, 3.0),
        velocity: Vec2::new(0.0, -8.0),
        faction,
        owner,
    });
    run_system_once(world, allocate_projectiles);
    world.resource_mut::<Messages<SpawnProjectileRequest>>().clear();

    world
        .resource::<ActorPools>()
        .active_handles(&key)
        .find(|e| !before.contains(e))
        .expect("one new projectile is active")
}

#[test]
fn allocator_launches_with_faction_layers() {
    let mut world = projectile_world();
    let boss = world.spawn(Name::new("Boss")).id();

    let e = fire_one(&mut world, Faction::Hostile, Some(boss));

    assert_eq!(world.get::<PoolSlot>(e), Some(&PoolSlot::Active));
    assert_eq!(world.get::<Transform>(e).unwrap().translation.truncate(), Vec2::new(2.0, 3.0));
    assert_eq!(world.get::<LinearVelocity>(e).unwrap().0, Vec2::new(0.0, -8.0));

    let projectile = world.get::<Projectile>(e).unwrap();
    assert_eq!(projectile.faction, Faction::Hostile);
    assert_eq!(projectile.owner, Some(boss));
    assert_eq!(projectile.remaining, 0.5);

    let layers = world.get::<CollisionLayers>(e).unwrap();
    assert!(layers.memberships.has_all(Layer::EnemyBullet));
    assert!(layers.filters.has_all(Layer::Player));
    assert!(!layers.filters.has_all(Layer::Enemy));
}

#[test]
fn unknown_key_request_is_dropped() {
    let mut world = projectile_world();
    world.write_message(SpawnProjectileRequest {
        key: PoolKey::from("Laser"),
        origin: Vec2::ZERO,
        velocity: Vec2::X,
        faction: Faction::Player,
        owner: None,
    });
    run_system_once(&mut world, allocate_projectiles);
    assert_eq!(world.resource::<ActorPools>().total_active_count(), 0);
}

#[test]
fn lifetime_expiry_marks_return() {
    let mut world = projectile_world();
    let e = fire_one(&mut world, Faction::Player, None);

    run_system_once(&mut world, expire_projectiles);
    assert_eq!(world.get::<PoolSlot>(e), Some(&PoolSlot::Active));
    run_system_once(&mut world, expire_projectiles);
    assert_eq!(world.get::<PoolSlot>(e), Some(&PoolSlot::PendingReturn));
}

fn collide(world: &mut World, a: Entity, b: Entity) {
    world.write_message(CollisionStart {
        collider1: a,
        collider2: b,
        body1: Some(a),
        body2: Some(b),
    });
}

#[test]
fn hostile_projectile_damages_player_once_and_returns() {
    let mut world = projectile_world();
    let player = world
        .spawn(CollisionLayers::new(Layer::Player, [Layer::EnemyBullet]))
        .id();
    let e = fire_one(&mut world, Faction::Hostile, None);

    // Same contact reported twice in one tick.
    collide(&mut world, e, player);
    collide(&mut world, player, e);
    run_system_once(&mut world, resolve_projectile_collisions);

    let hits = drain_messages::<DamageRequest>(&mut world);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].target, player);
    assert_eq!(hits[0].amount, 12.0);
    assert_eq!(hits[0].origin, Vec2::new(2.0, 3.0));
    assert_eq!(world.get::<PoolSlot>(e), Some(&PoolSlot::PendingReturn));
    assert!(world.get::<Projectile>(e).unwrap().already_hit);
}

#[test]
fn friendly_contact_is_ignored() {
    let mut world = projectile_world();
    let other_enemy = world.spawn(CollisionLayers::new(Layer::Enemy, [Layer::Player])).id();
    let e = fire_one(&mut world, Faction::Hostile, None);

    collide(&mut world, e, other_enemy);
    run_system_once(&mut world, resolve_projectile_collisions);

    assert!(drain_messages::<DamageRequest>(&mut world).is_empty());
    assert_eq!(world.get::<PoolSlot>(e), Some(&PoolSlot::Active));
}

#[test]
fn world_contact_returns_without_damage() {
    let mut world = projectile_world();
    let wall = world.spawn(CollisionLayers::new(Layer::World, [Layer::PlayerBullet])).id();
    let e = fire_one(&mut world, Faction::Player, None);

    collide(&mut world, wall, e);
    run_system_once(&mut world, resolve_projectile_collisions);

    assert!(drain_messages::<DamageRequest>(&mut world).is_empty());
    assert_eq!(world.get::<PoolSlot>(e), Some(&PoolSlot::PendingReturn));
}

#[test]
fn projectile_vs_projectile_is_ignored() {
    let mut world = projectile_world();
    let a = fire_one(&mut world, Faction::Player, None);
    let b = fire_one(&mut world, Faction::Hostile, None);

    collide(&mut world, a, b);
    run_system_once(&mut world, resolve_projectile_collisions);

    assert_eq!(world.get::<PoolSlot>(a), Some(&PoolSlot::Active));
    assert_eq!(world.get::<PoolSlot>(b), Some(&PoolSlot::Active));
}
