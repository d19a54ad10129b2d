use avian2d::prelude::*;
use bevy::ecs::message::Messages;
use bevy::prelude::*;

use super::*;
use crate::common::test_utils::{drain_messages, fixed_time, run_system_once};
use crate::plugins::pooling::PoolKey;

fn player_world() -> (World, Entity) {
    let config = CombatConfig::default();
    let mut world = World::new();
    world.insert_resource(fixed_time(1.0, 0.5));
    world.init_resource::<PlayerInput>();

    let mut pools = ActorPools::default();
    pools.register(PoolKey::from("Basic"));
    world.insert_resource(pools);
    world.insert_resource(ProjectileKeys::new(PoolKey::from("Basic")));
    world.insert_resource(config);
    world.init_resource::<Messages<SpawnProjectileRequest>>();
    world.init_resource::<Messages<DamageRequest>>();
    world.init_resource::<Messages<HealthChanged>>();
    world.init_resource::<Messages<GameSignal>>();

    run_system_once(&mut world, spawn);
    let player = world
        .query_filtered::<Entity, With<Player>>()
        .single(&world)
        .expect("one player");
    (world, player)
}

fn spawn_target(world: &mut World, at: Vec2, layers: CollisionLayers) -> Entity {
    world
        .spawn((
            HealthResource::new(30.0),
            Transform::from_translation(at.extend(1.0)),
            layers,
        ))
        .id()
}

fn enemy_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Enemy, [Layer::Player, Layer::PlayerBullet])
}

// --------------------------------------------------------------------------------------
// Energy
// --------------------------------------------------------------------------------------

#[test]
fn energy_is_bounded() {
    let mut energy = Energy::new(100.0);
    assert!(energy.spend(60.0));
    assert!(!energy.spend(60.0), "cannot overspend");
    assert_eq!(energy.current(), 40.0);

    energy.add(500.0);
    assert_eq!(energy.current(), 100.0);
}

#[test]
fn regeneration_only_while_idle() {
    let mut energy = Energy::new(100.0);
    energy.spend(50.0);

    assert_eq!(energy.regenerate(2.0, 3.0, 10.0, true), 0.0);
    assert_eq!(energy.regenerate(1.0, 3.0, 10.0, true), 10.0);
    assert_eq!(energy.regenerate(3.0, 3.0, 10.0, false), 0.0, "moving skips the tick");
    assert_eq!(energy.current(), 60.0);
}

#[test]
fn special_charge_is_spent_before_energy() {
    let mut energy = Energy::new(100.0);
    energy.spend(100.0);
    assert!(!energy.try_special(50.0));

    energy.grant_special();
    assert!(energy.try_special(50.0));
    assert_eq!(energy.special_charges(), 0);
    assert_eq!(energy.current(), 0.0);
}

// --------------------------------------------------------------------------------------
// Systems
// --------------------------------------------------------------------------------------

#[test]
fn spawn_creates_a_full_player() {
    let (world, player) = player_world();
    assert_eq!(world.get::<HealthResource>(player).map(|h| h.current()), Some(100.0));
    assert_eq!(world.get::<Energy>(player).map(|e| e.current()), Some(100.0));
    assert_eq!(world.get::<Weapon>(player).map(|w| w.faction), Some(Faction::Player));
}

#[test]
fn movement_sets_velocity_and_facing() {
    let (mut world, player) = player_world();
    world.resource_mut::<PlayerInput>().move_axis = Vec2::new(-1.0, 0.0);

    run_system_once(&mut world, apply_movement);

    assert_eq!(world.get::<LinearVelocity>(player).map(|v| v.0), Some(Vec2::new(-5.0, 0.0)));
    let controller = world.get::<PlayerController>(player).copied().expect("controller");
    assert!(controller.moving);
    assert!(!controller.facing_right);
    assert_eq!(world.get::<Sprite>(player).map(|s| s.flip_x), Some(true));
}

#[test]
fn held_trigger_fires_at_the_weapon_rate() {
    let (mut world, player) = player_world();
    world.resource_mut::<PlayerInput>().fire = true;

    run_system_once(&mut world, fire_weapon);
    run_system_once(&mut world, fire_weapon);

    let shots = drain_messages::<SpawnProjectileRequest>(&mut world);
    assert_eq!(shots.len(), 1, "second call is on cooldown");
    assert_eq!(shots[0].faction, Faction::Player);
    assert_eq!(shots[0].owner, Some(player));
    assert!(shots[0].velocity.x > 0.0);

    world.insert_resource(fixed_time(1.5, 0.5));
    run_system_once(&mut world, fire_weapon);
    assert_eq!(drain_messages::<SpawnProjectileRequest>(&mut world).len(), 1);
}

#[test]
fn special_attack_hits_living_enemies_in_radius() {
    let (mut world, _) = player_world();
    let near = spawn_target(&mut world, Vec2::new(1.0, 0.0), enemy_layers());
    spawn_target(&mut world, Vec2::new(10.0, 0.0), enemy_layers());
    spawn_target(
        &mut world,
        Vec2::new(0.5, 0.0),
        CollisionLayers::new(Layer::Enemy, LayerMask::NONE),
    );
    world.resource_mut::<PlayerInput>().special = true;

    run_system_once(&mut world, special_attack);

    let hits = drain_messages::<DamageRequest>(&mut world);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].target, near);
    assert_eq!(hits[0].amount, 30.0);
    assert_eq!(
        drain_messages::<GameSignal>(&mut world),
        vec![GameSignal::PlayerSpecialAttack { hits: 1 }]
    );
    assert!(!world.resource::<PlayerInput>().special, "request consumed");
}

#[test]
fn special_attack_needs_energy() {
    let (mut world, player) = player_world();
    if let Some(mut energy) = world.get_mut::<Energy>(player) {
        energy.spend(80.0);
    }
    spawn_target(&mut world, Vec2::new(1.0, 0.0), enemy_layers());
    world.resource_mut::<PlayerInput>().special = true;

    run_system_once(&mut world, special_attack);

    assert!(drain_messages::<DamageRequest>(&mut world).is_empty());
    assert!(drain_messages::<GameSignal>(&mut world).is_empty());
}

#[test]
fn damage_is_reported_and_death_announced_once() {
    let (mut world, player) = player_world();
    world.write_message(HealthChanged {
        entity: player,
        change: HealthChange::Damaged { current: 85.0 },
        amount: 15.0,
        origin: Vec2::ZERO,
    });
    for _ in 0..2 {
        world.write_message(HealthChanged {
            entity: player,
            change: HealthChange::Died,
            amount: 100.0,
            origin: Vec2::ZERO,
        });
    }

    run_system_once(&mut world, react_to_player_damage);

    assert_eq!(
        drain_messages::<GameSignal>(&mut world),
        vec![
            GameSignal::PlayerTookDamage {
                amount: 15.0,
                remaining: 85.0
            },
            GameSignal::PlayerDied,
        ]
    );
    assert_eq!(world.get::<CollisionLayers>(player).map(|l| l.filters), Some(LayerMask::NONE));

    world.resource_mut::<PlayerInput>().move_axis = Vec2::X;
    run_system_once(&mut world, apply_movement);
    assert_eq!(world.get::<LinearVelocity>(player).map(|v| v.0), Some(Vec2::ZERO));
}

#[test]
fn regeneration_system_waits_for_the_interval() {
    let (mut world, player) = player_world();
    if let Some(mut energy) = world.get_mut::<Energy>(player) {
        energy.spend(50.0);
    }

    for _ in 0..5 {
        run_system_once(&mut world, regenerate_energy);
    }
    assert_eq!(world.get::<Energy>(player).map(|e| e.current()), Some(50.0));

    run_system_once(&mut world, regenerate_energy);
    assert_eq!(world.get::<Energy>(player).map(|e| e.current()), Some(60.0));
}
