use avian2d::prelude::*;
use bevy::ecs::message::Messages;
use bevy::prelude::*;

use super::motion::BossMotion;
use super::phases::{BossPhase, PhaseController, PhaseTransition};
use super::*;
use crate::common::test_utils::{drain_messages, fixed_time, run_system_once};
use crate::plugins::pooling::PoolKey;
use crate::plugins::projectiles::patterns::AttackPattern;
use crate::plugins::projectiles::ProjectileType;

fn phase(name: &str, threshold: f32) -> BossPhase {
    BossPhase {
        name: name.into(),
        threshold,
        ..default()
    }
}

fn three_phases() -> PhaseController {
    PhaseController::new(vec![phase("P1", 100.0), phase("P2", 50.0), phase("P3", 20.0)])
}

fn step(from: usize, to: usize) -> PhaseTransition {
    PhaseTransition { from, to }
}

// --------------------------------------------------------------------------------------
// Phase controller
// --------------------------------------------------------------------------------------

#[test]
fn phases_advance_as_health_drops() {
    let mut controller = three_phases();

    assert!(controller.evaluate(100.0).is_empty());
    assert!(controller.evaluate(60.0).is_empty());
    assert_eq!(controller.index(), 0);
    assert_eq!(controller.evaluate(45.0), vec![step(0, 1)]);
    assert_eq!(controller.index(), 1);
    assert_eq!(controller.evaluate(10.0), vec![step(1, 2)]);
    assert_eq!(controller.index(), 2);
    assert!(controller.is_final());
    assert!(controller.evaluate(0.0).is_empty());
}

#[test]
fn one_big_hit_crosses_every_threshold_in_order() {
    let mut controller = three_phases();
    assert!(controller.evaluate(60.0).is_empty());
    assert_eq!(controller.evaluate(10.0), vec![step(0, 1), step(1, 2)]);
    assert_eq!(controller.current().map(|p| p.name.as_str()), Some("P3"));
}

#[test]
fn reaching_a_threshold_exactly_enters_it() {
    let mut controller = three_phases();
    assert_eq!(controller.evaluate(50.0), vec![step(0, 1)]);
}

#[test]
fn phase_index_never_decreases() {
    let mut controller = three_phases();
    controller.evaluate(30.0);
    assert!(controller.evaluate(90.0).is_empty());
    assert_eq!(controller.index(), 1);
}

#[test]
fn phases_are_sorted_on_construction() {
    let controller = PhaseController::new(vec![phase("P3", 20.0), phase("P1", 100.0), phase("P2", 50.0)]);
    let names: Vec<_> = controller.phases().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["P1", "P2", "P3"]);
}

#[test]
fn empty_phase_table_never_transitions() {
    let mut controller = PhaseController::new(Vec::new());
    assert!(controller.current().is_none());
    assert!(controller.evaluate(0.0).is_empty());
}

// --------------------------------------------------------------------------------------
// Motion
// --------------------------------------------------------------------------------------

fn motion() -> BossMotion {
    BossMotion::new(&BossConfig::default())
}

#[test]
fn patrols_between_start_and_leg_end() {
    let mut m = motion();
    let far = Vec2::ZERO;

    let out = m.step(Vec2::new(70.0, 0.0), far);
    assert_eq!(out.velocity, Vec2::new(2.0, 0.0));
    assert_eq!(out.face_right, None);

    let turn = m.step(Vec2::new(75.1, 0.0), far);
    assert_eq!(turn.face_right, Some(false));
    assert_eq!(m.step(Vec2::new(75.0, 0.0), far).velocity, Vec2::new(-2.0, 0.0));

    let back = m.step(Vec2::new(69.9, 0.0), far);
    assert_eq!(back.face_right, Some(true));
}

#[test]
fn approaches_then_strafes() {
    let mut m = motion();

    let approach = m.step(Vec2::new(70.0, 0.0), Vec2::new(60.0, 0.0));
    assert_eq!(approach.velocity, Vec2::new(-3.0, 0.0));
    assert_eq!(approach.face_right, Some(false));

    let strafe = m.step(Vec2::new(70.0, 0.0), Vec2::new(75.0, 0.0));
    assert_eq!(strafe.velocity, Vec2::new(0.0, 3.0));
    assert_eq!(strafe.face_right, Some(true), "aligned strafing turns to face");
}

#[test]
fn strafing_off_axis_keeps_facing() {
    let mut m = motion();
    let out = m.step(Vec2::new(70.0, 0.0), Vec2::new(66.0, 3.0));
    assert!((out.velocity.length() - 3.0).abs() < 1e-5);
    assert_eq!(out.face_right, None);
    assert!(m.facing_right());
}

// --------------------------------------------------------------------------------------
// Systems
// --------------------------------------------------------------------------------------

fn boss_world(player_at: Vec2) -> (World, Entity) {
    let config = CombatConfig::default();
    let mut world = World::new();
    world.insert_resource(fixed_time(1.0, 0.1));

    let mut pools = ActorPools::default();
    for spec in &config.projectiles {
        pools.register(spec.key.clone());
    }
    world.insert_resource(pools);
    world.insert_resource(ProjectileKeys::from_config(&config));
    world.insert_resource(config);
    world.init_resource::<DelayedActions>();
    world.init_resource::<Messages<SpawnProjectileRequest>>();
    world.init_resource::<Messages<GameSignal>>();
    world.init_resource::<Messages<HealthChanged>>();

    world.spawn((Player, Transform::from_translation(player_at.extend(1.0))));
    run_system_once(&mut world, spawn_boss);
    let boss = world
        .query_filtered::<Entity, With<Boss>>()
        .single(&world)
        .expect("one boss");
    (world, boss)
}

fn effect_visibility(world: &mut World, phase_index: usize) -> Option<Visibility> {
    world
        .query::<(&PhasePowerEffect, &Visibility)>()
        .iter(world)
        .find(|(effect, _)| effect.phase_index == phase_index)
        .map(|(_, v)| *v)
}

#[test]
fn spawns_armed_for_the_first_phase() {
    let (mut world, boss) = boss_world(Vec2::ZERO);

    let weapon = world.get::<Weapon>(boss).expect("weapon");
    assert_eq!(weapon.projectile_type(), ProjectileType::Elite);
    assert_eq!(weapon.pattern().map(|p| p.pattern), Some(AttackPattern::Single));
    assert_eq!(effect_visibility(&mut world, 1), Some(Visibility::Hidden));
    assert_eq!(effect_visibility(&mut world, 2), Some(Visibility::Hidden));
}

#[test]
fn attacks_a_detected_player_on_the_phase_interval() {
    let (mut world, boss) = boss_world(Vec2::new(62.0, 0.0));

    run_system_once(&mut world, drive_boss);

    assert_eq!(
        drain_messages::<GameSignal>(&mut world),
        vec![GameSignal::BossAttack {
            phase: "Phase1".into()
        }]
    );
    let shots = drain_messages::<SpawnProjectileRequest>(&mut world);
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0].key, PoolKey::from("Elite"));
    assert_eq!(shots[0].owner, Some(boss));
    assert_eq!(world.get::<BossBrain>(boss).map(|b| b.next_attack()), Some(3.0));

    // Not due again until the interval has passed.
    run_system_once(&mut world, drive_boss);
    assert!(drain_messages::<GameSignal>(&mut world).is_empty());
}

#[test]
fn undetected_player_is_not_attacked() {
    let (mut world, boss) = boss_world(Vec2::ZERO);
    run_system_once(&mut world, drive_boss);

    assert!(drain_messages::<GameSignal>(&mut world).is_empty());
    assert_eq!(world.get::<LinearVelocity>(boss).map(|v| v.0), Some(Vec2::new(2.0, 0.0)));
}

#[test]
fn heavy_damage_walks_through_each_phase() {
    let (mut world, boss) = boss_world(Vec2::ZERO);
    if let Some(mut health) = world.get_mut::<HealthResource>(boss) {
        health.apply_damage(250.0);
    }
    world.write_message(HealthChanged {
        entity: boss,
        change: HealthChange::Damaged { current: 50.0 },
        amount: 250.0,
        origin: Vec2::ZERO,
    });

    run_system_once(&mut world, react_to_boss_health);

    assert_eq!(
        drain_messages::<GameSignal>(&mut world),
        vec![
            GameSignal::BossPhaseChanged {
                phase: "Phase2".into(),
                index: 1
            },
            GameSignal::BossPhaseChanged {
                phase: "Phase3".into(),
                index: 2
            },
        ]
    );
    let weapon = world.get::<Weapon>(boss).expect("weapon");
    assert_eq!(weapon.projectile_type(), ProjectileType::ShotgunCandy);
    assert!(matches!(
        weapon.pattern().map(|p| p.pattern),
        Some(AttackPattern::Spread { count: 8, .. })
    ));
    assert_eq!(effect_visibility(&mut world, 1), Some(Visibility::Hidden));
    assert_eq!(effect_visibility(&mut world, 2), Some(Visibility::Visible));
}

#[test]
fn death_is_announced_once_and_removal_scheduled() {
    let (mut world, boss) = boss_world(Vec2::new(62.0, 0.0));
    for _ in 0..2 {
        world.write_message(HealthChanged {
            entity: boss,
            change: HealthChange::Died,
            amount: 300.0,
            origin: Vec2::ZERO,
        });
    }

    run_system_once(&mut world, react_to_boss_health);

    assert_eq!(drain_messages::<GameSignal>(&mut world), vec![GameSignal::BossDefeated]);
    assert_eq!(world.resource::<DelayedActions>().pending(), 1);
    assert!(world.get::<BossBrain>(boss).is_some_and(|b| b.is_defeated()));
    assert_eq!(world.get::<CollisionLayers>(boss).map(|l| l.filters), Some(LayerMask::NONE));

    run_system_once(&mut world, drive_boss);
    assert!(drain_messages::<GameSignal>(&mut world).is_empty());
}

#[test]
fn player_death_stops_attacks() {
    let (mut world, _) = boss_world(Vec2::new(62.0, 0.0));
    world.write_message(GameSignal::PlayerDied);
    run_system_once(&mut world, react_to_player_death);
    drain_messages::<GameSignal>(&mut world);

    run_system_once(&mut world, drive_boss);

    assert!(drain_messages::<GameSignal>(&mut world).is_empty());
    assert!(drain_messages::<SpawnProjectileRequest>(&mut world).is_empty());
}
