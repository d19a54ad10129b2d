mod common;

use bevy::prelude::*;
use boss_arena::plugins::boss::{Boss, BossBrain};
use boss_arena::plugins::combat::DamageRequest;
use boss_arena::plugins::projectiles::{ProjectileType, Weapon};
use boss_arena::plugins::spawning::Spawners;

fn hit(app: &mut App, target: Entity, amount: f32) {
    app.world_mut().write_message(DamageRequest {
        target,
        amount,
        origin: Vec2::ZERO,
    });
    common::tick(app, 2);
}

fn enemy_table(app: &App) -> Option<String> {
    app.world()
        .resource::<Spawners>()
        .enemies
        .table()
        .map(|t| t.name.clone())
}

#[test]
fn damage_escalates_phases_then_defeats_the_boss() {
    let mut app = common::app_in_game();
    let boss = common::single::<With<Boss>>(&mut app);

    // 300 max: 160 damage leaves 46%, inside Phase2.
    hit(&mut app, boss, 160.0);
    assert_eq!(app.world().get::<BossBrain>(boss).map(|b| b.phases.index()), Some(1));
    assert_eq!(
        app.world().get::<Weapon>(boss).map(|w| w.projectile_type()),
        Some(ProjectileType::ShotgunChoco)
    );
    assert_eq!(enemy_table(&app).as_deref(), Some("Phase2"));

    // 50 more leaves 30%: still Phase2.
    hit(&mut app, boss, 50.0);
    assert_eq!(app.world().get::<BossBrain>(boss).map(|b| b.phases.index()), Some(1));

    hit(&mut app, boss, 40.0);
    assert_eq!(app.world().get::<BossBrain>(boss).map(|b| b.phases.index()), Some(2));
    assert_eq!(enemy_table(&app).as_deref(), Some("Phase3"));

    hit(&mut app, boss, 100.0);
    assert!(app.world().get::<BossBrain>(boss).is_some_and(|b| b.is_defeated()));
    assert!(!app.world().resource::<Spawners>().enemies.is_enabled());

    // Removed after the despawn delay.
    common::tick(&mut app, 80);
    assert!(app.world().get_entity(boss).is_err());
}
