//! Physics plugin: Avian in meters with no gravity (top-down arena).

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::plugins::core::CombatConfig;

pub fn plugin(app: &mut App) {
    let length_unit = app.world().resource::<CombatConfig>().physics.length_unit;
    app.add_plugins(PhysicsPlugins::default().with_length_unit(length_unit));
    app.insert_resource(Gravity(Vec2::ZERO));
}
