//! Boss movement: patrol a horizontal leg until the player is detected, then close in and strafe.

use bevy::prelude::*;

use crate::plugins::core::config::BossConfig;

/// Strafing updates facing only while this vertically aligned with the target.
pub const FACING_ALIGNMENT: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossStep {
    pub velocity: Vec2,
    /// `Some` when the facing flipped this step.
    pub face_right: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct BossMotion {
    start: Vec2,
    patrol_distance: f32,
    patrol_speed: f32,
    move_speed: f32,
    detection_range: f32,
    min_distance: f32,
    facing_right: bool,
}

impl BossMotion {
    pub fn new(config: &BossConfig) -> Self {
        Self {
            start: config.spawn,
            patrol_distance: config.patrol_distance,
            patrol_speed: config.patrol_speed,
            move_speed: config.move_speed,
            detection_range: config.detection_range,
            min_distance: config.min_distance,
            facing_right: true,
        }
    }

    #[inline]
    pub fn facing_right(&self) -> bool {
        self.facing_right
    }

    #[inline]
    pub fn detects(&self, position: Vec2, target: Vec2) -> bool {
        position.distance(target) <= self.detection_range
    }

    pub fn step(&mut self, position: Vec2, target: Vec2) -> BossStep {
        if !self.detects(position, target) {
            return self.patrol(position);
        }

        let to_target = target - position;
        let dir = to_target.normalize_or_zero();
        if to_target.length() > self.min_distance {
            return BossStep {
                velocity: dir * self.move_speed,
                face_right: self.face(dir),
            };
        }

        let strafe = Vec2::new(-dir.y, dir.x);
        let aligned = to_target.y.abs() < FACING_ALIGNMENT;
        BossStep {
            velocity: strafe * self.move_speed,
            face_right: if aligned { self.face(dir) } else { None },
        }
    }

    fn patrol(&mut self, position: Vec2) -> BossStep {
        let sign = if self.facing_right { 1.0 } else { -1.0 };
        let velocity = Vec2::new(sign * self.patrol_speed, 0.0);

        let turn = if self.facing_right {
            position.x >= self.start.x + self.patrol_distance
        } else {
            position.x <= self.start.x
        };
        let face_right = if turn {
            self.facing_right = !self.facing_right;
            Some(self.facing_right)
        } else {
            None
        };
        BossStep {
            velocity,
            face_right,
        }
    }

    fn face(&mut self, dir: Vec2) -> Option<bool> {
        let right = dir.x > 0.0;
        if right != self.facing_right {
            self.facing_right = right;
            return Some(right);
        }
        None
    }
}
