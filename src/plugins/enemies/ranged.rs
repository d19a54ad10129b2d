//! Ranged attack: line up vertically with the target, then shoot on an interval.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::fsm::{EnemyState, Intent, Perception};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RangedTuning {
    pub shoot_interval: f32,
    /// Vertical misalignment tolerated before the shooter moves instead of firing.
    pub min_y_gap: f32,
    pub approach_speed: f32,
}

impl Default for RangedTuning {
    fn default() -> Self {
        Self {
            shoot_interval: 2.0,
            min_y_gap: 1.0,
            approach_speed: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RangedAttack {
    pub tuning: RangedTuning,
    next_shot: f32,
}

impl RangedAttack {
    pub fn new(tuning: RangedTuning) -> Self {
        Self {
            tuning,
            next_shot: 0.0,
        }
    }

    #[inline]
    pub fn next_shot(&self) -> f32 {
        self.next_shot
    }

    pub fn reset(&mut self) {
        self.next_shot = 0.0;
    }

    pub fn on_state_change(&mut self, _from: EnemyState, _to: EnemyState) {}

    pub fn attack(&mut self, p: &Perception, target: Vec2) -> Intent {
        let dy = target.y - p.position.y;
        if dy.abs() > self.tuning.min_y_gap {
            // Never overshoot the target's row within one tick.
            let step = if p.dt > 0.0 { dy.abs() / p.dt } else { 0.0 };
            let vy = dy.signum() * self.tuning.approach_speed.min(step);
            return Intent::moving(Vec2::new(0.0, vy));
        }

        let mut intent = Intent::stop();
        if p.now >= self.next_shot {
            intent.fire = Some((target - p.position).normalize_or_zero());
            self.next_shot = p.now + self.tuning.shoot_interval;
        }
        intent
    }
}
