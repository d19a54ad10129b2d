//! Melee dash: charge the target, hold, back off, hold, repeat.
//!
//! ```text
//!   None ──► Forward ──(close enough)──► WaitAtEnd ──► Back ──(near anchor)──► WaitAtStart ──► None
//! ```
//!
//! At most one strike lands per Forward leg, and strikes are further gated by `interval`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::fsm::{EnemyState, EnemyTuning, Intent, Perception};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashTuning {
    /// Minimum time between strikes, and the rest at the start of each cycle.
    pub interval: f32,
    pub move_speed: f32,
    pub wait_at_end: f32,
    /// Distance from the target at which the charge ends.
    pub stop_before_target: f32,
    /// Distance from the retreat anchor at which the retreat ends.
    pub stop_before_start: f32,
    pub retreat_speed: f32,
    pub retreat_buffer: f32,
}

impl Default for DashTuning {
    fn default() -> Self {
        Self {
            interval: 2.0,
            move_speed: 4.0,
            wait_at_end: 0.2,
            stop_before_target: 2.0,
            stop_before_start: 2.5,
            retreat_speed: 1.0,
            retreat_buffer: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashPhase {
    #[default]
    None,
    Forward,
    WaitAtEnd,
    Back,
    WaitAtStart,
}

#[derive(Debug, Clone)]
pub struct DashAttack {
    pub tuning: DashTuning,
    phase: DashPhase,
    start: Vec2,
    anchor: Vec2,
    timer: f32,
    has_dealt: bool,
    last_strike: f32,
}

impl DashAttack {
    pub fn new(tuning: DashTuning) -> Self {
        Self {
            tuning,
            phase: DashPhase::None,
            start: Vec2::ZERO,
            anchor: Vec2::ZERO,
            timer: 0.0,
            has_dealt: false,
            last_strike: f32::NEG_INFINITY,
        }
    }

    #[inline]
    pub fn phase(&self) -> DashPhase {
        self.phase
    }

    #[inline]
    pub fn start(&self) -> Vec2 {
        self.start
    }

    pub fn reset(&mut self) {
        self.phase = DashPhase::None;
        self.timer = 0.0;
        self.has_dealt = false;
        self.last_strike = f32::NEG_INFINITY;
    }

    /// Entering or leaving Attack restarts the cycle.
    pub fn on_state_change(&mut self, from: EnemyState, to: EnemyState) {
        if from == EnemyState::Attack || to == EnemyState::Attack {
            self.reset();
        }
    }

    pub fn attack(&mut self, base: &EnemyTuning, p: &Perception, target: Vec2) -> Intent {
        let t = self.tuning;
        match self.phase {
            DashPhase::None => {
                self.start = p.position;
                self.has_dealt = false;
                self.phase = DashPhase::Forward;
                Intent::default()
            }
            DashPhase::Forward => {
                let dir = (target - p.position).normalize_or_zero();
                let mut intent = Intent::moving(dir * t.move_speed);
                if !self.has_dealt && p.position.distance(target) < t.stop_before_target {
                    if p.now >= self.last_strike + t.interval {
                        self.last_strike = p.now;
                        self.has_dealt = true;
                        intent.strike = Some(base.strike_damage);
                    }
                    self.phase = DashPhase::WaitAtEnd;
                    self.timer = t.wait_at_end;
                    intent.velocity = Some(Vec2::ZERO);
                }
                intent
            }
            DashPhase::WaitAtEnd => {
                self.timer -= p.dt;
                if self.timer <= 0.0 {
                    let away = (p.position - target).normalize_or_zero();
                    let reach = t.stop_before_target + t.stop_before_start + t.retreat_buffer;
                    self.anchor = p.position + away * reach;
                    self.phase = DashPhase::Back;
                }
                Intent::stop()
            }
            DashPhase::Back => {
                if p.position.distance(self.anchor) < t.stop_before_start {
                    self.phase = DashPhase::WaitAtStart;
                    self.timer = t.interval;
                    return Intent::stop();
                }
                let dir = (self.anchor - p.position).normalize_or_zero();
                Intent::moving(dir * t.retreat_speed)
            }
            DashPhase::WaitAtStart => {
                self.timer -= p.dt;
                if self.timer <= 0.0 {
                    self.phase = DashPhase::None;
                }
                Intent::stop()
            }
        }
    }
}
