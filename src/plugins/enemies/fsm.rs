//! Base enemy state machine.
//!
//! Pure logic over a [`Perception`] snapshot. The machine never touches the ECS: it returns an
//! [`Intent`] (desired velocity, facing, melee strike, shot) and the systems apply it.
//!
//! Transition priority, evaluated every tick:
//!
//! ```text
//!   Dead (sticky) > Attack (in attack range) > Chase (in detection range)
//!                 > Patrol → Idle (leg finished) > Idle → Patrol (dwell finished)
//! ```
//!
//! Attack and Chase require the target to be alive. Once entered, Chase holds until the target
//! comes into attack range or dies. Straying past `max_distance` from the target kills the enemy
//! before any of the above is considered.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::archetype::Archetype;
use crate::common::signals::DeathCause;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnemyState {
    #[default]
    Idle,
    Patrol,
    Chase,
    Attack,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    /// Dwell time in Idle before patrolling again.
    pub idle_time: f32,
    pub max_distance: f32,
    pub knockback_duration: f32,
    pub knockback_force: f32,
    /// Damage dealt by one melee strike.
    pub strike_damage: f32,
    /// Offset from the spawn position to the far end of the patrol leg.
    pub patrol_leg: Vec2,
    pub patrol_arrival: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            patrol_speed: 2.0,
            chase_speed: 3.0,
            detection_range: 7.0,
            attack_range: 1.2,
            idle_time: 2.0,
            max_distance: 40.0,
            knockback_duration: 0.2,
            knockback_force: 6.0,
            strike_damage: 10.0,
            patrol_leg: Vec2::new(5.0, 0.0),
            patrol_arrival: 0.2,
        }
    }
}

/// What the enemy knows this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    pub position: Vec2,
    /// Target position. `None` when there is no target at all; the machine then holds still.
    pub target: Option<Vec2>,
    pub dt: f32,
    pub now: f32,
}

/// Everything the machine asks of the world for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Intent {
    /// `None` leaves the current velocity alone.
    pub velocity: Option<Vec2>,
    pub face_right: Option<bool>,
    /// Melee damage to deal to the target.
    pub strike: Option<f32>,
    /// Fire the weapon in this direction.
    pub fire: Option<Vec2>,
}

impl Intent {
    pub fn moving(velocity: Vec2) -> Self {
        Self {
            velocity: Some(velocity),
            ..default()
        }
    }

    pub fn stop() -> Self {
        Self::moving(Vec2::ZERO)
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: Intent) -> Intent {
        Intent {
            velocity: other.velocity.or(self.velocity),
            face_right: other.face_right.or(self.face_right),
            strike: other.strike.or(self.strike),
            fire: other.fire.or(self.fire),
        }
    }
}

/// Result of one [`EnemyFsm::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    pub intent: Intent,
    pub transition: Option<(EnemyState, EnemyState)>,
    pub died: Option<DeathCause>,
}

#[derive(Debug, Clone)]
pub struct EnemyFsm {
    pub tuning: EnemyTuning,
    state: EnemyState,
    prev_state: EnemyState,
    patrol_a: Vec2,
    patrol_b: Vec2,
    patrol_target: Vec2,
    /// Patrol points are anchored on the first tick after a reset, once the actor is placed.
    anchored: bool,
    idle_timer: f32,
    finished_patrol: bool,
    finished_idle: bool,
    knockback_timer: f32,
    target_dead: bool,
    facing_right: bool,
}

impl EnemyFsm {
    pub fn new(tuning: EnemyTuning) -> Self {
        let mut fsm = Self {
            tuning,
            state: EnemyState::Patrol,
            prev_state: EnemyState::Idle,
            patrol_a: Vec2::ZERO,
            patrol_b: Vec2::ZERO,
            patrol_target: Vec2::ZERO,
            anchored: false,
            idle_timer: 0.0,
            finished_patrol: false,
            finished_idle: false,
            knockback_timer: 0.0,
            target_dead: false,
            facing_right: true,
        };
        fsm.reset();
        fsm
    }

    #[inline]
    pub fn state(&self) -> EnemyState {
        self.state
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.state == EnemyState::Dead
    }

    #[inline]
    pub fn in_knockback(&self) -> bool {
        self.knockback_timer > 0.0
    }

    #[inline]
    pub fn facing_right(&self) -> bool {
        self.facing_right
    }

    #[inline]
    pub fn patrol_target(&self) -> Vec2 {
        self.patrol_target
    }

    /// Back to the spawn condition: Patrol, with the previous state Idle.
    pub fn reset(&mut self) {
        self.state = EnemyState::Patrol;
        self.prev_state = EnemyState::Idle;
        self.idle_timer = 0.0;
        self.finished_patrol = false;
        self.finished_idle = false;
        self.knockback_timer = 0.0;
        self.target_dead = false;
        self.facing_right = true;
        self.anchored = false;
    }

    fn anchor_patrol(&mut self, position: Vec2) {
        self.patrol_a = position;
        self.patrol_b = position + self.tuning.patrol_leg;
        self.patrol_target = self.patrol_b;
        self.finished_patrol = false;
        self.anchored = true;
    }

    fn toggle_patrol_target(&mut self) {
        self.patrol_target = if self.patrol_target == self.patrol_a {
            self.patrol_b
        } else {
            self.patrol_a
        };
    }

    /// Force the terminal state. Returns `false` if already dead.
    pub fn die(&mut self, archetype: &mut Archetype) -> bool {
        if self.is_dead() {
            return false;
        }
        let from = self.state;
        self.state = EnemyState::Dead;
        self.prev_state = EnemyState::Dead;
        self.knockback_timer = 0.0;
        archetype.on_state_change(from, EnemyState::Dead);
        true
    }

    /// The target died: stop pursuing and go back to patrolling from where we stand.
    pub fn on_target_died(&mut self) {
        self.target_dead = true;
        if self.is_dead() {
            return;
        }
        self.state = EnemyState::Patrol;
        self.prev_state = EnemyState::Idle;
        self.idle_timer = 0.0;
        self.anchored = false;
    }

    /// Bumped into an obstacle: a patrolling enemy turns around.
    pub fn on_obstacle_contact(&mut self) {
        if self.state == EnemyState::Patrol {
            self.toggle_patrol_target();
        }
    }

    pub fn start_knockback(&mut self) {
        if !self.is_dead() {
            self.knockback_timer = self.tuning.knockback_duration;
        }
    }

    pub fn tick(&mut self, p: &Perception, archetype: &mut Archetype) -> TickReport {
        let mut report = TickReport::default();
        if self.is_dead() {
            return report;
        }
        let Some(target) = p.target else {
            return report;
        };
        if !self.anchored {
            self.anchor_patrol(p.position);
        }

        let distance = p.position.distance(target);
        if distance > self.tuning.max_distance {
            let from = self.state;
            self.die(archetype);
            report.transition = Some((from, EnemyState::Dead));
            report.died = Some(DeathCause::TooFar);
            report.intent = Intent::stop();
            return report;
        }

        self.update_state(distance);

        let knocked = self.in_knockback();
        if self.state != self.prev_state {
            let (from, to) = (self.prev_state, self.state);
            report.intent = self.on_state_change(from, to, knocked);
            archetype.on_state_change(from, to);
            self.prev_state = to;
            report.transition = Some((from, to));
        }

        // Knockback suspends behaviour, not evaluation.
        if knocked {
            self.knockback_timer -= p.dt;
            if !self.in_knockback() {
                report.intent = report.intent.merge(Intent::stop());
            }
            return report;
        }

        let acted = self.act(p, target, archetype);
        report.intent = report.intent.merge(acted);
        report
    }

    fn update_state(&mut self, distance: f32) {
        let alive = !self.target_dead;
        if alive && distance <= self.tuning.attack_range {
            self.state = EnemyState::Attack;
        } else if alive && distance <= self.tuning.detection_range {
            self.state = EnemyState::Chase;
        } else if self.state == EnemyState::Patrol && self.finished_patrol {
            self.state = EnemyState::Idle;
            self.finished_patrol = false;
        } else if self.state == EnemyState::Idle && self.finished_idle {
            self.state = EnemyState::Patrol;
            self.finished_idle = false;
        }
    }

    fn on_state_change(&mut self, from: EnemyState, to: EnemyState, knocked: bool) -> Intent {
        debug!("enemy state {from:?} -> {to:?}");
        match to {
            EnemyState::Idle => {
                self.idle_timer = 0.0;
                Intent::default()
            }
            EnemyState::Patrol => {
                self.toggle_patrol_target();
                Intent::default()
            }
            EnemyState::Attack if !knocked => Intent::stop(),
            _ => Intent::default(),
        }
    }

    fn act(&mut self, p: &Perception, target: Vec2, archetype: &mut Archetype) -> Intent {
        match self.state {
            EnemyState::Idle => {
                self.idle_timer += p.dt;
                if self.idle_timer >= self.tuning.idle_time {
                    self.finished_idle = true;
                }
                Intent::stop()
            }
            EnemyState::Patrol => {
                let dir = (self.patrol_target - p.position).normalize_or_zero();
                let intent = Intent {
                    velocity: Some(dir * self.tuning.patrol_speed),
                    face_right: self.face(dir),
                    ..default()
                };
                if p.position.distance(self.patrol_target) < self.tuning.patrol_arrival {
                    self.finished_patrol = true;
                }
                intent
            }
            EnemyState::Chase => {
                let dir = (target - p.position).normalize_or_zero();
                Intent {
                    velocity: Some(dir * self.tuning.chase_speed),
                    face_right: self.face(dir),
                    ..default()
                }
            }
            EnemyState::Attack => {
                let intent = archetype.attack(&self.tuning, p, target);
                self.face(target - p.position);
                Intent {
                    face_right: Some(self.facing_right),
                    ..intent
                }
            }
            EnemyState::Dead => Intent::default(),
        }
    }

    /// Update facing from a movement direction. Returns the new facing when it flipped.
    fn face(&mut self, dir: Vec2) -> Option<bool> {
        let right = dir.x > 0.0;
        if right != self.facing_right {
            self.facing_right = right;
            return Some(right);
        }
        None
    }
}
