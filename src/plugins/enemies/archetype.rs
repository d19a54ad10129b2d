//! Archetype hooks plugged into the base state machine.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::dash::DashAttack;
use super::fsm::{EnemyState, EnemyTuning, Intent, Perception};
use super::ranged::RangedAttack;
use crate::plugins::core::config::EnemyArchetypeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum ArchetypeKind {
    #[default]
    Chaser,
    Shooter,
}

/// Attack behaviour of one enemy. Closed set: the base machine dispatches with `match`.
#[derive(Debug, Clone)]
pub enum Archetype {
    Chaser(DashAttack),
    Shooter(RangedAttack),
}

impl Archetype {
    pub fn from_config(config: &EnemyArchetypeConfig) -> Self {
        match config.kind {
            ArchetypeKind::Chaser => Self::Chaser(DashAttack::new(config.dash)),
            ArchetypeKind::Shooter => Self::Shooter(RangedAttack::new(config.ranged)),
        }
    }

    pub fn kind(&self) -> ArchetypeKind {
        match self {
            Self::Chaser(_) => ArchetypeKind::Chaser,
            Self::Shooter(_) => ArchetypeKind::Shooter,
        }
    }

    pub fn attack(&mut self, tuning: &EnemyTuning, p: &Perception, target: Vec2) -> Intent {
        match self {
            Self::Chaser(dash) => dash.attack(tuning, p, target),
            Self::Shooter(ranged) => ranged.attack(p, target),
        }
    }

    pub fn on_state_change(&mut self, from: EnemyState, to: EnemyState) {
        match self {
            Self::Chaser(dash) => dash.on_state_change(from, to),
            Self::Shooter(ranged) => ranged.on_state_change(from, to),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::Chaser(dash) => dash.reset(),
            Self::Shooter(ranged) => ranged.reset(),
        }
    }
}
