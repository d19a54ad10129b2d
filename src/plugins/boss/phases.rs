//! Health-threshold phase table.
//!
//! Phases are kept sorted by descending threshold. The controller only moves forward: a phase is
//! entered when health drops to or below its threshold, and a single evaluation may cross several
//! thresholds at once (each crossing is reported, in order).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::plugins::projectiles::patterns::PatternDescriptor;
use crate::plugins::projectiles::weapon::ProjectileType;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BossPhase {
    pub name: String,
    /// Health percentage, `0..=100`, at or below which this phase starts.
    pub threshold: f32,
    pub pattern: PatternDescriptor,
    /// Seconds between attacks.
    pub fire_interval: f32,
    pub projectile_type: ProjectileType,
    /// Show a power effect while this phase is active.
    pub power_effect: bool,
}

impl Default for BossPhase {
    fn default() -> Self {
        Self {
            name: String::new(),
            threshold: 100.0,
            pattern: PatternDescriptor::default(),
            fire_interval: 2.0,
            projectile_type: ProjectileType::default(),
            power_effect: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: usize,
    pub to: usize,
}

/// Sort in place by descending threshold. Stable, so equal thresholds keep file order.
pub fn sort_phases(phases: &mut [BossPhase]) {
    phases.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));
}

#[derive(Debug, Clone, Default)]
pub struct PhaseController {
    phases: Vec<BossPhase>,
    current: usize,
}

impl PhaseController {
    pub fn new(mut phases: Vec<BossPhase>) -> Self {
        if phases.is_empty() {
            warn!("boss has no phases; it will neither transition nor attack");
        }
        sort_phases(&mut phases);
        Self { phases, current: 0 }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&BossPhase> {
        self.phases.get(self.current)
    }

    pub fn phase(&self, index: usize) -> Option<&BossPhase> {
        self.phases.get(index)
    }

    pub fn phases(&self) -> &[BossPhase] {
        &self.phases
    }

    #[inline]
    pub fn is_final(&self) -> bool {
        self.current + 1 >= self.phases.len()
    }

    /// Advance past every threshold `health_pct` has reached. Never moves backwards.
    pub fn evaluate(&mut self, health_pct: f32) -> Vec<PhaseTransition> {
        let mut crossed = Vec::new();
        while let Some(next) = self.phases.get(self.current + 1) {
            if health_pct > next.threshold {
                break;
            }
            crossed.push(PhaseTransition {
                from: self.current,
                to: self.current + 1,
            });
            self.current += 1;
        }
        crossed
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}
