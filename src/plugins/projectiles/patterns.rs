//! Attack patterns: a pure mapping from a pattern and a base direction to projectile directions.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub enum AttackPattern {
    /// Fires like `Single`.
    None,
    #[default]
    Single,
    /// `count` shots fanned evenly across `angle_total` degrees, centred on the base direction.
    Spread { angle_total: f32, count: u32 },
    /// `count` shots evenly around the full circle starting at +X. Ignores the base direction.
    Circular { count: u32 },
}

/// A pattern plus the projectile speed it fires at.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternDescriptor {
    pub pattern: AttackPattern,
    pub speed: f32,
}

impl Default for PatternDescriptor {
    fn default() -> Self {
        Self {
            pattern: AttackPattern::Single,
            speed: 10.0,
        }
    }
}

impl PatternDescriptor {
    pub const fn new(pattern: AttackPattern, speed: f32) -> Self {
        Self { pattern, speed }
    }

    #[inline]
    pub fn directions(&self, base: Vec2) -> Vec<Vec2> {
        directions(self.pattern, base)
    }
}

/// Unit direction vectors for one volley, in firing order.
///
/// `base` is normalised first; a zero base falls back to +X. A spread of fewer than two shots
/// has no angle to distribute and fires a single shot along `base`.
pub fn directions(pattern: AttackPattern, base: Vec2) -> Vec<Vec2> {
    let base = base.try_normalize().unwrap_or(Vec2::X);

    match pattern {
        AttackPattern::None | AttackPattern::Single => vec![base],
        AttackPattern::Spread { count: 0 | 1, .. } => vec![base],
        AttackPattern::Spread { angle_total, count } => {
            let step = angle_total / (count - 1) as f32;
            let start = -angle_total / 2.0;
            (0..count)
                .map(|i| Vec2::from_angle((start + step * i as f32).to_radians()).rotate(base))
                .collect()
        }
        AttackPattern::Circular { count } => {
            let step = 360.0 / count.max(1) as f32;
            (0..count)
                .map(|i| Vec2::from_angle((step * i as f32).to_radians()))
                .collect()
        }
    }
}
