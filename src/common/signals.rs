//! Cross-system signal bus.
//!
//! One closed enum carries every notification the combat core emits or consumes, each variant with
//! its own typed payload. Listeners `match` instead of downcasting.
//!
//! A system cannot hold both a `MessageReader<GameSignal>` and a `MessageWriter<GameSignal>`, so
//! reactions and emissions live in separate systems ordered inside the tick.

use bevy::prelude::*;

use crate::plugins::pooling::PoolKey;

/// Why an enemy entered its terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathCause {
    /// Health reached zero.
    Killed,
    /// Strayed beyond the distance ceiling from the player.
    TooFar,
    /// Removed by a global event (boss phase change / boss defeated).
    Culled,
}

#[derive(Message, Clone, Debug, PartialEq)]
pub enum GameSignal {
    RunStarted,
    EnemyDied {
        enemy: Entity,
        archetype: PoolKey,
        cause: DeathCause,
    },
    BossPhaseChanged {
        phase: String,
        index: usize,
    },
    BossDefeated,
    BossAttack {
        phase: String,
    },
    PlayerTookDamage {
        amount: f32,
        remaining: f32,
    },
    PlayerSpecialAttack {
        hits: usize,
    },
    PlayerDied,
    CheckpointReached {
        phase: Option<String>,
        position: Vec2,
        last: bool,
    },
}
