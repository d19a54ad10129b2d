//! Delayed one-shot actions polled on the fixed tick.
//!
//! A task aimed at a pooled entity records the entity's `SpawnGeneration` when it is scheduled.
//! Acquiring the entity again bumps the generation, so a task that outlived its actor sees a
//! mismatch and is dropped instead of acting on the new occupant.

use bevy::prelude::*;

use crate::common::state::GameState;
use crate::plugins::pooling::{PoolSlot, SpawnGeneration};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct ScheduledTask<T> {
    id: TaskId,
    remaining: f32,
    payload: T,
}

/// Countdown tasks, fired once in the order they were scheduled.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    tasks: Vec<ScheduledTask<T>>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn schedule(&mut self, delay_secs: f32, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            remaining: delay_secs.max(0.0),
            payload,
        });
        id
    }

    /// Returns `false` if the task already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Cancel every pending task whose payload matches. Returns how many were dropped.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !pred(&t.payload));
        before - self.tasks.len()
    }

    /// Advance every countdown by `dt` and hand back the payloads that came due.
    pub fn tick(&mut self, dt: f32) -> Vec<T> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.tasks.len() {
            self.tasks[i].remaining -= dt;
            if self.tasks[i].remaining <= 0.0 {
                due.push(self.tasks.remove(i).payload);
            } else {
                i += 1;
            }
        }
        due
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayedKind {
    /// Mark the actor `PendingReturn`.
    ReturnToPool,
    /// Remove a non-pooled actor (the boss).
    Despawn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayedAction {
    pub target: Entity,
    pub generation: u32,
    pub kind: DelayedKind,
}

#[derive(Resource, Debug, Default, Deref, DerefMut)]
pub struct DelayedActions(pub Scheduler<DelayedAction>);

impl DelayedActions {
    pub fn return_to_pool(&mut self, target: Entity, generation: SpawnGeneration, delay_secs: f32) -> TaskId {
        self.schedule(
            delay_secs,
            DelayedAction {
                target,
                generation: generation.0,
                kind: DelayedKind::ReturnToPool,
            },
        )
    }

    pub fn despawn(&mut self, target: Entity, delay_secs: f32) -> TaskId {
        self.schedule(
            delay_secs,
            DelayedAction {
                target,
                generation: 0,
                kind: DelayedKind::Despawn,
            },
        )
    }

    pub fn cancel_for(&mut self, target: Entity) -> usize {
        self.cancel_where(|a| a.target == target)
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<DelayedActions>().add_systems(
        FixedUpdate,
        run_delayed_actions.run_if(in_state(GameState::InGame)),
    );
}

pub fn run_delayed_actions(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut delayed: ResMut<DelayedActions>,
    mut q_pooled: Query<(&SpawnGeneration, &mut PoolSlot)>,
) {
    for action in delayed.tick(time.delta_secs()) {
        match action.kind {
            DelayedKind::ReturnToPool => {
                let Ok((generation, mut slot)) = q_pooled.get_mut(action.target) else {
                    debug!("delayed return: {:?} no longer pooled", action.target);
                    continue;
                };
                if generation.0 != action.generation || *slot != PoolSlot::Active {
                    debug!("delayed return: stale token for {:?}", action.target);
                    continue;
                }
                *slot = PoolSlot::PendingReturn;
            }
            DelayedKind::Despawn => {
                if let Ok(mut entity) = commands.get_entity(action.target) {
                    entity.despawn();
                }
            }
        }
    }
}
