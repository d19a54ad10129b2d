//! Test helpers.
//!
//! Systems that use `Commands` enqueue structural changes; we call `world.flush()` after running
//! so queued commands are applied before assertions.

use std::time::Duration;

use bevy::ecs::message::{Message, Messages};
use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::ecs::world::CommandQueue;
use bevy::prelude::*;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// A `Time<Fixed>` that has advanced by `elapsed` in one step of `dt`.
pub fn fixed_time(elapsed: f32, dt: f32) -> Time<Fixed> {
    let mut t = Time::<Fixed>::default();
    if elapsed > dt {
        t.advance_by(Duration::from_secs_f32(elapsed - dt));
    }
    t.advance_by(Duration::from_secs_f32(dt));
    t
}

/// Run `f` with a `Commands` borrowing `world`, then apply the queue.
pub fn with_commands<T>(world: &mut World, f: impl FnOnce(&mut Commands) -> T) -> T {
    let mut queue = CommandQueue::default();
    let out = {
        let mut commands = Commands::new(&mut queue, world);
        f(&mut commands)
    };
    queue.apply(world);
    out
}

/// Drain every message of type `M` currently buffered in `world`.
pub fn drain_messages<M: Message + Clone>(world: &mut World) -> Vec<M> {
    world
        .get_resource_mut::<Messages<M>>()
        .map(|mut msgs| msgs.drain().collect())
        .unwrap_or_default()
}
