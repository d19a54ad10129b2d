//! Keyed actor pools.
//!
//! A [`Pool`] tracks handles only; the actors themselves live wherever the [`ActorHost`] keeps
//! them (the ECS world in the game, a plain counter in tests). Every handle the pool has ever
//! created is in exactly one of two places:
//!
//! ```text
//!   free  (VecDeque, FIFO) ──acquire──▶ active (HashSet)
//!        ▲                                  │
//!        └──────────────release─────────────┘
//! ```
//!
//! so `active.len() + free.len() == total_created` holds after every operation.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;

use bevy::log::{debug, error, warn};
use bevy::platform::collections::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

/// Identifier of one homogeneous collection of interchangeable actors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolKey(String);

impl PoolKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PoolKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    UnknownKey(PoolKey),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey(key) => write!(f, "no pool registered for key '{key}'"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Result of a release call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    Returned,
    /// The handle was not active (double release). Counters are left untouched.
    AlreadyFree,
}

/// Lifecycle seam between a pool and whatever owns the actors.
///
/// The pool decides *when*; the host decides *how*.
pub trait ActorHost<H> {
    /// Construct a new actor in its inactive state.
    fn create(&mut self, key: &PoolKey) -> H;
    /// Make the actor visible and interactive.
    fn activate(&mut self, key: &PoolKey, handle: H);
    /// Restore the canonical spawn condition. Called exactly once per acquire.
    fn reset(&mut self, key: &PoolKey, handle: H);
    /// Hide the actor and stop it interacting.
    fn deactivate(&mut self, key: &PoolKey, handle: H);
    fn destroy(&mut self, key: &PoolKey, handle: H);
}

#[derive(Debug)]
pub struct Pool<H> {
    free: VecDeque<H>,
    active: HashSet<H>,
    total_created: usize,
    total_acquired: u64,
}

impl<H> Default for Pool<H> {
    fn default() -> Self {
        Self {
            free: VecDeque::new(),
            active: HashSet::default(),
            total_created: 0,
            total_acquired: 0,
        }
    }
}

impl<H: Copy + Eq + Hash + fmt::Debug> Pool<H> {
    #[inline]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Actors ever constructed by this pool (pre-warm included).
    #[inline]
    pub fn total_created(&self) -> usize {
        self.total_created
    }

    /// Successful acquisitions over the pool's lifetime.
    #[inline]
    pub fn total_acquired(&self) -> u64 {
        self.total_acquired
    }

    #[inline]
    pub fn is_active(&self, handle: H) -> bool {
        self.active.contains(&handle)
    }

    pub fn active_handles(&self) -> impl Iterator<Item = H> + '_ {
        self.active.iter().copied()
    }

    pub fn free_handles(&self) -> impl Iterator<Item = H> + '_ {
        self.free.iter().copied()
    }

    fn prewarm(&mut self, key: &PoolKey, count: usize, host: &mut impl ActorHost<H>) {
        self.free.reserve(count);
        for _ in 0..count {
            let handle = host.create(key);
            self.total_created += 1;
            self.free.push_back(handle);
        }
    }

    fn acquire(&mut self, key: &PoolKey, host: &mut impl ActorHost<H>) -> H {
        let handle = match self.free.pop_front() {
            Some(handle) => handle,
            None => {
                let handle = host.create(key);
                self.total_created += 1;
                debug!("pool '{key}' grew to {}", self.total_created);
                handle
            }
        };

        self.active.insert(handle);
        self.total_acquired += 1;
        host.activate(key, handle);
        host.reset(key, handle);
        handle
    }

    fn release(&mut self, key: &PoolKey, handle: H, host: &mut impl ActorHost<H>) -> Release {
        if !self.active.remove(&handle) {
            warn!("pool '{key}': release of {handle:?} which is not active; ignored");
            return Release::AlreadyFree;
        }

        host.deactivate(key, handle);
        self.free.push_back(handle);
        Release::Returned
    }

    fn clear(&mut self, key: &PoolKey, host: &mut impl ActorHost<H>) -> usize {
        let destroyed = self.free.len() + self.active.len();
        for handle in self.free.drain(..).chain(self.active.drain()) {
            host.destroy(key, handle);
        }
        self.total_created = 0;
        self.total_acquired = 0;
        destroyed
    }
}

/// All pools, by key.
#[derive(Debug)]
pub struct PoolRegistry<H> {
    pools: HashMap<PoolKey, Pool<H>>,
    total_active: usize,
}

impl<H> Default for PoolRegistry<H> {
    fn default() -> Self {
        Self {
            pools: HashMap::default(),
            total_active: 0,
        }
    }
}

impl<H: Copy + Eq + Hash + fmt::Debug> PoolRegistry<H> {
    /// Register an empty pool. Returns `false` (and keeps the existing pool) if the key is taken.
    pub fn register(&mut self, key: PoolKey) -> bool {
        if self.pools.contains_key(&key) {
            warn!("pool '{key}' already registered; keeping the existing collection");
            return false;
        }
        self.pools.insert(key, Pool::default());
        true
    }

    #[inline]
    pub fn contains(&self, key: &PoolKey) -> bool {
        self.pools.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PoolKey> {
        self.pools.keys()
    }

    pub fn pool(&self, key: &PoolKey) -> Option<&Pool<H>> {
        self.pools.get(key)
    }

    pub fn prewarm(
        &mut self,
        key: &PoolKey,
        count: usize,
        host: &mut impl ActorHost<H>,
    ) -> Result<(), PoolError> {
        let pool = self
            .pools
            .get_mut(key)
            .ok_or_else(|| PoolError::UnknownKey(key.clone()))?;
        pool.prewarm(key, count, host);
        Ok(())
    }

    pub fn acquire(&mut self, key: &PoolKey, host: &mut impl ActorHost<H>) -> Result<H, PoolError> {
        let Some(pool) = self.pools.get_mut(key) else {
            error!("acquire from unregistered pool '{key}'");
            return Err(PoolError::UnknownKey(key.clone()));
        };
        let handle = pool.acquire(key, host);
        self.total_active += 1;
        Ok(handle)
    }

    pub fn release(
        &mut self,
        key: &PoolKey,
        handle: H,
        host: &mut impl ActorHost<H>,
    ) -> Result<Release, PoolError> {
        let Some(pool) = self.pools.get_mut(key) else {
            warn!("release into unregistered pool '{key}'");
            return Err(PoolError::UnknownKey(key.clone()));
        };
        let outcome = pool.release(key, handle, host);
        if outcome == Release::Returned {
            self.total_active = self.total_active.saturating_sub(1);
        }
        Ok(outcome)
    }

    /// Active actors in one pool; zero for unknown keys.
    pub fn active_count(&self, key: &PoolKey) -> usize {
        self.pools.get(key).map_or(0, Pool::active_count)
    }

    #[inline]
    pub fn total_active_count(&self) -> usize {
        self.total_active
    }

    pub fn free_count(&self, key: &PoolKey) -> usize {
        self.pools.get(key).map_or(0, Pool::free_count)
    }

    pub fn is_active(&self, key: &PoolKey, handle: H) -> bool {
        self.pools.get(key).is_some_and(|p| p.is_active(handle))
    }

    pub fn active_handles<'a>(&'a self, key: &PoolKey) -> impl Iterator<Item = H> + 'a {
        self.pools
            .get(key)
            .into_iter()
            .flat_map(|p| p.active_handles())
    }

    /// Destroy every actor of one pool. The key stays registered.
    pub fn clear(&mut self, key: &PoolKey, host: &mut impl ActorHost<H>) -> Result<usize, PoolError> {
        let pool = self
            .pools
            .get_mut(key)
            .ok_or_else(|| PoolError::UnknownKey(key.clone()))?;
        let active = pool.active_count();
        let destroyed = pool.clear(key, host);
        self.total_active = self.total_active.saturating_sub(active);
        Ok(destroyed)
    }

    pub fn clear_all(&mut self, host: &mut impl ActorHost<H>) {
        for (key, pool) in self.pools.iter_mut() {
            pool.clear(key, host);
        }
        self.total_active = 0;
    }
}
