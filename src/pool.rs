//! The pool engine: acquire, release, shutdown, statistics

use std::backtrace::Backtrace;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::config::{ExhaustedAction, PoolConfig};
use crate::entry::{EntryMeta, IdleEntry};
use crate::errors::{PoolError, PoolResult};
use crate::lifecycle::ResourceLifecycle;
use crate::state::PoolState;

const EXHAUSTION_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// A point-in-time snapshot of the pool's counters.
///
/// See [`ResourcePool::status`]. The snapshot is consistent (taken under
/// the pool lock) but may be stale by the time you read it.
#[derive(Debug, Clone, Copy)]
pub struct PoolStatus {
    /// Resources parked in the pool, available for lending.
    pub idle: usize,
    /// Resources currently lent to callers.
    pub active: usize,
    /// Resources being constructed, already counted against `max_active`.
    pub creating: usize,
    /// Callers blocked waiting for a resource.
    pub waiting: usize,
}

/// What an acquire attempt decided to do, settled under the pool lock.
enum Claim<R> {
    /// An idle entry was popped and is already recorded as active.
    Idle { id: u64, resource: R },
    /// Capacity admits a new resource; the in-flight counter is bumped.
    Create,
}

/// A thread-safe, bounded pool of expensive-to-create resources.
///
/// The pool lends resources out through [`acquire`](Self::acquire) and
/// reclaims them through [`release`](Self::release) (or the returned
/// guard's `Drop`). Capacity and lifetime limits, validation, and
/// exhaustion behavior come from [`PoolConfig`]; everything
/// resource-specific comes from the [`ResourceLifecycle`] supplied at
/// construction.
///
/// All bookkeeping sits behind one mutex. The lock is never held across
/// lifecycle calls, which may block on I/O.
///
/// # Examples
///
/// ```
/// use lendpool::{PoolConfig, ResourceLifecycle, ResourcePool};
///
/// struct Conn;
/// struct ConnLifecycle;
///
/// impl ResourceLifecycle for ConnLifecycle {
///     type Resource = Conn;
///     type Error = std::io::Error;
///
///     fn create(&self) -> Result<Conn, Self::Error> {
///         Ok(Conn)
///     }
///
///     fn destroy(&self, _conn: Conn) {}
/// }
///
/// let pool = ResourcePool::new(ConnLifecycle, PoolConfig::new().with_max_active(8));
/// let conn = pool.acquire().unwrap();
/// assert_eq!(pool.num_active(), 1);
/// pool.release(conn).unwrap();
/// assert_eq!(pool.num_idle(), 1);
/// ```
pub struct ResourcePool<L: ResourceLifecycle> {
    lifecycle: L,
    pub(crate) state: Mutex<PoolState<L::Resource>>,
    pub(crate) idle_available: Condvar,
    next_id: AtomicU64,
    pub(crate) broken: AtomicU64,
}

impl<L: ResourceLifecycle> ResourcePool<L> {
    /// Creates a new pool around `lifecycle` with the given configuration.
    pub fn new(lifecycle: L, config: PoolConfig) -> Arc<Self> {
        Arc::new(Self {
            lifecycle,
            state: Mutex::new(PoolState::new(config)),
            idle_available: Condvar::new(),
            next_id: AtomicU64::new(0),
            broken: AtomicU64::new(0),
        })
    }

    /// Borrows a live, activated resource from the pool.
    ///
    /// Pops the most recently released idle resource when one exists;
    /// otherwise creates a new one, subject to `max_active` and the
    /// configured [`ExhaustedAction`]. Broken resources (failed
    /// activation or validation) are destroyed and the attempt retried
    /// against a fresh idle or created resource.
    ///
    /// The returned guard derefs to the raw resource and returns it to
    /// the pool when dropped; use [`release`](Self::release) to observe
    /// release errors.
    pub fn acquire(self: &Arc<Self>) -> PoolResult<PooledResource<L>, L::Error> {
        loop {
            let (claim, config) = self.claim_or_admit()?;
            match claim {
                Claim::Idle { id, mut resource } => {
                    if self.ready_for_use(&mut resource, &config) {
                        return Ok(self.hand_out(id, resource));
                    }
                    self.forget_active(id);
                    self.broken.fetch_add(1, Ordering::Relaxed);
                    self.lifecycle.destroy(resource);
                    // try again with another idle entry or a fresh resource
                }
                Claim::Create => match self.lifecycle.create() {
                    Ok(mut resource) => {
                        let meta = EntryMeta::new(self.next_id.fetch_add(1, Ordering::Relaxed));
                        let id = meta.id;
                        {
                            let mut state = self.state.lock();
                            state.creating -= 1;
                            state.active.insert(id, meta);
                        }
                        if self.ready_for_use(&mut resource, &config) {
                            return Ok(self.hand_out(id, resource));
                        }
                        self.forget_active(id);
                        self.broken.fetch_add(1, Ordering::Relaxed);
                        self.lifecycle.destroy(resource);
                        return Err(PoolError::CreationFailed { source: None });
                    }
                    Err(err) => {
                        {
                            let mut state = self.state.lock();
                            state.creating -= 1;
                        }
                        self.idle_available.notify_one();
                        warn!(
                            pool = %self.lifecycle.describe(),
                            error = %err,
                            "failed to create pooled resource"
                        );
                        return Err(PoolError::CreationFailed { source: Some(err) });
                    }
                },
            }
        }
    }

    /// Returns a borrowed resource to the pool.
    ///
    /// The resource is deactivated (or validated, per configuration) and
    /// parked on the idle stack, unless it is broken, deprecated, past
    /// its lifetime, over the `max_idle` bound, or the pool has been shut
    /// down — in which case it is destroyed.
    ///
    /// Fails with [`PoolError::NotPooled`] when the resource is no longer
    /// an active member of this pool (typically after the reaper
    /// reclaimed it as leaked); the resource is destroyed either way.
    pub fn release(self: &Arc<Self>, resource: PooledResource<L>) -> PoolResult<(), L::Error> {
        let same_pool = resource.pool.as_ptr() == Arc::as_ptr(self);
        let (id, raw) = resource.into_parts();
        if !same_pool {
            self.lifecycle.destroy(raw);
            return Err(PoolError::NotPooled);
        }
        self.give_back(id, raw)
    }

    /// Stops the pool. Subsequent [`acquire`](Self::acquire) calls fail
    /// with [`PoolError::Stopped`]; blocked acquirers are woken and fail
    /// the same way. Resources currently lent out are destroyed when
    /// released rather than re-pooled; idle resources are destroyed when
    /// the last reference to the pool is dropped.
    pub fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            state.running = false;
        }
        self.idle_available.notify_all();
    }

    /// Atomically replaces the pool configuration.
    pub fn reconfigure(&self, config: PoolConfig) {
        self.state.lock().config = config;
    }

    /// True when the pool tracks no resources at all.
    pub fn is_empty(&self) -> bool {
        self.state.lock().size() == 0
    }

    /// Number of idle resources available for lending.
    pub fn num_idle(&self) -> usize {
        self.state.lock().idle.len()
    }

    /// Number of resources currently lent out.
    pub fn num_active(&self) -> usize {
        self.state.lock().active.len()
    }

    /// Total resources tracked: idle, active, and in-flight creations.
    pub fn size(&self) -> usize {
        self.state.lock().size()
    }

    /// Consistent snapshot of the pool counters.
    pub fn status(&self) -> PoolStatus {
        let state = self.state.lock();
        PoolStatus {
            idle: state.idle.len(),
            active: state.active.len(),
            creating: state.creating,
            waiting: state.waiting,
        }
    }

    /// Number of resources found broken by activation, validation, or
    /// deactivation probes.
    pub fn num_broken(&self) -> u64 {
        self.broken.load(Ordering::Relaxed)
    }

    /// Longest observed use time among recent releases.
    pub fn max_use_time(&self) -> Option<Duration> {
        self.state.lock().stats.max()
    }

    /// Forgets use-time samples for the purpose of [`max_use_time`](Self::max_use_time).
    pub fn reset_max_use_time(&self) {
        self.state.lock().stats.reset_max();
    }

    /// Shortest observed use time among recent releases.
    pub fn min_use_time(&self) -> Option<Duration> {
        self.state.lock().stats.min()
    }

    /// Forgets use-time samples for the purpose of [`min_use_time`](Self::min_use_time).
    pub fn reset_min_use_time(&self) {
        self.state.lock().stats.reset_min();
    }

    pub(crate) fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    /// Settles, under the lock, whether this acquire reuses an idle
    /// entry, creates a new resource, waits, or fails. Returns alongside
    /// a snapshot of the configuration the decision was made under.
    fn claim_or_admit(&self) -> PoolResult<(Claim<L::Resource>, PoolConfig), L::Error> {
        let mut state = self.state.lock();
        let deadline = state.config.max_wait.map(|wait| Instant::now() + wait);

        if state.config.track_ownership
            && let Some(&held) = state.owners.get(&std::thread::current().id())
        {
            debug!(
                pool = %self.lifecycle.describe(),
                entry = held,
                "caller already holds an active resource from this pool"
            );
        }

        loop {
            if !state.running {
                return Err(PoolError::Stopped);
            }

            let config = state.config;
            if let Some((id, resource)) = state.claim_idle() {
                return Ok((Claim::Idle { id, resource }, config));
            }

            if state.at_capacity() {
                match config.exhausted_action {
                    // soft limit: create anyway
                    ExhaustedAction::Grow => {}
                    ExhaustedAction::Fail => return Err(Self::exhausted(&state)),
                    ExhaustedAction::Block => {
                        self.warn_exhausted(&mut state);
                        state.waiting += 1;
                        let timed_out = match deadline {
                            Some(deadline) => self
                                .idle_available
                                .wait_until(&mut state, deadline)
                                .timed_out(),
                            None => {
                                self.idle_available.wait(&mut state);
                                false
                            }
                        };
                        state.waiting -= 1;
                        if timed_out {
                            // pass along any wakeup this waiter may have
                            // swallowed, then give up
                            self.idle_available.notify_one();
                            return Err(Self::exhausted(&state));
                        }
                        continue;
                    }
                }
            }

            state.creating += 1;
            return Ok((Claim::Create, config));
        }
    }

    /// Activation and optional validation, outside the lock.
    fn ready_for_use(&self, resource: &mut L::Resource, config: &PoolConfig) -> bool {
        if !self
            .lifecycle
            .activate(resource, config.always_validate_on_activate)
        {
            return false;
        }
        if config.validate_on_activate && !self.lifecycle.validate(resource, true) {
            return false;
        }
        true
    }

    /// Records ownership, touches the entry, and wraps the resource in
    /// its guard.
    fn hand_out(self: &Arc<Self>, id: u64, resource: L::Resource) -> PooledResource<L> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let track = state.config.track_ownership;
        if let Some(meta) = state.active.get_mut(&id) {
            meta.touch();
            if track {
                let owner = std::thread::current().id();
                meta.owner = Some(owner);
                meta.trace = Some(Backtrace::force_capture());
                state.owners.insert(owner, id);
            }
        }
        drop(guard);

        PooledResource {
            resource: Some(resource),
            id,
            pool: Arc::downgrade(self),
        }
    }

    /// Drops an active entry whose resource turned out broken and wakes
    /// one waiter, since capacity was freed.
    pub(crate) fn forget_active(&self, id: u64) {
        {
            let mut state = self.state.lock();
            state.remove_active(id);
        }
        self.idle_available.notify_one();
    }

    fn give_back(&self, id: u64, mut resource: L::Resource) -> PoolResult<(), L::Error> {
        let (running, config) = {
            let state = self.state.lock();
            if !state.active.contains_key(&id) {
                drop(state);
                self.lifecycle.destroy(resource);
                return Err(PoolError::NotPooled);
            }
            (state.running, state.config)
        };

        // lifecycle probes happen outside the lock
        let probe_ok = if !running {
            false
        } else if config.validate_on_deactivate {
            self.lifecycle.validate(&mut resource, false)
        } else {
            self.lifecycle.deactivate(&mut resource)
        };
        if running && !probe_ok {
            self.broken.fetch_add(1, Ordering::Relaxed);
        }

        let to_destroy = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let Some(mut meta) = state.remove_active(id) else {
                // reclaimed as a leak while we were deactivating
                drop(guard);
                self.lifecycle.destroy(resource);
                return Err(PoolError::NotPooled);
            };
            state.stats.record(meta.last_touch.elapsed());
            self.idle_available.notify_one();

            let poolable = probe_ok
                && state.running
                && !meta.deprecated
                && !meta.past_life_limit(state.config.max_life_time);
            let has_room = state.config.max_idle.is_none_or(|max| state.idle.len() < max);

            if poolable && has_room {
                meta.owner = None;
                meta.trace = None;
                meta.touch();
                state.idle.push(IdleEntry { resource, meta });
                None
            } else {
                Some(resource)
            }
        };

        if let Some(resource) = to_destroy {
            self.lifecycle.destroy(resource);
        }
        Ok(())
    }

    fn exhausted(state: &PoolState<L::Resource>) -> PoolError<L::Error> {
        PoolError::Exhausted {
            active: state.active.len(),
            idle: state.idle.len(),
            waiting: state.waiting,
        }
    }

    /// Logs the current holders when a caller is about to block, at most
    /// once per minute.
    fn warn_exhausted(&self, state: &mut PoolState<L::Resource>) {
        let now = Instant::now();
        let due = state
            .last_exhausted_warning
            .is_none_or(|at| now.duration_since(at) >= EXHAUSTION_WARN_INTERVAL);
        if !due {
            return;
        }
        state.last_exhausted_warning = Some(now);

        let holders: Vec<String> = state
            .active
            .values()
            .map(|meta| match meta.owner {
                Some(owner) => format!(
                    "entry {} held by {:?} for {:?}",
                    meta.id,
                    owner,
                    meta.since_touch()
                ),
                None => format!("entry {} held for {:?}", meta.id, meta.since_touch()),
            })
            .collect();
        warn!(
            pool = %self.lifecycle.describe(),
            active = state.active.len(),
            creating = state.creating,
            waiting = state.waiting,
            holders = ?holders,
            "pool exhausted; acquire will block"
        );
    }
}

impl<L: ResourceLifecycle> Drop for ResourcePool<L> {
    fn drop(&mut self) {
        let idle = std::mem::take(&mut self.state.get_mut().idle);
        for entry in idle {
            self.lifecycle.destroy(entry.resource);
        }
    }
}

/// A resource borrowed from a [`ResourcePool`].
///
/// Derefs to the raw resource. Dropping the guard returns the resource
/// to its pool (best effort); call [`ResourcePool::release`] instead
/// when you need to observe release errors.
pub struct PooledResource<L: ResourceLifecycle> {
    resource: Option<L::Resource>,
    id: u64,
    pool: Weak<ResourcePool<L>>,
}

impl<L> std::fmt::Debug for PooledResource<L>
where
    L: ResourceLifecycle,
    L::Resource: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledResource")
            .field("id", &self.id)
            .field("resource", &self.resource)
            .finish()
    }
}

impl<L: ResourceLifecycle> PooledResource<L> {
    /// The pool-scoped identity of the lent entry.
    pub fn entry_id(&self) -> u64 {
        self.id
    }

    /// Marks the underlying entry for disposal: the next release will
    /// destroy the resource instead of returning it to the idle stack.
    pub fn deprecate(&self) {
        if let Some(pool) = self.pool.upgrade()
            && let Some(meta) = pool.state.lock().active.get_mut(&self.id)
        {
            meta.deprecated = true;
        }
    }

    fn into_parts(mut self) -> (u64, L::Resource) {
        let resource = self.resource.take().expect("resource already released");
        (self.id, resource)
    }
}

impl<L: ResourceLifecycle> Deref for PooledResource<L> {
    type Target = L::Resource;

    fn deref(&self) -> &Self::Target {
        self.resource.as_ref().expect("resource already released")
    }
}

impl<L: ResourceLifecycle> DerefMut for PooledResource<L> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.resource.as_mut().expect("resource already released")
    }
}

impl<L: ResourceLifecycle> Drop for PooledResource<L> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            if let Some(pool) = self.pool.upgrade() {
                let _ = pool.give_back(self.id, resource);
            }
            // pool already gone: the resource is simply dropped
        }
    }
}
