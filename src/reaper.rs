//! Periodic eviction of stale idle entries and leaked active entries

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{RecvTimeoutError, Sender, bounded};
use tracing::{debug, warn};

use crate::entry::{EntryMeta, IdleEntry};
use crate::lifecycle::ResourceLifecycle;
use crate::pool::ResourcePool;

impl<L: ResourceLifecycle> ResourcePool<L> {
    /// Runs one reaper sweep.
    ///
    /// Evicts idle entries past their idle or lifetime limits, optionally
    /// validates the surviving idle entries (outside the lock), and
    /// reclaims active entries that have been held past `max_idle_time` —
    /// the leak-recovery path. The background [`Reaper`] calls this on a
    /// fixed interval; tests may call it directly.
    pub fn reap(&self) {
        let mut doomed: Vec<IdleEntry<L::Resource>> = Vec::new();
        let mut unchecked: Vec<IdleEntry<L::Resource>> = Vec::new();
        let mut leaked: Vec<EntryMeta> = Vec::new();

        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let config = state.config;

            let mut kept = Vec::with_capacity(state.idle.len());
            for entry in state.idle.drain(..) {
                if entry.meta.past_idle_limit(config.max_idle_time)
                    || entry.meta.past_life_limit(config.max_life_time)
                {
                    doomed.push(entry);
                } else if config.validate_on_idle {
                    unchecked.push(entry);
                } else {
                    kept.push(entry);
                }
            }
            state.idle = kept;

            // an active entry untouched past the idle limit was never
            // released by its borrower: reclaim the slot
            if let Some(limit) = config.max_idle_time {
                let overdue: Vec<u64> = state
                    .active
                    .iter()
                    .filter(|(_, meta)| meta.since_touch() > limit)
                    .map(|(&id, _)| id)
                    .collect();
                for id in overdue {
                    if let Some(meta) = state.remove_active(id) {
                        self.idle_available.notify_one();
                        leaked.push(meta);
                    }
                }
            }
        }

        // idle validation happens outside the lock; survivors go back in
        // their original order
        if !unchecked.is_empty() {
            let mut survivors = Vec::with_capacity(unchecked.len());
            for mut entry in unchecked {
                let lifecycle = self.lifecycle();
                let ok = lifecycle.activate(&mut entry.resource, false)
                    && lifecycle.validate(&mut entry.resource, true)
                    && lifecycle.deactivate(&mut entry.resource);
                if ok {
                    survivors.push(entry);
                } else {
                    self.broken.fetch_add(1, Ordering::Relaxed);
                    doomed.push(entry);
                }
            }

            let mut state = self.state.lock();
            if state.running {
                state.idle.extend(survivors);
            } else {
                drop(state);
                doomed.extend(survivors);
            }
        }

        for entry in doomed {
            debug!(
                pool = %self.lifecycle().describe(),
                entry = entry.meta.id,
                age = ?entry.meta.created_at.elapsed(),
                "destroying stale idle resource"
            );
            self.lifecycle().destroy(entry.resource);
        }

        for meta in leaked {
            warn!(
                pool = %self.lifecycle().describe(),
                entry = meta.id,
                owner = ?meta.owner,
                held_for = ?meta.since_touch(),
                "reclaimed a leaked resource; it was acquired but never released"
            );
            if let Some(trace) = &meta.trace {
                warn!(entry = meta.id, "leaked resource was acquired at:\n{trace}");
            }
        }
    }
}

/// Handle to the background sweep thread of one [`ResourcePool`].
///
/// The thread holds only a weak reference to the pool: it wakes every
/// `reap_interval` (from the pool configuration at spawn time), runs one
/// [`ResourcePool::reap`] sweep, and exits on its own once the pool has
/// been dropped. Dropping (or [`stop`](Reaper::stop)ping) the handle
/// stops the thread promptly and joins it.
pub struct Reaper {
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Spawns the sweep thread for `pool`.
    pub fn spawn<L: ResourceLifecycle>(pool: &Arc<ResourcePool<L>>) -> Self {
        let interval = pool.state.lock().config.reap_interval;
        Self::spawn_with_interval(pool, interval)
    }

    /// Spawns the sweep thread with an explicit interval.
    pub fn spawn_with_interval<L: ResourceLifecycle>(
        pool: &Arc<ResourcePool<L>>,
        interval: Duration,
    ) -> Self {
        let weak = Arc::downgrade(pool);
        let (shutdown, ticks) = bounded::<()>(1);
        let handle = std::thread::Builder::new()
            .name("lendpool-reaper".to_string())
            .spawn(move || {
                loop {
                    match ticks.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => match weak.upgrade() {
                            Some(pool) => pool.reap(),
                            None => break,
                        },
                        // explicit stop, or the handle was dropped
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .expect("failed to spawn pool reaper thread");

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Stops the sweep thread and waits for it to finish.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        let _ = self.shutdown.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
