//! Mutable pool bookkeeping

use std::collections::HashMap;
use std::thread::ThreadId;
use std::time::Instant;

use crate::config::PoolConfig;
use crate::entry::{EntryMeta, IdleEntry};
use crate::stats::UseTimeStats;

/// The pool's mutable bookkeeping. Plain data, not thread-safe by
/// itself; every access goes through the pool's mutex.
///
/// Invariant: an entry id is present in exactly one of `idle` and
/// `active`, never both, and never neither — except transiently while a
/// resource is being created (counted by `creating`) or while the reaper
/// has pulled an idle entry out for validation.
#[derive(Debug)]
pub(crate) struct PoolState<R> {
    pub config: PoolConfig,

    /// Idle entries, LIFO: the most recently released resource is at the
    /// tail and is handed out first, so cold entries age out via the
    /// reaper.
    pub idle: Vec<IdleEntry<R>>,

    /// Metadata for lent-out entries, keyed by entry id. The resource
    /// value itself is with the borrower.
    pub active: HashMap<u64, EntryMeta>,

    /// Owning thread per active entry, populated when ownership tracking
    /// is on.
    pub owners: HashMap<ThreadId, u64>,

    /// Resources not yet constructed but already counted against
    /// `max_active`.
    pub creating: usize,

    /// Callers currently blocked waiting for an idle resource.
    pub waiting: usize,

    pub running: bool,

    pub stats: UseTimeStats,

    pub last_exhausted_warning: Option<Instant>,
}

impl<R> PoolState<R> {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            idle: Vec::new(),
            active: HashMap::new(),
            owners: HashMap::new(),
            creating: 0,
            waiting: 0,
            running: true,
            stats: UseTimeStats::new(),
            last_exhausted_warning: None,
        }
    }

    /// Whether `max_active` forbids admitting another resource.
    pub fn at_capacity(&self) -> bool {
        match self.config.max_active {
            Some(max) => self.active.len() + self.creating >= max,
            None => false,
        }
    }

    /// Entries tracked by the pool in any phase of their life.
    pub fn size(&self) -> usize {
        self.idle.len() + self.active.len() + self.creating
    }

    /// Moves an idle entry into the active map and returns its id with
    /// the resource.
    pub fn claim_idle(&mut self) -> Option<(u64, R)> {
        let IdleEntry { resource, meta } = self.idle.pop()?;
        let id = meta.id;
        self.active.insert(id, meta);
        Some((id, resource))
    }

    /// Removes an active entry, dropping its ownership record.
    pub fn remove_active(&mut self, id: u64) -> Option<EntryMeta> {
        let meta = self.active.remove(&id)?;
        if let Some(owner) = meta.owner {
            self.owners.remove(&owner);
        }
        Some(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> PoolState<&'static str> {
        PoolState::new(PoolConfig::new().with_max_active(2))
    }

    #[test]
    fn claim_moves_entry_between_views() {
        let mut state = state();
        state.idle.push(IdleEntry {
            resource: "a",
            meta: EntryMeta::new(1),
        });

        let (id, resource) = state.claim_idle().expect("one idle entry");
        assert_eq!((id, resource), (1, "a"));
        assert!(state.idle.is_empty());
        assert!(state.active.contains_key(&1));

        assert!(state.remove_active(1).is_some());
        assert!(state.active.is_empty());
        assert_eq!(state.size(), 0);
    }

    #[test]
    fn in_flight_creations_count_against_capacity() {
        let mut state = state();
        assert!(!state.at_capacity());
        state.creating = 1;
        state.active.insert(9, EntryMeta::new(9));
        assert!(state.at_capacity());
        assert_eq!(state.size(), 2);
    }
}
