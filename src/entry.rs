//! Per-resource bookkeeping metadata

use std::backtrace::Backtrace;
use std::thread::ThreadId;
use std::time::{Duration, Instant};

/// Metadata the pool tracks for one resource instance.
///
/// The resource value itself lives in the idle stack while parked, and
/// with the borrowing caller while lent out; this metadata follows it
/// through both states. Identity is the pool-scoped `id`.
#[derive(Debug)]
pub(crate) struct EntryMeta {
    pub id: u64,
    pub created_at: Instant,
    pub last_touch: Instant,
    pub owner: Option<ThreadId>,
    pub trace: Option<Backtrace>,
    pub deprecated: bool,
}

impl EntryMeta {
    pub fn new(id: u64) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            last_touch: now,
            owner: None,
            trace: None,
            deprecated: false,
        }
    }

    pub fn touch(&mut self) {
        self.last_touch = Instant::now();
    }

    /// Time since the entry was last acquired or released. For an idle
    /// entry this is its idle time; for an active one, how long the
    /// borrower has held it.
    pub fn since_touch(&self) -> Duration {
        self.last_touch.elapsed()
    }

    pub fn past_idle_limit(&self, limit: Option<Duration>) -> bool {
        limit.is_some_and(|limit| self.since_touch() > limit)
    }

    pub fn past_life_limit(&self, limit: Option<Duration>) -> bool {
        limit.is_some_and(|limit| self.created_at.elapsed() > limit)
    }
}

/// A resource parked in the idle stack, paired with its metadata.
#[derive(Debug)]
pub(crate) struct IdleEntry<R> {
    pub resource: R,
    pub meta: EntryMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_within_limits() {
        let meta = EntryMeta::new(7);
        assert_eq!(meta.id, 7);
        assert!(!meta.past_idle_limit(Some(Duration::from_secs(1))));
        assert!(!meta.past_life_limit(Some(Duration::from_secs(1))));
        assert!(!meta.past_idle_limit(None));
        assert!(!meta.past_life_limit(None));
    }

    #[test]
    fn touch_resets_idle_clock() {
        let mut meta = EntryMeta::new(0);
        std::thread::sleep(Duration::from_millis(15));
        assert!(meta.past_idle_limit(Some(Duration::from_millis(5))));
        meta.touch();
        assert!(!meta.past_idle_limit(Some(Duration::from_millis(5))));
        // lifetime keeps counting from creation regardless of touches
        assert!(meta.past_life_limit(Some(Duration::from_millis(5))));
    }
}
