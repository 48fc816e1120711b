//! Scriptable lifecycle used across the crate's tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::lifecycle::ResourceLifecycle;

/// A pooled resource stand-in carrying its creation serial.
#[derive(Debug)]
pub(crate) struct Token {
    pub serial: usize,
}

/// Observed and scripted lifecycle behavior. The `fail_*` counters arm
/// the next N calls of the corresponding probe to fail.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub created: AtomicUsize,
    pub destroyed: AtomicUsize,
    pub activations: AtomicUsize,
    pub validations: AtomicUsize,
    pub deactivations: AtomicUsize,
    pub fail_creates: AtomicUsize,
    pub fail_activates: AtomicUsize,
    pub fail_validates: AtomicUsize,
    pub fail_deactivates: AtomicUsize,
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedLifecycle {
    pub counters: Arc<Counters>,
}

impl ResourceLifecycle for ScriptedLifecycle {
    type Resource = Token;
    type Error = std::io::Error;

    fn create(&self) -> Result<Token, Self::Error> {
        if take_one(&self.counters.fail_creates) {
            return Err(std::io::Error::other("scripted creation failure"));
        }
        let serial = self.counters.created.fetch_add(1, Ordering::SeqCst);
        Ok(Token { serial })
    }

    fn destroy(&self, _token: Token) {
        self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn activate(&self, _token: &mut Token, _force_validity_check: bool) -> bool {
        self.counters.activations.fetch_add(1, Ordering::SeqCst);
        !take_one(&self.counters.fail_activates)
    }

    fn validate(&self, _token: &mut Token, _on_activate: bool) -> bool {
        self.counters.validations.fetch_add(1, Ordering::SeqCst);
        !take_one(&self.counters.fail_validates)
    }

    fn deactivate(&self, _token: &mut Token) -> bool {
        self.counters.deactivations.fetch_add(1, Ordering::SeqCst);
        !take_one(&self.counters.fail_deactivates)
    }

    fn describe(&self) -> String {
        "scripted test pool".to_string()
    }
}
