//! Error types for the resource pool

use thiserror::Error;

/// Errors surfaced by [`ResourcePool`](crate::ResourcePool) operations.
///
/// Broken resources (a lifecycle probe returning `false`) are not errors:
/// the pool destroys the resource, bumps the broken counter, and retries
/// or falls back as appropriate.
#[derive(Error, Debug)]
pub enum PoolError<E: std::error::Error + 'static> {
    /// The lifecycle failed to create a resource, or a freshly created
    /// resource failed activation or validation before first use.
    #[error("failed to create a usable pooled resource")]
    CreationFailed {
        #[source]
        source: Option<E>,
    },

    /// No idle resource was available and capacity limits prevented
    /// creating a new one. Carries the counters an operator needs to tell
    /// capacity pressure from a slow downstream resource.
    #[error("pool exhausted: {active} active, {idle} idle, {waiting} waiting")]
    Exhausted {
        active: usize,
        idle: usize,
        waiting: usize,
    },

    /// The pool has been shut down.
    #[error("pool has been shut down")]
    Stopped,

    /// The released resource is not a currently active member of this pool.
    /// Usually means the reaper already reclaimed it as leaked.
    #[error("resource is not an active member of this pool")]
    NotPooled,
}

pub type PoolResult<T, E> = Result<T, PoolError<E>>;
