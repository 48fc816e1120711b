//! # lendpool
//!
//! Thread-safe, bounded pooling of expensive-to-create resources such as
//! database connections.
//!
//! ## Features
//!
//! - Lending and reclaiming through an RAII guard (automatic return on drop)
//! - Resource-agnostic: everything specific to the resource goes through
//!   a single [`ResourceLifecycle`] contract
//! - Capacity and lifetime limits with configurable exhaustion behavior
//!   (grow, fail, or block with a bounded wait)
//! - Activation/validation probes at the lending boundaries; broken
//!   resources are destroyed and replaced transparently
//! - Background [`Reaper`] that evicts stale idle resources and reclaims
//!   leaked active ones, with ownership tracking for diagnostics
//! - Rolling use-time statistics (max/min over the last 1000 borrows)
//!
//! ## Quick Start
//!
//! ```rust
//! use lendpool::{PoolConfig, ResourceLifecycle, ResourcePool};
//!
//! struct Conn;
//! struct ConnLifecycle;
//!
//! impl ResourceLifecycle for ConnLifecycle {
//!     type Resource = Conn;
//!     type Error = std::io::Error;
//!
//!     fn create(&self) -> Result<Conn, Self::Error> {
//!         Ok(Conn)
//!     }
//!
//!     fn destroy(&self, _conn: Conn) {}
//! }
//!
//! let pool = ResourcePool::new(ConnLifecycle, PoolConfig::new().with_max_active(16));
//! {
//!     let conn = pool.acquire().unwrap();
//!     // use the connection; it returns to the pool when dropped
//! }
//! assert_eq!(pool.num_idle(), 1);
//! ```

mod config;
mod entry;
mod errors;
mod lifecycle;
mod pool;
mod reaper;
mod state;
mod stats;
#[cfg(test)]
pub(crate) mod test_util;

pub use config::{ExhaustedAction, PoolConfig};
pub use errors::{PoolError, PoolResult};
pub use lifecycle::ResourceLifecycle;
pub use pool::{PoolStatus, PooledResource, ResourcePool};
pub use reaper::Reaper;
