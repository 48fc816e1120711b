//! Pool configuration options

use std::time::Duration;

/// What `acquire` does when the pool is exhausted: no idle resource is
/// available and `max_active` forbids creating another one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustedAction {
    /// Create a new resource anyway. Treats `max_active` as a soft limit.
    Grow,

    /// Fail immediately with [`PoolError::Exhausted`](crate::PoolError::Exhausted).
    Fail,

    /// Wait until a resource is released, bounded by `max_wait`.
    #[default]
    Block,
}

/// Configuration for pool behavior.
///
/// The configuration is immutable once the pool is constructed; the only
/// way to change it afterwards is
/// [`ResourcePool::reconfigure`](crate::ResourcePool::reconfigure), which
/// swaps the whole value under the pool lock.
///
/// # Examples
///
/// ```
/// use lendpool::{ExhaustedAction, PoolConfig};
/// use std::time::Duration;
///
/// let config = PoolConfig::new()
///     .with_max_active(50)
///     .with_max_idle(10)
///     .with_exhausted_action(ExhaustedAction::Block)
///     .with_max_wait(Duration::from_secs(5));
///
/// assert_eq!(config.max_active, Some(50));
/// assert_eq!(config.max_idle, Some(10));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Maximum number of idle resources kept in the pool. A release that
    /// would overflow this bound destroys the resource instead.
    /// `None` means unbounded.
    pub max_idle: Option<usize>,

    /// How long a resource may sit idle before the reaper evicts it.
    /// Also the leak threshold: an active resource untouched for longer
    /// than this is force-reclaimed. `None` disables both.
    pub max_idle_time: Option<Duration>,

    /// Maximum number of resources lent out or being created at once.
    /// `None` means unbounded.
    pub max_active: Option<usize>,

    /// How long a blocked `acquire` waits under [`ExhaustedAction::Block`].
    /// `None` waits forever.
    pub max_wait: Option<Duration>,

    /// Total lifetime bound for a resource, counted from creation.
    /// `None` means unbounded.
    pub max_life_time: Option<Duration>,

    /// What `acquire` does when the pool is exhausted.
    pub exhausted_action: ExhaustedAction,

    /// Run a validation probe on every resource before handing it out.
    pub validate_on_activate: bool,

    /// Run a validation probe instead of plain deactivation when a
    /// resource is released.
    pub validate_on_deactivate: bool,

    /// Have the reaper opportunistically validate idle resources.
    pub validate_on_idle: bool,

    /// Record the owning thread and a backtrace for every lent resource,
    /// for leak diagnostics. Has a cost; off by default.
    pub track_ownership: bool,

    /// Pass the force-validity flag to `activate` on every acquire.
    pub always_validate_on_activate: bool,

    /// How often the background reaper sweeps the pool.
    pub reap_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle: None,
            max_idle_time: None,
            max_active: None,
            max_wait: None,
            max_life_time: None,
            exhausted_action: ExhaustedAction::default(),
            validate_on_activate: false,
            validate_on_deactivate: false,
            validate_on_idle: false,
            track_ownership: false,
            always_validate_on_activate: false,
            reap_interval: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of idle resources.
    pub fn with_max_idle(mut self, max: usize) -> Self {
        self.max_idle = Some(max);
        self
    }

    /// Set the idle timeout (and leak threshold).
    ///
    /// # Examples
    ///
    /// ```
    /// use lendpool::PoolConfig;
    /// use std::time::Duration;
    ///
    /// let config = PoolConfig::new().with_max_idle_time(Duration::from_secs(300));
    /// assert_eq!(config.max_idle_time, Some(Duration::from_secs(300)));
    /// ```
    pub fn with_max_idle_time(mut self, timeout: Duration) -> Self {
        self.max_idle_time = Some(timeout);
        self
    }

    /// Set the maximum number of simultaneously active resources.
    pub fn with_max_active(mut self, max: usize) -> Self {
        self.max_active = Some(max);
        self
    }

    /// Bound how long a blocked `acquire` waits.
    pub fn with_max_wait(mut self, timeout: Duration) -> Self {
        self.max_wait = Some(timeout);
        self
    }

    /// Set the total lifetime bound for resources.
    pub fn with_max_life_time(mut self, lifetime: Duration) -> Self {
        self.max_life_time = Some(lifetime);
        self
    }

    /// Set the exhaustion policy.
    pub fn with_exhausted_action(mut self, action: ExhaustedAction) -> Self {
        self.exhausted_action = action;
        self
    }

    /// Validate resources before handing them out.
    pub fn with_validate_on_activate(mut self) -> Self {
        self.validate_on_activate = true;
        self
    }

    /// Validate resources when they are released.
    pub fn with_validate_on_deactivate(mut self) -> Self {
        self.validate_on_deactivate = true;
        self
    }

    /// Validate idle resources during reaper sweeps.
    pub fn with_validate_on_idle(mut self) -> Self {
        self.validate_on_idle = true;
        self
    }

    /// Track owning threads and capture acquire backtraces for leak
    /// diagnostics.
    pub fn with_ownership_tracking(mut self) -> Self {
        self.track_ownership = true;
        self
    }

    /// Force a validity check inside `activate` on every acquire.
    pub fn with_always_validate_on_activate(mut self) -> Self {
        self.always_validate_on_activate = true;
        self
    }

    /// Set the reaper sweep interval.
    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unbounded() {
        let config = PoolConfig::default();
        assert_eq!(config.max_idle, None);
        assert_eq!(config.max_active, None);
        assert_eq!(config.max_wait, None);
        assert_eq!(config.max_life_time, None);
        assert_eq!(config.exhausted_action, ExhaustedAction::Block);
        assert!(!config.validate_on_activate);
        assert!(!config.track_ownership);
    }

    #[test]
    fn builder_sets_fields() {
        let config = PoolConfig::new()
            .with_max_active(4)
            .with_max_idle(2)
            .with_max_wait(Duration::from_millis(250))
            .with_max_life_time(Duration::from_secs(60))
            .with_exhausted_action(ExhaustedAction::Fail)
            .with_validate_on_activate()
            .with_validate_on_deactivate()
            .with_validate_on_idle()
            .with_ownership_tracking()
            .with_always_validate_on_activate()
            .with_reap_interval(Duration::from_secs(5));

        assert_eq!(config.max_active, Some(4));
        assert_eq!(config.max_idle, Some(2));
        assert_eq!(config.max_wait, Some(Duration::from_millis(250)));
        assert_eq!(config.max_life_time, Some(Duration::from_secs(60)));
        assert_eq!(config.exhausted_action, ExhaustedAction::Fail);
        assert!(config.validate_on_activate);
        assert!(config.validate_on_deactivate);
        assert!(config.validate_on_idle);
        assert!(config.track_ownership);
        assert!(config.always_validate_on_activate);
        assert_eq!(config.reap_interval, Duration::from_secs(5));
    }
}
