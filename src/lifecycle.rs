//! The contract between the pool and the owner of the pooled resource

/// Creation, validation, and destruction hooks for one kind of pooled
/// resource.
///
/// The pool never embeds resource-specific logic; everything it needs to
/// know about a resource goes through an implementation of this trait.
/// All hooks may block (for example on network I/O) — the pool guarantees
/// it never calls them while holding its internal lock.
///
/// # Examples
///
/// ```
/// use lendpool::ResourceLifecycle;
///
/// struct Conn {
///     alive: bool,
/// }
///
/// struct ConnLifecycle;
///
/// impl ResourceLifecycle for ConnLifecycle {
///     type Resource = Conn;
///     type Error = std::io::Error;
///
///     fn create(&self) -> Result<Conn, Self::Error> {
///         Ok(Conn { alive: true })
///     }
///
///     fn destroy(&self, _conn: Conn) {
///         // close sockets, free handles; best effort
///     }
///
///     fn validate(&self, conn: &mut Conn, _on_activate: bool) -> bool {
///         conn.alive
///     }
/// }
/// ```
pub trait ResourceLifecycle: Send + Sync + 'static {
    /// The type of resource this lifecycle manages.
    type Resource: Send + 'static;

    /// The error returned when resource construction fails.
    type Error: std::error::Error + Send + 'static;

    /// Creates a new resource.
    fn create(&self) -> Result<Self::Resource, Self::Error>;

    /// Destroys a resource. Best effort; must not panic on a resource
    /// that is already unusable.
    fn destroy(&self, resource: Self::Resource);

    /// Prepares a resource for use by a caller. Returning `false` marks
    /// the resource broken and it will be destroyed.
    ///
    /// `force_validity_check` is set when the pool is configured to
    /// always verify liveness on activation.
    fn activate(&self, resource: &mut Self::Resource, force_validity_check: bool) -> bool {
        let _ = (resource, force_validity_check);
        true
    }

    /// Checks that a resource is still live. `on_activate` distinguishes
    /// a pre-use probe (`true`) from a pre-return probe (`false`) so
    /// implementations can apply different checks.
    fn validate(&self, resource: &mut Self::Resource, on_activate: bool) -> bool {
        let _ = (resource, on_activate);
        true
    }

    /// Prepares a resource to go back to the idle stack. Returning
    /// `false` marks it broken and forces destruction.
    fn deactivate(&self, resource: &mut Self::Resource) -> bool {
        let _ = resource;
        true
    }

    /// A human-readable label used only in diagnostic messages.
    fn describe(&self) -> String {
        std::any::type_name::<Self::Resource>().to_string()
    }
}
