use std::time::Duration;

/// Boxed error returned by host-supplied collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the panel.
///
/// Lookups that miss (unknown family, unknown node) are not errors; they resolve
/// to `false`, `None` or a no-op.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host's filter predicate failed; the tree was left untouched.
    #[error("intention filter query failed: {0}")]
    Filter(#[source] BoxError),
    /// Pending intention requests did not settle before the configured timeout.
    #[error("pending intention requests did not settle within {0:?}")]
    PendingTimeout(Duration),
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
