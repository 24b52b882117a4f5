use thiserror::Error;

/// Internal failure modes of the reservation core.
///
/// This is distinct from [`crate::result::ResCode`]: `Error` covers things
/// that should never happen on the happy path (I/O, malformed seed data,
/// poisoned locks, collaborator transport failures) and is converted into
/// the public `ResCode` at the operation boundary rather than propagated
/// to callers directly.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read seed/config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("internal lock was poisoned: {0}")]
    LockPoisoned(String),

    #[error("order store collaborator failed: {0}")]
    Store(String),

    #[error("invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
