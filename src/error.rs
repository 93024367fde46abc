use std::fmt;

/// Crate-wide result alias, used throughout the public API.
pub type CoreResult<T> = std::result::Result<T, Error>;

/// Error taxonomy for the core engine.
///
/// `Rollback` is deliberately not a member of this enum: it is an internal
/// signal raised by [`crate::store::Store::write`] and caught only by
/// [`crate::transaction::Transaction::run`] (see `Outcome` in `store.rs`).
/// It never reaches a caller of the public API.
#[derive(Debug)]
pub enum Error {
    /// A transaction's program referenced a key that was never read into its
    /// cache, divided by zero, or otherwise violated an instruction
    /// precondition. Fatal for the attempt; the transaction is not restarted.
    ProgramError(String),

    /// A transaction exceeded its configured restart cap.
    Starvation { txid: u64, attempts: u32 },

    /// A Store invariant check failed (e.g. non-monotonic `wts` observed).
    /// Process-level: callers should treat this as unrecoverable.
    InvariantViolation(String),

    /// Wraps lower-level failures, such as a poisoned mutex.
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ProgramError(msg) => write!(f, "malformed transaction program: {}", msg),
            Error::Starvation { txid, attempts } => {
                write!(f, "transaction {} did not commit after {} attempts", txid, attempts)
            }
            Error::InvariantViolation(msg) => write!(f, "store invariant violated: {}", msg),
            Error::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Error::Internal(format!("poisoned lock: {}", err))
    }
}
