use thiserror::Error;

/// Core error type shared across claimgen crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A record violates an internal invariant.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// An identifier or keyword does not match its expected format.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

/// Convenience alias for results returned by claimgen crates.
pub type Result<T> = std::result::Result<T, Error>;
