//! Error type for [`super::RegistryClient`] operations.

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors from talking to the global registry (spec.md §4.6).
#[derive(Debug, Error)]
pub enum RegistryClientError {
    /// `register` was rejected because the name was already taken.
    #[error("actor name already registered: {0}")]
    AlreadyRegistered(String),

    /// `lookup` found no entry for the name.
    #[error("no registry entry for actor: {0}")]
    NotFound(String),

    /// `lookup` found an entry but its owning manager has decayed.
    #[error("actor entry is offline: {0}")]
    Offline(String),

    /// No reply arrived within the RPC deadline.
    #[error("registry RPC timed out")]
    Timeout,

    /// Connecting to the registry endpoint failed.
    #[error("connect to registry {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// Writing or reading a frame on an established connection failed.
    #[error("registry connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A reply could not be encoded/decoded, or the registry closed the
    /// connection before replying.
    #[error("registry protocol error: {0}")]
    Protocol(String),
}
