//! Error type for [`super::Manager`] operations.

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors from managing actors and driving their lifecycle (spec.md §4.3).
#[derive(Debug, Error)]
pub enum ManagerError {
    /// `manage(name, ...)` was called with a name already in use.
    #[error("actor name already in use: {0}")]
    NameInUse(String),

    /// `manage` was called after `init()`.
    #[error("manager already initialized, cannot manage new actors")]
    AlreadyInitialized,

    /// `init()` was called more than once.
    #[error("manager already initialized")]
    InitTwice,

    /// An operation that requires `init()` was called before it.
    #[error("manager not yet initialized")]
    NotInitialized,

    /// No actor is registered under this name.
    #[error("no actor managed under name: {0}")]
    ActorNotFound(String),

    /// The manager was configured with a remote endpoint but the listener
    /// could not be bound.
    #[error("failed to bind endpoint {endpoint}: {source}")]
    BindFailed {
        /// The endpoint that failed to bind.
        endpoint: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manager has already been shut down; further sends are rejected
    /// (spec.md §4.3 S6: "sends to them... raise `ManagerStopped`").
    #[error("manager has been shut down")]
    Stopped,

    /// Configuration was invalid at construction time.
    #[error("invalid manager configuration: {0}")]
    InvalidConfig(String),
}
