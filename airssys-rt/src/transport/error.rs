//! Error types for the wire codec and point-to-point transport.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// Errors from encoding/decoding a [`super::wire::WireRecord`] or maintaining
/// the process-wide kind registry (spec.md §4.4).
#[derive(Debug, Error)]
pub enum WireError {
    /// The payload could not be serialized to the wire format.
    #[error("failed to encode message: {0}")]
    Encode(String),

    /// A received line could not be parsed as a `WireRecord`, or its
    /// `message` field could not be decoded as the expected payload type.
    #[error("failed to decode message: {0}")]
    Decode(String),

    /// [`super::wire::KindRegistryBuilder::register`] was called twice for
    /// the same `Message::MESSAGE_TYPE`.
    #[error("duplicate message kind registered: {0}")]
    DuplicateKind(&'static str),
}

/// Errors from the point-to-point remote sender (spec.md §4.5).
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connect to `endpoint` failed.
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        source: String,
    },

    /// Writing a frame to an established connection failed.
    #[error("write to {endpoint} failed: {source}")]
    Write {
        endpoint: String,
        source: String,
    },

    /// `fast_send` was attempted against a `RemoteRef` (spec.md §4.1: remote
    /// fast_send is out of scope, fails synchronously rather than silently
    /// degrading to fire-and-forget).
    #[error("fast_send is not supported across a remote actor reference")]
    Unsupported,

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl TransportError {
    /// Whether retrying the same operation might succeed (connection churn,
    /// not a programmer error).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Write { .. })
    }
}
