//! Error type for [`super::ActorRef`] operations.

// Layer 1: Standard library imports
use std::error::Error as StdError;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::transport::TransportError;

/// Errors from sending through an [`super::ActorRef`].
///
/// Generic over the broker's own error type so a `Local` ref surfaces the
/// same errors the broker would (`BrokerError::ActorNotFound`, etc.)
/// without this module depending on a concrete broker implementation.
#[derive(Debug, Error)]
pub enum ActorRefError<E: StdError + Send + Sync + 'static> {
    /// The underlying broker failed to route the message.
    #[error(transparent)]
    Broker(E),

    /// The wire transport failed (connect/write, or an unsupported
    /// operation like `fast_send` across a `Remote` ref).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The target actor's mailbox closed its reply channel without ever
    /// calling `reply()` (handler returned, or crashed, without replying).
    #[error("fast_send got no reply before the mailbox closed")]
    NoReply,
}
