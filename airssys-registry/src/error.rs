//! Error types for the registry server and CLI.

// Layer 1: Standard library imports
use std::io;

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Failures from the registry server's own operation (as opposed to a
/// single RPC's outcome, which is reported back to the caller as a reply
/// rather than raised here).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to bind the RPC listener to the requested address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// A connection-level I/O error while serving an already-accepted peer.
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    /// A request line could not be decoded.
    #[error("malformed request: {0}")]
    Decode(String),

    /// The config file could not be read or parsed.
    #[error("failed to load config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: ConfigLoadError,
    },
}

/// Why a config file failed to load. Kept distinct from [`RegistryError`]
/// so [`crate::config::load`] can be unit tested without constructing the
/// wrapping `path` context.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("could not read file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
