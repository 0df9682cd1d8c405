//! # airssys-registry - Cross-Node Actor Name Service
//!
//! Standalone registry process for a distributed `airssys-rt` deployment:
//! an authoritative actor name -> endpoint table shared by every manager,
//! liveness tracking via heartbeats, and SSH-driven manager process control.
//!
//! Unlike `airssys-rt`'s `Manager`, the registry is not a pool of managed
//! actors: it is a single `RwLock`-guarded state table plus a decay sweeper,
//! matching the original standalone-process shape this crate is grounded on
//! (`original_source/python/actors/registry.py`).
//!
//! # Module Organization
//! - [`state`] - the shared name/heartbeat/ownership table
//! - [`sweeper`] - periodic decay sweep that cascades manager timeouts
//! - [`server`] - TCP listener and RPC dispatch
//! - [`proto`] - wire protocol (tagged JSON line protocol)
//! - [`config`] - host/manager config file for process control
//! - [`process_control`] - SSH + systemctl manager lifecycle control
//! - [`error`] - error types

pub mod config;
pub mod error;
pub mod process_control;
pub mod proto;
pub mod server;
pub mod state;
pub mod sweeper;

pub use error::{ConfigLoadError, RegistryError};
pub use server::Server;
pub use state::RegistryState;
