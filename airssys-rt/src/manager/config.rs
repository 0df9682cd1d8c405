//! Manager configuration with sensible defaults (mirrors `system::SystemConfig`).

// Layer 1: Standard library
use std::time::Duration;

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

/// Default mailbox capacity hint for manager-owned actors (unbounded
/// mailboxes don't enforce this, but it seeds metrics/monitoring baselines).
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1000;

/// Default bound on how long `end()` waits for a single worker to join
/// before abandoning it (spec.md §5 "≈2s").
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Default timeout for the registry client's `register`/`lookup` RPCs.
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a [`super::Manager`].
///
/// # Examples
///
/// ```rust
/// use airssys_rt::manager::ManagerConfig;
/// use std::time::Duration;
///
/// let config = ManagerConfig::builder()
///     .with_endpoint("127.0.0.1:7000")
///     .with_join_timeout(Duration::from_secs(1))
///     .build()
///     .unwrap();
/// assert_eq!(config.endpoint.as_deref(), Some("127.0.0.1:7000"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Opaque manager id used when registering actors with the global
    /// registry (spec.md §3 "Manager IDs are opaque strings").
    pub id: Option<String>,

    /// Listen address for the remote receiver. `None` means this manager
    /// never accepts inbound wire traffic (local-only).
    pub endpoint: Option<String>,

    /// Address of the global registry, if this manager registers its
    /// actors there (spec.md §4.6).
    pub registry_endpoint: Option<String>,

    /// Bound on `end()`'s per-worker join wait.
    #[serde(with = "crate::util::duration_serde")]
    pub join_timeout: Duration,

    /// Timeout for registry client RPCs.
    #[serde(with = "crate::util::duration_serde")]
    pub registry_timeout: Duration,
}

impl ManagerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ManagerConfigBuilder {
        ManagerConfigBuilder::default()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.join_timeout.is_zero() {
            return Err("join_timeout must be > 0".to_string());
        }
        if self.registry_timeout.is_zero() {
            return Err("registry_timeout must be > 0".to_string());
        }
        if self.registry_endpoint.is_some() && self.id.is_none() {
            return Err("id is required when registry_endpoint is set".to_string());
        }
        Ok(())
    }
}

/// Builder for [`ManagerConfig`] with a fluent API.
#[derive(Debug, Default)]
pub struct ManagerConfigBuilder {
    config: Config,
}

/// Intermediate config shape carrying defaults until `build()`.
#[derive(Debug, Clone)]
struct Config {
    id: Option<String>,
    endpoint: Option<String>,
    registry_endpoint: Option<String>,
    join_timeout: Duration,
    registry_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: None,
            endpoint: None,
            registry_endpoint: None,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            registry_timeout: DEFAULT_REGISTRY_TIMEOUT,
        }
    }
}

impl ManagerConfigBuilder {
    /// Set this manager's opaque id (required if registering with a registry).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.config.id = Some(id.into());
        self
    }

    /// Set the listen address for the remote receiver.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Set the global registry's address.
    pub fn with_registry_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.registry_endpoint = Some(endpoint.into());
        self
    }

    /// Set the per-worker join timeout used by `end()`.
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.config.join_timeout = timeout;
        self
    }

    /// Set the registry client RPC timeout.
    pub fn with_registry_timeout(mut self, timeout: Duration) -> Self {
        self.config.registry_timeout = timeout;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ManagerConfig, String> {
        let config = ManagerConfig {
            id: self.config.id,
            endpoint: self.config.endpoint,
            registry_endpoint: self.config.registry_endpoint,
            join_timeout: self.config.join_timeout,
            registry_timeout: self.config.registry_timeout,
        };
        config.validate()?;
        Ok(config)
    }
}
