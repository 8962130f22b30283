//! Resolver configuration.

use super::backoff::BackoffPolicy;
use crate::base::resolvererror::ResolverError;
use crate::dns::{GaiResolver, HickoryResolver, Resolve};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Port used for segments that do not name one.
pub const DEFAULT_PORT: u16 = 2379;

/// Which lookup backend expands hostnames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategy {
    /// getaddrinfo on the worker executor's blocking pool.
    #[default]
    System,
    /// Async hickory-dns resolver using the system name servers.
    Hickory,
}

impl LookupStrategy {
    pub fn build(self) -> Arc<dyn Resolve> {
        match self {
            LookupStrategy::System => Arc::new(GaiResolver::new()),
            LookupStrategy::Hickory => Arc::new(HickoryResolver::new()),
        }
    }
}

/// Settings of one [`NameResolver`](super::NameResolver).
///
/// # Example
///
/// ```rust,ignore
/// let config = ResolverConfig::from_json(
///     r#"{ "default_port": 50051, "backoff": { "kind": "fixed", "delay_ms": 5000 } }"#,
/// )?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub default_port: u16,
    pub backoff: BackoffPolicy,
    pub lookup: LookupStrategy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            backoff: BackoffPolicy::default(),
            lookup: LookupStrategy::default(),
        }
    }
}

impl ResolverConfig {
    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_lookup(mut self, lookup: LookupStrategy) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn validate(&self) -> Result<(), ResolverError> {
        if self.default_port == 0 {
            return Err(ResolverError::invalid_argument("invalid port 0"));
        }
        if let BackoffPolicy::Exponential {
            base_delay_ms,
            max_delay_ms,
        } = self.backoff
        {
            if base_delay_ms > max_delay_ms {
                return Err(ResolverError::invalid_argument(format!(
                    "backoff base delay {base_delay_ms}ms exceeds max delay {max_delay_ms}ms"
                )));
            }
        }
        Ok(())
    }

    /// Parses and validates a JSON document. Missing fields keep their
    /// defaults.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, ResolverError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            ResolverError::invalid_argument(format!("invalid resolver config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }
}
