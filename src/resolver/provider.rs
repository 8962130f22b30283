//! Resolver factory for `grpc://` targets.

use super::config::ResolverConfig;
use super::engine::NameResolver;
use crate::base::resolvererror::ResolverError;
use crate::dns::Resolve;
use crate::executor::ExecutorRegistry;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Scheme claimed by [`ResolverProvider`].
pub const GRPC_SCHEME: &str = "grpc";

/// A channel target split into scheme, authority and path.
///
/// Unlike a URL parser this does not interpret the authority: for
/// `grpc://10.0.0.1:2379,10.0.0.2:2379` the whole address list is the
/// authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUri {
    scheme: String,
    authority: Option<String>,
    path: String,
}

impl TargetUri {
    /// # Errors
    ///
    /// [`ResolverError::InvalidArgument`] if the text has no scheme or the
    /// scheme contains characters outside `[A-Za-z0-9+.-]`.
    pub fn parse(target: &str) -> Result<Self, ResolverError> {
        let target = target.trim();
        let (scheme, rest) = target.split_once(':').ok_or_else(|| {
            ResolverError::invalid_argument(format!("uri is not a valid URI: uri={target}"))
        })?;

        let valid_scheme = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(ResolverError::invalid_argument(format!(
                "uri has an invalid scheme: uri={target}"
            )));
        }

        let (authority, path) = match rest.strip_prefix("//") {
            Some(hier) => {
                let end = hier.find(['/', '?', '#']).unwrap_or(hier.len());
                let (authority, path) = hier.split_at(end);
                let authority = (!authority.is_empty()).then(|| authority.to_string());
                (authority, path.to_string())
            }
            None => (None, rest.to_string()),
        };

        Ok(Self {
            scheme: scheme.to_string(),
            authority,
            path,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Raw authority text, `None` when absent or empty.
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl FromStr for TargetUri {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.authority {
            Some(authority) => write!(f, "{}://{}{}", self.scheme, authority, self.path),
            None => write!(f, "{}:{}", self.scheme, self.path),
        }
    }
}

/// Builds [`NameResolver`]s for `grpc://` targets.
///
/// The channel offers every target to each registered provider in
/// priority order; this one declines targets of any other scheme so that
/// another provider can claim them.
#[derive(Clone)]
pub struct ResolverProvider {
    config: ResolverConfig,
    lookup: Option<Arc<dyn Resolve>>,
    registry: Arc<ExecutorRegistry>,
}

impl Default for ResolverProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverProvider {
    pub fn new() -> Self {
        Self {
            config: ResolverConfig::default(),
            lookup: None,
            registry: ExecutorRegistry::global(),
        }
    }

    /// Resolvers built by this provider use `config`. Registry and lookup
    /// are kept.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolvers built by this provider borrow executors from `registry`.
    pub fn with_registry(mut self, registry: Arc<ExecutorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Resolvers built by this provider look hosts up through `resolver`.
    pub fn with_lookup(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.lookup = Some(resolver);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn scheme(&self) -> &'static str {
        GRPC_SCHEME
    }

    pub fn default_scheme(&self) -> &'static str {
        GRPC_SCHEME
    }

    pub fn is_available(&self) -> bool {
        true
    }

    /// Rank among providers claiming the same scheme (0-10, higher wins).
    pub fn priority(&self) -> u8 {
        5
    }

    /// Builds an unstarted resolver for `target`.
    ///
    /// Returns `Ok(None)` when the scheme is not `grpc`. The caller owns
    /// the resolver's lifecycle (`start`, `refresh`, `shutdown`).
    ///
    /// # Errors
    ///
    /// [`ResolverError::InvalidArgument`] if the target has no authority or
    /// its address list is malformed.
    pub fn new_resolver(&self, target: &TargetUri) -> Result<Option<NameResolver>, ResolverError> {
        if !target.scheme().eq_ignore_ascii_case(GRPC_SCHEME) {
            return Ok(None);
        }

        let authority = target
            .authority()
            .ok_or_else(|| ResolverError::invalid_argument("uri content should not be empty"))?;

        let mut builder = NameResolver::builder(authority)
            .config(self.config.clone())
            .registry(Arc::clone(&self.registry));
        if let Some(lookup) = &self.lookup {
            builder = builder.lookup(Arc::clone(lookup));
        }
        let resolver = builder.build()?;

        tracing::info!(target = %target, "grpc name resolver is activated");
        Ok(Some(resolver))
    }
}

impl fmt::Debug for ResolverProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverProvider")
            .field("scheme", &GRPC_SCHEME)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
