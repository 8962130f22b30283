//! Connection builder.
//!
//! The boundary an RPC channel sits on: validates a `grpc://` target,
//! starts a [`NameResolver`] for it and publishes the latest endpoints.
//! Opening transports to those endpoints is the channel's business.
//!
//! # Example
//!
//! ```rust,ignore
//! use rpcresolv::client::ConnectionBuilder;
//!
//! let connection = ConnectionBuilder::new()
//!     .uri("grpc://10.0.0.1:2379,10.0.0.2:2379,etcd.internal")?
//!     .build()?;
//!
//! let mut updates = connection.subscribe();
//! updates.wait_for(|r| r.is_resolved()).await?;
//! println!("endpoints: {:?}", connection.endpoints());
//! ```

use crate::address::ResolvedEndpoint;
use crate::base::resolvererror::ResolverError;
use crate::base::resolverstate::ResolverState;
use crate::base::status::Status;
use crate::dns::Resolve;
use crate::executor::ExecutorRegistry;
use crate::resolver::{
    Listener, NameResolver, ResolverConfig, ResolverProvider, TargetUri, GRPC_SCHEME,
};
use std::sync::Arc;
use tokio::sync::watch;

/// Latest resolution outcome of a [`Connection`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Endpoints of the last successful resolution. Kept across failures.
    pub endpoints: Vec<ResolvedEndpoint>,
    /// Error of the last attempt, cleared by the next success.
    pub last_error: Option<Status>,
    /// Number of successful resolutions so far.
    pub generation: u64,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.generation > 0
    }
}

/// Listener publishing every result into a watch channel.
#[derive(Debug)]
pub struct EndpointWatcher {
    tx: watch::Sender<Resolution>,
}

impl Default for EndpointWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointWatcher {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Resolution::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Resolution> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Resolution {
        self.tx.borrow().clone()
    }
}

impl Listener for EndpointWatcher {
    fn on_addresses(&self, endpoints: Vec<ResolvedEndpoint>) {
        self.tx.send_modify(|resolution| {
            resolution.endpoints = endpoints;
            resolution.last_error = None;
            resolution.generation += 1;
        });
    }

    fn on_error(&self, status: Status) {
        tracing::warn!(status = %status, "name resolution reported an error");
        self.tx.send_modify(|resolution| resolution.last_error = Some(status));
    }
}

/// Builder for a [`Connection`].
#[derive(Debug, Default)]
pub struct ConnectionBuilder {
    uri: Option<TargetUri>,
    provider: ResolverProvider,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target.
    ///
    /// # Errors
    ///
    /// [`ResolverError::InvalidArgument`] if `uri` is empty, not a URI, or
    /// its scheme is not `grpc`.
    pub fn uri(mut self, uri: impl AsRef<str>) -> Result<Self, ResolverError> {
        let uri = uri.as_ref();
        if uri.trim().is_empty() {
            return Err(ResolverError::invalid_argument(
                "uri should not be null or empty",
            ));
        }
        let target = TargetUri::parse(uri)?;
        if !target.scheme().eq_ignore_ascii_case(GRPC_SCHEME) {
            return Err(ResolverError::invalid_argument(format!(
                "Scheme of uri should be '{GRPC_SCHEME}': uri={uri}"
            )));
        }
        self.uri = Some(target);
        Ok(self)
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.provider = self.provider.with_config(config);
        self
    }

    pub fn provider(mut self, provider: ResolverProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn registry(mut self, registry: Arc<ExecutorRegistry>) -> Self {
        self.provider = self.provider.with_registry(registry);
        self
    }

    pub fn lookup(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.provider = self.provider.with_lookup(resolver);
        self
    }

    /// Starts resolving the target.
    ///
    /// # Errors
    ///
    /// [`ResolverError::IllegalState`] if no uri was set; any error from
    /// building or starting the resolver.
    pub fn build(self) -> Result<Connection, ResolverError> {
        let target = self
            .uri
            .ok_or(ResolverError::IllegalState("please set uri before build"))?;
        let resolver = self.provider.new_resolver(&target)?.ok_or_else(|| {
            ResolverError::invalid_argument(format!("no resolver for target {target}"))
        })?;

        let watcher = Arc::new(EndpointWatcher::new());
        resolver.start(&watcher)?;

        Ok(Connection {
            target,
            resolver,
            watcher,
        })
    }
}

/// A started resolver plus the endpoints it last produced.
///
/// Dropping the connection shuts the resolver down.
#[derive(Debug)]
pub struct Connection {
    target: TargetUri,
    resolver: NameResolver,
    watcher: Arc<EndpointWatcher>,
}

impl Connection {
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    pub fn target(&self) -> &TargetUri {
        &self.target
    }

    pub fn endpoints(&self) -> Vec<ResolvedEndpoint> {
        self.watcher.current().endpoints
    }

    pub fn resolution(&self) -> Resolution {
        self.watcher.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Resolution> {
        self.watcher.subscribe()
    }

    pub fn state(&self) -> ResolverState {
        self.resolver.state()
    }

    /// Re-resolves the target, e.g. after every endpoint failed.
    pub fn refresh(&self) -> Result<(), ResolverError> {
        self.resolver.refresh()
    }

    pub fn shutdown(&self) {
        self.resolver.shutdown();
    }
}
