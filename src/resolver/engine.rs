//! Lifecycle and scheduling of a single name resolver.
//!
//! A resolver moves `Created -> Started -> ShutDown`. While started it
//! re-resolves its target on demand (`refresh`) and after failures (timer),
//! always on the shared worker executor and never more than one attempt at
//! a time. The state lock is held only to read or mutate state: lookups
//! and listener callbacks run without it.

use super::backoff::BackoffPolicy;
use super::config::ResolverConfig;
use super::listener::Listener;
use crate::address::{parse_tokens, AddressParser, EndpointToken};
use crate::base::resolvererror::ResolverError;
use crate::base::resolverstate::ResolverState;
use crate::base::status::Status;
use crate::dns::Resolve;
use crate::executor::{ExecutorHandle, ExecutorKind, ExecutorRegistry};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::task::JoinHandle;

/// Resolves one multi-address target for an RPC channel.
///
/// Created unstarted by [`ResolverProvider`](super::ResolverProvider) or
/// [`NameResolver::builder`]. Dropping the resolver shuts it down.
///
/// # Example
///
/// ```rust,ignore
/// let resolver = NameResolver::builder("10.0.0.1:2379,etcd.internal").build()?;
/// resolver.start(&listener)?;
/// // ... later, e.g. after a connection failure
/// resolver.refresh()?;
/// resolver.shutdown();
/// ```
pub struct NameResolver {
    inner: Arc<Inner>,
}

struct Inner {
    authority: String,
    tokens: Vec<EndpointToken>,
    backoff: BackoffPolicy,
    parser: AddressParser,
    registry: Arc<ExecutorRegistry>,
    shared: Mutex<Shared>,
}

#[derive(Default)]
struct Shared {
    state: ResolverState,
    resolving: bool,
    /// A retry came due while an attempt was in flight.
    rerun: bool,
    failures: u32,
    retry_seq: u64,
    retry: Option<PendingRetry>,
    listener: Option<Weak<dyn Listener>>,
    timer: Option<ExecutorHandle>,
    worker: Option<ExecutorHandle>,
}

struct PendingRetry {
    seq: u64,
    task: JoinHandle<()>,
}

impl Shared {
    fn cancel_retry(&mut self) {
        if let Some(retry) = self.retry.take() {
            retry.task.abort();
        }
    }
}

/// Builder for a [`NameResolver`].
pub struct NameResolverBuilder {
    addresses: String,
    config: ResolverConfig,
    lookup: Option<Arc<dyn Resolve>>,
    registry: Option<Arc<ExecutorRegistry>>,
}

impl NameResolverBuilder {
    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the lookup backend selected by the config.
    pub fn lookup(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.lookup = Some(resolver);
        self
    }

    /// Borrows executors from `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<ExecutorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validates the target and returns an unstarted resolver.
    ///
    /// # Errors
    ///
    /// [`ResolverError::InvalidArgument`] or [`ResolverError::InvalidPort`]
    /// for an empty or malformed address list, or an invalid config.
    pub fn build(self) -> Result<NameResolver, ResolverError> {
        self.config.validate()?;
        let tokens = parse_tokens(&self.addresses, self.config.default_port)?;
        let lookup = self.lookup.unwrap_or_else(|| self.config.lookup.build());

        Ok(NameResolver {
            inner: Arc::new(Inner {
                authority: self.addresses,
                tokens,
                backoff: self.config.backoff,
                parser: AddressParser::new(lookup),
                registry: self
                    .registry
                    .unwrap_or_else(ExecutorRegistry::global),
                shared: Mutex::new(Shared::default()),
            }),
        })
    }
}

impl NameResolver {
    /// Starts building a resolver for a comma-separated address list.
    pub fn builder(addresses: impl Into<String>) -> NameResolverBuilder {
        NameResolverBuilder {
            addresses: addresses.into(),
            config: ResolverConfig::default(),
            lookup: None,
            registry: None,
        }
    }

    /// The raw address list this resolver was built for.
    pub fn service_authority(&self) -> &str {
        &self.inner.authority
    }

    /// Parsed segments of the target, before lookup.
    pub fn tokens(&self) -> &[EndpointToken] {
        &self.inner.tokens
    }

    pub fn state(&self) -> ResolverState {
        self.inner.lock().state
    }

    /// Whether a resolution attempt is queued or running.
    pub fn is_resolving(&self) -> bool {
        self.inner.lock().resolving
    }

    /// Registers `listener` and triggers the first resolution.
    ///
    /// The resolver keeps only a weak reference; results stop being
    /// delivered once the caller drops its `Arc`.
    ///
    /// # Errors
    ///
    /// [`ResolverError::IllegalState`] if already started or shut down;
    /// [`ResolverError::ExecutorUnavailable`] if a shared executor could not
    /// be created.
    pub fn start<L: Listener + 'static>(&self, listener: &Arc<L>) -> Result<(), ResolverError> {
        let listener: Weak<L> = Arc::downgrade(listener);
        let listener: Weak<dyn Listener> = listener;
        let inner = &self.inner;
        let mut shared = inner.lock();
        match shared.state {
            ResolverState::Created => {}
            ResolverState::Started => return Err(ResolverError::IllegalState("already started")),
            ResolverState::ShutDown => return Err(ResolverError::IllegalState("already shut down")),
        }

        let timer = inner.registry.acquire(ExecutorKind::Timer)?;
        let worker = match inner.registry.acquire(ExecutorKind::Worker) {
            Ok(worker) => worker,
            Err(e) => {
                inner.release(timer);
                tracing::error!(authority = %inner.authority, error = %e, "fail to start name resolver");
                return Err(e);
            }
        };

        shared.timer = Some(timer);
        shared.worker = Some(worker);
        shared.listener = Some(listener);
        shared.state = ResolverState::Started;
        tracing::debug!(authority = %inner.authority, "name resolver started");

        inner.dispatch(&mut shared);
        Ok(())
    }

    /// Asks for a fresh resolution.
    ///
    /// A no-op while an attempt is already in flight: its result is at
    /// least as fresh as the one requested.
    ///
    /// # Errors
    ///
    /// [`ResolverError::IllegalState`] before `start` or after `shutdown`.
    pub fn refresh(&self) -> Result<(), ResolverError> {
        let mut shared = self.inner.lock();
        match shared.state {
            ResolverState::Started => {
                self.inner.dispatch(&mut shared);
                Ok(())
            }
            ResolverState::Created => Err(ResolverError::IllegalState("not started")),
            ResolverState::ShutDown => Err(ResolverError::IllegalState("already shut down")),
        }
    }

    /// Stops resolving, cancels a pending retry and releases the shared
    /// executors. Idempotent.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}

impl Drop for NameResolver {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl fmt::Debug for NameResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameResolver")
            .field("authority", &self.inner.authority)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, handle: ExecutorHandle) {
        if let Err(e) = self.registry.release(handle) {
            tracing::error!(authority = %self.authority, error = %e, "failed to release shared executor");
        }
    }

    /// Queues an attempt on the worker unless one is in flight.
    ///
    /// `resolving` is claimed here rather than when the attempt starts
    /// running, so racing triggers cannot queue two attempts.
    fn dispatch(self: &Arc<Self>, shared: &mut Shared) {
        if shared.resolving || !shared.state.is_started() {
            return;
        }
        let Some(worker) = shared.worker.as_ref() else {
            return;
        };
        shared.resolving = true;
        let inner = Arc::clone(self);
        worker.spawn(async move { inner.resolve_once().await });
    }

    async fn resolve_once(self: Arc<Self>) {
        let _resolving = ResolvingGuard(Arc::clone(&self));

        let listener = {
            let mut shared = self.lock();
            // Started by refresh() while a retry was still pending.
            shared.cancel_retry();
            if shared.state.is_shut_down() {
                return;
            }
            shared.resolving = true;
            shared.listener.clone()
        };

        let result = self.parser.expand(&self.tokens).await;

        let listener = {
            let mut shared = self.lock();
            if shared.state.is_shut_down() {
                return;
            }
            match &result {
                Ok(endpoints) => {
                    shared.failures = 0;
                    tracing::debug!(authority = %self.authority, count = endpoints.len(), "name resolution complete");
                }
                Err(e) if e.is_retryable() => self.schedule_retry(&mut shared, e),
                Err(e) => {
                    tracing::error!(authority = %self.authority, error = %e, "name resolution failed");
                }
            }
            listener.and_then(|listener| listener.upgrade())
        };

        let Some(listener) = listener else {
            tracing::debug!(authority = %self.authority, "listener dropped, discarding result");
            return;
        };
        match result {
            Ok(endpoints) => listener.on_addresses(endpoints),
            Err(e) => listener.on_error(Status::from_error(e)),
        }
    }

    /// Arms the timer for the next attempt.
    ///
    /// The timer executor has a single thread shared by every resolver in
    /// the process, so its task only hands the attempt back to the worker.
    fn schedule_retry(self: &Arc<Self>, shared: &mut Shared, cause: &ResolverError) {
        let Some(timer) = shared.timer.as_ref() else {
            return;
        };
        shared.failures = shared.failures.saturating_add(1);
        shared.retry_seq += 1;
        let delay = self.backoff.delay(shared.failures);
        let seq = shared.retry_seq;

        tracing::warn!(
            authority = %self.authority,
            error = %cause,
            failures = shared.failures,
            delay_ms = delay.as_millis() as u64,
            "name resolution failed, scheduling retry"
        );

        let inner = Arc::clone(self);
        let task = timer.spawn(async move {
            tokio::time::sleep(delay).await;
            inner.retry_due(seq);
        });
        if let Some(previous) = shared.retry.replace(PendingRetry { seq, task }) {
            previous.task.abort();
        }
    }

    fn retry_due(self: &Arc<Self>, seq: u64) {
        let mut shared = self.lock();
        if shared.retry.as_ref().is_some_and(|retry| retry.seq == seq) {
            shared.retry = None;
        }
        if shared.resolving {
            // The failed attempt is still reporting; run again once it ends.
            shared.rerun = true;
            return;
        }
        tracing::debug!(authority = %self.authority, "retrying name resolution");
        self.dispatch(&mut shared);
    }

    fn shutdown(&self) {
        let (timer, worker) = {
            let mut shared = self.lock();
            if shared.state.is_shut_down() {
                return;
            }
            shared.state = ResolverState::ShutDown;
            shared.cancel_retry();
            shared.listener = None;
            (shared.timer.take(), shared.worker.take())
        };

        for handle in [timer, worker].into_iter().flatten() {
            self.release(handle);
        }
        tracing::debug!(authority = %self.authority, "name resolver shut down");
    }
}

/// Clears `resolving` when an attempt ends, however it ends, and starts
/// the retry that came due meanwhile.
struct ResolvingGuard(Arc<Inner>);

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        let mut shared = self.0.lock();
        shared.resolving = false;
        if std::mem::take(&mut shared.rerun) {
            tracing::debug!(authority = %self.0.authority, "retrying name resolution");
            self.0.dispatch(&mut shared);
        }
    }
}
