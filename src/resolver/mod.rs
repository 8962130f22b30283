//! Name resolution engine.
//!
//! A [`NameResolver`] turns one multi-address target into a stream of
//! endpoint lists delivered to a [`Listener`]:
//! - resolution runs on the shared worker executor, never on the caller
//! - at most one attempt per resolver is in flight at a time
//! - failed lookups are retried after a [`BackoffPolicy`] delay, scheduled
//!   on the shared timer executor
//!
//! [`ResolverProvider`] is the entry point an RPC channel uses: it claims
//! `grpc://` targets and builds unstarted resolvers for them.

mod backoff;
mod config;
mod engine;
mod listener;
mod provider;

pub use backoff::{calculate_backoff, BackoffPolicy};
pub use config::{LookupStrategy, ResolverConfig, DEFAULT_PORT};
pub use engine::{NameResolver, NameResolverBuilder};
pub use listener::Listener;
pub use provider::{ResolverProvider, TargetUri, GRPC_SCHEME};
