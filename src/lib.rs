//! # rpcresolv
//!
//! Multi-address name resolution for RPC clients.
//!
//! `rpcresolv` turns a target such as
//! `grpc://10.0.0.1:2379,10.0.0.2:2379,etcd.internal` into a list of
//! literal endpoints for a channel's load balancer, and keeps that list
//! fresh in the background.
//!
//! ## Features
//!
//! - **Address lists**: comma-separated `host-or-ip[:port]` segments with a
//!   default port, bracketed IPv6 literals
//! - **Host expansion**: hostnames expand to every address they resolve to
//!   (system getaddrinfo or hickory-dns)
//! - **Single-flight**: at most one resolution per resolver in flight
//! - **Retry**: failed lookups are retried after a fixed (default one
//!   minute) or exponential backoff
//! - **Shared executors**: all resolvers in a process share one timer
//!   thread and one worker pool, created on first use and torn down after
//!   the last resolver shuts down
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rpcresolv::client::ConnectionBuilder;
//!
//! #[tokio::main]
//! async fn main() {
//!     let connection = ConnectionBuilder::new()
//!         .uri("grpc://127.0.0.1:2379,localhost")
//!         .unwrap()
//!         .build()
//!         .unwrap();
//!
//!     let mut updates = connection.subscribe();
//!     updates.wait_for(|r| r.is_resolved()).await.unwrap();
//!     println!("Endpoints: {:?}", connection.endpoints());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error taxonomy, listener status and lifecycle state
//! - [`address`] - Target parsing and host expansion
//! - [`dns`] - Pluggable host lookup
//! - [`executor`] - Reference-counted shared executors
//! - [`resolver`] - Resolution engine, retry policy and resolver factory
//! - [`client`] - Connection builder on top of the resolver

pub mod address;
pub mod base;
pub mod client;
pub mod dns;
pub mod executor;
pub mod resolver;

pub use address::{AddressParser, EndpointToken, ResolvedEndpoint};
pub use base::{Code, ResolverError, ResolverState, Status};
pub use client::{Connection, ConnectionBuilder};
pub use executor::{ExecutorKind, ExecutorRegistry};
pub use resolver::{Listener, NameResolver, ResolverConfig, ResolverProvider};
