//! Host lookup.
//!
//! Expands hostname segments of a target into literal addresses. Provides:
//! - System resolver (getaddrinfo on the executor's blocking pool)
//! - Async hickory-dns resolver
//! - A static hosts table, optionally in front of either of them
//!
//! The [`Resolve`] trait is the seam the address parser looks hosts up
//! through, so tests and embedders can substitute their own lookup.
//!
//! # Example
//!
//! ```rust,ignore
//! use rpcresolv::dns::{GaiResolver, Name, Resolve};
//!
//! let resolver = GaiResolver::new();
//! let addrs = resolver.resolve(Name::new("etcd.internal")).await?;
//! for addr in addrs {
//!     println!("Resolved: {}", addr.ip());
//! }
//! ```

mod gai;
mod hickory;
mod resolve;

pub use gai::GaiResolver;
pub use hickory::HickoryResolver;
pub use resolve::{Addrs, Name, Resolve, Resolving, StaticHosts};
