//! Async host lookup using hickory-dns.
//!
//! Fully async alternative to [`GaiResolver`](super::GaiResolver): no
//! blocking-pool thread per lookup, A and AAAA queried together.

use super::resolve::unique_addrs;
use super::{Addrs, Name, Resolve, Resolving};
use crate::base::resolvererror::ResolverError;
use hickory_resolver::config::{LookupIpStrategy, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::fmt;
use std::io;
use std::sync::{Arc, OnceLock};

/// Async resolver backed by hickory-dns.
///
/// The hickory resolver is built on the first lookup and shared by clones
/// of this value. It is not process-global: name-server connections are
/// bound to the worker executor, which is torn down when its last holder
/// releases it.
#[derive(Clone, Default)]
pub struct HickoryResolver {
    cell: Arc<OnceLock<TokioResolver>>,
}

impl HickoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn system_or_default() -> TokioResolver {
        let mut builder = TokioResolver::builder_tokio().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "system resolv.conf unreadable, using hickory defaults");
            TokioResolver::builder_with_config(
                ResolverConfig::default(),
                TokioConnectionProvider::default(),
            )
        });
        builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        builder.build()
    }
}

impl fmt::Debug for HickoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HickoryResolver")
            .field("built", &self.cell.get().is_some())
            .finish()
    }
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let cell = Arc::clone(&self.cell);
        Box::pin(async move {
            let resolver = cell.get_or_init(Self::system_or_default);
            let answer = resolver.lookup_ip(name.as_str()).await.map_err(|e| {
                tracing::debug!(host = %name, error = %e, "hickory lookup failed");
                ResolverError::host_unresolvable(
                    name.as_str(),
                    io::Error::new(io::ErrorKind::NotFound, e.to_string()),
                )
            })?;

            let addrs = unique_addrs(answer.iter());
            if addrs.is_empty() {
                return Err(ResolverError::no_addresses(name.as_str()));
            }
            tracing::debug!(host = %name, count = addrs.len(), "hickory answered");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}
