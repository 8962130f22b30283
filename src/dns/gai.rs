//! System host lookup using getaddrinfo.
//!
//! Honors the operating system's resolver configuration (`/etc/hosts`,
//! `/etc/resolv.conf`, nsswitch). getaddrinfo blocks, so every lookup is
//! moved onto the blocking pool of the executor the caller runs on.

use super::resolve::unique_addrs;
use super::{Addrs, Name, Resolve, Resolving};
use crate::base::context::IoResultExt;
use crate::base::resolvererror::ResolverError;
use std::io;
use std::net::{IpAddr, ToSocketAddrs};

/// System resolver.
///
/// Must be polled from inside a Tokio runtime; the resolution engine
/// always polls it on the shared worker executor, whose blocking pool
/// absorbs slow lookups.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    pub fn new() -> Self {
        GaiResolver
    }
}

fn getaddrinfo(host: &str) -> io::Result<Vec<IpAddr>> {
    Ok((host, 0).to_socket_addrs()?.map(|addr| addr.ip()).collect())
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let lookup_name = name.clone();
            let ips = tokio::task::spawn_blocking(move || getaddrinfo(lookup_name.as_str()))
                .await
                .map_err(|join| {
                    tracing::error!(host = %name, error = %join, "getaddrinfo task did not complete");
                    ResolverError::host_unresolvable(
                        name.as_str(),
                        io::Error::new(io::ErrorKind::Interrupted, join.to_string()),
                    )
                })?
                .dns_context(name.as_str())
                .inspect_err(|e| tracing::debug!(host = %name, error = %e, "getaddrinfo failed"))?;

            let addrs = unique_addrs(ips);
            if addrs.is_empty() {
                return Err(ResolverError::no_addresses(name.as_str()));
            }
            tracing::debug!(host = %name, count = addrs.len(), "getaddrinfo answered");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}
