//! Core lookup types and traits.

use crate::base::resolvererror::ResolverError;
use std::collections::HashMap;
use std::future::{self, Future};
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::{fmt, io};

/// A hostname taken from one segment of a target.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Name(Arc<str>);

impl Name {
    pub fn new(host: impl AsRef<str>) -> Self {
        Self(Arc::from(host.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(host: &str) -> Self {
        Name::new(host)
    }
}

impl From<String> for Name {
    fn from(host: String) -> Self {
        Self(Arc::from(host))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Addresses produced by one lookup.
pub type Addrs = Box<dyn Iterator<Item = SocketAddr> + Send>;

/// Future returned by [`Resolve::resolve`].
pub type Resolving = Pin<Box<dyn Future<Output = Result<Addrs, ResolverError>> + Send>>;

/// Hostname lookup.
///
/// Implementations must be thread-safe: one instance serves every
/// resolution attempt of a resolver, and attempts of different resolvers
/// may share an instance.
///
/// Returned addresses carry port 0 and keep the order the lookup produced
/// them in; the parser stamps the segment's port on each of them. A lookup
/// that succeeds with no addresses must fail with
/// [`ResolverError::HostUnresolvable`] instead.
pub trait Resolve: Send + Sync {
    fn resolve(&self, name: Name) -> Resolving;
}

impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        (**self).resolve(name)
    }
}

/// Port-0 socket addresses for `ips`, duplicates dropped, first-seen order
/// kept.
pub(crate) fn unique_addrs(ips: impl IntoIterator<Item = IpAddr>) -> Vec<SocketAddr> {
    let mut addrs: Vec<SocketAddr> = Vec::new();
    for ip in ips {
        let addr = SocketAddr::new(ip, 0);
        if !addrs.contains(&addr) {
            addrs.push(addr);
        }
    }
    addrs
}

/// Hosts-file style lookup: answers from a fixed table, optionally
/// handing unknown names to another resolver.
///
/// Names match case-insensitively. A host mapped to an empty list is
/// unresolvable rather than passed on.
///
/// ```rust,ignore
/// use rpcresolv::dns::{GaiResolver, StaticHosts};
///
/// let hosts = StaticHosts::with_fallback(Arc::new(GaiResolver::new()))
///     .host("etcd.local", ["10.0.0.7".parse()?]);
/// ```
#[derive(Default)]
pub struct StaticHosts {
    table: HashMap<String, Vec<IpAddr>>,
    fallback: Option<Arc<dyn Resolve>>,
}

impl StaticHosts {
    /// Table-only lookup. Names missing from the table are unresolvable.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: Arc<dyn Resolve>) -> Self {
        Self {
            table: HashMap::new(),
            fallback: Some(fallback),
        }
    }

    /// Maps `host` to `ips`, replacing any earlier entry.
    pub fn host(mut self, host: &str, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        self.table
            .insert(host.to_ascii_lowercase(), ips.into_iter().collect());
        self
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Resolve for StaticHosts {
    fn resolve(&self, name: Name) -> Resolving {
        let answer = match self.table.get(&name.as_str().to_ascii_lowercase()) {
            Some(ips) if ips.is_empty() => Err(ResolverError::no_addresses(name.as_str())),
            Some(ips) => {
                tracing::debug!(host = %name, count = ips.len(), "answered from static hosts");
                let addrs: Vec<SocketAddr> = ips.iter().map(|ip| SocketAddr::new(*ip, 0)).collect();
                Ok(Box::new(addrs.into_iter()) as Addrs)
            }
            None => match &self.fallback {
                Some(fallback) => return fallback.resolve(name),
                None => Err(ResolverError::host_unresolvable(
                    name.as_str(),
                    io::Error::new(io::ErrorKind::NotFound, "host not in static table"),
                )),
            },
        };
        Box::pin(future::ready(answer))
    }
}

impl fmt::Debug for StaticHosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticHosts")
            .field("hosts", &self.table.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
