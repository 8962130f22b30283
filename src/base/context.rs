//! Attaching the host being looked up to I/O failures.

use crate::base::resolvererror::ResolverError;
use std::io;

/// Turns an `io::Result` from a lookup into a [`ResolverError`] naming
/// the host.
pub trait IoResultExt<T> {
    /// ```ignore
    /// let addrs = ("db.internal", 0).to_socket_addrs().dns_context("db.internal")?;
    /// ```
    fn dns_context(self, host: &str) -> Result<T, ResolverError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn dns_context(self, host: &str) -> Result<T, ResolverError> {
        self.map_err(|source| ResolverError::host_unresolvable(host, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_failure_names_host() {
        let failed: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "nxdomain"));

        match failed.dns_context("db.internal") {
            Err(ResolverError::HostUnresolvable { host, source }) => {
                assert_eq!(host, "db.internal");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_success_is_untouched() {
        let ok: io::Result<u16> = Ok(2379);
        assert_eq!(ok.dns_context("localhost").unwrap(), 2379);
    }
}
