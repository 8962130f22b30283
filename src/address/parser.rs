use super::endpoint::{EndpointToken, ResolvedEndpoint};
use crate::base::resolvererror::ResolverError;
use crate::dns::{GaiResolver, Name, Resolve};
use futures::future::try_join_all;
use std::fmt;
use std::sync::Arc;

/// Splits a target into endpoint tokens without looking anything up.
///
/// Segments are separated by `,` and trimmed. Within a segment the first
/// `:` separates host from port; an IPv6 literal must be bracketed
/// (`[::1]:50051`) to carry a port. A missing or empty port falls back to
/// `default_port`.
///
/// # Errors
///
/// [`ResolverError::InvalidArgument`] for an empty target, an empty host or
/// a zero `default_port`; [`ResolverError::InvalidPort`] for port text that
/// is not a number in `1..=65535`.
pub fn parse_tokens(spec: &str, default_port: u16) -> Result<Vec<EndpointToken>, ResolverError> {
    if default_port == 0 {
        return Err(ResolverError::invalid_argument("invalid default port 0"));
    }
    if spec.trim().is_empty() {
        return Err(ResolverError::invalid_argument(
            "addresses should not be empty",
        ));
    }

    spec.split(',')
        .map(|segment| parse_segment(segment.trim(), default_port))
        .collect()
}

fn parse_segment(segment: &str, default_port: u16) -> Result<EndpointToken, ResolverError> {
    let (host, port_text) = match segment.strip_prefix('[') {
        Some(rest) => {
            let (host, after) = rest.split_once(']').ok_or_else(|| {
                ResolverError::invalid_argument(format!(
                    "unterminated '[' in address: segment={segment:?}"
                ))
            })?;
            let port_text = match after {
                "" => None,
                after => Some(after.strip_prefix(':').ok_or_else(|| {
                    ResolverError::invalid_argument(format!(
                        "unexpected text after ']' in address: segment={segment:?}"
                    ))
                })?),
            };
            (host, port_text)
        }
        None => match segment.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (segment, None),
        },
    };

    let host = host.trim();
    if host.is_empty() {
        return Err(ResolverError::invalid_argument(format!(
            "empty host in address: segment={segment:?}"
        )));
    }

    let port = parse_port(segment, port_text, default_port)?;
    Ok(EndpointToken::new(host, port))
}

fn parse_port(
    segment: &str,
    port_text: Option<&str>,
    default_port: u16,
) -> Result<u16, ResolverError> {
    let text = port_text.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Ok(default_port);
    }
    match text.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ResolverError::invalid_port(segment, text)),
    }
}

/// Turns targets into literal endpoints.
///
/// Holds no state besides the lookup backend: every call looks hosts up
/// again, and concurrent calls are independent.
#[derive(Clone)]
pub struct AddressParser {
    resolver: Arc<dyn Resolve>,
}

impl Default for AddressParser {
    fn default() -> Self {
        Self::new(Arc::new(GaiResolver::new()))
    }
}

impl AddressParser {
    pub fn new(resolver: Arc<dyn Resolve>) -> Self {
        Self { resolver }
    }

    /// Parses `spec` and expands every segment into literal endpoints.
    ///
    /// Output keeps segment order; addresses of one hostname keep the order
    /// the lookup returned them in.
    ///
    /// # Errors
    ///
    /// Everything [`parse_tokens`] rejects, plus
    /// [`ResolverError::HostUnresolvable`] when a hostname lookup fails or
    /// returns no addresses.
    pub async fn parse(
        &self,
        spec: &str,
        default_port: u16,
    ) -> Result<Vec<ResolvedEndpoint>, ResolverError> {
        let tokens = parse_tokens(spec, default_port)?;
        self.expand(&tokens).await
    }

    /// Looks up already-parsed tokens. Hostnames are resolved concurrently.
    pub async fn expand(
        &self,
        tokens: &[EndpointToken],
    ) -> Result<Vec<ResolvedEndpoint>, ResolverError> {
        let groups = try_join_all(tokens.iter().map(|token| self.expand_one(token))).await?;
        Ok(groups.into_iter().flatten().collect())
    }

    async fn expand_one(&self, token: &EndpointToken) -> Result<Vec<ResolvedEndpoint>, ResolverError> {
        if let Some(endpoint) = token.literal() {
            return Ok(vec![endpoint]);
        }

        let endpoints: Vec<ResolvedEndpoint> = self
            .resolver
            .resolve(Name::new(token.host()))
            .await?
            .map(|addr| ResolvedEndpoint::new(addr.ip(), token.port()))
            .collect();

        if endpoints.is_empty() {
            return Err(ResolverError::no_addresses(token.host()));
        }
        Ok(endpoints)
    }
}

impl fmt::Debug for AddressParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressParser").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ErrorKind;
    use crate::dns::StaticHosts;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    const DEFAULT_PORT: u16 = 2379;

    fn static_hosts() -> AddressParser {
        let hosts = StaticHosts::with_fallback(Arc::new(GaiResolver::new()))
            .host("etcd.local", [v4(10, 0, 0, 1), v4(10, 0, 0, 2), v4(10, 0, 0, 3)]);
        AddressParser::new(Arc::new(hosts))
    }

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_tokens_ip_with_port() {
        let tokens = parse_tokens("127.0.0.1:1111", DEFAULT_PORT).unwrap();
        assert_eq!(tokens, vec![EndpointToken::new("127.0.0.1", 1111)]);
    }

    #[test]
    fn test_tokens_default_port() {
        let tokens = parse_tokens("127.0.0.1", DEFAULT_PORT).unwrap();
        assert_eq!(tokens, vec![EndpointToken::new("127.0.0.1", DEFAULT_PORT)]);

        let tokens = parse_tokens("127.0.0.1:", DEFAULT_PORT).unwrap();
        assert_eq!(tokens, vec![EndpointToken::new("127.0.0.1", DEFAULT_PORT)]);
    }

    #[test]
    fn test_tokens_trim_and_order() {
        let tokens = parse_tokens(" a.local:1 , 10.0.0.9 ,b.local: 3 ", DEFAULT_PORT).unwrap();
        assert_eq!(
            tokens,
            vec![
                EndpointToken::new("a.local", 1),
                EndpointToken::new("10.0.0.9", DEFAULT_PORT),
                EndpointToken::new("b.local", 3),
            ]
        );
    }

    #[test]
    fn test_tokens_bracketed_ipv6() {
        let tokens = parse_tokens("[::1]:50051,[fe80::1]", DEFAULT_PORT).unwrap();
        assert_eq!(
            tokens,
            vec![
                EndpointToken::new("::1", 50051),
                EndpointToken::new("fe80::1", DEFAULT_PORT),
            ]
        );
    }

    #[test]
    fn test_tokens_invalid_port() {
        for spec in ["127.0.0.1:abc", "127.0.0.1:0", "127.0.0.1:65536", "a.local:1:2"] {
            let err = parse_tokens(spec, DEFAULT_PORT).unwrap_err();
            assert!(
                matches!(err, ResolverError::InvalidPort { .. }),
                "{spec} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn test_tokens_invalid_argument() {
        for spec in ["", "   ", ":80", "a.local,,b.local", "[::1", "[::1]80"] {
            let err = parse_tokens(spec, DEFAULT_PORT).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "spec {spec:?}");
        }
        assert!(parse_tokens("127.0.0.1", 0).is_err());
    }

    #[tokio::test]
    async fn test_parse_literal_ips() {
        let parser = AddressParser::default();

        let endpoints = parser.parse("127.0.0.1:1111", DEFAULT_PORT).await.unwrap();
        assert_eq!(endpoints, vec![ResolvedEndpoint::new(v4(127, 0, 0, 1), 1111)]);

        let endpoints = parser.parse("127.0.0.1", DEFAULT_PORT).await.unwrap();
        assert_eq!(
            endpoints,
            vec![ResolvedEndpoint::new(v4(127, 0, 0, 1), DEFAULT_PORT)]
        );

        let endpoints = parser.parse("[::1]:9000", DEFAULT_PORT).await.unwrap();
        assert_eq!(
            endpoints,
            vec![ResolvedEndpoint::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 9000)]
        );
    }

    #[tokio::test]
    async fn test_parse_expands_hostname_in_lookup_order() {
        let endpoints = static_hosts().parse("etcd.local:1111", DEFAULT_PORT).await.unwrap();
        assert_eq!(
            endpoints,
            vec![
                ResolvedEndpoint::new(v4(10, 0, 0, 1), 1111),
                ResolvedEndpoint::new(v4(10, 0, 0, 2), 1111),
                ResolvedEndpoint::new(v4(10, 0, 0, 3), 1111),
            ]
        );
    }

    #[tokio::test]
    async fn test_parse_mixed_keeps_segment_order() {
        let endpoints = static_hosts()
            .parse("etcd.local:22222, 127.0.0.1:1111, etcd.local, 127.0.0.2", DEFAULT_PORT)
            .await
            .unwrap();

        assert_eq!(endpoints.len(), 8);
        assert_eq!(endpoints[0], ResolvedEndpoint::new(v4(10, 0, 0, 1), 22222));
        assert_eq!(endpoints[3], ResolvedEndpoint::new(v4(127, 0, 0, 1), 1111));
        assert_eq!(endpoints[4], ResolvedEndpoint::new(v4(10, 0, 0, 1), DEFAULT_PORT));
        assert_eq!(endpoints[7], ResolvedEndpoint::new(v4(127, 0, 0, 2), DEFAULT_PORT));
    }

    #[tokio::test]
    async fn test_parse_invalid_host() {
        let err = AddressParser::default()
            .parse("no-such-host-xyz.invalid:123", DEFAULT_PORT)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HostUnresolvable);
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(
            ResolvedEndpoint::new(v4(127, 0, 0, 1), 2379).to_string(),
            "127.0.0.1:2379"
        );
        assert_eq!(
            ResolvedEndpoint::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 2379).to_string(),
            "[::1]:2379"
        );
    }
}
