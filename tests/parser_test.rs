//! Address Parser Tests
//!
//! Covers:
//! - Token splitting, default ports, invalid ports
//! - Literal IP short-circuit
//! - Hostname expansion through a static hosts table and the system resolver

use rpcresolv::address::{parse_tokens, AddressParser, EndpointToken, ResolvedEndpoint};
use rpcresolv::base::ErrorKind;
use rpcresolv::dns::{GaiResolver, StaticHosts};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

const DEFAULT_PORT: u16 = 2379;

fn localhost(port: u16) -> ResolvedEndpoint {
    ResolvedEndpoint::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}

#[tokio::test]
async fn test_parse_ip_with_port() {
    let endpoints = AddressParser::default()
        .parse("127.0.0.1:1111", DEFAULT_PORT)
        .await
        .unwrap();
    assert_eq!(endpoints, vec![localhost(1111)]);
}

#[tokio::test]
async fn test_parse_ip_without_port() {
    let endpoints = AddressParser::default()
        .parse("127.0.0.1", DEFAULT_PORT)
        .await
        .unwrap();
    assert_eq!(endpoints, vec![localhost(DEFAULT_PORT)]);
}

#[tokio::test]
async fn test_parse_empty_port() {
    let endpoints = AddressParser::default()
        .parse("127.0.0.1:", DEFAULT_PORT)
        .await
        .unwrap();
    assert_eq!(endpoints, vec![localhost(DEFAULT_PORT)]);
}

#[tokio::test]
async fn test_parse_invalid_port() {
    let err = AddressParser::default()
        .parse("127.0.0.1:abc", DEFAULT_PORT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("abc"));
}

#[tokio::test]
async fn test_parse_invalid_host() {
    let err = AddressParser::default()
        .parse("no-such-host-xyz.invalid:123", DEFAULT_PORT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HostUnresolvable);
}

#[tokio::test]
async fn test_literal_segments_expand_to_one_endpoint_each() {
    let parser = AddressParser::default();
    for n in 1..=8u8 {
        let spec = (1..=n)
            .map(|i| format!("10.1.0.{i}:{}", 9000 + u16::from(i)))
            .collect::<Vec<_>>()
            .join(",");

        let endpoints = parser.parse(&spec, DEFAULT_PORT).await.unwrap();
        assert_eq!(endpoints.len(), usize::from(n));
        for (i, endpoint) in endpoints.iter().enumerate() {
            let i = i as u8 + 1;
            assert_eq!(endpoint.ip(), IpAddr::V4(Ipv4Addr::new(10, 1, 0, i)));
            assert_eq!(endpoint.port(), 9000 + u16::from(i));
        }
    }
}

#[tokio::test]
async fn test_hostname_segments_expand_in_order() {
    let hosts = StaticHosts::with_fallback(Arc::new(GaiResolver::new())).host(
        "etcd.local",
        [
            IpAddr::from(Ipv4Addr::new(10, 0, 0, 1)),
            IpAddr::from(Ipv4Addr::new(10, 0, 0, 2)),
        ],
    );
    let parser = AddressParser::new(Arc::new(hosts));

    let endpoints = parser
        .parse("127.0.0.1:1111, etcd.local:22222, 127.0.0.2", DEFAULT_PORT)
        .await
        .unwrap();

    let rendered: Vec<String> = endpoints.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        [
            "127.0.0.1:1111",
            "10.0.0.1:22222",
            "10.0.0.2:22222",
            "127.0.0.2:2379"
        ]
    );
}

#[tokio::test]
async fn test_localhost_expands_with_segment_port() {
    let endpoints = AddressParser::default()
        .parse("localhost:4444", DEFAULT_PORT)
        .await
        .unwrap();
    assert!(!endpoints.is_empty());
    assert!(endpoints.iter().all(|e| e.port() == 4444));
    assert!(endpoints.iter().all(|e| e.ip().is_loopback()));
}

#[test]
fn test_tokens_without_lookup() {
    let tokens = parse_tokens("etcd-0.internal:2380,etcd-1.internal,[::1]:50051", DEFAULT_PORT)
        .unwrap();
    assert_eq!(
        tokens,
        vec![
            EndpointToken::new("etcd-0.internal", 2380),
            EndpointToken::new("etcd-1.internal", DEFAULT_PORT),
            EndpointToken::new("::1", 50051),
        ]
    );
}
