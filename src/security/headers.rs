//! Forwarding header synthesis.
//!
//! The function sits behind us the way it would sit behind a load balancer
//! target group, so the proxy must provide `host` and the `x-forwarded-*`
//! trio itself. These four keys always overwrite whatever the client sent;
//! client-supplied forwarding headers are never trusted.

use std::collections::BTreeMap;

/// Header keys the synthesizer owns.
pub const SYNTHESIZED_HEADERS: [&str; 4] = [
    "host",
    "x-forwarded-for",
    "x-forwarded-proto",
    "x-forwarded-port",
];

/// Forwarding headers computed for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedHeaders {
    host: String,
    client_ip: String,
    proto: &'static str,
    port: &'static str,
}

impl ForwardedHeaders {
    /// `client_addr` is the already-resolved client address, with or without
    /// a port suffix.
    pub fn new(client_addr: &str, tls: bool, host: impl Into<String>) -> Self {
        let (proto, port) = if tls { ("https", "443") } else { ("http", "80") };
        Self {
            host: host.into(),
            client_ip: strip_port(client_addr).to_string(),
            proto,
            port,
        }
    }

    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    pub fn proto(&self) -> &str {
        self.proto
    }

    /// Overlay onto a lower-cased multi-value header map, replacing any
    /// existing values for the synthesized keys.
    pub fn apply(&self, headers: &mut BTreeMap<String, Vec<String>>) {
        headers.insert("host".to_string(), vec![self.host.clone()]);
        headers.insert("x-forwarded-for".to_string(), vec![self.client_ip.clone()]);
        headers.insert("x-forwarded-proto".to_string(), vec![self.proto.to_string()]);
        headers.insert("x-forwarded-port".to_string(), vec![self.port.to_string()]);
    }
}

/// Strip a `:port` suffix from an address.
///
/// Accepts `host:port`, `:port` (empty host) and `[v6]:port`. Anything that
/// does not split cleanly (a bare IPv4, a bare IPv6, a bracketed address
/// without port) is returned unchanged.
pub fn strip_port(addr: &str) -> &str {
    if let Some(rest) = addr.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((host, tail)) if tail.starts_with(':') && !tail[1..].contains(':') => host,
            _ => addr,
        };
    }
    match addr.rsplit_once(':') {
        Some((host, _)) if !host.contains(':') => host,
        _ => addr,
    }
}
