//! Client address resolution.
//!
//! The TCP peer is the client unless it is a configured trusted proxy, in
//! which case the left-most entry of the configured forwarding header wins.

use std::net::{IpAddr, SocketAddr};

use axum::http::{HeaderMap, HeaderName};

use crate::config::ClientIpConfig;

/// Resolves the address that ends up in `x-forwarded-for`.
#[derive(Debug, Clone)]
pub struct ClientIpResolver {
    trusted: Vec<IpAddr>,
    header: Option<HeaderName>,
}

impl ClientIpResolver {
    /// Build from configuration. Unparseable entries are skipped; validation
    /// reports them before we get here.
    pub fn from_config(config: &ClientIpConfig) -> Self {
        let trusted = config
            .trusted_proxies
            .iter()
            .filter_map(|p| p.parse().ok())
            .collect();
        let header = HeaderName::from_bytes(config.header.as_bytes()).ok();
        Self { trusted, header }
    }

    /// Resolve the client address for a request from `peer`.
    ///
    /// Returns the peer as `ip:port` when it is not trusted, so the port is
    /// stripped later by the header synthesizer.
    pub fn resolve(&self, peer: SocketAddr, headers: &HeaderMap) -> String {
        if !self.trusted.contains(&peer.ip()) {
            return peer.to_string();
        }
        let forwarded = self
            .header
            .as_ref()
            .and_then(|name| headers.get(name))
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match forwarded {
            Some(client) => client.to_string(),
            None => peer.to_string(),
        }
    }
}
