//! Client metadata extraction from inbound requests.

use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;

use gatewell_core::{AppError, AppResult};

/// Proxy networks whose `x-forwarded-for` headers are honored.
#[derive(Clone, Default)]
pub struct TrustedProxies {
    networks: Vec<IpNet>,
}

impl TrustedProxies {
    /// Parses a comma-separated list of CIDR blocks.
    pub fn parse(spec: &str) -> AppResult<Self> {
        let networks = spec
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                entry.parse::<IpNet>().map_err(|error| {
                    AppError::Validation(format!("invalid trusted proxy network '{entry}': {error}"))
                })
            })
            .collect::<AppResult<Vec<IpNet>>>()?;

        Ok(Self { networks })
    }

    fn trusts(&self, peer: IpAddr) -> bool {
        self.networks.iter().any(|network| network.contains(&peer))
    }
}

/// Resolves the client address for rate limiting: the first hop of the
/// forwarded chain when the socket peer is a trusted proxy, the socket peer
/// itself otherwise.
pub fn client_ip(headers: &HeaderMap, peer: IpAddr, proxies: &TrustedProxies) -> IpAddr {
    if proxies.trusts(peer)
        && let Some(forwarded) = forwarded_client_ip(headers)
    {
        return forwarded;
    }

    peer
}

fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .and_then(|value| value.parse::<IpAddr>().ok())
}

/// Extracts the bearer token from an `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing bearer credential".to_owned()))
}
