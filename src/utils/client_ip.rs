//! Client identity extraction for rate limiting.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Derives the identity a request is rate limited under.
///
/// Without a proxy the peer socket address is authoritative. When
/// `behind_proxy` is set, the first entry of `X-Forwarded-For` is used,
/// then `X-Real-IP`, falling back to the peer address. Header values that
/// do not parse as an IP address are ignored.
///
/// Only enable `behind_proxy` when a trusted reverse proxy overwrites these
/// headers; otherwise clients can pick their own identity.
///
/// # Examples
///
/// ```ignore
/// let peer: SocketAddr = "10.0.0.1:5000".parse().unwrap();
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// assert_eq!(client_id(&headers, peer, true), "203.0.113.7");
/// assert_eq!(client_id(&headers, peer, false), "10.0.0.1");
/// ```
pub fn client_id(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> String {
    if behind_proxy && let Some(ip) = forwarded_ip(headers) {
        return ip.to_string();
    }

    peer.ip().to_string()
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());

    from_forwarded.or_else(|| {
        headers
            .get(X_REAL_IP)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    })
}
