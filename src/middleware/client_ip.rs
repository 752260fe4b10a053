use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;

/// Client address for rate limiting. `X-Forwarded-For` is only honoured when
/// the direct peer is a trusted proxy. The list is walked from the right and
/// the first untrusted hop wins, so a client-supplied prefix is ignored.
pub fn resolve(headers: &HeaderMap, peer: IpAddr, trusted_proxies: &[IpNet]) -> IpAddr {
    let is_trusted = |ip: &IpAddr| trusted_proxies.iter().any(|net| net.contains(ip));

    if !is_trusted(&peer) {
        return peer;
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| {
            xff.rsplit(',')
                .filter_map(|s| s.trim().parse::<IpAddr>().ok())
                .find(|ip| !is_trusted(ip))
        })
        .unwrap_or(peer)
}
