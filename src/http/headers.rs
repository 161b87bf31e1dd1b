//! Hop-by-hop header handling.
//!
//! # Responsibilities
//! - Strip connection-scoped headers on both legs of a forwarded exchange
//! - Leave every end-to-end header untouched
//!
//! # Design Decisions
//! - RFC 9110 §7.6.1 set plus the legacy `Proxy-Connection`/`Keep-Alive`
//! - Headers named in `Connection` are removed as well
//! - No X-Forwarded-* insertion; the forwarded header set is the caller's

use axum::http::header::{self, HeaderMap, HeaderName};

static HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

static LEGACY_HOP_BY_HOP: [&str; 2] = ["keep-alive", "proxy-connection"];

/// Remove hop-by-hop headers in place.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    let doomed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_hop_by_hop(name) || listed.contains(name))
        .cloned()
        .collect();

    for name in doomed {
        headers.remove(name);
    }
}

/// Whether a header would be stripped by [`strip_hop_by_hop`] regardless of
/// what `Connection` lists.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name) || LEGACY_HOP_BY_HOP.contains(&name.as_str())
}
