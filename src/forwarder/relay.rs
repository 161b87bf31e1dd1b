//! Request rewriting and response relay.
//!
//! # Responsibilities
//! - Rebuild the inbound request against the upstream origin
//! - Relay the upstream response as a stream
//!
//! # Design Decisions
//! - Only scheme and authority change; method, path, query, end-to-end
//!   headers and the body stream are passed through
//! - Bodies are never buffered in either direction
//! - A body error after the response head is out is logged and surfaces to
//!   the caller as an aborted transfer; it cannot become a new status

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::uri::{self, PathAndQuery};
use axum::http::{Request, Response, Uri, Version};
use futures_util::TryStreamExt;
use hyper::body::Incoming;

use crate::forwarder::error::{ErrorKind, ForwardError};
use crate::http::headers::strip_hop_by_hop;
use crate::routing::UpstreamTarget;

/// Rewrite `request` so it targets `target` with the same path and query.
pub fn build_upstream_request(
    request: Request<Body>,
    target: &UpstreamTarget,
) -> Result<Request<Body>, ForwardError> {
    let (mut parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    let mut uri_parts = uri::Parts::default();
    uri_parts.scheme = Some(target.scheme.clone());
    uri_parts.authority = Some(target.authority.clone());
    uri_parts.path_and_query = Some(path_and_query);
    parts.uri = Uri::from_parts(uri_parts).map_err(|e| ForwardError::UpstreamUnreachable {
        target: target.to_string(),
        reason: format!("invalid upstream uri: {e}"),
    })?;

    // The upstream pool only speaks HTTP/1.1, whatever the caller used.
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    // Host is derived from the new authority by the client.
    parts.headers.remove(HOST);

    Ok(Request::from_parts(parts, body))
}

/// Turn the upstream response into the caller's response without touching
/// status, reason phrase, end-to-end headers or body bytes.
pub fn relay_response(upstream: Response<Incoming>, target: String) -> Response<Body> {
    let (mut parts, body) = upstream.into_parts();
    strip_hop_by_hop(&mut parts.headers);

    let stream = Body::new(body).into_data_stream().map_err(move |e| {
        let err = ForwardError::RelayFailure(e.to_string());
        tracing::error!(
            upstream = %target,
            kind = ErrorKind::RelayFailure.as_str(),
            error = %err,
            "Upstream body failed mid-relay, caller receives a truncated response"
        );
        err
    });

    Response::from_parts(parts, Body::from_stream(stream))
}
