//! Edge request forwarding.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → resolve (Host → subdomain → target, or fixed target)
//!     → relay.rs: build_upstream_request (scheme + authority rewritten)
//!     → upstream client, bounded by the upstream deadline
//!     → relay.rs: relay_response (status, headers, streamed body)
//!     → caller
//! ```
//!
//! # Design Decisions
//! - One linear pipeline per request: no retries, no caching, no body parsing
//! - Dropping the returned future or the relayed body cancels the upstream
//!   exchange, so a caller disconnect releases the upstream connection
//! - The deadline covers the upstream response head; body streaming after
//!   that is bounded only by the caller staying connected
//! - The inbound body is capped at `limits.max_body_bytes`: a larger declared
//!   length is refused up front, a chunked body is cut off when it crosses
//!   the cap and the exchange fails as a client error

pub mod error;
pub mod relay;

use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_LENGTH;
use axum::http::{Request, Response};
use http_body_util::{LengthLimitError, Limited};

use crate::config::validation::ValidationError;
use crate::config::ForwarderConfig;
use crate::net::{build_client, UpstreamClient};
use crate::routing::{build_resolver, TargetResolver, UpstreamTarget};

pub use error::{ErrorKind, ForwardError};
pub use relay::{build_upstream_request, relay_response};

/// Resolves, forwards and relays single requests.
#[derive(Debug)]
pub struct Forwarder {
    resolver: Box<dyn TargetResolver>,
    client: UpstreamClient,
    upstream_timeout: Duration,
    max_body_bytes: usize,
}

impl Forwarder {
    pub fn new(
        resolver: Box<dyn TargetResolver>,
        client: UpstreamClient,
        upstream_timeout: Duration,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            resolver,
            client,
            upstream_timeout,
            max_body_bytes,
        }
    }

    /// Build a forwarder with its own upstream client from configuration.
    pub fn from_config(config: &ForwarderConfig) -> Result<Self, ValidationError> {
        let resolver = build_resolver(&config.upstream)?;
        let client = build_client(&config.upstream, &config.timeouts)
            .map_err(|e| ValidationError::UpstreamTls(e.to_string()))?;
        Ok(Self::new(
            resolver,
            client,
            Duration::from_secs(config.timeouts.upstream_secs),
            config.limits.max_body_bytes,
        ))
    }

    /// Target a request would be sent to.
    pub fn resolve(&self, request: &Request<Body>) -> Result<UpstreamTarget, ForwardError> {
        self.resolver.resolve(request)
    }

    /// Forward `request` to its upstream and relay the response.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        let target = self.resolve(&request)?;

        if declared_length(&request).is_some_and(|len| len > self.max_body_bytes as u64) {
            return Err(ForwardError::PayloadTooLarge {
                limit: self.max_body_bytes,
            });
        }

        tracing::info!(
            subdomain = target.subdomain.as_deref().unwrap_or("-"),
            upstream = %target,
            method = %request.method(),
            path = request.uri().path(),
            "Forwarding request"
        );

        let limit = self.max_body_bytes;
        let request = request.map(|body| Body::new(Limited::new(body, limit)));
        let outbound = build_upstream_request(request, &target)?;

        let upstream = match tokio::time::timeout(self.upstream_timeout, self.client.request(outbound)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if exceeds_body_limit(&e) => {
                return Err(ForwardError::PayloadTooLarge { limit });
            }
            Ok(Err(e)) => {
                return Err(ForwardError::UpstreamUnreachable {
                    target: target.to_string(),
                    reason: error_chain(&e),
                });
            }
            Err(_) => {
                return Err(ForwardError::Timeout {
                    target: target.to_string(),
                    secs: self.upstream_timeout.as_secs(),
                });
            }
        };

        tracing::debug!(
            upstream = %target,
            status = %upstream.status(),
            "Upstream responded"
        );

        Ok(relay_response(upstream, target.to_string()))
    }
}

fn declared_length(request: &Request<Body>) -> Option<u64> {
    request
        .headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Whether a send failed because the inbound body crossed the cap.
fn exceeds_body_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Flatten an error and its sources into one line for logs.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetMode;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_sources() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(error_chain(&err), "outer: refused");
    }

    #[derive(Debug, thiserror::Error)]
    #[error("body write failed")]
    struct SendFailed(#[source] Box<dyn std::error::Error + Send + Sync>);

    #[tokio::test]
    async fn test_body_limit_found_in_source_chain() {
        use http_body_util::BodyExt;

        let limited = Limited::new(Body::from("{\"input\":\"min x\"}"), 4);
        let err = SendFailed(limited.collect().await.unwrap_err());
        assert!(exceeds_body_limit(&err));

        let err = Outer(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"));
        assert!(!exceeds_body_limit(&err));
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_rejected() {
        let mut config = ForwarderConfig::default();
        config.upstream.mode = TargetMode::Fixed;
        config.limits.max_body_bytes = 8;
        let forwarder = Forwarder::from_config(&config).unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/api/")
            .header("content-length", "16")
            .body(Body::from("{\"input\":\"min\"}"))
            .unwrap();

        let err = forwarder.forward(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PayloadTooLarge);
    }

    #[tokio::test]
    async fn test_missing_host_fails_before_any_upstream_call() {
        let forwarder = Forwarder::from_config(&ForwarderConfig::default()).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/api/convexity")
            .body(Body::from("{}"))
            .unwrap();

        let err = forwarder.forward(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingHost);
    }

    #[test]
    fn test_from_config_selects_fixed_mode() {
        let mut config = ForwarderConfig::default();
        config.upstream.mode = TargetMode::Fixed;
        let forwarder = Forwarder::from_config(&config).unwrap();

        let request = Request::builder()
            .uri("/api")
            .header("Host", "tenvexity.einsum.org")
            .body(Body::empty())
            .unwrap();
        let target = forwarder.resolve(&request).unwrap();
        assert_eq!(target.to_string(), "http://127.0.0.1:5000");
    }
}
