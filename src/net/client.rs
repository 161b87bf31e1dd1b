//! Upstream HTTP client construction.

use std::time::Duration;

use axum::body::Body;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::net::dns::OverrideResolver;

/// Pooled client used for every forwarded request.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector<OverrideResolver>>, Body>;

/// Build the shared upstream client.
///
/// Speaks plain HTTP or HTTPS depending on the target URI. Certificates are
/// always verified against the webpki root set. The crypto provider is
/// passed explicitly so the result never depends on which rustls backends
/// other crates happen to enable.
pub fn build_client(
    upstream: &UpstreamConfig,
    timeouts: &TimeoutConfig,
) -> Result<UpstreamClient, rustls::Error> {
    let mut http_connector = HttpConnector::new_with_resolver(OverrideResolver::new(&upstream.resolve));
    http_connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
    http_connector.enforce_http(false);

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    tracing::debug!(
        overrides = upstream.resolve.len(),
        connect_timeout_secs = timeouts.connect_secs,
        "Upstream client configured"
    );

    Ok(Client::builder(TokioExecutor::new()).build(https_connector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForwarderConfig;

    #[tokio::test]
    async fn test_builds_from_default_config() {
        let config = ForwarderConfig::default();
        assert!(build_client(&config.upstream, &config.timeouts).is_ok());
    }

    #[tokio::test]
    async fn test_builds_with_override_table() {
        let mut config = ForwarderConfig::default();
        config
            .upstream
            .resolve
            .insert("tenvexity.api.einsum.org".into(), "127.0.0.1".parse().unwrap());
        assert!(build_client(&config.upstream, &config.timeouts).is_ok());
    }
}
