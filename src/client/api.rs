//! HTTP client for the `/api` endpoints behind the forwarder.

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::client::reply::{ApiReply, ReplyError};

/// Errors from a single API call.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected reply: {0}")]
    Reply(#[from] ReplyError),
}

/// Posts JSON forms to a site's `/api` endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// `base` is the site origin, e.g. `https://tenvexity.einsum.org`.
    pub fn new(base: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base: Url::parse(base)?,
        })
    }

    pub fn with_http_client(http: reqwest::Client, base: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http,
            base: Url::parse(base)?,
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    /// POST `payload` as JSON and validate the reply shape.
    ///
    /// Error statuses are not treated as transport failures: the forwarder
    /// and backends both answer with a JSON failure body.
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, payload: &T) -> Result<ApiReply, ClientError> {
        let url = self.endpoint(path)?;
        tracing::debug!(url = %url, "Posting to API");

        let response = self.http.post(url).json(payload).send().await?;
        let status = response.status();
        let body: serde_json::Value = response.json().await?;

        let reply = ApiReply::from_value(body)?;
        if !status.is_success() && reply.is_success() {
            tracing::warn!(status = %status, "Success reply with error status");
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        let client = ApiClient::new("https://tenvexity.einsum.org").unwrap();
        assert_eq!(
            client.endpoint("/api/convexity").unwrap().as_str(),
            "https://tenvexity.einsum.org/api/convexity"
        );
        assert_eq!(
            client.endpoint("/api/").unwrap().as_str(),
            "https://tenvexity.einsum.org/api/"
        );
    }

    #[test]
    fn test_rejects_bad_base() {
        assert!(matches!(ApiClient::new("not a url"), Err(ClientError::Url(_))));
    }
}
