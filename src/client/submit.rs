//! Latest-wins submission.
//!
//! A form keeps at most one request in flight: submitting again aborts the
//! previous call. Each [`Submitter`] owns its own in-flight handle, so two
//! forms never cancel each other.

use serde_json::Value;
use tokio::task::{AbortHandle, JoinHandle};

use crate::client::api::{ApiClient, ClientError};
use crate::client::reply::ApiReply;

/// Per-form submission state.
#[derive(Debug)]
pub struct Submitter {
    client: ApiClient,
    path: String,
    in_flight: Option<AbortHandle>,
}

impl Submitter {
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            in_flight: None,
        }
    }

    /// Start a submission, aborting the previous one if it is still running.
    ///
    /// An aborted submission's handle resolves to a cancelled `JoinError`.
    pub fn submit(&mut self, payload: Value) -> JoinHandle<Result<ApiReply, ClientError>> {
        if let Some(previous) = self.in_flight.take() {
            if !previous.is_finished() {
                tracing::debug!(path = %self.path, "Superseding in-flight submission");
            }
            previous.abort();
        }

        let client = self.client.clone();
        let path = self.path.clone();
        let handle = tokio::spawn(async move { client.post(&path, &payload).await });
        self.in_flight = Some(handle.abort_handle());
        handle
    }

    /// Abort the in-flight submission, if any.
    pub fn cancel(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }
    }
}

impl Drop for Submitter {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::json;
    use std::time::Duration;

    async fn start_backend() -> String {
        let app = Router::new().route(
            "/api/convexity",
            post(|Json(body): Json<Value>| async move {
                if body["slow"] == json!(true) {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Json(json!({ "success": true, "echo": body["expression"] }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_new_submission_aborts_previous() {
        let base = start_backend().await;
        let client = ApiClient::new(&base).unwrap();
        let mut form = Submitter::new(client, "/api/convexity");

        let first = form.submit(json!({ "expression": "ij->", "slow": true }));
        let second = form.submit(json!({ "expression": "ij->ji" }));

        let first = first.await;
        assert!(first.unwrap_err().is_cancelled());

        let reply = second.await.unwrap().unwrap();
        assert_eq!(reply.field_str("echo"), Some("ij->ji"));
    }

    #[tokio::test]
    async fn test_independent_submitters_do_not_interfere() {
        let base = start_backend().await;
        let client = ApiClient::new(&base).unwrap();
        let mut form_a = Submitter::new(client.clone(), "/api/convexity");
        let mut form_b = Submitter::new(client, "/api/convexity");

        let a = form_a.submit(json!({ "expression": "i,i->" }));
        let b = form_b.submit(json!({ "expression": "ij,j->i" }));

        assert_eq!(a.await.unwrap().unwrap().field_str("echo"), Some("i,i->"));
        assert_eq!(b.await.unwrap().unwrap().field_str("echo"), Some("ij,j->i"));
    }
}
