//! API client talking to a backend through the forwarder.

use std::net::SocketAddr;

use axum::{routing::post, Json, Router};
use serde_json::{json, Value};

use einsum_edge::client::{ApiClient, ApiReply};

mod common;

async fn start_convexity_backend() -> SocketAddr {
    let app = Router::new().route(
        "/api/",
        post(|Json(body): Json<Value>| async move {
            match body["expression"].as_str() {
                Some(expr) if !expr.is_empty() => Json(json!({
                    "success": true,
                    "expression": expr,
                    "convexity": "convex",
                })),
                _ => Json(json!({ "success": false, "errorMessage": "Empty expression" })),
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_success_and_failure_replies_through_forwarder() {
    let backend = start_convexity_backend().await;
    let proxy = common::start_proxy(common::fixed_config(backend)).await;
    let client = ApiClient::new(&proxy.url("")).unwrap();

    let reply = client
        .post("/api/", &json!({ "expression": "x^2", "variables": [] }))
        .await
        .unwrap();
    assert_eq!(reply.field_str("convexity"), Some("convex"));

    let reply = client.post("/api/", &json!({ "expression": "" })).await.unwrap();
    assert_eq!(reply, ApiReply::Failure { message: "Empty expression".into() });
}

#[tokio::test]
async fn test_forwarder_failure_reads_as_failure_reply() {
    let port = common::closed_port().await;
    let target: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let proxy = common::start_proxy(common::fixed_config(target)).await;
    let client = ApiClient::new(&proxy.url("")).unwrap();

    let reply = client.post("/api/", &json!({ "input": "min x" })).await.unwrap();
    assert_eq!(reply, ApiReply::Failure { message: "Bad Gateway".into() });
}
