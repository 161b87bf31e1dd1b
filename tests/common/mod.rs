//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use einsum_edge::config::{TargetMode, UpstreamScheme};
use einsum_edge::http::AppState;
use einsum_edge::{ForwarderConfig, HttpServer, Shutdown};

/// Subdomain used by the forwarding tests.
pub const SITE_HOST: &str = "tenvexity.einsum.org";

/// Backend host the dotted convention derives from [`SITE_HOST`].
pub const BACKEND_HOST: &str = "tenvexity.api.einsum.org";

/// Requests seen by a mock backend.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Start a backend that echoes the request back.
///
/// The body is returned verbatim; method, request target and `Host` come
/// back in `x-echo-method`, `x-echo-uri` and `x-echo-host`. A request header
/// `x-echo-status` picks the response status.
pub async fn start_echo_backend() -> (SocketAddr, CallCounter) {
    let counter = CallCounter::default();
    let seen = counter.clone();

    let app = Router::new().fallback(move |request: Request<Body>| {
        let seen = seen.clone();
        async move {
            seen.hit();
            let (parts, body) = request.into_parts();
            let body = to_bytes(body, usize::MAX).await.unwrap_or_default();

            let status = parts
                .headers
                .get("x-echo-status")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u16>().ok())
                .and_then(|v| StatusCode::from_u16(v).ok())
                .unwrap_or(StatusCode::OK);
            let host = parts
                .headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            Response::builder()
                .status(status)
                .header("x-echo-method", parts.method.as_str())
                .header("x-echo-uri", parts.uri.to_string())
                .header("x-echo-host", host)
                .body(Body::from(body))
                .unwrap()
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, counter)
}

/// Start a raw TCP backend that answers every connection with `response`.
pub async fn start_raw_backend(response: String) -> (SocketAddr, CallCounter) {
    let counter = CallCounter::default();
    let seen = counter.clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let response = response.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                seen.hit();
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    (addr, counter)
}

/// Start a backend that accepts requests and answers after `delay`.
pub async fn start_slow_backend(delay: Duration) -> (SocketAddr, CallCounter) {
    let counter = CallCounter::default();
    let seen = counter.clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let seen = seen.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                seen.hit();
                tokio::time::sleep(delay).await;
                let body = r#"{"success":true}"#;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    (addr, counter)
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Subdomain-mode config sending [`BACKEND_HOST`] to a local backend.
pub fn subdomain_config(backend: SocketAddr) -> ForwarderConfig {
    let mut config = ForwarderConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.mode = TargetMode::Subdomain;
    config.upstream.scheme = UpstreamScheme::Http;
    config.upstream.port = Some(backend.port());
    config.upstream.resolve = HashMap::from([(BACKEND_HOST.to_string(), backend.ip())]);
    config.timeouts.upstream_secs = 5;
    config
}

/// Fixed-mode config sending everything to `backend`.
pub fn fixed_config(backend: SocketAddr) -> ForwarderConfig {
    let mut config = ForwarderConfig::local_development();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.fixed_target = format!("http://{backend}");
    config.timeouts.upstream_secs = 5;
    config
}

/// A running forwarder.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub state: AppState,
    pub shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the forwarder on an ephemeral port.
pub async fn start_proxy(config: ForwarderConfig) -> TestProxy {
    let shutdown = Shutdown::new();
    let (_, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let state = server.state();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestProxy {
        addr,
        state,
        shutdown,
    }
}

/// Client that never pools, so each test request opens its own connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Send raw bytes to `addr` and return everything read until close.
pub async fn raw_request(addr: SocketAddr, request: &str) -> String {
    let mut socket = tokio::net::TcpStream::connect(addr).await.unwrap();
    socket.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), socket.read_to_end(&mut response)).await;
    String::from_utf8_lossy(&response).into_owned()
}
