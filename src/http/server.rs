//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Apply configuration reloads by swapping the runtime snapshot
//! - Dispatch matched requests to the forwarder
//! - Observability (metrics, request-scoped spans)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;

use crate::config::validation::{validate_config, ValidationError};
use crate::config::{ConfigError, ForwarderConfig};
use crate::forwarder::Forwarder;
use crate::http::request::{RequestIdExt, RequestIdLayer};
use crate::http::response::error_response;
use crate::observability::metrics;
use crate::routing::{AnyMatcher, Matcher};

/// Everything compiled from one configuration.
#[derive(Debug)]
pub struct Runtime {
    pub config: ForwarderConfig,
    pub matcher: AnyMatcher,
    pub forwarder: Forwarder,
}

impl Runtime {
    pub fn from_config(config: ForwarderConfig) -> Result<Self, ValidationError> {
        let matcher = AnyMatcher::from_prefixes(&config.routes.path_prefixes);
        let forwarder = Forwarder::from_config(&config)?;
        Ok(Self {
            config,
            matcher,
            forwarder,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<Runtime>>,
}

impl AppState {
    fn new(runtime: Runtime) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(runtime)),
        }
    }

    /// Swap in a runtime built from `config`. The previous runtime stays
    /// alive until its in-flight requests finish.
    pub fn apply(&self, config: ForwarderConfig) -> Result<(), ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let current = self.inner.load();
        if current.config.listener.bind_address != config.listener.bind_address {
            tracing::warn!(
                bind_address = %config.listener.bind_address,
                "listener.bind_address change requires a restart"
            );
        }

        let runtime =
            Runtime::from_config(config).map_err(|e| ConfigError::Validation(vec![e]))?;
        tracing::info!(
            mode = ?runtime.config.upstream.mode,
            path_prefixes = ?runtime.config.routes.path_prefixes,
            "Configuration applied"
        );
        self.inner.store(Arc::new(runtime));
        Ok(())
    }
}

/// HTTP server for the edge forwarder.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ForwarderConfig) -> Result<Self, ValidationError> {
        let state = AppState::new(Runtime::from_config(config)?);
        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .request_id()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(RequestIdLayer)
    }

    /// Handle to the live state, for applying configuration out of band.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the server until `shutdown` fires, applying configs received on
    /// `config_updates` as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ForwarderConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reload_state = self.state.clone();
        let reload_task = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = reload_state.apply(config) {
                    tracing::error!(error = %e, "Rejected configuration update");
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        reload_task.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forwarding handler: route check, then resolve/forward/relay.
async fn forward_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let runtime = state.inner.load_full();
    let method = request.method().clone();

    if !runtime.matcher.matches(&request) {
        tracing::debug!(peer = %peer, path = request.uri().path(), "No route matched");
        metrics::record_request(method.as_str(), 404, "unrouted", start_time);
        return error_response(StatusCode::NOT_FOUND);
    }

    match runtime.forwarder.forward(request).await {
        Ok(response) => {
            metrics::record_request(
                method.as_str(),
                response.status().as_u16(),
                "forwarded",
                start_time,
            );
            response
        }
        Err(e) => {
            let kind = e.kind();
            if kind.is_client_error() {
                tracing::warn!(peer = %peer, kind = kind.as_str(), error = %e, "Rejected request");
            } else {
                tracing::error!(kind = kind.as_str(), error = %e, "Forwarding failed");
            }
            metrics::record_error(kind);
            metrics::record_request(
                method.as_str(),
                kind.status_code().as_u16(),
                kind.as_str(),
                start_time,
            );
            e.into_response()
        }
    }
}
