//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, HTTP/1.1 + HTTP/2)
//!     → request.rs (request ID into extensions)
//!     → [routing decides whether the path is registered]
//!     → [forwarder resolves, sends and relays]
//!     → headers.rs (hop-by-hop stripping on both legs)
//!     → response.rs (generic error bodies when forwarding fails)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer, Runtime};
