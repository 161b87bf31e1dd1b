//! einsum.org edge forwarder library

pub mod client;
pub mod config;
pub mod forwarder;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::ForwarderConfig;
pub use forwarder::{ForwardError, Forwarder};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
