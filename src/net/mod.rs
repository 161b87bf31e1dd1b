//! Upstream networking subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarded request (absolute URI)
//!     → client.rs (pooled hyper client, HTTP/1.1)
//!     → HTTPS connector (rustls, webpki roots) or plain TCP
//!     → dns.rs (static override table, then system resolver)
//!     → Backend origin
//! ```
//!
//! # Design Decisions
//! - One client per loaded configuration, shared by all requests
//! - TLS verification is never disabled
//! - Connect timeout enforced by the connector

pub mod client;
pub mod dns;

pub use client::{build_client, UpstreamClient};
pub use dns::OverrideResolver;
