//! Forwarding error taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

/// Coarse classification of a forwarding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingHost,
    PayloadTooLarge,
    UpstreamUnreachable,
    RelayFailure,
    Timeout,
}

impl ErrorKind {
    /// Status returned to the caller for this kind of failure.
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::MissingHost => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::UpstreamUnreachable | ErrorKind::RelayFailure => StatusCode::BAD_GATEWAY,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Stable label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingHost => "missing_host",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::UpstreamUnreachable => "upstream_unreachable",
            ErrorKind::RelayFailure => "relay_failure",
            ErrorKind::Timeout => "timeout",
        }
    }

    /// Failures caused by the caller's request rather than the upstream.
    pub fn is_client_error(self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Errors that terminate a single forwarded exchange.
///
/// Display output may name the upstream and is meant for logs only; callers
/// receive the generic status built in `http::response`.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Host header absent, empty, or not a usable host.
    #[error("missing or malformed Host header")]
    MissingHost,

    /// Request body larger than `limits.max_body_bytes`.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// DNS, connect, TLS or send failure before a response head arrived.
    #[error("upstream {target} unreachable: {reason}")]
    UpstreamUnreachable { target: String, reason: String },

    /// No response head within the configured deadline.
    #[error("upstream {target} did not respond within {secs}s")]
    Timeout { target: String, secs: u64 },

    /// Upstream body stream failed after the response head was relayed.
    #[error("relay from upstream failed: {0}")]
    RelayFailure(String),
}

impl ForwardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForwardError::MissingHost => ErrorKind::MissingHost,
            ForwardError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            ForwardError::UpstreamUnreachable { .. } => ErrorKind::UpstreamUnreachable,
            ForwardError::Timeout { .. } => ErrorKind::Timeout,
            ForwardError::RelayFailure(_) => ErrorKind::RelayFailure,
        }
    }
}
