//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, prefixes and the upstream naming inputs
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ForwarderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;
use thiserror::Error;
use url::Url;

use crate::config::schema::{ForwarderConfig, TargetMode};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("routes.path_prefixes must not be empty")]
    NoPathPrefixes,

    #[error("routes.path_prefixes entry `{0}` must start with '/'")]
    PathPrefix(String),

    #[error("upstream.base_domain `{0}` is not a valid host")]
    BaseDomain(String),

    #[error("upstream.fixed_target `{0}`: {1}")]
    FixedTarget(String, String),

    #[error("upstream.port must be non-zero")]
    Port,

    #[error("timeouts.{0} must be greater than zero")]
    Timeout(&'static str),

    #[error("limits.max_body_bytes must be greater than zero")]
    BodyLimit,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),

    #[error("upstream TLS setup failed: {0}")]
    UpstreamTls(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ForwarderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if SocketAddr::from_str(&config.listener.bind_address).is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.routes.path_prefixes.is_empty() {
        errors.push(ValidationError::NoPathPrefixes);
    }
    for prefix in &config.routes.path_prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::PathPrefix(prefix.clone()));
        }
    }

    let upstream = &config.upstream;
    match upstream.mode {
        TargetMode::Subdomain => {
            let base = upstream.base_domain.trim();
            if base.is_empty() || base.contains(':') || Authority::from_str(base).is_err() {
                errors.push(ValidationError::BaseDomain(upstream.base_domain.clone()));
            }
            if upstream.port == Some(0) {
                errors.push(ValidationError::Port);
            }
        }
        TargetMode::Fixed => {
            if let Err(reason) = check_fixed_target(&upstream.fixed_target) {
                errors.push(ValidationError::FixedTarget(upstream.fixed_target.clone(), reason));
            }
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Timeout("connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Timeout("upstream_secs"));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::BodyLimit);
    }

    if config.observability.metrics_enabled
        && SocketAddr::from_str(&config.observability.metrics_address).is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A fixed target must be a bare http(s) origin.
pub(crate) fn check_fixed_target(target: &str) -> Result<(), String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.path() != "/" || url.query().is_some() {
        return Err("must not carry a path or query".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ForwarderConfig::default()).is_ok());
        assert!(validate_config(&ForwarderConfig::local_development()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = ForwarderConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.routes.path_prefixes = vec!["api".into()];
        config.upstream.base_domain = String::new();
        config.timeouts.upstream_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::BindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::PathPrefix("api".into())));
        assert!(errors.contains(&ValidationError::Timeout("upstream_secs")));
    }

    #[test]
    fn test_fixed_target_checked_only_in_fixed_mode() {
        let mut config = ForwarderConfig::default();
        config.upstream.fixed_target = "ftp://127.0.0.1:5000".into();
        assert!(validate_config(&config).is_ok());

        config.upstream.mode = TargetMode::Fixed;
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::FixedTarget(_, _)));

        config.upstream.fixed_target = "http://127.0.0.1:5000/api".into();
        assert!(validate_config(&config).is_err());

        config.upstream.fixed_target = "http://127.0.0.1:5000".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_base_domain_rejects_ports() {
        let mut config = ForwarderConfig::default();
        config.upstream.base_domain = "einsum.org:443".into();
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::BaseDomain("einsum.org:443".into())]
        );
    }
}
