//! Upstream target resolution.
//!
//! # Responsibilities
//! - Extract the request host (Host header, or URI authority for HTTP/2)
//! - Derive the subdomain label and apply the naming convention
//! - Provide the fixed development target that ignores the host entirely
//!
//! # Design Decisions
//! - Subdomain is everything before the first '.', whole host if there is none
//! - Ports on the inbound host are ignored; the target port comes from config
//! - Labels are lower-cased and must be plain DNS labels, so nothing from the
//!   client can smuggle extra authority components into the target

use std::fmt;
use std::str::FromStr;

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::uri::{Authority, Scheme};
use axum::http::{Request, Uri};

use crate::config::{NamingConvention, TargetMode, UpstreamConfig, UpstreamScheme};
use crate::config::validation::{check_fixed_target, ValidationError};
use crate::forwarder::ForwardError;

/// Where a request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub scheme: Scheme,
    pub authority: Authority,
    /// Subdomain the target was derived from; `None` for the fixed target.
    pub subdomain: Option<String>,
}

impl UpstreamTarget {
    pub fn host(&self) -> &str {
        self.authority.host()
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// Strategy mapping an inbound request to its upstream origin.
pub trait TargetResolver: Send + Sync + fmt::Debug {
    fn resolve(&self, req: &Request<Body>) -> Result<UpstreamTarget, ForwardError>;
}

/// Build the resolver selected by the upstream configuration.
pub fn build_resolver(config: &UpstreamConfig) -> Result<Box<dyn TargetResolver>, ValidationError> {
    match config.mode {
        TargetMode::Subdomain => Ok(Box::new(SubdomainResolver::new(config)?)),
        TargetMode::Fixed => Ok(Box::new(FixedResolver::new(&config.fixed_target)?)),
    }
}

impl NamingConvention {
    /// Backend host for a subdomain under this convention.
    pub fn target_host(self, subdomain: &str, base_domain: &str) -> String {
        match self {
            NamingConvention::Dotted => format!("{subdomain}.api.{base_domain}"),
            NamingConvention::Underscore => format!("{subdomain}_api.{base_domain}"),
        }
    }
}

impl From<UpstreamScheme> for Scheme {
    fn from(scheme: UpstreamScheme) -> Self {
        match scheme {
            UpstreamScheme::Http => Scheme::HTTP,
            UpstreamScheme::Https => Scheme::HTTPS,
        }
    }
}

/// Leading label of a host: up to (not including) the first '.'.
pub fn subdomain_of(host: &str) -> &str {
    match host.find('.') {
        Some(idx) => &host[..idx],
        None => host,
    }
}

/// Host the client addressed, without any port.
pub fn request_host(req: &Request<Body>) -> Result<String, ForwardError> {
    let raw = match req.headers().get(HOST) {
        Some(value) => value.to_str().map_err(|_| ForwardError::MissingHost)?,
        None => match req.uri().authority() {
            Some(authority) => authority.as_str(),
            None => return Err(ForwardError::MissingHost),
        },
    };

    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ForwardError::MissingHost);
    }

    let authority = Authority::from_str(raw).map_err(|_| ForwardError::MissingHost)?;
    Ok(authority.host().to_ascii_lowercase())
}

fn is_dns_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Subdomain-based routing.
#[derive(Debug, Clone)]
pub struct SubdomainResolver {
    convention: NamingConvention,
    base_domain: String,
    scheme: Scheme,
    port: Option<u16>,
}

impl SubdomainResolver {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ValidationError> {
        let base_domain = config.base_domain.trim().trim_matches('.').to_ascii_lowercase();
        if base_domain.is_empty() || Authority::from_str(&base_domain).is_err() {
            return Err(ValidationError::BaseDomain(config.base_domain.clone()));
        }

        Ok(Self {
            convention: config.convention,
            base_domain,
            scheme: config.scheme.into(),
            port: config.port,
        })
    }
}

impl TargetResolver for SubdomainResolver {
    fn resolve(&self, req: &Request<Body>) -> Result<UpstreamTarget, ForwardError> {
        let host = request_host(req)?;
        let subdomain = subdomain_of(&host);
        if !is_dns_label(subdomain) {
            return Err(ForwardError::MissingHost);
        }

        let target_host = self.convention.target_host(subdomain, &self.base_domain);
        let authority = match self.port {
            Some(port) => Authority::from_str(&format!("{target_host}:{port}")),
            None => Authority::from_str(&target_host),
        }
        .map_err(|_| ForwardError::MissingHost)?;

        Ok(UpstreamTarget {
            scheme: self.scheme.clone(),
            authority,
            subdomain: Some(subdomain.to_string()),
        })
    }
}

/// Fixed target used for local development.
#[derive(Debug, Clone)]
pub struct FixedResolver {
    target: UpstreamTarget,
}

impl FixedResolver {
    pub fn new(origin: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::FixedTarget(origin.to_string(), reason.to_string());
        check_fixed_target(origin).map_err(|reason| invalid(&reason))?;

        let uri = Uri::from_str(origin).map_err(|e| invalid(&e.to_string()))?;
        let scheme = uri.scheme().cloned().ok_or_else(|| invalid("missing scheme"))?;
        let authority = uri.authority().cloned().ok_or_else(|| invalid("missing host"))?;

        Ok(Self {
            target: UpstreamTarget {
                scheme,
                authority,
                subdomain: None,
            },
        })
    }
}

impl TargetResolver for FixedResolver {
    fn resolve(&self, _req: &Request<Body>) -> Result<UpstreamTarget, ForwardError> {
        Ok(self.target.clone())
    }
}
