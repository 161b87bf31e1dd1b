//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, headers)
//!     → matcher.rs (is the path under a registered prefix?)
//!     → resolver.rs (host → subdomain → upstream target, or fixed target)
//!     → Return: UpstreamTarget or a forwarding error
//! ```
//!
//! # Design Decisions
//! - Matchers and resolvers compiled from config, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same host always resolves to the same target

pub mod matcher;
pub mod resolver;

pub use matcher::{AnyMatcher, Matcher, PathPrefixMatcher};
pub use resolver::{
    build_resolver, request_host, subdomain_of, FixedResolver, SubdomainResolver, TargetResolver,
    UpstreamTarget,
};
