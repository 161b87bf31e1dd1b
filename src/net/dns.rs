//! Name resolution with static overrides.
//!
//! Hosts listed in `upstream.resolve` are answered from the table; everything
//! else goes through the system resolver. The connector fills in the port
//! from the request URI, so table entries carry port 0.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use hyper_util::client::legacy::connect::dns::{GaiResolver, Name};
use tower::Service;

type ResolveFuture = Pin<Box<dyn Future<Output = Result<std::vec::IntoIter<SocketAddr>, io::Error>> + Send>>;

/// Resolver consulting a static host table before DNS.
#[derive(Clone)]
pub struct OverrideResolver {
    overrides: Arc<HashMap<String, IpAddr>>,
    system: GaiResolver,
}

impl OverrideResolver {
    pub fn new(overrides: &HashMap<String, IpAddr>) -> Self {
        let overrides = overrides
            .iter()
            .map(|(host, ip)| (host.to_ascii_lowercase(), *ip))
            .collect();
        Self {
            overrides: Arc::new(overrides),
            system: GaiResolver::new(),
        }
    }

    /// Address pinned for `host`, if any.
    pub fn lookup_override(&self, host: &str) -> Option<IpAddr> {
        self.overrides.get(&host.to_ascii_lowercase()).copied()
    }
}

impl std::fmt::Debug for OverrideResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideResolver")
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl Service<Name> for OverrideResolver {
    type Response = std::vec::IntoIter<SocketAddr>;
    type Error = io::Error;
    type Future = ResolveFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, name: Name) -> Self::Future {
        if let Some(ip) = self.lookup_override(name.as_str()) {
            tracing::trace!(host = name.as_str(), ip = %ip, "Resolved from override table");
            let addrs = vec![SocketAddr::new(ip, 0)];
            return Box::pin(async move { Ok(addrs.into_iter()) });
        }

        let lookup = self.system.call(name);
        Box::pin(async move {
            let addrs: Vec<SocketAddr> = lookup.await?.collect();
            Ok(addrs.into_iter())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_override_short_circuits_dns() {
        let mut table = HashMap::new();
        table.insert("Tenvexity.api.einsum.org".to_string(), "10.1.2.3".parse().unwrap());
        let mut resolver = OverrideResolver::new(&table);

        let addrs: Vec<SocketAddr> = resolver
            .call(Name::from_str("tenvexity.api.einsum.org").unwrap())
            .await
            .unwrap()
            .collect();

        assert_eq!(addrs, vec!["10.1.2.3:0".parse::<SocketAddr>().unwrap()]);
        assert_eq!(resolver.lookup_override("optimize.api.einsum.org"), None);
    }
}
