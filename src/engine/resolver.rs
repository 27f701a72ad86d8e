// src/engine/resolver.rs
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use super::parallel::BoundedPool;

/// Prefixes tried during active brute-force enumeration
pub const COMMON_SUBDOMAINS: [&str; 23] = [
    "www", "mail", "remote", "blog", "webmail", "server", "ns1", "ns2", "smtp", "secure", "vpn", "m",
    "shop", "ftp", "cdn", "api", "dev", "staging", "app", "test", "admin", "portal", "intranet",
];

/// Hostname to address resolution
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Addresses for `hostname`; empty when it does not resolve
    async fn resolve(&self, hostname: &str) -> Vec<IpAddr>;
}

/// Resolver backed by the operating system's name service
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, hostname: &str) -> Vec<IpAddr> {
        match tokio::time::timeout(self.timeout, tokio::net::lookup_host((hostname, 80))).await {
            Ok(Ok(addrs)) => {
                let unique: BTreeSet<IpAddr> = addrs.map(|addr| addr.ip()).collect();
                unique.into_iter().collect()
            }
            Ok(Err(e)) => {
                trace!("{} did not resolve: {}", hostname, e);
                Vec::new()
            }
            Err(_) => {
                trace!("Resolving {} timed out after {:?}", hostname, self.timeout);
                Vec::new()
            }
        }
    }
}

/// Candidate hostnames for brute-force enumeration of `domain`
pub fn bruteforce_candidates(domain: &str) -> Vec<String> {
    let domain = domain.trim().trim_end_matches('.');
    COMMON_SUBDOMAINS
        .iter()
        .map(|prefix| format!("{}.{}", prefix, domain))
        .collect()
}

/// Whether the target is a literal IP address rather than a domain
pub fn is_ip_address(target: &str) -> bool {
    let target = target.trim().trim_start_matches('[').trim_end_matches(']');
    target.parse::<IpAddr>().is_ok()
}

/// Resolve every hostname through the pool; results keep input order
pub async fn resolve_all(
    pool: &BoundedPool,
    resolver: Arc<dyn HostResolver>,
    hostnames: Vec<String>,
) -> Vec<(String, Vec<IpAddr>)> {
    debug!("Resolving {} hostnames", hostnames.len());

    pool.run(hostnames, move |hostname| {
        let resolver = resolver.clone();
        async move {
            let addresses = resolver.resolve(&hostname).await;
            (hostname, addresses)
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates() {
        let candidates = bruteforce_candidates("example.com.");
        assert_eq!(candidates.len(), COMMON_SUBDOMAINS.len());
        assert_eq!(candidates[0], "www.example.com");
        assert!(candidates.contains(&"intranet.example.com".to_string()));
    }

    #[test]
    fn test_is_ip_address() {
        assert!(is_ip_address("10.0.0.1"));
        assert!(is_ip_address("[::1]"));
        assert!(!is_ip_address("example.com"));
        assert!(!is_ip_address("10.0.0"));
    }

    #[tokio::test]
    async fn test_resolve_all_keeps_order() {
        let mut resolver = MockHostResolver::new();
        resolver.expect_resolve().returning(|hostname| {
            if hostname == "www.example.com" {
                vec!["10.0.0.1".parse().unwrap()]
            } else {
                Vec::new()
            }
        });

        let pool = BoundedPool::new(2);
        let hostnames = vec!["www.example.com".to_string(), "nope.example.com".to_string()];
        let results = resolve_all(&pool, Arc::new(resolver), hostnames).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "www.example.com");
        assert_eq!(results[0].1.len(), 1);
        assert!(results[1].1.is_empty());
    }

    #[tokio::test]
    async fn test_system_resolver_handles_localhost() {
        let resolver = SystemResolver::new(Duration::from_secs(5));
        let addresses = resolver.resolve("localhost").await;
        assert!(addresses.iter().all(|ip| ip.is_loopback()));
    }
}
