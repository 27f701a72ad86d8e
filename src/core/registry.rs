// src/core/registry.rs
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::{debug, trace};

use super::asset::{normalize_hostname, Asset, DiscoverySource, Liveness};
use crate::adapters::probe::ProbeRecord;

/// Canonical inventory of every hostname seen during a run, keyed by normalized hostname.
///
/// All mutation goes through `&mut self`; concurrent producers hand their results to a
/// single writer that merges them in a fixed order.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: BTreeMap<String, Asset>,
}

/// Immutable view of the registry taken for reporting
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    pub assets: Vec<Asset>,
    pub total: usize,
    pub live: usize,
    /// Every identity that never answered a probe, in hostname order
    pub non_responsive: Vec<String>,
}

impl RegistrySnapshot {
    pub fn get(&self, hostname: &str) -> Option<&Asset> {
        let identity = normalize_hostname(hostname);
        self.assets.iter().find(|asset| asset.hostname == identity)
    }
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hostname reported by passive enumeration.
    ///
    /// Returns `true` when the hostname was not known before.
    pub fn record_enumeration(&mut self, hostname: &str) -> bool {
        self.upsert(hostname, DiscoverySource::Enumeration).map(|(_, created)| created).unwrap_or(false)
    }

    /// Record a hostname named in a certificate transparency log entry.
    pub fn record_certificate(&mut self, hostname: &str) -> bool {
        self.upsert(hostname, DiscoverySource::CertificateLog).map(|(_, created)| created).unwrap_or(false)
    }

    /// Record a brute-forced hostname that resolved to `addresses`.
    pub fn record_bruteforce(&mut self, hostname: &str, addresses: &[IpAddr]) -> bool {
        match self.upsert(hostname, DiscoverySource::Bruteforce) {
            Some((asset, created)) => {
                asset.addresses.extend(addresses.iter().copied());
                created
            }
            None => false,
        }
    }

    /// Attach resolved addresses to an already known hostname.
    pub fn record_resolution(&mut self, hostname: &str, addresses: &[IpAddr]) {
        let identity = normalize_hostname(hostname);
        if let Some(asset) = self.assets.get_mut(&identity) {
            asset.addresses.extend(addresses.iter().copied());
        }
    }

    /// Record one answer from the HTTP prober.
    ///
    /// Creates the asset when enumeration missed it and marks it live. Enrichment fields
    /// are replaced by the latest probe; addresses accumulate.
    pub fn record_probe(&mut self, record: &ProbeRecord) -> bool {
        let Some((asset, created)) = self.upsert(&record.url, DiscoverySource::Probe) else {
            debug!("Ignoring probe record without a hostname: {:?}", record.url);
            return false;
        };

        if let Some(ip) = record.ip.as_deref().and_then(|ip| ip.trim().parse::<IpAddr>().ok()) {
            asset.addresses.insert(ip);
        }
        asset.url = Some(record.url.clone());
        asset.status_code = record.status_code;
        asset.server = record.server.clone();
        asset.title = record.title.clone();
        asset.technologies = record.technologies.clone();
        asset.liveness = Liveness::Live;

        trace!("Probe marked {} live", asset.hostname);
        created
    }

    /// After a completed probe pass, every asset that did not answer is dead.
    pub fn mark_unresponsive(&mut self) -> usize {
        let mut marked = 0;
        for asset in self.assets.values_mut() {
            if asset.liveness == Liveness::Unknown {
                asset.liveness = Liveness::Dead;
                marked += 1;
            }
        }
        marked
    }

    pub fn get(&self, hostname: &str) -> Option<&Asset> {
        self.assets.get(&normalize_hostname(hostname))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// All identities in hostname order
    pub fn hostnames(&self) -> Vec<String> {
        self.assets.keys().cloned().collect()
    }

    /// Hostnames with no resolved address yet
    pub fn unresolved(&self) -> Vec<String> {
        self.assets
            .values()
            .filter(|asset| asset.addresses.is_empty())
            .map(|asset| asset.hostname.clone())
            .collect()
    }

    /// Probed URLs of live assets, in hostname order, at most `limit` of them
    pub fn live_urls(&self, limit: usize) -> Vec<String> {
        self.assets
            .values()
            .filter(|asset| asset.is_live())
            .filter_map(|asset| asset.url.clone())
            .take(limit)
            .collect()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let assets: Vec<Asset> = self.assets.values().cloned().collect();
        let live = assets.iter().filter(|asset| asset.is_live()).count();
        let non_responsive = assets
            .iter()
            .filter(|asset| !asset.is_live())
            .map(|asset| asset.hostname.clone())
            .collect();

        RegistrySnapshot {
            total: assets.len(),
            live,
            non_responsive,
            assets,
        }
    }

    fn upsert(&mut self, raw: &str, source: DiscoverySource) -> Option<(&mut Asset, bool)> {
        let identity = normalize_hostname(raw);
        if identity.is_empty() {
            return None;
        }

        let created = !self.assets.contains_key(&identity);
        let asset = self
            .assets
            .entry(identity.clone())
            .or_insert_with(|| Asset::new(identity, source));
        asset.sources.insert(source);
        Some((asset, created))
    }
}
