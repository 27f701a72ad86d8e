use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use url::Url;

/// Whether an asset answered an active probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Unknown,
    Live,
    Dead,
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liveness::Unknown => write!(f, "unknown"),
            Liveness::Live => write!(f, "live"),
            Liveness::Dead => write!(f, "dead"),
        }
    }
}

/// Where a hostname was first or subsequently seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiscoverySource {
    Enumeration,
    CertificateLog,
    Bruteforce,
    Probe,
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoverySource::Enumeration => write!(f, "enumeration"),
            DiscoverySource::CertificateLog => write!(f, "certificate log"),
            DiscoverySource::Bruteforce => write!(f, "bruteforce"),
            DiscoverySource::Probe => write!(f, "probe"),
        }
    }
}

/// A discovered hostname and everything the tools reported about it
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub hostname: String,
    pub addresses: BTreeSet<IpAddr>,
    pub sources: BTreeSet<DiscoverySource>,
    /// URL the prober last answered on
    pub url: Option<String>,
    pub status_code: Option<u16>,
    pub server: Option<String>,
    pub title: Option<String>,
    pub technologies: Vec<String>,
    pub liveness: Liveness,
}

impl Asset {
    pub fn new(hostname: String, source: DiscoverySource) -> Self {
        Self {
            hostname,
            addresses: BTreeSet::new(),
            sources: BTreeSet::from([source]),
            url: None,
            status_code: None,
            server: None,
            title: None,
            technologies: Vec::new(),
            liveness: Liveness::Unknown,
        }
    }

    pub fn is_live(&self) -> bool {
        self.liveness == Liveness::Live
    }
}

/// Reduce a hostname or URL to the identity used by the registry.
///
/// Drops the scheme, any credentials, port, path, query and fragment, a leading
/// wildcard label and trailing dots, and lower-cases the rest. Returns an empty
/// string when nothing host-like is left.
pub fn normalize_hostname(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let host = match Url::parse(&with_scheme) {
        Ok(url) => url.host_str().unwrap_or_default().to_string(),
        Err(_) => fallback_host(trimmed),
    };

    let host = host.to_lowercase();
    let host = host.strip_prefix("*.").unwrap_or(&host);
    host.trim_end_matches('.').to_string()
}

fn fallback_host(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);

    without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .to_string()
}
