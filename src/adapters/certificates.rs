// src/adapters/certificates.rs
use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::AdapterFailure;
use crate::config::CertificateConfig;
use crate::core::normalize_hostname;
use crate::utils::http::HttpClient;

const TOOL: &str = "crt.sh";

/// Passive lookup of hostnames named in certificate transparency logs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateLog: Send + Sync {
    /// Subdomains of `domain` found in logged certificates, sorted and deduplicated
    async fn search(&self, domain: &str) -> Result<Vec<String>, AdapterFailure>;
}

#[derive(Debug, Deserialize)]
struct CrtShEntry {
    #[serde(default)]
    common_name: Option<String>,
    /// One or more names separated by newlines
    #[serde(default)]
    name_value: Option<String>,
}

/// crt.sh JSON search client
pub struct CrtShClient {
    client: HttpClient,
    endpoint: String,
}

impl CrtShClient {
    pub fn new(config: &CertificateConfig, user_agent: &str) -> Result<Self> {
        let client = HttpClient::new(Some(user_agent.to_string()), Some(config.timeout_seconds))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl CertificateLog for CrtShClient {
    async fn search(&self, domain: &str) -> Result<Vec<String>, AdapterFailure> {
        let pattern = format!("%.{}", domain);
        let response = self
            .client
            .get(&self.endpoint, &[("q", pattern.as_str()), ("output", "json")])
            .await
            .map_err(|e| AdapterFailure::Request {
                tool: TOOL.to_string(),
                message: format!("{:#}", e),
            })?;

        let body = response.text().await.map_err(|e| AdapterFailure::Request {
            tool: TOOL.to_string(),
            message: e.to_string(),
        })?;

        let hostnames = parse_entries(&body, domain)?;
        info!("{} lists {} subdomains of {}", TOOL, hostnames.len(), domain);
        Ok(hostnames)
    }
}

/// Extract the subdomains of `domain` from a crt.sh JSON response.
///
/// Wildcard labels are stripped and the apex itself is left out. An empty body
/// means no certificates were logged.
pub fn parse_entries(body: &str, domain: &str) -> Result<Vec<String>, AdapterFailure> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<CrtShEntry> = serde_json::from_str(body).map_err(|e| AdapterFailure::InvalidOutput {
        tool: TOOL.to_string(),
        message: e.to_string(),
    })?;

    let apex = normalize_hostname(domain);
    let suffix = format!(".{}", apex);

    let mut hostnames = BTreeSet::new();
    for entry in &entries {
        let names = entry
            .name_value
            .iter()
            .flat_map(|value| value.lines())
            .chain(entry.common_name.as_deref());

        for name in names {
            let hostname = normalize_hostname(name);
            if hostname.ends_with(&suffix) {
                hostnames.insert(hostname);
            } else if !hostname.is_empty() && hostname != apex {
                debug!("Ignoring out-of-scope certificate name {}", name.trim());
            }
        }
    }

    Ok(hostnames.into_iter().collect())
}
