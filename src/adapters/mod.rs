// src/adapters/mod.rs
pub mod certificates;
pub mod enumeration;
pub mod probe;
pub mod template_scan;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ToolsConfig;

pub use certificates::{CertificateLog, CrtShClient};
pub use enumeration::EnumerationAdapter;
pub use probe::{ProbeAdapter, ProbeRecord};
pub use template_scan::{TemplateRecord, TemplateScanAdapter};

/// Why an external tool produced no data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterFailure {
    #[error("{tool} is not installed or not on PATH")]
    Missing { tool: String },

    #[error("{tool} timed out after {seconds} seconds")]
    TimedOut { tool: String, seconds: u64 },

    #[error("{tool} exited with status {code:?}: {stderr}")]
    NonZeroExit {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} could not be run: {message}")]
    Spawn { tool: String, message: String },

    #[error("{tool} request failed: {message}")]
    Request { tool: String, message: String },

    #[error("{tool} returned unreadable output: {message}")]
    InvalidOutput { tool: String, message: String },
}

impl AdapterFailure {
    pub fn tool(&self) -> &str {
        match self {
            AdapterFailure::Missing { tool }
            | AdapterFailure::TimedOut { tool, .. }
            | AdapterFailure::NonZeroExit { tool, .. }
            | AdapterFailure::Spawn { tool, .. }
            | AdapterFailure::Request { tool, .. }
            | AdapterFailure::InvalidOutput { tool, .. } => tool,
        }
    }
}

/// The scanning capabilities the correlation engine depends on.
///
/// Implemented by [`CommandLineScanner`] for real runs and by in-process fakes in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExternalScanner: Send + Sync {
    /// Passive subdomain enumeration for `domain`
    async fn enumerate(&self, domain: &str) -> Result<Vec<String>, AdapterFailure>;

    /// HTTP probing of `hosts`; only hosts that answered are returned
    async fn probe(&self, hosts: &[String]) -> Result<Vec<ProbeRecord>, AdapterFailure>;

    /// Template-based vulnerability scanning of `urls`
    async fn template_scan(&self, urls: &[String]) -> Result<Vec<TemplateRecord>, AdapterFailure>;
}

/// Scanner backed by the configured command-line tools
pub struct CommandLineScanner {
    enumeration: EnumerationAdapter,
    probe: ProbeAdapter,
    template_scan: TemplateScanAdapter,
}

impl CommandLineScanner {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            enumeration: EnumerationAdapter::new(tools.enumeration.clone()),
            probe: ProbeAdapter::new(tools.probe.clone()),
            template_scan: TemplateScanAdapter::new(tools.template_scan.clone()),
        }
    }
}

#[async_trait]
impl ExternalScanner for CommandLineScanner {
    async fn enumerate(&self, domain: &str) -> Result<Vec<String>, AdapterFailure> {
        self.enumeration.run(domain).await
    }

    async fn probe(&self, hosts: &[String]) -> Result<Vec<ProbeRecord>, AdapterFailure> {
        self.probe.run(hosts).await
    }

    async fn template_scan(&self, urls: &[String]) -> Result<Vec<TemplateRecord>, AdapterFailure> {
        self.template_scan.run(urls).await
    }
}
