pub mod adapters;
pub mod analysis;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod logging;
pub mod reporting;
pub mod utils;

// Re-export main types for easier access
pub use adapters::{AdapterFailure, CertificateLog, CommandLineScanner, ExternalScanner};
pub use config::Config;
pub use core::{Asset, AssetRegistry, Finding, FindingAggregator, RiskLevel, Severity};
pub use engine::{PipelineOutcome, ReconPipeline};
pub use error::{TrimurtiError, TrimurtiResult};
pub use reporting::{ReportBuilder, ReportDocument, ReportFormat, ReportManager};
