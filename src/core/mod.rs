pub mod asset;
pub mod finding;
pub mod registry;

pub use asset::{normalize_hostname, Asset, DiscoverySource, Liveness};
pub use finding::{Finding, FindingAggregator, RiskLevel, RiskSummary, Severity, SeverityCounts};
pub use registry::{AssetRegistry, RegistrySnapshot};
