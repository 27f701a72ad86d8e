// src/engine/mod.rs
mod parallel;
mod pipeline;
mod resolver;
mod sink;

pub use parallel::BoundedPool;
pub use pipeline::{PipelineOutcome, PipelineSettings, ReconPipeline, StageFailure};
pub use resolver::{bruteforce_candidates, is_ip_address, resolve_all, HostResolver, SystemResolver, COMMON_SUBDOMAINS};
pub use sink::{EventSink, MemorySink, PipelineEvent, Stage, TracingSink};
