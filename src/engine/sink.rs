// src/engine/sink.rs
use std::fmt;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::adapters::AdapterFailure;

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Enumeration,
    CertificateSearch,
    Bruteforce,
    Resolution,
    Probe,
    TemplateScan,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Enumeration => "enumeration",
            Stage::CertificateSearch => "certificate search",
            Stage::Bruteforce => "brute-force",
            Stage::Resolution => "resolution",
            Stage::Probe => "probe",
            Stage::TemplateScan => "template scan",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted(Stage),
    StageCompleted { stage: Stage, items: usize },
    StageSkipped { stage: Stage, reason: String },
    AdapterFailed { stage: Stage, failure: AdapterFailure },
}

/// Receives progress and failure events from a pipeline run
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::StageStarted(stage) => info!("Starting {} stage", stage),
            PipelineEvent::StageCompleted { stage, items } => {
                info!("Completed {} stage ({} results)", stage, items)
            }
            PipelineEvent::StageSkipped { stage, reason } => info!("Skipping {} stage: {}", stage, reason),
            PipelineEvent::AdapterFailed { stage, failure } => {
                warn!("{} stage produced no data: {}", stage, failure)
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }

    pub fn failures(&self) -> Vec<(Stage, AdapterFailure)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                PipelineEvent::AdapterFailed { stage, failure } => Some((*stage, failure.clone())),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: PipelineEvent) {
        self.events.lock().push(event);
    }
}
