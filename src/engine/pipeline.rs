// src/engine/pipeline.rs
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::parallel::BoundedPool;
use super::resolver::{bruteforce_candidates, is_ip_address, resolve_all, HostResolver};
use super::sink::{EventSink, PipelineEvent, Stage, TracingSink};
use crate::adapters::{AdapterFailure, CertificateLog, ExternalScanner};
use crate::config::PipelineConfig;
use crate::core::{normalize_hostname, AssetRegistry, FindingAggregator};
use crate::error::{TrimurtiError, TrimurtiResult};
use crate::reporting::{Narrative, ReportBuilder, ReportDocument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_concurrent_resolutions: usize,
    pub bruteforce: bool,
    pub max_scan_targets: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_resolutions: 20,
            bruteforce: true,
            max_scan_targets: 10,
        }
    }
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_concurrent_resolutions: config.max_concurrent_resolutions,
            bruteforce: config.bruteforce,
            max_scan_targets: config.max_scan_targets,
        }
    }
}

/// An adapter failure together with the stage it cost
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: Stage,
    pub failure: AdapterFailure,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage: {}", self.stage, self.failure)
    }
}

/// Everything a run collected, including partial results after failures
#[derive(Debug)]
pub struct PipelineOutcome {
    pub target: String,
    pub registry: AssetRegistry,
    pub findings: FindingAggregator,
    pub failures: Vec<StageFailure>,
}

impl PipelineOutcome {
    pub fn has_data(&self) -> bool {
        !self.registry.is_empty() || !self.findings.is_empty()
    }

    pub fn build_report(&self, title: &str, narratives: Vec<Narrative>) -> ReportDocument {
        let snapshot = self.registry.snapshot();
        let mut builder = ReportBuilder::new(&self.target, &snapshot, &self.findings)
            .title(title)
            .failures(&self.failures);
        for narrative in narratives {
            builder = builder.narrative(narrative);
        }
        builder.build()
    }
}

/// Recon correlation pipeline: enumeration, certificate search, brute-force, resolution,
/// probing and template scanning
pub struct ReconPipeline {
    scanner: Arc<dyn ExternalScanner>,
    resolver: Arc<dyn HostResolver>,
    certificates: Option<Arc<dyn CertificateLog>>,
    sink: Arc<dyn EventSink>,
    pool: BoundedPool,
    settings: PipelineSettings,
}

impl ReconPipeline {
    pub fn new(
        scanner: Arc<dyn ExternalScanner>,
        resolver: Arc<dyn HostResolver>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            scanner,
            resolver,
            certificates: None,
            sink: Arc::new(TracingSink),
            pool: BoundedPool::new(settings.max_concurrent_resolutions),
            settings,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Also search certificate transparency logs for subdomains
    pub fn with_certificate_log(mut self, certificates: Arc<dyn CertificateLog>) -> Self {
        self.certificates = Some(certificates);
        self
    }

    /// Run every stage against `target`. Adapter failures are recorded and the
    /// run continues with whatever data the other stages produced.
    pub async fn run(&self, target: &str) -> TrimurtiResult<PipelineOutcome> {
        let domain = normalize_hostname(target);
        if domain.is_empty() {
            return Err(TrimurtiError::InvalidInput(format!("'{}' is not a hostname or address", target)));
        }

        info!("Starting reconnaissance of {}", domain);

        let mut run = Run {
            registry: AssetRegistry::new(),
            findings: FindingAggregator::new(),
            failures: Vec::new(),
            sink: self.sink.as_ref(),
        };

        if is_ip_address(&domain) {
            run.registry.record_enumeration(&domain);
            let reason = "target is an IP address".to_string();
            for stage in [Stage::Enumeration, Stage::CertificateSearch, Stage::Bruteforce] {
                run.emit(PipelineEvent::StageSkipped { stage, reason: reason.clone() });
            }
        } else {
            self.enumerate(&mut run, &domain).await;
            self.certificate_search(&mut run, &domain).await;
            if self.settings.bruteforce {
                self.bruteforce(&mut run, &domain).await;
            } else {
                run.emit(PipelineEvent::StageSkipped {
                    stage: Stage::Bruteforce,
                    reason: "disabled".to_string(),
                });
            }
        }

        self.resolve(&mut run).await;
        self.probe(&mut run).await;
        self.template_scan(&mut run).await;

        info!(
            "Finished {}: {} assets, {} findings, {} failed stages",
            domain,
            run.registry.len(),
            run.findings.len(),
            run.failures.len()
        );

        Ok(PipelineOutcome {
            target: domain,
            registry: run.registry,
            findings: run.findings,
            failures: run.failures,
        })
    }

    async fn enumerate(&self, run: &mut Run<'_>, domain: &str) {
        run.emit(PipelineEvent::StageStarted(Stage::Enumeration));
        match self.scanner.enumerate(domain).await {
            Ok(hostnames) => {
                let added = hostnames
                    .iter()
                    .filter(|hostname| run.registry.record_enumeration(hostname))
                    .count();
                run.emit(PipelineEvent::StageCompleted { stage: Stage::Enumeration, items: added });
            }
            Err(failure) => run.fail(Stage::Enumeration, failure),
        }
    }

    async fn certificate_search(&self, run: &mut Run<'_>, domain: &str) {
        let Some(certificates) = &self.certificates else {
            run.emit(PipelineEvent::StageSkipped {
                stage: Stage::CertificateSearch,
                reason: "no certificate log configured".to_string(),
            });
            return;
        };

        run.emit(PipelineEvent::StageStarted(Stage::CertificateSearch));
        match certificates.search(domain).await {
            Ok(hostnames) => {
                let added = hostnames
                    .iter()
                    .filter(|hostname| run.registry.record_certificate(hostname))
                    .count();
                run.emit(PipelineEvent::StageCompleted { stage: Stage::CertificateSearch, items: added });
            }
            Err(failure) => run.fail(Stage::CertificateSearch, failure),
        }
    }

    async fn bruteforce(&self, run: &mut Run<'_>, domain: &str) {
        run.emit(PipelineEvent::StageStarted(Stage::Bruteforce));
        let resolved = resolve_all(&self.pool, self.resolver.clone(), bruteforce_candidates(domain)).await;

        let mut found = 0;
        for (hostname, addresses) in resolved {
            if addresses.is_empty() {
                continue;
            }
            debug!("Brute-force hit: {}", hostname);
            run.registry.record_bruteforce(&hostname, &addresses);
            found += 1;
        }
        run.emit(PipelineEvent::StageCompleted { stage: Stage::Bruteforce, items: found });
    }

    async fn resolve(&self, run: &mut Run<'_>) {
        let unresolved = run.registry.unresolved();
        if unresolved.is_empty() {
            run.emit(PipelineEvent::StageSkipped {
                stage: Stage::Resolution,
                reason: "every asset already has an address".to_string(),
            });
            return;
        }

        run.emit(PipelineEvent::StageStarted(Stage::Resolution));
        let resolved = resolve_all(&self.pool, self.resolver.clone(), unresolved).await;

        let mut count = 0;
        for (hostname, addresses) in resolved {
            if !addresses.is_empty() {
                run.registry.record_resolution(&hostname, &addresses);
                count += 1;
            }
        }
        run.emit(PipelineEvent::StageCompleted { stage: Stage::Resolution, items: count });
    }

    async fn probe(&self, run: &mut Run<'_>) {
        let hosts = run.registry.hostnames();
        if hosts.is_empty() {
            run.emit(PipelineEvent::StageSkipped {
                stage: Stage::Probe,
                reason: "no assets to probe".to_string(),
            });
            return;
        }

        run.emit(PipelineEvent::StageStarted(Stage::Probe));
        match self.scanner.probe(&hosts).await {
            Ok(records) => {
                for record in &records {
                    run.registry.record_probe(record);
                }
                let dead = run.registry.mark_unresponsive();
                debug!("{} hosts did not answer the probe", dead);
                run.emit(PipelineEvent::StageCompleted { stage: Stage::Probe, items: records.len() });
            }
            Err(failure) => run.fail(Stage::Probe, failure),
        }
    }

    async fn template_scan(&self, run: &mut Run<'_>) {
        let urls = run.registry.live_urls(self.settings.max_scan_targets);
        if urls.is_empty() {
            run.emit(PipelineEvent::StageSkipped {
                stage: Stage::TemplateScan,
                reason: "no live hosts".to_string(),
            });
            return;
        }

        run.emit(PipelineEvent::StageStarted(Stage::TemplateScan));
        match self.scanner.template_scan(&urls).await {
            Ok(records) => {
                let added = run.findings.ingest(records);
                run.emit(PipelineEvent::StageCompleted { stage: Stage::TemplateScan, items: added });
            }
            Err(failure) => run.fail(Stage::TemplateScan, failure),
        }
    }
}

/// Mutable state of one pipeline run
struct Run<'a> {
    registry: AssetRegistry,
    findings: FindingAggregator,
    failures: Vec<StageFailure>,
    sink: &'a dyn EventSink,
}

impl Run<'_> {
    fn emit(&self, event: PipelineEvent) {
        self.sink.emit(event);
    }

    fn fail(&mut self, stage: Stage, failure: AdapterFailure) {
        self.emit(PipelineEvent::AdapterFailed { stage, failure: failure.clone() });
        self.failures.push(StageFailure { stage, failure });
    }
}
