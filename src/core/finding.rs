use std::collections::HashMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::adapters::template_scan::TemplateRecord;

/// Finding severity, most severe first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Display order: critical down to info
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Parse severity from string
    pub fn parse(s: &str) -> Option<Severity> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            "info" | "informational" => Some(Severity::Info),
            _ => None,
        }
    }

    /// Unknown or absent severities count as informational
    pub fn classify(raw: Option<&str>) -> Severity {
        raw.and_then(Severity::parse).unwrap_or(Severity::Info)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Info => "Informational",
        }
    }

    fn index(&self) -> usize {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single observation from the template scanner
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub template_id: String,
    pub matched_url: String,
    /// Zero-based repeat count of the same template on the same target
    pub occurrence: usize,
    pub severity: Severity,
    pub title: String,
    pub description: Option<String>,
}

impl Finding {
    pub fn identity(&self) -> (&str, &str, usize) {
        (&self.template_id, &self.matched_url, self.occurrence)
    }
}

/// Overall risk of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    Informational,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Critical => "critical",
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
            RiskLevel::Informational => "informational",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    counts: [usize; 5],
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> usize {
        self.counts[severity.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Counts in display order
    pub fn iter(&self) -> impl Iterator<Item = (Severity, usize)> + '_ {
        Severity::ALL.iter().map(move |severity| (*severity, self.get(*severity)))
    }

    fn increment(&mut self, severity: Severity) {
        self.counts[severity.index()] += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskSummary {
    pub counts: SeverityCounts,
    pub risk_level: RiskLevel,
}

/// Collects template-scan findings in discovery order
#[derive(Debug, Default)]
pub struct FindingAggregator {
    findings: Vec<Finding>,
    occurrences: HashMap<(String, String), usize>,
}

impl FindingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and store raw scanner records; returns how many were added
    pub fn ingest<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = TemplateRecord>,
    {
        let before = self.findings.len();

        for record in records {
            let severity = Severity::classify(record.severity.as_deref());
            let key = (record.template_id.clone(), record.matched_at.clone());
            let occurrence = self.occurrences.entry(key).or_insert(0);

            self.findings.push(Finding {
                title: record.name.clone().unwrap_or_else(|| record.template_id.clone()),
                template_id: record.template_id,
                matched_url: record.matched_at,
                occurrence: *occurrence,
                severity,
                description: record.description,
            });
            *occurrence += 1;
        }

        let added = self.findings.len() - before;
        debug!("Ingested {} findings ({} total)", added, self.findings.len());
        added
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Per-severity counts and the most severe level present
    pub fn summary(&self) -> RiskSummary {
        let mut counts = SeverityCounts::default();
        for finding in &self.findings {
            counts.increment(finding.severity);
        }

        let risk_level = if counts.get(Severity::Critical) > 0 {
            RiskLevel::Critical
        } else if counts.get(Severity::High) > 0 {
            RiskLevel::High
        } else if counts.get(Severity::Medium) > 0 {
            RiskLevel::Medium
        } else if counts.total() > 0 {
            RiskLevel::Low
        } else {
            RiskLevel::Informational
        };

        RiskSummary { counts, risk_level }
    }

    /// Non-empty severity buckets, most severe first, discovery order inside each
    pub fn grouped(&self) -> Vec<(Severity, Vec<&Finding>)> {
        Severity::ALL
            .iter()
            .map(|severity| {
                let bucket: Vec<&Finding> = self
                    .findings
                    .iter()
                    .filter(|finding| finding.severity == *severity)
                    .collect();
                (*severity, bucket)
            })
            .filter(|(_, bucket)| !bucket.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(template: &str, target: &str, severity: Option<&str>) -> TemplateRecord {
        TemplateRecord {
            template_id: template.to_string(),
            matched_at: target.to_string(),
            severity: severity.map(str::to_string),
            name: None,
            description: None,
        }
    }

    #[test]
    fn test_high_high_low_is_high_risk() {
        let mut aggregator = FindingAggregator::new();
        aggregator.ingest(vec![
            record("cors-misconfig", "https://a.example.com", Some("high")),
            record("exposed-git", "https://b.example.com", Some("high")),
            record("missing-hsts", "https://a.example.com", Some("low")),
        ]);

        let summary = aggregator.summary();
        assert_eq!(summary.counts.get(Severity::High), 2);
        assert_eq!(summary.counts.get(Severity::Low), 1);
        assert_eq!(summary.counts.get(Severity::Critical), 0);
        assert_eq!(summary.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_one_critical_outranks_many_lows() {
        let mut aggregator = FindingAggregator::new();
        aggregator.ingest((0..100).map(|i| record("t", &format!("https://{}.example.com", i), Some("low"))));
        assert_eq!(aggregator.summary().risk_level, RiskLevel::Low);

        aggregator.ingest(vec![record("rce", "https://x.example.com", Some("CRITICAL"))]);
        assert_eq!(aggregator.summary().risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_empty_run_is_informational() {
        let aggregator = FindingAggregator::new();
        let summary = aggregator.summary();
        assert_eq!(summary.risk_level, RiskLevel::Informational);
        assert_eq!(summary.counts.total(), 0);
    }

    #[test]
    fn test_info_only_run_is_low() {
        let mut aggregator = FindingAggregator::new();
        aggregator.ingest(vec![record("tech-detect", "https://a.example.com", Some("info"))]);
        assert_eq!(aggregator.summary().risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_unknown_and_missing_severity_default_to_info() {
        let mut aggregator = FindingAggregator::new();
        aggregator.ingest(vec![
            record("a", "https://a.example.com", Some("unknown")),
            record("b", "https://a.example.com", None),
            record("c", "https://a.example.com", Some("")),
        ]);

        let summary = aggregator.summary();
        assert_eq!(summary.counts.get(Severity::Info), 3);
        assert_eq!(summary.counts.total(), aggregator.len());
    }

    #[test]
    fn test_grouping_order_and_discovery_order() {
        let mut aggregator = FindingAggregator::new();
        aggregator.ingest(vec![
            record("first-low", "https://a.example.com", Some("low")),
            record("crit", "https://a.example.com", Some("critical")),
            record("second-low", "https://a.example.com", Some("low")),
            record("med", "https://a.example.com", Some("medium")),
        ]);

        let groups = aggregator.grouped();
        let order: Vec<Severity> = groups.iter().map(|(severity, _)| *severity).collect();
        assert_eq!(order, vec![Severity::Critical, Severity::Medium, Severity::Low]);

        let lows: Vec<&str> = groups[2].1.iter().map(|f| f.template_id.as_str()).collect();
        assert_eq!(lows, vec!["first-low", "second-low"]);
    }

    #[test]
    fn test_repeated_matches_get_distinct_occurrences() {
        let mut aggregator = FindingAggregator::new();
        aggregator.ingest(vec![
            record("exposed-panel", "https://a.example.com/admin", Some("medium")),
            record("exposed-panel", "https://a.example.com/admin", Some("medium")),
            record("exposed-panel", "https://b.example.com/admin", Some("medium")),
        ]);

        let identities: Vec<_> = aggregator.findings().iter().map(Finding::identity).collect();
        assert_eq!(identities[0].2, 0);
        assert_eq!(identities[1].2, 1);
        assert_eq!(identities[2].2, 0);
        assert_ne!(identities[0], identities[1]);
    }

    #[test]
    fn test_counts_sum_to_ingested() {
        let severities = ["critical", "high", "bogus", "medium", "low", "info", "HIGH"];
        let mut aggregator = FindingAggregator::new();
        let added = aggregator.ingest(
            severities
                .iter()
                .enumerate()
                .map(|(i, s)| record(&format!("t{}", i), "https://a.example.com", Some(s))),
        );

        assert_eq!(added, severities.len());
        assert_eq!(aggregator.summary().counts.total(), severities.len());
    }
}
