// src/reporting/builder.rs
use std::fmt::Display;

use super::model::{Block, ReportDocument, Section, Table};
use crate::core::{Asset, Finding, FindingAggregator, RegistrySnapshot};

pub const DEFAULT_TITLE: &str = "Trimurti Penetration Test Report";

const EMPTY_CELL: &str = "-";

/// Free-form analysis text appended to the report as its own section
#[derive(Debug, Clone, PartialEq)]
pub struct Narrative {
    pub title: String,
    pub body: String,
}

impl Narrative {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Assembles the report document from an asset snapshot and the aggregated findings
pub struct ReportBuilder<'a> {
    title: String,
    target: &'a str,
    snapshot: &'a RegistrySnapshot,
    findings: &'a FindingAggregator,
    failures: Vec<String>,
    narratives: Vec<Narrative>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(target: &'a str, snapshot: &'a RegistrySnapshot, findings: &'a FindingAggregator) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            target,
            snapshot,
            findings,
            failures: Vec::new(),
            narratives: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn failures<I, D>(mut self, failures: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Display,
    {
        self.failures.extend(failures.into_iter().map(|f| f.to_string()));
        self
    }

    pub fn narrative(mut self, narrative: Narrative) -> Self {
        self.narratives.push(narrative);
        self
    }

    pub fn build(self) -> ReportDocument {
        let mut document = ReportDocument::new(self.title.clone());

        document.add_section(self.executive_summary());
        document.add_section(self.asset_inventory());
        document.add_section(self.non_responsive());
        document.add_section(self.findings_summary());

        for (severity, findings) in self.findings.grouped() {
            let mut section = Section::new(format!("{} Severity Findings", severity.label()));
            section.push(Block::NumberedList(findings.into_iter().map(finding_item).collect()));
            document.add_section(section);
        }

        if !self.failures.is_empty() {
            let mut section = Section::new("Adapter Failures");
            section
                .push(Block::paragraph(
                    "The following tools produced no data. Results from their stages are incomplete.",
                ))
                .push(Block::BulletList(self.failures.clone()));
            document.add_section(section);
        }

        for narrative in &self.narratives {
            document.add_section(Section::from_markup(narrative.title.clone(), &narrative.body));
        }

        document
    }

    fn executive_summary(&self) -> Section {
        let summary = self.findings.summary();
        let mut section = Section::new("Executive Summary");
        section
            .push(Block::paragraph(format!(
                "Reconnaissance and vulnerability scanning results for {}.",
                self.target
            )))
            .push(Block::BulletList(vec![
                format!("Target: {}", self.target),
                format!("Assets discovered: {}", self.snapshot.total),
                format!("Live hosts: {}", self.snapshot.live),
                format!("Non-responsive hosts: {}", self.snapshot.non_responsive.len()),
                format!("Findings: {}", summary.counts.total()),
                format!("Overall risk level: {}", summary.risk_level),
            ]));
        section
    }

    fn asset_inventory(&self) -> Section {
        let mut section = Section::new("Asset Inventory");
        if self.snapshot.assets.is_empty() {
            section.push(Block::paragraph("No assets were discovered."));
            return section;
        }

        let mut table = Table::new([
            "Subdomain",
            "IP Address",
            "Status",
            "Server",
            "Title",
            "Technologies",
            "Sources",
        ]);
        for asset in &self.snapshot.assets {
            table.push_row(inventory_row(asset));
        }
        section.push(Block::Table(table));
        section
    }

    fn non_responsive(&self) -> Section {
        let mut section = Section::new("Non-Responsive Hosts");
        if self.snapshot.non_responsive.is_empty() {
            section.push(Block::paragraph("Every discovered host answered the HTTP probe."));
        } else {
            section.push(Block::BulletList(self.snapshot.non_responsive.clone()));
        }
        section
    }

    fn findings_summary(&self) -> Section {
        let summary = self.findings.summary();
        let mut section = Section::new("Findings Summary");

        let mut table = Table::new(["Severity", "Count"]);
        for (severity, count) in summary.counts.iter() {
            table.push_row([severity.label().to_string(), count.to_string()]);
        }

        section
            .push(Block::paragraph(format!("Overall risk level: {}", summary.risk_level)))
            .push(Block::Table(table));
        section
    }
}

fn inventory_row(asset: &Asset) -> Vec<String> {
    let or_empty = |value: Option<&String>| value.cloned().unwrap_or_else(|| EMPTY_CELL.to_string());
    let joined = |values: Vec<String>| {
        if values.is_empty() {
            EMPTY_CELL.to_string()
        } else {
            values.join(", ")
        }
    };

    let status = match asset.status_code {
        Some(code) => code.to_string(),
        None => asset.liveness.to_string(),
    };

    vec![
        asset.hostname.clone(),
        joined(asset.addresses.iter().map(|ip| ip.to_string()).collect()),
        status,
        or_empty(asset.server.as_ref()),
        or_empty(asset.title.as_ref()),
        joined(asset.technologies.clone()),
        joined(asset.sources.iter().map(|s| s.to_string()).collect()),
    ]
}

fn finding_item(finding: &Finding) -> String {
    let mut item = format!("{} [{}] at {}", finding.title, finding.template_id, finding.matched_url);
    if let Some(description) = &finding.description {
        item.push_str(": ");
        item.push_str(&description.split_whitespace().collect::<Vec<_>>().join(" "));
    }
    item
}
