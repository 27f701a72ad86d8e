use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tempfile::tempdir;

use trimurti::adapters::{AdapterFailure, ExternalScanner, ProbeRecord, TemplateRecord};
use trimurti::core::{AssetRegistry, FindingAggregator, RiskLevel};
use trimurti::engine::{HostResolver, MemorySink, PipelineSettings, ReconPipeline, Stage, StageFailure};
use trimurti::reporting::formats::{HtmlRenderer, LineKind, PaginatedRenderer, TextRenderer};
use trimurti::reporting::{Narrative, ReportBuilder, ReportDocument, ReportFormat, ReportManager};

struct FakeScanner {
    enumeration: Result<Vec<String>, AdapterFailure>,
    probe: Vec<ProbeRecord>,
    findings: Vec<TemplateRecord>,
}

#[async_trait]
impl ExternalScanner for FakeScanner {
    async fn enumerate(&self, _domain: &str) -> Result<Vec<String>, AdapterFailure> {
        self.enumeration.clone()
    }

    async fn probe(&self, hosts: &[String]) -> Result<Vec<ProbeRecord>, AdapterFailure> {
        Ok(self
            .probe
            .iter()
            .filter(|record| hosts.iter().any(|host| record.url.contains(host.as_str())))
            .cloned()
            .collect())
    }

    async fn template_scan(&self, _urls: &[String]) -> Result<Vec<TemplateRecord>, AdapterFailure> {
        Ok(self.findings.clone())
    }
}

struct NoDns;

#[async_trait]
impl HostResolver for NoDns {
    async fn resolve(&self, _hostname: &str) -> Vec<IpAddr> {
        Vec::new()
    }
}

fn finding(template: &str, severity: &str, name: &str) -> TemplateRecord {
    TemplateRecord {
        template_id: template.to_string(),
        matched_at: "https://a.example.com".to_string(),
        severity: Some(severity.to_string()),
        name: Some(name.to_string()),
        description: None,
    }
}

fn scanner() -> FakeScanner {
    FakeScanner {
        enumeration: Ok(vec!["a.example.com".to_string(), "b.example.com".to_string()]),
        probe: vec![ProbeRecord {
            url: "https://a.example.com".to_string(),
            ip: Some("10.0.0.1".to_string()),
            status_code: Some(200),
            server: Some("nginx".to_string()),
            title: Some("<script>alert(1)</script>".to_string()),
            technologies: vec!["Nginx".to_string()],
        }],
        findings: vec![
            finding("exposed-panel", "high", "Exposed <b>Admin</b> Panel"),
            finding("git-config", "high", "Git Config"),
            finding("missing-hsts", "low", "Missing HSTS"),
        ],
    }
}

fn settings() -> PipelineSettings {
    PipelineSettings {
        bruteforce: false,
        ..Default::default()
    }
}

const NARRATIVE: &str = "**Key Findings:**
- Admin panel exposed on a.example.com
- Git metadata readable

**Exposed Services:**
| Host | Port | Service |
|------|------|---------|
| a.example.com | 443 | https |
| a.example.com | 22 |
| b.example.com | 80 | http |

**Actionable Recommendations:**
1. Restrict the admin panel
2. Remove the .git directory

**Conclusion:**
Exposure is moderate.";

async fn document() -> ReportDocument {
    let pipeline = ReconPipeline::new(Arc::new(scanner()), Arc::new(NoDns), settings());
    let outcome = pipeline.run("example.com").await.unwrap();
    outcome.build_report(
        "Trimurti Penetration Test Report",
        vec![Narrative::new("Reconnaissance Analysis", NARRATIVE)],
    )
}

#[tokio::test]
async fn end_to_end_report_in_every_format() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("example.com");

    let artifacts = ReportManager::default()
        .write_all(&document().await, &base, &ReportFormat::ALL)
        .await
        .unwrap();
    assert_eq!(artifacts.len(), 3);
    assert!(artifacts.iter().all(|artifact| !artifact.fell_back()));

    let markdown = std::fs::read_to_string(dir.path().join("example.com.md")).unwrap();
    assert!(markdown.starts_with("# Trimurti Penetration Test Report\n"));
    assert!(markdown.contains("- Overall risk level: high"));
    assert!(markdown.contains("- Non-responsive hosts: 1"));
    assert!(markdown.contains("## High Severity Findings"));
    assert!(markdown.contains("### Key Findings"));

    let html = std::fs::read_to_string(dir.path().join("example.com.html")).unwrap();
    assert!(!html.contains("<script>alert(1)</script>"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!html.contains("<b>Admin</b>"));

    let pdf = std::fs::read(dir.path().join("example.com.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-1.4"));
}

/// Every renderer shows the same headings, table rows and list items as the document outline
fn assert_renderers_agree(document: &ReportDocument) {
    let outline = document.outline();
    let table_rows: usize = outline.tables.iter().map(|(rows, _)| rows).sum();

    let text = TextRenderer.render_string(document);
    let numbered = Regex::new(r"^\d+\. ").unwrap();
    let text_headings = text.lines().filter(|line| line.starts_with('#')).count();
    let text_rows = text.lines().filter(|line| line.starts_with('|')).count() - 2 * outline.tables.len();
    let text_items = text
        .lines()
        .filter(|line| line.starts_with("- ") || numbered.is_match(line))
        .count();
    assert_eq!(text_headings, outline.headings.len());
    assert_eq!(text_rows, table_rows);
    assert_eq!(text_items, outline.list_items);

    let html = HtmlRenderer.render_string(document);
    let heading_tag = Regex::new(r"<h[1-6]>").unwrap();
    assert_eq!(heading_tag.find_iter(&html).count(), outline.headings.len());
    assert_eq!(html.matches("<tr><td>").count(), table_rows);
    assert_eq!(html.matches("<li>").count(), outline.list_items);

    let paginated = PaginatedRenderer::default().paginate(document);
    assert_eq!(
        paginated.count(|kind| matches!(kind, LineKind::Title | LineKind::Heading(_))),
        outline.headings.len()
    );
    assert_eq!(paginated.count(|kind| kind == LineKind::TableRow), table_rows);
    assert_eq!(
        paginated.count(|kind| matches!(kind, LineKind::BulletItem | LineKind::NumberedItem)),
        outline.list_items
    );
}

#[tokio::test]
async fn renderers_agree_on_structure() {
    let document = document().await;

    // Narrative table keeps its two well-formed rows
    assert!(document.outline().tables.contains(&(2, 3)));

    assert_renderers_agree(&document);
}

#[test]
fn renderers_agree_when_item_text_spans_lines() {
    let failures = vec![StageFailure {
        stage: Stage::TemplateScan,
        failure: AdapterFailure::NonZeroExit {
            tool: "nuclei".to_string(),
            code: Some(1),
            stderr: "could not run:\n- no templates found\n# hint: run with -update-templates\n2. retry".to_string(),
        },
    }];

    let mut findings = FindingAggregator::new();
    findings.ingest(vec![finding("exposed-panel", "high", "Exposed\n- Admin\n# Panel")]);

    let snapshot = AssetRegistry::new().snapshot();
    let document = ReportBuilder::new("example.com", &snapshot, &findings)
        .failures(&failures)
        .build();

    assert_renderers_agree(&document);

    let text = TextRenderer.render_string(&document);
    assert!(text.contains("- template scan stage: nuclei exited with status Some(1): could not run: - no templates found # hint: run with -update-templates 2. retry\n"));
}

#[tokio::test]
async fn unwritable_destination_falls_back_to_temp_location() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, "").unwrap();
    let fallback = dir.path().join("fallback");

    let artifacts = ReportManager::default()
        .with_fallback_dir(&fallback)
        .write_all(&document().await, &blocker.join("report"), &ReportFormat::ALL)
        .await
        .unwrap();

    assert_eq!(artifacts.len(), 3);
    for artifact in &artifacts {
        assert!(artifact.fell_back());
        assert!(artifact.path.starts_with(&fallback));
        assert!(artifact.path.exists());
    }
}

#[tokio::test]
async fn failed_enumeration_still_produces_a_report() {
    let scanner = FakeScanner {
        enumeration: Err(AdapterFailure::Missing {
            tool: "subfinder".to_string(),
        }),
        probe: Vec::new(),
        findings: Vec::new(),
    };
    let sink = Arc::new(MemorySink::new());
    let pipeline = ReconPipeline::new(Arc::new(scanner), Arc::new(NoDns), settings()).with_sink(sink.clone());

    let outcome = pipeline.run("example.com").await.unwrap();
    assert_eq!(outcome.findings.summary().risk_level, RiskLevel::Informational);
    assert_eq!(sink.failures().len(), 1);

    let document = outcome.build_report("Report", Vec::new());
    let text = TextRenderer.render_string(&document);
    assert!(text.contains("## Adapter Failures"));
    assert!(text.contains("- enumeration stage: subfinder is not installed or not on PATH"));
    assert!(text.contains("No assets were discovered."));
}
