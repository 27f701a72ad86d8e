// src/analysis/mod.rs
//! Optional narrative analysis of scan results by a local language model.
//!
//! The analyzer speaks the Ollama `/api/generate` protocol. Its output is
//! normalized into report markup and appended to the report as a section.

mod format;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::core::{FindingAggregator, RegistrySnapshot};
use crate::error::{TrimurtiError, TrimurtiResult};
use crate::reporting::Narrative;
use crate::utils::http::HttpClient;

pub use format::{normalize_narrative, SECTION_NAMES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Recon,
    Vulnerabilities,
}

impl AnalysisKind {
    pub fn section_title(&self) -> &'static str {
        match self {
            AnalysisKind::Recon => "Reconnaissance Analysis",
            AnalysisKind::Vulnerabilities => "Vulnerability Analysis",
        }
    }

    fn subject(&self) -> &'static str {
        match self {
            AnalysisKind::Recon => "reconnaissance output",
            AnalysisKind::Vulnerabilities => "vulnerability scan results",
        }
    }
}

/// Prompt asking for a structured, report-ready summary of `data`
pub fn build_prompt(kind: AnalysisKind, data: &str) -> String {
    format!(
        "You are a cybersecurity expert writing a professional penetration test report. \
         Analyze the following {subject} and provide a well-structured, human-readable summary. \
         Format your response using markdown syntax with bold headings (e.g., **Key Findings**, \
         **Potential Risks**, **Actionable Recommendations**, **Conclusion**). \
         Use bullet points (-) or numbered lists (1., 2., etc.) for findings and recommendations. \
         Here is an example format:\n\n\
         **Key Findings:**\n- Finding 1\n- Finding 2\n\n\
         **Potential Risks:**\n1. Risk 1\n2. Risk 2\n\n\
         **Actionable Recommendations:**\n- Recommendation 1\n- Recommendation 2\n\n\
         **Conclusion:**\nSummary statement here.\n\n\
         Now, analyze the following {subject}:\n{data}\n\nSummary:",
        subject = kind.subject(),
        data = data
    )
}

/// Plain-text digest of the asset inventory used as analyzer input
pub fn recon_digest(snapshot: &RegistrySnapshot) -> String {
    let mut lines = vec![format!(
        "{} assets discovered, {} live, {} non-responsive",
        snapshot.total,
        snapshot.live,
        snapshot.non_responsive.len()
    )];

    for asset in &snapshot.assets {
        let addresses: Vec<String> = asset.addresses.iter().map(|ip| ip.to_string()).collect();
        let mut line = format!("{} [{}] {}", asset.hostname, addresses.join(", "), asset.liveness);
        if let Some(code) = asset.status_code {
            line.push_str(&format!(" status={}", code));
        }
        if let Some(server) = &asset.server {
            line.push_str(&format!(" server={}", server));
        }
        if let Some(title) = &asset.title {
            line.push_str(&format!(" title=\"{}\"", title));
        }
        if !asset.technologies.is_empty() {
            line.push_str(&format!(" tech={}", asset.technologies.join(",")));
        }
        lines.push(line);
    }

    lines.join("\n")
}

/// Plain-text digest of the findings used as analyzer input
pub fn findings_digest(findings: &FindingAggregator) -> String {
    if findings.is_empty() {
        return "No findings were reported.".to_string();
    }

    findings
        .findings()
        .iter()
        .map(|finding| {
            let mut line = format!(
                "[{}] {} ({}) at {}",
                finding.severity, finding.title, finding.template_id, finding.matched_url
            );
            if let Some(description) = &finding.description {
                line.push_str(&format!(": {}", description));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

pub struct NarrativeAnalyzer {
    client: HttpClient,
    endpoint: String,
    model: String,
}

impl NarrativeAnalyzer {
    pub fn new(config: &AnalysisConfig, user_agent: &str) -> TrimurtiResult<Self> {
        let client = HttpClient::new(Some(user_agent.to_string()), Some(config.timeout_seconds))
            .map_err(|e| TrimurtiError::NetworkError(format!("{:#}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        })
    }

    /// Ask the model for a narrative of `data` and normalize it into report markup
    pub async fn analyze(&self, kind: AnalysisKind, data: &str) -> TrimurtiResult<Narrative> {
        let prompt = build_prompt(kind, data);
        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
        };

        info!("Requesting {} from {}", kind.section_title().to_lowercase(), self.endpoint);

        let response = self
            .client
            .post_json(&self.endpoint, &request)
            .await
            .map_err(|e| TrimurtiError::NetworkError(format!("{:#}", e)))?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TrimurtiError::SerializationError(format!("Invalid analyzer response: {}", e)))?;

        let text = body
            .response
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| TrimurtiError::NetworkError("Analyzer returned an empty response".to_string()))?;

        debug!("Analyzer returned {} characters", text.len());
        Ok(Narrative::new(kind.section_title(), normalize_narrative(&text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ProbeRecord, TemplateRecord};
    use crate::core::AssetRegistry;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/api/generate", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !String::from_utf8_lossy(&request).contains("\"stream\":false}") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (endpoint, handle)
    }

    fn config(endpoint: String) -> AnalysisConfig {
        AnalysisConfig {
            enabled: true,
            endpoint,
            model: "llama3".to_string(),
            timeout_seconds: 10,
        }
    }

    #[tokio::test]
    async fn test_analyze_normalizes_response() {
        let (endpoint, server) =
            serve_once(r#"{"model":"llama3","response":"Key Findings\n* two hosts\n\n\n\nConclusion:\nLow exposure.","done":true}"#).await;

        let analyzer = NarrativeAnalyzer::new(&config(endpoint), "trimurti-test").unwrap();
        let narrative = analyzer.analyze(AnalysisKind::Recon, "a.example.com").await.unwrap();

        assert_eq!(narrative.title, "Reconnaissance Analysis");
        assert_eq!(narrative.body, "**Key Findings:**\n- two hosts\n\n**Conclusion:**\nLow exposure.");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/generate"));
        assert!(request.contains("\"model\":\"llama3\""));
        assert!(request.contains("a.example.com"));
    }

    #[tokio::test]
    async fn test_empty_response_is_an_error() {
        let (endpoint, _server) = serve_once(r#"{"response":"   "}"#).await;

        let analyzer = NarrativeAnalyzer::new(&config(endpoint), "trimurti-test").unwrap();
        let result = analyzer.analyze(AnalysisKind::Vulnerabilities, "none").await;

        assert!(matches!(result, Err(TrimurtiError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/api/generate", listener.local_addr().unwrap());
        drop(listener);

        let analyzer = NarrativeAnalyzer::new(&config(endpoint), "trimurti-test").unwrap();
        let result = analyzer.analyze(AnalysisKind::Recon, "data").await;

        assert!(matches!(result, Err(TrimurtiError::NetworkError(_))));
    }

    #[test]
    fn test_prompt_embeds_subject_and_data() {
        let prompt = build_prompt(AnalysisKind::Vulnerabilities, "[High] exposed panel");
        assert!(prompt.contains("analyze the following vulnerability scan results:\n[High] exposed panel\n\nSummary:"));
    }

    #[test]
    fn test_digests() {
        let mut registry = AssetRegistry::new();
        registry.record_enumeration("b.example.com");
        registry.record_probe(&ProbeRecord {
            url: "https://a.example.com".to_string(),
            ip: Some("10.0.0.1".to_string()),
            status_code: Some(200),
            title: Some("Home".to_string()),
            ..Default::default()
        });
        registry.mark_unresponsive();

        let digest = recon_digest(&registry.snapshot());
        assert_eq!(
            digest,
            "2 assets discovered, 1 live, 1 non-responsive\na.example.com [10.0.0.1] live status=200 title=\"Home\"\nb.example.com [] dead"
        );

        let mut findings = FindingAggregator::new();
        assert_eq!(findings_digest(&findings), "No findings were reported.");
        findings.ingest(vec![TemplateRecord {
            template_id: "exposed-panel".to_string(),
            matched_at: "https://a.example.com/admin".to_string(),
            severity: Some("high".to_string()),
            name: Some("Admin Panel".to_string()),
            description: None,
        }]);
        assert_eq!(
            findings_digest(&findings),
            "[High] Admin Panel (exposed-panel) at https://a.example.com/admin"
        );
    }
}
