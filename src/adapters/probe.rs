use serde_json::Value;
use tracing::{debug, info};

use super::AdapterFailure;
use crate::config::ToolConfig;
use crate::error::{TrimurtiError, TrimurtiResult};
use crate::utils::shell;

/// One host that answered the HTTP prober
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProbeRecord {
    pub url: String,
    pub ip: Option<String>,
    pub status_code: Option<u16>,
    pub server: Option<String>,
    pub title: Option<String>,
    pub technologies: Vec<String>,
}

/// HTTP liveness probing (httpx by default); hosts are fed on stdin
pub struct ProbeAdapter {
    tool: ToolConfig,
}

impl ProbeAdapter {
    pub fn new(tool: ToolConfig) -> Self {
        Self { tool }
    }

    pub async fn run(&self, hosts: &[String]) -> Result<Vec<ProbeRecord>, AdapterFailure> {
        if hosts.is_empty() {
            debug!("No hosts to probe, skipping {}", self.tool.program);
            return Ok(Vec::new());
        }

        debug!("Probing {} hosts with {}", hosts.len(), self.tool.program);

        let stdin = format!("{}\n", hosts.join("\n"));
        let output = shell::run_tool(&self.tool.program, &self.tool.args, Some(stdin), self.tool.timeout()).await?;

        let records = parse_probe_output(&String::from_utf8_lossy(&output.stdout));
        info!("{} of {} hosts answered {}", records.len(), hosts.len(), self.tool.program);
        Ok(records)
    }
}

/// Parse JSON-lines prober output, dropping lines that do not parse
pub fn parse_probe_output(content: &str) -> Vec<ProbeRecord> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_probe_line(line) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Skipping probe line: {}", e);
                None
            }
        })
        .collect()
}

/// Parse one prober record. Field names of both older and current httpx releases are accepted.
pub fn parse_probe_line(line: &str) -> TrimurtiResult<ProbeRecord> {
    let value: Value = serde_json::from_str(line).map_err(|e| parse_error(e.to_string()))?;

    let url = string_field(&value, &["url", "input"])
        .ok_or_else(|| parse_error("record has no url".to_string()))?;

    let ip = string_field(&value, &["ip", "host"]).or_else(|| {
        value
            .get("a")
            .and_then(|a| a.as_array())
            .and_then(|addresses| addresses.first())
            .and_then(|first| first.as_str())
            .map(str::to_string)
    });

    let status_code = ["status_code", "status-code"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|s| s.as_u64()))
        .and_then(|code| u16::try_from(code).ok());

    let technologies = ["technologies", "tech"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|t| t.as_array()))
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    Ok(ProbeRecord {
        url,
        ip,
        status_code,
        server: string_field(&value, &["server", "webserver"]),
        title: string_field(&value, &["title"]),
        technologies,
    })
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_error(message: String) -> TrimurtiError {
    TrimurtiError::ParseError {
        source_name: "probe".to_string(),
        message,
    }
}
