use serde_json::Value;
use tracing::{debug, info};

use super::AdapterFailure;
use crate::config::ToolConfig;
use crate::error::{TrimurtiError, TrimurtiResult};
use crate::utils::shell;

/// One raw match reported by the template scanner
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateRecord {
    pub template_id: String,
    pub matched_at: String,
    pub severity: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Template-based vulnerability scanning (nuclei by default); targets are fed on stdin
pub struct TemplateScanAdapter {
    tool: ToolConfig,
}

impl TemplateScanAdapter {
    pub fn new(tool: ToolConfig) -> Self {
        Self { tool }
    }

    pub async fn run(&self, urls: &[String]) -> Result<Vec<TemplateRecord>, AdapterFailure> {
        if urls.is_empty() {
            debug!("No live targets to scan, skipping {}", self.tool.program);
            return Ok(Vec::new());
        }

        debug!("Scanning {} targets with {}", urls.len(), self.tool.program);

        let stdin = format!("{}\n", urls.join("\n"));
        let output = shell::run_tool(&self.tool.program, &self.tool.args, Some(stdin), self.tool.timeout()).await?;

        let records = parse_template_output(&String::from_utf8_lossy(&output.stdout));
        info!("Found {} findings with {}", records.len(), self.tool.program);
        Ok(records)
    }
}

/// Parse JSON-lines scanner output, dropping lines that do not parse
pub fn parse_template_output(content: &str) -> Vec<TemplateRecord> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_template_line(line) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Skipping scanner line: {}", e);
                None
            }
        })
        .collect()
}

/// Parse one scanner record. Severity, name and description may sit at the top level
/// or inside the nested `info` object.
pub fn parse_template_line(line: &str) -> TrimurtiResult<TemplateRecord> {
    let value: Value = serde_json::from_str(line).map_err(|e| parse_error(e.to_string()))?;
    let info = value.get("info");

    let template_id = string_field(Some(&value), &["template-id", "templateID", "template_id"])
        .ok_or_else(|| parse_error("record has no template id".to_string()))?;

    let matched_at = string_field(Some(&value), &["matched-at", "matched", "host"])
        .unwrap_or_default();

    Ok(TemplateRecord {
        template_id,
        matched_at,
        severity: string_field(Some(&value), &["severity"]).or_else(|| string_field(info, &["severity"])),
        name: string_field(info, &["name"]).or_else(|| string_field(Some(&value), &["name"])),
        description: string_field(Some(&value), &["description"]).or_else(|| string_field(info, &["description"])),
    })
}

fn string_field(value: Option<&Value>, keys: &[&str]) -> Option<String> {
    let value = value?;
    keys.iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_error(message: String) -> TrimurtiError {
    TrimurtiError::ParseError {
        source_name: "template scan".to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_info_record() {
        let line = r#"{"template-id":"git-config","info":{"name":"Git Config Disclosure","severity":"medium","description":"Exposed .git/config"},"host":"https://a.example.com","matched-at":"https://a.example.com/.git/config"}"#;
        let record = parse_template_line(line).unwrap();

        assert_eq!(record.template_id, "git-config");
        assert_eq!(record.matched_at, "https://a.example.com/.git/config");
        assert_eq!(record.severity.as_deref(), Some("medium"));
        assert_eq!(record.name.as_deref(), Some("Git Config Disclosure"));
        assert_eq!(record.description.as_deref(), Some("Exposed .git/config"));
    }

    #[test]
    fn test_parse_flat_record_without_severity() {
        let line = r#"{"template-id":"tech-detect","matched-at":"https://b.example.com"}"#;
        let record = parse_template_line(line).unwrap();

        assert_eq!(record.severity, None);
        assert_eq!(record.name, None);
    }

    #[test]
    fn test_records_without_template_id_are_dropped() {
        let content = concat!(
            "{\"matched-at\":\"https://a.example.com\",\"severity\":\"high\"}\n",
            "{\"template-id\":\"cve-2021-44228\",\"severity\":\"critical\",\"matched-at\":\"https://a.example.com\"}\n",
            "{broken\n",
        );

        let records = parse_template_output(content);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].template_id, "cve-2021-44228");
    }
}
