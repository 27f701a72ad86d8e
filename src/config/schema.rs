use serde::{Serialize, Deserialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub global: GlobalConfig,
    pub tools: ToolsConfig,
    pub pipeline: PipelineConfig,
    pub certificates: CertificateConfig,
    pub report: ReportConfig,
    pub analysis: AnalysisConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub user_agent: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("trimurti/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// One external tool per scanning capability
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub enumeration: ToolConfig,
    pub probe: ToolConfig,
    pub template_scan: ToolConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enumeration: ToolConfig::new("subfinder", &["-d", "{domain}", "-silent"], 300),
            probe: ToolConfig::new(
                "httpx",
                &["-silent", "-json", "-title", "-tech-detect", "-status-code", "-web-server", "-ip"],
                300,
            ),
            template_scan: ToolConfig::new("nuclei", &["-silent", "-jsonl"], 600),
        }
    }
}

/// Tool-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolConfig {
    /// Program name looked up on PATH, or an absolute path
    pub program: String,
    /// Argument vector; `{domain}` is substituted where the tool takes a target argument
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_tool_timeout")]
    pub timeout_seconds: u64,
}

fn default_tool_timeout() -> u64 {
    300
}

impl ToolConfig {
    pub fn new(program: &str, args: &[&str], timeout_seconds: u64) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout_seconds,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Argument vector with every `placeholder` occurrence replaced by `value`
    pub fn args_with(&self, placeholder: &str, value: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(placeholder, value))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_concurrent_resolutions: usize,
    pub resolution_timeout_seconds: u64,
    pub bruteforce: bool,
    pub max_scan_targets: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_resolutions: 20,
            resolution_timeout_seconds: 5,
            bruteforce: true,
            max_scan_targets: 10,
        }
    }
}

/// Certificate transparency log search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://crt.sh/".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    pub formats: Vec<String>,
    /// Clamped to 8..=60, the lines a US Letter page holds
    pub lines_per_page: usize,
    /// Clamped to 20..=90 columns
    pub line_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Trimurti Penetration Test Report".to_string(),
            formats: vec!["markdown".to_string(), "html".to_string(), "pdf".to_string()],
            lines_per_page: 60,
            line_width: 90,
        }
    }
}

/// Narrative analyzer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "llama3".to_string(),
            timeout_seconds: 120,
        }
    }
}
