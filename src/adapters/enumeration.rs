use tracing::{debug, info, trace};

use super::AdapterFailure;
use crate::config::ToolConfig;
use crate::utils::shell;

/// Passive subdomain enumeration (subfinder by default)
pub struct EnumerationAdapter {
    tool: ToolConfig,
}

impl EnumerationAdapter {
    pub fn new(tool: ToolConfig) -> Self {
        Self { tool }
    }

    pub async fn run(&self, domain: &str) -> Result<Vec<String>, AdapterFailure> {
        debug!("Running {} on target {}", self.tool.program, domain);

        let args = self.tool.args_with("{domain}", domain);
        let output = shell::run_tool(&self.tool.program, &args, None, self.tool.timeout()).await?;

        let hostnames = parse_hostname_list(&String::from_utf8_lossy(&output.stdout));
        info!("Found {} subdomains with {}", hostnames.len(), self.tool.program);
        Ok(hostnames)
    }
}

/// Parse a newline-delimited hostname list, skipping lines that cannot be hostnames
pub fn parse_hostname_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| {
            let plausible = !line.contains(char::is_whitespace);
            if !plausible {
                trace!("Skipping malformed enumeration line: {}", line);
            }
            plausible
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hostname_list_skips_noise() {
        let content = "a.example.com\n\n  b.example.com  \n# comment\nnot a hostname\nc.example.com\r\n";
        assert_eq!(
            parse_hostname_list(content),
            vec!["a.example.com", "b.example.com", "c.example.com"]
        );
    }
}
