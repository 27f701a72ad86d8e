// src/analysis/format.rs
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Section names promoted to `**Name:**` headings when they stand on a line of their own
pub const SECTION_NAMES: [&str; 11] = [
    "Key Findings",
    "Potential Risks",
    "Actionable Recommendations",
    "Conclusion",
    "Executive Summary",
    "Detailed Technical Findings",
    "Security Recommendations",
    "Complete Subdomain Inventory",
    "SSL/TLS Configuration Analysis",
    "Findings",
    "Summary",
];

static SECTION_HEADING: Lazy<Regex> = Lazy::new(|| {
    let names: Vec<String> = SECTION_NAMES.iter().map(|name| regex::escape(name)).collect();
    let pattern = format!(r"(?mi)^[ \t]*\*{{0,2}}({})\*{{0,2}}:?\*{{0,2}}[ \t]*$", names.join("|"));
    Regex::new(&pattern).expect("valid regex")
});
static NUMBERED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)(\d+)[.)][ \t]+").expect("valid regex"));
static BULLET_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)[-•*][ \t]+").expect("valid regex"));
static EXCESS_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Normalize model output into the markup the block parser understands
pub fn normalize_narrative(text: &str) -> String {
    let text = text.replace("\r\n", "\n");

    let text = SECTION_HEADING.replace_all(&text, |caps: &Captures| {
        let matched = &caps[1];
        let canonical = SECTION_NAMES
            .iter()
            .find(|name| name.eq_ignore_ascii_case(matched))
            .map(|name| name.to_string())
            .unwrap_or_else(|| matched.to_string());
        format!("**{}:**", canonical)
    });
    let text = NUMBERED_MARKER.replace_all(&text, "${1}${2}. ");
    let text = BULLET_MARKER.replace_all(&text, "${1}- ");
    let text = EXCESS_BLANK_LINES.replace_all(&text, "\n\n");

    text.trim().to_string()
}
