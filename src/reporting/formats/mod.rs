// src/reporting/formats/mod.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{ReportDocument, Table};

pub mod html;
pub mod paginated;
pub mod text;

pub use html::HtmlRenderer;
pub use paginated::{LineKind, Page, PageLayout, PageLine, PaginatedDocument, PaginatedRenderer};
pub use text::TextRenderer;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Markdown,
    Html,
    Pdf,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [ReportFormat::Markdown, ReportFormat::Html, ReportFormat::Pdf];

    /// File extension written for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Html => "html",
            ReportFormat::Pdf => "pdf",
        }
    }

    /// Parse a format name or file extension
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "markdown" | "md" | "text" | "txt" => Some(ReportFormat::Markdown),
            "html" | "htm" => Some(ReportFormat::Html),
            "pdf" => Some(ReportFormat::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportFormat::Markdown => "markdown",
            ReportFormat::Html => "html",
            ReportFormat::Pdf => "pdf",
        };
        write!(f, "{}", name)
    }
}

/// Renders a report document into the bytes of one artifact.
/// Renderers are pure: the same document always gives the same output.
pub trait ReportRenderer: Send + Sync {
    fn format(&self) -> ReportFormat;

    fn render(&self, document: &ReportDocument) -> Vec<u8>;
}

/// Default renderer for a format
pub fn renderer_for(format: ReportFormat) -> Box<dyn ReportRenderer> {
    match format {
        ReportFormat::Markdown => Box::new(TextRenderer),
        ReportFormat::Html => Box::new(HtmlRenderer),
        ReportFormat::Pdf => Box::new(PaginatedRenderer::default()),
    }
}

/// Collapse every run of whitespace, line breaks included, into one space.
/// Headings and list items must stay on a single output line.
pub(crate) fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fixed-width pipe-delimited lines for a table: header, dash rule, then one line per row
pub(crate) fn table_lines(table: &Table) -> Vec<String> {
    let escape = |cell: &str| single_line(cell).replace('|', "\\|");

    let header: Vec<String> = table.header().iter().map(|c| escape(c)).collect();
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(|c| escape(c)).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|c| c.chars().count().max(3)).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(&header));
    lines.push(format!("|-{}-|", rule.join("-|-")));
    lines.extend(rows.iter().map(|row| format_row(row)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names_and_extensions() {
        assert_eq!(ReportFormat::parse("MD"), Some(ReportFormat::Markdown));
        assert_eq!(ReportFormat::parse("htm"), Some(ReportFormat::Html));
        assert_eq!(ReportFormat::parse("pdf"), Some(ReportFormat::Pdf));
        assert_eq!(ReportFormat::parse("docx"), None);

        let extensions: Vec<&str> = ReportFormat::ALL.iter().map(|f| f.extension()).collect();
        assert_eq!(extensions, vec!["md", "html", "pdf"]);
    }

    #[test]
    fn test_table_lines_are_aligned() {
        let mut table = Table::new(["Subdomain", "Status"]);
        table.push_row(["a.example.com", "200"]);
        table.push_row(["b|c", ""]);

        let lines = table_lines(&table);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "| Subdomain     | Status |");
        assert_eq!(lines[1], "|---------------|--------|");
        assert_eq!(lines[2], "| a.example.com | 200    |");
        assert_eq!(lines[3], "| b\\|c          |        |");
        assert!(lines.iter().all(|line| line.chars().count() == lines[0].chars().count()));
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("could not run:\n- no templates\r\n  # hint"), "could not run: - no templates # hint");
        assert_eq!(single_line("  plain  "), "plain");
        assert_eq!(single_line(""), "");
    }
}
