// src/reporting/formats/text.rs
use super::{single_line, table_lines, ReportFormat, ReportRenderer};
use crate::reporting::model::{Block, ReportDocument};

/// Markdown-style plain text renderer
pub struct TextRenderer;

impl TextRenderer {
    pub fn render_string(&self, document: &ReportDocument) -> String {
        let mut out = String::new();

        out.push_str(&format!("# {}\n\n", single_line(&document.title)));
        out.push_str(&format!("{}\n\n", document.generated_label()));

        for section in document.sections() {
            out.push_str(&format!("## {}\n\n", single_line(&section.title)));
            for block in &section.blocks {
                render_block(block, &mut out);
                out.push('\n');
            }
        }

        out
    }
}

impl ReportRenderer for TextRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Markdown
    }

    fn render(&self, document: &ReportDocument) -> Vec<u8> {
        self.render_string(document).into_bytes()
    }
}

fn render_block(block: &Block, out: &mut String) {
    match block {
        Block::Heading { text, level } => {
            let marker = "#".repeat(usize::from((*level).clamp(1, 6)));
            out.push_str(&format!("{} {}\n", marker, single_line(text)));
        }
        Block::Paragraph(text) => {
            out.push_str(text);
            out.push('\n');
        }
        Block::Table(table) => {
            for line in table_lines(table) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        Block::BulletList(items) => {
            for item in items {
                out.push_str(&format!("- {}\n", single_line(item)));
            }
        }
        Block::NumberedList(items) => {
            for (i, item) in items.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, single_line(item)));
            }
        }
    }
}
