// src/reporting/formats/html.rs
use html_escape::encode_text;

use super::{single_line, ReportFormat, ReportRenderer};
use crate::reporting::model::{Block, ReportDocument, Table};

const STYLE: &str = "body { font-family: Arial, sans-serif; margin: 40px; line-height: 1.5; color: #222; }
h1 { border-bottom: 2px solid #444; padding-bottom: 8px; }
h2 { margin-top: 32px; border-bottom: 1px solid #ccc; }
table { border-collapse: collapse; margin: 12px 0; }
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; }
th { background: #f0f0f0; }
.generated { color: #666; font-size: 0.9em; }";

/// HTML renderer; every piece of document text is escaped
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn render_string(&self, document: &ReportDocument) -> String {
        let mut out = String::new();

        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", encode_text(&document.title)));
        out.push_str(&format!("<style>\n{}\n</style>\n</head>\n<body>\n", STYLE));

        out.push_str(&format!("<h1>{}</h1>\n", encode_text(&document.title)));
        out.push_str(&format!(
            "<p class=\"generated\">{}</p>\n",
            encode_text(&document.generated_label())
        ));

        for section in document.sections() {
            out.push_str("<section>\n");
            out.push_str(&format!("<h2>{}</h2>\n", encode_text(&section.title)));
            for block in &section.blocks {
                render_block(block, &mut out);
            }
            out.push_str("</section>\n");
        }

        out.push_str("</body>\n</html>\n");
        out
    }
}

impl ReportRenderer for HtmlRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Html
    }

    fn render(&self, document: &ReportDocument) -> Vec<u8> {
        self.render_string(document).into_bytes()
    }
}

fn render_block(block: &Block, out: &mut String) {
    match block {
        Block::Heading { text, level } => {
            let level = (*level).clamp(1, 6);
            out.push_str(&format!(
                "<h{level}>{}</h{level}>\n",
                encode_text(&single_line(text)),
                level = level
            ));
        }
        Block::Paragraph(text) => {
            let lines: Vec<String> = text.lines().map(|line| encode_text(line).into_owned()).collect();
            out.push_str(&format!("<p>{}</p>\n", lines.join("<br>\n")));
        }
        Block::Table(table) => render_table(table, out),
        Block::BulletList(items) => render_list("ul", items, out),
        Block::NumberedList(items) => render_list("ol", items, out),
    }
}

fn render_table(table: &Table, out: &mut String) {
    out.push_str("<table>\n<thead>\n<tr>");
    for cell in table.header() {
        out.push_str(&format!("<th>{}</th>", encode_text(cell)));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in table.rows() {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<td>{}</td>", encode_text(cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
}

fn render_list(tag: &str, items: &[String], out: &mut String) {
    out.push_str(&format!("<{}>\n", tag));
    for item in items {
        out.push_str(&format!("<li>{}</li>\n", encode_text(&single_line(item))));
    }
    out.push_str(&format!("</{}>\n", tag));
}
