// src/reporting/parser.rs
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::model::{Block, Table};

static BOLD_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*([^*]+?)\s*:\*\*$|^\*\*([^*]+?)\*\*\s*:$").expect("valid regex"));
static HASH_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").expect("valid regex"));
static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s+(.*)$").expect("valid regex"));
static SEPARATOR_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:?-+:?$").expect("valid regex"));

/// Level given to `**Heading:**` lines
const BOLD_HEADING_LEVEL: u8 = 3;

enum Line {
    Heading(String, u8),
    Bullet(String),
    Numbered(String),
    TableRow(Vec<String>),
    Text(String),
}

enum Pending {
    Nothing,
    Paragraph(Vec<String>),
    Bullets(Vec<String>),
    Numbered(Vec<String>),
    Table(Table),
}

/// Single forward scan over narrative markup, one pending block at a time
pub struct BlockParser {
    blocks: Vec<Block>,
    pending: Pending,
    dropped_rows: usize,
}

impl Default for BlockParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockParser {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            pending: Pending::Nothing,
            dropped_rows: 0,
        }
    }

    pub fn feed_line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            self.flush();
            return;
        }

        match classify(line) {
            Line::Heading(text, level) => {
                self.flush();
                self.blocks.push(Block::Heading { text, level });
            }
            Line::Bullet(item) => match &mut self.pending {
                Pending::Bullets(items) => items.push(item),
                _ => {
                    self.flush();
                    self.pending = Pending::Bullets(vec![item]);
                }
            },
            Line::Numbered(item) => match &mut self.pending {
                Pending::Numbered(items) => items.push(item),
                _ => {
                    self.flush();
                    self.pending = Pending::Numbered(vec![item]);
                }
            },
            Line::TableRow(cells) => match &mut self.pending {
                Pending::Table(table) => {
                    if is_separator(&cells) {
                        return;
                    }
                    if !table.push_row(cells) {
                        self.dropped_rows += 1;
                        debug!("Dropping table row with wrong column count: {}", line);
                    }
                }
                _ => {
                    self.flush();
                    self.pending = Pending::Table(Table::new(cells));
                }
            },
            Line::Text(text) => match &mut self.pending {
                Pending::Paragraph(lines) => lines.push(text),
                _ => {
                    self.flush();
                    self.pending = Pending::Paragraph(vec![text]);
                }
            },
        }
    }

    /// Rows discarded so far because their cell count did not match the header
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn finish(mut self) -> Vec<Block> {
        self.flush();
        if self.dropped_rows > 0 {
            debug!("Dropped {} ragged table rows", self.dropped_rows);
        }
        self.blocks
    }

    fn flush(&mut self) {
        let block = match std::mem::replace(&mut self.pending, Pending::Nothing) {
            Pending::Nothing => return,
            Pending::Paragraph(lines) => Block::Paragraph(lines.join("\n")),
            Pending::Bullets(items) => Block::BulletList(items),
            Pending::Numbered(items) => Block::NumberedList(items),
            Pending::Table(table) => Block::Table(table),
        };
        self.blocks.push(block);
    }
}

/// Parse narrative markup into blocks.
///
/// Recognized lines: `**Heading:**` and `#` headings, `- ` bullets, `N. ` numbered items and
/// `|`-delimited table rows (a dash separator row after the header is skipped). Anything else
/// is paragraph text. Blank lines end the current block.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let mut parser = BlockParser::new();
    for line in text.lines() {
        parser.feed_line(line);
    }
    parser.finish()
}

fn classify(line: &str) -> Line {
    if let Some(caps) = BOLD_HEADING.captures(line) {
        let text = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().trim()).unwrap_or_default();
        return Line::Heading(text.to_string(), BOLD_HEADING_LEVEL);
    }
    if let Some(caps) = HASH_HEADING.captures(line) {
        let level = caps[1].len() as u8;
        return Line::Heading(caps[2].to_string(), level);
    }
    if let Some(item) = line.strip_prefix("- ") {
        return Line::Bullet(item.trim().to_string());
    }
    if let Some(caps) = NUMBERED_ITEM.captures(line) {
        return Line::Numbered(caps[1].trim().to_string());
    }
    if line.starts_with('|') {
        return Line::TableRow(split_cells(line));
    }
    Line::Text(line.to_string())
}

fn split_cells(line: &str) -> Vec<String> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn is_separator(cells: &[String]) -> bool {
    !cells.is_empty() && cells.iter().all(|cell| SEPARATOR_CELL.is_match(cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(block: &Block) -> &Table {
        match block {
            Block::Table(table) => table,
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_table_with_separator_and_ragged_row() {
        let blocks = parse_blocks("| a | b |\n|---|---|\n| 1 | 2 |\n| 1 |");

        assert_eq!(blocks.len(), 1);
        let parsed = table(&blocks[0]);
        assert_eq!(parsed.header(), ["a", "b"]);
        assert_eq!(parsed.rows(), [vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn test_dropped_rows_are_counted() {
        let mut parser = BlockParser::new();
        for line in ["| Port | Service | Version |", "|------|---------|--------|", "| 80 | http |", "| 443 | https | nginx 1.25 |"] {
            parser.feed_line(line);
        }
        assert_eq!(parser.dropped_rows(), 1);

        let blocks = parser.finish();
        assert_eq!(table(&blocks[0]).rows().len(), 1);
    }

    #[test]
    fn test_parsed_tables_are_always_rectangular() {
        let markup = "| h1 | h2 | h3 |\n| x |\n| x | y | z |\n| x | y |\n|a|b|c|d|\n\n| solo |\n| 1 |\n| 1 | 2 |";
        for block in parse_blocks(markup) {
            let parsed = table(&block);
            assert!(parsed.rows().iter().all(|row| row.len() == parsed.header().len()));
        }
    }

    #[test]
    fn test_headings() {
        let blocks = parse_blocks("**Key Findings:**\n## Port Scan Results\n**Conclusion**:\n**not a heading");

        assert_eq!(blocks[0], Block::heading("Key Findings", 3));
        assert_eq!(blocks[1], Block::heading("Port Scan Results", 2));
        assert_eq!(blocks[2], Block::heading("Conclusion", 3));
        assert_eq!(blocks[3], Block::paragraph("**not a heading"));
    }

    #[test]
    fn test_closing_hashes_need_leading_space() {
        let blocks = parse_blocks("## Using C#\n\n### Port Scan ###\n\n# #");

        assert_eq!(blocks[0], Block::heading("Using C#", 2));
        assert_eq!(blocks[1], Block::heading("Port Scan", 3));
        assert_eq!(blocks[2], Block::heading("#", 1));
    }

    #[test]
    fn test_lists_are_greedy_per_marker_family() {
        let blocks = parse_blocks("- one\n- two\n1. first\n2. second\n- three");

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Block::BulletList(vec!["one".into(), "two".into()]));
        assert_eq!(blocks[1], Block::NumberedList(vec!["first".into(), "second".into()]));
        assert_eq!(blocks[2], Block::BulletList(vec!["three".into()]));
    }

    #[test]
    fn test_blank_line_ends_block_not_document() {
        let blocks = parse_blocks("- one\n\n- two\n\nSome text\ncontinues here\n\nMore text");

        assert_eq!(
            blocks,
            vec![
                Block::BulletList(vec!["one".into()]),
                Block::BulletList(vec!["two".into()]),
                Block::paragraph("Some text\ncontinues here"),
                Block::paragraph("More text"),
            ]
        );
    }

    #[test]
    fn test_table_ends_at_non_table_line() {
        let blocks = parse_blocks("| Subdomain | IP Address |\n|---|---|\n| www.example.com | 10.0.0.1 |\nNo more hosts.");

        assert_eq!(blocks.len(), 2);
        assert_eq!(table(&blocks[0]).rows().len(), 1);
        assert_eq!(blocks[1], Block::paragraph("No more hosts."));
    }

    #[test]
    fn test_heading_interrupts_list() {
        let blocks = parse_blocks("- risk\n**Potential Risks:**\n1. exposure");

        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[1], Block::Heading { .. }));
    }

    #[test]
    fn test_empty_input_has_no_blocks() {
        assert!(parse_blocks("").is_empty());
        assert!(parse_blocks("\n\n   \n").is_empty());
    }
}
