use chrono::{DateTime, Utc};

use super::parser::parse_blocks;

/// A renderer-agnostic unit of report content
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(String),
    Heading { text: String, level: u8 },
    Table(Table),
    BulletList(Vec<String>),
    NumberedList(Vec<String>),
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph(text.into())
    }

    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Block::Heading { text: text.into(), level }
    }
}

/// A rectangular table: every stored row has exactly as many cells as the header
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; rows whose cell count differs from the header are rejected
    pub fn push_row<I, S>(&mut self, row: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() != self.header.len() {
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    /// A section whose body is parsed from narrative markup
    pub fn from_markup(title: impl Into<String>, markup: &str) -> Self {
        Self {
            title: title.into(),
            blocks: parse_blocks(markup),
        }
    }

    pub fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }
}

/// The complete report: a title plus ordered sections
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    sections: Vec<Section>,
}

/// Structural fingerprint shared by every rendering of a document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentOutline {
    /// Document title, section titles and heading blocks, in order
    pub headings: Vec<String>,
    /// (data rows, columns) per table, in order
    pub tables: Vec<(usize, usize)>,
    pub list_items: usize,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            generated_at: Utc::now(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn generated_label(&self) -> String {
        format!("Generated on: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))
    }

    pub fn outline(&self) -> DocumentOutline {
        let mut outline = DocumentOutline {
            headings: vec![self.title.clone()],
            ..Default::default()
        };

        for section in &self.sections {
            outline.headings.push(section.title.clone());
            for block in &section.blocks {
                match block {
                    Block::Heading { text, .. } => outline.headings.push(text.clone()),
                    Block::Table(table) => outline.tables.push((table.rows().len(), table.column_count())),
                    Block::BulletList(items) | Block::NumberedList(items) => outline.list_items += items.len(),
                    Block::Paragraph(_) => {}
                }
            }
        }

        outline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_rows_are_rejected() {
        let mut table = Table::new(["Port", "Service"]);
        assert!(table.push_row(["80", "http"]));
        assert!(!table.push_row(["443"]));
        assert!(!table.push_row(["22", "ssh", "OpenSSH"]));
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn test_outline_counts_structure() {
        let mut document = ReportDocument::new("Report");
        let mut section = Section::new("Inventory");
        section
            .push(Block::heading("Hosts", 3))
            .push(Block::BulletList(vec!["a".into(), "b".into()]))
            .push(Block::NumberedList(vec!["c".into()]));
        let mut table = Table::new(["h1", "h2"]);
        table.push_row(["1", "2"]);
        section.push(Block::Table(table));
        document.add_section(section);

        let outline = document.outline();
        assert_eq!(outline.headings, vec!["Report", "Inventory", "Hosts"]);
        assert_eq!(outline.tables, vec![(1, 2)]);
        assert_eq!(outline.list_items, 3);
    }
}
