// src/reporting/formats/paginated.rs
//! Paginated rendering: the document is laid out into fixed-size pages of
//! monospaced lines, then serialized as a minimal PDF.

use super::{table_lines, ReportFormat, ReportRenderer};
use crate::config::ReportConfig;
use crate::reporting::model::{Block, ReportDocument};

const MIN_LINES_PER_PAGE: usize = 8;
const MIN_LINE_WIDTH: usize = 20;

/// Page geometry in monospaced lines and columns.
///
/// Values are clamped to what the PDF page can physically hold, see [`PageLayout::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub lines_per_page: usize,
    pub line_width: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            lines_per_page: 60,
            line_width: 90,
        }
    }
}

impl From<&ReportConfig> for PageLayout {
    fn from(config: &ReportConfig) -> Self {
        Self {
            lines_per_page: config.lines_per_page,
            line_width: config.line_width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Heading(u8),
    Text,
    TableHeader,
    TableRule,
    TableRow,
    BulletItem,
    NumberedItem,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLine {
    pub kind: LineKind,
    pub text: String,
    /// Wrapped continuation of the previous line, or a table header repeated on a new page
    pub continued: bool,
}

impl PageLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            continued: false,
        }
    }

    fn continuation(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            continued: true,
        }
    }

    fn blank() -> Self {
        Self::new(LineKind::Blank, "")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub lines: Vec<PageLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginatedDocument {
    pub pages: Vec<Page>,
}

impl PaginatedDocument {
    pub fn lines(&self) -> impl Iterator<Item = &PageLine> {
        self.pages.iter().flat_map(|page| page.lines.iter())
    }

    /// Count lines of a kind, ignoring continuations
    pub fn count(&self, matches: impl Fn(LineKind) -> bool) -> usize {
        self.lines().filter(|line| !line.continued && matches(line.kind)).count()
    }

    pub fn to_pdf(&self) -> Vec<u8> {
        pdf::write(self)
    }
}

/// A group of lines placed together on one page when possible
struct Unit {
    lines: Vec<PageLine>,
    /// Lines repeated at the top of each continuation page when the unit has to be split
    repeat_header: usize,
}

impl PageLayout {
    /// The layout actually used: at least a few lines and columns, at most a full US Letter page
    pub fn normalized(self) -> Self {
        Self {
            lines_per_page: self.lines_per_page.clamp(MIN_LINES_PER_PAGE, pdf::MAX_LINES),
            line_width: self.line_width.clamp(MIN_LINE_WIDTH, pdf::MAX_COLUMNS),
        }
    }

    pub fn layout(&self, document: &ReportDocument) -> PaginatedDocument {
        let layout = self.normalized();
        let mut pager = Pager::new(layout.lines_per_page);

        let title_width = (layout.line_width * pdf::BODY_SIZE / pdf::TITLE_SIZE).max(1);
        let mut title = wrap_kind(LineKind::Title, &document.title, title_width);
        title.push(PageLine::new(LineKind::Text, document.generated_label()));
        title.push(PageLine::blank());
        pager.place(Unit { lines: title, repeat_header: 0 });

        for section in document.sections() {
            let mut heading = wrap_kind(LineKind::Heading(2), &section.title, layout.line_width);
            heading.push(PageLine::blank());
            pager.place(Unit { lines: heading, repeat_header: 0 });

            for block in &section.blocks {
                pager.place(layout.block_unit(block));
            }
        }

        pager.finish()
    }

    fn block_unit(&self, block: &Block) -> Unit {
        let width = self.line_width;
        let mut repeat_header = 0;

        let mut lines: Vec<PageLine> = match block {
            Block::Heading { text, level } => wrap_kind(LineKind::Heading((*level).clamp(1, 6)), text, width),
            Block::Paragraph(text) => text
                .lines()
                .flat_map(|line| wrap_kind(LineKind::Text, line, width))
                .collect(),
            Block::Table(table) => {
                repeat_header = 2;
                table_lines(table)
                    .into_iter()
                    .enumerate()
                    .map(|(i, line)| {
                        let kind = match i {
                            0 => LineKind::TableHeader,
                            1 => LineKind::TableRule,
                            _ => LineKind::TableRow,
                        };
                        PageLine::new(kind, truncate(&line, width))
                    })
                    .collect()
            }
            Block::BulletList(items) => items
                .iter()
                .flat_map(|item| wrap_item(LineKind::BulletItem, "- ", item, width))
                .collect(),
            Block::NumberedList(items) => items
                .iter()
                .enumerate()
                .flat_map(|(i, item)| wrap_item(LineKind::NumberedItem, &format!("{}. ", i + 1), item, width))
                .collect(),
        };

        lines.push(PageLine::blank());
        Unit { lines, repeat_header }
    }
}

struct Pager {
    lines_per_page: usize,
    pages: Vec<Page>,
    current: Vec<PageLine>,
}

impl Pager {
    fn new(lines_per_page: usize) -> Self {
        Self {
            lines_per_page,
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    fn remaining(&self) -> usize {
        self.lines_per_page.saturating_sub(self.current.len())
    }

    fn break_page(&mut self) {
        while matches!(self.current.last(), Some(line) if line.kind == LineKind::Blank) {
            self.current.pop();
        }
        if !self.current.is_empty() {
            self.pages.push(Page {
                lines: std::mem::take(&mut self.current),
            });
        }
    }

    fn push(&mut self, line: PageLine) {
        if line.kind == LineKind::Blank && (self.current.is_empty() || self.remaining() == 0) {
            return;
        }
        if self.remaining() == 0 {
            self.break_page();
        }
        self.current.push(line);
    }

    fn place(&mut self, unit: Unit) {
        let needed = unit.lines.iter().filter(|l| l.kind != LineKind::Blank).count();

        if needed > self.remaining() && needed <= self.lines_per_page {
            self.break_page();
        }

        if needed <= self.remaining() {
            for line in unit.lines {
                self.push(line);
            }
            return;
        }

        // Larger than a page: start fresh and split, repeating any header lines
        self.break_page();
        let header: Vec<PageLine> = unit.lines[..unit.repeat_header.min(unit.lines.len())].to_vec();
        for (i, line) in unit.lines.into_iter().enumerate() {
            if line.kind != LineKind::Blank && self.remaining() == 0 {
                self.break_page();
                if i >= header.len() {
                    for repeated in &header {
                        self.current.push(PageLine::continuation(repeated.kind, repeated.text.clone()));
                    }
                }
            }
            self.push(line);
        }
    }

    fn finish(mut self) -> PaginatedDocument {
        self.break_page();
        PaginatedDocument { pages: self.pages }
    }
}

/// Paginated renderer producing PDF bytes
#[derive(Debug, Clone, Default)]
pub struct PaginatedRenderer {
    layout: PageLayout,
}

impl PaginatedRenderer {
    pub fn new(layout: PageLayout) -> Self {
        Self { layout }
    }

    pub fn paginate(&self, document: &ReportDocument) -> PaginatedDocument {
        self.layout.layout(document)
    }
}

impl ReportRenderer for PaginatedRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Pdf
    }

    fn render(&self, document: &ReportDocument) -> Vec<u8> {
        self.paginate(document).to_pdf()
    }
}

fn wrap_kind(kind: LineKind, text: &str, width: usize) -> Vec<PageLine> {
    wrap(text, width)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                PageLine::new(kind, line)
            } else {
                PageLine::continuation(kind, line)
            }
        })
        .collect()
}

fn wrap_item(kind: LineKind, marker: &str, text: &str, width: usize) -> Vec<PageLine> {
    let indent = " ".repeat(marker.len());
    wrap(text, width.saturating_sub(marker.len()).max(1))
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                PageLine::new(kind, format!("{}{}", marker, line))
            } else {
                PageLine::continuation(LineKind::Text, format!("{}{}", indent, line))
            }
        })
        .collect()
}

/// Greedy word wrap; words longer than the width are hard-split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn truncate(line: &str, width: usize) -> String {
    if line.chars().count() <= width {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

mod pdf {
    //! Minimal PDF 1.4 writer: Courier text only, one content stream per page.

    use super::{LineKind, PaginatedDocument};

    const PAGE_WIDTH: usize = 612;
    const PAGE_HEIGHT: usize = 792;
    const MARGIN_LEFT: usize = 36;
    const TOP_BASELINE: usize = 756;
    const LEADING: usize = 12;
    const FOOTER_BASELINE: usize = 20;
    const FOOTER_SIZE: usize = 8;

    pub(super) const BODY_SIZE: usize = 10;
    pub(super) const TITLE_SIZE: usize = 14;

    /// Text lines that fit between the top margin and the footer
    pub(super) const MAX_LINES: usize = (TOP_BASELINE - FOOTER_BASELINE - LEADING) / LEADING;
    /// Courier glyphs are 0.6 em wide
    pub(super) const MAX_COLUMNS: usize = (PAGE_WIDTH - 2 * MARGIN_LEFT) * 10 / (BODY_SIZE * 6);

    pub(super) fn write(document: &PaginatedDocument) -> Vec<u8> {
        let page_count = document.pages.len().max(1);

        // 1 catalog, 2 page tree, 3 regular font, 4 bold font, then page/content pairs
        let mut objects: Vec<String> = Vec::with_capacity(4 + page_count * 2);
        let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 5 + i * 2)).collect();

        objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
        objects.push(format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_count
        ));
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>".to_string());
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Courier-Bold /Encoding /WinAnsiEncoding >>".to_string());

        for index in 0..page_count {
            let content = page_content(document, index, page_count);
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH,
                PAGE_HEIGHT,
                6 + index * 2
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}endstream",
                content.len(),
                content
            ));
        }

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, object) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, object));
        }

        let xref_offset = out.len();
        out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for offset in offsets {
            out.push_str(&format!("{:010} 00000 n \n", offset));
        }
        out.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        ));

        out.into_bytes()
    }

    fn page_content(document: &PaginatedDocument, index: usize, page_count: usize) -> String {
        let mut content = String::new();

        if let Some(page) = document.pages.get(index) {
            for (row, line) in page.lines.iter().enumerate() {
                if line.kind == LineKind::Blank || line.text.is_empty() {
                    continue;
                }
                let (font, size) = match line.kind {
                    LineKind::Title => ("F2", TITLE_SIZE),
                    LineKind::Heading(_) | LineKind::TableHeader => ("F2", BODY_SIZE),
                    _ => ("F1", BODY_SIZE),
                };
                let y = TOP_BASELINE.saturating_sub(row * LEADING);
                content.push_str(&format!(
                    "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
                    font,
                    size,
                    MARGIN_LEFT,
                    y,
                    escape(&line.text)
                ));
            }
        }

        content.push_str(&format!(
            "BT /F1 {} Tf {} {} Td ({}) Tj ET\n",
            FOOTER_SIZE,
            MARGIN_LEFT,
            FOOTER_BASELINE,
            escape(&format!("Page {} of {}", index + 1, page_count))
        ));
        content
    }

    /// Escape a PDF literal string. Characters outside ASCII are written as
    /// WinAnsiEncoding octal escapes; anything that encoding lacks becomes `?`.
    pub(super) fn escape(text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '\\' | '(' | ')' => {
                    escaped.push('\\');
                    escaped.push(c);
                }
                ' '..='~' => escaped.push(c),
                '\t' => escaped.push(' '),
                _ => match win_ansi(c) {
                    Some(code) => escaped.push_str(&format!("\\{:03o}", code)),
                    None => escaped.push('?'),
                },
            }
        }
        escaped
    }

    fn win_ansi(c: char) -> Option<u8> {
        let code = match c {
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => return None,
        };
        Some(code)
    }
}
