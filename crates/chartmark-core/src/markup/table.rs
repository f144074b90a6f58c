//! Pipe-table detection and parsing.
//!
//! A table block is a header row, directly followed by a separator row,
//! followed by body rows shaped like the header:
//!
//! ```text
//! Region | Total      <- header (line 0)
//! -------|------      <- separator (line 1, discarded)
//! North  | 120        <- body rows (lines 2..)
//! ```
//!
//! "Shaped like the header" means the row has a leading pipe exactly when
//! the header has one, and likewise for the trailing pipe. Prose that
//! merely contains a pipe next to a table therefore stays prose.
//!
//! Tables are cut out of the text before any inline scanning, so cell
//! content is never interpreted as emphasis, code or images.

use chartmark_types::Table;

/// A piece of reply text after table extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Block<'a> {
    Text(&'a str),
    Table(Table),
}

/// Splits `text` into alternating free-text and table blocks.
///
/// A table block swallows the line terminator of its last row.
pub(crate) fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let lines = line_spans(text);
    let mut blocks = Vec::new();
    let mut text_start = 0;
    let mut sep = 1;

    while sep < lines.len() {
        let header = lines[sep - 1].1;
        if !is_separator(lines[sep].1) || !is_header(header) {
            sep += 1;
            continue;
        }

        let shape = RowShape::of(header);
        let mut end = sep + 1;
        while end < lines.len() && shape.matches(lines[end].1) {
            end += 1;
        }

        let start = lines[sep - 1].0;
        let last = lines[end - 1];
        let stop = last.0 + last.1.len();

        if start > text_start {
            blocks.push(Block::Text(&text[text_start..start]));
        }
        let source = &text[start..stop];
        match parse_table(source) {
            Some(table) => blocks.push(Block::Table(table)),
            None => blocks.push(Block::Text(source)),
        }

        text_start = stop;
        // The next header can be at `end` at the earliest.
        sep = end + 1;
    }

    if text_start < text.len() {
        blocks.push(Block::Text(&text[text_start..]));
    }
    blocks
}

/// Parses a table block.
///
/// Line 0 is the header, line 1 is dropped, the rest are body rows. Cells
/// are split on `|`, whitespace-only cells are dropped and the rest trimmed.
/// Body rows left without cells are skipped; rows are never padded.
/// Returns `None` for blocks shorter than two lines.
pub fn parse_table(block: &str) -> Option<Table> {
    let lines: Vec<&str> = block.trim().split('\n').collect();
    if lines.len() < 2 {
        return None;
    }

    let header = split_cells(lines[0]);
    let rows = lines[2..]
        .iter()
        .map(|line| split_cells(line))
        .filter(|cells| !cells.is_empty())
        .collect();

    Some(Table { header, rows })
}

fn split_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(String::from)
        .collect()
}

/// `(byte offset, line including its terminator)` for every line.
fn line_spans(text: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        spans.push((offset, line));
        offset += line.len();
    }
    spans
}

/// Which ends of a row carry a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowShape {
    leading: bool,
    trailing: bool,
}

impl RowShape {
    fn of(line: &str) -> Self {
        let content = line.trim();
        Self {
            leading: content.starts_with('|'),
            trailing: content.len() > 1 && content.ends_with('|'),
        }
    }

    fn matches(self, line: &str) -> bool {
        is_row(line) && Self::of(line) == self
    }
}

fn is_header(line: &str) -> bool {
    is_row(line) && !is_separator(line)
}

fn is_row(line: &str) -> bool {
    line.contains('|')
}

fn is_separator(line: &str) -> bool {
    let content = line.trim();
    !content.is_empty()
        && content.contains('-')
        && content.contains('|')
        && content
            .chars()
            .all(|c| matches!(c, '-' | ':' | '|') || c.is_whitespace())
}
