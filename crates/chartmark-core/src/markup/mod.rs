//! Markup transformation for assistant replies.
//!
//! This module provides:
//! - `transform()`: raw reply text into a `DisplayFragment`
//! - `transform_or_raw()`: same, falling back to the raw text if anything goes wrong
//! - `strip_reasoning()` / `parse_table()`: the individual passes
//!
//! Pass order matters: reasoning blocks are removed first, tables are cut
//! out next, and only the remaining free text is scanned for inline
//! constructs. Table cells therefore never pick up emphasis, code or images.

mod inline;
mod reasoning;
mod table;

use std::panic;

use chartmark_types::{DisplayFragment, Segment};
pub use reasoning::strip_reasoning;
pub use table::parse_table;
use table::Block;
use tracing::{debug, error};

/// Transforms raw reply text into a display fragment.
///
/// Total: malformed constructs degrade to literal text.
pub fn transform(raw: &str) -> DisplayFragment {
    if raw.is_empty() {
        return DisplayFragment::default();
    }

    let text = strip_reasoning(raw);
    let mut segments = Vec::new();
    let mut tables = 0usize;

    for block in table::split_blocks(&text) {
        match block {
            Block::Table(table) => {
                tables += 1;
                segments.push(Segment::Table(table));
            }
            Block::Text(free) => segments.extend(inline::scan(free)),
        }
    }

    let fragment = DisplayFragment::new(segments);
    debug!(
        tables,
        charts = fragment.charts().len(),
        "transformed reply"
    );
    fragment
}

/// Like [`transform`], but never loses the reply.
///
/// If the transformer panics the raw text is shown verbatim.
pub fn transform_or_raw(raw: &str) -> DisplayFragment {
    match panic::catch_unwind(|| transform(raw)) {
        Ok(fragment) => fragment,
        Err(_) => {
            error!(len = raw.len(), "markup transform failed, showing raw reply");
            DisplayFragment::literal(raw)
        }
    }
}
