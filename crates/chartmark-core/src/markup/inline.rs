//! Single-pass scanner for the inline constructs of free text.
//!
//! Recognized, leftmost first:
//! - ```` ```body``` ```` fenced code block (may span lines, body verbatim)
//! - `` `code` `` inline code
//! - `**strong**` (no nesting; may hold line breaks)
//! - `![alt](src)` image, or chart when `src` ends in `.json`
//! - newlines
//!
//! Anything that does not close degrades to literal text.

use std::mem;

use chartmark_types::{ChartPlaceholder, ImageRef, Segment};

const FENCE: &str = "```";
const STRONG: &str = "**";
const CHART_EXTENSION: &str = ".json";

/// Scans free text (no tables) into segments.
pub(crate) fn scan(text: &str) -> Vec<Segment> {
    Scanner::new(text, true).run()
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    allow_strong: bool,
    segments: Vec<Segment>,
    pending: String,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, allow_strong: bool) -> Self {
        Self {
            text,
            pos: 0,
            allow_strong,
            segments: Vec::new(),
            pending: String::new(),
        }
    }

    fn run(mut self) -> Vec<Segment> {
        let text = self.text;
        while self.pos < text.len() {
            let rest = &text[self.pos..];
            let consumed = match rest.as_bytes()[0] {
                b'`' if rest.starts_with(FENCE) => self.code_block(rest),
                b'`' => self.code_span(rest),
                b'*' if self.allow_strong && rest.starts_with(STRONG) => self.strong(rest),
                b'!' if rest.starts_with("![") => self.image(rest),
                b'\n' => Some(self.line_break(1)),
                b'\r' if rest.starts_with("\r\n") => Some(self.line_break(2)),
                _ => None,
            };

            let advance = consumed.unwrap_or_else(|| literal_len(rest));
            if consumed.is_none() {
                self.pending.push_str(&rest[..advance]);
            }
            self.pos += advance;
        }

        self.flush_text();
        self.segments
    }

    fn flush_text(&mut self) {
        if !self.pending.is_empty() {
            let text = mem::take(&mut self.pending);
            self.segments.push(Segment::Text(text));
        }
    }

    fn emit(&mut self, segment: Segment) {
        self.flush_text();
        self.segments.push(segment);
    }

    fn line_break(&mut self, len: usize) -> usize {
        self.emit(Segment::LineBreak);
        len
    }

    fn code_block(&mut self, rest: &str) -> Option<usize> {
        let body = &rest[FENCE.len()..];
        let end = body.find(FENCE)?;
        self.emit(Segment::CodeBlock(body[..end].to_string()));
        Some(FENCE.len() * 2 + end)
    }

    fn code_span(&mut self, rest: &str) -> Option<usize> {
        let body = &rest[1..];
        let end = body.find('`')?;
        self.emit(Segment::Code(body[..end].to_string()));
        Some(end + 2)
    }

    fn strong(&mut self, rest: &str) -> Option<usize> {
        let body = &rest[STRONG.len()..];
        let end = body.find(STRONG)?;
        let children = Scanner::new(&body[..end], false).run();
        self.emit(Segment::Strong(children));
        Some(STRONG.len() * 2 + end)
    }

    fn image(&mut self, rest: &str) -> Option<usize> {
        let after_bang = &rest[2..];
        let alt_end = after_bang.find(']')?;
        let alt = &after_bang[..alt_end];

        let after_alt = after_bang[alt_end + 1..].strip_prefix('(')?;
        let src_end = after_alt.find(')')?;
        if src_end == 0 {
            return None;
        }
        let src = after_alt[..src_end].trim();

        let segment = if is_chart_source(src) {
            Segment::Chart(ChartPlaceholder::new(src))
        } else {
            Segment::Image(ImageRef {
                src: src.to_string(),
                alt: alt.to_string(),
            })
        };
        self.emit(segment);

        // "![" + alt + "](" + src + ")"
        Some(2 + alt_end + 2 + src_end + 1)
    }
}

/// Length of the literal run to copy when no construct matched at `rest`.
fn literal_len(rest: &str) -> usize {
    if rest.starts_with(FENCE) {
        return FENCE.len();
    }
    if rest.starts_with(STRONG) {
        return STRONG.len();
    }
    // The special byte itself, then everything up to the next special byte.
    let first = rest.chars().next().map_or(1, char::len_utf8);
    first
        + rest[first..]
            .find(|c| matches!(c, '`' | '*' | '!' | '\n' | '\r'))
            .unwrap_or(rest.len() - first)
}

fn is_chart_source(src: &str) -> bool {
    let tail = src.len().checked_sub(CHART_EXTENSION.len());
    tail.and_then(|start| src.get(start..))
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CHART_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    #[test]
    fn test_plain_text_single_segment() {
        assert_eq!(scan("just words here"), vec![text("just words here")]);
    }

    #[test]
    fn test_newlines_become_breaks() {
        assert_eq!(
            scan("a\nb\r\nc"),
            vec![
                text("a"),
                Segment::LineBreak,
                text("b"),
                Segment::LineBreak,
                text("c")
            ]
        );
    }

    #[test]
    fn test_strong_and_trailing_text() {
        assert_eq!(
            scan("**bold** text"),
            vec![Segment::Strong(vec![text("bold")]), text(" text")]
        );
    }

    #[test]
    fn test_strong_can_hold_code() {
        assert_eq!(
            scan("**use `cargo`**"),
            vec![Segment::Strong(vec![
                text("use "),
                Segment::Code("cargo".to_string())
            ])]
        );
    }

    #[test]
    fn test_unterminated_strong_is_literal() {
        assert_eq!(scan("**open ended"), vec![text("**open ended")]);
    }

    #[test]
    fn test_strong_spans_line_break() {
        assert_eq!(
            scan("**a\nb**"),
            vec![Segment::Strong(vec![text("a"), Segment::LineBreak, text("b")])]
        );
    }

    #[test]
    fn test_code_spans_line_break() {
        assert_eq!(
            scan("`a\nb` c"),
            vec![Segment::Code("a\nb".to_string()), text(" c")]
        );
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            scan("run `ls -la` now"),
            vec![text("run "), Segment::Code("ls -la".to_string()), text(" now")]
        );
    }

    #[test]
    fn test_code_span_content_is_not_bold() {
        assert_eq!(
            scan("`**x**`"),
            vec![Segment::Code("**x**".to_string())]
        );
    }

    #[test]
    fn test_unterminated_code_is_literal() {
        assert_eq!(scan("a `b"), vec![text("a `b")]);
    }

    #[test]
    fn test_code_block_verbatim() {
        let segments = scan("before\n```\nlet x = **1**;\n`y`\n```\nafter");
        assert_eq!(
            segments,
            vec![
                text("before"),
                Segment::LineBreak,
                Segment::CodeBlock("\nlet x = **1**;\n`y`\n".to_string()),
                Segment::LineBreak,
                text("after"),
            ]
        );
    }

    #[test]
    fn test_unterminated_fence_is_literal() {
        assert_eq!(
            scan("```rust\nfn main"),
            vec![text("```rust"), Segment::LineBreak, text("fn main")]
        );
    }

    #[test]
    fn test_chart_reference_mixed_case_extension() {
        let segments = scan("![chart](data/x.JSON)");
        match segments.as_slice() {
            [Segment::Chart(chart)] => {
                assert_eq!(chart.source_url, "data/x.JSON");
                assert!(chart.id.as_str().starts_with("chart-"));
            }
            other => panic!("expected a chart, got {other:?}"),
        }
    }

    #[test]
    fn test_image_reference() {
        assert_eq!(
            scan("![pic](img/x.png)"),
            vec![Segment::Image(ImageRef {
                src: "img/x.png".to_string(),
                alt: "pic".to_string()
            })]
        );
    }

    #[test]
    fn test_image_src_trimmed_and_empty_alt() {
        assert_eq!(
            scan("![]( /static/a.png )"),
            vec![Segment::Image(ImageRef {
                src: "/static/a.png".to_string(),
                alt: String::new()
            })]
        );
    }

    #[test]
    fn test_chart_src_trimmed() {
        let segments = scan("see ![c]( /static/charts/q1.json ) below");
        assert_eq!(segments.len(), 3);
        match &segments[1] {
            Segment::Chart(chart) => assert_eq!(chart.source_url, "/static/charts/q1.json"),
            other => panic!("expected a chart, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_image_is_literal() {
        assert_eq!(scan("![alt] (x.png)"), vec![text("![alt] (x.png)")]);
        assert_eq!(scan("![alt]()"), vec![text("![alt]()")]);
        assert_eq!(scan("![never closed"), vec![text("![never closed")]);
    }

    #[test]
    fn test_each_chart_gets_its_own_id() {
        let segments = scan("![a](a.json)![b](a.json)");
        let ids: Vec<_> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Chart(c) => Some(c.id.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_json_must_be_the_extension() {
        assert!(is_chart_source("a.json"));
        assert!(is_chart_source("A.Json"));
        assert!(!is_chart_source("a.json.png"));
        assert!(!is_chart_source("json"));
        assert!(!is_chart_source("ü"));
    }

    #[test]
    fn test_lone_specials_are_literal() {
        assert_eq!(scan("3 * 4 ! done"), vec![text("3 * 4 ! done")]);
    }

    #[test]
    fn test_non_ascii_text() {
        assert_eq!(
            scan("café **naïve** ✓"),
            vec![
                text("café "),
                Segment::Strong(vec![text("naïve")]),
                text(" ✓")
            ]
        );
    }
}
