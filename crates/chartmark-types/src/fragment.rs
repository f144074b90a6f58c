use serde::{Deserialize, Serialize};

use crate::chart::ChartPlaceholder;

/// One rendered piece of a reply, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Segment {
    /// Reply text, inserted into markup as-is.
    Text(String),
    /// Untrusted message text. Always entity-escaped when rendered.
    Plain(String),
    LineBreak,
    /// Emphasized run. Never contains another `Strong`.
    Strong(Vec<Segment>),
    /// Inline code span.
    Code(String),
    /// Fenced code block; body kept verbatim.
    CodeBlock(String),
    Table(Table),
    /// Reserved surface for an asynchronously loaded chart.
    Chart(ChartPlaceholder),
    /// Static image.
    Image(ImageRef),
}

/// A pipe-delimited table. Rows may be ragged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Static image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
}

/// Output of the markup transformer: the reply as an ordered list of segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayFragment {
    segments: Vec<Segment>,
}

impl DisplayFragment {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// A fragment showing `text` verbatim, with no markup interpretation.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            segments: vec![Segment::Text(text)],
        }
    }

    /// A fragment showing `text` as an escaped plain message.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            segments: vec![Segment::Plain(text)],
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Chart placeholders awaiting hydration, in document order.
    pub fn charts(&self) -> Vec<&ChartPlaceholder> {
        let mut out = Vec::new();
        collect_charts(&self.segments, &mut out);
        out
    }

    /// Concatenated visible text, without markup. Handy for previews and tests.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.segments, &mut out);
        out
    }
}

fn collect_charts<'a>(segments: &'a [Segment], out: &mut Vec<&'a ChartPlaceholder>) {
    for segment in segments {
        match segment {
            Segment::Chart(chart) => out.push(chart),
            Segment::Strong(children) => collect_charts(children, out),
            _ => {}
        }
    }
}

fn collect_text(segments: &[Segment], out: &mut String) {
    for segment in segments {
        match segment {
            Segment::Text(text)
            | Segment::Plain(text)
            | Segment::Code(text)
            | Segment::CodeBlock(text) => {
                out.push_str(text);
            }
            Segment::LineBreak => out.push('\n'),
            Segment::Strong(children) => collect_text(children, out),
            Segment::Table(table) => {
                out.push_str(&table.header.join(" | "));
                for row in &table.rows {
                    out.push('\n');
                    out.push_str(&row.join(" | "));
                }
                out.push('\n');
            }
            Segment::Image(image) => out.push_str(&image.alt),
            Segment::Chart(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::chart::ChartId;

    fn chart(id: &str, url: &str) -> ChartPlaceholder {
        ChartPlaceholder {
            id: ChartId::from(id),
            source_url: url.to_string(),
        }
    }

    #[test]
    fn test_charts_includes_nested_strong() {
        let fragment = DisplayFragment::new(vec![
            Segment::Chart(chart("chart-a", "a.json")),
            Segment::Strong(vec![Segment::Chart(chart("chart-b", "b.json"))]),
        ]);

        let ids: Vec<&str> = fragment.charts().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["chart-a", "chart-b"]);
    }

    #[test]
    fn test_literal_empty_is_empty_fragment() {
        assert!(DisplayFragment::literal("").is_empty());
        assert_eq!(DisplayFragment::literal("hi").segments().len(), 1);
    }

    #[test]
    fn test_plain_fragment() {
        assert!(DisplayFragment::plain("").is_empty());
        let fragment = DisplayFragment::plain("a <b>");
        assert_eq!(fragment.segments(), &[Segment::Plain("a <b>".to_string())]);
        assert_eq!(fragment.plain_text(), "a <b>");
    }

    #[test]
    fn test_segment_serialization_shape() {
        let value = serde_json::to_value(Segment::Text("hi".to_string())).unwrap();
        assert_eq!(value, json!({"type": "text", "value": "hi"}));

        let value = serde_json::to_value(Segment::LineBreak).unwrap();
        assert_eq!(value, json!({"type": "line_break"}));
    }

    #[test]
    fn test_plain_text() {
        let fragment = DisplayFragment::new(vec![
            Segment::Strong(vec![Segment::Text("bold".to_string())]),
            Segment::Text(" text".to_string()),
            Segment::LineBreak,
            Segment::Code("x".to_string()),
        ]);
        assert_eq!(fragment.plain_text(), "bold text\nx");
    }
}
