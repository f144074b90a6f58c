//! HTML rendering of display fragments.
//!
//! Produces the markup the chat page styles expect (`table-container`,
//! `plotly-chart`, `message-image-container`). Text is inserted verbatim
//! unless `HtmlOptions::escape_html` is set.

use std::borrow::Cow;
use std::fmt::Write;

use chartmark_types::{ChartId, ChartPlaceholder, DisplayFragment, ImageRef, Segment, Table};
use serde::{Deserialize, Serialize};

/// Rendering switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlOptions {
    /// Entity-escape text, cells and attributes.
    pub escape_html: bool,
}

/// How a chart placeholder should currently look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartView<'a> {
    /// Empty surface, not hydrated yet (or in flight).
    Pending,
    /// Hydrated; the chart has been drawn into the surface.
    Rendered,
    /// Hydration failed; the surface shows this reason.
    Failed(&'a str),
}

/// Renders a freshly transformed fragment. All charts render as pending.
pub fn render_fragment(fragment: &DisplayFragment, options: HtmlOptions) -> String {
    let mut out = String::new();
    render_segments(
        fragment.segments(),
        options,
        &|_: &ChartId| ChartView::Pending,
        &mut out,
    );
    out
}

/// Renders segments, asking `chart_view` for the state of each chart.
pub fn render_segments<'s>(
    segments: &[Segment],
    options: HtmlOptions,
    chart_view: &dyn Fn(&ChartId) -> ChartView<'s>,
    out: &mut String,
) {
    let escape = options.escape_html;

    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(&maybe_escape(text, escape)),
            Segment::Plain(text) => out.push_str(&escape_html(text)),
            Segment::LineBreak => out.push_str("<br>"),
            Segment::Strong(children) => {
                out.push_str("<strong>");
                render_segments(children, options, chart_view, out);
                out.push_str("</strong>");
            }
            Segment::Code(code) => {
                let code = maybe_escape(code, escape);
                let _ = write!(out, "<code>{}</code>", line_breaks(&code));
            }
            Segment::CodeBlock(body) => {
                let _ = write!(out, "<pre><code>{}</code></pre>", maybe_escape(body, escape));
            }
            Segment::Table(table) => render_table(table, options, out),
            Segment::Chart(chart) => render_chart(chart, chart_view(&chart.id), options, out),
            Segment::Image(image) => render_image(image, options, out),
        }
    }
}

fn render_table(table: &Table, options: HtmlOptions, out: &mut String) {
    let escape = options.escape_html;

    out.push_str("<div class=\"table-container\"><table>");

    out.push_str("<thead><tr>");
    for header in &table.header {
        let _ = write!(out, "<th>{}</th>", maybe_escape(header, escape));
    }
    out.push_str("</tr></thead>");

    out.push_str("<tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for value in row {
            let _ = write!(out, "<td>{}</td>", maybe_escape(value, escape));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table></div>");
}

/// Renders a chart surface in the given state.
pub fn render_chart(
    chart: &ChartPlaceholder,
    view: ChartView<'_>,
    options: HtmlOptions,
    out: &mut String,
) {
    let url = maybe_escape(&chart.source_url, options.escape_html);
    let rendered_attr = if view == ChartView::Rendered {
        " data-rendered=\"true\""
    } else {
        ""
    };

    let _ = write!(
        out,
        "<div id=\"{}\" class=\"plotly-chart\" data-url=\"{url}\"{rendered_attr} style=\"width:100%;\">",
        chart.id
    );
    if let ChartView::Failed(reason) = view {
        let reason = maybe_escape(reason, options.escape_html);
        let _ = write!(
            out,
            "<div style=\"color:#ef4444; padding:10px; border:1px solid #ef4444; border-radius:8px;\">Failed to load chart: {reason}</div>"
        );
    }
    out.push_str("</div>");
}

fn render_image(image: &ImageRef, options: HtmlOptions, out: &mut String) {
    let src = maybe_escape(&image.src, options.escape_html);
    let alt = maybe_escape(&image.alt, options.escape_html);
    let _ = write!(
        out,
        "<div class=\"message-image-container\"><img src=\"{src}\" alt=\"{alt}\" class=\"message-image\" loading=\"lazy\" onclick=\"window.open(this.src, '_blank')\"></div>"
    );
}

/// Inline code keeps its line breaks as `<br>`.
fn line_breaks(s: &str) -> Cow<'_, str> {
    if s.contains('\n') {
        Cow::Owned(s.replace("\r\n", "<br>").replace('\n', "<br>"))
    } else {
        Cow::Borrowed(s)
    }
}

fn maybe_escape(s: &str, escape: bool) -> Cow<'_, str> {
    if escape { escape_html(s) } else { Cow::Borrowed(s) }
}

/// Escapes `&`, `<`, `>`, `"` and `'` as HTML entities.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::transform;

    fn render(input: &str) -> String {
        render_fragment(&transform(input), HtmlOptions::default())
    }

    #[test]
    fn test_end_to_end_markup() {
        let html = render("Row1|Row2\n---|---\nA|B\n**bold** text");
        assert_eq!(
            html,
            "<div class=\"table-container\"><table><thead><tr><th>Row1</th><th>Row2</th></tr></thead>\
             <tbody><tr><td>A</td><td>B</td></tr></tbody></table></div><strong>bold</strong> text"
        );
    }

    #[test]
    fn test_table_header_and_body_counts() {
        let html = render("| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |");
        assert_eq!(html.matches("<th>").count(), 2);
        assert_eq!(html.matches("<tr>").count(), 3);
    }

    #[test]
    fn test_mismatched_row_keeps_its_cell_count() {
        let html = render("| A | B |\n|---|---|\n| 1 | 2 | 3 |");
        assert_eq!(html.matches("<td>").count(), 3);
    }

    #[test]
    fn test_bold_in_table_cell_stays_literal() {
        let html = render("| A |\n|---|\n| **x** |");
        assert!(html.contains("<td>**x**</td>"));
        assert!(!html.contains("<strong>"));
    }

    #[test]
    fn test_inline_markup() {
        assert_eq!(render("a\nb"), "a<br>b");
        assert_eq!(render("`x`"), "<code>x</code>");
        assert_eq!(render("```\nfn x() {}\n```"), "<pre><code>\nfn x() {}\n</code></pre>");
    }

    #[test]
    fn test_chart_placeholder_markup() {
        let fragment = transform("![c](data/x.json)");
        let id = fragment.charts()[0].id.clone();
        let html = render_fragment(&fragment, HtmlOptions::default());

        assert_eq!(
            html,
            format!(
                "<div id=\"{id}\" class=\"plotly-chart\" data-url=\"data/x.json\" style=\"width:100%;\"></div>"
            )
        );
    }

    #[test]
    fn test_image_markup() {
        let html = render("![pic](img/x.png)");
        assert!(html.starts_with("<div class=\"message-image-container\"><img src=\"img/x.png\" alt=\"pic\""));
        assert!(html.contains("loading=\"lazy\""));
        assert!(html.contains("window.open(this.src, '_blank')"));
    }

    #[test]
    fn test_failed_and_rendered_chart_views() {
        let chart = ChartPlaceholder::new("a.json");

        let mut failed = String::new();
        render_chart(&chart, ChartView::Failed("HTTP 404"), HtmlOptions::default(), &mut failed);
        assert!(failed.contains("Failed to load chart: HTTP 404"));
        assert!(!failed.contains("data-rendered"));

        let mut rendered = String::new();
        render_chart(&chart, ChartView::Rendered, HtmlOptions::default(), &mut rendered);
        assert!(rendered.contains("data-rendered=\"true\""));
    }

    #[test]
    fn test_multiline_strong_and_code() {
        assert_eq!(render("**a\nb**"), "<strong>a<br>b</strong>");
        assert_eq!(render("`a\nb`"), "<code>a<br>b</code>");
    }

    #[test]
    fn test_plain_segment_always_escaped() {
        let fragment = DisplayFragment::plain("Error: <img src=x onerror=alert(1)>");
        assert_eq!(
            render_fragment(&fragment, HtmlOptions::default()),
            "Error: &lt;img src=x onerror=alert(1)&gt;"
        );
    }

    #[test]
    fn test_no_escaping_by_default() {
        assert_eq!(render("<b>x</b>"), "<b>x</b>");
    }

    #[test]
    fn test_escaping_when_enabled() {
        let options = HtmlOptions { escape_html: true };
        let html = render_fragment(&transform("<b>x</b> & **\"y\"**"), options);
        assert_eq!(html, "&lt;b&gt;x&lt;/b&gt; &amp; <strong>&quot;y&quot;</strong>");

        let html = render_fragment(&transform("|A|\n|---|\n|<i>|"), options);
        assert!(html.contains("<td>&lt;i&gt;</td>"));

        let html = render_fragment(&transform("![a\"b](x.png)"), options);
        assert!(html.contains("alt=\"a&quot;b\""));
    }

    #[test]
    fn test_escape_html_borrows_clean_input() {
        assert!(matches!(escape_html("clean"), Cow::Borrowed(_)));
        assert_eq!(escape_html("'&'"), "&#39;&amp;&#39;");
    }
}
