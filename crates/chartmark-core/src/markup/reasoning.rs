//! Removal of reasoning blocks from reply text.
//!
//! Some agents wrap their private reasoning in `<thinking>` tags and the
//! user-facing part in `<answer>` tags:
//!
//! ```text
//! <thinking>The user wants totals per region...</thinking>
//! <answer>Here are the totals.</answer>
//! ```
//!
//! The thinking span is dropped entirely; the answer tags are dropped but
//! their contents kept. Matching is ASCII-case-insensitive.

use std::borrow::Cow;

const THINKING_OPEN: &str = "<thinking>";
const THINKING_CLOSE: &str = "</thinking>";
const ANSWER_OPEN: &str = "<answer>";
const ANSWER_CLOSE: &str = "</answer>";

/// Strips reasoning blocks and answer tags.
///
/// A `<thinking>` with no matching close removes everything up to the end
/// of the text. A stray `</thinking>` with no open is left alone.
/// Returns the input unchanged (borrowed) when there is nothing to strip.
pub fn strip_reasoning(raw: &str) -> Cow<'_, str> {
    let lower = raw.to_ascii_lowercase();
    let has_thinking = lower.contains(THINKING_OPEN);
    let has_answer = lower.contains(ANSWER_OPEN) || lower.contains(ANSWER_CLOSE);
    if !has_thinking && !has_answer {
        return Cow::Borrowed(raw);
    }

    let without_thinking = if has_thinking {
        remove_thinking(raw, &lower)
    } else {
        raw.to_string()
    };

    // Removing a thinking span can glue an answer tag together, so search again.
    let lower = without_thinking.to_ascii_lowercase();
    Cow::Owned(remove_answer_tags(&without_thinking, &lower))
}

/// `lower` must be `raw.to_ascii_lowercase()`; byte offsets line up.
fn remove_thinking(raw: &str, lower: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pos = 0;

    while let Some(rel_open) = lower[pos..].find(THINKING_OPEN) {
        let open = pos + rel_open;
        out.push_str(&raw[pos..open]);

        let body = open + THINKING_OPEN.len();
        match lower[body..].find(THINKING_CLOSE) {
            Some(rel_close) => pos = body + rel_close + THINKING_CLOSE.len(),
            None => return out,
        }
    }

    out.push_str(&raw[pos..]);
    out
}

fn remove_answer_tags(raw: &str, lower: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pos = 0;

    while let Some(rel) = lower[pos..].find('<') {
        let at = pos + rel;
        out.push_str(&raw[pos..at]);

        let rest = &lower[at..];
        if rest.starts_with(ANSWER_OPEN) {
            pos = at + ANSWER_OPEN.len();
        } else if rest.starts_with(ANSWER_CLOSE) {
            pos = at + ANSWER_CLOSE.len();
        } else {
            out.push('<');
            pos = at + 1;
        }
    }

    out.push_str(&raw[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_thinking_block() {
        let out = strip_reasoning("<thinking>secret</thinking>visible");
        assert_eq!(out, "visible");
    }

    #[test]
    fn test_strip_is_case_insensitive() {
        let out = strip_reasoning("a<THINKING>x</Thinking>b<Answer>c</ANSWER>");
        assert_eq!(out, "abc");
    }

    #[test]
    fn test_strip_multiline_and_multiple_blocks() {
        let input = "<thinking>\nstep 1\nstep 2\n</thinking>one <thinking>more</thinking>two";
        assert_eq!(strip_reasoning(input), "one two");
    }

    #[test]
    fn test_unterminated_thinking_removes_to_end() {
        let out = strip_reasoning("shown <thinking>never closed\nstill hidden");
        assert_eq!(out, "shown ");
    }

    #[test]
    fn test_stray_close_tag_is_kept() {
        let out = strip_reasoning("a</thinking>b");
        assert_eq!(out, "a</thinking>b");
    }

    #[test]
    fn test_answer_tags_removed_content_kept() {
        let out = strip_reasoning("<answer>The total is **42**.</answer>");
        assert_eq!(out, "The total is **42**.");
    }

    #[test]
    fn test_other_tags_untouched() {
        let out = strip_reasoning("<answer>x</answer> <b>y</b> a < b");
        assert_eq!(out, "x <b>y</b> a < b");
    }

    #[test]
    fn test_nothing_to_strip_borrows() {
        let out = strip_reasoning("plain text");
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_non_ascii_offsets_preserved() {
        let out = strip_reasoning("héllo <thinking>ünïcode</thinking>wörld");
        assert_eq!(out, "héllo wörld");
    }
}
