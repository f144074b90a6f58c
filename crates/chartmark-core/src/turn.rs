use chartmark_types::{DisplayFragment, TurnReply};

use crate::markup::transform_or_raw;

/// Routes a conversation turn to its display fragment.
///
/// A non-empty error is shown as escaped plain text and never
/// transformed. Otherwise the response goes through the markup
/// transformer. A turn with neither renders nothing.
pub fn render_turn(reply: &TurnReply) -> DisplayFragment {
    if let Some(error) = reply.error.as_deref().filter(|e| !e.is_empty()) {
        return DisplayFragment::plain(format!("Error: {error}"));
    }

    match &reply.response {
        Some(response) => transform_or_raw(response),
        None => DisplayFragment::default(),
    }
}
