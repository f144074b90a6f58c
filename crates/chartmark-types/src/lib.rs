//! Data model shared by the chartmark transformer, renderer and CLI.

mod chart;
mod fragment;
mod turn;

pub use chart::{ChartDocument, ChartId, ChartPlaceholder};
pub use fragment::{DisplayFragment, ImageRef, Segment, Table};
pub use turn::TurnReply;
