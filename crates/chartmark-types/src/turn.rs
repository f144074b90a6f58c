use serde::{Deserialize, Serialize};

/// Body of a backend turn-query response.
///
/// Exactly one of the fields is normally set; `error` wins when both are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
