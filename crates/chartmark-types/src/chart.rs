use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Prefix shared by every chart surface id.
const CHART_ID_PREFIX: &str = "chart-";

/// Opaque, unique surface id of a chart placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartId(String);

impl ChartId {
    /// Mints a fresh id. Never reused across placeholders.
    pub fn mint() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(format!("{CHART_ID_PREFIX}{}", &simple[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChartId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A chart reference found during transformation.
///
/// Carries only the immutable half of the placeholder; the `rendered`
/// state lives with the surface the fragment is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPlaceholder {
    pub id: ChartId,
    /// Data-source URL exactly as written in the reply (trimmed).
    pub source_url: String,
}

impl ChartPlaceholder {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            id: ChartId::mint(),
            source_url: source_url.into(),
        }
    }
}

/// Chart document served by a chart data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDocument {
    /// Opaque series list handed to the renderer untouched.
    #[serde(default)]
    pub data: Value,
    /// Opaque layout object.
    #[serde(default)]
    pub layout: Value,
}

impl ChartDocument {
    /// Returns a new layout with `autosize: true` forced in.
    ///
    /// The document's own layout is left untouched. A missing or
    /// non-object layout is treated as empty.
    pub fn autosized_layout(&self) -> Value {
        let mut merged = match &self.layout {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        merged.insert("autosize".to_string(), Value::Bool(true));
        Value::Object(merged)
    }
}
