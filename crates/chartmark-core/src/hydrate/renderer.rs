//! Chart rendering services.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chartmark_types::ChartId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options passed to every render call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub responsive: bool,
    /// When the mode bar is shown: `"hover"`, `"true"` or `"false"`.
    pub display_mode_bar: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            responsive: true,
            display_mode_bar: "hover".to_string(),
        }
    }
}

/// A chart-drawing service addressed by surface id.
///
/// Implementations must be callable from any hydration task.
pub trait ChartRenderer: Send + Sync {
    /// Draws `data` with `layout` into the surface.
    fn render(
        &self,
        surface: &ChartId,
        data: &Value,
        layout: &Value,
        options: &RenderOptions,
    ) -> Result<()>;

    /// Applies a partial layout update to an already drawn surface.
    fn relayout(&self, surface: &ChartId, update: &Value) -> Result<()>;

    /// Current width of the surface in pixels, or 0 when unknown.
    fn measure_width(&self, surface: &ChartId) -> f64;
}

/// A figure as last drawn by [`PlotlyPageRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub data: Value,
    pub layout: Value,
    pub options: RenderOptions,
}

#[derive(Debug, Default)]
struct PageState {
    figures: HashMap<ChartId, Figure>,
    statements: Vec<String>,
}

/// Renders charts into a static page as Plotly.js calls.
///
/// Every call is recorded as a script statement in call order; the
/// statements are emitted by [`PlotlyPageRenderer::script`].
#[derive(Debug, Default)]
pub struct PlotlyPageRenderer {
    surface_width: f64,
    state: Mutex<PageState>,
}

impl PlotlyPageRenderer {
    /// `surface_width` is reported by `measure_width` for every surface.
    pub fn new(surface_width: f64) -> Self {
        Self {
            surface_width,
            state: Mutex::default(),
        }
    }

    pub fn figure(&self, surface: &ChartId) -> Option<Figure> {
        self.lock().figures.get(surface).cloned()
    }

    pub fn figure_count(&self) -> usize {
        self.lock().figures.len()
    }

    /// A `<script>` element replaying every recorded call, or an empty
    /// string when nothing was drawn.
    pub fn script(&self) -> String {
        let state = self.lock();
        if state.statements.is_empty() {
            return String::new();
        }

        let mut out = String::from("<script>\n");
        for statement in &state.statements {
            out.push_str(statement);
            out.push('\n');
        }
        out.push_str("</script>");
        out
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChartRenderer for PlotlyPageRenderer {
    fn render(
        &self,
        surface: &ChartId,
        data: &Value,
        layout: &Value,
        options: &RenderOptions,
    ) -> Result<()> {
        let statement = format!(
            "Plotly.newPlot({}, {}, {}, {});",
            script_json(&Value::String(surface.to_string()))?,
            script_json(data)?,
            script_json(layout)?,
            serde_json::to_string(options).context("serialize render options")?,
        );

        let mut state = self.lock();
        state.figures.insert(
            surface.clone(),
            Figure {
                data: data.clone(),
                layout: layout.clone(),
                options: options.clone(),
            },
        );
        state.statements.push(statement);
        Ok(())
    }

    fn relayout(&self, surface: &ChartId, update: &Value) -> Result<()> {
        let mut state = self.lock();
        let Some(figure) = state.figures.get_mut(surface) else {
            anyhow::bail!("no chart drawn into surface {surface}");
        };
        if let (Value::Object(layout), Value::Object(changes)) = (&mut figure.layout, update) {
            for (key, value) in changes {
                layout.insert(key.clone(), value.clone());
            }
        }

        let statement = format!(
            "Plotly.relayout({}, {});",
            script_json(&Value::String(surface.to_string()))?,
            script_json(update)?,
        );
        state.statements.push(statement);
        Ok(())
    }

    fn measure_width(&self, _surface: &ChartId) -> f64 {
        self.surface_width
    }
}

/// JSON that is safe to embed inside a `<script>` element.
fn script_json(value: &Value) -> Result<String> {
    let json = serde_json::to_string(value).context("serialize chart JSON")?;
    Ok(json.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_render_options_wire_names() {
        let json = serde_json::to_value(RenderOptions::default()).unwrap();
        assert_eq!(json, json!({"responsive": true, "displayModeBar": "hover"}));
    }

    #[test]
    fn test_script_replays_calls_in_order() {
        let renderer = PlotlyPageRenderer::new(640.0);
        let id = ChartId::from("chart-abc");

        renderer
            .render(&id, &json!([{"y": [1, 2]}]), &json!({"autosize": true}), &RenderOptions::default())
            .unwrap();
        renderer.relayout(&id, &json!({"width": 640.0})).unwrap();

        let script = renderer.script();
        let new_plot = script.find("Plotly.newPlot(\"chart-abc\", [{\"y\":[1,2]}], {\"autosize\":true}").unwrap();
        let relayout = script.find("Plotly.relayout(\"chart-abc\", {\"width\":640.0});").unwrap();
        assert!(new_plot < relayout);
        assert!(script.starts_with("<script>"));
    }

    #[test]
    fn test_relayout_merges_into_figure() {
        let renderer = PlotlyPageRenderer::new(0.0);
        let id = ChartId::from("chart-x");
        renderer
            .render(&id, &json!([]), &json!({"title": "t"}), &RenderOptions::default())
            .unwrap();
        renderer.relayout(&id, &json!({"width": 300})).unwrap();

        let figure = renderer.figure(&id).unwrap();
        assert_eq!(figure.layout, json!({"title": "t", "width": 300}));
    }

    #[test]
    fn test_relayout_unknown_surface_fails() {
        let renderer = PlotlyPageRenderer::new(0.0);
        let err = renderer.relayout(&ChartId::from("chart-none"), &json!({})).unwrap_err();
        assert!(err.to_string().contains("chart-none"));
    }

    #[test]
    fn test_script_escapes_closing_tags() {
        let renderer = PlotlyPageRenderer::new(0.0);
        renderer
            .render(
                &ChartId::from("chart-s"),
                &json!([{"name": "</script><b>"}]),
                &json!({}),
                &RenderOptions::default(),
            )
            .unwrap();
        let script = renderer.script();
        assert_eq!(script.matches("</script>").count(), 1);
    }

    #[test]
    fn test_empty_script_when_nothing_drawn() {
        assert_eq!(PlotlyPageRenderer::new(100.0).script(), "");
    }
}
