//! Hydrate command handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use chartmark_core::config::Config;
use chartmark_core::hydrate::{self, ChartHydrator, HydrationOutcome, PlotlyPageRenderer, Surface};
use tracing::info;
use url::Url;

use super::Input;

pub struct HydrateRunOptions<'a> {
    pub input: &'a Input,
    pub base_url: Option<&'a str>,
    pub width: Option<f64>,
    pub config: &'a Config,
}

/// Prints the hydrated HTML followed by the chart script.
///
/// Chart failures are reported on stderr but do not fail the command.
pub async fn run(options: HydrateRunOptions<'_>) -> Result<()> {
    let HydrateRunOptions {
        input,
        base_url,
        width,
        config,
    } = options;

    let mut hydrate_options = config.charts.hydrate_options()?;
    if let Some(raw) = base_url {
        let url = Url::parse(raw).with_context(|| format!("invalid --base-url {raw}"))?;
        hydrate_options.base_url = Some(url);
    }

    let width = width.unwrap_or(config.charts.surface_width);
    let renderer = Arc::new(PlotlyPageRenderer::new(width));
    let hydrator = ChartHydrator::new(renderer.clone(), hydrate_options)?;

    let surface = Surface::attach(input.fragment()?);
    let outcomes = hydrate::join_all(hydrator.hydrate(&surface)).await;

    println!("{}", surface.to_html(config.render));
    let script = renderer.script();
    if !script.is_empty() {
        println!("{script}");
    }

    let mut failed = 0usize;
    for (id, outcome) in &outcomes {
        if let HydrationOutcome::Failed(err) = outcome {
            failed += 1;
            let url = surface.slot(id).map_or("", |slot| slot.source_url());
            eprintln!("chart {id} ({url}) failed: {err}");
        }
    }
    if failed > 0 {
        eprintln!("{failed} of {} chart(s) failed to load", outcomes.len());
    }
    info!(charts = outcomes.len(), failed, "hydration finished");

    Ok(())
}
