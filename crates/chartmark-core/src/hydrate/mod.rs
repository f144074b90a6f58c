//! Chart hydration.
//!
//! Turns the chart placeholders of an attached [`Surface`] into drawn
//! charts by fetching each chart's data document and handing it to a
//! [`ChartRenderer`].
//!
//! - Idempotent: a placeholder is claimed (`Pending` -> `Loading`) before
//!   its task is spawned, so overlapping passes never fetch it twice.
//! - Concurrent: one task per chart, no ordering between them.
//! - Isolated: a failure is recorded on its own slot only, and a failed
//!   slot is never retried.
//! - Detach-safe: tasks hold weak slot references and do nothing once the
//!   surface is gone.

mod error;
mod renderer;
mod surface;

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::{Context, Result};
use chartmark_types::{ChartDocument, ChartId};
pub use error::{ChartError, ChartErrorKind};
use futures_util::future;
pub use renderer::{ChartRenderer, Figure, PlotlyPageRenderer, RenderOptions};
use serde_json::json;
pub use surface::{ChartSlot, ChartStatus, Surface};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::{ParseError, Url};

use self::error::classify_reqwest_error;

const USER_AGENT: &str = concat!("chartmark/", env!("CARGO_PKG_VERSION"));

/// Settings for [`ChartHydrator`].
#[derive(Debug, Clone, Default)]
pub struct HydrateOptions {
    /// Base for relative chart URLs.
    pub base_url: Option<Url>,
    /// Per-request timeout. `None` waits forever.
    pub fetch_timeout: Option<Duration>,
}

/// How one hydration task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationOutcome {
    Rendered,
    Failed(ChartError),
    /// The surface was dropped before the chart could be drawn.
    Detached,
    /// Cancelled through its handle. The slot is pending again.
    Cancelled,
}

/// Handle to one in-flight chart. Dropping it leaves the task running.
#[derive(Debug)]
pub struct HydrationHandle {
    id: ChartId,
    cancel: CancellationToken,
    join: JoinHandle<HydrationOutcome>,
}

impl HydrationHandle {
    pub fn id(&self) -> &ChartId {
        &self.id
    }

    /// Requests cancellation. Has no effect once the chart is drawn.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the task to finish.
    pub async fn join(self) -> HydrationOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => HydrationOutcome::Cancelled,
            Err(e) => HydrationOutcome::Failed(ChartError::new(
                ChartErrorKind::Task,
                format!("Hydration task failed: {e}"),
            )),
        }
    }
}

/// Waits for every handle, keeping document order.
pub async fn join_all(handles: Vec<HydrationHandle>) -> Vec<(ChartId, HydrationOutcome)> {
    future::join_all(handles.into_iter().map(|handle| async move {
        let id = handle.id.clone();
        (id, handle.join().await)
    }))
    .await
}

/// Fetches chart documents and draws them through a renderer.
#[derive(Clone)]
pub struct ChartHydrator {
    client: reqwest::Client,
    renderer: Arc<dyn ChartRenderer>,
    base_url: Option<Url>,
}

impl ChartHydrator {
    pub fn new(renderer: Arc<dyn ChartRenderer>, options: HydrateOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = options.fetch_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("build HTTP client")?;

        Ok(Self {
            client,
            renderer,
            base_url: options.base_url,
        })
    }

    /// Starts hydrating every pending chart on `surface`.
    ///
    /// Claims happen before this returns; the fetches run on spawned tasks.
    /// Charts already loading, rendered or failed are skipped, so calling
    /// this again on the same surface never repeats work. Must be called
    /// from within a tokio runtime.
    pub fn hydrate(&self, surface: &Surface) -> Vec<HydrationHandle> {
        let mut handles = Vec::new();

        for slot in surface.slots() {
            if !slot.try_claim() {
                continue;
            }

            let id = slot.id().clone();
            let cancel = CancellationToken::new();
            let task = HydrationTask {
                client: self.client.clone(),
                renderer: Arc::clone(&self.renderer),
                url: self.resolve(slot.source_url()),
                slot: Arc::downgrade(slot),
                id: id.clone(),
            };

            let token = cancel.clone();
            let join = tokio::spawn(task.run(token));
            handles.push(HydrationHandle { id, cancel, join });
        }

        debug!(
            started = handles.len(),
            charts = surface.slots().len(),
            "hydration pass"
        );
        handles
    }

    fn resolve(&self, source: &str) -> Result<Url, ChartError> {
        match Url::parse(source) {
            Ok(url) => Ok(url),
            Err(ParseError::RelativeUrlWithoutBase) => {
                let Some(base) = &self.base_url else {
                    return Err(ChartError::new(
                        ChartErrorKind::Transport,
                        format!("Relative chart URL {source} needs a base URL"),
                    ));
                };
                base.join(source).map_err(|e| {
                    ChartError::new(ChartErrorKind::Transport, format!("Invalid chart URL {source}: {e}"))
                })
            }
            Err(e) => Err(ChartError::new(
                ChartErrorKind::Transport,
                format!("Invalid chart URL {source}: {e}"),
            )),
        }
    }
}

struct HydrationTask {
    client: reqwest::Client,
    renderer: Arc<dyn ChartRenderer>,
    url: Result<Url, ChartError>,
    slot: Weak<ChartSlot>,
    id: ChartId,
}

impl HydrationTask {
    async fn run(self, cancel: CancellationToken) -> HydrationOutcome {
        let fetched = tokio::select! {
            () = cancel.cancelled() => {
                if let Some(slot) = self.slot.upgrade() {
                    slot.release();
                }
                debug!(chart = %self.id, "hydration cancelled");
                return HydrationOutcome::Cancelled;
            }
            fetched = self.fetch() => fetched,
        };

        let Some(slot) = self.slot.upgrade() else {
            debug!(chart = %self.id, "surface detached, dropping chart");
            return HydrationOutcome::Detached;
        };

        match fetched.and_then(|document| self.draw_guarded(&document)) {
            Ok(()) => {
                slot.finish(ChartStatus::Rendered);
                debug!(chart = %self.id, "chart rendered");
                HydrationOutcome::Rendered
            }
            Err(err) => {
                warn!(chart = %self.id, kind = %err.kind, "chart hydration failed: {err}");
                slot.finish(ChartStatus::Failed(err.message.clone()));
                HydrationOutcome::Failed(err)
            }
        }
    }

    async fn fetch(&self) -> Result<ChartDocument, ChartError> {
        let url = self.url.clone()?;
        debug!(chart = %self.id, %url, "fetching chart data");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChartError::http_status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        serde_json::from_slice(&body).map_err(|e| ChartError::parse(&e))
    }

    /// Draws the chart, turning a renderer panic into a task failure so
    /// the slot never stays `Loading`.
    fn draw_guarded(&self, document: &ChartDocument) -> Result<(), ChartError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.draw(document))).unwrap_or_else(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ChartError::new(
                ChartErrorKind::Task,
                format!("Renderer panicked: {reason}"),
            ))
        })
    }

    fn draw(&self, document: &ChartDocument) -> Result<(), ChartError> {
        let layout = document.autosized_layout();
        self.renderer
            .render(&self.id, &document.data, &layout, &RenderOptions::default())
            .map_err(|e| ChartError::render(&e))?;

        let width = self.renderer.measure_width(&self.id);
        if width > 0.0 {
            self.renderer
                .relayout(&self.id, &json!({ "width": width }))
                .map_err(|e| ChartError::render(&e))?;
        }
        Ok(())
    }
}
