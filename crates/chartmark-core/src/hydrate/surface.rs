//! Displayed fragments and the per-chart hydration state they carry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chartmark_types::{ChartId, ChartPlaceholder, DisplayFragment};

use crate::html::{self, ChartView, HtmlOptions};

/// Lifecycle of one chart placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartStatus {
    /// Not hydrated yet. Eligible for the next hydration pass.
    Pending,
    /// Claimed by a hydration task.
    Loading,
    /// Drawn. Terminal.
    Rendered,
    /// Gave up with a reason. Terminal; never retried.
    Failed(String),
}

impl ChartStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChartStatus::Rendered | ChartStatus::Failed(_))
    }
}

/// A chart placeholder and its hydration status.
#[derive(Debug)]
pub struct ChartSlot {
    placeholder: ChartPlaceholder,
    status: Mutex<ChartStatus>,
}

impl ChartSlot {
    fn new(placeholder: ChartPlaceholder) -> Self {
        Self {
            placeholder,
            status: Mutex::new(ChartStatus::Pending),
        }
    }

    pub fn id(&self) -> &ChartId {
        &self.placeholder.id
    }

    pub fn source_url(&self) -> &str {
        &self.placeholder.source_url
    }

    pub fn status(&self) -> ChartStatus {
        self.lock().clone()
    }

    /// Moves `Pending` to `Loading`. Returns false if the slot was not pending.
    pub(crate) fn try_claim(&self) -> bool {
        let mut status = self.lock();
        if *status == ChartStatus::Pending {
            *status = ChartStatus::Loading;
            true
        } else {
            false
        }
    }

    /// Records the final outcome of a claimed slot.
    pub(crate) fn finish(&self, outcome: ChartStatus) {
        *self.lock() = outcome;
    }

    /// Returns a claimed slot to `Pending` so a later pass can retry it.
    pub(crate) fn release(&self) {
        let mut status = self.lock();
        if *status == ChartStatus::Loading {
            *status = ChartStatus::Pending;
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChartStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A fragment attached to the display, ready for hydration.
///
/// Hydration tasks only hold weak references to the slots. Dropping the
/// surface detaches it and any task still in flight becomes a no-op.
#[derive(Debug)]
pub struct Surface {
    fragment: DisplayFragment,
    slots: Vec<Arc<ChartSlot>>,
}

impl Surface {
    pub fn attach(fragment: DisplayFragment) -> Self {
        let slots = fragment
            .charts()
            .into_iter()
            .map(|chart| Arc::new(ChartSlot::new(chart.clone())))
            .collect();
        Self { fragment, slots }
    }

    /// Chart slots in document order.
    pub fn slots(&self) -> &[Arc<ChartSlot>] {
        &self.slots
    }

    pub fn slot(&self, id: &ChartId) -> Option<&Arc<ChartSlot>> {
        self.slots.iter().find(|slot| slot.id() == id)
    }

    pub fn pending_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.status() == ChartStatus::Pending)
            .count()
    }

    /// True when no chart is pending or loading.
    pub fn is_settled(&self) -> bool {
        self.slots.iter().all(|slot| slot.status().is_terminal())
    }

    /// Renders the surface with every chart in its current state.
    pub fn to_html(&self, options: HtmlOptions) -> String {
        let statuses: HashMap<ChartId, ChartStatus> = self
            .slots
            .iter()
            .map(|slot| (slot.id().clone(), slot.status()))
            .collect();

        let view = |id: &ChartId| match statuses.get(id) {
            Some(ChartStatus::Rendered) => ChartView::Rendered,
            Some(ChartStatus::Failed(reason)) => ChartView::Failed(reason.as_str()),
            _ => ChartView::Pending,
        };

        let mut out = String::new();
        html::render_segments(self.fragment.segments(), options, &view, &mut out);
        out
    }
}
