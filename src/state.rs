use std::collections::BTreeSet;
use std::sync::Arc;

use crate::charts::{build_charts, ChartSpec};
use crate::color::ColorMap;
use crate::data::filter::{filtered_indices, Facet, FilterSelection, FilteredView};
use crate::data::model::Dataset;
use crate::metrics::MetricsSnapshot;
use crate::narrative::worker::NarrativeWorker;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
///
/// Everything below `selection` is derived and rebuilt by [`refresh`]
/// whenever the selection changes.
///
/// [`refresh`]: AppState::refresh
pub struct AppState {
    /// Loaded once at startup, shared read-only.
    pub dataset: Arc<Dataset>,

    /// Allowed city / gender values.
    pub selection: FilterSelection,

    /// Indices of records passing the current selection.
    pub visible_indices: Vec<usize>,

    pub snapshot: MetricsSnapshot,

    pub charts: Vec<ChartSpec>,

    /// Colours for product categories.
    pub category_colors: ColorMap,

    /// Colours for payment methods.
    pub payment_colors: ColorMap,

    pub narrative: NarrativeWorker,
}

impl AppState {
    /// Start with every observed value selected.
    pub fn new(dataset: Arc<Dataset>, narrative: NarrativeWorker) -> Self {
        let categories: BTreeSet<&str> = dataset
            .records
            .iter()
            .map(|r| r.product_category.as_str())
            .collect();
        let methods: BTreeSet<&str> = dataset
            .records
            .iter()
            .map(|r| r.payment_method.as_str())
            .collect();
        let category_colors = ColorMap::new(categories);
        let payment_colors = ColorMap::new(methods);

        let mut state = AppState {
            selection: FilterSelection::all(&dataset),
            dataset,
            visible_indices: Vec::new(),
            snapshot: MetricsSnapshot::default(),
            charts: Vec::new(),
            category_colors,
            payment_colors,
            narrative,
        };
        state.refresh();
        state
    }

    /// Recompute view → metrics → charts and ask for a fresh narrative.
    pub fn refresh(&mut self) {
        self.visible_indices = filtered_indices(&self.dataset, &self.selection);
        let view = FilteredView::new(&self.dataset, &self.visible_indices);
        self.snapshot = MetricsSnapshot::compute(&view);
        self.charts = build_charts(&view, &self.snapshot);
        log::debug!(
            "selection matches {} of {} records",
            self.visible_indices.len(),
            self.dataset.len()
        );
        self.narrative.request(&self.snapshot);
    }

    /// Toggle a single facet value.
    pub fn toggle(&mut self, facet: Facet, value: &str) {
        self.selection.toggle(facet, value);
        self.refresh();
    }

    /// Select all values of a facet.
    pub fn select_all(&mut self, facet: Facet) {
        self.selection.select_all(facet, &self.dataset);
        self.refresh();
    }

    /// Deselect all values of a facet.
    pub fn select_none(&mut self, facet: Facet) {
        self.selection.select_none(facet);
        self.refresh();
    }

    pub fn retry_narrative(&mut self) {
        self.narrative.retry(&self.snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::three_rows;
    use crate::narrative::stubs::Fixed;
    use crate::narrative::worker::NarrativeStatus;
    use crate::narrative::Summarizer;

    fn state_with(stub: Arc<Fixed>) -> AppState {
        let worker = NarrativeWorker::new(Arc::new(Summarizer::new(stub)));
        AppState::new(Arc::new(three_rows()), worker)
    }

    #[test]
    fn starts_with_everything_visible() {
        let state = state_with(Arc::new(Fixed::ok("ok")));
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.snapshot.total_sales, 350.0);
        assert_eq!(state.charts.len(), 4);
        assert_eq!(state.narrative.status(), &NarrativeStatus::Pending);
    }

    #[test]
    fn toggling_recomputes_metrics() {
        let mut state = state_with(Arc::new(Fixed::ok("ok")));
        state.toggle(Facet::City, "Mumbai");
        assert_eq!(state.visible_indices, vec![0, 2]);
        assert_eq!(state.snapshot.total_sales, 150.0);

        state.select_none(Facet::Gender);
        assert!(state.visible_indices.is_empty());
        assert_eq!(state.snapshot.avg_browsing_time, None);
        assert_eq!(state.narrative.status(), &NarrativeStatus::NoData);

        state.select_all(Facet::Gender);
        assert_eq!(state.visible_indices, vec![0, 2]);
    }
}
