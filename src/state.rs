use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;

use airwatch::data::analysis::{self, Analysis, AnalysisError, AnalysisRequest};
use airwatch::data::filter::{self, FilterCriteria, FilteredView, filtered_indices};
use airwatch::data::model::{Dataset, Pollutant};
use airwatch::data::smoothing::{SmoothingMethod, Window};
use airwatch::data::threshold::ThresholdTable;

use crate::color::StationColors;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The last analysis the user triggered, frozen until the next click.
pub struct ActiveAnalysis {
    pub request: AnalysisRequest,
    pub outcome: Result<Analysis, AnalysisError>,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset; replaced wholesale, never edited.
    pub dataset: Dataset,

    /// Where the dataset came from.
    pub source: PathBuf,

    pub thresholds: ThresholdTable,

    // -- widget state (not yet applied) --
    pub selected_stations: BTreeSet<String>,
    pub selected_pollutants: BTreeSet<Pollutant>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub method: SmoothingMethod,
    pub window: Window,

    /// Rows matching the widget state right now (live preview count).
    pub preview_count: usize,

    /// Snapshot produced by the Analyze button.
    pub active: Option<ActiveAnalysis>,

    /// What the Export button writes: the analysed view, or everything
    /// before the first analysis.
    pub export_view: FilteredView,

    /// Which pollutant tab is open in the trend section.
    pub trend_tab: usize,

    pub colors: StationColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(dataset: Dataset, source: PathBuf, method: SmoothingMethod, window: Window) -> Self {
        let criteria = FilterCriteria::initial(&dataset);
        Self {
            colors: StationColors::new(&dataset.stations),
            export_view: FilteredView::everything(&dataset),
            dataset,
            source,
            thresholds: ThresholdTable::default(),
            selected_stations: BTreeSet::new(),
            selected_pollutants: BTreeSet::new(),
            start: criteria.start,
            end: criteria.end,
            method,
            window,
            preview_count: 0,
            active: None,
            trend_tab: 0,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset; every derived value is dropped.
    pub fn set_dataset(&mut self, dataset: Dataset, source: PathBuf) {
        *self = Self::new(dataset, source, self.method, self.window);
    }

    /// Current widget state as filter criteria.
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            stations: self.selected_stations.clone(),
            start: self.start,
            end: self.end,
        }
    }

    /// Immutable snapshot of everything the pipeline needs.
    pub fn request(&self) -> AnalysisRequest {
        AnalysisRequest {
            criteria: self.criteria(),
            pollutants: self.selected_pollutants.iter().copied().collect(),
            method: self.method,
            window: self.window,
        }
    }

    /// Recompute the preview count after a widget change.
    pub fn refilter(&mut self) {
        self.preview_count = filtered_indices(&self.dataset, &self.criteria()).len();
    }

    /// Analyze button: snapshot the widgets and run the pipeline once.
    pub fn analyze(&mut self) {
        let request = self.request();
        let outcome = analysis::run(&self.dataset, &request, &self.thresholds);

        self.export_view = match &outcome {
            Ok(a) => a.view.clone(),
            Err(_) => filter::apply(&self.dataset, &request.criteria),
        };
        match &outcome {
            Ok(a) => log::info!(
                "Analysis over {} rows, {} pollutant(s), {} {}",
                a.view.len(),
                request.pollutants.len(),
                request.method,
                request.window.get()
            ),
            Err(e) => log::info!("Analysis skipped: {e}"),
        }

        self.trend_tab = 0;
        self.active = Some(ActiveAnalysis { request, outcome });
    }

    /// Toggle a station in the multi-select.
    pub fn toggle_station(&mut self, station: &str) {
        if !self.selected_stations.remove(station) {
            self.selected_stations.insert(station.to_string());
        }
        self.refilter();
    }

    pub fn toggle_pollutant(&mut self, pollutant: Pollutant) {
        if !self.selected_pollutants.remove(&pollutant) {
            self.selected_pollutants.insert(pollutant);
        }
    }

    /// Select all stations.
    pub fn select_all_stations(&mut self) {
        self.selected_stations = self.dataset.stations.iter().cloned().collect();
        self.refilter();
    }

    /// Deselect all stations.
    pub fn select_no_stations(&mut self) {
        self.selected_stations.clear();
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use airwatch::data::model::Observation;

    use super::*;

    fn state() -> AppState {
        let dt = |d| {
            NaiveDate::from_ymd_opt(2020, 1, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let ds = Dataset::from_observations(vec![
            Observation::new("A", dt(1)).with(Pollutant::PM25, 10.0),
            Observation::new("B", dt(2)).with(Pollutant::PM25, 20.0),
        ]);
        AppState::new(ds, PathBuf::from("mem.csv"), SmoothingMethod::Sma, Window::default())
    }

    #[test]
    fn export_defaults_to_everything() {
        let s = state();
        assert_eq!(s.export_view.len(), 2);
        assert!(s.active.is_none());
        assert_eq!(s.preview_count, 0);
    }

    #[test]
    fn analyze_snapshots_widgets() {
        let mut s = state();
        s.toggle_station("A");
        assert_eq!(s.preview_count, 1);
        s.toggle_pollutant(Pollutant::PM25);
        s.analyze();

        // Later widget edits do not touch the active snapshot.
        s.toggle_station("B");
        let active = s.active.as_ref().unwrap();
        assert_eq!(active.request.criteria.stations.len(), 1);
        assert_eq!(active.outcome.as_ref().unwrap().view.len(), 1);
        assert_eq!(s.export_view.len(), 1);
    }

    #[test]
    fn analyze_with_nothing_selected() {
        let mut s = state();
        s.analyze();
        let active = s.active.as_ref().unwrap();
        assert_eq!(active.outcome, Err(AnalysisError::NothingSelected));
        assert!(s.export_view.is_empty());
    }
}
