use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{Dataset, Observation};

// ---------------------------------------------------------------------------
// Filter criteria: selected stations and an inclusive date interval
// ---------------------------------------------------------------------------

/// Station selection plus an inclusive `[start, end]` calendar interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub stations: BTreeSet<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FilterCriteria {
    pub fn new(
        stations: impl IntoIterator<Item = impl Into<String>>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            stations: stations.into_iter().map(Into::into).collect(),
            start,
            end,
        }
    }

    /// Nothing selected, covering the dataset's full date range. Mirrors the
    /// initial widget state: empty station list, date pickers at min/max.
    pub fn initial(dataset: &Dataset) -> Self {
        let (start, end) = dataset
            .date_bounds()
            .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        Self {
            stations: BTreeSet::new(),
            start,
            end,
        }
    }

    /// Whether a single observation passes.
    ///
    /// An inverted interval (`start > end`) matches nothing.
    pub fn matches(&self, obs: &Observation) -> bool {
        let date = obs.date();
        self.stations.contains(&obs.station) && self.start <= date && date <= self.end
    }
}

/// Return indices of observations passing the criteria, in dataset order.
pub fn filtered_indices(dataset: &Dataset, criteria: &FilterCriteria) -> Vec<usize> {
    dataset
        .observations
        .iter()
        .enumerate()
        .filter(|(_, obs)| criteria.matches(obs))
        .map(|(i, _)| i)
        .collect()
}

/// A fresh subsequence of the dataset matching some criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
    pub rows: Vec<Observation>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows belonging to one station, order preserved.
    pub fn station_rows<'a>(&'a self, station: &'a str) -> impl Iterator<Item = &'a Observation> {
        self.rows.iter().filter(move |o| o.station == station)
    }

    /// The whole dataset as a view (what the export holds before any analysis).
    pub fn everything(dataset: &Dataset) -> Self {
        Self {
            rows: dataset.observations.clone(),
        }
    }
}

/// Stable filter: copy out every observation that passes.
pub fn apply(dataset: &Dataset, criteria: &FilterCriteria) -> FilteredView {
    FilteredView {
        rows: filtered_indices(dataset, criteria)
            .into_iter()
            .map(|i| dataset.observations[i].clone())
            .collect(),
    }
}
