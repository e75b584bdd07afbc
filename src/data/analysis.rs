//! The filter → smoothing / aggregation / threshold pipeline.
//!
//! Every run starts from an [`AnalysisRequest`] snapshot and the immutable
//! [`Dataset`]; nothing is read from ambient UI state.

use chrono::NaiveDateTime;
use thiserror::Error;

use super::filter::{self, FilterCriteria, FilteredView};
use super::model::{Dataset, Pollutant};
use super::smoothing::{self, SmoothingMethod, Window};
use super::stats::{self, ColumnSummary, CorrelationMatrix, StatsError};
use super::threshold::{self, ThresholdStatus, ThresholdTable};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("no data selected: choose at least one station and one pollutant")]
    NothingSelected,
}

/// Everything the user chose at the moment they pressed Analyze.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub criteria: FilterCriteria,
    pub pollutants: Vec<Pollutant>,
    pub method: SmoothingMethod,
    pub window: Window,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Raw and smoothed series of one station for one pollutant.
#[derive(Debug, Clone, PartialEq)]
pub struct StationTrend {
    pub station: String,
    pub datetimes: Vec<NaiveDateTime>,
    pub raw: Vec<Option<f64>>,
    pub smoothed: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollutantTrend {
    pub pollutant: Pollutant,
    pub threshold: Option<f64>,
    pub stations: Vec<StationTrend>,
}

/// Per-station mean of each selected pollutant, for the comparison chart.
#[derive(Debug, Clone, PartialEq)]
pub struct StationComparison {
    pub station: String,
    pub means: Vec<(Pollutant, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub view: FilteredView,
    pub trends: Vec<PollutantTrend>,
    pub comparison: Vec<StationComparison>,
    pub summary: Vec<ColumnSummary>,
    pub correlation: Result<CorrelationMatrix, StatsError>,
    pub notifications: Vec<(Pollutant, ThresholdStatus)>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full pipeline for one request.
pub fn run(
    dataset: &Dataset,
    request: &AnalysisRequest,
    thresholds: &ThresholdTable,
) -> Result<Analysis, AnalysisError> {
    if request.criteria.stations.is_empty() || request.pollutants.is_empty() {
        return Err(AnalysisError::NothingSelected);
    }

    let view = filter::apply(dataset, &request.criteria);
    log::debug!(
        "analysis: {} of {} rows pass {} station(s), {}..={}",
        view.len(),
        dataset.len(),
        request.criteria.stations.len(),
        request.criteria.start,
        request.criteria.end
    );

    // Selected stations in dataset order.
    let stations: Vec<&str> = dataset
        .stations
        .iter()
        .filter(|s| request.criteria.stations.contains(*s))
        .map(String::as_str)
        .collect();

    let trends = request
        .pollutants
        .iter()
        .map(|&p| PollutantTrend {
            pollutant: p,
            threshold: thresholds.get(p),
            stations: stations
                .iter()
                .map(|s| station_trend(&view, s, p, request.method, request.window))
                .collect(),
        })
        .collect();

    let comparison = stations
        .iter()
        .map(|s| StationComparison {
            station: s.to_string(),
            means: request
                .pollutants
                .iter()
                .map(|&p| {
                    let vals: Vec<f64> = view.station_rows(s).filter_map(|o| o.get(p)).collect();
                    (p, stats::mean(&vals))
                })
                .collect(),
        })
        .collect();

    let summary = stats::describe(&view, &request.pollutants);
    let correlation = stats::correlation(&view, &request.pollutants);
    let notifications: Vec<(Pollutant, ThresholdStatus)> = request
        .pollutants
        .iter()
        .map(|&p| (p, threshold::check(&view, p, thresholds)))
        .collect();

    let breaches = notifications.iter().filter(|(_, s)| s.is_breached()).count();
    log::debug!("analysis: {breaches} threshold breach(es)");

    Ok(Analysis {
        view,
        trends,
        comparison,
        summary,
        correlation,
        notifications,
    })
}

fn station_trend(
    view: &FilteredView,
    station: &str,
    pollutant: Pollutant,
    method: SmoothingMethod,
    window: Window,
) -> StationTrend {
    let (datetimes, raw): (Vec<NaiveDateTime>, Vec<Option<f64>>) = view
        .station_rows(station)
        .map(|o| (o.datetime, o.get(pollutant)))
        .unzip();
    let smoothed = smoothing::smooth(&raw, method, window);
    StationTrend {
        station: station.to_string(),
        datetimes,
        raw,
        smoothed,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::Observation;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn dataset() -> Dataset {
        let mut rows = Vec::new();
        for (d, (a, b)) in [(10.0, 15.0), (20.0, 25.0), (300.0, 35.0)].into_iter().enumerate() {
            let dt = day(d as u32 + 1).and_hms_opt(0, 0, 0).unwrap();
            rows.push(
                Observation::new("A", dt)
                    .with(Pollutant::PM25, a)
                    .with(Pollutant::NO2, a / 2.0),
            );
            rows.push(
                Observation::new("B", dt)
                    .with(Pollutant::PM25, b)
                    .with(Pollutant::NO2, b * 2.0),
            );
        }
        Dataset::from_observations(rows)
    }

    fn request(stations: &[&str], pollutants: &[Pollutant]) -> AnalysisRequest {
        AnalysisRequest {
            criteria: FilterCriteria::new(stations.iter().copied(), day(1), day(3)),
            pollutants: pollutants.to_vec(),
            method: SmoothingMethod::Sma,
            window: Window::new(2).unwrap(),
        }
    }

    #[test]
    fn empty_selection_is_reported() {
        let ds = dataset();
        let t = ThresholdTable::default();
        assert_eq!(
            run(&ds, &request(&[], &[Pollutant::PM25]), &t),
            Err(AnalysisError::NothingSelected)
        );
        assert_eq!(
            run(&ds, &request(&["A"], &[]), &t),
            Err(AnalysisError::NothingSelected)
        );
    }

    #[test]
    fn trends_are_per_station_in_dataset_order() {
        let ds = dataset();
        let a = run(&ds, &request(&["B", "A"], &[Pollutant::PM25]), &ThresholdTable::default())
            .unwrap();
        let trend = &a.trends[0];
        assert_eq!(trend.threshold, Some(150.4));
        let names: Vec<_> = trend.stations.iter().map(|s| s.station.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(
            trend.stations[0].raw,
            vec![Some(10.0), Some(20.0), Some(300.0)]
        );
        assert_eq!(
            trend.stations[0].smoothed,
            vec![None, Some(15.0), Some(160.0)]
        );
    }

    #[test]
    fn notifications_and_correlation() {
        let ds = dataset();
        let a = run(
            &ds,
            &request(&["A"], &[Pollutant::PM25, Pollutant::NO2]),
            &ThresholdTable::default(),
        )
        .unwrap();
        assert!(a.notifications[0].1.is_breached());
        assert!(!a.notifications[1].1.is_breached());
        let corr = a.correlation.unwrap();
        assert!((corr.get(0, 1).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn single_pollutant_has_no_correlation() {
        let ds = dataset();
        let a = run(&ds, &request(&["A", "B"], &[Pollutant::NO2]), &ThresholdTable::default())
            .unwrap();
        assert_eq!(a.correlation, Err(StatsError::TooFewColumns(1)));
        assert_eq!(a.summary.len(), 1);
        assert_eq!(a.summary[0].count, 6);
    }

    #[test]
    fn comparison_means() {
        let ds = dataset();
        let a = run(&ds, &request(&["A", "B"], &[Pollutant::PM25]), &ThresholdTable::default())
            .unwrap();
        assert_eq!(a.comparison.len(), 2);
        assert_eq!(a.comparison[1].station, "B");
        assert_eq!(a.comparison[1].means, vec![(Pollutant::PM25, Some(25.0))]);
    }
}
