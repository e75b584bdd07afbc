//! Pollutant safety limits and breach checking.

use std::collections::BTreeMap;

use super::filter::FilteredView;
use super::model::Pollutant;

// ---------------------------------------------------------------------------
// Threshold table
// ---------------------------------------------------------------------------

/// Maximum safe concentration per pollutant (µg/m³; CO is stored in the same
/// field without unit conversion).
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    limits: BTreeMap<Pollutant, f64>,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::from_pairs([
            (Pollutant::PM25, 150.4),
            (Pollutant::NO2, 200.0),
            (Pollutant::PM10, 350.0),
            (Pollutant::SO2, 180.0),
            (Pollutant::CO, 8000.0),
            (Pollutant::O3, 235.0),
        ])
    }
}

impl ThresholdTable {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Pollutant, f64)>) -> Self {
        Self {
            limits: pairs.into_iter().collect(),
        }
    }

    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        self.limits.get(&pollutant).copied()
    }
}

// ---------------------------------------------------------------------------
// Breach evaluation
// ---------------------------------------------------------------------------

/// Outcome of comparing a column's maximum against its limit.
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdStatus {
    /// The table has no entry for this pollutant.
    NoThreshold,
    /// Max is at or below the limit. `max_value` is `None` if the view holds
    /// no values for the pollutant.
    WithinLimit {
        threshold: f64,
        max_value: Option<f64>,
    },
    /// Max strictly exceeds the limit by `excess`.
    Breached {
        threshold: f64,
        max_value: f64,
        excess: f64,
    },
}

impl ThresholdStatus {
    pub fn is_breached(&self) -> bool {
        matches!(self, ThresholdStatus::Breached { .. })
    }
}

/// Compare the maximum of `pollutant` in the view against its limit.
pub fn check(view: &FilteredView, pollutant: Pollutant, thresholds: &ThresholdTable) -> ThresholdStatus {
    let Some(threshold) = thresholds.get(pollutant) else {
        return ThresholdStatus::NoThreshold;
    };

    let max_value = view
        .rows
        .iter()
        .filter_map(|o| o.get(pollutant))
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

    match max_value {
        Some(max_value) if max_value > threshold => ThresholdStatus::Breached {
            threshold,
            max_value,
            excess: max_value - threshold,
        },
        _ => ThresholdStatus::WithinLimit {
            threshold,
            max_value,
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::Observation;

    fn view(pollutant: Pollutant, values: &[f64]) -> FilteredView {
        let dt = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        FilteredView {
            rows: values
                .iter()
                .map(|&v| Observation::new("A", dt).with(pollutant, v))
                .collect(),
        }
    }

    #[test]
    fn default_table_values() {
        let t = ThresholdTable::default();
        assert_eq!(t.get(Pollutant::PM25), Some(150.4));
        assert_eq!(t.get(Pollutant::CO), Some(8000.0));
        assert!(Pollutant::ALL.iter().all(|&p| t.get(p).is_some()));
    }

    #[test]
    fn pm25_breach() {
        let v = view(Pollutant::PM25, &[10.0, 200.0, 50.0]);
        match check(&v, Pollutant::PM25, &ThresholdTable::default()) {
            ThresholdStatus::Breached {
                max_value, excess, ..
            } => {
                assert_eq!(max_value, 200.0);
                assert!((excess - 49.6).abs() < 1e-9);
            }
            other => panic!("expected breach, got {other:?}"),
        }
    }

    #[test]
    fn equal_to_limit_is_not_a_breach() {
        let v = view(Pollutant::NO2, &[200.0]);
        let status = check(&v, Pollutant::NO2, &ThresholdTable::default());
        assert_eq!(
            status,
            ThresholdStatus::WithinLimit {
                threshold: 200.0,
                max_value: Some(200.0)
            }
        );
        assert!(!status.is_breached());
    }

    #[test]
    fn missing_entry_is_distinct_from_within_limit() {
        let table = ThresholdTable::from_pairs([(Pollutant::PM25, 150.4)]);
        let v = view(Pollutant::O3, &[1000.0]);
        assert_eq!(check(&v, Pollutant::O3, &table), ThresholdStatus::NoThreshold);
    }

    #[test]
    fn no_values_reports_undefined_max() {
        let v = view(Pollutant::PM10, &[]);
        assert_eq!(
            check(&v, Pollutant::PM10, &ThresholdTable::default()),
            ThresholdStatus::WithinLimit {
                threshold: 350.0,
                max_value: None
            }
        );
    }
}
