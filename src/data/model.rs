use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Pollutant – the fixed set of measured species
// ---------------------------------------------------------------------------

/// A measured pollutant. The variant names double as CSV column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pollutant {
    PM25,
    PM10,
    SO2,
    NO2,
    CO,
    O3,
}

impl Pollutant {
    /// All pollutants in column order.
    pub const ALL: [Pollutant; 6] = [
        Pollutant::PM25,
        Pollutant::PM10,
        Pollutant::SO2,
        Pollutant::NO2,
        Pollutant::CO,
        Pollutant::O3,
    ];

    /// Column name as it appears in the input file.
    pub fn column(self) -> &'static str {
        match self {
            Pollutant::PM25 => "PM25",
            Pollutant::PM10 => "PM10",
            Pollutant::SO2 => "SO2",
            Pollutant::NO2 => "NO2",
            Pollutant::CO => "CO",
            Pollutant::O3 => "O3",
        }
    }

    /// Position inside [`Observation::values`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown pollutant '{0}'")]
pub struct UnknownPollutant(pub String);

impl FromStr for Pollutant {
    type Err = UnknownPollutant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pollutant::ALL
            .into_iter()
            .find(|p| p.column().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPollutant(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Observation – one row of the input table
// ---------------------------------------------------------------------------

/// One measurement row: a station at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub station: String,
    pub datetime: NaiveDateTime,
    /// One cell per pollutant, indexed by [`Pollutant::index`]. `None` = missing.
    pub values: [Option<f64>; 6],
}

impl Observation {
    pub fn new(station: impl Into<String>, datetime: NaiveDateTime) -> Self {
        Self {
            station: station.into(),
            datetime,
            values: [None; 6],
        }
    }

    /// Builder-style setter, mostly handy in tests and the sample generator.
    pub fn with(mut self, pollutant: Pollutant, value: f64) -> Self {
        self.values[pollutant.index()] = Some(value);
        self
    }

    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        self.values[pollutant.index()]
    }

    /// Calendar date, ignoring the time of day.
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// All observations in file order.
    pub observations: Vec<Observation>,
    /// Station names in order of first appearance.
    pub stations: Vec<String>,
}

impl Dataset {
    /// Build the station enumeration from the loaded rows.
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let mut stations: Vec<String> = Vec::new();
        for obs in &observations {
            if !stations.iter().any(|s| s == &obs.station) {
                stations.push(obs.station.clone());
            }
        }
        Dataset {
            observations,
            stations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// First and last calendar date present, or `None` for an empty dataset.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.observations.iter().map(|o| o.datetime).min()?;
        let max = self.observations.iter().map(|o| o.datetime).max()?;
        Some((min.date(), max.date()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn pollutant_parses_column_names() {
        assert_eq!("PM25".parse::<Pollutant>().unwrap(), Pollutant::PM25);
        assert_eq!("o3".parse::<Pollutant>().unwrap(), Pollutant::O3);
        assert!("PM1".parse::<Pollutant>().is_err());
    }

    #[test]
    fn pollutant_index_matches_column_order() {
        for (i, p) in Pollutant::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }

    #[test]
    fn stations_keep_first_appearance_order() {
        let ds = Dataset::from_observations(vec![
            Observation::new("B", at(1)),
            Observation::new("A", at(1)),
            Observation::new("B", at(2)),
        ]);
        assert_eq!(ds.stations, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn date_bounds_span_all_rows() {
        let ds = Dataset::from_observations(vec![
            Observation::new("A", at(3)),
            Observation::new("A", at(1)),
        ]);
        let (lo, hi) = ds.date_bounds().unwrap();
        assert_eq!(lo, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(hi, NaiveDate::from_ymd_opt(2020, 1, 3).unwrap());
        assert!(Dataset::default().date_bounds().is_none());
    }
}
