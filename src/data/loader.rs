use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Dataset, Observation, Pollutant};

/// Data-quality problems detected while loading. These are fatal at startup.
#[derive(Debug, Error, PartialEq)]
pub enum LoadError {
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: cannot parse datetime '{value}'")]
    BadDatetime { row: usize, value: String },
    #[error("row {row}, column {column}: '{value}' is not a number")]
    BadValue {
        row: usize,
        column: Pollutant,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an air-quality dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – header row with `station`, `datetime` and pollutant columns
/// * `.json` – `[{ "station": "...", "datetime": "...", "PM25": 12.0, ... }, ...]`
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            read_csv(file)
        }
        "json" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_json(&text)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// One CSV row as read from disk. Pollutant cells stay textual so missing
/// markers (`NaN`, `NA`, ...) and bad numbers are judged by [`parse_value`].
#[derive(Debug, Deserialize)]
struct CsvRecord {
    station: String,
    datetime: String,
    #[serde(rename = "PM25", default)]
    pm25: Option<String>,
    #[serde(rename = "PM10", default)]
    pm10: Option<String>,
    #[serde(rename = "SO2", default)]
    so2: Option<String>,
    #[serde(rename = "NO2", default)]
    no2: Option<String>,
    #[serde(rename = "CO", default)]
    co: Option<String>,
    #[serde(rename = "O3", default)]
    o3: Option<String>,
}

impl CsvRecord {
    fn into_observation(self, row: usize) -> Result<Observation, LoadError> {
        let cells = [self.pm25, self.pm10, self.so2, self.no2, self.co, self.o3];
        let datetime = parse_datetime(&self.datetime, row)?;
        let mut obs = Observation::new(normalise_station(&self.station), datetime);
        for (pollutant, cell) in Pollutant::ALL.into_iter().zip(cells) {
            obs.values[pollutant.index()] = match cell {
                Some(text) => parse_value(&text, row, pollutant)?,
                None => None,
            };
        }
        Ok(obs)
    }
}

/// CSV layout: header row with column names. `station` and `datetime` are
/// required; pollutant columns that are absent are treated as all-missing.
/// Any other column is ignored.
pub fn read_csv<R: Read>(source: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(source);
    let headers = reader.headers().context("reading CSV headers")?.clone();

    for required in ["station", "datetime"] {
        if !headers.iter().any(|h| h == required) {
            return Err(LoadError::MissingColumn(required).into());
        }
    }

    let mut observations = Vec::new();

    for (row_no, result) in reader.deserialize::<CsvRecord>().enumerate() {
        let row = row_no + 1;
        let record = result.with_context(|| format!("CSV row {row}"))?;
        observations.push(record.into_observation(row)?);
    }

    Ok(Dataset::from_observations(observations))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "station": "Aotizhongxin", "datetime": "2013-03-01 00:00:00", "PM25": 4.0, "CO": null },
///   ...
/// ]
/// ```
pub fn parse_json(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut observations = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let row = i + 1;
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {row} is not a JSON object"))?;

        let station = match obj.get("station") {
            Some(JsonValue::String(s)) => normalise_station(s),
            Some(other) => normalise_station(&other.to_string()),
            None => return Err(LoadError::MissingColumn("station").into()),
        };
        let datetime = match obj.get("datetime") {
            Some(JsonValue::String(s)) => parse_datetime(s, row)?,
            Some(other) => {
                return Err(LoadError::BadDatetime {
                    row,
                    value: other.to_string(),
                }
                .into());
            }
            None => return Err(LoadError::MissingColumn("datetime").into()),
        };

        let mut obs = Observation::new(station, datetime);
        for pollutant in Pollutant::ALL {
            obs.values[pollutant.index()] = match obj.get(pollutant.column()) {
                None | Some(JsonValue::Null) => None,
                Some(JsonValue::Number(n)) => n.as_f64(),
                Some(JsonValue::String(s)) => parse_value(s, row, pollutant)?,
                Some(other) => {
                    return Err(LoadError::BadValue {
                        row,
                        column: pollutant,
                        value: other.to_string(),
                    }
                    .into());
                }
            };
        }
        observations.push(obs);
    }

    Ok(Dataset::from_observations(observations))
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Station names are compared after trimming surrounding whitespace, in
/// every input format.
fn normalise_station(raw: &str) -> String {
    raw.trim().to_string()
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 timestamp. Offsets are normalised to UTC; a bare date
/// means midnight.
pub fn parse_datetime(s: &str, row: usize) -> Result<NaiveDateTime, LoadError> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    if let Some(midnight) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight);
    }
    Err(LoadError::BadDatetime {
        row,
        value: s.to_string(),
    })
}

fn parse_value(s: &str, row: usize, column: Pollutant) -> Result<Option<f64>, LoadError> {
    let s = s.trim();
    if s.is_empty() || matches!(s, "NaN" | "nan" | "NA" | "null") {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(LoadError::BadValue {
            row,
            column,
            value: s.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
No,station,datetime,PM25,PM10,SO2,NO2,CO,O3
1,Aotizhongxin,2013-03-01 00:00:00,4,4,4,7,300,77
2,Aotizhongxin,2013-03-01 01:00:00,8,,4,7,NaN,77
3,Changping,2013-03-01T02:00:00,7,7,5,10,300,73
";

    #[test]
    fn reads_rows_and_stations() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.stations, vec!["Aotizhongxin", "Changping"]);
        assert_eq!(ds.observations[0].get(Pollutant::CO), Some(300.0));
    }

    #[test]
    fn empty_and_nan_cells_are_missing() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        let row = &ds.observations[1];
        assert_eq!(row.get(Pollutant::PM10), None);
        assert_eq!(row.get(Pollutant::CO), None);
        assert_eq!(row.get(Pollutant::PM25), Some(8.0));
    }

    #[test]
    fn absent_pollutant_column_is_all_missing() {
        let csv = "station,datetime,PM25\nA,2020-01-01,1.5\n";
        let ds = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.observations[0].get(Pollutant::PM25), Some(1.5));
        assert_eq!(ds.observations[0].get(Pollutant::O3), None);
    }

    #[test]
    fn bad_datetime_is_an_error() {
        let csv = "station,datetime,PM25\nA,yesterday,1\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LoadError>(),
            Some(&LoadError::BadDatetime {
                row: 1,
                value: "yesterday".into()
            })
        );
    }

    #[test]
    fn non_numeric_pollutant_is_an_error() {
        let csv = "station,datetime,NO2\nA,2020-01-01,high\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::BadValue { column: Pollutant::NO2, .. })
        ));
    }

    #[test]
    fn missing_station_column_is_an_error() {
        let csv = "datetime,PM25\n2020-01-01,1\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LoadError>(),
            Some(&LoadError::MissingColumn("station"))
        );
    }

    #[test]
    fn missing_datetime_column_is_an_error() {
        let csv = "station,PM25\nA,1\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LoadError>(),
            Some(&LoadError::MissingColumn("datetime"))
        );
    }

    #[test]
    fn json_station_is_trimmed() {
        let text = r#"[{"station": "  A ", "datetime": "2020-01-01"}]"#;
        let ds = parse_json(text).unwrap();
        assert_eq!(ds.stations, vec!["A"]);
        assert_eq!(ds.observations[0].station, "A");
    }

    #[test]
    fn datetime_formats() {
        let expect = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 0)
            .unwrap();
        assert_eq!(parse_datetime("2020-01-02 03:04:00", 1).unwrap(), expect);
        assert_eq!(parse_datetime("2020-01-02T03:04", 1).unwrap(), expect);
        assert_eq!(parse_datetime("2020-01-02T05:04:00+02:00", 1).unwrap(), expect);
        assert_eq!(
            parse_datetime("2020-01-02", 1).unwrap(),
            expect.date().and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn json_records() {
        let text = r#"[
            {"station": "A", "datetime": "2020-01-01 00:00:00", "PM25": 10, "CO": null},
            {"station": "B", "datetime": "2020-01-02", "PM25": "12.5"}
        ]"#;
        let ds = parse_json(text).unwrap();
        assert_eq!(ds.stations, vec!["A", "B"]);
        assert_eq!(ds.observations[0].get(Pollutant::PM25), Some(10.0));
        assert_eq!(ds.observations[0].get(Pollutant::CO), None);
        assert_eq!(ds.observations[1].get(Pollutant::PM25), Some(12.5));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(load_file(Path::new("data.xlsx")).is_err());
    }

    #[test]
    fn nonexistent_csv_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("absent.csv"));
    }
}
