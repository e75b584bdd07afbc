use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

use super::model::{Observation, Pollutant};

/// Default file name offered by the download control.
pub const DEFAULT_EXPORT_NAME: &str = "air_quality_data.csv";

/// One exported row; field order is the column order.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    station: &'a str,
    datetime: String,
    #[serde(rename = "PM25")]
    pm25: Option<f64>,
    #[serde(rename = "PM10")]
    pm10: Option<f64>,
    #[serde(rename = "SO2")]
    so2: Option<f64>,
    #[serde(rename = "NO2")]
    no2: Option<f64>,
    #[serde(rename = "CO")]
    co: Option<f64>,
    #[serde(rename = "O3")]
    o3: Option<f64>,
}

impl<'a> From<&'a Observation> for CsvRow<'a> {
    fn from(obs: &'a Observation) -> Self {
        CsvRow {
            station: &obs.station,
            datetime: format_datetime(&obs.datetime),
            pm25: obs.get(Pollutant::PM25),
            pm10: obs.get(Pollutant::PM10),
            so2: obs.get(Pollutant::SO2),
            no2: obs.get(Pollutant::NO2),
            co: obs.get(Pollutant::CO),
            o3: obs.get(Pollutant::O3),
        }
    }
}

/// Write rows as CSV: header row, no index column, missing cells left empty.
pub fn write_csv<W: Write>(rows: &[Observation], sink: W) -> Result<()> {
    // Header is written by hand so an empty view still gets one.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(sink);

    let mut header = vec!["station", "datetime"];
    header.extend(Pollutant::ALL.iter().map(|p| p.column()));
    writer.write_record(&header).context("writing CSV header")?;

    for (i, obs) in rows.iter().enumerate() {
        writer
            .serialize(CsvRow::from(obs))
            .with_context(|| format!("writing CSV row {}", i + 1))?;
    }

    writer.flush().context("flushing CSV output")?;
    Ok(())
}

/// Write rows to `path`, replacing any existing file.
pub fn export_to_path(rows: &[Observation], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(rows, std::io::BufWriter::new(file))?;
    log::info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}
