use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};

use airwatch::data::export::export_to_path;
use airwatch::data::model::{Observation, Pollutant};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Typical daily level per pollutant, in column order.
const BASE_LEVELS: [f64; 6] = [80.0, 105.0, 15.0, 50.0, 1200.0, 58.0];

/// Fraction of cells left empty to exercise missing-value handling.
const MISSING_RATE: f64 = 0.02;

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/all_stations_cleaned.csv"));
    if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut rng = SimpleRng::new(42);

    // (station, pollution multiplier)
    let stations = [
        ("Aotizhongxin", 1.10),
        ("Changping", 0.85),
        ("Dingling", 0.70),
        ("Dongsi", 1.25),
    ];
    let start = NaiveDate::from_ymd_opt(2016, 1, 1).context("start date")?;
    let days = 730;

    let mut rows = Vec::with_capacity(stations.len() * days);
    for offset in 0..days {
        let date = start + Duration::days(offset as i64);
        let datetime = date.and_hms_opt(0, 0, 0).context("midnight")?;
        // Winter heating season pushes particulates up, summer pushes ozone up.
        let season = (2.0 * std::f64::consts::PI * date.ordinal() as f64 / 365.0).cos();

        for &(station, factor) in &stations {
            let mut obs = Observation::new(station, datetime);
            for pollutant in Pollutant::ALL {
                if rng.next_f64() < MISSING_RATE {
                    continue;
                }
                let seasonal = match pollutant {
                    Pollutant::O3 => 1.0 - 0.5 * season,
                    _ => 1.0 + 0.6 * season,
                };
                let base = BASE_LEVELS[pollutant.index()] * factor * seasonal;
                let value = rng.gauss(base, base * 0.35).max(1.0);
                obs.values[pollutant.index()] = Some((value * 10.0).round() / 10.0);
            }
            rows.push(obs);
        }
    }

    export_to_path(&rows, &output_path)?;
    println!(
        "Wrote {} rows ({} stations × {days} days) to {}",
        rows.len(),
        stations.len(),
        output_path.display()
    );
    Ok(())
}
