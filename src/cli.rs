//! Command-line arguments for the dashboard.

use std::path::PathBuf;

use airwatch::data::smoothing::{SmoothingError, SmoothingMethod, Window};
use clap::{Parser, ValueEnum};

/// Smoothing method as accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    /// Exponential moving average
    Ema,
    /// Simple moving average
    Sma,
}

impl From<MethodArg> for SmoothingMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Ema => SmoothingMethod::Ema,
            MethodArg::Sma => SmoothingMethod::Sma,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "airwatch")]
#[command(version)]
#[command(about = "Interactive air-quality dashboard for monitoring-station data", long_about = None)]
pub struct Cli {
    /// Cleaned station data (.csv or records-oriented .json)
    #[arg(value_name = "DATA", default_value = "data/all_stations_cleaned.csv")]
    pub data: PathBuf,

    /// Initial smoothing method
    #[arg(short, long, value_enum, default_value = "sma", ignore_case = true)]
    pub method: MethodArg,

    /// Initial smoothing window (1-180)
    #[arg(short, long, default_value = "90", value_parser = parse_window)]
    pub window: Window,
}

fn parse_window(s: &str) -> Result<Window, String> {
    let window: Window = s.parse().map_err(|e: SmoothingError| e.to_string())?;
    if window.get() > Window::MAX {
        return Err(format!("window must be at most {}", Window::MAX));
    }
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["airwatch"]);
        assert_eq!(cli.data, PathBuf::from("data/all_stations_cleaned.csv"));
        assert_eq!(SmoothingMethod::from(cli.method), SmoothingMethod::Sma);
        assert_eq!(cli.window.get(), 90);
    }

    #[test]
    fn explicit_values() {
        let cli = Cli::parse_from(["airwatch", "x.csv", "--method", "EMA", "-w", "7"]);
        assert_eq!(cli.data, PathBuf::from("x.csv"));
        assert_eq!(SmoothingMethod::from(cli.method), SmoothingMethod::Ema);
        assert_eq!(cli.window.get(), 7);
    }

    #[test]
    fn window_out_of_range() {
        assert!(Cli::try_parse_from(["airwatch", "-w", "0"]).is_err());
        assert!(Cli::try_parse_from(["airwatch", "-w", "181"]).is_err());
    }

    #[test]
    fn window_error_message() {
        assert_eq!(
            parse_window("ten").unwrap_err(),
            "invalid smoothing window 'ten'"
        );
        assert_eq!(parse_window("0").unwrap_err(), "smoothing window must be at least 1");
    }
}
