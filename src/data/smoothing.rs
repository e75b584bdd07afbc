use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmoothingError {
    #[error("unknown smoothing method '{0}' (expected EMA or SMA)")]
    UnknownMethod(String),
    #[error("smoothing window must be at least 1")]
    ZeroWindow,
    #[error("invalid smoothing window '{0}'")]
    InvalidWindow(String),
}

// ---------------------------------------------------------------------------
// Method and window
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingMethod {
    /// Exponential moving average, `alpha = 2 / (window + 1)`, no bias correction.
    Ema,
    /// Trailing simple moving average over a full window.
    #[default]
    Sma,
}

impl SmoothingMethod {
    pub const ALL: [SmoothingMethod; 2] = [SmoothingMethod::Ema, SmoothingMethod::Sma];

    pub fn label(self) -> &'static str {
        match self {
            SmoothingMethod::Ema => "EMA",
            SmoothingMethod::Sma => "SMA",
        }
    }
}

impl fmt::Display for SmoothingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SmoothingMethod {
    type Err = SmoothingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EMA" => Ok(SmoothingMethod::Ema),
            "SMA" => Ok(SmoothingMethod::Sma),
            _ => Err(SmoothingError::UnknownMethod(s.to_string())),
        }
    }
}

/// Smoothing window length, always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Window(usize);

impl Window {
    /// Upper bound offered by the window slider.
    pub const MAX: usize = 180;

    pub fn new(len: usize) -> Result<Self, SmoothingError> {
        if len == 0 {
            Err(SmoothingError::ZeroWindow)
        } else {
            Ok(Window(len))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Window {
    fn default() -> Self {
        Window(90)
    }
}

impl FromStr for Window {
    type Err = SmoothingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: usize = s
            .trim()
            .parse()
            .map_err(|_| SmoothingError::InvalidWindow(s.to_string()))?;
        Window::new(n)
    }
}

// ---------------------------------------------------------------------------
// Smoothing
// ---------------------------------------------------------------------------

/// Smooth a series. The output has the same length as the input.
pub fn smooth(series: &[Option<f64>], method: SmoothingMethod, window: Window) -> Vec<Option<f64>> {
    match method {
        SmoothingMethod::Ema => ema(series, window),
        SmoothingMethod::Sma => sma(series, window),
    }
}

/// `y[0] = x[0]`, `y[i] = alpha * x[i] + (1 - alpha) * y[i-1]`.
///
/// A missing input yields a missing output; the recurrence picks up again from
/// the last defined output at the next defined input.
pub fn ema(series: &[Option<f64>], window: Window) -> Vec<Option<f64>> {
    let alpha = 2.0 / (window.get() as f64 + 1.0);
    let mut prev: Option<f64> = None;
    series
        .iter()
        .map(|x| {
            let x = (*x)?;
            let y = match prev {
                Some(p) => alpha * x + (1.0 - alpha) * p,
                None => x,
            };
            prev = Some(y);
            Some(y)
        })
        .collect()
}

/// Mean of `x[i-window+1 ..= i]`. Missing for the first `window - 1` points
/// and wherever the trailing window contains a missing value.
pub fn sma(series: &[Option<f64>], window: Window) -> Vec<Option<f64>> {
    let w = window.get();
    (0..series.len())
        .map(|i| {
            if i + 1 < w {
                return None;
            }
            let slice = &series[i + 1 - w..=i];
            let sum = slice.iter().copied().sum::<Option<f64>>()?;
            Some(sum / w as f64)
        })
        .collect()
}
