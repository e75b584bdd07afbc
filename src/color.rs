use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize, saturation: f32, lightness: f32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, saturation, lightness);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Station colours: raw series and their smoothed overlay
// ---------------------------------------------------------------------------

/// Maps each station to a series colour and a paler companion for its
/// moving-average line.
#[derive(Debug, Clone)]
pub struct StationColors {
    raw: BTreeMap<String, Color32>,
    smoothed: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl StationColors {
    pub fn new(stations: &[String]) -> Self {
        let raw = generate_palette(stations.len(), 0.75, 0.55);
        // Offset by half a step so the overlay never matches its own series.
        let mut smoothed = generate_palette(stations.len() * 2, 0.45, 0.7);
        smoothed = smoothed.into_iter().skip(1).step_by(2).collect();

        StationColors {
            raw: stations.iter().cloned().zip(raw).collect(),
            smoothed: stations.iter().cloned().zip(smoothed).collect(),
            default_color: Color32::GRAY,
        }
    }

    pub fn raw(&self, station: &str) -> Color32 {
        self.raw.get(station).copied().unwrap_or(self.default_color)
    }

    pub fn smoothed(&self, station: &str) -> Color32 {
        self.smoothed
            .get(station)
            .copied()
            .unwrap_or(self.default_color)
    }
}

/// Fixed colour per pollutant for the grouped bar chart.
pub fn pollutant_palette() -> Vec<Color32> {
    generate_palette(6, 0.65, 0.5)
}

// ---------------------------------------------------------------------------
// Diverging scale for the correlation heatmap
// ---------------------------------------------------------------------------

/// Blue at -1, white at 0, red at +1. `None` (undefined) is grey.
pub fn diverging(r: Option<f64>) -> Color32 {
    let Some(r) = r else {
        return Color32::from_gray(120);
    };
    let white = Srgb::new(0.97f32, 0.97, 0.97).into_linear();
    let red = Srgb::new(0.70f32, 0.09, 0.17).into_linear();
    let blue = Srgb::new(0.13f32, 0.40, 0.67).into_linear();

    let t = r.clamp(-1.0, 1.0) as f32;
    let end = if t >= 0.0 { red } else { blue };
    to_color32(Srgb::from_linear(white.mix(end, t.abs())))
}
