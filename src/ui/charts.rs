use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDateTime};
use eframe::egui::{self, Align2, Color32, FontId, RichText, Sense, Ui, Vec2};
use egui_plot::{Bar, BarChart, GridMark, HLine, Legend, Line, LineStyle, Plot, PlotPoints, Points};

use airwatch::data::analysis::{Analysis, PollutantTrend};
use airwatch::data::model::Pollutant;
use airwatch::data::stats::{ColumnSummary, CorrelationMatrix};
use airwatch::data::threshold::ThresholdStatus;

use crate::color::{StationColors, diverging, pollutant_palette};
use crate::state::AppState;

const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the central panel: a hint, a warning, or the full analysis.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(active) = &state.active else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Choose filters on the left and press Analyze to start.");
        });
        return;
    };

    let analysis = match &active.outcome {
        Ok(a) => a,
        Err(e) => {
            ui.label(RichText::new(format!("⚠ {e}")).color(Color32::YELLOW).heading());
            return;
        }
    };

    let mut tab = state.trend_tab;
    let colors = &state.colors;
    let request = &active.request;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.label(
                RichText::new(format!(
                    "Analysing {} rows from {} station(s), {} to {}, {} window {}",
                    analysis.view.len(),
                    request.criteria.stations.len(),
                    request.criteria.start,
                    request.criteria.end,
                    request.method,
                    request.window.get()
                ))
                .color(Color32::LIGHT_GREEN),
            );
            ui.add_space(6.0);

            ui.heading("📈 Pollutant trends");
            trend_section(ui, analysis, colors, &mut tab);

            ui.add_space(12.0);
            ui.heading("📊 Comparison across stations");
            comparison_chart(ui, analysis);

            ui.add_space(12.0);
            ui.heading("🔥 Correlation between pollutants");
            match &analysis.correlation {
                Ok(matrix) => correlation_heatmap(ui, matrix),
                Err(e) => {
                    ui.label(format!("Correlation unavailable: {e}."));
                }
            }

            ui.add_space(12.0);
            ui.heading("📋 Summary statistics");
            summary_table(ui, &analysis.summary);

            ui.add_space(12.0);
            ui.heading("🚨 Air-quality notifications");
            notifications(ui, &analysis.notifications);
        });

    state.trend_tab = tab;
}

// ---------------------------------------------------------------------------
// Trend lines
// ---------------------------------------------------------------------------

fn trend_section(ui: &mut Ui, analysis: &Analysis, colors: &StationColors, tab: &mut usize) {
    if analysis.trends.is_empty() {
        return;
    }
    ui.horizontal(|ui: &mut Ui| {
        for (i, trend) in analysis.trends.iter().enumerate() {
            ui.selectable_value(tab, i, trend.pollutant.column());
        }
    });
    *tab = (*tab).min(analysis.trends.len() - 1);
    trend_chart(ui, &analysis.trends[*tab], colors);
}

fn trend_chart(ui: &mut Ui, trend: &PollutantTrend, colors: &StationColors) {
    let pollutant = trend.pollutant;

    Plot::new(("trend_plot", pollutant.column()))
        .legend(Legend::default())
        .height(320.0)
        .x_axis_label("Date")
        .y_axis_label(format!("{pollutant} concentration (µg/m³)"))
        .x_axis_formatter(date_axis)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for st in &trend.stations {
                let color = colors.raw(&st.station);
                for segment in segments(&st.datetimes, &st.raw) {
                    plot_ui.line(
                        Line::new(PlotPoints::from(segment.clone()))
                            .name(&st.station)
                            .color(color)
                            .width(1.5),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from(segment))
                            .name(&st.station)
                            .color(color)
                            .radius(2.0),
                    );
                }

                let ma_name = format!("{} (MA)", st.station);
                let ma_color = colors.smoothed(&st.station);
                for segment in segments(&st.datetimes, &st.smoothed) {
                    plot_ui.line(
                        Line::new(PlotPoints::from(segment))
                            .name(&ma_name)
                            .color(ma_color)
                            .width(3.0)
                            .style(LineStyle::dotted_dense()),
                    );
                }
            }

            if let Some(limit) = trend.threshold {
                plot_ui.hline(
                    HLine::new(limit)
                        .name(format!("Safe limit {pollutant} ({limit} µg/m³)"))
                        .color(Color32::RED)
                        .width(2.0)
                        .style(LineStyle::dashed_loose()),
                );
            }
        });
}

/// Split a series into contiguous runs of defined values.
fn segments(datetimes: &[NaiveDateTime], values: &[Option<f64>]) -> Vec<Vec<[f64; 2]>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (dt, v) in datetimes.iter().zip(values) {
        match v {
            Some(v) => current.push([to_plot_x(dt), *v]),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn to_plot_x(dt: &NaiveDateTime) -> f64 {
    dt.and_utc().timestamp() as f64 / SECONDS_PER_DAY
}

fn date_axis(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    DateTime::from_timestamp((mark.value * SECONDS_PER_DAY) as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Grouped bars
// ---------------------------------------------------------------------------

fn comparison_chart(ui: &mut Ui, analysis: &Analysis) {
    let labels: Vec<String> = analysis.comparison.iter().map(|c| c.station.clone()).collect();
    let n_pollutants = analysis.comparison.first().map_or(0, |c| c.means.len());
    if n_pollutants == 0 {
        return;
    }
    let palette = pollutant_palette();
    let bar_width = 0.8 / n_pollutants as f64;

    Plot::new("comparison_plot")
        .legend(Legend::default())
        .height(280.0)
        .x_axis_label("Station")
        .y_axis_label("Mean concentration (µg/m³)")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 {
                labels.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for k in 0..n_pollutants {
                let pollutant = analysis.comparison[0].means[k].0;
                let offset = (k as f64 - (n_pollutants as f64 - 1.0) / 2.0) * bar_width;
                let bars: Vec<Bar> = analysis
                    .comparison
                    .iter()
                    .enumerate()
                    .filter_map(|(i, c)| {
                        let mean = c.means[k].1?;
                        Some(
                            Bar::new(i as f64 + offset, mean)
                                .width(bar_width)
                                .name(format!("{} {pollutant}", c.station)),
                        )
                    })
                    .collect();
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(pollutant.column())
                        .color(palette[pollutant.index()]),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

fn correlation_heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    const CELL: f32 = 56.0;
    let n = matrix.size();

    egui::Grid::new("correlation_heatmap")
        .spacing(Vec2::splat(2.0))
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for p in &matrix.pollutants {
                ui.strong(p.column());
            }
            ui.end_row();

            for row in 0..n {
                ui.strong(matrix.pollutants[row].column());
                for col in 0..n {
                    let r = matrix.get(row, col);
                    let (rect, response) = ui.allocate_exact_size(Vec2::splat(CELL), Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, diverging(r));
                    let text = r.map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}"));
                    ui.painter().text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        &text,
                        FontId::monospace(12.0),
                        Color32::BLACK,
                    );
                    response.on_hover_text(format!(
                        "{} / {}: {text}",
                        matrix.pollutants[row], matrix.pollutants[col]
                    ));
                }
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Summary table
// ---------------------------------------------------------------------------

fn summary_table(ui: &mut Ui, summary: &[ColumnSummary]) {
    let Some(first) = summary.first() else {
        return;
    };

    egui::Grid::new("summary_stats")
        .striped(true)
        .min_col_width(72.0)
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for s in summary {
                ui.strong(s.pollutant.column());
            }
            ui.end_row();

            for (row, (label, _)) in first.rows().iter().enumerate() {
                ui.strong(*label);
                for s in summary {
                    let cell = match s.rows()[row].1 {
                        Some(v) if row == 0 => format!("{v:.0}"),
                        Some(v) => format!("{v:.2}"),
                        None => "n/a".to_string(),
                    };
                    ui.monospace(cell);
                }
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

fn notifications(ui: &mut Ui, items: &[(Pollutant, ThresholdStatus)]) {
    for (pollutant, status) in items {
        match status {
            ThresholdStatus::Breached {
                max_value, excess, ..
            } => {
                ui.label(
                    RichText::new(format!("⚠ Air quality exceeds the safe limit for {pollutant}!"))
                        .color(Color32::RED)
                        .strong(),
                );
                ui.label(format!(
                    "Highest {pollutant}: {max_value:.2} µg/m³  (+{excess:.2} µg/m³ over the limit)"
                ));
            }
            ThresholdStatus::WithinLimit {
                max_value: Some(_), ..
            } => {
                ui.label(
                    RichText::new(format!("✅ Air quality for {pollutant} is within the safe limit."))
                        .color(Color32::GREEN),
                );
            }
            ThresholdStatus::WithinLimit { max_value: None, .. } => {
                ui.label(format!("No {pollutant} measurements in the selection."));
            }
            ThresholdStatus::NoThreshold => {
                ui.label(format!("No safety threshold defined for {pollutant}."));
            }
        }
    }
}
