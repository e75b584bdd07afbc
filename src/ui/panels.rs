use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};
use egui_extras::DatePickerButton;

use airwatch::data::export::{DEFAULT_EXPORT_NAME, export_to_path};
use airwatch::data::model::Pollutant;
use airwatch::data::smoothing::{SmoothingMethod, Window};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data");
    ui.separator();

    if state.dataset.is_empty() {
        ui.label("Dataset is empty.");
        return;
    }

    let stations = state.dataset.stations.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Stations ----
            let header_text = format!(
                "Stations  ({}/{})",
                state.selected_stations.len(),
                stations.len()
            );
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("stations")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_stations();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_stations();
                        }
                    });

                    for station in &stations {
                        let mut checked = state.selected_stations.contains(station);
                        let text = RichText::new(station).color(state.colors.raw(station));
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_station(station);
                        }
                    }
                });
            ui.separator();

            // ---- Pollutants ----
            ui.strong("Pollutants");
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for pollutant in Pollutant::ALL {
                    let mut checked = state.selected_pollutants.contains(&pollutant);
                    if ui.checkbox(&mut checked, pollutant.column()).changed() {
                        state.toggle_pollutant(pollutant);
                    }
                }
            });
            ui.separator();

            // ---- Date range ----
            ui.strong("Date range");
            let before = (state.start, state.end);
            egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.label("From");
                ui.add(DatePickerButton::new(&mut state.start).id_salt("start_date"));
                ui.end_row();
                ui.label("To");
                ui.add(DatePickerButton::new(&mut state.end).id_salt("end_date"));
                ui.end_row();
            });
            if (state.start, state.end) != before {
                state.refilter();
            }
            if state.start > state.end {
                ui.label(RichText::new("Start is after end: nothing will match.").color(Color32::YELLOW));
            }
            ui.separator();

            // ---- Smoothing ----
            ui.strong("Smoothing");
            egui::ComboBox::from_id_salt("smoothing_method")
                .selected_text(state.method.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for method in SmoothingMethod::ALL {
                        ui.selectable_value(&mut state.method, method, method.label());
                    }
                });
            let mut window = state.window.get();
            if ui
                .add(Slider::new(&mut window, 1..=Window::MAX).text("window"))
                .changed()
            {
                if let Ok(w) = Window::new(window) {
                    state.window = w;
                }
            }
            ui.separator();

            // ---- Actions ----
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("📥 Export…").clicked() {
                    export_file_dialog(state);
                }
                if ui.button("🔍 Analyze").clicked() {
                    state.analyze();
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Export…").clicked() {
                export_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.separator();

        ui.label(format!(
            "{} rows loaded from {}, {} match current filters",
            state.dataset.len(),
            state.source.display(),
            state.preview_count
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open air-quality data")
        .add_filter("Supported files", &["csv", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match airwatch::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} rows from {} station(s)",
                    dataset.len(),
                    dataset.stations.len()
                );
                state.set_dataset(dataset, path);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered data")
        .set_file_name(DEFAULT_EXPORT_NAME)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        match export_to_path(&state.export_view.rows, &path) {
            Ok(()) => {
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
