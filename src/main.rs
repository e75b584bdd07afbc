mod app;
mod cli;
mod color;
mod state;
mod ui;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use eframe::egui;

use airwatch::data::loader;
use app::AirwatchApp;
use cli::Cli;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // The dataset is loaded exactly once; a bad file means we never open a window.
    let dataset = loader::load_file(&cli.data)
        .with_context(|| format!("loading dataset {}", cli.data.display()))?;
    log::info!(
        "Loaded {} rows from {} station(s) in {}",
        dataset.len(),
        dataset.stations.len(),
        cli.data.display()
    );

    let state = AppState::new(dataset, cli.data, cli.method.into(), cli.window);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Airwatch – Air Quality Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(AirwatchApp::new(state)))),
    )
    .map_err(|e| anyhow!("running UI: {e}"))
}
