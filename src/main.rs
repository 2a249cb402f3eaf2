mod app;
mod charts;
mod color;
mod config;
mod data;
mod metrics;
mod narrative;
mod state;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use app::InsightsApp;
use config::AppConfig;
use eframe::egui;
use narrative::gemini::GeminiClient;
use narrative::worker::NarrativeWorker;
use narrative::Summarizer;
use state::AppState;

fn main() -> Result<()> {
    // A missing .env file is fine; the variables may come from the shell.
    dotenv::dotenv().ok();
    env_logger::init();

    let mut config = AppConfig::from_env().context("loading configuration")?;
    if let Some(path) = std::env::args_os().nth(1) {
        config = config.with_dataset_path(path);
    }
    log::info!("starting with {config:?}");

    let dataset = Arc::new(data::loader::load_file(&config.dataset_path)?);
    if dataset.is_empty() {
        log::warn!("{} contains no records", config.dataset_path.display());
    }
    let generator = GeminiClient::new(config.narrative.clone())?;
    let summarizer = Arc::new(Summarizer::new(Arc::new(generator)));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Myntra E-commerce Analytics Dashboard",
        options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let worker = NarrativeWorker::new(summarizer).with_notify(move || ctx.request_repaint());
            Ok(Box::new(InsightsApp::new(AppState::new(dataset, worker))))
        }),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard window: {e}"))
}
