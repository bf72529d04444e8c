mod app;
mod color;
mod state;
mod ui;

use ab_verdict::config::AppConfig;
use app::AbVerdictApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration, using defaults: {e:#}");
            AppConfig::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "ab-verdict: A/B Test Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(AbVerdictApp::new(config)))),
    )
}
