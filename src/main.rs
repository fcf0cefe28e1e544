mod app;
mod color;
mod state;
mod ui;

use app::DelayDashboardApp;
use eframe::egui;
use sbb_delays::config::DashboardConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::from_env();
    log::info!("Dataset: {}", config.data_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SBB Delay Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DelayDashboardApp::new(config)))),
    )
}
