use std::time::Instant;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use sbb_delays::config::DashboardConfig;

use crate::state::AppState;
use crate::ui::{donut, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DelayDashboardApp {
    pub state: AppState,
}

impl DelayDashboardApp {
    /// Create the app and load the configured dataset.
    pub fn new(config: DashboardConfig) -> Self {
        let mut state = AppState::new(config);
        state.load_startup();
        Self { state }
    }
}

impl eframe::App for DelayDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // Filter edits above only mark the state dirty; run the pipeline once
        // they have settled.
        if let Some(wait) = self.state.poll_recompute(Instant::now()) {
            ctx.request_repaint_after(wait);
        }

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard(ui, &self.state);
        });
    }
}

fn section(ui: &mut Ui, title: &str, caption: Option<&str>) {
    ui.add_space(12.0);
    ui.heading(title);
    if let Some(caption) = caption {
        ui.label(caption);
    }
}

fn dashboard(ui: &mut Ui, state: &AppState) {
    if let Some(err) = &state.load_error {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(
                RichText::new(format!("Could not load the delay dataset.\n\n{err}\n\nUse File → Open… to pick another file."))
                    .color(Color32::RED)
                    .size(16.0),
            );
        });
        return;
    }
    let Some(table) = &state.table else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a dataset to begin  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(RichText::new("SBB delay analysis").size(24.0));
            if let Some((first, last)) = table.date_span() {
                ui.label(format!(
                    "Delays of trains between {} and {}.",
                    first.format("%-d.%-m.%Y"),
                    last.format("%-d.%-m.%Y")
                ));
            }
            ui.label(RichText::new("Data sources: opentransportdata.swiss, data.sbb.ch").small());

            section(
                ui,
                "Share of delayed trains per station",
                Some("Bubble size is the average number of trains per day at the station."),
            );
            plot::station_map(ui, state);
            plot::station_table(ui, state);

            section(ui, "Average trains per day by train category", None);
            donut::category_donut(ui, state);

            section(ui, "Share of delayed trains by train category", None);
            plot::category_delay_bars(ui, state);

            section(ui, "Delayed trains per hour", None);
            plot::hourly_delay_area(ui, state);
        });
}
