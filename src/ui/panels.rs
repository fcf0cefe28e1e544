use std::time::Instant;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use sbb_delays::data::model::OriginClass;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

fn origin_label(origin: OriginClass) -> &'static str {
    match origin {
        OriginClass::Domestic => "Switzerland",
        OriginClass::International => "Abroad",
    }
}

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter data");
    ui.separator();

    let categories: Vec<String> = match &state.table {
        Some(table) => table.train_categories().iter().cloned().collect(),
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };
    let now = Instant::now();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Hour range ----
            // Each bound is limited by the other, so min <= max always holds.
            ui.strong("Time of day");
            let mut min = state.hour_min;
            let mut max = state.hour_max;
            ui.add(egui::Slider::new(&mut min, 0..=max).text("from"));
            ui.add(egui::Slider::new(&mut max, min..=23).text("to"));
            state.set_hours(min, max, now);
            ui.separator();

            // ---- Origin (first stop) ----
            ui.strong("Origin (first stop)");
            for origin in OriginClass::ALL {
                let mut checked = state.origins.contains(&origin);
                if ui.checkbox(&mut checked, origin_label(origin)).changed() {
                    state.set_origin(origin, checked, now);
                }
            }
            ui.separator();

            // ---- Train category ----
            let header = format!(
                "Train category  ({}/{})",
                state.categories.len(),
                categories.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("train_category")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_categories(now);
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_categories(now);
                        }
                    });

                    for category in &categories {
                        let mut checked = state.categories.contains(category);
                        let text =
                            RichText::new(category).color(state.category_colors.color_for(category));
                        if ui.checkbox(&mut checked, text).changed() {
                            state.set_category(category, checked, now);
                        }
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
        });

        ui.separator();

        if let Some(table) = &state.table {
            if let Some(name) = state.source_name() {
                ui.label(RichText::new(name).strong());
            }
            ui.label(format!(
                "{} runs loaded, {} match the filters",
                table.len(),
                state.aggregates.row_count
            ));
            if state.is_dirty() {
                ui.spinner();
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open delay dataset")
        .add_filter("Supported files", &["parquet", "pq", "csv", "json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.open(&path) {
            log::error!("Failed to load {}: {e}", path.display());
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}
