use eframe::egui::{self, Color32, RichText, Sense, Stroke, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, MarkerShape, Plot, PlotPoints, Points, Polygon};
use sbb_delays::data::aggregate::dense_hourly_series;

use crate::color::delay_rate_color;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 300.0;

/// Geographic centre of Switzerland, used to correct the map's aspect ratio.
const CENTER_LAT: f64 = 46.8153;

/// Shown instead of a chart when no run matches the filters.
pub fn placeholder(ui: &mut Ui, text: &str) {
    ui.allocate_ui(egui::vec2(ui.available_width(), 80.0), |ui: &mut Ui| {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(RichText::new(text).italics().color(Color32::GRAY));
        });
    });
}

// ---------------------------------------------------------------------------
// Station bubble map
// ---------------------------------------------------------------------------

/// Bubble per station: position = coordinates, size = trains per day,
/// colour = delay rate.
pub fn station_map(ui: &mut Ui, state: &AppState) {
    let stations = &state.aggregates.stations;
    if stations.is_empty() {
        placeholder(ui, "No stations match the current filters.");
        return;
    }

    let max_runs = stations
        .iter()
        .map(|s| s.mean_daily_runs)
        .fold(f64::MIN_POSITIVE, f64::max);

    Plot::new("station_map")
        .height(CHART_HEIGHT + 100.0)
        // A degree of longitude is shorter than a degree of latitude here.
        .data_aspect((1.0 / CENTER_LAT.to_radians().cos()) as f32)
        .include_x(5.9)
        .include_x(10.5)
        .include_y(45.8)
        .include_y(47.9)
        .show_axes(false)
        .show_grid(false)
        .allow_scroll(false)
        .label_formatter(move |name: &str, _value| {
            stations
                .iter()
                .find(|s| s.stop_name == name)
                .map(|s| {
                    format!(
                        "{}\n{:.1} trains per day\n{:.0}% delayed",
                        s.stop_name,
                        s.mean_daily_runs,
                        s.delay_rate * 100.0
                    )
                })
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            for s in stations {
                let radius = 2.0 + 14.0 * (s.mean_daily_runs / max_runs).sqrt();
                let point = Points::new(PlotPoints::new(vec![[
                    s.coordinates.longitude,
                    s.coordinates.latitude,
                ]]))
                .name(&s.stop_name)
                .shape(MarkerShape::Circle)
                .filled(true)
                .radius(radius as f32)
                .color(delay_rate_color(s.delay_rate).gamma_multiply(0.7));
                plot_ui.points(point);
            }
        });

    delay_rate_legend(ui);
}

/// Horizontal colour bar explaining the map's delay-rate scale.
fn delay_rate_legend(ui: &mut Ui) {
    const STEPS: usize = 20;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Share delayed: 0%");
        let (rect, _) = ui.allocate_exact_size(egui::vec2(160.0, 12.0), Sense::hover());
        let step = rect.width() / STEPS as f32;
        for i in 0..STEPS {
            let x = rect.left() + i as f32 * step;
            let cell = egui::Rect::from_min_size(egui::pos2(x, rect.top()), egui::vec2(step + 0.5, rect.height()));
            let rate = (i as f64 + 0.5) / STEPS as f64;
            ui.painter().rect_filled(cell, 0.0, delay_rate_color(rate));
        }
        ui.label("100%");
    });
}

/// Stations ranked by trains per day.
pub fn station_table(ui: &mut Ui, state: &AppState) {
    let mut rows: Vec<_> = state.aggregates.stations.iter().collect();
    if rows.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        b.mean_daily_runs
            .total_cmp(&a.mean_daily_runs)
            .then_with(|| a.stop_name.cmp(&b.stop_name))
    });

    egui::CollapsingHeader::new("Stations")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .max_scroll_height(240.0)
                .column(TableColumn::remainder().at_least(160.0))
                .column(TableColumn::auto().at_least(90.0))
                .column(TableColumn::auto().at_least(90.0))
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("Station");
                    });
                    header.col(|ui| {
                        ui.strong("Trains / day");
                    });
                    header.col(|ui| {
                        ui.strong("Delayed");
                    });
                })
                .body(|body| {
                    body.rows(18.0, rows.len(), |mut row| {
                        let s = rows[row.index()];
                        row.col(|ui| {
                            ui.label(&s.stop_name);
                        });
                        row.col(|ui| {
                            ui.label(format!("{:.1}", s.mean_daily_runs));
                        });
                        row.col(|ui| {
                            ui.label(
                                RichText::new(format!("{:.0}%", s.delay_rate * 100.0))
                                    .color(delay_rate_color(s.delay_rate)),
                            );
                        });
                    });
                });
        });
}

// ---------------------------------------------------------------------------
// Delay rate per train category (horizontal bars)
// ---------------------------------------------------------------------------

/// Horizontal bars ranked with the highest delay rate on top.
pub fn category_delay_bars(ui: &mut Ui, state: &AppState) {
    let mut ranked = state.aggregates.category_delay_rates.clone();
    if ranked.is_empty() {
        placeholder(ui, "No train categories match the current filters.");
        return;
    }
    // Ascending, so the largest value gets the highest (top-most) position.
    ranked.sort_by(|a, b| {
        a.delay_rate
            .total_cmp(&b.delay_rate)
            .then_with(|| b.train_category.cmp(&a.train_category))
    });

    let bars: Vec<Bar> = ranked
        .iter()
        .enumerate()
        .map(|(i, r)| {
            Bar::new(i as f64, r.delay_rate)
                .name(&r.train_category)
                .fill(state.category_colors.color_for(&r.train_category))
                .width(0.7)
        })
        .collect();
    let labels: Vec<String> = ranked.iter().map(|r| r.train_category.clone()).collect();

    Plot::new("category_delay_bars")
        .height((ranked.len() as f32 * 28.0).clamp(120.0, CHART_HEIGHT + 200.0))
        .x_axis_label("Share of delayed trains")
        .include_x(0.0)
        .include_x(1.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show_grid([true, false])
        .y_axis_formatter(move |mark: GridMark, _range| {
            let pos = mark.value.round();
            if (mark.value - pos).abs() > 1e-6 || pos < 0.0 {
                return String::new();
            }
            labels.get(pos as usize).cloned().unwrap_or_default()
        })
        .label_formatter(|name: &str, value| {
            if name.is_empty() {
                String::new()
            } else {
                format!("{name}: {:.0}% delayed", value.x * 100.0)
            }
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

// ---------------------------------------------------------------------------
// Delayed trains per hour (stacked areas)
// ---------------------------------------------------------------------------

/// One stacked band per delay category over the 24 hours. Hours without an
/// observation contribute zero.
pub fn hourly_delay_area(ui: &mut Ui, state: &AppState) {
    let histogram = &state.aggregates.hourly_delays;
    if histogram.is_empty() {
        placeholder(ui, "No delayed trains match the current filters.");
        return;
    }
    let series = dense_hourly_series(histogram);

    // Stack in category order.
    let mut base = [0.0f64; 24];
    let mut bands = Vec::with_capacity(series.len());
    for (category, counts) in &series {
        let mut top = base;
        for (t, c) in top.iter_mut().zip(counts) {
            *t += *c as f64;
        }
        bands.push((category.clone(), base, top));
        base = top;
    }

    Plot::new("hourly_delay_area")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Hour")
        .y_axis_label("Delayed trains")
        .include_x(0.0)
        .include_x(23.0)
        .include_y(0.0)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (category, lower, upper) in &bands {
                let color = state.delay_colors.color_for(category);
                // Trapezoids per hour keep every polygon convex.
                for h in 0..23 {
                    let quad = vec![
                        [h as f64, lower[h]],
                        [(h + 1) as f64, lower[h + 1]],
                        [(h + 1) as f64, upper[h + 1]],
                        [h as f64, upper[h]],
                    ];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::new(quad))
                            .name(category)
                            .fill_color(color.gamma_multiply(0.6))
                            .stroke(Stroke::NONE),
                    );
                }
                let outline: Vec<[f64; 2]> = upper
                    .iter()
                    .enumerate()
                    .map(|(h, y)| [h as f64, *y])
                    .collect();
                plot_ui.line(Line::new(PlotPoints::new(outline)).name(category).color(color));
            }
        });
}
