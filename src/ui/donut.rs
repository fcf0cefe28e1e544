use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, Ui};

use crate::state::AppState;
use crate::ui::plot::placeholder;

/// Largest angle covered by one ring segment; keeps every segment convex.
const MAX_SEGMENT: f32 = 0.05;

/// Point on a circle, measured clockwise from twelve o'clock.
fn polar(center: Pos2, radius: f32, fraction: f32) -> Pos2 {
    let angle = fraction * TAU - FRAC_PI_2;
    center + radius * egui::vec2(angle.cos(), angle.sin())
}

/// Fraction of the full turn (clockwise from twelve o'clock) at which `pos` lies.
fn fraction_at(center: Pos2, pos: Pos2) -> f32 {
    let d = pos - center;
    (d.y.atan2(d.x) + FRAC_PI_2).rem_euclid(TAU) / TAU
}

fn ring_slice(painter: &egui::Painter, center: Pos2, inner: f32, outer: f32, from: f32, to: f32, color: Color32) {
    let steps = (((to - from) * TAU) / MAX_SEGMENT).ceil().max(1.0) as usize;
    for i in 0..steps {
        let a = from + (to - from) * i as f32 / steps as f32;
        let b = from + (to - from) * (i + 1) as f32 / steps as f32;
        let quad = vec![
            polar(center, inner, a),
            polar(center, outer, a),
            polar(center, outer, b),
            polar(center, inner, b),
        ];
        painter.add(Shape::convex_polygon(quad, color, Stroke::NONE));
    }
}

/// Donut of average trains per day, one slice per train category, largest first.
pub fn category_donut(ui: &mut Ui, state: &AppState) {
    let mut slices: Vec<_> = state
        .aggregates
        .category_throughput
        .iter()
        .filter(|t| t.mean_daily_runs > 0)
        .collect();
    let total: u64 = slices.iter().map(|t| t.mean_daily_runs).sum();
    if total == 0 {
        placeholder(ui, "No train categories match the current filters.");
        return;
    }
    slices.sort_by(|a, b| {
        b.mean_daily_runs
            .cmp(&a.mean_daily_runs)
            .then_with(|| a.train_category.cmp(&b.train_category))
    });

    ui.horizontal(|ui: &mut Ui| {
        let size = 280.0;
        let (rect, response) = ui.allocate_exact_size(egui::vec2(size, size), Sense::hover());
        let painter = ui.painter_at(rect);
        let center = rect.center();
        let outer = size / 2.0 - 4.0;
        let inner = outer * 0.55;

        let hovered_fraction = response
            .hover_pos()
            .filter(|p| (inner..=outer).contains(&(*p - center).length()))
            .map(|p| fraction_at(center, p));

        let mut start = 0.0f32;
        let mut hovered = None;
        for slice in &slices {
            let share = slice.mean_daily_runs as f32 / total as f32;
            let end = start + share;
            let color = state.category_colors.color_for(&slice.train_category);
            let is_hovered = hovered_fraction.is_some_and(|f| f >= start && f < end);
            let (r_in, r_out) = if is_hovered { (inner, outer) } else { (inner + 3.0, outer - 3.0) };
            ring_slice(&painter, center, r_in, r_out, start, end, color);
            if is_hovered {
                hovered = Some((slice, share));
            }
            start = end;
        }

        let text = match hovered {
            Some((slice, share)) => format!(
                "{}\n{} trains/day\n{:.0}%",
                slice.train_category,
                slice.mean_daily_runs,
                share * 100.0
            ),
            None => format!("{total}\ntrains/day"),
        };
        painter.text(
            center,
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(16.0),
            ui.visuals().text_color(),
        );

        ui.vertical(|ui: &mut Ui| {
            for slice in &slices {
                ui.horizontal(|ui: &mut Ui| {
                    let (swatch, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), Sense::hover());
                    ui.painter()
                        .rect_filled(swatch, 2.0, state.category_colors.color_for(&slice.train_category));
                    ui.label(format!("{}  {}", slice.train_category, slice.mean_daily_runs));
                });
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polar_and_fraction_agree() {
        let center = Pos2::new(100.0, 100.0);
        for fraction in [0.0f32, 0.125, 0.25, 0.5, 0.8] {
            let p = polar(center, 50.0, fraction);
            assert!((fraction_at(center, p) - fraction).abs() < 1e-4);
        }
    }

    #[test]
    fn quarter_turn_points_right() {
        let center = Pos2::new(0.0, 0.0);
        let p = polar(center, 10.0, 0.25);
        assert!((p.x - 10.0).abs() < 1e-4);
        assert!(p.y.abs() < 1e-4);
    }
}
