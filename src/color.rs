use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            to_color32(hsl.into_color())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sequential scale for delay rates
// ---------------------------------------------------------------------------

/// Colour of a delay rate in [0, 1]: dark blue for punctual, yellow for
/// mostly delayed. Values outside the range are clamped.
pub fn delay_rate_color(rate: f64) -> Color32 {
    let low: Hsl = Srgb::new(0.05_f32, 0.11, 0.45).into_color();
    let high: Hsl = Srgb::new(0.98_f32, 0.86, 0.15).into_color();
    let t = if rate.is_finite() { rate.clamp(0.0, 1.0) as f32 } else { 0.0 };
    to_color32(low.mix(high, t).into_color())
}

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps category labels (train categories, delay categories) to distinct
/// colours, so a category keeps its colour across charts and filter changes.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Build a colour map from the full set of labels.
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a String>) -> Self {
        let labels: Vec<&String> = labels.into_iter().collect();
        let palette = generate_palette(labels.len());
        let mapping = labels
            .into_iter()
            .zip(palette)
            .map(|(label, color)| (label.clone(), color))
            .collect();
        ColorMap { mapping }
    }

    /// Look up the colour for a label; unknown labels are grey.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping.get(label).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        let p = generate_palette(6);
        assert_eq!(p.len(), 6);
        let distinct: BTreeSet<_> = p.iter().map(|c| c.to_array()).collect();
        assert_eq!(distinct.len(), 6);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn delay_rate_scale_clamps_and_spans() {
        assert_eq!(delay_rate_color(-1.0), delay_rate_color(0.0));
        assert_eq!(delay_rate_color(2.0), delay_rate_color(1.0));
        assert_ne!(delay_rate_color(0.0), delay_rate_color(1.0));
        assert_eq!(delay_rate_color(f64::NAN), delay_rate_color(0.0));
    }

    #[test]
    fn color_map_is_stable_and_defaults_to_grey() {
        let labels: BTreeSet<String> = ["IC", "S", "EC"].iter().map(|s| s.to_string()).collect();
        let a = ColorMap::new(&labels);
        let b = ColorMap::new(&labels);
        assert_eq!(a.color_for("IC"), b.color_for("IC"));
        assert_ne!(a.color_for("IC"), a.color_for("S"));
        assert_eq!(a.color_for("TGV"), Color32::GRAY);
    }
}
