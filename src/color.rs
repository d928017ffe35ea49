use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Srgb<u8>> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format::<u8>()
        })
        .collect()
}

/// `#rrggbb`, as plotly expects.
pub fn hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

pub fn color32(color: Srgb<u8>) -> Color32 {
    Color32::from_rgb(color.red, color.green, color.blue)
}

// ---------------------------------------------------------------------------
// Series colours: series key → colour
// ---------------------------------------------------------------------------

/// Assigns each distinct key (e.g. a driver code) its own colour so the same
/// key keeps its colour across charts.
#[derive(Debug, Clone)]
pub struct SeriesColors {
    mapping: BTreeMap<String, Srgb<u8>>,
    default_color: Srgb<u8>,
}

impl SeriesColors {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let palette = generate_palette(keys.len());
        SeriesColors {
            mapping: keys.into_iter().zip(palette).collect(),
            default_color: Srgb::new(128, 128, 128),
        }
    }

    pub fn color_for(&self, key: &str) -> Srgb<u8> {
        self.mapping.get(key).copied().unwrap_or(self.default_color)
    }

    pub fn hex_for(&self, key: &str) -> String {
        hex(self.color_for(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unknown_key_gets_grey() {
        let colors = SeriesColors::new(["HAM", "RUS"]);
        assert_eq!(colors.hex_for("VER"), "#808080");
        assert_ne!(colors.hex_for("HAM"), colors.hex_for("RUS"));
        assert!(colors.hex_for("HAM").starts_with('#'));
        assert_eq!(colors.hex_for("HAM").len(), 7);
    }
}
