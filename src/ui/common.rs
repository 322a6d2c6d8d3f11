//! Shared UI pieces: the swatch palette and the dark theme colors.

use egui::{Color32, Frame, Stroke};

use crate::mqtt::message::RANDOM_SWATCH;

/// One clickable color option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    /// Value handed to `ColorSelection::from_swatch`
    pub value: &'static str,
    pub fill: Color32,
}

impl Swatch {
    const fn new(value: &'static str, r: u8, g: u8, b: u8) -> Self {
        Self {
            value,
            fill: Color32::from_rgb(r, g, b),
        }
    }

    pub fn is_random(&self) -> bool {
        self.value == RANDOM_SWATCH
    }

    /// Caption drawn on the swatch
    pub fn caption(&self) -> &'static str {
        if self.is_random() {
            "?"
        } else {
            self.value
        }
    }

    /// Text color readable on top of the fill
    pub fn text_color(&self) -> Color32 {
        let [r, g, b, _] = self.fill.to_array();
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        if luma > 140.0 {
            Color32::BLACK
        } else {
            Color32::WHITE
        }
    }
}

/// Colors the LED strip firmware understands, plus the gray "surprise me".
pub const PALETTE: [Swatch; 8] = [
    Swatch::new("red", 255, 0, 0),
    Swatch::new("green", 0, 200, 0),
    Swatch::new("blue", 0, 0, 255),
    Swatch::new("white", 255, 255, 255),
    Swatch::new("cyan", 0, 255, 255),
    Swatch::new("magenta", 255, 0, 255),
    Swatch::new("yellow", 255, 255, 0),
    Swatch::new(RANDOM_SWATCH, 128, 128, 128),
];

/// Centralized color palette for the dark theme.
pub struct UiColors;

impl UiColors {
    /// Primary background color for main content areas (RGB: 30, 30, 30)
    pub const MAIN_BG: Color32 = Color32::from_rgb(30, 30, 30);

    /// Deepest background color for the outcome log (RGB: 20, 20, 20)
    pub const EXTREME_BG: Color32 = Color32::from_rgb(20, 20, 20);

    /// Border color for component separation (RGB: 60, 60, 60)
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Published outcome (RGB: 50, 200, 20) - Green
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Failed outcome (RGB: 200, 50, 20) - Red
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);
}

/// Creates a styled frame with consistent visual parameters.
pub fn create_frame(bg_color: Color32, border_color: Color32) -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, border_color))
        .fill(bg_color)
        .inner_margin(4)
        .outer_margin(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::ColorSelection;

    #[test]
    fn palette_has_one_random_swatch() {
        assert_eq!(PALETTE.iter().filter(|s| s.is_random()).count(), 1);
    }

    #[test]
    fn every_swatch_maps_to_a_selection() {
        for swatch in PALETTE {
            let color = ColorSelection::from_swatch(swatch.value).unwrap();
            if swatch.is_random() {
                assert_eq!(color.as_str(), "random");
            } else {
                assert_eq!(color.as_str(), swatch.value);
            }
        }
    }

    #[test]
    fn captions_stay_readable() {
        let white = PALETTE.iter().find(|s| s.value == "white").unwrap();
        let blue = PALETTE.iter().find(|s| s.value == "blue").unwrap();
        assert_eq!(white.text_color(), Color32::BLACK);
        assert_eq!(blue.text_color(), Color32::WHITE);
    }
}
