//! Display colours for pitch classes.
//!
//! Pitch classes walk the hue wheel backwards in 30° steps starting from 60°
//! (C is yellow), so neighbouring semitones get neighbouring hues.

use serde::Serialize;

pub const DEFAULT_SATURATION: f32 = 80.0;
pub const DEFAULT_LIGHTNESS: f32 = 60.0;
pub const DEFAULT_ALPHA: f32 = 1.0;

/// An HSL colour with alpha. Saturation and lightness are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hsla {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
}

impl Hsla {
    /// CSS notation, e.g. `hsla(60, 80%, 60%, 1)`.
    pub fn to_css(&self) -> String {
        format!(
            "hsla({}, {}%, {}%, {})",
            self.hue, self.saturation, self.lightness, self.alpha
        )
    }
}

/// Hue in degrees for a pitch class; classes outside 0..=11 wrap.
pub fn pitch_class_hue(pitch_class: u8) -> f32 {
    let pc = (pitch_class % 12) as i32;
    (360 - pc * 30 + 60).rem_euclid(360) as f32
}

/// Colour for a pitch class with the default saturation, lightness and alpha.
pub fn pitch_class_color(pitch_class: u8) -> Hsla {
    pitch_class_color_with(pitch_class, DEFAULT_SATURATION, DEFAULT_LIGHTNESS, DEFAULT_ALPHA)
}

pub fn pitch_class_color_with(pitch_class: u8, saturation: f32, lightness: f32, alpha: f32) -> Hsla {
    Hsla {
        hue: pitch_class_hue(pitch_class),
        saturation,
        lightness,
        alpha,
    }
}
