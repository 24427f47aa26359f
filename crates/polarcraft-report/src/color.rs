//! Color derivation for rendered beams and sensors.

use serde::{Deserialize, Serialize};

use polarcraft_core::polarization::{Handedness, PolarizationCategory, StateDescription};

/// An 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn from_unit(r: f64, g: f64, b: f64) -> Self {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(channel(r), channel(g), channel(b))
    }
}

pub const BLACK: Rgb = Rgb::new(0, 0, 0);
pub const UNPOLARIZED_GRAY: Rgb = Rgb::new(160, 160, 160);
pub const RIGHT_CIRCULAR: Rgb = Rgb::new(255, 0, 255);
pub const LEFT_CIRCULAR: Rgb = Rgb::new(0, 255, 255);
pub const ELLIPTICAL: Rgb = Rgb::new(255, 215, 0);

pub const SENSOR_ACTIVE: Rgb = Rgb::new(0, 220, 90);
pub const SENSOR_DIM: Rgb = Rgb::new(255, 150, 0);
pub const SENSOR_DARK: Rgb = Rgb::new(45, 45, 50);

const GAMMA: f64 = 0.8;

/// Approximate visible color of monochromatic light.
///
/// Piecewise-linear spectrum from 380 nm to 780 nm, dimmed towards both ends
/// of the visible range and gamma-corrected. Outside the range the light is
/// invisible and renders black.
pub fn wavelength_to_rgb(wavelength_nm: f64) -> Rgb {
    let w = wavelength_nm;
    let (r, g, b) = if (380.0..440.0).contains(&w) {
        (-(w - 440.0) / (440.0 - 380.0), 0.0, 1.0)
    } else if (440.0..490.0).contains(&w) {
        (0.0, (w - 440.0) / (490.0 - 440.0), 1.0)
    } else if (490.0..510.0).contains(&w) {
        (0.0, 1.0, -(w - 510.0) / (510.0 - 490.0))
    } else if (510.0..580.0).contains(&w) {
        ((w - 510.0) / (580.0 - 510.0), 1.0, 0.0)
    } else if (580.0..645.0).contains(&w) {
        (1.0, -(w - 645.0) / (645.0 - 580.0), 0.0)
    } else if (645.0..=780.0).contains(&w) {
        (1.0, 0.0, 0.0)
    } else {
        return BLACK;
    };

    let edge = if w < 420.0 {
        0.3 + 0.7 * (w - 380.0) / (420.0 - 380.0)
    } else if w > 700.0 {
        0.3 + 0.7 * (780.0 - w) / (780.0 - 700.0)
    } else {
        1.0
    };

    let adjust = |c: f64| if c > 0.0 { (c * edge).powf(GAMMA) } else { 0.0 };
    Rgb::from_unit(adjust(r), adjust(g), adjust(b))
}

/// Convert hue (degrees), saturation and lightness in [0, 1] to RGB.
pub fn hsl_to_rgb(hue_deg: f64, saturation: f64, lightness: f64) -> Rgb {
    let h = hue_deg.rem_euclid(360.0) / 60.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);
    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = l - chroma / 2.0;
    Rgb::from_unit(r + m, g + m, b + m)
}

/// Color encoding a polarization state. Linear light maps its orientation
/// onto the hue circle (0° and 180° meet).
pub fn polarization_to_rgb(description: &StateDescription) -> Rgb {
    let hue = description.orientation_deg / 180.0 * 360.0;
    match description.category {
        PolarizationCategory::Linear => hsl_to_rgb(hue, 1.0, 0.5),
        PolarizationCategory::Circular => match description.handedness {
            Handedness::Left => LEFT_CIRCULAR,
            _ => RIGHT_CIRCULAR,
        },
        PolarizationCategory::Elliptical => ELLIPTICAL,
        PolarizationCategory::PartiallyPolarized => hsl_to_rgb(hue, description.dop, 0.5),
        PolarizationCategory::Unpolarized => UNPOLARIZED_GRAY,
        PolarizationCategory::Zero => BLACK,
    }
}
