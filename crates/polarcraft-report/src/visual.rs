//! The visual contract: the one approved path from a world state to things a
//! renderer may draw.
//!
//! Every function here is pure and total. A renderable carries nothing that
//! is not derived from the world state it came from, and no segment below
//! [`RENDER_EPSILON`](polarcraft_core::thresholds::RENDER_EPSILON) is ever
//! produced.

use serde::{Deserialize, Serialize};

use polarcraft_core::thresholds::is_visible;
use polarcraft_core::types::{Point3, RayId};
use polarcraft_core::world::{BeamSegmentState, SensorReading, WorldState};

use crate::color::{polarization_to_rgb, wavelength_to_rgb, Rgb, SENSOR_ACTIVE, SENSOR_DARK, SENSOR_DIM};

/// Base opacity of the faintest visible segment.
pub const MIN_OPACITY: f64 = 0.3;
/// Opacity added by a unit-intensity segment.
pub const OPACITY_SPAN: f64 = 0.5;

/// What a segment's color encodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Wavelength,
    Polarization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderableSegment {
    pub ray_id: RayId,
    pub start: Point3,
    pub end: Point3,
    pub color: Rgb,
    pub opacity: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderableSensor {
    pub sensor_id: String,
    pub glow: Rgb,
    pub intensity: f64,
    pub activated: bool,
}

/// Opacity as a function of intensity alone; intensities above one saturate.
pub fn opacity(intensity: f64) -> f64 {
    MIN_OPACITY + OPACITY_SPAN * intensity.clamp(0.0, 1.0)
}

/// Convert a beam segment, or `None` when it is too dim to draw.
pub fn to_renderable_segment(segment: &BeamSegmentState, mode: ColorMode) -> Option<RenderableSegment> {
    if !is_visible(segment.intensity) {
        return None;
    }
    let color = match mode {
        ColorMode::Wavelength => wavelength_to_rgb(segment.wavelength_nm),
        ColorMode::Polarization => polarization_to_rgb(&segment.description),
    };
    Some(RenderableSegment {
        ray_id: segment.ray_id.clone(),
        start: segment.start,
        end: segment.end,
        color,
        opacity: opacity(segment.intensity),
        intensity: segment.intensity,
    })
}

/// Sensor glow: green when activated, orange when light arrives below the
/// activation threshold, dark otherwise.
pub fn to_renderable_sensor(reading: &SensorReading) -> RenderableSensor {
    let glow = if reading.activated {
        SENSOR_ACTIVE
    } else if reading.intensity > 0.0 {
        SENSOR_DIM
    } else {
        SENSOR_DARK
    };
    RenderableSensor {
        sensor_id: reading.sensor_id.clone(),
        glow,
        intensity: reading.intensity,
        activated: reading.activated,
    }
}

/// Every drawable segment of a world, in segment order.
pub fn renderable_segments(world: &WorldState, mode: ColorMode) -> Vec<RenderableSegment> {
    world
        .segments
        .iter()
        .filter_map(|s| to_renderable_segment(s, mode))
        .collect()
}

/// Every sensor of a world, in id order.
pub fn renderable_sensors(world: &WorldState) -> Vec<RenderableSensor> {
    world.sensor_readings.values().map(to_renderable_sensor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use polarcraft_core::polarization::{analyze, PolarizationState};
    use polarcraft_core::thresholds::RENDER_EPSILON;
    use polarcraft_core::types::SegmentEnd;
    use proptest::prelude::*;

    fn segment(intensity: f64) -> BeamSegmentState {
        let state = PolarizationState::linear(0.0, intensity);
        BeamSegmentState {
            index: 0,
            ray_id: RayId::root(0),
            source_id: "e1".into(),
            start: [0.0; 3],
            end: [10.0, 0.0, 0.0],
            direction: [1.0, 0.0, 0.0],
            intensity,
            stokes: state.to_stokes(),
            description: analyze(&state),
            wavelength_nm: 650.0,
            path_length: 10.0,
            parent_segment: None,
            termination: SegmentEnd::Escaped,
        }
    }

    fn reading(intensity: f64, activated: bool) -> SensorReading {
        let state = PolarizationState::linear(0.0, intensity);
        let description = analyze(&state);
        SensorReading {
            sensor_id: "s1".into(),
            intensity,
            stokes: state.to_stokes(),
            dop: description.dop,
            orientation_deg: description.orientation_deg,
            ellipticity_deg: description.ellipticity_deg,
            description,
            contributing_rays: Vec::new(),
            activated,
            failure_reasons: Vec::new(),
        }
    }

    #[test]
    fn test_opacity_follows_intensity() {
        let r = to_renderable_segment(&segment(0.5), ColorMode::Wavelength).unwrap();
        assert_abs_diff_eq!(r.opacity, 0.55, epsilon = 1e-12);
        let r = to_renderable_segment(&segment(3.0), ColorMode::Wavelength).unwrap();
        assert_abs_diff_eq!(r.opacity, 0.8, epsilon = 1e-12);
        assert_eq!(r.color, Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_polarization_mode_uses_description() {
        let r = to_renderable_segment(&segment(1.0), ColorMode::Polarization).unwrap();
        assert_eq!(r.color, Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_sensor_glow() {
        assert_eq!(to_renderable_sensor(&reading(0.8, true)).glow, SENSOR_ACTIVE);
        assert_eq!(to_renderable_sensor(&reading(0.01, false)).glow, SENSOR_DIM);
        assert_eq!(to_renderable_sensor(&reading(0.0, false)).glow, SENSOR_DARK);
    }

    proptest! {
        #[test]
        fn prop_nothing_drawn_below_threshold(offset in -1e-3f64..1e-3) {
            let intensity = (RENDER_EPSILON + offset).max(0.0);
            let rendered = to_renderable_segment(&segment(intensity), ColorMode::Polarization);
            prop_assert_eq!(rendered.is_some(), intensity >= RENDER_EPSILON);
        }

        #[test]
        fn prop_opacity_in_range(intensity in 0.0f64..10.0) {
            let o = opacity(intensity);
            prop_assert!((MIN_OPACITY..=MIN_OPACITY + OPACITY_SPAN).contains(&o));
        }
    }
}
