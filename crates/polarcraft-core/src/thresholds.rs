//! Numerical thresholds shared by the simulation loop, the classifier and the
//! downstream consumers of a world state.
//!
//! These values are part of the output contract: golden-output tests compare
//! labels and filtered segment lists, so they are constants rather than
//! per-engine knobs.

/// Segments dimmer than this are never materialized into a world state and
/// never rendered.
pub const RENDER_EPSILON: f64 = 0.01;

/// Degree of polarization above which a state counts as fully polarized.
pub const DOP_POLARIZED: f64 = 0.99;

/// Degree of polarization below which a state counts as unpolarized.
pub const DOP_UNPOLARIZED: f64 = 0.01;

/// Tolerance (degrees) for "ellipticity ≈ 0" and "|ellipticity| ≈ 45°".
pub const ANGLE_TOLERANCE_DEG: f64 = 1.0;

/// Intensities at or below this are classified as no light at all.
pub const ZERO_INTENSITY: f64 = 1e-12;

/// Relative intensity below which a surface output is snapped to exactly
/// zero, so that fully blocking elements report a transmittance of 0.
pub const BLOCKING_RATIO: f64 = 1e-12;

/// Returns `true` when a segment of the given intensity may be materialized
/// and drawn.
pub fn is_visible(intensity: f64) -> bool {
    intensity >= RENDER_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_boundary() {
        assert!(is_visible(RENDER_EPSILON));
        assert!(!is_visible(RENDER_EPSILON - 1e-12));
        assert!(!is_visible(0.0));
    }

    #[test]
    fn test_classifier_bands_do_not_overlap() {
        assert!(DOP_UNPOLARIZED < DOP_POLARIZED);
        assert!(ZERO_INTENSITY < RENDER_EPSILON);
    }
}
