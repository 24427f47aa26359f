//! Semantic classification of polarization states.
//!
//! [`analyze`] is a pure function of the state's Stokes vector. The decision
//! bands come from [`crate::thresholds`] so that labels are reproducible
//! across builds and golden-output tests stay portable.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::state::PolarizationState;
use super::stokes::StokesVector;
use crate::thresholds::{ANGLE_TOLERANCE_DEG, DOP_POLARIZED, DOP_UNPOLARIZED, ZERO_INTENSITY};

/// Coarse category of a polarization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolarizationCategory {
    Linear,
    Circular,
    Elliptical,
    Unpolarized,
    PartiallyPolarized,
    Zero,
}

impl PolarizationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Circular => "circular",
            Self::Elliptical => "elliptical",
            Self::Unpolarized => "unpolarized",
            Self::PartiallyPolarized => "partially-polarized",
            Self::Zero => "zero",
        }
    }
}

impl fmt::Display for PolarizationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rotation sense of the field vector. Right-handed light has $S_3 > 0$.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
    None,
}

impl Handedness {
    fn from_s3(s3: f64) -> Self {
        if s3 > 0.0 {
            Self::Right
        } else if s3 < 0.0 {
            Self::Left
        } else {
            Self::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::None => "none",
        }
    }
}

/// Derived, human-oriented description of a polarization state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDescription {
    pub category: PolarizationCategory,
    /// Orientation of the polarization ellipse, degrees in [0, 180).
    pub orientation_deg: f64,
    /// Ellipticity angle, degrees in [-45, 45].
    pub ellipticity_deg: f64,
    pub handedness: Handedness,
    /// Degree of polarization in [0, 1].
    pub dop: f64,
    pub label: String,
}

/// Classify a polarization state.
pub fn analyze(state: &PolarizationState) -> StateDescription {
    analyze_stokes(&state.to_stokes())
}

/// Classify a Stokes vector.
///
/// In order: near-zero intensity is `zero`; DOP below
/// [`DOP_UNPOLARIZED`] is `unpolarized`; DOP above [`DOP_POLARIZED`] is
/// `linear`, `circular` or `elliptical` depending on the ellipticity angle;
/// anything in between is `partially-polarized`.
pub fn analyze_stokes(stokes: &StokesVector) -> StateDescription {
    if stokes.s0 <= ZERO_INTENSITY {
        return StateDescription {
            category: PolarizationCategory::Zero,
            orientation_deg: 0.0,
            ellipticity_deg: 0.0,
            handedness: Handedness::None,
            dop: 0.0,
            label: "no light".into(),
        };
    }

    let dop = stokes.dop();
    let orientation = stokes.orientation_deg();
    let ellipticity = stokes.ellipticity_deg();
    let is_flat = ellipticity.abs() < ANGLE_TOLERANCE_DEG;
    let is_round = (ellipticity.abs() - 45.0).abs() < ANGLE_TOLERANCE_DEG;

    let (category, handedness, label) = if dop < DOP_UNPOLARIZED {
        (
            PolarizationCategory::Unpolarized,
            Handedness::None,
            "unpolarized".to_string(),
        )
    } else if dop > DOP_POLARIZED && is_flat {
        (
            PolarizationCategory::Linear,
            Handedness::None,
            format!("linear {:.1}°", orientation),
        )
    } else if dop > DOP_POLARIZED && is_round {
        let hand = Handedness::from_s3(stokes.s3);
        (
            PolarizationCategory::Circular,
            hand,
            format!("{} circular", hand.as_str()),
        )
    } else if dop > DOP_POLARIZED {
        let hand = Handedness::from_s3(stokes.s3);
        (
            PolarizationCategory::Elliptical,
            hand,
            format!(
                "{} elliptical {:.1}° (ellipticity {:.1}°)",
                hand.as_str(),
                orientation,
                ellipticity
            ),
        )
    } else {
        let hand = if is_flat {
            Handedness::None
        } else {
            Handedness::from_s3(stokes.s3)
        };
        (
            PolarizationCategory::PartiallyPolarized,
            hand,
            format!("partially polarized {:.0}% at {:.1}°", dop * 100.0, orientation),
        )
    };

    let (orientation_deg, ellipticity_deg) = match category {
        PolarizationCategory::Unpolarized => (0.0, 0.0),
        _ => (orientation, ellipticity),
    };

    StateDescription {
        category,
        orientation_deg,
        ellipticity_deg,
        handedness,
        dop,
        label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polarization::jones;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linear_classification() {
        let d = analyze(&PolarizationState::linear(30.0, 1.0));
        assert_eq!(d.category, PolarizationCategory::Linear);
        assert_abs_diff_eq!(d.orientation_deg, 30.0, epsilon = 1e-9);
        assert_eq!(d.handedness, Handedness::None);
        assert_eq!(d.label, "linear 30.0°");
    }

    #[test]
    fn test_circular_classification() {
        let right = analyze(&PolarizationState::circular(true, 1.0));
        assert_eq!(right.category, PolarizationCategory::Circular);
        assert_eq!(right.handedness, Handedness::Right);
        assert_eq!(right.label, "right circular");

        let left = analyze(&PolarizationState::circular(false, 1.0));
        assert_eq!(left.handedness, Handedness::Left);
    }

    #[test]
    fn test_elliptical_classification() {
        let state = PolarizationState::linear(30.0, 1.0).transform(&jones::retarder(60.0, 0.0));
        let d = analyze(&state);
        assert_eq!(d.category, PolarizationCategory::Elliptical);
        assert!(d.ellipticity_deg.abs() > 1.0 && d.ellipticity_deg.abs() < 44.0);
    }

    #[test]
    fn test_unpolarized_and_zero() {
        assert_eq!(
            analyze(&PolarizationState::unpolarized(1.0)).category,
            PolarizationCategory::Unpolarized
        );
        let zero = analyze(&PolarizationState::zero());
        assert_eq!(zero.category, PolarizationCategory::Zero);
        assert_eq!(zero.label, "no light");
    }

    #[test]
    fn test_partial_polarization() {
        let mix = PolarizationState::linear(0.0, 0.5).add(&PolarizationState::unpolarized(0.5));
        let d = analyze(&mix);
        assert_eq!(d.category, PolarizationCategory::PartiallyPolarized);
        assert_abs_diff_eq!(d.dop, 0.5, epsilon = 1e-12);
    }
}
