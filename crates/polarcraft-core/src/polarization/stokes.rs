//! Stokes vectors: the measurable description of a beam.
//!
//! $S_0$ is the total intensity, $S_1$ the horizontal/vertical preference,
//! $S_2$ the ±45° preference and $S_3$ the right/left circular preference.
//! A physically realizable vector satisfies $S_1^2 + S_2^2 + S_3^2 \le S_0^2$.

use std::ops::Add;

use serde::{Deserialize, Serialize};

use super::jones::JonesVector;

/// Relative slack allowed by [`StokesVector::is_physical`] for rounding.
const REALIZABILITY_SLACK: f64 = 1e-9;

/// Four-parameter Stokes description $(S_0, S_1, S_2, S_3)$.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StokesVector {
    pub s0: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl StokesVector {
    pub const fn new(s0: f64, s1: f64, s2: f64, s3: f64) -> Self {
        Self { s0, s1, s2, s3 }
    }

    /// Build a vector from external data, rejecting unrealizable input.
    pub fn checked(s0: f64, s1: f64, s2: f64, s3: f64) -> Option<Self> {
        let v = Self::new(s0, s1, s2, s3);
        v.is_physical().then_some(v)
    }

    /// Stokes parameters of a fully polarized Jones field.
    ///
    /// $S_0 = |E_x|^2 + |E_y|^2$, $S_1 = |E_x|^2 - |E_y|^2$,
    /// $S_2 = 2\,\mathrm{Re}(E_x E_y^*)$, $S_3 = 2\,\mathrm{Im}(E_x E_y^*)$.
    pub fn from_jones(field: &JonesVector) -> Self {
        let ex = field[0];
        let ey = field[1];
        let cross = ex * ey.conj();
        Self {
            s0: ex.norm_sqr() + ey.norm_sqr(),
            s1: ex.norm_sqr() - ey.norm_sqr(),
            s2: 2.0 * cross.re,
            s3: 2.0 * cross.im,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.s0, self.s1, self.s2, self.s3]
    }

    /// Intensity carried by the polarized part, $\sqrt{S_1^2 + S_2^2 + S_3^2}$.
    pub fn polarized_intensity(&self) -> f64 {
        (self.s1 * self.s1 + self.s2 * self.s2 + self.s3 * self.s3).sqrt()
    }

    /// Degree of polarization in [0, 1]; zero for a dark beam.
    pub fn dop(&self) -> f64 {
        if self.s0 <= 0.0 {
            return 0.0;
        }
        (self.polarized_intensity() / self.s0).clamp(0.0, 1.0)
    }

    /// Orientation $\psi = \tfrac12 \operatorname{atan2}(S_2, S_1)$ of the
    /// polarization ellipse, in degrees within [0, 180).
    pub fn orientation_deg(&self) -> f64 {
        if self.s1 == 0.0 && self.s2 == 0.0 {
            return 0.0;
        }
        let psi = (0.5 * self.s2.atan2(self.s1).to_degrees()).rem_euclid(180.0);
        if 180.0 - psi < 1e-9 {
            0.0
        } else {
            psi
        }
    }

    /// Ellipticity angle $\chi = \tfrac12 \arcsin(S_3 / |\mathbf{P}|)$ of the
    /// polarized part, in degrees within [-45, 45].
    pub fn ellipticity_deg(&self) -> f64 {
        let p = self.polarized_intensity();
        if p <= 0.0 {
            return 0.0;
        }
        0.5 * (self.s3 / p).clamp(-1.0, 1.0).asin().to_degrees()
    }

    /// Normalized Poincaré-sphere coordinates $(s_1, s_2, s_3)$; the distance
    /// from the origin equals the degree of polarization.
    pub fn poincare(&self) -> [f64; 3] {
        if self.s0 <= 0.0 {
            return [0.0; 3];
        }
        [self.s1 / self.s0, self.s2 / self.s0, self.s3 / self.s0]
    }

    /// Split into fully polarized and fully unpolarized parts that sum back to
    /// `self`.
    pub fn decompose(&self) -> (StokesVector, StokesVector) {
        let p = self.polarized_intensity().min(self.s0.max(0.0));
        (
            StokesVector::new(p, self.s1, self.s2, self.s3),
            StokesVector::new(self.s0 - p, 0.0, 0.0, 0.0),
        )
    }

    /// Non-negative intensity with a polarized part no larger than the total.
    pub fn is_physical(&self) -> bool {
        let finite = self.as_array().iter().all(|v| v.is_finite());
        finite
            && self.s0 >= 0.0
            && self.polarized_intensity() <= self.s0 * (1.0 + REALIZABILITY_SLACK) + f64::EPSILON
    }
}

impl Add for StokesVector {
    type Output = StokesVector;

    /// Incoherent superposition.
    fn add(self, rhs: StokesVector) -> StokesVector {
        StokesVector::new(
            self.s0 + rhs.s0,
            self.s1 + rhs.s1,
            self.s2 + rhs.s2,
            self.s3 + rhs.s3,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use num_complex::Complex64;

    #[test]
    fn test_horizontal_field() {
        let s = StokesVector::from_jones(&JonesVector::new(Complex64::from(1.0), Complex64::from(0.0)));
        assert_eq!(s.as_array(), [1.0, 1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(s.dop(), 1.0);
        assert_abs_diff_eq!(s.orientation_deg(), 0.0);
    }

    #[test]
    fn test_right_circular_has_positive_s3() {
        let h = std::f64::consts::FRAC_1_SQRT_2;
        let s = StokesVector::from_jones(&JonesVector::new(Complex64::new(h, 0.0), Complex64::new(0.0, -h)));
        assert_abs_diff_eq!(s.s3, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.ellipticity_deg(), 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_checked_rejects_overpolarized() {
        assert!(StokesVector::checked(1.0, 0.8, 0.8, 0.0).is_none());
        assert!(StokesVector::checked(-1.0, 0.0, 0.0, 0.0).is_none());
        assert!(StokesVector::checked(1.0, 0.6, 0.8, 0.0).is_some());
    }

    #[test]
    fn test_decompose_sums_back() {
        let s = StokesVector::new(1.0, 0.3, 0.0, 0.4);
        let (pol, unpol) = s.decompose();
        assert_abs_diff_eq!(pol.s0, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!((pol + unpol).s0, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pol.dop(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_orientation_wraps_into_half_turn() {
        let s = StokesVector::new(1.0, 0.0, -1.0, 0.0);
        assert_abs_diff_eq!(s.orientation_deg(), 135.0, epsilon = 1e-9);
    }
}
