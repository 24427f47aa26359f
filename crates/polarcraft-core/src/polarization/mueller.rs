//! Mueller calculus: 4×4 real matrices acting on Stokes vectors.
//!
//! Mueller matrices describe every linear transformation of a beam,
//! depolarizing or not. The tracer itself propagates coherency matrices; the
//! Mueller form of each element is used to characterize it (diattenuation,
//! polarizance, depolarization) and to cross-check the coherency transforms.

use nalgebra::{Matrix4, Vector4};

use super::jones::cos_sin_deg;
use super::stokes::StokesVector;

/// A 4×4 Mueller matrix, $\mathbf{S}_{\text{out}} = \mathbf{M}\,\mathbf{S}_{\text{in}}$.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuellerMatrix(pub Matrix4<f64>);

impl MuellerMatrix {
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    /// Ideal linear polarizer with transmission axis at `axis_deg`.
    pub fn linear_polarizer(axis_deg: f64) -> Self {
        Self::horizontal_polarizer().rotated(axis_deg)
    }

    #[rustfmt::skip]
    fn horizontal_polarizer() -> Self {
        Self(
            Matrix4::new(
                1.0, 1.0, 0.0, 0.0,
                1.0, 1.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 0.0,
            ) * 0.5,
        )
    }

    /// Linear retarder with retardance `retardance_deg` and fast axis at
    /// `fast_axis_deg`. Uses the same handedness convention as
    /// [`jones::retarder`](super::jones::retarder).
    pub fn retarder(retardance_deg: f64, fast_axis_deg: f64) -> Self {
        Self::horizontal_retarder(retardance_deg).rotated(fast_axis_deg)
    }

    #[rustfmt::skip]
    fn horizontal_retarder(retardance_deg: f64) -> Self {
        let (cd, sd) = cos_sin_deg(retardance_deg);
        Self(Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, cd, -sd,
            0.0, 0.0, sd, cd,
        ))
    }

    /// Rotator turning the polarization plane by `angle_deg`.
    #[rustfmt::skip]
    pub fn rotator(angle_deg: f64) -> Self {
        let (c, s) = cos_sin_deg(2.0 * angle_deg);
        Self(Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c, -s, 0.0,
            0.0, s, c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// Neutral density: every Stokes parameter scaled by `transmittance`.
    pub fn attenuator(transmittance: f64) -> Self {
        Self(Matrix4::identity() * transmittance.clamp(0.0, 1.0))
    }

    /// The element rotated by `angle_deg` about the beam axis:
    /// $R(\alpha)\,\mathbf{M}\,R(-\alpha)$.
    pub fn rotated(&self, angle_deg: f64) -> Self {
        Self::rotator(-angle_deg)
            .then(self)
            .then(&Self::rotator(angle_deg))
    }

    /// Cascade: light passes through `self` first, then `next`.
    pub fn then(&self, next: &MuellerMatrix) -> Self {
        Self(next.0 * self.0)
    }

    pub fn apply(&self, stokes: &StokesVector) -> StokesVector {
        let out = self.0 * Vector4::new(stokes.s0, stokes.s1, stokes.s2, stokes.s3);
        StokesVector::new(out[0], out[1], out[2], out[3])
    }

    /// Diattenuation $D = \sqrt{M_{01}^2 + M_{02}^2 + M_{03}^2} / M_{00}$.
    pub fn diattenuation(&self) -> f64 {
        let m = &self.0;
        if m[(0, 0)] == 0.0 {
            return 0.0;
        }
        ((m[(0, 1)].powi(2) + m[(0, 2)].powi(2) + m[(0, 3)].powi(2)).sqrt() / m[(0, 0)]).min(1.0)
    }

    /// Polarizance $P = \sqrt{M_{10}^2 + M_{20}^2 + M_{30}^2} / M_{00}$.
    pub fn polarizance(&self) -> f64 {
        let m = &self.0;
        if m[(0, 0)] == 0.0 {
            return 0.0;
        }
        ((m[(1, 0)].powi(2) + m[(2, 0)].powi(2) + m[(3, 0)].powi(2)).sqrt() / m[(0, 0)]).min(1.0)
    }

    /// Depolarization index
    /// $\Delta = 1 - \sqrt{\mathrm{tr}(M^T M) - M_{00}^2} / (\sqrt{3}\,M_{00})$.
    pub fn depolarization_index(&self) -> f64 {
        let m = &self.0;
        let m00 = m[(0, 0)];
        if m00 == 0.0 {
            return 1.0;
        }
        let trace = (m.transpose() * m).trace();
        let numerator = (trace - m00 * m00).max(0.0).sqrt();
        (1.0 - numerator / (3.0_f64.sqrt() * m00)).clamp(0.0, 1.0)
    }
}
