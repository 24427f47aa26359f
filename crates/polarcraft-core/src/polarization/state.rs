//! The coherency-matrix polarization state.

use nalgebra::Matrix2;
use num_complex::Complex64;
use serde::Serialize;

use super::jones::{self, JonesMatrix, JonesVector};
use super::stokes::StokesVector;

/// Coherency matrix $\mathbf{J} = \langle \mathbf{E}\mathbf{E}^\dagger \rangle$ of a beam.
///
/// The matrix is Hermitian and positive semi-definite, so the derived Stokes
/// vector always satisfies $S_0 \ge 0$ and $|\mathbf{P}| \le S_0$.
///
/// When the light is a single coherent field (every state built from a Jones
/// vector, and everything derived from it by [`transform`](Self::transform) or
/// [`scale`](Self::scale)) the field itself is kept as well, which is what lets
/// [`add_coherent`](Self::add_coherent) sum amplitudes instead of intensities.
///
/// Serializes as its Stokes vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "StokesVector")]
pub struct PolarizationState {
    coherency: Matrix2<Complex64>,
    field: Option<JonesVector>,
}

impl PolarizationState {
    /// The dark state. All zero-intensity states compare equal to it.
    pub fn zero() -> Self {
        Self {
            coherency: Matrix2::zeros(),
            field: None,
        }
    }

    /// Fully coherent state carrying the given Jones field.
    pub fn from_jones(field: JonesVector) -> Self {
        if field.iter().all(|c| c.norm_sqr() == 0.0) {
            return Self::zero();
        }
        Self {
            coherency: field * field.adjoint(),
            field: Some(field),
        }
    }

    /// Linear polarization at `angle_deg` with the given intensity.
    pub fn linear(angle_deg: f64, intensity: f64) -> Self {
        Self::from_jones(jones::linear_field(angle_deg) * Complex64::from(intensity.max(0.0).sqrt()))
    }

    /// Circular polarization; right-handed light has $S_3 > 0$.
    pub fn circular(right_handed: bool, intensity: f64) -> Self {
        let a = (intensity.max(0.0) / 2.0).sqrt();
        let ey = if right_handed {
            Complex64::new(0.0, -a)
        } else {
            Complex64::new(0.0, a)
        };
        Self::from_jones(JonesVector::new(Complex64::from(a), ey))
    }

    /// Natural (unpolarized) light: $\mathbf{J} = \tfrac{I}{2}\mathbf{1}$.
    pub fn unpolarized(intensity: f64) -> Self {
        if intensity <= 0.0 {
            return Self::zero();
        }
        Self {
            coherency: Matrix2::identity() * Complex64::from(intensity / 2.0),
            field: None,
        }
    }

    /// Partially coherent state from an externally supplied Stokes vector.
    ///
    /// Returns `None` for vectors that no physical beam can have.
    pub fn from_stokes(stokes: &StokesVector) -> Option<Self> {
        if !stokes.is_physical() {
            return None;
        }
        if stokes.s0 == 0.0 {
            return Some(Self::zero());
        }
        let jxx = Complex64::from(0.5 * (stokes.s0 + stokes.s1));
        let jyy = Complex64::from(0.5 * (stokes.s0 - stokes.s1));
        let jxy = Complex64::new(0.5 * stokes.s2, 0.5 * stokes.s3);
        Some(Self {
            coherency: Matrix2::new(jxx, jxy, jxy.conj(), jyy),
            field: None,
        })
    }

    pub fn coherency(&self) -> &Matrix2<Complex64> {
        &self.coherency
    }

    /// The Jones field, if this state is a single coherent field.
    pub fn field(&self) -> Option<&JonesVector> {
        self.field.as_ref()
    }

    /// Total intensity $S_0 = \mathrm{Tr}\,\mathbf{J}$.
    pub fn intensity(&self) -> f64 {
        (self.coherency[(0, 0)].re + self.coherency[(1, 1)].re).max(0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.intensity() == 0.0
    }

    pub fn to_stokes(&self) -> StokesVector {
        let jxx = self.coherency[(0, 0)].re;
        let jyy = self.coherency[(1, 1)].re;
        let jxy = self.coherency[(0, 1)];
        StokesVector::new(jxx + jyy, jxx - jyy, 2.0 * jxy.re, 2.0 * jxy.im)
    }

    /// Apply a Jones transfer matrix: $\mathbf{J}' = M \mathbf{J} M^\dagger$.
    pub fn transform(&self, m: &JonesMatrix) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let coherency = m * self.coherency * m.adjoint();
        if coherency.iter().all(|c| c.norm_sqr() == 0.0) {
            return Self::zero();
        }
        let field = match self.field {
            Some(e) => Some(m * e),
            None => pure_field(&coherency),
        };
        Self { coherency, field }
    }

    /// Scale the intensity by `factor` without changing the state's shape.
    pub fn scale(&self, factor: f64) -> Self {
        let factor = factor.max(0.0);
        if factor == 0.0 || self.is_zero() {
            return Self::zero();
        }
        Self {
            coherency: self.coherency * Complex64::from(factor),
            field: self.field.map(|e| e * Complex64::from(factor.sqrt())),
        }
    }

    /// Replace the state by [`zero`](Self::zero) when it carries less than
    /// `ratio` of `reference` intensity.
    pub fn snap_below(self, reference: f64, ratio: f64) -> Self {
        if self.intensity() <= reference * ratio {
            Self::zero()
        } else {
            self
        }
    }

    /// Incoherent superposition: coherency matrices add, so intensities add
    /// and no interference term appears. Models light from distinct sources.
    pub fn add(&self, other: &Self) -> Self {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }
        Self {
            coherency: self.coherency + other.coherency,
            field: None,
        }
    }

    /// Coherent superposition: when both states are single coherent fields
    /// the amplitudes add, $\mathbf{E} = \mathbf{E}_1 + \mathbf{E}_2$, so the
    /// result can be brighter or darker than the sum of intensities. Falls
    /// back to [`add`](Self::add) when either state has lost its phase.
    pub fn add_coherent(&self, other: &Self) -> Self {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }
        match (self.field, other.field) {
            (Some(a), Some(b)) => Self::from_jones(a + b),
            _ => self.add(other),
        }
    }
}

/// Relative size of $\det\mathbf{J}$ below which a coherency matrix counts
/// as rank one, i.e. fully polarized.
const RANK_ONE_TOLERANCE: f64 = 1e-9;

/// A Jones field reproducing a rank-one coherency matrix, with the larger
/// diagonal component taken real and positive. `None` for partially polarized
/// light.
fn pure_field(coherency: &Matrix2<Complex64>) -> Option<JonesVector> {
    let jxx = coherency[(0, 0)].re;
    let jyy = coherency[(1, 1)].re;
    let trace = jxx + jyy;
    if trace <= 0.0 {
        return None;
    }
    let det = jxx * jyy - coherency[(0, 1)].norm_sqr();
    if det.abs() > RANK_ONE_TOLERANCE * trace * trace {
        return None;
    }
    // J = E E†, so J_yx = Ey Ex* and J_xy = Ex Ey*.
    let field = if jxx >= jyy {
        let ex = jxx.sqrt();
        JonesVector::new(Complex64::from(ex), coherency[(1, 0)] / ex)
    } else {
        let ey = jyy.sqrt();
        JonesVector::new(coherency[(0, 1)] / ey, Complex64::from(ey))
    };
    Some(field)
}

impl From<PolarizationState> for StokesVector {
    fn from(state: PolarizationState) -> Self {
        state.to_stokes()
    }
}
