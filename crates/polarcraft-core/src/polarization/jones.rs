//! Jones matrices for ideal, non-depolarizing elements.
//!
//! All angles are in degrees and measured in the lab frame of the scene plane.
//! A rotation by $\theta$ is $R(\theta) = \begin{pmatrix} c & -s \\ s & c \end{pmatrix}$.

use nalgebra::{Matrix2, Vector2};
use num_complex::Complex64;

/// A two-component complex field amplitude $(E_x, E_y)$.
pub type JonesVector = Vector2<Complex64>;

/// A 2×2 complex transfer matrix acting on [`JonesVector`]s.
pub type JonesMatrix = Matrix2<Complex64>;

/// Cosine and sine of an angle in degrees, exact at multiples of 90°.
///
/// Crossed elements must block exactly, which `f64::cos(π/2)` does not.
pub fn cos_sin_deg(angle_deg: f64) -> (f64, f64) {
    let reduced = angle_deg.rem_euclid(360.0);
    if reduced == 0.0 {
        (1.0, 0.0)
    } else if reduced == 90.0 {
        (0.0, 1.0)
    } else if reduced == 180.0 {
        (-1.0, 0.0)
    } else if reduced == 270.0 {
        (0.0, -1.0)
    } else {
        let rad = reduced.to_radians();
        (rad.cos(), rad.sin())
    }
}

fn real(m: [[f64; 2]; 2]) -> JonesMatrix {
    JonesMatrix::new(
        Complex64::from(m[0][0]),
        Complex64::from(m[0][1]),
        Complex64::from(m[1][0]),
        Complex64::from(m[1][1]),
    )
}

/// Unit field linearly polarized at `angle_deg`.
pub fn linear_field(angle_deg: f64) -> JonesVector {
    let (c, s) = cos_sin_deg(angle_deg);
    JonesVector::new(Complex64::from(c), Complex64::from(s))
}

/// Projector onto the linear axis at `axis_deg`: an ideal polarizer.
pub fn projector(axis_deg: f64) -> JonesMatrix {
    let (c, s) = cos_sin_deg(axis_deg);
    real([[c * c, c * s], [c * s, s * s]])
}

/// Rotation of the polarization plane by `angle_deg`.
pub fn rotation(angle_deg: f64) -> JonesMatrix {
    let (c, s) = cos_sin_deg(angle_deg);
    real([[c, -s], [s, c]])
}

/// Linear retarder with retardance `retardance_deg` and fast axis at
/// `fast_axis_deg`.
///
/// The component along the fast axis is untouched; the slow component lags by
/// $e^{-i\delta}$. The matrix is $R(\theta)\,\mathrm{diag}(1, e^{-i\delta})\,R(-\theta)$.
pub fn retarder(retardance_deg: f64, fast_axis_deg: f64) -> JonesMatrix {
    let (cd, sd) = cos_sin_deg(retardance_deg);
    let lag = Complex64::new(cd, -sd);
    let diagonal = JonesMatrix::new(
        Complex64::from(1.0),
        Complex64::from(0.0),
        Complex64::from(0.0),
        lag,
    );
    rotation(fast_axis_deg) * diagonal * rotation(-fast_axis_deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_cos_sin_exact_at_right_angles() {
        assert_eq!(cos_sin_deg(90.0), (0.0, 1.0));
        assert_eq!(cos_sin_deg(-90.0), (0.0, -1.0));
        assert_eq!(cos_sin_deg(450.0), (0.0, 1.0));
    }

    #[test]
    fn test_projector_is_idempotent() {
        let p = projector(30.0);
        let pp = p * p;
        for i in 0..2 {
            for j in 0..2 {
                assert_abs_diff_eq!(pp[(i, j)].re, p[(i, j)].re, epsilon = 1e-12);
                assert_abs_diff_eq!(pp[(i, j)].im, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_half_wave_plate_mirrors_linear_axis() {
        // λ/2 with fast axis at 22.5° turns 0° into 45°.
        let out = retarder(180.0, 22.5) * linear_field(0.0);
        let expected = linear_field(45.0);
        assert_abs_diff_eq!(out[0].norm(), expected[0].norm(), epsilon = 1e-12);
        assert_abs_diff_eq!(out[1].norm(), expected[1].norm(), epsilon = 1e-12);
    }
}
