//! Optical surface models.
//!
//! Every element the tracer can hit is an [`OpticalSurface`]: a position in
//! the scene plus one of the closed set of [`SurfaceKind`]s. Each kind maps an
//! incident [`PolarizationState`] to one outgoing ray, or two for splitters,
//! and reproduces one physical law exactly:
//!
//! | Kind | Law |
//! |------|-----|
//! | Polarizer | Malus's law, $I = I_0 \cos^2\theta$ |
//! | Wave plate | Relative phase $\delta$ between fast and slow axes |
//! | Mirror | Law of reflection, lossless |
//! | Rotator | Rotation of the polarization plane |
//! | Splitter | Orthogonal projection into o- and e-rays |
//! | Attenuator | Beer–Lambert loss, $I = T I_0$ |

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::polarization::{jones, MuellerMatrix, PolarizationState};
use crate::thresholds::BLOCKING_RATIO;
use crate::types::{to_vector, ElementKind, Point3};

/// How a splitter separates its two outputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SplitKind {
    /// Polarizing beam splitter: the e-ray is deflected by +90° in the scene
    /// plane.
    Pbs,
    /// Birefringent crystal: both rays continue parallel, the e-ray displaced
    /// sideways by `walk_off` scene units.
    Calcite { walk_off: f64 },
}

/// The element model behind a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SurfaceKind {
    Polarizer { axis_deg: f64 },
    Waveplate { retardance_deg: f64, fast_axis_deg: f64 },
    Mirror,
    Rotator { angle_deg: f64 },
    Splitter { split: SplitKind, axis_deg: f64 },
    Attenuator { factor: f64 },
}

/// An optical element the tracer can intersect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticalSurface {
    /// Id of the scene node this surface was built from.
    pub id: String,
    pub position: Point3,
    /// Surface normal; only mirrors use it to redirect light.
    pub normal: Point3,
    pub kind: SurfaceKind,
}

/// One ray leaving a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub state: PolarizationState,
    /// Unit propagation direction.
    pub direction: Vector3<f64>,
    /// Displacement of the ray's origin from the hit point.
    pub offset: Vector3<f64>,
}

impl Outgoing {
    fn straight(state: PolarizationState, direction: &Vector3<f64>) -> Self {
        Self {
            state,
            direction: *direction,
            offset: Vector3::zeros(),
        }
    }
}

/// The result of a ray meeting a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceResponse {
    Single(Outgoing),
    /// The o-ray continues the incident ray; the e-ray becomes a child ray.
    Split { ordinary: Outgoing, extraordinary: Outgoing },
}

impl SurfaceResponse {
    pub fn outputs(&self) -> Vec<&Outgoing> {
        match self {
            Self::Single(out) => vec![out],
            Self::Split { ordinary, extraordinary } => vec![ordinary, extraordinary],
        }
    }
}

/// Rotate a direction by +90° about the scene normal (z).
fn perpendicular(direction: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(-direction.y, direction.x, direction.z)
}

impl OpticalSurface {
    pub fn element_kind(&self) -> ElementKind {
        match self.kind {
            SurfaceKind::Polarizer { .. } => ElementKind::Polarizer,
            SurfaceKind::Waveplate { .. } => ElementKind::Waveplate,
            SurfaceKind::Mirror => ElementKind::Mirror,
            SurfaceKind::Rotator { .. } => ElementKind::Rotator,
            SurfaceKind::Splitter { .. } => ElementKind::Splitter,
            SurfaceKind::Attenuator { .. } => ElementKind::Attenuator,
        }
    }

    /// Transform an incident ray travelling along `direction` (unit vector).
    pub fn interact(&self, state: &PolarizationState, direction: &Vector3<f64>) -> SurfaceResponse {
        let incident = state.intensity();
        match &self.kind {
            SurfaceKind::Polarizer { axis_deg } => {
                let out = state
                    .transform(&jones::projector(*axis_deg))
                    .snap_below(incident, BLOCKING_RATIO);
                SurfaceResponse::Single(Outgoing::straight(out, direction))
            }
            SurfaceKind::Waveplate {
                retardance_deg,
                fast_axis_deg,
            } => {
                let out = state.transform(&jones::retarder(*retardance_deg, *fast_axis_deg));
                SurfaceResponse::Single(Outgoing::straight(out, direction))
            }
            SurfaceKind::Mirror => {
                let n = to_vector(&self.normal);
                let n = if n.norm() > 0.0 { n.normalize() } else { -*direction };
                let reflected = direction - 2.0 * direction.dot(&n) * n;
                SurfaceResponse::Single(Outgoing::straight(state.clone(), &reflected))
            }
            SurfaceKind::Rotator { angle_deg } => {
                let out = state.transform(&jones::rotation(*angle_deg));
                SurfaceResponse::Single(Outgoing::straight(out, direction))
            }
            SurfaceKind::Splitter { split, axis_deg } => {
                let o = state
                    .transform(&jones::projector(*axis_deg))
                    .snap_below(incident, BLOCKING_RATIO);
                let e = state
                    .transform(&jones::projector(*axis_deg + 90.0))
                    .snap_below(incident, BLOCKING_RATIO);
                let extraordinary = match split {
                    SplitKind::Pbs => Outgoing::straight(e, &perpendicular(direction)),
                    SplitKind::Calcite { walk_off } => Outgoing {
                        state: e,
                        direction: *direction,
                        offset: perpendicular(direction) * *walk_off,
                    },
                };
                SurfaceResponse::Split {
                    ordinary: Outgoing::straight(o, direction),
                    extraordinary,
                }
            }
            SurfaceKind::Attenuator { factor } => {
                let out = state.scale(factor.clamp(0.0, 1.0));
                SurfaceResponse::Single(Outgoing::straight(out, direction))
            }
        }
    }

    /// Mueller matrix of the element. For splitters this is the o-ray branch.
    pub fn mueller(&self) -> MuellerMatrix {
        match &self.kind {
            SurfaceKind::Polarizer { axis_deg } => MuellerMatrix::linear_polarizer(*axis_deg),
            SurfaceKind::Waveplate {
                retardance_deg,
                fast_axis_deg,
            } => MuellerMatrix::retarder(*retardance_deg, *fast_axis_deg),
            SurfaceKind::Mirror => MuellerMatrix::identity(),
            SurfaceKind::Rotator { angle_deg } => MuellerMatrix::rotator(*angle_deg),
            SurfaceKind::Splitter { axis_deg, .. } => MuellerMatrix::linear_polarizer(*axis_deg),
            SurfaceKind::Attenuator { factor } => MuellerMatrix::attenuator(*factor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polarization::{analyze, PolarizationCategory};
    use approx::assert_abs_diff_eq;

    fn surface(kind: SurfaceKind) -> OpticalSurface {
        OpticalSurface {
            id: "s".into(),
            position: [0.0; 3],
            normal: [1.0, 0.0, 0.0],
            kind,
        }
    }

    fn single(response: SurfaceResponse) -> Outgoing {
        match response {
            SurfaceResponse::Single(out) => out,
            SurfaceResponse::Split { .. } => panic!("expected a single output"),
        }
    }

    fn east() -> Vector3<f64> {
        Vector3::new(1.0, 0.0, 0.0)
    }

    #[test]
    fn test_polarizer_follows_malus_law() {
        let p = surface(SurfaceKind::Polarizer { axis_deg: 60.0 });
        let out = single(p.interact(&PolarizationState::linear(0.0, 1.0), &east()));
        assert_abs_diff_eq!(out.state.intensity(), 0.25, epsilon = 1e-12);
        let d = analyze(&out.state);
        assert_eq!(d.category, PolarizationCategory::Linear);
        assert_abs_diff_eq!(d.orientation_deg, 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_crossed_polarizer_blocks_exactly() {
        let p = surface(SurfaceKind::Polarizer { axis_deg: 90.0 });
        let out = single(p.interact(&PolarizationState::linear(0.0, 1.0), &east()));
        assert!(out.state.is_zero());
    }

    #[test]
    fn test_polarizer_halves_unpolarized_light() {
        let p = surface(SurfaceKind::Polarizer { axis_deg: 20.0 });
        let out = single(p.interact(&PolarizationState::unpolarized(1.0), &east()));
        assert_abs_diff_eq!(out.state.intensity(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_mirror_reflects_about_normal() {
        let m = surface(SurfaceKind::Mirror);
        let m = OpticalSurface {
            normal: [-std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2, 0.0],
            ..m
        };
        let state = PolarizationState::linear(10.0, 0.8);
        let out = single(m.interact(&state, &east()));
        assert_abs_diff_eq!(out.direction.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.direction.y, 1.0, epsilon = 1e-12);
        assert_eq!(out.state, state);
    }

    #[test]
    fn test_rotator_and_attenuator() {
        let r = surface(SurfaceKind::Rotator { angle_deg: 30.0 });
        let out = single(r.interact(&PolarizationState::linear(15.0, 1.0), &east()));
        assert_abs_diff_eq!(analyze(&out.state).orientation_deg, 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out.state.intensity(), 1.0, epsilon = 1e-12);

        let a = surface(SurfaceKind::Attenuator { factor: 0.3 });
        let out = single(a.interact(&PolarizationState::circular(false, 1.0), &east()));
        assert_abs_diff_eq!(out.state.intensity(), 0.3, epsilon = 1e-12);
        assert_eq!(analyze(&out.state).category, PolarizationCategory::Circular);
    }

    #[test]
    fn test_pbs_deflects_extraordinary_ray() {
        let s = surface(SurfaceKind::Splitter {
            split: SplitKind::Pbs,
            axis_deg: 0.0,
        });
        match s.interact(&PolarizationState::linear(30.0, 1.0), &east()) {
            SurfaceResponse::Split { ordinary, extraordinary } => {
                assert_abs_diff_eq!(ordinary.state.intensity(), 0.75, epsilon = 1e-12);
                assert_abs_diff_eq!(extraordinary.state.intensity(), 0.25, epsilon = 1e-12);
                assert_abs_diff_eq!(extraordinary.direction.y, 1.0, epsilon = 1e-12);
            }
            SurfaceResponse::Single(_) => panic!("splitter must split"),
        }
    }

    #[test]
    fn test_calcite_displaces_extraordinary_ray() {
        let s = surface(SurfaceKind::Splitter {
            split: SplitKind::Calcite { walk_off: 4.0 },
            axis_deg: 0.0,
        });
        match s.interact(&PolarizationState::unpolarized(1.0), &east()) {
            SurfaceResponse::Split { extraordinary, .. } => {
                assert_eq!(extraordinary.direction, east());
                assert_abs_diff_eq!(extraordinary.offset.y, 4.0, epsilon = 1e-12);
            }
            SurfaceResponse::Single(_) => panic!("splitter must split"),
        }
    }

    #[test]
    fn test_coherency_and_mueller_transforms_agree() {
        let input = PolarizationState::linear(25.0, 1.0).add(&PolarizationState::unpolarized(0.4));
        let kinds = [
            SurfaceKind::Polarizer { axis_deg: 70.0 },
            SurfaceKind::Waveplate { retardance_deg: 90.0, fast_axis_deg: 10.0 },
            SurfaceKind::Rotator { angle_deg: -35.0 },
            SurfaceKind::Attenuator { factor: 0.6 },
        ];
        for kind in kinds {
            let s = surface(kind);
            let via_jones = single(s.interact(&input, &east())).state.to_stokes();
            let via_mueller = s.mueller().apply(&input.to_stokes());
            for (a, b) in via_jones.as_array().iter().zip(via_mueller.as_array().iter()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-12);
            }
        }
    }
}
