//! Ray–scene intersection.
//!
//! Elements are thin and idealized: a ray meets an element (or a detection
//! point) when its line passes within the capture radius of the element's
//! centre, and the meeting point is the ray's closest approach to that centre.

use nalgebra::Vector3;

use super::TracerParams;
use crate::scene::Scene;
use crate::types::to_vector;

/// The first thing a ray runs into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Hit {
    Surface { index: usize, t: f64 },
    Detector { index: usize, t: f64 },
    Boundary { t: f64 },
}

impl Hit {
    pub(crate) fn distance(&self) -> f64 {
        match *self {
            Hit::Surface { t, .. } | Hit::Detector { t, .. } | Hit::Boundary { t } => t,
        }
    }
}

/// Distance along the ray to the closest approach to `centre`, and the
/// squared miss distance there.
pub(crate) fn closest_approach(
    origin: &Vector3<f64>,
    direction: &Vector3<f64>,
    centre: &Vector3<f64>,
) -> (f64, f64) {
    let to_centre = centre - origin;
    let t = to_centre.dot(direction);
    let miss_sq = (to_centre - direction * t).norm_squared();
    (t, miss_sq)
}

/// Distance along the ray to where it leaves the sphere of `radius` about the
/// origin; zero when it starts outside.
pub(crate) fn boundary_exit(origin: &Vector3<f64>, direction: &Vector3<f64>, radius: f64) -> f64 {
    let c = origin.norm_squared() - radius * radius;
    if c >= 0.0 {
        return 0.0;
    }
    let b = origin.dot(direction);
    -b + (b * b - c).sqrt()
}

/// Find the nearest hit ahead of the ray. Ties resolve to the lower index,
/// surfaces before detectors, so the result never depends on anything but the
/// scene order.
pub(crate) fn nearest_hit(
    scene: &Scene,
    origin: &Vector3<f64>,
    direction: &Vector3<f64>,
    params: &TracerParams,
    skip_surface: Option<usize>,
) -> Hit {
    let exit = boundary_exit(origin, direction, params.scene_boundary);
    let mut best = Hit::Boundary { t: exit };

    let aperture_sq = params.surface_aperture * params.surface_aperture;
    for (index, surface) in scene.surfaces().iter().enumerate() {
        if skip_surface == Some(index) {
            continue;
        }
        let (t, miss_sq) = closest_approach(origin, direction, &to_vector(&surface.position));
        if t > params.step_size && miss_sq <= aperture_sq && t < best.distance() {
            best = Hit::Surface { index, t };
        }
    }

    let radius_sq = params.detector_radius * params.detector_radius;
    for (index, detector) in scene.detectors().iter().enumerate() {
        let (t, miss_sq) = closest_approach(origin, direction, &to_vector(&detector.position));
        if t > params.step_size && miss_sq <= radius_sq && t < best.distance() {
            best = Hit::Detector { index, t };
        }
    }

    best
}
