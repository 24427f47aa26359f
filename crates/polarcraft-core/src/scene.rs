//! The scene a tracer propagates light through.

use serde::{Deserialize, Serialize};

use crate::surface::OpticalSurface;
use crate::types::Point3;

/// A passive detection point. Rays passing close enough are absorbed there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionPoint {
    pub id: String,
    pub position: Point3,
}

/// Ordered optical surfaces, detection points and the ambient transmittance
/// applied to light that leaves the scene without hitting anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    surfaces: Vec<OpticalSurface>,
    detectors: Vec<DetectionPoint>,
    ambient_transmittance: f64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Vec::new(), 1.0)
    }
}

impl Scene {
    pub fn new(surfaces: Vec<OpticalSurface>, ambient_transmittance: f64) -> Self {
        Self {
            surfaces,
            detectors: Vec::new(),
            ambient_transmittance: ambient_transmittance.clamp(0.0, 1.0),
        }
    }

    pub fn with_detectors(mut self, detectors: Vec<DetectionPoint>) -> Self {
        self.detectors = detectors;
        self
    }

    pub fn surfaces(&self) -> &[OpticalSurface] {
        &self.surfaces
    }

    pub fn surface(&self, index: usize) -> Option<&OpticalSurface> {
        self.surfaces.get(index)
    }

    pub fn detectors(&self) -> &[DetectionPoint] {
        &self.detectors
    }

    pub fn ambient_transmittance(&self) -> f64 {
        self.ambient_transmittance
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty() && self.detectors.is_empty()
    }
}
