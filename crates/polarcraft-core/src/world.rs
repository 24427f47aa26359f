//! The immutable per-tick snapshot produced by the simulation engine.
//!
//! A [`WorldState`] is the only thing downstream consumers see. It is built
//! once, returned by value and never mutated; the next tick produces a new
//! one with a higher version.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::polarization::{StateDescription, StokesVector};
use crate::scene_graph::SceneNode;
use crate::tracer::intersect::closest_approach;
use crate::types::{to_vector, ElementKind, Point3, RayId, SegmentEnd};

/// A visible beam segment, enriched for rendering and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamSegmentState {
    /// Index of the trace segment this was built from.
    pub index: usize,
    pub ray_id: RayId,
    pub source_id: String,
    pub start: Point3,
    pub end: Point3,
    pub direction: Point3,
    pub intensity: f64,
    pub stokes: StokesVector,
    pub description: StateDescription,
    pub wavelength_nm: f64,
    /// Geometric distance from the emitter to `end`.
    pub path_length: f64,
    pub parent_segment: Option<usize>,
    pub termination: SegmentEnd,
}

/// What a sensor measured this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    pub intensity: f64,
    pub stokes: StokesVector,
    pub dop: f64,
    pub orientation_deg: f64,
    pub ellipticity_deg: f64,
    pub description: StateDescription,
    /// Ray ids whose segments reached the sensor, in trace order.
    pub contributing_rays: Vec<RayId>,
    pub activated: bool,
    /// Why the sensor is not activated; empty when it is.
    pub failure_reasons: Vec<String>,
}

/// What one optical element did to one ray.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub element_id: String,
    pub element_type: ElementKind,
    pub ray_id: RayId,
    /// Where the ray met the element.
    pub position: Point3,
    /// Direction the ray was travelling when it arrived.
    pub incident_direction: Point3,
    pub input: StateDescription,
    pub output: StateDescription,
    /// The e-ray of a splitter.
    pub secondary_output: Option<StateDescription>,
    /// Total output intensity over input intensity.
    pub transmittance: f64,
    /// The physical law that explains the transform.
    pub law: String,
    /// Diattenuation of the element's Mueller matrix.
    pub diattenuation: f64,
    pub polarizance: f64,
    pub depolarization_index: f64,
    pub energy_conserved: bool,
}

/// Snapshot of the simulated world after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub version: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub segments: Vec<BeamSegmentState>,
    pub sensor_readings: BTreeMap<String, SensorReading>,
    pub interactions: Vec<InteractionRecord>,
    pub nodes: Vec<SceneNode>,
    pub total_input_energy: f64,
    pub total_output_energy: f64,
    pub energy_conserved: bool,
    pub simulation_complete: bool,
    pub iterations: usize,
    /// Capture radius the sensor readings were taken with.
    pub sensor_radius: f64,
}

impl InteractionRecord {
    /// Whether the incident ray, continued straight past the element, would
    /// have passed within `radius` of `target`.
    pub fn aims_at(&self, target: &Point3, radius: f64) -> bool {
        let direction = to_vector(&self.incident_direction);
        if direction.norm() == 0.0 {
            return false;
        }
        let (t, miss_sq) = closest_approach(
            &to_vector(&self.position),
            &direction.normalize(),
            &to_vector(target),
        );
        t > 0.0 && miss_sq <= radius * radius
    }
}

impl WorldState {
    pub fn reading(&self, sensor_id: &str) -> Option<&SensorReading> {
        self.sensor_readings.get(sensor_id)
    }

    /// Readings of sensors that are not activated, in id order.
    pub fn inactive_sensors(&self) -> impl Iterator<Item = &SensorReading> {
        self.sensor_readings.values().filter(|r| !r.activated)
    }

    pub fn node(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polarization::{analyze, PolarizationState};

    fn record(position: Point3, incident_direction: Point3) -> InteractionRecord {
        let dark = analyze(&PolarizationState::zero());
        InteractionRecord {
            element_id: "p".into(),
            element_type: ElementKind::Polarizer,
            ray_id: RayId::root(0),
            position,
            incident_direction,
            input: analyze(&PolarizationState::linear(0.0, 1.0)),
            output: dark,
            secondary_output: None,
            transmittance: 0.0,
            law: String::new(),
            diattenuation: 1.0,
            polarizance: 1.0,
            depolarization_index: 0.0,
            energy_conserved: true,
        }
    }

    #[test]
    fn test_aims_at_targets_ahead_on_the_beam_line() {
        let r = record([20.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert!(r.aims_at(&[40.0, 1.5, 0.0], 2.0));
        assert!(!r.aims_at(&[40.0, 5.0, 0.0], 2.0));
        assert!(!r.aims_at(&[0.0, 0.0, 0.0], 2.0));
        assert!(!r.aims_at(&[0.0, 300.0, 0.0], 2.0));
        assert!(!record([20.0, 0.0, 0.0], [0.0; 3]).aims_at(&[40.0, 0.0, 0.0], 2.0));
    }
}
