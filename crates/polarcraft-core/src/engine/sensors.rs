//! Sensor readings from a finished trace.
//!
//! Light from one emitter is a single coherent field, so contributions from
//! the same source are summed as amplitudes before the intensity is read.
//! Different emitters never interfere: their combined states add as
//! coherency matrices.

use std::collections::BTreeMap;

use log::debug;

use crate::config::EngineConfig;
use crate::polarization::{analyze, PolarizationState};
use crate::scene::DetectionPoint;
use crate::types::{distance, RayId, RaySegment, SegmentEnd};
use crate::world::SensorReading;

/// Failure reason for a sensor no segment reached.
pub const NO_LIGHT: &str = "no light reached this sensor";

/// Combines the segments arriving at each sensor into a reading.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorAggregator {
    radius: f64,
    activation_threshold: f64,
}

impl SensorAggregator {
    pub fn new(radius: f64, activation_threshold: f64) -> Self {
        Self {
            radius,
            activation_threshold,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.sensor_radius, config.activation_threshold)
    }

    /// Segments absorbed by the detector at `index`.
    pub fn arriving<'a>(
        &self,
        index: usize,
        detector: &DetectionPoint,
        segments: &'a [RaySegment],
    ) -> Vec<&'a RaySegment> {
        segments
            .iter()
            .filter(|s| {
                s.termination == SegmentEnd::Detector(index)
                    && distance(&s.end, &detector.position) <= self.radius
            })
            .collect()
    }

    /// Superpose arriving segments: coherently within a source, incoherently
    /// across sources.
    pub fn combine(&self, segments: &[&RaySegment]) -> PolarizationState {
        let mut by_source: BTreeMap<&str, PolarizationState> = BTreeMap::new();
        for segment in segments {
            by_source
                .entry(segment.source_id.as_str())
                .and_modify(|acc| *acc = acc.add_coherent(&segment.state))
                .or_insert_with(|| segment.state.clone());
        }
        by_source
            .values()
            .fold(PolarizationState::zero(), |acc, state| acc.add(state))
    }

    /// Reading for one detector.
    pub fn reading(&self, index: usize, detector: &DetectionPoint, segments: &[RaySegment]) -> SensorReading {
        let arriving = self.arriving(index, detector, segments);
        let combined = self.combine(&arriving);
        let description = analyze(&combined);
        let intensity = combined.intensity();
        let activated = !arriving.is_empty() && intensity >= self.activation_threshold;

        let mut failure_reasons = Vec::new();
        if arriving.is_empty() {
            failure_reasons.push(NO_LIGHT.to_string());
        } else if !activated {
            failure_reasons.push(format!(
                "intensity {:.4} below activation threshold {}",
                intensity, self.activation_threshold
            ));
        }

        let mut contributing_rays: Vec<RayId> = Vec::new();
        for segment in &arriving {
            if !contributing_rays.contains(&segment.ray_id) {
                contributing_rays.push(segment.ray_id.clone());
            }
        }

        debug!(
            "sensor {}: {} segment(s), intensity {:.4}, {}",
            detector.id,
            arriving.len(),
            intensity,
            description.label
        );

        SensorReading {
            sensor_id: detector.id.clone(),
            intensity,
            stokes: combined.to_stokes(),
            dop: description.dop,
            orientation_deg: description.orientation_deg,
            ellipticity_deg: description.ellipticity_deg,
            description,
            contributing_rays,
            activated,
            failure_reasons,
        }
    }

    /// Readings for every detector, keyed by sensor id.
    pub fn readings(
        &self,
        detectors: &[DetectionPoint],
        segments: &[RaySegment],
    ) -> BTreeMap<String, SensorReading> {
        #[cfg(feature = "parallel")]
        let readings: Vec<SensorReading> = {
            use rayon::prelude::*;

            detectors
                .par_iter()
                .enumerate()
                .map(|(i, d)| self.reading(i, d, segments))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let readings: Vec<SensorReading> = detectors
            .iter()
            .enumerate()
            .map(|(i, d)| self.reading(i, d, segments))
            .collect();

        readings
            .into_iter()
            .map(|r| (r.sensor_id.clone(), r))
            .collect()
    }
}
