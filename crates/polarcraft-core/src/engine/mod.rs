//! The simulation loop.
//!
//! [`SimulationEngine::simulate`] is the one entry point callers use. A tick
//! maps scene nodes to tracer inputs, traces the rays, and assembles the
//! result into an immutable [`WorldState`]:
//!
//! 1. Partition nodes into emitters, sensors and passive elements.
//! 2. Build surfaces, detection points and rays, dropping unusable nodes.
//! 3. Trace, or short-circuit to an empty completed trace when no ray exists.
//! 4. Keep visible segments and enrich them with Stokes parameters, a
//!    classification and the source wavelength.
//! 5. Aggregate sensor readings.
//! 6. Record per-element interactions.
//! 7. Check that detected energy never exceeds emitted energy.
//! 8. Stamp the next version and the wall-clock time.
//!
//! The only state an engine mutates is its own version counter.

pub mod interactions;
pub mod sensors;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::polarization::analyze;
use crate::scene::Scene;
use crate::scene_graph::{ComponentRecord, Element, SceneGraphBuilder, SceneNode};
use crate::thresholds::is_visible;
use crate::tracer::{LightTracer, TraceResult, TracerParams};
use crate::types::RaySegment;
use crate::world::{BeamSegmentState, WorldState};

pub use interactions::InteractionRecorder;
pub use sensors::SensorAggregator;

const FALLBACK_WAVELENGTH_NM: f64 = 550.0;

/// Owns a configuration and the version counter of the worlds it produces.
#[derive(Debug)]
pub struct SimulationEngine {
    config: EngineConfig,
    builder: SceneGraphBuilder,
    tracer: LightTracer,
    sensors: SensorAggregator,
    recorder: InteractionRecorder,
    version: AtomicU64,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::with_valid_config(EngineConfig::default())
    }
}

impl SimulationEngine {
    /// Create an engine, rejecting unusable configuration values.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: EngineConfig) -> Self {
        Self {
            builder: SceneGraphBuilder::from_config(&config),
            tracer: LightTracer::new(TracerParams::from(&config)),
            sensors: SensorAggregator::from_config(&config),
            recorder: InteractionRecorder::from_config(&config),
            version: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn builder(&self) -> &SceneGraphBuilder {
        &self.builder
    }

    /// Version of the most recently produced world, zero before the first
    /// tick.
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Build nodes from external component records and simulate them.
    pub fn simulate_components(&self, records: &[ComponentRecord]) -> WorldState {
        let nodes = self.builder.nodes_from_components(records);
        if nodes.len() < records.len() {
            debug!("{} of {} component(s) dropped", records.len() - nodes.len(), records.len());
        }
        self.simulate(&nodes)
    }

    /// Run one tick.
    pub fn simulate(&self, nodes: &[SceneNode]) -> WorldState {
        let mut emitters = Vec::new();
        let mut sensors = Vec::new();
        let mut passive = Vec::new();
        for node in nodes {
            match node.element {
                Element::Emitter { .. } => emitters.push(node),
                Element::Sensor => sensors.push(node),
                _ => passive.push(node),
            }
        }

        let surfaces = passive
            .iter()
            .filter_map(|n| self.builder.surface_from_node(n))
            .collect();
        let detectors = sensors
            .iter()
            .filter_map(|n| self.builder.detector_from_node(n))
            .collect();
        let rays: Vec<_> = emitters
            .iter()
            .zip(0u32..)
            .filter_map(|(n, root)| self.builder.ray_from_node(n, root))
            .collect();
        let scene = Scene::new(surfaces, self.config.ambient_transmittance).with_detectors(detectors);

        let trace = if rays.is_empty() {
            TraceResult::empty()
        } else {
            self.tracer.trace(&scene, &rays)
        };

        let wavelengths: BTreeMap<&str, f64> = emitters
            .iter()
            .filter_map(|n| n.wavelength_nm().map(|w| (n.id.as_str(), w)))
            .collect();
        let segments: Vec<BeamSegmentState> = trace
            .segments
            .iter()
            .filter(|s| is_visible(s.intensity))
            .map(|s| {
                let wavelength_nm = wavelengths
                    .get(s.source_id.as_str())
                    .copied()
                    .unwrap_or(FALLBACK_WAVELENGTH_NM);
                enrich(s, wavelength_nm)
            })
            .collect();

        let sensor_readings = self.sensors.readings(scene.detectors(), &trace.segments);
        let interactions = self.recorder.records(&scene, &trace.visits);

        let total_input_energy: f64 = emitters.iter().map(|n| n.emitted_intensity()).sum();
        let total_output_energy: f64 = sensor_readings.values().map(|r| r.intensity).sum();
        let energy_conserved = total_output_energy <= total_input_energy + self.config.energy_tolerance;
        if !energy_conserved {
            warn!(
                "detected energy {:.6} exceeds emitted energy {:.6}",
                total_output_energy, total_input_energy
            );
        }

        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        debug!(
            "tick {}: {} of {} segment(s) visible, {} sensor(s), {} interaction(s), complete = {}",
            version,
            segments.len(),
            trace.segments.len(),
            sensor_readings.len(),
            interactions.len(),
            trace.completed
        );

        WorldState {
            version,
            timestamp_ms,
            segments,
            sensor_readings,
            interactions,
            nodes: nodes.to_vec(),
            total_input_energy,
            total_output_energy,
            energy_conserved,
            simulation_complete: trace.completed,
            iterations: trace.iterations,
            sensor_radius: self.config.sensor_radius,
        }
    }
}

fn enrich(segment: &RaySegment, wavelength_nm: f64) -> BeamSegmentState {
    BeamSegmentState {
        index: segment.index,
        ray_id: segment.ray_id.clone(),
        source_id: segment.source_id.clone(),
        start: segment.start,
        end: segment.end,
        direction: segment.direction,
        intensity: segment.intensity,
        stokes: segment.state.to_stokes(),
        description: analyze(&segment.state),
        wavelength_nm,
        path_length: segment.path_length,
        parent_segment: segment.parent_segment,
        termination: segment.termination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_config() {
        let config = EngineConfig {
            sensor_radius: -1.0,
            ..Default::default()
        };
        assert!(SimulationEngine::new(config).is_err());
    }

    #[test]
    fn test_empty_scene_is_complete() {
        let engine = SimulationEngine::default();
        let world = engine.simulate(&[]);
        assert!(world.simulation_complete);
        assert!(world.segments.is_empty());
        assert!(world.sensor_readings.is_empty());
        assert_eq!(world.iterations, 0);
        assert!(world.energy_conserved);
    }

    #[test]
    fn test_version_increments_once_per_tick() {
        let engine = SimulationEngine::default();
        assert_eq!(engine.current_version(), 0);
        let first = engine.simulate(&[]);
        let second = engine.simulate(&[]);
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(engine.current_version(), 2);

        let other = SimulationEngine::default();
        assert_eq!(other.simulate(&[]).version, 1);
    }
}
