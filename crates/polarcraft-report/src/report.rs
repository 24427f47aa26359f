//! Phenomenon reports for automated consumers.
//!
//! [`generate`] flattens a [`WorldState`] into compact events, sensor
//! statuses, an energy summary and topology counts, and writes two short
//! texts: a narrative of what happened and a causal explanation of why each
//! inactive sensor is inactive. The causal explanation only ever cites
//! elements and laws present in the world's interaction records.

use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use polarcraft_core::types::ElementKind;
use polarcraft_core::world::{InteractionRecord, SensorReading, WorldState};

/// One element acting on one ray.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenomenonEvent {
    pub element: String,
    pub element_type: ElementKind,
    pub ray: String,
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_output: Option<String>,
    pub transmittance: f64,
    pub law: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Active,
    /// Light arrives but stays below the activation threshold.
    Dim,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    pub sensor: String,
    pub status: SensorStatus,
    pub intensity: f64,
    pub polarization: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySummary {
    pub input: f64,
    pub detected: f64,
    pub loss: f64,
    pub loss_percent: f64,
    pub conserved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub segments: usize,
    pub sources: usize,
    pub split_points: usize,
    pub max_lineage_depth: usize,
}

/// Structured account of one world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenomenonReport {
    pub version: u64,
    pub complete: bool,
    pub events: Vec<PhenomenonEvent>,
    pub sensors: Vec<SensorEvent>,
    pub energy: EnergySummary,
    pub topology: Topology,
    pub narrative: String,
    pub causal: String,
}

fn event(record: &InteractionRecord) -> PhenomenonEvent {
    PhenomenonEvent {
        element: record.element_id.clone(),
        element_type: record.element_type,
        ray: record.ray_id.to_string(),
        input: record.input.label.clone(),
        output: record.output.label.clone(),
        secondary_output: record.secondary_output.as_ref().map(|d| d.label.clone()),
        transmittance: record.transmittance,
        law: record.law.clone(),
    }
}

fn sensor_event(reading: &SensorReading) -> SensorEvent {
    let status = if reading.activated {
        SensorStatus::Active
    } else if reading.intensity > 0.0 {
        SensorStatus::Dim
    } else {
        SensorStatus::Dark
    };
    let reason = match status {
        SensorStatus::Active => format!(
            "activated by {:.3} of {} light",
            reading.intensity, reading.description.label
        ),
        _ => reading
            .failure_reasons
            .first()
            .cloned()
            .unwrap_or_else(|| "not activated".to_string()),
    };
    SensorEvent {
        sensor: reading.sensor_id.clone(),
        status,
        intensity: reading.intensity,
        polarization: reading.description.label.clone(),
        reason,
    }
}

fn energy(world: &WorldState) -> EnergySummary {
    let input = world.total_input_energy;
    let detected = world.total_output_energy;
    let loss = (input - detected).max(0.0);
    let loss_percent = if input > 0.0 { loss / input * 100.0 } else { 0.0 };
    EnergySummary {
        input,
        detected,
        loss,
        loss_percent,
        conserved: world.energy_conserved,
    }
}

fn topology(world: &WorldState) -> Topology {
    let sources: BTreeSet<&str> = world.segments.iter().map(|s| s.source_id.as_str()).collect();
    let split_points = world
        .interactions
        .iter()
        .filter(|r| r.secondary_output.is_some())
        .count();
    let max_lineage_depth = world
        .segments
        .iter()
        .map(|s| s.ray_id.depth())
        .max()
        .unwrap_or(0);
    Topology {
        segments: world.segments.len(),
        sources: sources.len(),
        split_points,
        max_lineage_depth,
    }
}

fn narrative(world: &WorldState, energy: &EnergySummary) -> String {
    let emitters = world
        .nodes
        .iter()
        .filter(|n| n.kind() == ElementKind::Emitter)
        .count();
    let total = world.sensor_readings.len();
    let active = world.sensor_readings.values().filter(|r| r.activated).count();

    let mut text = if emitters == 0 {
        "The scene has no light source, so nothing is illuminated.".to_string()
    } else {
        format!(
            "{} source(s) emitted {:.3} units of light across {} beam segment(s) and {} element interaction(s).",
            emitters,
            energy.input,
            world.segments.len(),
            world.interactions.len()
        )
    };
    if total == 0 {
        text.push_str(" There are no sensors.");
    } else {
        text.push_str(&format!(
            " {} of {} sensor(s) activated, detecting {:.3} ({:.1}% lost to absorption or escape).",
            active, total, energy.detected, energy.loss_percent
        ));
    }
    if !world.simulation_complete {
        text.push_str(" The trace stopped early at its iteration or bounce budget.");
    }
    if !world.energy_conserved {
        text.push_str(" Warning: sensors detected more light than was emitted.");
    }
    text
}

/// Why one inactive sensor is inactive.
///
/// A dark sensor is blamed on the last fully blocking element whose incident
/// beam was heading for it; without one, the light was never routed there.
fn explain(world: &WorldState, reading: &SensorReading) -> String {
    if reading.intensity == 0.0 {
        let position = world.node(&reading.sensor_id).map(|n| n.position);
        let blocker = position.and_then(|p| {
            world
                .interactions
                .iter()
                .rev()
                .find(|r| r.transmittance == 0.0 && r.aims_at(&p, world.sensor_radius))
        });
        match blocker {
            Some(blocker) => format!(
                "Sensor {} is dark because {} {} blocked the beam ({}).",
                reading.sensor_id,
                blocker.element_type,
                blocker.element_id,
                blocker.law
            ),
            None => format!(
                "Sensor {} is dark because no beam was directed here.",
                reading.sensor_id
            ),
        }
    } else {
        let reason = reading
            .failure_reasons
            .first()
            .map(String::as_str)
            .unwrap_or("it is below the activation threshold");
        format!(
            "Sensor {} receives {:.3} of {} light, but {}.",
            reading.sensor_id, reading.intensity, reading.description.label, reason
        )
    }
}

fn causal(world: &WorldState) -> String {
    if world.sensor_readings.is_empty() {
        return "There are no sensors to explain.".to_string();
    }
    let explanations: Vec<String> = world
        .inactive_sensors()
        .map(|r| explain(world, r))
        .collect();
    if explanations.is_empty() {
        "Every sensor is activated.".to_string()
    } else {
        explanations.join(" ")
    }
}

/// Build the report for a world state.
pub fn generate(world: &WorldState) -> PhenomenonReport {
    let energy = energy(world);
    let report = PhenomenonReport {
        version: world.version,
        complete: world.simulation_complete,
        events: world.interactions.iter().map(event).collect(),
        sensors: world.sensor_readings.values().map(sensor_event).collect(),
        narrative: narrative(world, &energy),
        causal: causal(world),
        topology: topology(world),
        energy,
    };
    debug!(
        "report for world {}: {} event(s), {} sensor(s)",
        report.version,
        report.events.len(),
        report.sensors.len()
    );
    report
}

/// Round every float to three decimal places.
fn round_numbers(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .and_then(|x| Number::from_f64((x * 1000.0).round() / 1000.0))
            .map_or(Value::Null, Value::Number),
        Value::Array(items) => Value::Array(items.into_iter().map(round_numbers).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, round_numbers(v))).collect()),
        other => other,
    }
}

impl PhenomenonReport {
    /// Compact JSON form with `events`, `sensors`, `energy`, `topology`,
    /// `narrative` and `causal`, every float rounded to three decimals.
    pub fn to_compact_json(&self) -> Value {
        let full = round_numbers(serde_json::to_value(self).unwrap_or(Value::Null));
        let Value::Object(mut full) = full else {
            return Value::Null;
        };
        let mut compact = Map::new();
        for key in ["events", "sensors", "energy", "topology", "narrative", "causal"] {
            if let Some(value) = full.remove(key) {
                compact.insert(key.to_string(), value);
            }
        }
        Value::Object(compact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use polarcraft_core::engine::SimulationEngine;
    use polarcraft_core::scene_graph::ComponentRecord;

    fn component(id: &str, kind: &str, x: f64) -> ComponentRecord {
        ComponentRecord {
            id: id.into(),
            kind: kind.into(),
            x,
            y: 0.0,
            ..Default::default()
        }
    }

    fn polarizer(id: &str, x: f64, axis: f64) -> ComponentRecord {
        ComponentRecord {
            polarization: Some(axis),
            ..component(id, "polarizer", x)
        }
    }

    #[test]
    fn test_dark_sensor_without_blocker_is_a_routing_problem() {
        let world = SimulationEngine::default().simulate_components(&[
            component("e1", "emitter", 0.0),
            ComponentRecord {
                y: 50.0,
                ..component("s1", "sensor", 40.0)
            },
        ]);
        let report = generate(&world);
        assert_eq!(report.sensors[0].status, SensorStatus::Dark);
        assert_eq!(report.causal, "Sensor s1 is dark because no beam was directed here.");
    }

    #[test]
    fn test_blocker_is_only_blamed_for_sensors_in_its_path() {
        let world = SimulationEngine::default().simulate_components(&[
            component("e1", "emitter", 0.0),
            polarizer("p90", 20.0, 90.0),
            component("s1", "sensor", 40.0),
            ComponentRecord {
                x: 0.0,
                y: 300.0,
                ..component("elsewhere", "sensor", 0.0)
            },
        ]);
        let report = generate(&world);
        assert!(report
            .causal
            .contains("Sensor elsewhere is dark because no beam was directed here."));
        assert!(report
            .causal
            .contains("Sensor s1 is dark because polarizer p90 blocked the beam"));
        assert!(!report.causal.contains("elsewhere is dark because polarizer"));
    }

    #[test]
    fn test_dim_sensor_cites_measured_light() {
        let world = SimulationEngine::default().simulate_components(&[
            component("e1", "emitter", 0.0),
            polarizer("p1", 20.0, 80.0),
            component("s1", "sensor", 40.0),
        ]);
        let report = generate(&world);
        assert_eq!(report.sensors[0].status, SensorStatus::Dim);
        assert!(report.causal.starts_with("Sensor s1 receives 0.030 of linear 80.0° light"));
        assert!(report.causal.contains("below activation threshold"));
    }

    #[test]
    fn test_energy_and_topology() {
        let world = SimulationEngine::default().simulate_components(&[
            ComponentRecord {
                polarization: Some(30.0),
                ..component("e1", "emitter", 0.0)
            },
            component("pbs", "splitter", 20.0),
            component("s1", "sensor", 40.0),
        ]);
        let report = generate(&world);
        assert_abs_diff_eq!(report.energy.input, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(report.energy.detected, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(report.energy.loss_percent, 25.0, epsilon = 1e-9);
        assert_eq!(report.topology.sources, 1);
        assert_eq!(report.topology.split_points, 1);
        assert_eq!(report.topology.max_lineage_depth, 1);
        assert_eq!(report.causal, "Every sensor is activated.");
    }

    #[test]
    fn test_compact_json_rounds_and_keeps_keys() {
        let world = SimulationEngine::default().simulate_components(&[
            component("e1", "emitter", 0.0),
            polarizer("p1", 20.0, 33.0),
            component("s1", "sensor", 40.0),
        ]);
        let json = generate(&world).to_compact_json();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 6);
        for key in ["events", "sensors", "energy", "topology", "narrative", "causal"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        let t = json["events"][0]["transmittance"].as_f64().unwrap();
        assert_eq!(t, (t * 1000.0).round() / 1000.0);
        assert_abs_diff_eq!(t, 0.703, epsilon = 1e-12);
    }
}
