//! Integration tests: report and visual contract against simulated worlds.

use polarcraft_core::engine::SimulationEngine;
use polarcraft_core::scene_graph::ComponentRecord;
use polarcraft_core::thresholds::RENDER_EPSILON;
use polarcraft_core::world::WorldState;
use polarcraft_report::report::SensorStatus;
use polarcraft_report::visual::{renderable_segments, renderable_sensors};
use polarcraft_report::{generate, to_renderable_segment, ColorMode};

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

fn crossed_polarizers() -> WorldState {
    SimulationEngine::default().simulate_components(&[
        ComponentRecord {
            polarization: Some(-1.0),
            ..component("lamp", "emitter", 0.0)
        },
        polarizer("p-first", 20.0, 0.0),
        polarizer("p-second", 40.0, 90.0),
        component("detector", "sensor", 60.0),
    ])
}

#[test]
fn test_crossed_polarizers_are_blamed_on_the_second() {
    let world = crossed_polarizers();
    let reading = world.reading("detector").unwrap();
    assert_eq!(reading.intensity, 0.0);

    let report = generate(&world);
    assert_eq!(report.sensors[0].status, SensorStatus::Dark);
    assert!(report.causal.contains("p-second"), "{}", report.causal);
    assert!(!report.causal.contains("p-first"), "{}", report.causal);
    assert!(report.causal.contains("Malus's Law"));
    assert!(report.causal.contains("θ = 90°"));

    let blocker = report.events.iter().find(|e| e.element == "p-second").unwrap();
    assert_eq!(blocker.transmittance, 0.0);
    assert_eq!(blocker.output, "no light");
    let first = report.events.iter().find(|e| e.element == "p-first").unwrap();
    assert_eq!(first.input, "unpolarized");
    assert_eq!(first.transmittance, 0.5);
}

#[test]
fn test_loop_filter_and_visual_contract_agree() {
    let world = SimulationEngine::default().simulate_components(&[
        component("e1", "emitter", 0.0),
        polarizer("p1", 20.0, 84.0),
        polarizer("p2", 40.0, 154.0),
        component("s1", "sensor", 60.0),
    ]);
    // Everything the loop kept is drawable, in both color modes.
    for segment in &world.segments {
        assert!(segment.intensity >= RENDER_EPSILON);
        assert!(to_renderable_segment(segment, ColorMode::Wavelength).is_some());
        assert!(to_renderable_segment(segment, ColorMode::Polarization).is_some());
    }
    assert_eq!(renderable_segments(&world, ColorMode::Wavelength).len(), world.segments.len());
    // The dim tail after the second polarizer was never materialized.
    assert!(world.segments.len() < 3);
    assert!(world.reading("s1").unwrap().intensity > 0.0);
}

#[test]
fn test_renderables_only_echo_world_fields() {
    let world = crossed_polarizers();
    let sensors = renderable_sensors(&world);
    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0].intensity, 0.0);
    assert!(!sensors[0].activated);

    for (rendered, segment) in renderable_segments(&world, ColorMode::Polarization)
        .iter()
        .zip(&world.segments)
    {
        assert_eq!(rendered.start, segment.start);
        assert_eq!(rendered.end, segment.end);
        assert_eq!(rendered.intensity, segment.intensity);
    }
}

#[test]
fn test_report_survives_empty_world() {
    let world = SimulationEngine::default().simulate(&[]);
    let report = generate(&world);
    assert!(report.events.is_empty());
    assert_eq!(report.energy.loss_percent, 0.0);
    assert_eq!(report.causal, "There are no sensors to explain.");
    assert!(report.narrative.contains("no light source"));
}
