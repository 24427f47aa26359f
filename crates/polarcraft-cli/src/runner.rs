//! Simulation runner: ties together job config, engine and report.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use polarcraft_core::engine::SimulationEngine;
use polarcraft_core::types::SegmentEnd;
use polarcraft_core::world::WorldState;
use polarcraft_report::visual::{renderable_segments, renderable_sensors, RenderableSegment, RenderableSensor};
use polarcraft_report::{generate, ColorMode, PhenomenonReport};

use crate::config::JobConfig;

/// Results from a simulation run.
pub struct SimulationOutput {
    pub world: WorldState,
    pub report: PhenomenonReport,
}

/// Run one tick of the scene described by a job.
pub fn run_simulation(job: &JobConfig) -> Result<SimulationOutput> {
    let engine = SimulationEngine::new(job.engine.clone()).context("invalid [engine] settings")?;
    info!("simulating '{}' with {} component(s)", job.scene.name, job.components.len());

    let world = engine.simulate_components(&job.components);
    let report = generate(&world);

    println!(
        "  {} node(s), {} visible segment(s), {} iteration(s){}",
        world.nodes.len(),
        world.segments.len(),
        world.iterations,
        if world.simulation_complete { "" } else { " (incomplete)" }
    );
    for reading in world.sensor_readings.values() {
        println!(
            "  Sensor '{}': {:.4} ({}){}",
            reading.sensor_id,
            reading.intensity,
            reading.description.label,
            if reading.activated { " [active]" } else { "" }
        );
    }

    Ok(SimulationOutput { world, report })
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    create_parent(path)?;
    let json = serde_json::to_string_pretty(value).context("JSON serialisation")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Write the compact phenomenon report.
pub fn write_report_json(report: &PhenomenonReport, path: &Path) -> Result<()> {
    write_json(&report.to_compact_json(), path)?;
    println!("Report written to: {}", path.display());
    Ok(())
}

/// Write the full world state.
pub fn write_world_json(world: &WorldState, path: &Path) -> Result<()> {
    write_json(world, path)?;
    println!("World state written to: {}", path.display());
    Ok(())
}

#[derive(Serialize)]
struct RenderFrame {
    version: u64,
    segments: Vec<RenderableSegment>,
    sensors: Vec<RenderableSensor>,
}

/// Write the renderable primitives of a world.
pub fn write_render_json(world: &WorldState, mode: ColorMode, path: &Path) -> Result<()> {
    let frame = RenderFrame {
        version: world.version,
        segments: renderable_segments(world, mode),
        sensors: renderable_sensors(world),
    };
    write_json(&frame, path)?;
    println!("Render frame written to: {}", path.display());
    Ok(())
}

/// Write visible beam segments as CSV.
pub fn write_segments_csv(world: &WorldState, path: &Path, job: &JobConfig) -> Result<()> {
    create_parent(path)?;
    let mut file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;

    writeln!(file, "# PolarCraft beam segments")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# scene: {}", job.scene.name)?;
    writeln!(file, "# world version: {}", world.version)?;
    writeln!(file, "#")?;
    writeln!(
        file,
        "index,ray_id,source_id,start_x,start_y,end_x,end_y,intensity,s0,s1,s2,s3,category,orientation_deg,ellipticity_deg,wavelength_nm,path_length,termination"
    )?;

    for s in &world.segments {
        let termination = match s.termination {
            SegmentEnd::Surface(i) => format!("surface:{}", i),
            SegmentEnd::Detector(i) => format!("detector:{}", i),
            SegmentEnd::Escaped => "escaped".to_string(),
        };
        writeln!(
            file,
            "{},{},{},{:.4},{:.4},{:.4},{:.4},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{},{:.3},{:.3},{:.1},{:.4},{}",
            s.index,
            s.ray_id,
            s.source_id,
            s.start[0],
            s.start[1],
            s.end[0],
            s.end[1],
            s.intensity,
            s.stokes.s0,
            s.stokes.s1,
            s.stokes.s2,
            s.stokes.s3,
            s.description.category,
            s.description.orientation_deg,
            s.description.ellipticity_deg,
            s.wavelength_nm,
            s.path_length,
            termination
        )?;
    }

    println!("Segments written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobConfig {
        toml::from_str(
            r#"
            [scene]
            name = "malus"

            [[component]]
            id = "e1"
            type = "emitter"
            x = 0
            y = 0

            [[component]]
            id = "p1"
            type = "polarizer"
            x = 20
            y = 0
            polarization = 60

            [[component]]
            id = "s1"
            type = "sensor"
            x = 40
            y = 0
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_run_simulation() {
        let out = run_simulation(&job()).unwrap();
        let reading = out.world.reading("s1").unwrap();
        approx::assert_abs_diff_eq!(reading.intensity, 0.25, epsilon = 1e-9);
        assert_eq!(out.report.sensors.len(), 1);
    }

    #[test]
    fn test_writes_outputs() {
        let job = job();
        let out = run_simulation(&job).unwrap();
        let dir = std::env::temp_dir().join(format!("polarcraft-cli-test-{}", std::process::id()));

        let csv = dir.join("segments.csv");
        write_segments_csv(&out.world, &csv, &job).unwrap();
        let text = std::fs::read_to_string(&csv).unwrap();
        let rows: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert!(rows[0].starts_with("index,ray_id"));
        assert_eq!(rows.len(), 1 + out.world.segments.len());
        assert!(rows[2].ends_with("detector:0"));

        let report = dir.join("report.json");
        write_report_json(&out.report, &report).unwrap();
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
        assert!(json.get("causal").is_some());

        let render = dir.join("render.json");
        write_render_json(&out.world, ColorMode::Polarization, &render).unwrap();
        assert!(render.exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
