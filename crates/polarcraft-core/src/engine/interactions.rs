//! Per-element interaction records.
//!
//! Every surface visit in a trace becomes one [`InteractionRecord`] naming the
//! physical law that explains what the element did to the light.

use crate::config::EngineConfig;
use crate::polarization::{analyze, PolarizationState};
use crate::scene::Scene;
use crate::surface::{OpticalSurface, SplitKind, SurfaceKind};
use crate::tracer::SurfaceVisit;
use crate::world::InteractionRecord;

pub const MALUS: &str = "Malus's Law (I = I₀cos²θ)";
pub const MALUS_CROSSED: &str = "Malus's Law (θ = 90°, crossed polarizers: I = 0)";
pub const REFLECTION: &str = "Law of reflection (θᵢ = θᵣ)";
pub const QUARTER_WAVE: &str = "Quarter-wave retardation (δ = 90°): linear ↔ circular";
pub const HALF_WAVE: &str = "Half-wave retardation (δ = 180°): polarization mirrored about the fast axis";
pub const OPTICAL_ROTATION: &str = "Optical rotation (polarization plane rotated)";
pub const PBS_SPLITTING: &str = "Polarizing beam splitting (orthogonal o-ray and e-ray)";
pub const BIREFRINGENCE: &str = "Birefringence (double refraction into o-ray and e-ray)";
pub const BEER_LAMBERT: &str = "Beer–Lambert law (I = T·I₀)";

const RETARDANCE_TOLERANCE_DEG: f64 = 1e-6;

fn is_retardance(retardance_deg: f64, target: f64) -> bool {
    (retardance_deg.rem_euclid(360.0) - target).abs() < RETARDANCE_TOLERANCE_DEG
}

/// The law that explains a surface's effect on one ray.
pub fn law_for(surface: &OpticalSurface, output_is_zero: bool) -> String {
    match &surface.kind {
        SurfaceKind::Polarizer { .. } if output_is_zero => MALUS_CROSSED.into(),
        SurfaceKind::Polarizer { .. } => MALUS.into(),
        SurfaceKind::Waveplate { retardance_deg, .. } => {
            if is_retardance(*retardance_deg, 90.0) || is_retardance(*retardance_deg, 270.0) {
                QUARTER_WAVE.into()
            } else if is_retardance(*retardance_deg, 180.0) {
                HALF_WAVE.into()
            } else {
                format!("Phase retardation (δ = {:.1}°)", retardance_deg)
            }
        }
        SurfaceKind::Mirror => REFLECTION.into(),
        SurfaceKind::Rotator { .. } => OPTICAL_ROTATION.into(),
        SurfaceKind::Splitter { split: SplitKind::Pbs, .. } => PBS_SPLITTING.into(),
        SurfaceKind::Splitter {
            split: SplitKind::Calcite { .. },
            ..
        } => BIREFRINGENCE.into(),
        SurfaceKind::Attenuator { .. } => BEER_LAMBERT.into(),
    }
}

/// Turns surface visits into interaction records.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRecorder {
    energy_tolerance: f64,
}

impl InteractionRecorder {
    pub fn new(energy_tolerance: f64) -> Self {
        Self { energy_tolerance }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.energy_tolerance)
    }

    pub fn record(&self, surface: &OpticalSurface, visit: &SurfaceVisit) -> InteractionRecord {
        let zero = PolarizationState::zero();
        let primary = visit.outputs.first().unwrap_or(&zero);
        let secondary = visit.outputs.get(1);

        let input_intensity = visit.input.intensity();
        let output_intensity: f64 = visit.outputs.iter().map(|o| o.intensity()).sum();
        let transmittance = if input_intensity > 0.0 {
            output_intensity / input_intensity
        } else {
            0.0
        };
        let all_dark = visit.outputs.iter().all(|o| o.is_zero());
        let mueller = surface.mueller();

        InteractionRecord {
            element_id: surface.id.clone(),
            element_type: surface.element_kind(),
            ray_id: visit.ray_id.clone(),
            position: visit.point,
            incident_direction: visit.direction,
            input: analyze(&visit.input),
            output: analyze(primary),
            secondary_output: secondary.map(analyze),
            transmittance,
            law: law_for(surface, all_dark),
            diattenuation: mueller.diattenuation(),
            polarizance: mueller.polarizance(),
            depolarization_index: mueller.depolarization_index(),
            energy_conserved: output_intensity <= input_intensity + self.energy_tolerance,
        }
    }

    /// Records for every visit, in trace order.
    pub fn records(&self, scene: &Scene, visits: &[SurfaceVisit]) -> Vec<InteractionRecord> {
        visits
            .iter()
            .filter_map(|v| scene.surface(v.surface_index).map(|s| self.record(s, v)))
            .collect()
    }
}
