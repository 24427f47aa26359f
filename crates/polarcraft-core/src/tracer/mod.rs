//! Iterative light propagation.
//!
//! The [`LightTracer`] advances a batch of rays through a [`Scene`] one hop at
//! a time. Each hop runs the ray to the nearest surface, detection point or
//! the scene boundary, records a [`RaySegment`], and applies the surface
//! transform. Splitters continue the incident ray as the o-ray and spawn the
//! e-ray as a child whose [`RayId`] extends the parent's lineage.
//!
//! A ray halts when it is absorbed by a detection point, escapes the scene,
//! falls below the intensity cutoff, or reaches the bounce limit. The whole
//! trace halts when no rays remain or the iteration budget is spent; running
//! out of budget (or bouncing out) marks the result incomplete instead of
//! failing.
//!
//! Rays are processed in a fixed order (launch order, children after the
//! current batch), so the segment list is bit-for-bit reproducible.

pub(crate) mod intersect;

use log::{debug, trace, warn};
use nalgebra::Vector3;

use crate::config::EngineConfig;
use crate::polarization::PolarizationState;
use crate::scene::Scene;
use crate::types::{to_point, to_vector, LightRay, Point3, RayId, RaySegment, SegmentEnd};
use intersect::{nearest_hit, Hit};

/// Propagation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TracerParams {
    pub max_iterations: usize,
    pub max_bounces: u32,
    pub intensity_cutoff: f64,
    pub step_size: f64,
    pub scene_boundary: f64,
    pub surface_aperture: f64,
    pub detector_radius: f64,
}

impl Default for TracerParams {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for TracerParams {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            max_bounces: config.max_bounces,
            intensity_cutoff: config.intensity_cutoff,
            step_size: config.step_size,
            scene_boundary: config.scene_boundary,
            surface_aperture: config.surface_aperture,
            detector_radius: config.sensor_radius,
        }
    }
}

/// A ray meeting a surface: what came in and what left.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceVisit {
    pub surface_index: usize,
    pub ray_id: RayId,
    /// The segment that ended at the surface.
    pub segment: usize,
    /// Where the ray met the surface.
    pub point: Point3,
    /// Direction the ray arrived from.
    pub direction: Point3,
    pub input: PolarizationState,
    /// One output, or the o-ray then the e-ray for splitters. Outputs are
    /// recorded even when they fall below the cutoff.
    pub outputs: Vec<PolarizationState>,
}

/// Everything a trace produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceResult {
    pub segments: Vec<RaySegment>,
    pub visits: Vec<SurfaceVisit>,
    /// `false` when the iteration budget ran out or a ray hit the bounce limit.
    pub completed: bool,
    pub iterations: usize,
}

impl TraceResult {
    /// The result of tracing no rays at all.
    pub fn empty() -> Self {
        Self {
            segments: Vec::new(),
            visits: Vec::new(),
            completed: true,
            iterations: 0,
        }
    }
}

/// A ray in flight.
struct ActiveRay {
    id: RayId,
    source_id: String,
    origin: Vector3<f64>,
    direction: Vector3<f64>,
    state: PolarizationState,
    bounces: u32,
    path_length: f64,
    skip_surface: Option<usize>,
    parent_segment: Option<usize>,
    next_split: u32,
}

impl ActiveRay {
    fn launch(ray: &LightRay) -> Option<Self> {
        let direction = to_vector(&ray.direction);
        if direction.norm() == 0.0 || !direction.iter().all(|c| c.is_finite()) {
            debug!("ray {} from {} has no direction; not launched", ray.id, ray.source_id);
            return None;
        }
        Some(Self {
            id: ray.id.clone(),
            source_id: ray.source_id.clone(),
            origin: to_vector(&ray.origin),
            direction: direction.normalize(),
            state: ray.state.clone(),
            bounces: 0,
            path_length: 0.0,
            skip_surface: None,
            parent_segment: None,
            next_split: 1,
        })
    }
}

/// Deterministic, single-batch-per-tick ray tracer.
#[derive(Debug, Clone, Default)]
pub struct LightTracer {
    params: TracerParams,
}

impl LightTracer {
    pub fn new(params: TracerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TracerParams {
        &self.params
    }

    /// Propagate `rays` through `scene` until every ray has halted or the
    /// iteration budget is spent.
    pub fn trace(&self, scene: &Scene, rays: &[LightRay]) -> TraceResult {
        let cutoff = self.params.intensity_cutoff;
        let mut batch: Vec<ActiveRay> = rays
            .iter()
            .filter(|ray| {
                let bright = ray.state.intensity() >= cutoff;
                if !bright {
                    debug!("ray {} from {} is below the cutoff at launch", ray.id, ray.source_id);
                }
                bright
            })
            .filter_map(ActiveRay::launch)
            .collect();

        let mut segments: Vec<RaySegment> = Vec::new();
        let mut visits: Vec<SurfaceVisit> = Vec::new();
        let mut completed = true;
        let mut iterations = 0usize;

        'propagate: while !batch.is_empty() {
            let mut next_batch = Vec::new();

            for ray in batch.drain(..) {
                if iterations >= self.params.max_iterations {
                    warn!(
                        "iteration budget of {} exhausted; trace is incomplete",
                        self.params.max_iterations
                    );
                    completed = false;
                    break 'propagate;
                }
                iterations += 1;

                let hit = nearest_hit(scene, &ray.origin, &ray.direction, &self.params, ray.skip_surface);
                let t = hit.distance();
                let end = ray.origin + ray.direction * t;
                let path_length = ray.path_length + t;
                let termination = match hit {
                    Hit::Surface { index, .. } => SegmentEnd::Surface(index),
                    Hit::Detector { index, .. } => SegmentEnd::Detector(index),
                    Hit::Boundary { .. } => SegmentEnd::Escaped,
                };
                let segment_state = match termination {
                    SegmentEnd::Escaped => ray.state.scale(scene.ambient_transmittance()),
                    _ => ray.state.clone(),
                };

                let segment_index = segments.len();
                trace!("{} hop {:?} over {:.3} units", ray.id, termination, t);
                segments.push(RaySegment {
                    index: segment_index,
                    ray_id: ray.id.clone(),
                    source_id: ray.source_id.clone(),
                    start: to_point(&ray.origin),
                    end: to_point(&end),
                    direction: to_point(&ray.direction),
                    intensity: segment_state.intensity(),
                    state: segment_state,
                    parent_segment: ray.parent_segment,
                    path_length,
                    termination,
                });

                let surface_index = match termination {
                    SegmentEnd::Surface(index) => index,
                    SegmentEnd::Detector(index) => {
                        debug!("{} absorbed by detection point {}", ray.id, index);
                        continue;
                    }
                    SegmentEnd::Escaped => {
                        debug!("{} left the scene", ray.id);
                        continue;
                    }
                };
                let Some(surface) = scene.surface(surface_index) else {
                    continue;
                };

                let response = surface.interact(&ray.state, &ray.direction);
                let outputs = response.outputs();
                visits.push(SurfaceVisit {
                    surface_index,
                    ray_id: ray.id.clone(),
                    segment: segment_index,
                    point: to_point(&end),
                    direction: to_point(&ray.direction),
                    input: ray.state.clone(),
                    outputs: outputs.iter().map(|o| o.state.clone()).collect(),
                });

                let bounces = ray.bounces + 1;
                if bounces >= self.params.max_bounces {
                    debug!("{} reached the bounce limit at {}", ray.id, surface.id);
                    completed = false;
                    continue;
                }

                let mut next_split = ray.next_split;
                let mut continuing = None;
                let mut children = Vec::new();
                for (branch, out) in outputs.into_iter().enumerate() {
                    if out.state.intensity() < cutoff {
                        debug!("{} branch {} at {} fell below the cutoff", ray.id, branch, surface.id);
                        continue;
                    }
                    let spawned = ActiveRay {
                        id: ray.id.clone(),
                        source_id: ray.source_id.clone(),
                        origin: end + out.offset,
                        direction: out.direction.normalize(),
                        state: out.state.clone(),
                        bounces,
                        path_length: path_length + out.offset.norm(),
                        skip_surface: Some(surface_index),
                        parent_segment: Some(segment_index),
                        next_split: 1,
                    };
                    if branch == 0 {
                        continuing = Some(spawned);
                    } else {
                        let child = ActiveRay {
                            id: ray.id.child(next_split),
                            ..spawned
                        };
                        next_split += 1;
                        children.push(child);
                    }
                }
                // The o-ray keeps the incident id, so it carries on counting
                // splits where the parent left off.
                if let Some(mut continuing) = continuing {
                    continuing.next_split = next_split;
                    next_batch.push(continuing);
                }
                next_batch.extend(children);
            }

            batch = next_batch;
        }

        TraceResult {
            segments,
            visits,
            completed,
            iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{OpticalSurface, SplitKind, SurfaceKind};
    use approx::assert_abs_diff_eq;

    fn surface(id: &str, x: f64, y: f64, kind: SurfaceKind) -> OpticalSurface {
        OpticalSurface {
            id: id.into(),
            position: [x, y, 0.0],
            normal: [1.0, 0.0, 0.0],
            kind,
        }
    }

    fn ray_east(state: PolarizationState) -> LightRay {
        LightRay {
            id: RayId::root(0),
            source_id: "e0".into(),
            origin: [0.0, 0.0, 0.0],
            direction: [1.0, 0.0, 0.0],
            state,
            wavelength_nm: 550.0,
        }
    }

    #[test]
    fn test_free_ray_escapes_at_boundary() {
        let result = LightTracer::default().trace(&Scene::default(), &[ray_east(PolarizationState::linear(0.0, 1.0))]);
        assert!(result.completed);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].termination, SegmentEnd::Escaped);
        assert_abs_diff_eq!(result.segments[0].end[0], 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_blocked_ray_halts_at_polarizer() {
        let scene = Scene::new(
            vec![surface("p", 10.0, 0.0, SurfaceKind::Polarizer { axis_deg: 90.0 })],
            1.0,
        );
        let result = LightTracer::default().trace(&scene, &[ray_east(PolarizationState::linear(0.0, 1.0))]);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.visits.len(), 1);
        assert!(result.visits[0].outputs[0].is_zero());
        assert!(result.completed);
    }

    #[test]
    fn test_splitter_spawns_child_lineage() {
        let scene = Scene::new(
            vec![
                surface("s1", 10.0, 0.0, SurfaceKind::Splitter { split: SplitKind::Pbs, axis_deg: 0.0 }),
                surface("s2", 30.0, 0.0, SurfaceKind::Splitter { split: SplitKind::Pbs, axis_deg: 45.0 }),
            ],
            1.0,
        );
        let result = LightTracer::default().trace(&scene, &[ray_east(PolarizationState::linear(30.0, 1.0))]);
        let ids: Vec<String> = result.segments.iter().map(|s| s.ray_id.to_string()).collect();
        assert!(ids.contains(&"r0".to_string()));
        assert!(ids.contains(&"r0.1".to_string()));
        assert!(ids.contains(&"r0.2".to_string()));

        let child = result.segments.iter().find(|s| s.ray_id.to_string() == "r0.1").unwrap();
        assert_eq!(child.parent_segment, Some(0));
        assert_abs_diff_eq!(child.intensity, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_iteration_budget_marks_incomplete() {
        let tracer = LightTracer::new(TracerParams {
            max_iterations: 1,
            ..Default::default()
        });
        let scene = Scene::new(
            vec![surface("a", 10.0, 0.0, SurfaceKind::Attenuator { factor: 0.5 })],
            1.0,
        );
        let result = tracer.trace(&scene, &[ray_east(PolarizationState::linear(0.0, 1.0))]);
        assert!(!result.completed);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.segments.len(), 1);
    }

    #[test]
    fn test_bounce_limit_marks_incomplete() {
        let tracer = LightTracer::new(TracerParams {
            max_bounces: 2,
            ..Default::default()
        });
        let scene = Scene::new(
            (1..=4)
                .map(|i| surface(&format!("a{}", i), 10.0 * i as f64, 0.0, SurfaceKind::Attenuator { factor: 0.9 }))
                .collect(),
            1.0,
        );
        let result = tracer.trace(&scene, &[ray_east(PolarizationState::linear(0.0, 1.0))]);
        assert!(!result.completed);
        assert_eq!(result.visits.len(), 2);
    }

    #[test]
    fn test_path_length_accumulates() {
        let scene = Scene::new(
            vec![surface("a", 10.0, 0.0, SurfaceKind::Attenuator { factor: 0.5 })],
            1.0,
        );
        let result = LightTracer::default().trace(&scene, &[ray_east(PolarizationState::linear(0.0, 1.0))]);
        assert_eq!(result.segments.len(), 2);
        assert_abs_diff_eq!(result.segments[0].path_length, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.segments[1].path_length, 1000.0, epsilon = 1e-9);
        assert_eq!(result.segments[1].parent_segment, Some(0));
    }

    #[test]
    fn test_ambient_transmittance_dims_escaping_light() {
        let scene = Scene::new(Vec::new(), 0.5);
        let result = LightTracer::default().trace(&scene, &[ray_east(PolarizationState::linear(0.0, 1.0))]);
        assert_abs_diff_eq!(result.segments[0].intensity, 0.5, epsilon = 1e-12);
    }
}
