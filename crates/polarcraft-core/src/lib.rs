//! # PolarCraft Core
//!
//! The deterministic physics engine behind PolarCraft. This crate turns a
//! declarative description of idealized optical elements into an immutable
//! [`world::WorldState`]: the polarization state and intensity of every beam
//! segment, the reading of every sensor, and a per-element record of which
//! physical law acted on the light.
//!
//! ## Architecture
//!
//! Callers construct a [`engine::SimulationEngine`] and call
//! [`engine::SimulationEngine::simulate`]. Internally the engine maps scene
//! nodes to optical surfaces and light rays ([`scene_graph`]), propagates the
//! rays through the [`scene::Scene`] ([`tracer`]), and aggregates the trace
//! into sensor readings and interaction records.
//!
//! ## Modules
//!
//! - [`polarization`]: Coherency-matrix state, Stokes vectors, Mueller
//!   matrices and the state classifier.
//! - [`surface`]: The six optical surface models.
//! - [`scene`]: Ordered surfaces plus detection points.
//! - [`tracer`]: Iterative ray propagation.
//! - [`scene_graph`]: External component records to typed scene nodes.
//! - [`engine`]: The simulation loop, sensor aggregation and interaction
//!   recording.
//! - [`world`]: The immutable per-tick snapshot.
//! - [`config`]: Engine configuration knobs.
//! - [`thresholds`]: Shared numerical thresholds.

pub mod config;
pub mod engine;
pub mod polarization;
pub mod scene;
pub mod scene_graph;
pub mod surface;
pub mod thresholds;
pub mod tracer;
pub mod types;
pub mod world;
