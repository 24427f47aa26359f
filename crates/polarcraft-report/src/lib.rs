//! # PolarCraft Report
//!
//! Read-only consumers of a [`WorldState`](polarcraft_core::world::WorldState).
//!
//! - [`visual`]: the visual contract, the only approved route from a world
//!   state to renderable primitives.
//! - [`report`]: structured phenomenon reports with causal explanations for
//!   inactive sensors.
//! - [`color`]: wavelength and polarization color derivation.

pub mod color;
pub mod report;
pub mod visual;

pub use report::{generate, PhenomenonReport};
pub use visual::{to_renderable_segment, to_renderable_sensor, ColorMode, RenderableSegment, RenderableSensor};
