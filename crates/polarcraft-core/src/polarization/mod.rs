//! Polarization algebra.
//!
//! Light is carried through the tracer as a [`PolarizationState`]: a 2×2
//! Hermitian coherency matrix $\mathbf{J} = \langle \mathbf{E}\mathbf{E}^\dagger \rangle$
//! that describes fully, partially and un-polarized light alike. Fully
//! coherent states additionally keep their Jones field so that light from a
//! single source can interfere with itself.
//!
//! - [`state`]: The coherency-matrix state and its superposition rules.
//! - [`jones`]: Jones matrices for the ideal elements.
//! - [`stokes`]: The measurable four-parameter Stokes description.
//! - [`mueller`]: 4×4 Mueller matrices acting on Stokes vectors.
//! - [`classify`]: Semantic classification of a state.

pub mod classify;
pub mod jones;
pub mod mueller;
pub mod state;
pub mod stokes;

pub use classify::{analyze, Handedness, PolarizationCategory, StateDescription};
pub use mueller::MuellerMatrix;
pub use state::PolarizationState;
pub use stokes::StokesVector;
