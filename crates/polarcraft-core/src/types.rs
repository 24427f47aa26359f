//! Core types shared across the simulation pipeline: element kinds, ray
//! lineage, light rays and raw trace segments.

use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::polarization::PolarizationState;

/// A position or direction in scene units, `[x, y, z]`.
pub type Point3 = [f64; 3];

pub(crate) fn to_vector(p: &Point3) -> Vector3<f64> {
    Vector3::new(p[0], p[1], p[2])
}

pub(crate) fn to_point(v: &Vector3<f64>) -> Point3 {
    [v.x, v.y, v.z]
}

/// Euclidean distance between two points.
pub fn distance(a: &Point3, b: &Point3) -> f64 {
    (to_vector(a) - to_vector(b)).norm()
}

/// The kind of a component placed in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Emitter,
    Polarizer,
    Waveplate,
    Mirror,
    Splitter,
    Sensor,
    Lens,
    Rotator,
    Attenuator,
}

impl ElementKind {
    pub const ALL: [ElementKind; 9] = [
        Self::Emitter,
        Self::Polarizer,
        Self::Waveplate,
        Self::Mirror,
        Self::Splitter,
        Self::Sensor,
        Self::Lens,
        Self::Rotator,
        Self::Attenuator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emitter => "emitter",
            Self::Polarizer => "polarizer",
            Self::Waveplate => "waveplate",
            Self::Mirror => "mirror",
            Self::Splitter => "splitter",
            Self::Sensor => "sensor",
            Self::Lens => "lens",
            Self::Rotator => "rotator",
            Self::Attenuator => "attenuator",
        }
    }

    /// Parse an external type tag. Matching ignores case and surrounding
    /// whitespace; unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        Self::ALL.iter().copied().find(|k| k.as_str() == tag)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured ray lineage.
///
/// A root ray is launched by emitter number `root`. Each time a splitter
/// spawns a child, the child's id is the parent's id extended by the parent's
/// next split index (starting at 1). Displayed as `r0`, `r0.1`, `r0.1.2`, …
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RayId {
    pub root: u32,
    pub splits: Vec<u32>,
}

impl RayId {
    pub fn root(root: u32) -> Self {
        Self {
            root,
            splits: Vec::new(),
        }
    }

    pub fn child(&self, split_index: u32) -> Self {
        let mut splits = self.splits.clone();
        splits.push(split_index);
        Self {
            root: self.root,
            splits,
        }
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.splits.split_last()?;
        Some(Self {
            root: self.root,
            splits: rest.to_vec(),
        })
    }

    /// Index of the split that created this ray, `None` for a root ray.
    pub fn split_index(&self) -> Option<u32> {
        self.splits.last().copied()
    }

    /// Number of splits between the emitter and this ray.
    pub fn depth(&self) -> usize {
        self.splits.len()
    }
}

impl fmt::Display for RayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.root)?;
        for s in &self.splits {
            write!(f, ".{}", s)?;
        }
        Ok(())
    }
}

/// A ray launched by an emitter at the start of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRay {
    pub id: RayId,
    /// Id of the emitter node that launched the ray.
    pub source_id: String,
    pub origin: Point3,
    /// Propagation direction (unit vector).
    pub direction: Point3,
    pub state: PolarizationState,
    pub wavelength_nm: f64,
}

/// Why a trace segment ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "lowercase")]
pub enum SegmentEnd {
    /// The ray reached the surface with this index in the scene.
    Surface(usize),
    /// The ray was absorbed by the detection point with this index.
    Detector(usize),
    /// The ray left the scene boundary.
    Escaped,
}

/// One straight piece of a traced ray.
#[derive(Debug, Clone, PartialEq)]
pub struct RaySegment {
    /// Position in the trace's segment list.
    pub index: usize,
    pub ray_id: RayId,
    pub source_id: String,
    pub start: Point3,
    pub end: Point3,
    pub direction: Point3,
    pub state: PolarizationState,
    pub intensity: f64,
    /// The segment this one continues from: the ray's previous hop, or the
    /// hop that ended at the splitter which spawned it.
    pub parent_segment: Option<usize>,
    /// Geometric path length from the emitter to `end`.
    pub path_length: f64,
    pub termination: SegmentEnd,
}
