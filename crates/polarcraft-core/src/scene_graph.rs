//! Scene graph construction.
//!
//! Editors hand the engine a flat list of [`ComponentRecord`]s, each with a
//! type tag and whatever optional parameters the editor stored. The
//! [`SceneGraphBuilder`] turns each record into a typed [`SceneNode`] whose
//! [`Element`] variant carries exactly the parameters its kind needs, then
//! maps nodes onto tracer inputs: an [`OpticalSurface`], a [`LightRay`], a
//! [`DetectionPoint`], or nothing at all.
//!
//! Nothing here fails loudly. A record with an unknown type, a missing
//! required parameter or a non-finite number is dropped with a `debug!` log,
//! and the rest of the scene is built without it.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::polarization::{jones, PolarizationState};
use crate::scene::DetectionPoint;
use crate::surface::{OpticalSurface, SplitKind, SurfaceKind};
use crate::types::{ElementKind, LightRay, Point3, RayId};

/// Emitter polarization value marking an unpolarized source.
pub const UNPOLARIZED_SENTINEL: f64 = -1.0;

const DEFAULT_WAVELENGTH_NM: f64 = 550.0;

/// A component as stored by an external editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarization: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retardation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflect_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attenuation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wavelength_nm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
}

impl ComponentRecord {
    fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        [self.x, self.y]
            .into_iter()
            .chain(self.angle)
            .chain(self.polarization)
            .chain(self.retardation)
            .chain(self.reflect_angle)
            .chain(self.rotation)
            .chain(self.attenuation)
            .chain(self.wavelength_nm)
            .chain(self.intensity)
    }
}

/// Decode a JSON component list.
///
/// Accepts either a bare array or an object with a `components` array.
/// Returns `None` when the document is not valid JSON or has neither shape;
/// individual records that fail to decode are dropped.
pub fn decode_components(json: &str) -> Option<Vec<ComponentRecord>> {
    let value: Value = serde_json::from_str(json).ok()?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("components") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };
    let records = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(err) => {
                debug!("component {} dropped: {}", i, err);
                None
            }
        })
        .collect();
    Some(records)
}

/// Initial polarization of an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmitterPolarization {
    Linear { angle_deg: f64 },
    Unpolarized,
}

impl EmitterPolarization {
    pub fn state(&self, intensity: f64) -> PolarizationState {
        match *self {
            Self::Linear { angle_deg } => PolarizationState::linear(angle_deg, intensity),
            Self::Unpolarized => PolarizationState::unpolarized(intensity),
        }
    }
}

/// How a splitter component separates light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    Pbs,
    Calcite,
}

impl SplitType {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "pbs" => Some(Self::Pbs),
            "calcite" => Some(Self::Calcite),
            _ => None,
        }
    }
}

/// Typed element parameters, one variant per element kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Emitter {
        direction_deg: f64,
        polarization: EmitterPolarization,
        intensity: f64,
        wavelength_nm: f64,
    },
    Polarizer {
        axis_deg: f64,
    },
    Waveplate {
        retardance_deg: f64,
        fast_axis_deg: f64,
    },
    Mirror {
        reflect_angle_deg: f64,
    },
    Splitter {
        split: SplitType,
        axis_deg: f64,
    },
    Sensor,
    Lens,
    Rotator {
        angle_deg: f64,
    },
    Attenuator {
        factor: f64,
    },
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Emitter { .. } => ElementKind::Emitter,
            Self::Polarizer { .. } => ElementKind::Polarizer,
            Self::Waveplate { .. } => ElementKind::Waveplate,
            Self::Mirror { .. } => ElementKind::Mirror,
            Self::Splitter { .. } => ElementKind::Splitter,
            Self::Sensor => ElementKind::Sensor,
            Self::Lens => ElementKind::Lens,
            Self::Rotator { .. } => ElementKind::Rotator,
            Self::Attenuator { .. } => ElementKind::Attenuator,
        }
    }
}

/// A typed, immutable scene node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: String,
    pub position: Point3,
    pub normal: Point3,
    pub element: Element,
}

impl SceneNode {
    pub fn kind(&self) -> ElementKind {
        self.element.kind()
    }

    /// Emitted intensity, zero for anything but an emitter.
    pub fn emitted_intensity(&self) -> f64 {
        match self.element {
            Element::Emitter { intensity, .. } => intensity,
            _ => 0.0,
        }
    }

    /// Wavelength of an emitter.
    pub fn wavelength_nm(&self) -> Option<f64> {
        match self.element {
            Element::Emitter { wavelength_nm, .. } => Some(wavelength_nm),
            _ => None,
        }
    }
}

fn in_plane(angle_deg: f64) -> Point3 {
    let (c, s) = jones::cos_sin_deg(angle_deg);
    [c, s, 0.0]
}

/// Maps component records to scene nodes and scene nodes to tracer inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraphBuilder {
    calcite_walk_off: f64,
}

impl Default for SceneGraphBuilder {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl SceneGraphBuilder {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            calcite_walk_off: config.calcite_walk_off,
        }
    }

    /// Build a typed node, or `None` for unknown or incomplete records.
    pub fn node_from_component(&self, record: &ComponentRecord) -> Option<SceneNode> {
        let Some(kind) = ElementKind::parse(&record.kind) else {
            debug!("{}: unknown element type {:?}", record.id, record.kind);
            return None;
        };
        if let Some(bad) = record.numbers().find(|v| !v.is_finite()) {
            debug!("{}: non-finite parameter {}", record.id, bad);
            return None;
        }

        let angle = record.angle.unwrap_or(0.0);
        let axis = record.polarization.or(record.angle).unwrap_or(0.0);
        let mut normal = in_plane(angle);

        let element = match kind {
            ElementKind::Emitter => {
                let intensity = record.intensity.unwrap_or(1.0);
                let wavelength_nm = record.wavelength_nm.unwrap_or(DEFAULT_WAVELENGTH_NM);
                if intensity < 0.0 || wavelength_nm <= 0.0 {
                    debug!("{}: emitter needs intensity >= 0 and a positive wavelength", record.id);
                    return None;
                }
                let polarization = match record.polarization {
                    Some(p) if p == UNPOLARIZED_SENTINEL => EmitterPolarization::Unpolarized,
                    Some(p) => EmitterPolarization::Linear { angle_deg: p },
                    None => EmitterPolarization::Linear { angle_deg: 0.0 },
                };
                Element::Emitter {
                    direction_deg: angle,
                    polarization,
                    intensity,
                    wavelength_nm,
                }
            }
            ElementKind::Polarizer => Element::Polarizer { axis_deg: axis },
            ElementKind::Waveplate => Element::Waveplate {
                retardance_deg: required(record, "retardation", record.retardation)?,
                fast_axis_deg: axis,
            },
            ElementKind::Mirror => {
                let reflect_angle_deg = required(record, "reflectAngle", record.reflect_angle)?;
                let (c, s) = jones::cos_sin_deg(reflect_angle_deg);
                normal = [-s, c, 0.0];
                Element::Mirror { reflect_angle_deg }
            }
            ElementKind::Splitter => {
                let split = match record.split_type.as_deref() {
                    None => SplitType::Pbs,
                    Some(tag) => match SplitType::parse(tag) {
                        Some(split) => split,
                        None => {
                            debug!("{}: unknown split type {:?}", record.id, tag);
                            return None;
                        }
                    },
                };
                Element::Splitter { split, axis_deg: axis }
            }
            ElementKind::Sensor => Element::Sensor,
            ElementKind::Lens => Element::Lens,
            ElementKind::Rotator => Element::Rotator {
                angle_deg: required(record, "rotation", record.rotation)?,
            },
            ElementKind::Attenuator => Element::Attenuator {
                factor: required(record, "attenuation", record.attenuation)?.clamp(0.0, 1.0),
            },
        };

        Some(SceneNode {
            id: record.id.clone(),
            position: [record.x, record.y, 0.0],
            normal,
            element,
        })
    }

    /// Build nodes for every usable record, preserving order.
    pub fn nodes_from_components(&self, records: &[ComponentRecord]) -> Vec<SceneNode> {
        records
            .iter()
            .filter_map(|r| self.node_from_component(r))
            .collect()
    }

    /// The optical surface for a passive element. Emitters, sensors and
    /// lenses have none.
    pub fn surface_from_node(&self, node: &SceneNode) -> Option<OpticalSurface> {
        let kind = match node.element {
            Element::Polarizer { axis_deg } => SurfaceKind::Polarizer { axis_deg },
            Element::Waveplate {
                retardance_deg,
                fast_axis_deg,
            } => SurfaceKind::Waveplate {
                retardance_deg,
                fast_axis_deg,
            },
            Element::Mirror { .. } => SurfaceKind::Mirror,
            Element::Splitter { split, axis_deg } => SurfaceKind::Splitter {
                split: match split {
                    SplitType::Pbs => SplitKind::Pbs,
                    SplitType::Calcite => SplitKind::Calcite {
                        walk_off: self.calcite_walk_off,
                    },
                },
                axis_deg,
            },
            Element::Rotator { angle_deg } => SurfaceKind::Rotator { angle_deg },
            Element::Attenuator { factor } => SurfaceKind::Attenuator { factor },
            Element::Emitter { .. } | Element::Sensor | Element::Lens => return None,
        };
        Some(OpticalSurface {
            id: node.id.clone(),
            position: node.position,
            normal: node.normal,
            kind,
        })
    }

    /// The ray an emitter launches this tick. `root` becomes the root of its
    /// lineage.
    pub fn ray_from_node(&self, node: &SceneNode, root: u32) -> Option<LightRay> {
        match node.element {
            Element::Emitter {
                direction_deg,
                polarization,
                intensity,
                wavelength_nm,
            } => Some(LightRay {
                id: RayId::root(root),
                source_id: node.id.clone(),
                origin: node.position,
                direction: in_plane(direction_deg),
                state: polarization.state(intensity),
                wavelength_nm,
            }),
            _ => None,
        }
    }

    pub fn detector_from_node(&self, node: &SceneNode) -> Option<DetectionPoint> {
        match node.element {
            Element::Sensor => Some(DetectionPoint {
                id: node.id.clone(),
                position: node.position,
            }),
            _ => None,
        }
    }
}

fn required(record: &ComponentRecord, name: &str, value: Option<f64>) -> Option<f64> {
    if value.is_none() {
        debug!("{}: {} is missing {}", record.id, record.kind, name);
    }
    value
}
