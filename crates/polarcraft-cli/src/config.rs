//! TOML job files.
//!
//! A job names a scene, optionally overrides engine knobs, and lists its
//! components inline or points at an editor's JSON export:
//!
//! ```toml
//! [scene]
//! name = "crossed polarizers"
//!
//! [engine]
//! activation_threshold = 0.1
//!
//! [[component]]
//! id = "e1"
//! type = "emitter"
//! x = 0
//! y = 0
//! polarization = -1
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;
use serde::Deserialize;

use polarcraft_core::config::EngineConfig;
use polarcraft_core::scene_graph::{decode_components, ComponentRecord};
use polarcraft_report::ColorMode;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default, rename = "component")]
    pub components: Vec<ComponentRecord>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_scene_name")]
    pub name: String,
    /// JSON component list exported by an editor, relative to the job file.
    #[serde(default)]
    pub components_file: Option<PathBuf>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: default_scene_name(),
            components_file: None,
        }
    }
}

fn default_scene_name() -> String {
    "untitled".into()
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save beam segments as CSV (default: true).
    #[serde(default = "default_true")]
    pub save_segments: bool,
    /// Whether to also save the full world state as JSON (default: false).
    #[serde(default)]
    pub save_world: bool,
    /// Whether to save renderable primitives as JSON (default: false).
    #[serde(default)]
    pub save_render: bool,
    /// Color encoding for renderable segments.
    #[serde(default)]
    pub color_mode: ColorMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_segments: true,
            save_world: false,
            save_render: false,
            color_mode: ColorMode::default(),
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}

fn default_true() -> bool {
    true
}

/// Load and parse a TOML job file, pulling in any referenced component
/// export.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut job: JobConfig =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

    if let Some(file) = &job.scene.components_file {
        let full = path.parent().unwrap_or_else(|| Path::new(".")).join(file);
        let json = std::fs::read_to_string(&full)
            .with_context(|| format!("reading components from {}", full.display()))?;
        let Some(records) = decode_components(&json) else {
            bail!("{} is not a component list", full.display());
        };
        info!("{} component(s) loaded from {}", records.len(), full.display());
        job.components.extend(records);
    }

    Ok(job)
}

impl JobConfig {
    /// Check the engine knobs and that the scene has something to simulate.
    pub fn validate(&self) -> Result<()> {
        self.engine.validate().context("invalid [engine] settings")?;
        if self.components.is_empty() {
            bail!("scene '{}' has no components", self.scene.name);
        }
        Ok(())
    }
}
