//! Engine configuration.
//!
//! Every knob has a default and can be overridden per engine instance, either
//! in code or from the `[engine]` table of a job file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from validating an [`EngineConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive finite number, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must lie in [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },

    #[error("{name} must be at least 1")]
    ZeroBudget { name: &'static str },
}

/// Tunable parameters of a [`SimulationEngine`](crate::engine::SimulationEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum combined intensity for a sensor to count as activated.
    pub activation_threshold: f64,
    /// Total ray advances allowed per tick.
    pub max_iterations: usize,
    /// Surface interactions allowed per ray.
    pub max_bounces: u32,
    /// Rays dimmer than this are discarded by the tracer.
    pub intensity_cutoff: f64,
    /// Minimum distance a ray travels before it can hit anything, keeping it
    /// off the surface it just left.
    pub step_size: f64,
    /// Radius around the origin beyond which a ray has escaped.
    pub scene_boundary: f64,
    /// Distance within which a ray reaches a sensor.
    pub sensor_radius: f64,
    /// Distance within which a ray hits an optical element.
    pub surface_aperture: f64,
    /// Transmittance applied to light leaving the scene.
    pub ambient_transmittance: f64,
    /// Slack allowed when checking that output energy does not exceed input.
    pub energy_tolerance: f64,
    /// Sideways displacement of a calcite e-ray.
    pub calcite_walk_off: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 0.05,
            max_iterations: 10_000,
            max_bounces: 50,
            intensity_cutoff: 1e-6,
            step_size: 0.1,
            scene_boundary: 1000.0,
            sensor_radius: 2.0,
            surface_aperture: 2.0,
            ambient_transmittance: 1.0,
            energy_tolerance: 1e-6,
            calcite_walk_off: 4.0,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

impl EngineConfig {
    /// Check every knob for a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("activation_threshold", self.activation_threshold)?;
        unit("ambient_transmittance", self.ambient_transmittance)?;
        positive("intensity_cutoff", self.intensity_cutoff)?;
        positive("step_size", self.step_size)?;
        positive("scene_boundary", self.scene_boundary)?;
        positive("sensor_radius", self.sensor_radius)?;
        positive("surface_aperture", self.surface_aperture)?;
        positive("energy_tolerance", self.energy_tolerance)?;
        if !(self.calcite_walk_off.is_finite() && self.calcite_walk_off >= 0.0) {
            return Err(ConfigError::NotPositive {
                name: "calcite_walk_off",
                value: self.calcite_walk_off,
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroBudget { name: "max_iterations" });
        }
        if self.max_bounces == 0 {
            return Err(ConfigError::ZeroBudget { name: "max_bounces" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.activation_threshold, 0.05);
        assert_eq!(config.max_iterations, 10_000);
        assert_eq!(config.max_bounces, 50);
        assert_eq!(config.intensity_cutoff, 1e-6);
        assert_eq!(config.step_size, 0.1);
        assert_eq!(config.scene_boundary, 1000.0);
        assert_eq!(config.sensor_radius, 2.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = EngineConfig {
            activation_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange { name: "activation_threshold", .. })
        ));

        let config = EngineConfig {
            step_size: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroBudget { name: "max_iterations" }));
    }

    #[test]
    fn test_partial_override_from_json() {
        let config: EngineConfig = serde_json::from_str(r#"{"max_bounces": 3}"#).unwrap();
        assert_eq!(config.max_bounces, 3);
        assert_eq!(config.sensor_radius, 2.0);
    }
}
