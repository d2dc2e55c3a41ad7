/*
Run configuration

Everything the driver and the thermostats need is read once from an MdConfig
at construction; nothing is re-read while the trajectory is being propagated.
 */

use crate::error::{MdError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThermostatKind {
    None,
    Rescaling,
    Nose,
    NosePerParticle,
    NoseHooverChain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialVelocity {
    Zero,
    Random,
}

/// Equipartition target used by each atom's friction variable in the
/// per-particle Nose thermostat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerParticleDof {
    /// (3N+1)/2 kT summed over the whole system, applied to every atom
    System,
    /// 3/2 kT per atom
    Atom,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub direction: [f64; 3],
    pub amplitude: f64,
    pub t0: f64,        // center of the pulse (fs)
    pub tau: f64,       // width of the gaussian envelope (fs)
    pub frequency: f64, // carrier frequency (1/fs), 700nm light is about 1/1.2 fs
    pub update_charges: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            direction: [1.0, 0.0, 0.0],
            amplitude: 1.0,
            t0: 3.0,
            tau: 1.2,
            frequency: 1.0 / 1.2,
            update_charges: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdConfig {
    pub max_step: usize,
    pub temperature: f64, // K
    pub dt: f64,          // fs
    pub thermostat: ThermostatKind,
    pub chain_length: usize,
    pub chain_trotter_steps: usize,
    pub chain_quadrature_points: usize,
    pub relaxation_time: Option<f64>, // fs
    pub per_particle_dof: PerParticleDof,
    pub initial_velocity: InitialVelocity,
    pub seed: Option<u64>,
    pub log_trajectory: bool,
    pub trajectory_interval: usize,
    pub log_velocity: bool,
    pub dipole_log_interval: usize,
    pub progress_bar: bool,
    pub field: FieldConfig,
}

impl Default for MdConfig {
    fn default() -> Self {
        Self {
            max_step: 20000,
            temperature: 300.0,
            dt: 0.2,
            thermostat: ThermostatKind::None,
            chain_length: 3,
            chain_trotter_steps: 2,
            chain_quadrature_points: 3,
            relaxation_time: None,
            per_particle_dof: PerParticleDof::System,
            initial_velocity: InitialVelocity::Zero,
            seed: None,
            log_trajectory: false,
            trajectory_interval: 3,
            log_velocity: false,
            dipole_log_interval: 100,
            progress_bar: false,
            field: FieldConfig::default(),
        }
    }
}

impl MdConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MdConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Relaxation time of the thermostat, falling back to `steps * dt`.
    pub fn relaxation_time_or(&self, steps: f64) -> f64 {
        self.relaxation_time.unwrap_or(steps * self.dt)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(MdError::config(format!("dt must be positive, got {}", self.dt)));
        }
        if !(self.temperature.is_finite() && self.temperature >= 0.0) {
            return Err(MdError::config(format!(
                "temperature must be non-negative, got {}",
                self.temperature
            )));
        }
        if self.thermostat != ThermostatKind::None && self.temperature == 0.0 {
            return Err(MdError::config("a thermostat needs a positive target temperature"));
        }
        if self.trajectory_interval == 0 || self.dipole_log_interval == 0 {
            return Err(MdError::config("logging intervals must be at least 1"));
        }
        if self.chain_trotter_steps == 0 {
            return Err(MdError::config("chain_trotter_steps must be at least 1"));
        }
        if !matches!(self.chain_quadrature_points, 3 | 5) {
            return Err(MdError::UnsupportedQuadrature(self.chain_quadrature_points));
        }
        if let Some(tau) = self.relaxation_time {
            if !(tau.is_finite() && tau > 0.0) {
                return Err(MdError::config(format!(
                    "relaxation_time must be positive, got {tau}"
                )));
            }
        }
        if !(self.field.tau.is_finite() && self.field.tau > 0.0) {
            return Err(MdError::config("field pulse width must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_validate() {
        let config = MdConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trajectory_interval, 3);
        assert_relative_eq!(config.relaxation_time_or(30.0), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MdConfig::from_json_str(
            r#"{ "thermostat": "NoseHooverChain", "chain_length": 4, "dt": 0.5,
                 "field": { "amplitude": 5.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.thermostat, ThermostatKind::NoseHooverChain);
        assert_eq!(config.chain_length, 4);
        assert_eq!(config.dt, 0.5);
        assert_eq!(config.max_step, 20000);
        assert_eq!(config.field.amplitude, 5.0);
        assert_eq!(config.field.t0, 3.0);
    }

    #[test]
    fn test_rejects_bad_quadrature() {
        let err = MdConfig::from_json_str(r#"{ "chain_quadrature_points": 4 }"#).unwrap_err();
        assert!(matches!(err, MdError::UnsupportedQuadrature(4)));
    }

    #[test]
    fn test_rejects_non_positive_dt() {
        let config = MdConfig {
            dt: 0.0,
            ..MdConfig::default()
        };
        assert!(matches!(config.validate(), Err(MdError::InvalidConfig(_))));
    }

    #[test]
    fn test_thermostat_needs_temperature() {
        let config = MdConfig {
            temperature: 0.0,
            thermostat: ThermostatKind::Rescaling,
            ..MdConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("md.json");
        std::fs::write(&path, r#"{ "max_step": 10, "log_trajectory": true }"#).unwrap();
        let config = MdConfig::from_json_file(&path).unwrap();
        assert_eq!(config.max_step, 10);
        assert!(config.log_trajectory);
    }
}
