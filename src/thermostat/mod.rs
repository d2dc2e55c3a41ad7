/*
Thermostats

Every variant advances (x, v, a) by one step with the same contract as the
plain velocity verlet kernel, with its own temperature control interposed.
The variant set is fixed, so dispatch is a closed enum rather than a trait
object.

Construction rescales the initial velocities to the target temperature once;
it is never repeated during the run.
 */

pub mod nose_hoover;
pub mod nose_hoover_chain;
pub mod rescaling;

pub use nose_hoover::{NoseHoover, NosePerParticle};
pub use nose_hoover_chain::{suzuki_yoshida_weights, NoseHooverChain};
pub use rescaling::Rescaling;

use crate::config::{MdConfig, ThermostatKind};
use crate::error::{MdError, Result};
use crate::integrator::{ForceField, PhasePoint};
use crate::kinetic::{atom_temperature, temperature};
use nalgebra::Vector3;

#[derive(Clone, Debug)]
pub enum Thermostat {
    Rescaling(Rescaling),
    Nose(NoseHoover),
    NosePerParticle(NosePerParticle),
    NoseHooverChain(NoseHooverChain),
}

impl Thermostat {
    /// Builds the thermostat selected by `config.thermostat` and rescales
    /// `velocities` to its target temperature. Returns `None` for
    /// unthermostated dynamics.
    pub fn new(
        masses: &[f64],
        velocities: &mut [Vector3<f64>],
        config: &MdConfig,
    ) -> Result<Option<Thermostat>> {
        if masses.is_empty() {
            return Err(MdError::EmptySystem);
        }
        MdError::check_len("velocities", masses.len(), velocities.len())?;

        let thermostat = match config.thermostat {
            ThermostatKind::None => {
                log::info!("Unthermostated Velocity Verlet.");
                return Ok(None);
            }
            ThermostatKind::Rescaling => Thermostat::Rescaling(Rescaling::new(masses, config)),
            ThermostatKind::Nose => Thermostat::Nose(NoseHoover::new(masses, config)),
            ThermostatKind::NosePerParticle => {
                Thermostat::NosePerParticle(NosePerParticle::new(masses, config))
            }
            ThermostatKind::NoseHooverChain => {
                Thermostat::NoseHooverChain(NoseHooverChain::new(masses, config)?)
            }
        };

        let rescaled = thermostat.rescale(velocities)?;
        velocities.copy_from_slice(&rescaled);
        log::info!(
            "Using {} thermostat at {} degrees Kelvin",
            thermostat.name(),
            thermostat.target_temperature()
        );
        Ok(Some(thermostat))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Thermostat::Rescaling(_) => "Rescaling",
            Thermostat::Nose(_) => "Nose",
            Thermostat::NosePerParticle(_) => "NosePerParticle",
            Thermostat::NoseHooverChain(_) => "NoseHooverChain",
        }
    }

    pub fn target_temperature(&self) -> f64 {
        match self {
            Thermostat::Rescaling(t) => t.temperature,
            Thermostat::Nose(t) => t.temperature,
            Thermostat::NosePerParticle(t) => t.temperature,
            Thermostat::NoseHooverChain(t) => t.temperature,
        }
    }

    /// One thermostatted step; same inputs and outputs as `velocity_verlet_step`.
    pub fn step<F: ForceField + ?Sized>(
        &mut self,
        force: &F,
        accelerations: &[Vector3<f64>],
        positions: &[Vector3<f64>],
        velocities: &[Vector3<f64>],
        masses: &[f64],
        dt: f64,
    ) -> Result<PhasePoint> {
        match self {
            Thermostat::Rescaling(t) => {
                t.step(force, accelerations, positions, velocities, masses, dt)
            }
            Thermostat::Nose(t) => t.step(force, accelerations, positions, velocities, masses, dt),
            Thermostat::NosePerParticle(t) => {
                t.step(force, accelerations, positions, velocities, masses, dt)
            }
            Thermostat::NoseHooverChain(t) => {
                t.step(force, accelerations, positions, velocities, masses, dt)
            }
        }
    }

    /// Velocities brought to the target temperature. The per-particle
    /// variant does this atom by atom, the others rescale the whole sample.
    pub fn rescale(&self, velocities: &[Vector3<f64>]) -> Result<Vec<Vector3<f64>>> {
        match self {
            Thermostat::NosePerParticle(t) => {
                Ok(rescale_each_atom(velocities, &t.masses, t.temperature))
            }
            Thermostat::Rescaling(t) => {
                rescale_to_temperature(velocities, &t.masses, t.temperature)
            }
            Thermostat::Nose(t) => rescale_to_temperature(velocities, &t.masses, t.temperature),
            Thermostat::NoseHooverChain(t) => {
                rescale_to_temperature(velocities, &t.masses, t.temperature)
            }
        }
    }
}

/// Uniformly scales all velocities so the effective temperature equals
/// `target`. A sample at rest is returned unchanged.
pub fn rescale_to_temperature(
    velocities: &[Vector3<f64>],
    masses: &[f64],
    target: f64,
) -> Result<Vec<Vector3<f64>>> {
    let current = temperature(velocities, masses)?;
    if current == 0.0 {
        return Ok(velocities.to_vec()); // Avoid division by zero
    }
    let lambda = (target / current).sqrt();
    Ok(velocities.iter().map(|v| v * lambda).collect())
}

// Do this elementwise otherwise H's blow off.
pub fn rescale_each_atom(
    velocities: &[Vector3<f64>],
    masses: &[f64],
    target: f64,
) -> Vec<Vector3<f64>> {
    velocities
        .iter()
        .zip(masses)
        .map(|(v, &m)| {
            let current = atom_temperature(v, m);
            if current == 0.0 {
                *v
            } else {
                v * (target / current).sqrt()
            }
        })
        .collect()
}
