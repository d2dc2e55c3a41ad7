/*
Propagation driver

VelocityVerlet owns the system state and runs max_step iterations of

    diagnostics from the current v  ->  step (plain or thermostatted)
    ->  periodic trajectory frame    ->  t = step * dt

The kinetic energy and temperature reported for a step are those of the
state going into it, one step behind the positions written with the frame.
Any error raised by the force field or the sink stops the run.
 */

use crate::config::MdConfig;
use crate::constants::effective_temperature;
use crate::error::{MdError, Result};
use crate::integrator::{accelerations, velocity_verlet_step, ForceField};
use crate::kinetic::kinetic_energy;
use crate::masses::masses_for;
use crate::system::{initial_velocities, Geometry, MdState};
use crate::thermostat::Thermostat;
use crate::trajectory::TrajectorySink;
use kdam::{Bar, BarBuilder, BarExt};
use nalgebra::Vector3;
use serde::Serialize;

pub type VelocityHistory = Vec<Vec<Vector3<f64>>>;

/// Diagnostics for one iteration of the driver loop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StepRecord {
    pub step: usize,
    pub time: f64,           // fs
    pub kinetic_energy: f64, // J/mol per atom
    pub temperature: f64,    // K
}

/// Progress bar over the step loop, `None` unless `progress_bar` is set.
/// kdam draws an exhausted bar even with `disable`, so none is built at all.
pub(crate) fn progress_bar(config: &MdConfig, label: String) -> Result<Option<Bar>> {
    if !config.progress_bar {
        return Ok(None);
    }
    let bar = BarBuilder::default()
        .total(config.max_step)
        .desc(label)
        .build()
        .map_err(MdError::config)?;
    Ok(Some(bar))
}

pub struct VelocityVerlet<F: ForceField> {
    name: String,
    config: MdConfig,
    force: F,
    state: MdState,
    thermostat: Option<Thermostat>,
    history: Vec<StepRecord>,
}

impl<F: ForceField> VelocityVerlet<F> {
    /// Masses are looked up from the element symbols of `geometry`.
    pub fn new(force: F, geometry: Geometry, config: MdConfig) -> Result<Self> {
        let masses = masses_for(&geometry.atoms)?;
        Self::with_masses(force, geometry, masses, config)
    }

    pub fn with_masses(
        force: F,
        geometry: Geometry,
        masses: Vec<f64>,
        config: MdConfig,
    ) -> Result<Self> {
        config.validate()?;
        let mut state = MdState::new(&geometry, masses)?;
        state.velocities = initial_velocities(&config, &state.masses);
        state.accelerations = accelerations(&force, &state.positions, &state.masses)?;
        let thermostat = Thermostat::new(&state.masses, &mut state.velocities, &config)?;
        state.kinetic_energy = kinetic_energy(&state.velocities, &state.masses)?;

        Ok(VelocityVerlet {
            name: String::new(),
            config,
            force,
            state,
            thermostat,
            history: Vec::new(),
        })
    }

    /// Label used by the progress bar.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn state(&self) -> &MdState {
        &self.state
    }

    pub fn thermostat(&self) -> Option<&Thermostat> {
        self.thermostat.as_ref()
    }

    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    pub fn propagate(&mut self, sink: &mut dyn TrajectorySink) -> Result<Option<VelocityHistory>> {
        let dt = self.config.dt;
        let mut velocity_history = self.config.log_velocity.then(Vec::new);
        let mut bar = progress_bar(&self.config, format!("MD {}", self.name))?;

        for step in 0..self.config.max_step {
            self.state.time = step as f64 * dt;
            self.state.kinetic_energy = kinetic_energy(&self.state.velocities, &self.state.masses)?;
            let teff = effective_temperature(self.state.kinetic_energy);

            let state = &self.state;
            let out = match &mut self.thermostat {
                Some(thermostat) => thermostat.step(
                    &self.force,
                    &state.accelerations,
                    &state.positions,
                    &state.velocities,
                    &state.masses,
                    dt,
                )?,
                None => velocity_verlet_step(
                    &self.force,
                    &state.accelerations,
                    &state.positions,
                    &state.velocities,
                    &state.masses,
                    dt,
                )?,
            };
            self.state.apply(out);

            if self.config.log_trajectory && step % self.config.trajectory_interval == 0 {
                sink.write_frame(&self.state.frame())?;
            }
            if let Some(history) = velocity_history.as_mut() {
                history.push(self.state.velocities.clone());
            }

            let record = StepRecord {
                step: step + 1,
                time: self.state.time,
                kinetic_energy: self.state.kinetic_energy,
                temperature: teff,
            };
            log::info!(
                "Step: {} time: {:.1}(fs) <KE>(J): {:.5} Teff(K): {:.5}",
                record.step,
                record.time,
                record.kinetic_energy,
                record.temperature
            );
            self.history.push(record);
            if let Some(pb) = bar.as_mut() {
                pb.update(1)?;
            }
        }
        self.state.time = self.config.max_step as f64 * dt;
        Ok(velocity_history)
    }
}
