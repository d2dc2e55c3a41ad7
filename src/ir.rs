/*
Field-driven dynamics for IR spectra

A gaussian-enveloped sinusoidal pulse

    E(t) = A sin(2 pi f t) exp(-(t - t0)^2 / (2 tau^2)) / sqrt(2 pi tau^2) * direction

acts on per-atom charges. While the pulse is on, the force is the field-free
force plus q_i E (scaled to J/(mol A)); in both cases the net translational
force is removed before integrating with plain velocity verlet. The dipole
relative to t = 0 is recorded every step for the spectrum.

No thermostat is coupled here.
 */

use crate::config::{FieldConfig, MdConfig, ThermostatKind};
use crate::constants::{effective_temperature, FIELD_FORCE_TO_SI, PULSE_THRESHOLD};
use crate::dynamics::progress_bar;
use crate::error::{MdError, Result};
use crate::integrator::{accelerations, velocity_verlet_step, ForceField};
use crate::kinetic::kinetic_energy;
use crate::masses::masses_for;
use crate::system::{initial_velocities, Geometry, MdState};
use crate::trajectory::{DipoleRecord, TrajectorySink};
use kdam::BarExt;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Maps coordinates to per-atom partial charges.
pub trait ChargeModel {
    fn charges(&self, positions: &[Vector3<f64>]) -> Result<Vec<f64>>;
}

impl<Q> ChargeModel for Q
where
    Q: Fn(&[Vector3<f64>]) -> Result<Vec<f64>>,
{
    fn charges(&self, positions: &[Vector3<f64>]) -> Result<Vec<f64>> {
        self(positions)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pulse {
    pub direction: Vector3<f64>,
    pub amplitude: f64,
    pub t0: f64,
    pub tau: f64,
    pub frequency: f64,
}

impl Pulse {
    pub fn from_config(field: &FieldConfig) -> Self {
        Pulse {
            direction: Vector3::from(field.direction),
            amplitude: field.amplitude,
            t0: field.t0,
            tau: field.tau,
            frequency: field.frequency,
        }
    }

    /// Field vector at `t` and whether it is on.
    pub fn evaluate(&self, t: f64) -> (Vector3<f64>, bool) {
        let carrier = (2.0 * PI * self.frequency * t).sin();
        let envelope = (-(t - self.t0).powi(2) / (2.0 * self.tau * self.tau)).exp()
            / (2.0 * PI * self.tau * self.tau).sqrt();
        let amp = self.amplitude * carrier * envelope;
        if amp.abs() > PULSE_THRESHOLD {
            (self.direction * amp, true)
        } else {
            (Vector3::zeros(), false)
        }
    }
}

pub fn electric_field_force(charges: &[f64], field: &Vector3<f64>) -> Vec<Vector3<f64>> {
    charges.iter().map(|&q| field * q).collect()
}

pub fn dipole(positions: &[Vector3<f64>], charges: &[f64]) -> Vector3<f64> {
    positions
        .iter()
        .zip(charges)
        .fold(Vector3::zeros(), |mu, (x, &q)| mu + x * q)
}

/// Subtracts each atom's mass-weighted share of the net force, leaving the
/// center of mass unaccelerated.
pub fn remove_net_force(forces: &[Vector3<f64>], masses: &[f64]) -> Vec<Vector3<f64>> {
    let net: Vector3<f64> = forces.iter().sum();
    let total_mass: f64 = masses.iter().sum();
    forces
        .iter()
        .zip(masses)
        .map(|(f, &m)| f - net * (m / total_mass))
        .collect()
}

/// Field-free force with the field coupling applied for the current step.
struct FieldCoupledForce<'a, F: ForceField> {
    field_free: &'a F,
    charges: &'a [f64],
    masses: &'a [f64],
    field: Vector3<f64>,
    is_on: bool,
}

impl<F: ForceField> ForceField for FieldCoupledForce<'_, F> {
    fn forces(&self, positions: &[Vector3<f64>]) -> Result<Vec<Vector3<f64>>> {
        let mut forces = self.field_free.forces(positions)?;
        MdError::check_len("forces", self.masses.len(), forces.len())?;
        if self.is_on {
            let field_forces = electric_field_force(self.charges, &self.field);
            for (f, fe) in forces.iter_mut().zip(&field_forces) {
                *f += fe * FIELD_FORCE_TO_SI;
            }
        }
        Ok(remove_net_force(&forces, self.masses))
    }
}

pub struct IrTrajectory<F: ForceField, Q: ChargeModel> {
    name: String,
    config: MdConfig,
    field_free: F,
    charge_model: Q,
    pulse: Pulse,
    state: MdState,
    q0: Vec<f64>,
    mu0: Vector3<f64>,
    charges: Vec<f64>,
    dipole_history: Vec<DipoleRecord>,
}

impl<F: ForceField, Q: ChargeModel> IrTrajectory<F, Q> {
    pub fn new(force: F, charge_model: Q, geometry: Geometry, config: MdConfig) -> Result<Self> {
        let masses = masses_for(&geometry.atoms)?;
        Self::with_masses(force, charge_model, geometry, masses, config)
    }

    pub fn with_masses(
        force: F,
        charge_model: Q,
        geometry: Geometry,
        masses: Vec<f64>,
        config: MdConfig,
    ) -> Result<Self> {
        config.validate()?;
        if config.thermostat != ThermostatKind::None {
            log::warn!(
                "{:?} thermostat is ignored by field-driven dynamics",
                config.thermostat
            );
        }
        let mut state = MdState::new(&geometry, masses)?;
        state.velocities = initial_velocities(&config, &state.masses);
        state.kinetic_energy = kinetic_energy(&state.velocities, &state.masses)?;

        let q0 = charge_model.charges(&state.positions)?;
        MdError::check_len("charges", state.n_atoms(), q0.len())?;
        let mu0 = dipole(&state.positions, &q0);

        let pulse = Pulse::from_config(&config.field);
        let (field, is_on) = pulse.evaluate(0.0);
        let initial_force = FieldCoupledForce {
            field_free: &force,
            charges: &q0,
            masses: &state.masses,
            field,
            is_on,
        };
        state.accelerations = accelerations(&initial_force, &state.positions, &state.masses)?;

        Ok(IrTrajectory {
            name: String::new(),
            config,
            field_free: force,
            charge_model,
            pulse,
            state,
            charges: q0.clone(),
            q0,
            mu0,
            dipole_history: Vec::new(),
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn state(&self) -> &MdState {
        &self.state
    }

    pub fn pulse(&self) -> &Pulse {
        &self.pulse
    }

    /// Charges used on the most recent step.
    pub fn charges(&self) -> &[f64] {
        &self.charges
    }

    pub fn dipole_history(&self) -> &[DipoleRecord] {
        &self.dipole_history
    }

    pub fn propagate(&mut self, sink: &mut dyn TrajectorySink) -> Result<()> {
        let dt = self.config.dt;
        self.dipole_history.reserve(self.config.max_step);
        let mut bar = progress_bar(&self.config, format!("IR {}", self.name))?;

        for step in 0..self.config.max_step {
            self.state.time = step as f64 * dt;
            self.state.kinetic_energy = kinetic_energy(&self.state.velocities, &self.state.masses)?;
            let teff = effective_temperature(self.state.kinetic_energy);

            let (field, is_on) = self.pulse.evaluate(self.state.time);
            self.charges = if self.config.field.update_charges && !is_on {
                let charges = self.charge_model.charges(&self.state.positions)?;
                MdError::check_len("charges", self.state.n_atoms(), charges.len())?;
                charges
            } else {
                self.q0.clone()
            };
            let mu = dipole(&self.state.positions, &self.charges) - self.mu0;
            self.dipole_history.push(DipoleRecord {
                time: self.state.time,
                dipole: mu,
                kinetic_energy: self.state.kinetic_energy,
            });

            let force = FieldCoupledForce {
                field_free: &self.field_free,
                charges: &self.charges,
                masses: &self.state.masses,
                field,
                is_on,
            };
            let out = velocity_verlet_step(
                &force,
                &self.state.accelerations,
                &self.state.positions,
                &self.state.velocities,
                &self.state.masses,
                dt,
            )?;
            self.state.apply(out);

            if self.config.log_trajectory && step % self.config.trajectory_interval == 0 {
                sink.write_frame(&self.state.frame())?;
            }
            if step % self.config.dipole_log_interval == 0 {
                sink.write_dipole_log(&self.dipole_history)?;
            }

            log::info!(
                "Step: {} time: {:.1}(fs) <KE>(J): {:.5} Teff(K): {:.5} Mu: ({:.6},{:.6},{:.6})",
                step + 1,
                self.state.time,
                self.state.kinetic_energy,
                teff,
                mu.x,
                mu.y,
                mu.z
            );
            if let Some(pb) = bar.as_mut() {
                pb.update(1)?;
            }
        }
        self.state.time = self.config.max_step as f64 * dt;
        sink.write_dipole_log(&self.dipole_history)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::potentials::ZeroForce;
    use crate::trajectory::{MemorySink, NullSink};
    use approx::assert_relative_eq;
    use itertools::izip;
    use std::cell::Cell;

    // kg/mol A/fs
    fn total_momentum(velocities: &[Vector3<f64>], masses: &[f64]) -> Vector3<f64> {
        izip!(velocities, masses).fold(Vector3::zeros(), |p, (v, &m)| p + v * m)
    }

    fn hcl() -> Geometry {
        Geometry::new(
            vec!["H".into(), "Cl".into()],
            vec![Vector3::zeros(), Vector3::new(1.27, 0.0, 0.0)],
        )
        .unwrap()
    }

    fn fixed_charges(x: &[Vector3<f64>]) -> Result<Vec<f64>> {
        Ok(if x.len() == 2 { vec![0.2, -0.2] } else { vec![0.0; x.len()] })
    }

    fn quiet_field(max_step: usize) -> MdConfig {
        // centered far past the end of the run
        let mut config = MdConfig {
            max_step,
            ..MdConfig::default()
        };
        config.field.t0 = 1.0e4;
        config
    }

    #[test]
    fn test_pulse_is_off_far_from_center() {
        let pulse = Pulse::from_config(&FieldConfig::default());
        assert_eq!(pulse.evaluate(50.0), (Vector3::zeros(), false));
        // sin(0) = 0
        assert!(!pulse.evaluate(0.0).1);
    }

    #[test]
    fn test_pulse_is_on_near_center() {
        let pulse = Pulse::from_config(&FieldConfig::default());
        // 2 pi f t = 5.5 pi, so the carrier is at -1
        let (field, on) = pulse.evaluate(3.3);
        assert!(on);
        let envelope = (-0.09f64 / (2.0 * 1.44)).exp() / (2.0 * PI * 1.44).sqrt();
        assert_relative_eq!(field.x, -envelope, max_relative = 1e-9);
        assert_eq!(field.y, 0.0);
        assert_eq!(field.z, 0.0);
    }

    #[test]
    fn test_field_force_and_dipole() {
        let q = [1.0, -1.0];
        let e = Vector3::new(0.0, 0.0, 2.0);
        let f = electric_field_force(&q, &e);
        assert_eq!(f, vec![Vector3::new(0.0, 0.0, 2.0), Vector3::new(0.0, 0.0, -2.0)]);

        let x = [Vector3::new(1.0, 0.0, 0.0), Vector3::zeros()];
        assert_eq!(dipole(&x, &q), Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_remove_net_force_leaves_no_net_force() {
        let forces = vec![Vector3::new(3.0, 0.0, 1.0), Vector3::new(1.0, -2.0, 0.0)];
        let masses = vec![1.0, 3.0];
        let out = remove_net_force(&forces, &masses);
        let net: Vector3<f64> = out.iter().sum();
        assert_relative_eq!(net.norm(), 0.0, epsilon = 1e-12);
        // light atom keeps the larger share of its own force
        assert_relative_eq!(out[0], Vector3::new(2.0, 0.5, 0.75), epsilon = 1e-12);
    }

    #[test]
    fn test_charges_refreshed_only_while_field_is_off() {
        let calls = Cell::new(0);
        let charges = |x: &[Vector3<f64>]| -> Result<Vec<f64>> {
            calls.set(calls.get() + 1);
            fixed_charges(x)
        };
        let mut ir = IrTrajectory::new(ZeroForce, &charges, hcl(), quiet_field(5)).unwrap();
        assert_eq!(calls.get(), 1);
        ir.propagate(&mut NullSink).unwrap();
        assert_eq!(calls.get(), 6);

        let mut config = quiet_field(5);
        config.field.update_charges = false;
        let mut ir = IrTrajectory::new(ZeroForce, &charges, hcl(), config).unwrap();
        ir.propagate(&mut NullSink).unwrap();
        assert_eq!(calls.get(), 7);
    }

    #[test]
    fn test_snapshot_charges_used_while_field_is_on() {
        let calls = Cell::new(0);
        let charges = |x: &[Vector3<f64>]| -> Result<Vec<f64>> {
            calls.set(calls.get() + 1);
            fixed_charges(x)
        };
        let config = MdConfig {
            max_step: 30,
            ..MdConfig::default()
        };
        let pulse = Pulse::from_config(&config.field);
        let off_steps = (0..30)
            .filter(|&s| !pulse.evaluate(s as f64 * config.dt).1)
            .count();
        let mut ir = IrTrajectory::new(ZeroForce, &charges, hcl(), config).unwrap();
        ir.propagate(&mut NullSink).unwrap();
        assert!(off_steps < 30);
        assert_eq!(calls.get(), 1 + off_steps);
    }

    #[test]
    fn test_pulse_drives_dipole_and_keeps_momentum() {
        let mut config = MdConfig {
            max_step: 40,
            ..MdConfig::default()
        };
        config.field.amplitude = 1.0e-6;
        let mut ir = IrTrajectory::new(ZeroForce, fixed_charges, hcl(), config).unwrap();
        ir.propagate(&mut NullSink).unwrap();

        let history = ir.dipole_history();
        assert_eq!(history.len(), 40);
        assert_eq!(history[0].dipole, Vector3::zeros());
        let last = history[39].dipole;
        assert!(last.x.abs() > 0.0);
        assert_eq!(last.y, 0.0);
        assert_eq!(last.z, 0.0);

        let state = ir.state();
        let p = total_momentum(&state.velocities, &state.masses);
        let scale: f64 = izip!(&state.velocities, &state.masses)
            .map(|(v, m)| (v * *m).norm())
            .sum();
        assert!(scale > 0.0);
        assert!(p.norm() < 1e-10 * scale);
    }

    #[test]
    fn test_dipole_log_written_periodically_and_at_end() {
        let mut ir = IrTrajectory::new(ZeroForce, fixed_charges, hcl(), quiet_field(250)).unwrap();
        let mut sink = MemorySink::default();
        ir.propagate(&mut sink).unwrap();
        // steps 0, 100, 200 and the final flush
        assert_eq!(sink.dipole_writes, 4);
        assert_eq!(sink.dipole_log.len(), 250);
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn test_charge_length_mismatch_fails_at_construction() {
        let bad = |_: &[Vector3<f64>]| -> Result<Vec<f64>> { Ok(vec![1.0]) };
        let err = IrTrajectory::new(ZeroForce, bad, hcl(), quiet_field(1)).err();
        assert!(matches!(err, Some(MdError::LengthMismatch { what: "charges", .. })));
    }

    #[test]
    fn test_charge_model_error_propagates() {
        let calls = Cell::new(0);
        let flaky = |_: &[Vector3<f64>]| -> Result<Vec<f64>> {
            calls.set(calls.get() + 1);
            if calls.get() > 1 {
                return Err(MdError::charge("no charges for this geometry"));
            }
            Ok(vec![0.2, -0.2])
        };
        let mut ir = IrTrajectory::new(ZeroForce, flaky, hcl(), quiet_field(3)).unwrap();
        let err = ir.propagate(&mut NullSink).unwrap_err();
        assert!(matches!(err, MdError::Charge(_)));
        assert!(ir.dipole_history().is_empty());

        let broken = |_: &[Vector3<f64>]| -> Result<Vec<f64>> { Err(MdError::charge("offline")) };
        let err = IrTrajectory::new(ZeroForce, broken, hcl(), quiet_field(1)).err();
        assert!(matches!(err, Some(MdError::Charge(_))));
    }
}
