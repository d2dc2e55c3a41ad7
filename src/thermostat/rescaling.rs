use crate::config::MdConfig;
use crate::error::Result;
use crate::integrator::{velocity_verlet_step, ForceField, PhasePoint};
use crate::kinetic::temperature;
use nalgebra::Vector3;

/// Velocity verlet followed by an instantaneous rescale of every velocity
/// by sqrt(T_target / T_eff). No dynamical variable of its own.
#[derive(Clone, Debug)]
pub struct Rescaling {
    pub(crate) masses: Vec<f64>,
    pub(crate) temperature: f64,
}

impl Rescaling {
    pub fn new(masses: &[f64], config: &MdConfig) -> Self {
        Rescaling {
            masses: masses.to_vec(),
            temperature: config.temperature,
        }
    }

    pub fn step<F: ForceField + ?Sized>(
        &mut self,
        force: &F,
        accelerations: &[Vector3<f64>],
        positions: &[Vector3<f64>],
        velocities: &[Vector3<f64>],
        masses: &[f64],
        dt: f64,
    ) -> Result<PhasePoint> {
        let mut out =
            velocity_verlet_step(force, accelerations, positions, velocities, masses, dt)?;
        let t_eff = temperature(&out.velocities, &self.masses)?;
        if t_eff == 0.0 {
            return Ok(out); // nothing to rescale
        }
        let lambda = (self.temperature / t_eff).sqrt();
        for v in out.velocities.iter_mut() {
            *v *= lambda;
        }
        Ok(out)
    }
}
