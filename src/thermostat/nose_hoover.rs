/*
Nose-Hoover thermostats, velocity verlet form

http://www2.ph.ed.ac.uk/~dmarendu/MVP/MVP03.pdf

x(t+dt)   = x + v dt + 1/2 (a - eta v) dt^2
v(t+dt/2) = v + 1/2 (a - eta v) dt
eta is advanced in two half steps, first with the kinetic energy at v(t),
then with the kinetic energy at v(t+dt/2), and the velocity is finished
implicitly:
v(t+dt)   = (v(t+dt/2) + dt/2 a(t+dt)) / (1 + dt/2 eta)

The half step for eta before and after the force call must stay in this
order, otherwise the scheme loses its stability.
 */

use crate::config::{MdConfig, PerParticleDof};
use crate::constants::kt;
use crate::error::Result;
use crate::integrator::{accelerations, check_phase, ForceField, PhasePoint};
use crate::kinetic::internal_kinetic_energy;
use itertools::izip;
use nalgebra::Vector3;

/// Single friction variable coupled to the whole system.
#[derive(Clone, Debug)]
pub struct NoseHoover {
    pub(crate) masses: Vec<f64>,
    pub(crate) temperature: f64,
    n_atoms: usize,
    kt: f64, // kg/mol (A/fs)^2
    q: f64,  // thermal mass
    eta: f64,
}

impl NoseHoover {
    pub fn new(masses: &[f64], config: &MdConfig) -> Self {
        let kt = kt(config.temperature);
        let tau = config.relaxation_time_or(30.0);
        NoseHoover {
            masses: masses.to_vec(),
            temperature: config.temperature,
            n_atoms: masses.len(),
            kt,
            q: kt * tau * tau,
            eta: 0.0,
        }
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn thermal_mass(&self) -> f64 {
        self.q
    }

    fn target_energy(&self) -> f64 {
        ((3.0 * self.n_atoms as f64 + 1.0) / 2.0) * self.kt
    }

    pub fn step<F: ForceField + ?Sized>(
        &mut self,
        force: &F,
        accelerations_now: &[Vector3<f64>],
        positions: &[Vector3<f64>],
        velocities: &[Vector3<f64>],
        masses: &[f64],
        dt: f64,
    ) -> Result<PhasePoint> {
        check_phase(accelerations_now, positions, velocities, masses)?;
        let eta = self.eta;

        let drag: Vec<Vector3<f64>> = izip!(accelerations_now, velocities)
            .map(|(a, v)| a - v * eta)
            .collect();
        let new_positions: Vec<Vector3<f64>> = izip!(positions, velocities, &drag)
            .map(|(x, v, d)| x + v * dt + d * (0.5 * dt * dt))
            .collect();
        let v_half: Vec<Vector3<f64>> = izip!(velocities, &drag)
            .map(|(v, d)| v + d * (0.5 * dt))
            .collect();
        let new_accelerations = accelerations(force, &new_positions, masses)?;

        let target = self.target_energy();
        let ke = internal_kinetic_energy(velocities, masses);
        let eta_half = self.eta + (dt / (2.0 * self.q)) * (ke - target);
        let ke_half = internal_kinetic_energy(&v_half, masses);
        self.eta = eta_half + (dt / (2.0 * self.q)) * (ke_half - target);

        let denominator = 1.0 + (dt / 2.0) * self.eta;
        let new_velocities = izip!(&v_half, &new_accelerations)
            .map(|(vh, a)| (vh + a * (dt / 2.0)) / denominator)
            .collect();

        Ok(PhasePoint {
            positions: new_positions,
            velocities: new_velocities,
            accelerations: new_accelerations,
        })
    }
}

/// One friction variable per atom sharing a single thermal mass, so light
/// atoms are not damped the same way as heavy ones.
#[derive(Clone, Debug)]
pub struct NosePerParticle {
    pub(crate) masses: Vec<f64>,
    pub(crate) temperature: f64,
    kt: f64,
    q: f64,
    eta: Vec<f64>,
    dof: PerParticleDof,
}

impl NosePerParticle {
    pub fn new(masses: &[f64], config: &MdConfig) -> Self {
        let kt = kt(config.temperature);
        let tau = config.relaxation_time_or(25.0);
        if config.per_particle_dof == PerParticleDof::System && masses.len() > 1 {
            log::warn!(
                "NosePerParticle drives every atom toward (3N+1)/2 kT with N = {}; \
                 set per_particle_dof = Atom for per-atom equipartition",
                masses.len()
            );
        }
        NosePerParticle {
            masses: masses.to_vec(),
            temperature: config.temperature,
            kt,
            q: kt * tau * tau,
            eta: vec![0.0; masses.len()],
            dof: config.per_particle_dof,
        }
    }

    pub fn eta(&self) -> &[f64] {
        &self.eta
    }

    // TODO: decide whether the system-wide (3N+1)/2 term is intended here; the
    // Atom mode is the per-atom alternative until then.
    fn target_energy(&self) -> f64 {
        match self.dof {
            PerParticleDof::System => ((3.0 * self.eta.len() as f64 + 1.0) / 2.0) * self.kt,
            PerParticleDof::Atom => 1.5 * self.kt,
        }
    }

    pub fn step<F: ForceField + ?Sized>(
        &mut self,
        force: &F,
        accelerations_now: &[Vector3<f64>],
        positions: &[Vector3<f64>],
        velocities: &[Vector3<f64>],
        masses: &[f64],
        dt: f64,
    ) -> Result<PhasePoint> {
        check_phase(accelerations_now, positions, velocities, masses)?;

        let drag: Vec<Vector3<f64>> = izip!(accelerations_now, velocities, &self.eta)
            .map(|(a, v, &eta)| a - v * eta)
            .collect();
        let new_positions: Vec<Vector3<f64>> = izip!(positions, velocities, &drag)
            .map(|(x, v, d)| x + v * dt + d * (0.5 * dt * dt))
            .collect();
        let v_half: Vec<Vector3<f64>> = izip!(velocities, &drag)
            .map(|(v, d)| v + d * (0.5 * dt))
            .collect();
        let new_accelerations = accelerations(force, &new_positions, masses)?;

        let target = self.target_energy();
        let coupling = dt / (2.0 * self.q);
        for (eta, v, vh, &m) in izip!(self.eta.iter_mut(), velocities, &v_half, masses) {
            let ke = 0.5 * m * v.norm_squared();
            let ke_half = 0.5 * m * vh.norm_squared();
            let eta_half = *eta + coupling * (ke - target);
            *eta = eta_half + coupling * (ke_half - target);
        }

        let new_velocities = izip!(&v_half, &new_accelerations, &self.eta)
            .map(|(vh, a, &eta)| (vh + a * (dt / 2.0)) / (1.0 + (dt / 2.0) * eta))
            .collect();

        Ok(PhasePoint {
            positions: new_positions,
            velocities: new_velocities,
            accelerations: new_accelerations,
        })
    }
}
