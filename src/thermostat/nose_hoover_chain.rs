/*
Nose-Hoover chain thermostat

Based on Appendix A of Martyna, Tuckerman, Tobias and Klein 1996
http://dx.doi.org/10.1080/00268979600100761

A chain of M fictitious variables (eta_i, Veta_i, Geta_i, Q_i), each one
thermostatting the one before it, the first one thermostatting the atoms.
One step is

    half step the chain      (rescales v)
    v += dt/2 a
    x += dt v
    a  = F(x) / m
    v += dt/2 a
    half step the chain      (rescales v)

Each half step of the chain is trotterized nc times and integrated with an
ny point Suzuki-Yoshida scheme. Within one (nc, ny) pass the fractions
wdt/2, wdt/4 and wdt/8 of the sub step are not interchangeable: getting any
of them or the sweep direction wrong still runs, but the conserved energy
drifts.
 */

use crate::config::MdConfig;
use crate::constants::{effective_temperature, kt, VELOCITY_SQ_TO_SI};
use crate::error::{MdError, Result};
use crate::integrator::{accelerations, check_phase, ForceField, PhasePoint};
use crate::kinetic::internal_kinetic_energy;
use itertools::izip;
use nalgebra::Vector3;

/// Suzuki-Yoshida quadrature weights for `points` = 3 or 5. They sum to one.
pub fn suzuki_yoshida_weights(points: usize) -> Result<Vec<f64>> {
    match points {
        3 => {
            let w = 1.0 / (2.0 - 2f64.powf(1.0 / 3.0));
            Ok(vec![w, 1.0 - 2.0 * w, w])
        }
        5 => {
            let w = 1.0 / (4.0 - 4f64.powf(1.0 / 3.0));
            Ok(vec![w, w, 1.0 - 4.0 * w, w, w])
        }
        other => Err(MdError::UnsupportedQuadrature(other)),
    }
}

#[derive(Clone, Debug)]
pub struct NoseHooverChain {
    pub(crate) masses: Vec<f64>,
    pub(crate) temperature: f64,
    kt: f64,
    gnkt: f64, // degrees of freedom * kT
    nc: usize, // trotterizations, increase if Q is large
    wj: Vec<f64>,
    qs: Vec<f64>,   // chain masses
    eta: Vec<f64>,  // chain positions
    veta: Vec<f64>, // chain velocities
    geta: Vec<f64>, // chain forces
}

impl NoseHooverChain {
    pub fn new(masses: &[f64], config: &MdConfig) -> Result<Self> {
        if masses.is_empty() {
            return Err(MdError::EmptySystem);
        }
        if config.chain_trotter_steps == 0 {
            return Err(MdError::config("chain_trotter_steps must be at least 1"));
        }
        let depth = config.chain_length;
        let n_atoms = masses.len();
        let kt = kt(config.temperature);
        let tau = config.relaxation_time_or(30.0);
        let qs = martyna_masses(depth, n_atoms, kt, tau);

        let veta = vec![0.0; depth];
        let mut geta = vec![0.0; depth];
        for i in 1..depth {
            geta[i] = (qs[i - 1] * veta[i - 1] * veta[i - 1] - kt) / qs[i];
        }

        Ok(NoseHooverChain {
            masses: masses.to_vec(),
            temperature: config.temperature,
            kt,
            gnkt: 3.0 * n_atoms as f64 * kt,
            nc: config.chain_trotter_steps,
            wj: suzuki_yoshida_weights(config.chain_quadrature_points)?,
            qs,
            eta: vec![0.0; depth],
            veta,
            geta,
        })
    }

    pub fn depth(&self) -> usize {
        self.qs.len()
    }

    pub fn chain_masses(&self) -> &[f64] {
        &self.qs
    }

    pub fn chain_positions(&self) -> &[f64] {
        &self.eta
    }

    pub fn chain_velocities(&self) -> &[f64] {
        &self.veta
    }

    /// Energy stored in the chain in J/mol. Together with the kinetic and
    /// potential energy of the atoms this is conserved by the dynamics.
    pub fn extended_energy(&self) -> f64 {
        if self.qs.is_empty() {
            return 0.0;
        }
        let kinetic: f64 = izip!(&self.qs, &self.veta)
            .map(|(q, v)| 0.5 * q * v * v)
            .sum();
        let potential = self.gnkt * self.eta[0] + self.kt * self.eta[1..].iter().sum::<f64>();
        (kinetic + potential) * VELOCITY_SQ_TO_SI
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

        let v = self.integrate_chain(velocities, masses, dt);
        self.log_chain(velocities, masses);

        let v: Vec<Vector3<f64>> = izip!(&v, accelerations_now)
            .map(|(v, a)| v + a * (dt / 2.0))
            .collect();
        let new_positions: Vec<Vector3<f64>> = izip!(positions, &v)
            .map(|(x, v)| x + v * dt)
            .collect();
        let new_accelerations = accelerations(force, &new_positions, masses)?;
        let v: Vec<Vector3<f64>> = izip!(&v, &new_accelerations)
            .map(|(v, a)| v + a * (dt / 2.0))
            .collect();
        let new_velocities = self.integrate_chain(&v, masses, dt);

        Ok(PhasePoint {
            positions: new_positions,
            velocities: new_velocities,
            accelerations: new_accelerations,
        })
    }

    /// Evolves the chain by half a step and returns the rescaled velocities.
    /// A chain of length zero returns the velocities untouched.
    pub fn integrate_chain(
        &mut self,
        velocities: &[Vector3<f64>],
        masses: &[f64],
        dt: f64,
    ) -> Vec<Vector3<f64>> {
        let m = self.qs.len();
        if m == 0 {
            return velocities.to_vec();
        }
        let last = m - 1;
        let ake = internal_kinetic_energy(velocities, masses); // kg/mol (A/fs)^2

        // Update thermostat forces.
        self.geta[0] = (2.0 * ake - self.gnkt) / self.qs[0];
        let mut scale = 1.0;
        for _ in 0..self.nc {
            for &w in &self.wj {
                let wdtj2 = (w * dt / self.nc as f64) / 2.0;
                let wdtj4 = wdtj2 / 2.0;
                let wdtj8 = wdtj4 / 2.0;

                // thermostat velocities, last element first
                self.veta[last] += self.geta[last] * wdtj4;
                for i in (0..last).rev() {
                    let aa = (-wdtj8 * self.veta[i + 1]).exp();
                    self.veta[i] = self.veta[i] * aa * aa + wdtj4 * self.geta[i] * aa;
                }

                // particle velocities
                scale *= (-wdtj2 * self.veta[0]).exp();
                self.geta[0] = (scale * scale * 2.0 * ake - self.gnkt) / self.qs[0];

                // thermostat positions
                for (eta, veta) in self.eta.iter_mut().zip(&self.veta) {
                    *eta += veta * wdtj2;
                }

                // thermostat velocities, first element first
                for i in 0..last {
                    let aa = (-wdtj8 * self.veta[i + 1]).exp();
                    self.veta[i] = self.veta[i] * aa * aa + wdtj4 * self.geta[i] * aa;
                    self.geta[i + 1] =
                        (self.qs[i] * self.veta[i] * self.veta[i] - self.kt) / self.qs[i + 1];
                }
                self.veta[last] += self.geta[last] * wdtj4;
            }
        }
        velocities.iter().map(|v| v * scale).collect()
    }

    fn log_chain(&self, velocities: &[Vector3<f64>], masses: &[f64]) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let ke = internal_kinetic_energy(velocities, masses);
        let teff = effective_temperature(ke * VELOCITY_SQ_TO_SI / masses.len() as f64);
        log::debug!("Energies of the system... {ke} Teff {teff}");
        let along: Vec<f64> = izip!(&self.veta, &self.qs)
            .map(|(v, q)| v * v * q / 2.0)
            .collect();
        log::debug!(
            "Energies along the chain... Desired: {} {along:?}",
            1.5 * self.kt
        );
        log::debug!(
            "eta {:?} Meta {:?} Veta {:?} Geta {:?}",
            self.eta,
            self.qs,
            self.veta,
            self.geta
        );
    }
}

/// Martyna's chain masses: Q_0 = 3N kT tau^2, Q_i = kT tau^2.
fn martyna_masses(depth: usize, n_atoms: usize, kt: f64, tau: f64) -> Vec<f64> {
    let mut qs = vec![kt * tau * tau; depth];
    if let Some(first) = qs.first_mut() {
        *first = 3.0 * n_atoms as f64 * kt * tau * tau;
    }
    qs
}
