/*
Reference force fields

The stepping core takes any ForceField; these are the small closed-form ones
used by the binary and by the long-run thermostat checks. Energies are J/mol,
forces J/(mol A), lengths A.
 */

use crate::error::Result;
use crate::integrator::ForceField;
use nalgebra::Vector3;

/// Constant potential, no force anywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroForce;

impl ForceField for ZeroForce {
    fn forces(&self, positions: &[Vector3<f64>]) -> Result<Vec<Vector3<f64>>> {
        Ok(vec![Vector3::zeros(); positions.len()])
    }
}

// -- lennard jones potential and force

pub fn lennard_jones_potential(r: f64, sigma: f64, eps: f64) -> f64 {
    if r < 1e-9 {
        return 0.0; // Avoid singularity
    }
    let sr6 = (sigma / r).powi(6);
    4.0 * eps * (sr6 * sr6 - sr6)
}

/// -dU/dr
pub fn lennard_jones_force(r: f64, sigma: f64, epsilon: f64) -> f64 {
    if r < 1e-9 {
        return 0.0; // Prevent singularity
    }
    let sr6 = (sigma / r).powi(6);
    24.0 * epsilon * (2.0 * sr6 * sr6 - sr6) / r
}

/// Single-species pairwise Lennard-Jones, no cutoff, no periodic images.
#[derive(Clone, Copy, Debug)]
pub struct LennardJones {
    pub epsilon: f64, // J/mol
    pub sigma: f64,   // A
}

impl LennardJones {
    /// Argon, epsilon/kB = 119.8 K, sigma = 3.405 A
    pub fn argon() -> Self {
        LennardJones {
            epsilon: 119.8 * crate::constants::GAS_CONSTANT,
            sigma: 3.405,
        }
    }

    pub fn energy(&self, positions: &[Vector3<f64>]) -> f64 {
        let mut total_energy = 0.0;
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let r = (positions[j] - positions[i]).norm();
                total_energy += lennard_jones_potential(r, self.sigma, self.epsilon);
            }
        }
        total_energy
    }
}

impl ForceField for LennardJones {
    fn forces(&self, positions: &[Vector3<f64>]) -> Result<Vec<Vector3<f64>>> {
        let n = positions.len();
        let mut forces = vec![Vector3::zeros(); n];
        for i in 0..n {
            for j in (i + 1)..n {
                let r_vec = positions[i] - positions[j];
                let r = r_vec.norm();
                if r < 1e-9 {
                    continue;
                }
                let f_vec = r_vec * (lennard_jones_force(r, self.sigma, self.epsilon) / r);
                forces[i] += f_vec; // Apply force to particle i
                forces[j] -= f_vec; // Apply equal and opposite force to particle j
            }
        }
        Ok(forces)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct SimpleBond {
    pub i: usize,
    pub j: usize,
    pub k: f64,  // J/(mol A^2)
    pub r0: f64, // A
}

/// Spring from an atom to a fixed point in space.
#[derive(Copy, Clone, Debug)]
pub struct Tether {
    pub atom: usize,
    pub anchor: Vector3<f64>,
    pub k: f64,
}

/// Harmonic bonds plus optional harmonic tethers.
#[derive(Clone, Debug, Default)]
pub struct HarmonicBonds {
    pub bonds: Vec<SimpleBond>,
    pub tethers: Vec<Tether>,
}

impl HarmonicBonds {
    pub fn energy(&self, positions: &[Vector3<f64>]) -> f64 {
        let bond_energy: f64 = self
            .bonds
            .iter()
            .map(|b| {
                let dr = (positions[b.j] - positions[b.i]).norm() - b.r0;
                0.5 * b.k * dr * dr
            })
            .sum();
        let tether_energy: f64 = self
            .tethers
            .iter()
            .map(|t| 0.5 * t.k * (positions[t.atom] - t.anchor).norm_squared())
            .sum();
        bond_energy + tether_energy
    }
}

impl ForceField for HarmonicBonds {
    fn forces(&self, positions: &[Vector3<f64>]) -> Result<Vec<Vector3<f64>>> {
        let mut forces = vec![Vector3::zeros(); positions.len()];
        for b in &self.bonds {
            let r_vec = positions[b.j] - positions[b.i];
            let r = r_vec.norm();
            if r == 0.0 {
                continue;
            }
            let dr = r - b.r0; // stretch past the equilibrium length
            let f_vec = (r_vec / r) * (-b.k * dr);
            forces[b.j] += f_vec;
            forces[b.i] -= f_vec;
        }
        for t in &self.tethers {
            forces[t.atom] -= (positions[t.atom] - t.anchor) * t.k;
        }
        Ok(forces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // central differences of the energy
    fn numerical_forces(
        energy: impl Fn(&[Vector3<f64>]) -> f64,
        x: &[Vector3<f64>],
    ) -> Vec<Vector3<f64>> {
        let h = 1e-6;
        let mut out = vec![Vector3::zeros(); x.len()];
        for i in 0..x.len() {
            for k in 0..3 {
                let mut plus = x.to_vec();
                let mut minus = x.to_vec();
                plus[i][k] += h;
                minus[i][k] -= h;
                out[i][k] = -(energy(&plus) - energy(&minus)) / (2.0 * h);
            }
        }
        out
    }

    #[test]
    fn test_lennard_jones_minimum() {
        let r_min = 2f64.powf(1.0 / 6.0) * 3.4;
        assert_relative_eq!(lennard_jones_potential(r_min, 3.4, 1.0), -1.0, epsilon = 1e-12);
        assert!(lennard_jones_force(r_min, 3.4, 1.0).abs() < 1e-12);
        assert_eq!(lennard_jones_potential(0.0, 3.4, 1.0), 0.0);
    }

    #[test]
    fn test_lennard_jones_forces_match_energy() {
        let lj = LennardJones::argon();
        let x = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(3.9, 0.2, 0.0),
            Vector3::new(1.5, 3.6, 0.4),
        ];
        let analytic = lj.forces(&x).unwrap();
        let numeric = numerical_forces(|p| lj.energy(p), &x);
        for (a, n) in analytic.iter().zip(&numeric) {
            assert_relative_eq!(*a, *n, epsilon = 1e-3, max_relative = 1e-5);
        }
        let net: Vector3<f64> = analytic.iter().sum();
        assert!(net.norm() < 1e-9);
    }

    #[test]
    fn test_harmonic_forces_match_energy() {
        let ff = HarmonicBonds {
            bonds: vec![SimpleBond {
                i: 0,
                j: 1,
                k: 4.0e5,
                r0: 1.1,
            }],
            tethers: vec![Tether {
                atom: 0,
                anchor: Vector3::zeros(),
                k: 2.0e5,
            }],
        };
        let x = vec![Vector3::new(0.05, -0.02, 0.01), Vector3::new(1.2, 0.1, -0.05)];
        let analytic = ff.forces(&x).unwrap();
        let numeric = numerical_forces(|p| ff.energy(p), &x);
        for (a, n) in analytic.iter().zip(&numeric) {
            assert_relative_eq!(*a, *n, epsilon = 1e-2, max_relative = 1e-6);
        }
    }
}
