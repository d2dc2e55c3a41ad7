/*
System state owned by a propagation driver

atoms and masses never change after construction; positions, velocities and
accelerations are replaced wholesale by every step and always have one entry
per atom.
 */

use crate::config::{InitialVelocity, MdConfig};
use crate::error::{MdError, Result};
use crate::integrator::PhasePoint;
use crate::thermostat::rescale_each_atom;
use crate::trajectory::Frame;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Initial geometry handed to a driver.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub atoms: Vec<String>,
    pub coords: Vec<Vector3<f64>>,
}

impl Geometry {
    pub fn new(atoms: Vec<String>, coords: Vec<Vector3<f64>>) -> Result<Self> {
        if atoms.is_empty() {
            return Err(MdError::EmptySystem);
        }
        MdError::check_len("coordinates", atoms.len(), coords.len())?;
        Ok(Geometry { atoms, coords })
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct MdState {
    pub atoms: Vec<String>,
    pub masses: Vec<f64>,
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
    pub accelerations: Vec<Vector3<f64>>,
    pub time: f64,           // fs
    pub kinetic_energy: f64, // J/mol per atom
}

impl MdState {
    pub fn new(geometry: &Geometry, masses: Vec<f64>) -> Result<Self> {
        if geometry.is_empty() {
            return Err(MdError::EmptySystem);
        }
        MdError::check_len("masses", geometry.len(), masses.len())?;
        if let Some(m) = masses.iter().find(|m| !(m.is_finite() && **m > 0.0)) {
            return Err(MdError::config(format!("atomic masses must be positive, got {m}")));
        }
        let n = geometry.len();
        Ok(MdState {
            atoms: geometry.atoms.clone(),
            masses,
            positions: geometry.coords.clone(),
            velocities: vec![Vector3::zeros(); n],
            accelerations: vec![Vector3::zeros(); n],
            time: 0.0,
            kinetic_energy: 0.0,
        })
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Replaces x, v and a with the output of a step.
    pub fn apply(&mut self, point: PhasePoint) {
        self.positions = point.positions;
        self.velocities = point.velocities;
        self.accelerations = point.accelerations;
    }

    pub fn frame(&self) -> Frame {
        Frame {
            atoms: self.atoms.clone(),
            positions: self.positions.clone(),
            time: self.time,
            kinetic_energy: self.kinetic_energy,
        }
    }
}

/// Starting velocities: at rest, or a standard normal sample brought to the
/// target temperature atom by atom.
pub fn initial_velocities(config: &MdConfig, masses: &[f64]) -> Vec<Vector3<f64>> {
    match config.initial_velocity {
        InitialVelocity::Zero => vec![Vector3::zeros(); masses.len()],
        InitialVelocity::Random => {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let sample: Vec<Vector3<f64>> = masses
                .iter()
                .map(|_| {
                    Vector3::new(
                        rng.sample::<f64, _>(StandardNormal),
                        rng.sample::<f64, _>(StandardNormal),
                        rng.sample::<f64, _>(StandardNormal),
                    )
                })
                .collect();
            rescale_each_atom(&sample, masses, config.temperature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinetic::temperature;
    use approx::assert_relative_eq;

    fn water() -> Geometry {
        Geometry::new(
            vec!["O".into(), "H".into(), "H".into()],
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(0.757, 0.586, 0.0),
                Vector3::new(-0.757, 0.586, 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_geometry_validation() {
        assert!(matches!(Geometry::new(vec![], vec![]), Err(MdError::EmptySystem)));
        assert!(matches!(
            Geometry::new(vec!["H".into()], vec![]),
            Err(MdError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_state_starts_at_rest() {
        let state = MdState::new(&water(), vec![15.999e-3, 1.008e-3, 1.008e-3]).unwrap();
        assert_eq!(state.n_atoms(), 3);
        assert!(state.velocities.iter().all(|v| *v == Vector3::zeros()));
        assert_eq!(state.time, 0.0);
    }

    #[test]
    fn test_state_rejects_bad_masses() {
        assert!(MdState::new(&water(), vec![1.0; 2]).is_err());
        assert!(MdState::new(&water(), vec![1.0, 0.0, 1.0]).is_err());
    }

    #[test]
    fn test_random_velocities_are_seeded_and_thermal() {
        let masses = vec![15.999e-3, 1.008e-3, 1.008e-3];
        let config = MdConfig {
            initial_velocity: InitialVelocity::Random,
            seed: Some(17),
            temperature: 150.0,
            ..MdConfig::default()
        };
        let v1 = initial_velocities(&config, &masses);
        let v2 = initial_velocities(&config, &masses);
        assert_eq!(v1, v2);
        assert_relative_eq!(temperature(&v1, &masses).unwrap(), 150.0, max_relative = 1e-10);
    }
}
