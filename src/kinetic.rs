use crate::constants::{effective_temperature, VELOCITY_SQ_TO_SI};
use crate::error::{MdError, Result};
use nalgebra::Vector3;

/// Mean kinetic energy per atom in J/mol.
///
/// `velocities` in A/fs, `masses` in kg/mol.
pub fn kinetic_energy(velocities: &[Vector3<f64>], masses: &[f64]) -> Result<f64> {
    if masses.is_empty() {
        return Err(MdError::EmptySystem);
    }
    MdError::check_len("velocities", masses.len(), velocities.len())?;
    let total: f64 = velocities
        .iter()
        .zip(masses)
        .map(|(v, &m)| v.norm_squared() * VELOCITY_SQ_TO_SI * m)
        .sum();
    Ok(0.5 * total / masses.len() as f64)
}

/// Instantaneous temperature inferred from the kinetic energy.
pub fn temperature(velocities: &[Vector3<f64>], masses: &[f64]) -> Result<f64> {
    Ok(effective_temperature(kinetic_energy(velocities, masses)?))
}

// sum 1/2 m v^2 in kg/mol (A/fs)^2, the energy unit the Nose variables use
pub(crate) fn internal_kinetic_energy(velocities: &[Vector3<f64>], masses: &[f64]) -> f64 {
    velocities
        .iter()
        .zip(masses)
        .map(|(v, &m)| 0.5 * m * v.norm_squared())
        .sum()
}

pub(crate) fn atom_temperature(velocity: &Vector3<f64>, mass: f64) -> f64 {
    effective_temperature(0.5 * mass * velocity.norm_squared() * VELOCITY_SQ_TO_SI)
}
