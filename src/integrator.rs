/*
Plain velocity verlet

x(t+dt) = x(t) + v(t) dt + 1/2 a(t) dt^2
a(t+dt) = F(x(t+dt)) / m
v(t+dt) = v(t) + 1/2 (a(t) + a(t+dt)) dt

The kernel owns no state: the (x, v, a) it returns is fed straight back in
on the next call, the first step needs no special handling.
 */

use crate::constants::FORCE_TO_ACCELERATION;
use crate::error::{MdError, Result};
use itertools::izip;
use nalgebra::Vector3;

/// Anything that maps coordinates (A) to per-atom forces in J/(mol A).
pub trait ForceField {
    fn forces(&self, positions: &[Vector3<f64>]) -> Result<Vec<Vector3<f64>>>;
}

impl<F> ForceField for F
where
    F: Fn(&[Vector3<f64>]) -> Result<Vec<Vector3<f64>>>,
{
    fn forces(&self, positions: &[Vector3<f64>]) -> Result<Vec<Vector3<f64>>> {
        self(positions)
    }
}

/// Positions, velocities and accelerations after one step.
#[derive(Clone, Debug, PartialEq)]
pub struct PhasePoint {
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
    pub accelerations: Vec<Vector3<f64>>,
}

impl PhasePoint {
    pub fn into_parts(
        self,
    ) -> (
        Vec<Vector3<f64>>,
        Vec<Vector3<f64>>,
        Vec<Vector3<f64>>,
    ) {
        (self.positions, self.velocities, self.accelerations)
    }
}

/// Evaluates the force field at `positions` and converts to A/fs^2.
pub fn accelerations<F: ForceField + ?Sized>(
    force: &F,
    positions: &[Vector3<f64>],
    masses: &[f64],
) -> Result<Vec<Vector3<f64>>> {
    let forces = force.forces(positions)?;
    MdError::check_len("forces", masses.len(), forces.len())?;
    Ok(forces
        .iter()
        .zip(masses)
        .map(|(f, &m)| f * (FORCE_TO_ACCELERATION / m))
        .collect())
}

pub(crate) fn check_phase(
    accelerations: &[Vector3<f64>],
    positions: &[Vector3<f64>],
    velocities: &[Vector3<f64>],
    masses: &[f64],
) -> Result<()> {
    if masses.is_empty() {
        return Err(MdError::EmptySystem);
    }
    MdError::check_len("accelerations", masses.len(), accelerations.len())?;
    MdError::check_len("positions", masses.len(), positions.len())?;
    MdError::check_len("velocities", masses.len(), velocities.len())
}

/// One unthermostated velocity verlet step. Calls the force field exactly once.
pub fn velocity_verlet_step<F: ForceField + ?Sized>(
    force: &F,
    accelerations_now: &[Vector3<f64>],
    positions: &[Vector3<f64>],
    velocities: &[Vector3<f64>],
    masses: &[f64],
    dt: f64,
) -> Result<PhasePoint> {
    check_phase(accelerations_now, positions, velocities, masses)?;

    let new_positions: Vec<Vector3<f64>> = izip!(positions, velocities, accelerations_now)
        .map(|(x, v, a)| x + v * dt + a * (0.5 * dt * dt))
        .collect();
    let new_accelerations = accelerations(force, &new_positions, masses)?;
    let new_velocities = izip!(velocities, accelerations_now, &new_accelerations)
        .map(|(v, a, a_new)| v + (a + a_new) * (0.5 * dt))
        .collect();

    Ok(PhasePoint {
        positions: new_positions,
        velocities: new_velocities,
        accelerations: new_accelerations,
    })
}
