/*

=========================================================
 Simple Molecular Dynamics (Rust)
 Velocity Verlet with optional thermostats and a
 field-driven variant for IR spectra
=========================================================

🔧 Stepping contract
--------------------
Every integrator and thermostat maps
    (force, a, x, v, m, dt)  ->  (x', v', a')
with exactly one force evaluation per call. Output is fed straight back in.

📐 Units
--------
- Positions:  Angstrom
- Time:       fs
- Velocities: Angstrom / fs
- Masses:     kg / mol
- Forces:     J / (mol Angstrom)
- a = 1e-10 F / m

🌡️ Temperature
---------------
- Per-atom kinetic energy in J/mol:
    KE = 1/2 sum(m |v|^2) * 1e10 / N
- Effective temperature from equipartition:
    T = (2/3) KE / R

🧊 Thermostats
--------------
- Rescaling:        v <- lambda v after every step, lambda = sqrt(T0 / T)
- Nose:             one friction variable for the system
- NosePerParticle:  one friction variable per atom
- NoseHooverChain:  Martyna chain, Suzuki-Yoshida factorization

⚡ IR dynamics
--------------
- Gaussian-enveloped pulse acting on per-atom charges
- Net translational force removed every step
- Dipole time series recorded relative to t = 0

=========================================================

*/

pub mod config;
pub mod constants;
pub mod dynamics;
pub mod error;
pub mod integrator;
pub mod ir;
pub mod kinetic;
pub mod masses;
pub mod potentials;
pub mod system;
pub mod thermostat;
pub mod trajectory;

#[cfg(test)]
mod testing;

pub use config::{FieldConfig, InitialVelocity, MdConfig, PerParticleDof, ThermostatKind};
pub use dynamics::{StepRecord, VelocityHistory, VelocityVerlet};
pub use error::{MdError, Result};
pub use integrator::{velocity_verlet_step, ForceField, PhasePoint};
pub use ir::{ChargeModel, IrTrajectory, Pulse};
pub use kinetic::{kinetic_energy, temperature};
pub use system::{Geometry, MdState};
pub use thermostat::Thermostat;
pub use trajectory::{DipoleRecord, Frame, MemorySink, NullSink, TrajectorySink, XyzWriter};
