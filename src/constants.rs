/*
Units used throughout the stepping core

positions      Angstrom
time           fs
velocities     Angstrom / fs
masses         kg / mol
forces         J / (mol Angstrom)
energies       J / mol (reported), kg/mol * (Angstrom/fs)^2 (thermostat internals)
 */

pub const GAS_CONSTANT: f64 = 8.314; // J / (mol K)
pub const VELOCITY_SQ_TO_SI: f64 = 1.0e10; // (A/fs)^2 => (m/s)^2
pub const FORCE_TO_ACCELERATION: f64 = 1.0e-10; // (J / (kg A)) => A/fs^2
pub const FIELD_FORCE_TO_SI: f64 = 4184.0 * 1.0e10;
pub const PULSE_THRESHOLD: f64 = 1.0e-12; // below this the field is considered off

/// Thermal energy kT in the thermostat's internal units, kg/mol (A/fs)^2.
pub fn kt(temperature: f64) -> f64 {
    GAS_CONSTANT * FORCE_TO_ACCELERATION * temperature
}

/// Effective temperature from a per-atom kinetic energy in J/mol.
pub fn effective_temperature(kinetic_energy: f64) -> f64 {
    (2.0 / 3.0) * kinetic_energy / GAS_CONSTANT
}
