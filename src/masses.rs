//! Atomic masses in kg/mol, the mass convention of the stepping core.

use crate::error::{MdError, Result};

/// Mass of an element symbol in kg/mol.
pub fn atomic_mass(element: &str) -> Result<f64> {
    let grams_per_mole = match element.trim() {
        "H" => 1.008,
        "He" => 4.0026,
        "Li" => 6.94,
        "B" => 10.81,
        "C" => 12.011,
        "N" => 14.007,
        "O" => 15.999,
        "F" => 18.998,
        "Ne" => 20.180,
        "Na" => 22.990,
        "Mg" => 24.305,
        "Si" => 28.085,
        "P" => 30.974,
        "S" => 32.06,
        "Cl" => 35.45,
        "Ar" => 39.948,
        "K" => 39.098,
        "Ca" => 40.078,
        "Fe" => 55.845,
        "Cu" => 63.546,
        "Zn" => 65.38,
        "Br" => 79.904,
        "I" => 126.90,
        other => return Err(MdError::UnknownElement(other.to_string())),
    };
    Ok(grams_per_mole * 1.0e-3)
}

pub fn masses_for(atoms: &[String]) -> Result<Vec<f64>> {
    atoms.iter().map(|a| atomic_mass(a)).collect()
}
