// Shared fixtures for the long-run thermostat checks.

use crate::config::MdConfig;
use crate::integrator::accelerations;
use crate::kinetic::temperature;
use crate::potentials::{HarmonicBonds, SimpleBond, Tether};
use crate::thermostat::Thermostat;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// C, H, O, H held together by bonds and tethered to their starting points.
pub(crate) fn bonded_molecule() -> (Vec<f64>, Vec<Vector3<f64>>, HarmonicBonds) {
    let masses = vec![12.011e-3, 1.008e-3, 15.999e-3, 1.008e-3];
    let positions = vec![
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.1, 0.0, 0.0),
        Vector3::new(0.0, 1.4, 0.0),
        Vector3::new(0.0, 2.3, 0.3),
    ];
    let force_field = HarmonicBonds {
        bonds: vec![bond(0, 1, 1.1), bond(0, 2, 1.4), bond(2, 3, 0.96)],
        tethers: positions
            .iter()
            .enumerate()
            .map(|(atom, &anchor)| Tether {
                atom,
                anchor,
                k: 2.0e5,
            })
            .collect(),
    };
    (masses, positions, force_field)
}

fn bond(i: usize, j: usize, r0: f64) -> SimpleBond {
    SimpleBond { i, j, k: 4.0e5, r0 }
}

pub(crate) fn gaussian_velocities(n: usize, seed: u64) -> Vec<Vector3<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Vector3::new(
                rng.sample::<f64, _>(StandardNormal),
                rng.sample::<f64, _>(StandardNormal),
                rng.sample::<f64, _>(StandardNormal),
            )
        })
        .collect()
}

/// Runs the configured thermostat on the bonded molecule and returns the
/// mean effective temperature over the second half of the run.
pub(crate) fn average_temperature(config: &MdConfig, steps: usize, seed: u64) -> f64 {
    let (masses, mut x, ff) = bonded_molecule();
    let mut v = gaussian_velocities(masses.len(), seed);
    let mut thermostat = Thermostat::new(&masses, &mut v, config).unwrap().unwrap();
    let mut a = accelerations(&ff, &x, &masses).unwrap();

    let mut sum = 0.0;
    let mut count = 0;
    for step in 0..steps {
        if step >= steps / 2 {
            sum += temperature(&v, &masses).unwrap();
            count += 1;
        }
        let out = thermostat.step(&ff, &a, &x, &v, &masses, config.dt).unwrap();
        (x, v, a) = out.into_parts();
    }
    sum / count as f64
}
