//! ----------------------
//! simple_md
//! ----------------------
//!
//! Runs a Lennard-Jones argon cluster, built on a cubic lattice, through the
//! velocity verlet driver and writes the trajectory as XYZ.
//!
//! Usage:
//!   simple_md --atoms 27 --spacing 3.8 --output results/
//!   simple_md --config md.json --output results/
//!
//! Without --config the run starts from random velocities at 300 K.

use clap::Parser;
use nalgebra::Vector3;
use simple_md::potentials::LennardJones;
use simple_md::{Geometry, InitialVelocity, MdConfig, MdError, VelocityVerlet, XyzWriter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "simple_md")]
#[command(about = "Velocity verlet molecular dynamics of an argon cluster")]
#[command(version)]
struct Args {
    /// JSON run configuration; missing keys take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of argon atoms
    #[arg(short, long, default_value = "27")]
    atoms: usize,

    /// Lattice spacing in Angstroms
    #[arg(short, long, default_value = "3.8")]
    spacing: f64,

    /// Output directory for the trajectory
    #[arg(short, long, default_value = "results")]
    output: PathBuf,

    /// Run name, used in the output file names
    #[arg(short, long, default_value = "argon")]
    name: String,

    /// Overrides max_step from the configuration
    #[arg(long)]
    steps: Option<usize>,
}

/// First `n` points of the smallest cube of lattice sites that holds them.
fn cubic_lattice(n: usize, spacing: f64) -> Vec<Vector3<f64>> {
    let side = (1..).find(|s: &usize| s * s * s >= n).unwrap_or(1);
    (0..side)
        .flat_map(|i| (0..side).flat_map(move |j| (0..side).map(move |k| (i, j, k))))
        .take(n)
        .map(|(i, j, k)| Vector3::new(i as f64, j as f64, k as f64) * spacing)
        .collect()
}

fn main() -> Result<(), MdError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MdConfig::from_json_file(path)?,
        None => MdConfig {
            initial_velocity: InitialVelocity::Random,
            log_trajectory: true,
            progress_bar: true,
            ..MdConfig::default()
        },
    };
    if let Some(steps) = args.steps {
        config.max_step = steps;
    }

    let geometry = Geometry::new(
        vec!["Ar".to_string(); args.atoms],
        cubic_lattice(args.atoms, args.spacing),
    )?;
    log::info!(
        "{} argon atoms, {} steps of {} fs, thermostat {:?}",
        args.atoms,
        config.max_step,
        config.dt,
        config.thermostat
    );

    let mut writer = XyzWriter::create(&args.output, &args.name)?;
    let mut md = VelocityVerlet::new(LennardJones::argon(), geometry, config)?.named(&args.name);
    md.propagate(&mut writer)?;

    if let Some(last) = md.history().last() {
        log::info!(
            "Finished at {:.1} fs, Teff {:.3} K; trajectory in {}",
            last.time,
            last.temperature,
            writer.trajectory_path().display()
        );
    }
    Ok(())
}
