/*
Trajectory collaborator

The drivers hand snapshots to a TrajectorySink at fixed step intervals; what
happens to them (XYZ file, memory, nothing) is up to the sink. Writes are
synchronous, on the stepping thread.
 */

use crate::error::Result;
use nalgebra::Vector3;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub atoms: Vec<String>,
    pub positions: Vec<Vector3<f64>>,
    pub time: f64,
    pub kinetic_energy: f64,
}

/// One sample of the dipole time series recorded by the field-driven driver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DipoleRecord {
    pub time: f64,
    pub dipole: Vector3<f64>, // relative to the dipole at t = 0
    pub kinetic_energy: f64,
}

#[derive(Serialize)]
struct DipoleRow {
    time: f64,
    mu_x: f64,
    mu_y: f64,
    mu_z: f64,
    kinetic_energy: f64,
}

impl From<&DipoleRecord> for DipoleRow {
    fn from(r: &DipoleRecord) -> Self {
        DipoleRow {
            time: r.time,
            mu_x: r.dipole.x,
            mu_y: r.dipole.y,
            mu_z: r.dipole.z,
            kinetic_energy: r.kinetic_energy,
        }
    }
}

pub trait TrajectorySink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Persists the whole dipole series recorded so far.
    fn write_dipole_log(&mut self, _records: &[DipoleRecord]) -> Result<()> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TrajectorySink for NullSink {
    fn write_frame(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<Frame>,
    pub dipole_log: Vec<DipoleRecord>,
    pub dipole_writes: usize,
}

impl TrajectorySink for MemorySink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn write_dipole_log(&mut self, records: &[DipoleRecord]) -> Result<()> {
        self.dipole_log = records.to_vec();
        self.dipole_writes += 1;
        Ok(())
    }
}

/// Appends frames to `<dir>/MDTrajectory<name>.xyz` and keeps the dipole
/// series in `<dir>/MDLog<name>.csv`.
pub struct XyzWriter {
    trajectory: BufWriter<File>,
    trajectory_path: PathBuf,
    dipole_path: PathBuf,
}

impl XyzWriter {
    pub fn create(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let trajectory_path = dir.join(format!("MDTrajectory{name}.xyz"));
        let dipole_path = dir.join(format!("MDLog{name}.csv"));
        let trajectory = BufWriter::new(File::create(&trajectory_path)?);
        Ok(XyzWriter {
            trajectory,
            trajectory_path,
            dipole_path,
        })
    }

    pub fn trajectory_path(&self) -> &Path {
        &self.trajectory_path
    }

    pub fn dipole_path(&self) -> &Path {
        &self.dipole_path
    }
}

impl TrajectorySink for XyzWriter {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        writeln!(self.trajectory, "{}", frame.atoms.len())?;
        writeln!(
            self.trajectory,
            "Time: {} KineticEnergy: {}",
            frame.time, frame.kinetic_energy
        )?;
        for (atom, x) in frame.atoms.iter().zip(&frame.positions) {
            writeln!(self.trajectory, "{atom} {:.8} {:.8} {:.8}", x.x, x.y, x.z)?;
        }
        self.trajectory.flush()?;
        Ok(())
    }

    fn write_dipole_log(&mut self, records: &[DipoleRecord]) -> Result<()> {
        // rewritten from scratch each time, the series only grows
        let mut wtr = csv::Writer::from_path(&self.dipole_path)?;
        for record in records {
            wtr.serialize(DipoleRow::from(record))?;
        }
        wtr.flush()?;
        Ok(())
    }
}
