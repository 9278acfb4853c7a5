// src/file_manager.rs - Trajectory CSV and sidecar output
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::config::{Config, MotionConfig};
use crate::gcode::CommandTally;
use crate::motion::{Diagnostics, Trajectory};
use crate::print_job::ConversionReport;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Diagnostic columns have {got} rows but the trajectory has {expected}")]
    LengthMismatch { expected: usize, got: usize },
}

const BASE_COLUMNS: [&str; 5] = ["t(ms)", "x", "y", "z", "e"];
const DIAGNOSTIC_COLUMNS: [&str; 4] = ["xLRA", "yLRA", "xSRA", "ySRA"];

/// Paths and size of the files written for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFiles {
    pub csv: PathBuf,
    pub sidecar: PathBuf,
    pub csv_size: u64,
}

/// Writes conversion results under one output directory.
#[derive(Debug, Clone)]
pub struct FileManager {
    output_directory: PathBuf,
}

impl FileManager {
    pub fn new(output_directory: impl Into<PathBuf>) -> Self {
        Self { output_directory: output_directory.into() }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Write `<stem>.csv` and its `<stem>.txt` sidecar, creating the output
    /// directory if needed.
    pub fn write_report(
        &self,
        stem: &str,
        report: &ConversionReport,
        config: &Config,
        diagnostics: Option<&Diagnostics>,
    ) -> Result<OutputFiles, OutputError> {
        fs::create_dir_all(&self.output_directory)?;
        let csv_path = self.output_directory.join(format!("{stem}.csv"));
        let sidecar_path = self.output_directory.join(format!("{stem}.txt"));

        write_trajectory_csv(&csv_path, &report.trajectory, diagnostics)?;
        let csv_size = fs::metadata(&csv_path)?.len();
        tracing::info!("Saved trajectory to {} ({})", csv_path.display(), human_size(csv_size));

        let info = SidecarInfo {
            main_file: csv_path.display().to_string(),
            main_file_size: csv_size,
            created: Local::now(),
            cutoff_hz: diagnostics.map(|_| config.smoothing.cutoff_hz),
            motion: config.motion,
            total_points: report.trajectory.len(),
            parse_time_s: report.elapsed.as_secs_f64(),
            tally: &report.tally,
        };
        write_sidecar(&sidecar_path, &info)?;
        tracing::info!("Saved sidecar to {}", sidecar_path.display());

        Ok(OutputFiles { csv: csv_path, sidecar: sidecar_path, csv_size })
    }
}

/// `<file stem>-<corner>mms_min-<max>mms_max`
pub fn output_stem(source: &str, motion: &MotionConfig) -> String {
    let stem = Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "trajectory".to_string());
    format!("{}-{}mms_min-{}mms_max", stem, motion.corner_velocity, motion.max_velocity)
}

/// Human-readable size in base-1024 units, e.g. `1.50 KB`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
    if bytes == 0 {
        return "0B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Write the trajectory as CSV with three-decimal values, optionally followed
/// by the LRA/SRA diagnostic columns.
pub fn write_trajectory_csv(
    path: impl AsRef<Path>,
    trajectory: &Trajectory,
    diagnostics: Option<&Diagnostics>,
) -> Result<(), OutputError> {
    if let Some(diag) = diagnostics {
        if diag.len() != trajectory.len() {
            return Err(OutputError::LengthMismatch { expected: trajectory.len(), got: diag.len() });
        }
    }
    let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(path)?));

    let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
    if diagnostics.is_some() {
        header.extend(DIAGNOSTIC_COLUMNS);
    }
    writer.write_record(&header)?;

    let mut record: Vec<String> = Vec::with_capacity(header.len());
    for (i, sample) in trajectory.samples().iter().enumerate() {
        record.clear();
        for value in [sample.time_ms, sample.x, sample.y, sample.z, sample.e] {
            record.push(format!("{:.3}", value));
        }
        if let Some(diag) = diagnostics {
            for value in [diag.x_lra[i], diag.y_lra[i], diag.x_sra[i], diag.y_sra[i]] {
                record.push(format!("{:.3}", value));
            }
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Metadata written next to the CSV.
#[derive(Debug, Clone)]
pub struct SidecarInfo<'a> {
    pub main_file: String,
    pub main_file_size: u64,
    pub created: DateTime<Local>,
    /// `None` when smoothing was disabled.
    pub cutoff_hz: Option<f64>,
    pub motion: MotionConfig,
    pub total_points: usize,
    pub parse_time_s: f64,
    pub tally: &'a CommandTally,
}

pub fn write_sidecar(path: impl AsRef<Path>, info: &SidecarInfo<'_>) -> Result<(), OutputError> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "Main File: {}", info.main_file)?;
    writeln!(out, "Main File Size: {}", human_size(info.main_file_size))?;
    writeln!(out, "Created: {}", info.created.format("Date %y-%m-%d Time %H:%M:%S"))?;
    match info.cutoff_hz {
        Some(cutoff) => writeln!(out, "2nd Order Cutoff Freq: {}Hz", cutoff)?,
        None => writeln!(out, "2nd Order Cutoff Freq: disabled")?,
    }
    writeln!(out, "Corner Velocity: {} mm/s", info.motion.corner_velocity)?;
    writeln!(out, "Max Velocity: {} mm/s", info.motion.max_velocity)?;
    writeln!(out, "Acceleration: {} mm/s^2", info.motion.acceleration)?;
    writeln!(out, "Total path points: {}", info.total_points)?;
    writeln!(out, "Timestep: {}ms", info.motion.timestep_ms)?;
    writeln!(out, "Total Time: {}s", info.motion.timestep_ms * info.total_points as f64 / 1000.0)?;
    writeln!(out, "Parse Time: {:.3}s", info.parse_time_s)?;
    if !info.tally.is_empty() {
        writeln!(out, "Not implemented:")?;
        for (mnemonic, count) in info.tally.iter() {
            writeln!(out, "- {}: {}", mnemonic, count)?;
        }
    }
    out.flush()?;
    Ok(())
}
