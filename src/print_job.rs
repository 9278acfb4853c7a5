// src/print_job.rs - One G-code program converted into one trajectory
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::Config;
use crate::gcode::{CommandTally, GCodeError, GCodeInterpreter};
use crate::motion::{Diagnostics, Trajectory};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("{source_name}: IO error: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },
    #[error("{source_name}: {error}")]
    GCode {
        source_name: String,
        #[source]
        error: GCodeError,
    },
}

/// Result of a finished conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// File name or label of the converted program.
    pub source: String,
    pub trajectory: Trajectory,
    pub tally: CommandTally,
    pub elapsed: Duration,
    pub lines_processed: usize,
}

impl ConversionReport {
    /// LRA/SRA columns, when smoothing is enabled in `config`.
    pub fn diagnostics(&self, config: &Config) -> Option<Diagnostics> {
        config
            .smoothing
            .enabled
            .then(|| Diagnostics::from_trajectory(&self.trajectory, config.smoothing.cutoff_hz))
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "{}: {} lines -> {} samples ({:.3}s of motion) in {:.3}s",
            self.source,
            self.lines_processed,
            self.trajectory.len(),
            self.trajectory.total_time_s(),
            self.elapsed.as_secs_f64()
        );
        for (mnemonic, count) in self.tally.iter() {
            tracing::info!("{}: not implemented {} x{}", self.source, mnemonic, count);
        }
    }
}

/// Converts programs with a fixed configuration. Every run builds its own
/// interpreter and buffer, so jobs can run concurrently.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    config: Config,
}

impl ConversionJob {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert in-memory lines.
    pub fn run_lines<I, S>(&self, source: &str, lines: I) -> Result<ConversionReport, JobError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.run(source, lines.into_iter().map(Ok::<S, std::io::Error>))
    }

    /// Convert a program read line by line.
    pub fn run_reader<R: BufRead>(&self, source: &str, reader: R) -> Result<ConversionReport, JobError> {
        self.run(source, reader.lines())
    }

    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<ConversionReport, JobError> {
        let path = path.as_ref();
        let source = path.display().to_string();
        tracing::info!("Converting G-code file: {}", source);
        let file = File::open(path).map_err(|error| JobError::Io { source_name: source.clone(), error })?;
        self.run_reader(&source, BufReader::new(file))
    }

    fn run<I, S>(&self, source: &str, lines: I) -> Result<ConversionReport, JobError>
    where
        I: Iterator<Item = std::io::Result<S>>,
        S: AsRef<str>,
    {
        let started = Instant::now();
        let gcode_error = |error| JobError::GCode { source_name: source.to_string(), error };
        let mut interpreter = GCodeInterpreter::new(&self.config).map_err(gcode_error)?;
        for line in lines {
            let line = line.map_err(|error| JobError::Io { source_name: source.to_string(), error })?;
            interpreter.process_line(line.as_ref()).map_err(gcode_error)?;
        }
        let lines_processed = interpreter.lines_processed();
        let (trajectory, tally) = interpreter.finish();
        let report = ConversionReport {
            source: source.to_string(),
            trajectory,
            tally,
            elapsed: started.elapsed(),
            lines_processed,
        };
        report.log_summary();
        Ok(report)
    }
}
