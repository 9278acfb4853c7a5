// src/gcode/interpreter.rs - Modal G-code interpreter feeding the trajectory buffer
use std::collections::BTreeMap;

use crate::config::Config;
use crate::motion::{BufferError, ProfileSolver, Trajectory, TrajectoryBuffer};
use crate::printer::{Axis, Position, PrinterState};

use super::parser::{self, Command, GCodeLine, Word};
use super::GCodeError;

/// Occurrence counts of commands the interpreter does not implement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTally {
    counts: BTreeMap<String, usize>,
}

impl CommandTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, mnemonic: &str) {
        *self.counts.entry(mnemonic.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, mnemonic: &str) -> usize {
        self.counts.get(mnemonic).copied().unwrap_or(0)
    }

    /// Number of distinct mnemonics.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all occurrences.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Mnemonics in lexical order with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Start and end of one G0/G1 move in absolute machine coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSegment {
    pub start: Position,
    pub end: Position,
}

impl MotionSegment {
    pub fn delta(&self) -> Position {
        self.end.delta(&self.start)
    }

    /// XY travel distance; Z and E follow along proportionally.
    pub fn xy_distance(&self) -> f64 {
        self.delta().xy_norm()
    }
}

/// Consumes a program one line at a time, tracking modal state and appending
/// the sampled motion to its own trajectory buffer.
pub struct GCodeInterpreter {
    state: PrinterState,
    solver: ProfileSolver,
    corner_velocity: f64,
    timestep_ms: f64,
    max_samples_per_line: usize,
    buffer: TrajectoryBuffer,
    tally: CommandTally,
    line_number: usize,
}

impl GCodeInterpreter {
    pub fn new(config: &Config) -> Result<Self, GCodeError> {
        let motion = &config.motion;
        let solver = ProfileSolver::new(motion)?;
        Ok(Self {
            state: PrinterState::new(motion.default_feedrate),
            solver,
            corner_velocity: motion.corner_velocity,
            timestep_ms: motion.timestep_ms,
            max_samples_per_line: config.buffer.max_samples_per_line,
            buffer: TrajectoryBuffer::new(config.buffer.allocation_block_size, motion.timestep_ms)?,
            tally: CommandTally::new(),
            line_number: 0,
        })
    }

    pub fn state(&self) -> &PrinterState {
        &self.state
    }

    pub fn buffer(&self) -> &TrajectoryBuffer {
        &self.buffer
    }

    pub fn tally(&self) -> &CommandTally {
        &self.tally
    }

    pub fn lines_processed(&self) -> usize {
        self.line_number
    }

    /// Process the next line of the program.
    pub fn process_line(&mut self, raw_line: &str) -> Result<(), GCodeError> {
        self.line_number += 1;
        tracing::trace!("Processing line {}: {}", self.line_number, raw_line);
        match parser::parse_line(self.line_number, raw_line)? {
            Some(line) => self.execute(line),
            None => Ok(()),
        }
    }

    /// Trim the buffer and hand over the finished trajectory and tally.
    pub fn finish(self) -> (Trajectory, CommandTally) {
        (self.buffer.finish(), self.tally)
    }

    fn execute(&mut self, line: GCodeLine) -> Result<(), GCodeError> {
        match &line.command {
            Command::LinearMove { rapid } => {
                let segment = self.linear_move(&line.words);
                self.emit_segment(segment, *rapid)?;
            }
            Command::Dwell => self.dwell(&line)?,
            Command::AbsolutePositioning => {
                self.state.relative_move = false;
                self.state.relative_extrusion = false;
            }
            Command::RelativePositioning => {
                self.state.relative_move = true;
                self.state.relative_extrusion = true;
            }
            Command::AbsoluteExtrusion => self.state.relative_extrusion = false,
            Command::RelativeExtrusion => self.state.relative_extrusion = true,
            Command::UnitsInches => self.state.inch_units = true,
            Command::UnitsMillimeters => self.state.inch_units = false,
            Command::SetPosition => self.set_position(&line),
            Command::Unrecognized(mnemonic) => {
                tracing::trace!("Unimplemented command {} on line {}", mnemonic, self.line_number);
                self.tally.record(mnemonic);
            }
        }
        Ok(())
    }

    /// Resolve the words of a G0/G1 into the new absolute position.
    fn linear_move(&mut self, words: &[Word]) -> MotionSegment {
        let start = self.state.position;
        for word in words {
            let value = self.state.to_mm(word.value);
            if let Some(axis) = Axis::from_letter(word.letter) {
                self.state.position[axis] = self.state.resolve_axis(axis, value);
            } else if word.letter == 'F' {
                // F is mm/min (or in/min under G20); stored as mm/s.
                self.state.feedrate = value / 60.0;
            }
        }
        MotionSegment { start, end: self.state.position }
    }

    fn emit_segment(&mut self, segment: MotionSegment, rapid: bool) -> Result<usize, GCodeError> {
        let dist = segment.xy_distance();
        if dist == 0.0 {
            tracing::debug!("Line {}: no XY travel, nothing sampled", self.line_number);
            return Ok(0);
        }
        let profile = self
            .solver
            .solve(dist, self.corner_velocity, self.corner_velocity)
            .map_err(|source| GCodeError::Motion { line: self.line_number, source })?;
        self.check_sample_limit(profile.sample_steps() + 1.0)?;

        let error = profile.end_velocity_error();
        if error > 1e-9 {
            tracing::warn!(
                "Line {}: overshot end velocity by {:.3}mm/s over {:.3}mm",
                self.line_number,
                error,
                dist
            );
        } else if error < -1e-9 {
            tracing::warn!(
                "Line {}: undershot end velocity by {:.3}mm/s over {:.3}mm",
                self.line_number,
                -error,
                dist
            );
        }

        let delta = segment.delta();
        let (sin, cos) = delta.y.atan2(delta.x).sin_cos();
        let start = segment.start;
        let points = profile.samples().map(|s| {
            let fraction = s / dist;
            Position::new(
                start.x + cos * s,
                start.y + sin * s,
                start.z + delta.z * fraction,
                start.e + delta.e * fraction,
            )
        });
        let appended = self.buffer.append(points).map_err(|source| self.buffer_error(source))?;
        tracing::debug!(
            "Line {}: {} {:?} move of {:.3}mm, {} samples",
            self.line_number,
            if rapid { "G0" } else { "G1" },
            profile.case(),
            dist,
            appended
        );
        Ok(appended)
    }

    /// G4/M0/M1: hold the current position. S (seconds) wins over P (ms).
    fn dwell(&mut self, line: &GCodeLine) -> Result<(), GCodeError> {
        let delay_ms = match (line.word('S'), line.word('P')) {
            (Some(s), _) => s.value * 1000.0,
            (None, Some(p)) => p.value,
            (None, None) => 0.0,
        };
        let count = (delay_ms / self.timestep_ms).ceil().max(0.0);
        self.check_sample_limit(count)?;
        let appended = self
            .buffer
            .append_repeated(self.state.position, count as usize)
            .map_err(|source| self.buffer_error(source))?;
        tracing::debug!("Line {}: dwell {}ms, {} samples", self.line_number, delay_ms, appended);
        Ok(())
    }

    /// G92: redefine the workspace offset for each axis word present.
    fn set_position(&mut self, line: &GCodeLine) {
        for axis in Axis::ALL {
            let Some(word) = line.word(axis.letter()) else {
                continue;
            };
            let declared = self.state.to_mm(word.value);
            self.state.set_workspace_offset(axis, declared);
            tracing::debug!(
                "Line {}: {} declared as {:.3}, offset {:.3}",
                self.line_number,
                axis,
                declared,
                self.state.workspace_offset[axis]
            );
        }
    }

    /// Reject a move or dwell whose sample count is not finite or exceeds the
    /// configured per-line limit, before anything is allocated.
    fn check_sample_limit(&self, count: f64) -> Result<(), GCodeError> {
        if count.is_finite() && count <= self.max_samples_per_line as f64 {
            return Ok(());
        }
        Err(GCodeError::SampleLimit { line: self.line_number, count, limit: self.max_samples_per_line })
    }

    fn buffer_error(&self, source: BufferError) -> GCodeError {
        GCodeError::Buffer { line: self.line_number, source }
    }
}
