// src/gcode/mod.rs
pub mod interpreter;
pub mod parser;

pub use interpreter::{CommandTally, GCodeInterpreter, MotionSegment};
pub use parser::{Command, GCodeLine, GCodeSpan, Word};

use thiserror::Error;

use crate::motion::{BufferError, ProfileError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GCodeError {
    #[error("line {line}, column {column}: malformed word '{token}': {reason}")]
    MalformedWord { line: usize, column: usize, token: String, reason: String },
    #[error("line {line}: motion error: {source}")]
    Motion {
        line: usize,
        #[source]
        source: ProfileError,
    },
    #[error("line {line}: {count} samples exceed the limit of {limit} per line")]
    SampleLimit { line: usize, count: f64, limit: usize },
    #[error("line {line}: {source}")]
    Buffer {
        line: usize,
        #[source]
        source: BufferError,
    },
    #[error("Invalid motion configuration: {0}")]
    Config(#[from] ProfileError),
    #[error("Trajectory buffer setup failed: {0}")]
    BufferSetup(#[from] BufferError),
}

impl GCodeError {
    /// Source line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            GCodeError::MalformedWord { line, .. }
            | GCodeError::Motion { line, .. }
            | GCodeError::SampleLimit { line, .. }
            | GCodeError::Buffer { line, .. } => Some(*line),
            GCodeError::Config(_) | GCodeError::BufferSetup(_) => None,
        }
    }
}
