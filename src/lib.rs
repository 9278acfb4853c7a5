//! Converts G-code motion programs into fixed-timestep kinematic trajectories.
//!
//! A [`gcode::GCodeInterpreter`] tracks modal state line by line and, for every
//! G0/G1, asks the [`motion::ProfileSolver`] for an acceleration-bounded
//! arc-length curve which it maps onto X/Y/Z/E and appends to a
//! [`motion::TrajectoryBuffer`]. [`print_job::ConversionJob`] runs a whole
//! program and [`file_manager`] writes the CSV and sidecar output.
//!
//! ```rust
//! use gcode_trajectory::config::Config;
//! use gcode_trajectory::print_job::ConversionJob;
//!
//! let job = ConversionJob::new(Config::default());
//! let report = job.run_lines("demo", ["G21", "G90", "G1 X10 F3000", "G4 P5"]).unwrap();
//! assert_eq!(report.trajectory.len(), 21 + 5);
//! assert!(report.tally.is_empty());
//! ```

pub mod config;
pub mod file_manager;
pub mod gcode;
pub mod motion;
pub mod print_job;
pub mod printer;

pub use config::{Config, ConfigError};
pub use gcode::{CommandTally, GCodeError, GCodeInterpreter};
pub use motion::{ProfileSolver, Trajectory, TrajectoryBuffer, TrajectorySample};
pub use print_job::{ConversionJob, ConversionReport, JobError};
pub use printer::{Axis, Position, PrinterState};
