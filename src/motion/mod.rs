// src/motion/mod.rs - Motion profile solving, smoothing and trajectory storage
pub mod profile;
pub mod smoothing;
pub mod trajectory;

pub use profile::{MotionProfile, MotionState, Phase, ProfileCase, ProfileError, ProfileSolver, Samples};
pub use smoothing::Diagnostics;
pub use trajectory::{BufferError, Trajectory, TrajectoryBuffer, TrajectorySample};
