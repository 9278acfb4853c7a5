// src/motion/profile.rs
//! Bounded-acceleration motion profiles sampled on a fixed time grid.
//!
//! A profile describes the arc length travelled along one move as a function of
//! time. It is built from at most three constant-acceleration phases
//! (accelerate, cruise, decelerate) and resolves to one of four shapes:
//!
//! 1. decelerate only, when the move is too short to slow from the start
//!    velocity to the end velocity (the end velocity is overshot),
//! 2. accelerate only, when the move is too short to reach the end velocity
//!    (the end velocity is undershot),
//! 3. triangular, accelerating to a peak below the velocity ceiling and
//!    decelerating straight away,
//! 4. trapezoidal, with a cruise phase at the velocity ceiling.
//!
//! Samples are taken at `t = k / hz` for `k = 0..=N`, `N = ceil(T * hz)`. The
//! final sample is evaluated at exactly `T`, so every sequence starts at 0 and
//! ends at the requested distance.

use thiserror::Error;

use crate::config::MotionConfig;

/// Slack when rounding `T * hz` up, so an exact multiple does not gain a sample.
const SAMPLE_COUNT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Invalid profile parameters: {0}")]
    InvalidParameters(String),
}

/// Velocity shape a move resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileCase {
    /// Zero-length move, no samples.
    Stationary,
    DecelerateOnly,
    AccelerateOnly,
    Triangular,
    Trapezoidal,
}

/// Motion state at a specific time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    /// Arc length travelled since the start of the move (mm)
    pub position: f64,

    /// Velocity at this time (mm/s)
    pub velocity: f64,

    /// Acceleration at this time (mm/s²)
    pub acceleration: f64,

    /// Time since start of move (seconds)
    pub time: f64,
}

/// One constant-acceleration piece of a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub start_time: f64,
    pub duration: f64,
    pub start_position: f64,
    pub start_velocity: f64,
    /// Signed: positive while accelerating, negative while decelerating.
    pub acceleration: f64,
}

impl Phase {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    pub fn end_velocity(&self) -> f64 {
        self.start_velocity + self.acceleration * self.duration
    }

    fn state_at(&self, time: f64) -> MotionState {
        let dt = (time - self.start_time).clamp(0.0, self.duration);
        MotionState {
            position: self.start_position + self.start_velocity * dt + 0.5 * self.acceleration * dt * dt,
            velocity: self.start_velocity + self.acceleration * dt,
            acceleration: self.acceleration,
            time,
        }
    }
}

/// A solved move: phase layout plus the velocity actually reached at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionProfile {
    case: ProfileCase,
    distance: f64,
    duration: f64,
    sample_hz: f64,
    phases: Vec<Phase>,
    peak_velocity: f64,
    requested_end_velocity: f64,
    achieved_end_velocity: f64,
}

impl MotionProfile {
    pub fn case(&self) -> ProfileCase {
        self.case
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Total move time (s).
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn sample_hz(&self) -> f64 {
        self.sample_hz
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Highest velocity reached during the move (mm/s).
    pub fn peak_velocity(&self) -> f64 {
        self.peak_velocity
    }

    pub fn requested_end_velocity(&self) -> f64 {
        self.requested_end_velocity
    }

    /// Velocity at the end of the move. Differs from the requested end
    /// velocity only in the decelerate-only and accelerate-only cases.
    pub fn achieved_end_velocity(&self) -> f64 {
        self.achieved_end_velocity
    }

    /// Positive when the end velocity was overshot, negative when undershot.
    pub fn end_velocity_error(&self) -> f64 {
        self.achieved_end_velocity - self.requested_end_velocity
    }

    /// Number of time steps `N` on the sample grid, kept as a float so callers
    /// can bound oversized moves before anything is allocated.
    pub fn sample_steps(&self) -> f64 {
        if self.case == ProfileCase::Stationary {
            return 0.0;
        }
        // Any travel gets at least the start and end points.
        (self.duration * self.sample_hz - SAMPLE_COUNT_TOLERANCE).ceil().max(1.0)
    }

    /// Number of samples `samples()` yields.
    pub fn sample_count(&self) -> usize {
        if self.case == ProfileCase::Stationary {
            return 0;
        }
        // Endpoints inclusive: N steps give N + 1 points.
        (self.sample_steps() as usize).saturating_add(1)
    }

    /// Sample index at which acceleration gives way to cruising or
    /// deceleration, for profiles that have both phases.
    pub fn switchover_index(&self) -> Option<usize> {
        match self.case {
            ProfileCase::Triangular | ProfileCase::Trapezoidal => {
                let accel = self.phases.first()?;
                Some((accel.duration * self.sample_hz).round() as usize)
            }
            _ => None,
        }
    }

    /// Motion state at `time` seconds into the move, clamped to the move.
    pub fn state_at(&self, time: f64) -> MotionState {
        if time >= self.duration {
            return MotionState {
                position: self.distance,
                velocity: self.achieved_end_velocity,
                acceleration: self.phases.last().map_or(0.0, |p| p.acceleration),
                time: self.duration,
            };
        }
        // Zero-length phases share their start time with the next phase and
        // are skipped by taking the last phase that has started.
        let phase = self
            .phases
            .iter()
            .rev()
            .find(|p| p.start_time <= time)
            .or_else(|| self.phases.first());
        match phase {
            Some(phase) => {
                let mut state = phase.state_at(time.max(0.0));
                state.position = state.position.clamp(0.0, self.distance);
                state
            }
            None => MotionState { position: 0.0, velocity: 0.0, acceleration: 0.0, time },
        }
    }

    pub fn position_at(&self, time: f64) -> f64 {
        self.state_at(time).position
    }

    /// Lazily evaluated arc-length samples, from 0 to `distance`.
    pub fn samples(&self) -> Samples<'_> {
        Samples { profile: self, next: 0, count: self.sample_count() }
    }

    /// Collect the samples together with the achieved end velocity.
    pub fn into_parts(self) -> (Vec<f64>, f64) {
        let samples = self.samples().collect();
        (samples, self.achieved_end_velocity)
    }
}

/// Iterator over the arc-length samples of a [`MotionProfile`].
#[derive(Debug, Clone)]
pub struct Samples<'a> {
    profile: &'a MotionProfile,
    next: usize,
    count: usize,
}

impl Iterator for Samples<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next >= self.count {
            return None;
        }
        let index = self.next;
        self.next += 1;
        if index + 1 == self.count {
            return Some(self.profile.distance);
        }
        Some(self.profile.position_at(index as f64 / self.profile.sample_hz))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Samples<'_> {}

/// Solves single moves under a constant acceleration magnitude and a hard
/// velocity ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSolver {
    acceleration: f64,
    max_velocity: f64,
    sample_hz: f64,
}

impl ProfileSolver {
    pub fn new(config: &MotionConfig) -> Result<Self, ProfileError> {
        Self::with_limits(config.acceleration, config.max_velocity, config.sample_hz())
    }

    pub fn with_limits(acceleration: f64, max_velocity: f64, sample_hz: f64) -> Result<Self, ProfileError> {
        if !(acceleration > 0.0) || !acceleration.is_finite() {
            return Err(ProfileError::InvalidParameters(format!("acceleration must be > 0, got {}", acceleration)));
        }
        if !(max_velocity > 0.0) || !max_velocity.is_finite() {
            return Err(ProfileError::InvalidParameters(format!("max velocity must be > 0, got {}", max_velocity)));
        }
        if !(sample_hz > 0.0) || !sample_hz.is_finite() {
            return Err(ProfileError::InvalidParameters(format!("sample rate must be > 0, got {}", sample_hz)));
        }
        Ok(Self { acceleration, max_velocity, sample_hz })
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    pub fn sample_hz(&self) -> f64 {
        self.sample_hz
    }

    /// Solve a move of `distance` mm entered at `start_velocity` and meant to
    /// leave at `end_velocity` (both mm/s).
    pub fn solve(&self, distance: f64, start_velocity: f64, end_velocity: f64) -> Result<MotionProfile, ProfileError> {
        self.check_inputs(distance, start_velocity, end_velocity)?;

        let acc = self.acceleration;
        let vs = start_velocity;
        let ve = end_velocity;
        let profile = |case, duration, phases: Vec<Phase>, peak_velocity, achieved_end_velocity| MotionProfile {
            case,
            distance,
            duration,
            sample_hz: self.sample_hz,
            phases,
            peak_velocity,
            requested_end_velocity: ve,
            achieved_end_velocity,
        };

        if distance == 0.0 {
            return Ok(profile(ProfileCase::Stationary, 0.0, Vec::new(), vs, vs));
        }

        // Peak velocity if the move accelerated as long as possible and still
        // met the end velocity exactly, ignoring the ceiling.
        let act_vm = (acc * distance + 0.5 * (vs * vs + ve * ve)).sqrt();

        let solved = if act_vm < vs {
            // act_vm < vs implies vs² > 2·acc·distance, so the root is real.
            let t = (vs - (vs * vs - 2.0 * acc * distance).max(0.0).sqrt()) / acc;
            let decel = Phase { start_time: 0.0, duration: t, start_position: 0.0, start_velocity: vs, acceleration: -acc };
            profile(ProfileCase::DecelerateOnly, t, vec![decel], vs, vs - acc * t)
        } else if act_vm < ve {
            let t = ((vs * vs + 2.0 * acc * distance).sqrt() - vs) / acc;
            let accel = Phase { start_time: 0.0, duration: t, start_position: 0.0, start_velocity: vs, acceleration: acc };
            profile(ProfileCase::AccelerateOnly, t, vec![accel], vs + acc * t, vs + acc * t)
        } else if act_vm <= self.max_velocity {
            let t_acc = (act_vm - vs) / acc;
            let t_dec = (act_vm - ve) / acc;
            let d_dec = (act_vm * act_vm - ve * ve) / (2.0 * acc);
            let phases = vec![
                Phase { start_time: 0.0, duration: t_acc, start_position: 0.0, start_velocity: vs, acceleration: acc },
                Phase {
                    start_time: t_acc,
                    duration: t_dec,
                    start_position: distance - d_dec,
                    start_velocity: act_vm,
                    acceleration: -acc,
                },
            ];
            profile(ProfileCase::Triangular, t_acc + t_dec, phases, act_vm, ve)
        } else {
            let vmax = self.max_velocity;
            let t_acc = (vmax - vs) / acc;
            let d_acc = (vmax * vmax - vs * vs) / (2.0 * acc);
            let t_dec = (vmax - ve) / acc;
            let d_dec = (vmax * vmax - ve * ve) / (2.0 * acc);
            // act_vm > vmax guarantees a positive cruise length.
            let d_cruise = (distance - d_acc - d_dec).max(0.0);
            let t_cruise = d_cruise / vmax;
            let phases = vec![
                Phase { start_time: 0.0, duration: t_acc, start_position: 0.0, start_velocity: vs, acceleration: acc },
                Phase { start_time: t_acc, duration: t_cruise, start_position: d_acc, start_velocity: vmax, acceleration: 0.0 },
                Phase {
                    start_time: t_acc + t_cruise,
                    duration: t_dec,
                    start_position: distance - d_dec,
                    start_velocity: vmax,
                    acceleration: -acc,
                },
            ];
            profile(ProfileCase::Trapezoidal, t_acc + t_cruise + t_dec, phases, vmax, ve)
        };

        tracing::debug!(
            "Solved {:?} profile: {:.3}mm in {:.4}s, peak {:.1}mm/s, end {:.1}mm/s",
            solved.case,
            distance,
            solved.duration,
            solved.peak_velocity,
            solved.achieved_end_velocity
        );
        Ok(solved)
    }

    fn check_inputs(&self, distance: f64, start_velocity: f64, end_velocity: f64) -> Result<(), ProfileError> {
        if !(distance >= 0.0) || !distance.is_finite() {
            return Err(ProfileError::InvalidParameters(format!("distance must be a finite value >= 0, got {}", distance)));
        }
        for (name, v) in [("start", start_velocity), ("end", end_velocity)] {
            if !(v >= 0.0 && v <= self.max_velocity) {
                return Err(ProfileError::InvalidParameters(format!(
                    "{} velocity {} outside [0, {}]",
                    name, v, self.max_velocity
                )));
            }
        }
        Ok(())
    }
}
