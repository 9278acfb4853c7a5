// src/motion/smoothing.rs
//! Zero-phase exponential smoothing
//!
//! A single-pole IIR low-pass is run forward and then backward over the
//! signal, cancelling its phase lag. The smoothed X/Y columns form the
//! low-rate approximation (LRA) and the remainder the residual (SRA).

use std::f64::consts::PI;

use crate::motion::trajectory::Trajectory;

/// Smoothing factor for a single-pole low-pass with a -3 dB point at
/// `cutoff_hz` when sampled at `sample_hz`.
pub fn smoothing_alpha(cutoff_hz: f64, sample_hz: f64) -> f64 {
    let x = 2.0 * PI * cutoff_hz / sample_hz;
    let c = x.cos();
    c - 1.0 + (c * c - 4.0 * c + 3.0).sqrt()
}

/// Causal exponential smoothing, seeded with the first input value.
pub fn exp_smooth(signal: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(signal.len());
    let mut prev = match signal.first() {
        Some(&first) => first,
        None => return out,
    };
    for &value in signal {
        prev = (1.0 - alpha) * prev + alpha * value;
        out.push(prev);
    }
    out
}

/// Forward then backward exponential smoothing. Output has the input's length.
pub fn smooth(signal: &[f64], cutoff_hz: f64, sample_hz: f64) -> Vec<f64> {
    let alpha = smoothing_alpha(cutoff_hz, sample_hz);
    let mut forward = exp_smooth(signal, alpha);
    forward.reverse();
    let mut out = exp_smooth(&forward, alpha);
    out.reverse();
    out
}

/// LRA and SRA columns for X and Y.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Diagnostics {
    pub x_lra: Vec<f64>,
    pub y_lra: Vec<f64>,
    pub x_sra: Vec<f64>,
    pub y_sra: Vec<f64>,
}

impl Diagnostics {
    pub fn from_trajectory(trajectory: &Trajectory, cutoff_hz: f64) -> Self {
        let sample_hz = 1000.0 / trajectory.timestep_ms();
        let x = trajectory.column_x();
        let y = trajectory.column_y();
        let x_lra = smooth(&x, cutoff_hz, sample_hz);
        let y_lra = smooth(&y, cutoff_hz, sample_hz);
        let x_sra = x.iter().zip(&x_lra).map(|(raw, low)| raw - low).collect();
        let y_sra = y.iter().zip(&y_lra).map(|(raw, low)| raw - low).collect();
        tracing::debug!("Computed LRA/SRA columns for {} samples at {}Hz cutoff", x.len(), cutoff_hz);
        Self { x_lra, y_lra, x_sra, y_sra }
    }

    pub fn len(&self) -> usize {
        self.x_lra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_lra.is_empty()
    }
}
