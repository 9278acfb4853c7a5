// src/motion/trajectory.rs
//! Fixed-timestep trajectory storage.
//!
//! [`TrajectoryBuffer`] grows in whole blocks. Every row of a block gets its
//! timestamp when the block is allocated (`t0 + i * timestep_ms`), so appending
//! only ever writes position columns.

use thiserror::Error;

use crate::printer::Position;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BufferError {
    #[error("Trajectory buffer of {len} rows cannot grow by {requested} more")]
    CapacityOverflow { len: usize, requested: usize },
    #[error("Failed to allocate {rows} trajectory rows")]
    Allocation { rows: usize },
}

/// One row of the output trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrajectorySample {
    pub time_ms: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub e: f64,
}

impl TrajectorySample {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y, self.z, self.e)
    }

    fn set_position(&mut self, position: Position) {
        self.x = position.x;
        self.y = position.y;
        self.z = position.z;
        self.e = position.e;
    }
}

/// Growable, block-allocated sample store owned by one conversion job.
#[derive(Debug, Clone)]
pub struct TrajectoryBuffer {
    /// Physical rows; `rows.len()` is the capacity.
    rows: Vec<TrajectorySample>,
    /// Rows written so far.
    len: usize,
    block_size: usize,
    timestep_ms: f64,
    start_time_ms: f64,
}

impl TrajectoryBuffer {
    /// Empty buffer with one block allocated, timestamps starting at 0.
    pub fn new(block_size: usize, timestep_ms: f64) -> Result<Self, BufferError> {
        Self::with_start_time(block_size, timestep_ms, 0.0)
    }

    pub fn with_start_time(block_size: usize, timestep_ms: f64, start_time_ms: f64) -> Result<Self, BufferError> {
        let mut buffer = Self {
            rows: Vec::new(),
            len: 0,
            block_size: block_size.max(1),
            timestep_ms,
            start_time_ms,
        };
        buffer.add_blocks(1)?;
        Ok(buffer)
    }

    /// Number of rows written.
    pub fn size(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of rows allocated, written or not.
    pub fn capacity(&self) -> usize {
        self.rows.len()
    }

    /// Written rows.
    pub fn rows(&self) -> &[TrajectorySample] {
        &self.rows[..self.len]
    }

    /// Position of the most recently written row.
    pub fn last_position(&self) -> Option<Position> {
        self.rows().last().map(TrajectorySample::position)
    }

    /// Append positions, growing by whole blocks whenever capacity runs out.
    /// Returns the number of rows appended. On error the rows appended so far
    /// are kept.
    pub fn append<I>(&mut self, positions: I) -> Result<usize, BufferError>
    where
        I: IntoIterator<Item = Position>,
    {
        let positions = positions.into_iter();
        let (lower, _) = positions.size_hint();
        self.reserve(lower)?;

        let start = self.len;
        for position in positions {
            if self.len == self.rows.len() {
                self.add_blocks(1)?;
            }
            self.rows[self.len].set_position(position);
            self.len += 1;
        }
        Ok(self.len - start)
    }

    /// Append `count` copies of one position.
    pub fn append_repeated(&mut self, position: Position, count: usize) -> Result<usize, BufferError> {
        self.append(std::iter::repeat_n(position, count))
    }

    /// Drop the unwritten tail so capacity equals size.
    pub fn trim(&mut self) {
        self.rows.truncate(self.len);
        self.rows.shrink_to_fit();
    }

    /// Trim and freeze into a read-only trajectory.
    pub fn finish(mut self) -> Trajectory {
        self.trim();
        Trajectory { samples: self.rows, timestep_ms: self.timestep_ms }
    }

    fn reserve(&mut self, additional: usize) -> Result<(), BufferError> {
        let needed = self
            .len
            .checked_add(additional)
            .ok_or(BufferError::CapacityOverflow { len: self.len, requested: additional })?;
        if needed > self.rows.len() {
            let missing = needed - self.rows.len();
            self.add_blocks(missing.div_ceil(self.block_size))?;
        }
        Ok(())
    }

    fn add_blocks(&mut self, blocks: usize) -> Result<(), BufferError> {
        let first = self.rows.len();
        let overflow = BufferError::CapacityOverflow { len: first, requested: blocks.saturating_mul(self.block_size) };
        let added = blocks.checked_mul(self.block_size).ok_or_else(|| overflow.clone())?;
        let new_len = first.checked_add(added).ok_or(overflow)?;
        self.rows
            .try_reserve_exact(added)
            .map_err(|_| BufferError::Allocation { rows: added })?;
        for index in first..new_len {
            self.rows.push(TrajectorySample {
                time_ms: self.start_time_ms + index as f64 * self.timestep_ms,
                ..TrajectorySample::default()
            });
        }
        tracing::trace!("Trajectory buffer grew to {} rows", new_len);
        Ok(())
    }
}

/// Finished trajectory, handed to writers.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
    timestep_ms: f64,
}

impl Trajectory {
    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn timestep_ms(&self) -> f64 {
        self.timestep_ms
    }

    /// Duration covered by the samples (s).
    pub fn total_time_s(&self) -> f64 {
        self.timestep_ms * self.samples.len() as f64 / 1000.0
    }

    pub fn column_x(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.x).collect()
    }

    pub fn column_y(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.y).collect()
    }
}
