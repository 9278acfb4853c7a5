// src/printer.rs - Modal printer state tracked by the G-code interpreter
use std::fmt;
use std::ops::{Index, IndexMut};

/// Millimetres per inch, applied to every axis value while G20 is active.
pub const MM_PER_INCH: f64 = 25.4;

/// Machine axis addressed by a G-code word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
    E,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    /// Map a word letter (either case) to its axis.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            'E' => Some(Axis::E),
            _ => None,
        }
    }

    /// Upper-case word letter for this axis.
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::E => 'E',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// X, Y, Z and E coordinates in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub e: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0, z: 0.0, e: 0.0 };

    pub fn new(x: f64, y: f64, z: f64, e: f64) -> Self {
        Self { x, y, z, e }
    }

    /// Component-wise difference `self - other`.
    pub fn delta(&self, other: &Position) -> Position {
        Position {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            e: self.e - other.e,
        }
    }

    /// Euclidean length of the XY projection.
    pub fn xy_norm(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl Index<Axis> for Position {
    type Output = f64;

    fn index(&self, axis: Axis) -> &f64 {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::E => &self.e,
        }
    }
}

impl IndexMut<Axis> for Position {
    fn index_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::E => &mut self.e,
        }
    }
}

/// Modal interpreter state. Positions are always absolute machine coordinates;
/// relative and offset semantics are resolved when a word is parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterState {
    pub position: Position,
    /// Modal feedrate in mm/s. Stored for reporting only.
    pub feedrate: f64,
    pub inch_units: bool,
    pub relative_move: bool,
    pub relative_extrusion: bool,
    /// Per-axis translation set by G92.
    pub workspace_offset: Position,
}

impl PrinterState {
    /// Fresh state at the machine origin, metric and absolute.
    /// `default_feedrate` is in mm/min, as it would appear in an F word.
    pub fn new(default_feedrate: f64) -> Self {
        Self {
            position: Position::ORIGIN,
            feedrate: default_feedrate / 60.0,
            inch_units: false,
            relative_move: false,
            relative_extrusion: false,
            workspace_offset: Position::ORIGIN,
        }
    }

    /// Convert a raw word value into millimetres according to the active units.
    pub fn to_mm(&self, value: f64) -> f64 {
        if self.inch_units { value * MM_PER_INCH } else { value }
    }

    /// Resolve a G0/G1 axis value into an absolute machine coordinate.
    /// `value` must already be in millimetres.
    pub fn resolve_axis(&self, axis: Axis, value: f64) -> f64 {
        let relative = match axis {
            Axis::E => self.relative_extrusion,
            _ => self.relative_move,
        };
        if relative {
            self.position[axis] + value
        } else {
            value + self.workspace_offset[axis]
        }
    }

    /// G92: declare that the current position is `declared` (mm) on `axis`.
    pub fn set_workspace_offset(&mut self, axis: Axis, declared: f64) {
        self.workspace_offset[axis] = self.position[axis] - declared;
    }
}

impl Default for PrinterState {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_from_letter_is_case_insensitive() {
        assert_eq!(Axis::from_letter('x'), Some(Axis::X));
        assert_eq!(Axis::from_letter('E'), Some(Axis::E));
        assert_eq!(Axis::from_letter('F'), None);
        for axis in Axis::ALL {
            assert_eq!(Axis::from_letter(axis.letter()), Some(axis));
            assert_eq!(axis.to_string(), axis.letter().to_string());
        }
    }

    #[test]
    fn test_relative_extrusion_ignores_offset() {
        let mut state = PrinterState::new(1200.0);
        assert_eq!(state.feedrate, 20.0);
        state.position.e = 3.0;
        state.workspace_offset.e = 100.0;
        state.relative_extrusion = true;
        assert_eq!(state.resolve_axis(Axis::E, 1.5), 4.5);
        state.relative_extrusion = false;
        assert_eq!(state.resolve_axis(Axis::E, 1.5), 101.5);
    }

    #[test]
    fn test_workspace_offset_round_trip() {
        let mut state = PrinterState::default();
        state.position.x = 10.0;
        state.set_workspace_offset(Axis::X, 0.0);
        assert_eq!(state.resolve_axis(Axis::X, 0.0), 10.0);
        assert_eq!(state.resolve_axis(Axis::X, 5.0), 15.0);
    }
}
