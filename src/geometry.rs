use serde::{Deserialize, Serialize};

/// Pointer position in device-independent units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component of the position along `axis`.
    pub fn along(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// Axis a drag is measured along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    X,
    Y,
}

/// Horizontal reading direction of the table.
///
/// Under `Rtl` the resize handle sits on the left edge of a column, so moving
/// the pointer left grows the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeDirection {
    #[default]
    Ltr,
    Rtl,
}

impl ResizeDirection {
    pub fn apply(&self, raw_delta: f64) -> f64 {
        match self {
            ResizeDirection::Ltr => raw_delta,
            ResizeDirection::Rtl => -raw_delta,
        }
    }
}
