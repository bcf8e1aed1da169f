use serde::{Deserialize, Serialize};

use crate::errors::{GridZoomError, GridZoomResult};

/// Rectangle in capture-image pixel space.
///
/// Always a sub-rectangle of the full capture with a non-zero size. The
/// controller never edits a region; it rebinds `current_region` to a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> GridZoomResult<Self> {
        if width == 0 || height == 0 {
            return Err(GridZoomError::Perception(format!(
                "region must have a positive size (got {width}x{height})"
            )));
        }
        Ok(Self { x, y, width, height })
    }

    /// Region covering a whole `width × height` frame.
    pub fn full(width: u32, height: u32) -> GridZoomResult<Self> {
        Self::new(0, 0, width, height)
    }

    pub fn offset(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Integer pixel center.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        px >= self.x as f64
            && py >= self.y as f64
            && px < self.right() as f64
            && py < self.bottom() as f64
    }

    pub fn contains_region(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// 1-indexed, row-major cell number in a `grid_size × grid_size` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridAddress {
    cell: u32,
    grid_size: u32,
}

impl GridAddress {
    /// Returns `None` when `cell` is outside `[1, grid_size²]`.
    pub fn new(cell: u32, grid_size: u32) -> Option<Self> {
        let max = grid_size.checked_mul(grid_size)?;
        if grid_size == 0 || cell == 0 || cell > max {
            return None;
        }
        Some(Self { cell, grid_size })
    }

    pub fn cell(&self) -> u32 {
        self.cell
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// 0-indexed row.
    pub fn row(&self) -> u32 {
        (self.cell - 1) / self.grid_size
    }

    /// 0-indexed column.
    pub fn col(&self) -> u32 {
        (self.cell - 1) % self.grid_size
    }
}

impl std::fmt::Display for GridAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cell)
    }
}

/// Ratio between the interactive screen resolution and the captured image resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactor {
    pub sx: f64,
    pub sy: f64,
}

impl ScaleFactor {
    pub const IDENTITY: ScaleFactor = ScaleFactor { sx: 1.0, sy: 1.0 };

    /// `display / capture` on each axis.
    pub fn between(display: (u32, u32), capture: (u32, u32)) -> GridZoomResult<Self> {
        if display.0 == 0 || display.1 == 0 || capture.0 == 0 || capture.1 == 0 {
            return Err(GridZoomError::Perception(format!(
                "cannot derive scale from display {}x{} and capture {}x{}",
                display.0, display.1, capture.0, capture.1
            )));
        }
        Ok(Self {
            sx: display.0 as f64 / capture.0 as f64,
            sy: display.1 as f64 / capture.1 as f64,
        })
    }
}

/// Absolute point in interactive-screen coordinates (already scale-corrected).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    /// Integer coordinates for the input driver (truncating, like a pixel index).
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}
