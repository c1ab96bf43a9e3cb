//! Coordinate types for chunk and local positions.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Chunk coordinate (identifies a chunk in the world grid).
///
/// Unbounded in both directions; `(0, 0)` is the spawn chunk.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct ChunkCoord {
    /// X coordinate in chunk space
    pub x: i32,
    /// Y coordinate in chunk space
    pub y: i32,
}

impl ChunkCoord {
    /// The spawn chunk.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance from the origin, saturating at `u32::MAX`.
    #[must_use]
    pub const fn manhattan(self) -> u32 {
        self.x.unsigned_abs().saturating_add(self.y.unsigned_abs())
    }

    /// Returns the coordinate shifted by the given chunk offset.
    /// Saturates at the edges of the `i32` range.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Local coordinate within a chunk (0 to width-1, 0 to height-1).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct LocalCoord {
    /// X coordinate within chunk
    pub x: u16,
    /// Y coordinate within chunk
    pub y: u16,
}

impl LocalCoord {
    /// Creates a new local coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Converts to linear index for array access.
    #[must_use]
    pub const fn to_index(self, size: GridSize) -> usize {
        (self.y as usize) * (size.width as usize) + (self.x as usize)
    }

    /// Creates from linear index.
    #[must_use]
    pub const fn from_index(index: usize, size: GridSize) -> Self {
        let width = size.width as usize;
        Self {
            x: (index % width) as u16,
            y: (index / width) as u16,
        }
    }
}

/// Width and height of every chunk's tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Columns per chunk
    pub width: u16,
    /// Rows per chunk
    pub height: u16,
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(48, 22)
    }
}

impl GridSize {
    /// Creates a new grid size.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Total number of cells.
    #[must_use]
    pub const fn area(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Checks whether a signed position lies inside `[0,W) x [0,H)`.
    #[must_use]
    pub const fn contains(self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    /// Converts a signed position to a local coordinate if it is in bounds.
    #[must_use]
    pub const fn local(self, x: i32, y: i32) -> Option<LocalCoord> {
        if self.contains(x, y) {
            Some(LocalCoord::new(x as u16, y as u16))
        } else {
            None
        }
    }

    /// Clamps a signed position into bounds.
    #[must_use]
    pub fn clamp(self, x: i32, y: i32) -> LocalCoord {
        LocalCoord::new(
            x.clamp(0, i32::from(self.width) - 1) as u16,
            y.clamp(0, i32::from(self.height) - 1) as u16,
        )
    }

    /// Geometric center of the grid.
    #[must_use]
    pub const fn center(self) -> LocalCoord {
        LocalCoord::new(self.width / 2, self.height / 2)
    }
}
