pub mod cell;
pub mod grid;

use serde::{Deserialize, Serialize};

pub use cell::{CellClass, CellKind};
pub use grid::Grid;

use crate::error::{MazeError, Result};

/// A (row, col) position in the grid, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: u16,
    pub col: u16,
}

impl Coord {
    pub const fn new(row: u16, col: u16) -> Self {
        Coord { row, col }
    }

    /// Whether the two coordinates are 4-connected neighbours.
    pub fn is_adjacent(&self, other: &Coord) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Ordered route through the maze, starting at the start cell.
pub type Path = Vec<Coord>;

/// A generated maze: the grid plus its start and end cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    grid: Grid,
    start: Coord,
    end: Coord,
}

impl Maze {
    /// Smallest accepted width/height.
    pub const MIN_DIMENSION: u16 = 3;

    /// Creates a maze of the given size with every cell walled in.
    /// Start is the top left corner and end the bottom right one.
    pub fn new(width: u16, height: u16) -> Self {
        Maze {
            grid: Grid::new(width, height, CellKind::Wall),
            start: Coord::new(0, 0),
            end: Coord::new(height.saturating_sub(1), width.saturating_sub(1)),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn end(&self) -> Coord {
        self.end
    }

    pub fn width(&self) -> u16 {
        self.grid.width()
    }

    pub fn height(&self) -> u16 {
        self.grid.height()
    }

    /// Side length of the maze. Mazes are generated square, so this is the width.
    pub fn dimension(&self) -> u16 {
        self.grid.width()
    }

    /// Number of cells in the maze.
    pub fn cell_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn is_open(&self, coord: Coord) -> bool {
        self.grid.is_open(coord)
    }

    /// Checks the structural invariants of a maze received from outside the crate:
    /// dimensions, backing storage size, and open, distinct start and end cells.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = (self.width(), self.height());
        if width < Maze::MIN_DIMENSION || height < Maze::MIN_DIMENSION {
            return Err(MazeError::InvalidDimension {
                width,
                height,
                min: Maze::MIN_DIMENSION,
            });
        }
        if self.grid.len() != self.cell_count() {
            return Err(MazeError::InvalidDimension {
                width,
                height,
                min: Maze::MIN_DIMENSION,
            });
        }
        if self.start == self.end || !self.is_open(self.start) || !self.is_open(self.end) {
            return Err(MazeError::Unsolvable);
        }
        Ok(())
    }
}

impl std::ops::Index<Coord> for Maze {
    type Output = CellKind;

    fn index(&self, index: Coord) -> &Self::Output {
        &self.grid[index]
    }
}

/// Get neighbors of a cell, in the fixed order up, down, left, right.
/// A neighbor is considered a cell that is one step away in the cardinal directions.
pub fn get_neighbors(coord: Coord, grid: &Grid) -> impl Iterator<Item = Coord> + '_ {
    let Coord { row, col } = coord;
    // NOTE: This way of handling underflow/overflow is overflow-safe.
    // When row or col is 0, wrap the decrement to u16::MAX and filter it out
    // in the bounds check. Saturating the increment at u16::MAX is filtered the
    // same way, as the largest valid index is u16::MAX - 1.
    [
        Coord::new(row.wrapping_sub(1), col),
        Coord::new(row.saturating_add(1), col),
        Coord::new(row, col.wrapping_sub(1)),
        Coord::new(row, col.saturating_add(1)),
    ]
    .into_iter()
    .filter(move |&c| grid.is_in_bounds(coord) && grid.is_in_bounds(c))
}

/// Checks that `path` is a valid route through `maze`: it starts at the start
/// cell, only crosses open cells, moves one 4-connected step at a time and
/// never repeats a cell.
pub fn is_valid_path(maze: &Maze, path: &[Coord]) -> bool {
    if path.first() != Some(&maze.start()) {
        return false;
    }
    let mut seen = std::collections::HashSet::with_capacity(path.len());
    path.iter().all(|&c| maze.is_open(c) && seen.insert(c))
        && path.windows(2).all(|w| w[0].is_adjacent(&w[1]))
}
