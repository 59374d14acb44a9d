use serde::{Deserialize, Serialize};

use super::{Coord, cell::CellKind};

/// Row-major matrix of cell kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    data: Box<[CellKind]>,
    width: u16,
    height: u16,
}

impl Grid {
    pub fn new(width: u16, height: u16, cell: CellKind) -> Self {
        let data = vec![cell; width as usize * height as usize].into_boxed_slice();
        Grid {
            data,
            width,
            height,
        }
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// Number of cells backing the grid. Only differs from `width * height`
    /// for a grid deserialized from a malformed message.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_in_bounds(&self, coord: Coord) -> bool {
        coord.row < self.height && coord.col < self.width
    }

    #[cfg(test)]
    pub fn is_boundary(&self, coord: Coord) -> bool {
        coord.row == 0
            || coord.col == 0
            || coord.row == self.height.saturating_sub(1)
            || coord.col == self.width.saturating_sub(1)
    }

    pub fn is_open(&self, coord: Coord) -> bool {
        self.is_in_bounds(coord) && self[coord] == CellKind::Open
    }

    /// Flattened index of an in-bounds coordinate.
    pub fn ravel_index(&self, coord: Coord) -> usize {
        // Overflow-safe since width and height are u16 (assuming usize is at least 32 bits)
        coord.row as usize * self.width as usize + coord.col as usize
    }

    pub(crate) fn set(&mut self, coord: Coord, cell: CellKind) {
        let idx = self.ravel_index(coord);
        self.data[idx] = cell;
    }

    /// Iterate over all cells in row-major order together with their coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, CellKind)> + '_ {
        let width = self.width;
        self.data.iter().enumerate().map(move |(i, &cell)| {
            let coord = Coord::new((i / width as usize) as u16, (i % width as usize) as u16);
            (coord, cell)
        })
    }
}

impl std::ops::Index<Coord> for Grid {
    type Output = CellKind;

    fn index(&self, index: Coord) -> &Self::Output {
        &self.data[self.ravel_index(index)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_indexing() {
        let mut grid = Grid::new(4, 3, CellKind::Wall);
        grid.set(Coord::new(2, 3), CellKind::Open);
        assert_eq!(grid[Coord::new(2, 3)], CellKind::Open);
        assert_eq!(grid.ravel_index(Coord::new(2, 3)), 11);
        assert!(grid.is_open(Coord::new(2, 3)));
        assert!(!grid.is_open(Coord::new(3, 0)));
    }

    #[test]
    fn test_boundary() {
        let grid = Grid::new(5, 5, CellKind::Wall);
        assert!(grid.is_boundary(Coord::new(0, 2)));
        assert!(grid.is_boundary(Coord::new(4, 4)));
        assert!(!grid.is_boundary(Coord::new(2, 2)));
    }

    #[test]
    fn test_boundary_of_degenerate_grid() {
        let flat = Grid::new(0, 3, CellKind::Wall);
        assert!(flat.is_empty());
        assert!(flat.is_boundary(Coord::new(2, 5)));
        assert!(!flat.is_boundary(Coord::new(1, 5)));
        let empty = Grid::new(0, 0, CellKind::Wall);
        assert!(!empty.is_boundary(Coord::new(2, 2)));
        assert!(!empty.is_in_bounds(Coord::new(0, 0)));
    }

    #[test]
    fn test_cells_are_row_major() {
        let grid = Grid::new(3, 2, CellKind::Wall);
        let coords = grid.cells().map(|(c, _)| c).collect::<Vec<_>>();
        assert_eq!(coords[0], Coord::new(0, 0));
        assert_eq!(coords[3], Coord::new(1, 0));
        assert_eq!(coords.len(), 6);
    }
}
