use crate::maze::{CellKind, Coord, Grid, Maze};
use rand::{Rng, seq::SliceRandom};

/// Step-2 moves between lattice cells, leaving a wall cell in between.
const LATTICE_STEPS: [(i32, i32); 4] = [(0, 2), (2, 0), (0, -2), (-2, 0)];

/// One lattice cell being carved, with the directions it still has to try.
struct Frame {
    cell: Coord,
    directions: [(i32, i32); 4],
    next: usize,
}

impl Frame {
    fn new<R: Rng + ?Sized>(cell: Coord, rng: &mut R) -> Self {
        let mut directions = LATTICE_STEPS;
        directions.shuffle(rng);
        Frame {
            cell,
            directions,
            next: 0,
        }
    }
}

fn offset(coord: Coord, dr: i32, dc: i32, grid: &Grid) -> Option<Coord> {
    let row = coord.row as i32 + dr;
    let col = coord.col as i32 + dc;
    if row < 0 || col < 0 {
        return None;
    }
    let target = Coord::new(row as u16, col as u16);
    grid.is_in_bounds(target).then_some(target)
}

/// Carves a spanning tree over the odd/odd lattice of an all-wall maze,
/// starting from (1, 1).
///
/// Each lattice cell shuffles its four directions once, when it is first
/// entered, and tries them in that order. The explicit stack visits cells in
/// exactly the order the recursive formulation would, without its call depth.
pub fn recursive_backtrack<R: Rng + ?Sized>(maze: &mut Maze, rng: &mut R) {
    let origin = Coord::new(1, 1);
    if !maze.grid().is_in_bounds(origin) {
        return;
    }

    maze.grid_mut().set(origin, CellKind::Open);
    let mut stack = vec![Frame::new(origin, rng)];

    loop {
        let Some(frame) = stack.last_mut() else {
            break;
        };
        if frame.next == frame.directions.len() {
            // All directions tried, backtrack
            stack.pop();
            continue;
        }
        let (dr, dc) = frame.directions[frame.next];
        frame.next += 1;
        let cell = frame.cell;

        let grid = maze.grid_mut();
        let Some(target) = offset(cell, dr, dc, grid) else {
            continue;
        };
        if grid[target] != CellKind::Wall {
            continue;
        }
        // The wall cell halfway is in bounds whenever the target is
        if let Some(wall) = offset(cell, dr / 2, dc / 2, grid) {
            grid.set(wall, CellKind::Open);
        }
        grid.set(target, CellKind::Open);
        stack.push(Frame::new(target, rng));
    }
}

fn open_wall(grid: &mut Grid, coord: Coord) -> usize {
    if grid[coord] == CellKind::Wall {
        grid.set(coord, CellKind::Open);
        1
    } else {
        0
    }
}

/// Nearest odd index to `index`. Odd indices are lattice rows/columns.
fn lattice_anchor(index: u16) -> u16 {
    match index {
        i if i % 2 == 1 => i,
        0 => 1,
        i => i - 1,
    }
}

/// Opens `corner` and, when it is not itself a lattice cell, the short walk
/// linking it to the nearest lattice cell (row first, then column).
/// Returns the number of wall cells opened.
pub fn link_corner(maze: &mut Maze, corner: Coord) -> usize {
    let anchor = Coord::new(lattice_anchor(corner.row), lattice_anchor(corner.col));
    let grid = maze.grid_mut();
    if !grid.is_in_bounds(anchor) {
        return 0;
    }

    let mut cursor = corner;
    let mut opened = open_wall(grid, cursor);
    while cursor.row != anchor.row {
        cursor.row = if cursor.row < anchor.row {
            cursor.row + 1
        } else {
            cursor.row - 1
        };
        opened += open_wall(grid, cursor);
    }
    while cursor.col != anchor.col {
        cursor.col = if cursor.col < anchor.col {
            cursor.col + 1
        } else {
            cursor.col - 1
        };
        opened += open_wall(grid, cursor);
    }
    opened
}
