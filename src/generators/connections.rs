use rand::Rng;

use crate::maze::{CellKind, Coord, Maze, get_neighbors};

/// Opens extra passages so the maze stops being a tree.
///
/// Samples `floor(width * height * density)` interior cells (with
/// replacement) and opens each sampled wall that already touches at least two
/// open cells, creating loops and crossroads. Returns the number of walls
/// opened.
pub fn add_connections<R: Rng + ?Sized>(maze: &mut Maze, density: f64, rng: &mut R) -> usize {
    let (width, height) = (maze.width(), maze.height());
    if width < 3 || height < 3 {
        return 0;
    }

    let density = if density.is_finite() {
        density.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let samples = (maze.cell_count() as f64 * density).floor() as usize;

    let mut opened = 0;
    for _ in 0..samples {
        let coord = Coord::new(rng.random_range(1..height - 1), rng.random_range(1..width - 1));
        let grid = maze.grid_mut();
        if grid[coord] != CellKind::Wall {
            continue;
        }
        let open_neighbors = get_neighbors(coord, grid)
            .filter(|&n| grid[n] == CellKind::Open)
            .count();
        if open_neighbors >= 2 {
            grid.set(coord, CellKind::Open);
            opened += 1;
        }
    }
    tracing::debug!(samples, opened, "added extra maze connections");
    opened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::recur_backtrack::recursive_backtrack;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_zero_density_changes_nothing() {
        let mut maze = Maze::new(15, 15);
        recursive_backtrack(&mut maze, &mut StdRng::seed_from_u64(9));
        let before = maze.clone();
        assert_eq!(add_connections(&mut maze, 0.0, &mut StdRng::seed_from_u64(9)), 0);
        assert_eq!(maze, before);
    }

    #[test]
    fn test_only_walls_between_open_cells_are_opened() {
        let mut maze = Maze::new(25, 25);
        recursive_backtrack(&mut maze, &mut StdRng::seed_from_u64(4));
        let before = maze.clone();
        add_connections(&mut maze, 0.5, &mut StdRng::seed_from_u64(4));
        for (coord, kind) in maze.grid().cells() {
            if before[coord] == CellKind::Wall && kind == CellKind::Open {
                assert!(!maze.grid().is_boundary(coord));
                // Openings only ever add open cells, so the condition still holds
                let open_now = get_neighbors(coord, maze.grid())
                    .filter(|&n| maze[n] == CellKind::Open)
                    .count();
                assert!(open_now >= 2);
            }
        }
    }
}
