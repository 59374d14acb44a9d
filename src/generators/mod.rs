use rand::{Rng, SeedableRng, rngs::StdRng};

mod connections;
mod recur_backtrack;

pub use connections::add_connections;
pub use recur_backtrack::{link_corner, recursive_backtrack};

use crate::{
    error::{MazeError, Result},
    maze::Maze,
};

/// Fraction of the maze's cells sampled for extra connections.
pub const DEFAULT_CONNECTION_DENSITY: f64 = 0.07;

/// Get a random number generator, optionally seeded for reproducibility.
pub fn get_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// Generates a maze of the given size.
///
/// Carves a spanning tree with [`recursive_backtrack`], opens the start
/// (top left) and end (bottom right) corners and links them to the tree,
/// then opens extra passages with [`add_connections`] so the maze has loops.
/// The result only depends on the state of `rng`.
///
/// Fails with [`MazeError::InvalidDimension`] if either side is below
/// [`Maze::MIN_DIMENSION`].
pub fn generate_maze<R: Rng + ?Sized>(
    width: u16,
    height: u16,
    density: f64,
    rng: &mut R,
) -> Result<Maze> {
    if width < Maze::MIN_DIMENSION || height < Maze::MIN_DIMENSION {
        return Err(MazeError::InvalidDimension {
            width,
            height,
            min: Maze::MIN_DIMENSION,
        });
    }

    let mut maze = Maze::new(width, height);
    recursive_backtrack(&mut maze, rng);

    let (start, end) = (maze.start(), maze.end());
    let linked = link_corner(&mut maze, start) + link_corner(&mut maze, end);
    let extra = add_connections(&mut maze, density, rng);

    tracing::debug!(width, height, linked, extra, "generated maze");
    Ok(maze)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{CellKind, Coord, get_neighbors};
    use std::collections::{HashSet, VecDeque};

    fn reachable(maze: &Maze) -> HashSet<Coord> {
        let mut seen = HashSet::from([maze.start()]);
        let mut queue = VecDeque::from([maze.start()]);
        while let Some(c) = queue.pop_front() {
            for n in get_neighbors(c, maze.grid()) {
                if maze.is_open(n) && seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen
    }

    fn open_edges(maze: &Maze) -> usize {
        maze.grid()
            .cells()
            .filter(|&(_, k)| k == CellKind::Open)
            .map(|(c, _)| {
                // Count right and down edges only, so each edge is counted once
                [Coord::new(c.row + 1, c.col), Coord::new(c.row, c.col + 1)]
                    .into_iter()
                    .filter(|&n| maze.is_open(n))
                    .count()
            })
            .sum()
    }

    #[test]
    fn test_invalid_dimensions() {
        let mut rng = get_rng(Some(0));
        assert!(matches!(
            generate_maze(2, 10, DEFAULT_CONNECTION_DENSITY, &mut rng),
            Err(MazeError::InvalidDimension { width: 2, .. })
        ));
        assert!(generate_maze(10, 0, DEFAULT_CONNECTION_DENSITY, &mut rng).is_err());
    }

    #[test]
    fn test_start_and_end_are_connected() {
        for dim in [3, 4, 10, 25, 50] {
            for seed in 0..5 {
                let maze =
                    generate_maze(dim, dim, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(seed)))
                        .unwrap();
                assert!(maze.validate().is_ok());
                assert_eq!(maze.start(), Coord::new(0, 0));
                assert_eq!(maze.end(), Coord::new(dim - 1, dim - 1));
                assert!(
                    reachable(&maze).contains(&maze.end()),
                    "end unreachable for dim {} seed {}",
                    dim,
                    seed
                );
            }
        }
    }

    #[test]
    fn test_zero_density_yields_a_tree() {
        for dim in [10, 25] {
            let maze = generate_maze(dim, dim, 0.0, &mut get_rng(Some(11))).unwrap();
            let open_cells = maze
                .grid()
                .cells()
                .filter(|&(_, k)| k == CellKind::Open)
                .count();
            assert_eq!(reachable(&maze).len(), open_cells);
            assert_eq!(open_edges(&maze), open_cells - 1);
        }
    }

    #[test]
    fn test_connections_add_cycles() {
        let maze =
            generate_maze(50, 50, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(5))).unwrap();
        let open_cells = maze
            .grid()
            .cells()
            .filter(|&(_, k)| k == CellKind::Open)
            .count();
        assert!(open_edges(&maze) > open_cells - 1);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate_maze(25, 25, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(42))).unwrap();
        let b = generate_maze(25, 25, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(42))).unwrap();
        let c = generate_maze(25, 25, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(43))).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
