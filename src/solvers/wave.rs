use std::collections::VecDeque;

use super::StepOutcome;
use crate::maze::{Coord, Maze, Path, get_neighbors};

/// How many queued paths the wave-front search expands per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveBatch {
    /// Up to this many paths (at least one).
    Paths(usize),
    /// Every path queued when the step begins, i.e. one whole BFS level.
    Level,
}

impl Default for WaveBatch {
    fn default() -> Self {
        WaveBatch::Paths(8)
    }
}

/// Result of one wave-front step.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveStep {
    /// Cells reached for the first time during this step, in discovery order
    pub new_cells: Vec<Coord>,
    pub outcome: StepOutcome,
}

/// Breadth-first search over a FIFO queue of paths.
///
/// Every reachable cell is enqueued exactly once, so the first path to reach
/// the end has the minimum number of steps.
pub struct WaveSolver {
    queue: VecDeque<Path>,
    visited: Vec<bool>,
    visited_count: usize,
    batch: WaveBatch,
    steps: usize,
}

impl WaveSolver {
    pub fn new(maze: &Maze, batch: WaveBatch) -> Self {
        let mut visited = vec![false; maze.cell_count()];
        visited[maze.grid().ravel_index(maze.start())] = true;
        WaveSolver {
            queue: VecDeque::from([vec![maze.start()]]),
            visited,
            visited_count: 1,
            batch,
            steps: 0,
        }
    }

    /// Number of cells visited so far, start included.
    pub fn visited_count(&self) -> usize {
        self.visited_count
    }

    /// Number of paths waiting to be expanded.
    pub fn frontier_len(&self) -> usize {
        self.queue.len()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn budget(&self) -> usize {
        match self.batch {
            WaveBatch::Paths(k) => k.max(1).min(self.queue.len()),
            WaveBatch::Level => self.queue.len(),
        }
    }

    /// Expand one batch of queued paths.
    ///
    /// A dequeued path ending at the maze's end solves the search immediately,
    /// even mid-batch. Otherwise each open, unvisited neighbour of the path's
    /// last cell is marked visited, reported in `new_cells` and enqueued as an
    /// extended path.
    pub fn step(&mut self, maze: &Maze) -> WaveStep {
        let mut new_cells = Vec::new();
        if self.queue.is_empty() {
            return WaveStep {
                new_cells,
                outcome: StepOutcome::Unsolvable,
            };
        }
        self.steps += 1;

        let grid = maze.grid();
        for _ in 0..self.budget() {
            let Some(path) = self.queue.pop_front() else {
                break;
            };
            let Some(&current) = path.last() else {
                continue;
            };
            if current == maze.end() {
                return WaveStep {
                    new_cells,
                    outcome: StepOutcome::Solved(path),
                };
            }
            for neighbor in get_neighbors(current, grid) {
                let idx = grid.ravel_index(neighbor);
                if !maze.is_open(neighbor) || self.visited[idx] {
                    continue;
                }
                self.visited[idx] = true;
                self.visited_count += 1;
                new_cells.push(neighbor);
                let mut next = path.clone();
                next.push(neighbor);
                self.queue.push_back(next);
            }
        }

        let outcome = if self.queue.is_empty() {
            tracing::debug!(steps = self.steps, "wave-front search exhausted");
            StepOutcome::Unsolvable
        } else {
            StepOutcome::Continue
        };
        WaveStep { new_cells, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        generators::{DEFAULT_CONNECTION_DENSITY, generate_maze, get_rng},
        maze::{CellKind, is_valid_path},
    };
    use std::collections::{HashMap, HashSet};

    /// Exhaustive BFS distances (in cells, start counted) from the start.
    fn distances(maze: &Maze) -> HashMap<Coord, usize> {
        let mut dist = HashMap::from([(maze.start(), 1)]);
        let mut queue = VecDeque::from([maze.start()]);
        while let Some(c) = queue.pop_front() {
            let d = dist[&c];
            for n in get_neighbors(c, maze.grid()) {
                if maze.is_open(n) && !dist.contains_key(&n) {
                    dist.insert(n, d + 1);
                    queue.push_back(n);
                }
            }
        }
        dist
    }

    #[test]
    fn test_finds_shortest_path() {
        for batch in [WaveBatch::Paths(1), WaveBatch::Paths(8), WaveBatch::Level] {
            for seed in 0..5 {
                let maze =
                    generate_maze(25, 25, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(seed)))
                        .unwrap();
                let mut solver = WaveSolver::new(&maze, batch);
                let path = loop {
                    match solver.step(&maze).outcome {
                        StepOutcome::Continue => continue,
                        StepOutcome::Solved(path) => break path,
                        StepOutcome::Unsolvable => panic!("generated maze must be solvable"),
                    }
                };
                assert!(is_valid_path(&maze, &path));
                assert_eq!(path.len(), distances(&maze)[&maze.end()]);
            }
        }
    }

    #[test]
    fn test_cells_are_visited_once() {
        let maze = generate_maze(50, 50, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(2)))
            .unwrap();
        let mut solver = WaveSolver::new(&maze, WaveBatch::default());
        let mut wave = HashSet::new();
        loop {
            let step = solver.step(&maze);
            for cell in step.new_cells {
                assert!(wave.insert(cell), "{} reported twice", cell);
            }
            assert!(solver.visited_count() <= maze.cell_count());
            assert_eq!(solver.visited_count(), wave.len() + 1);
            if step.outcome != StepOutcome::Continue {
                break;
            }
        }
    }

    #[test]
    fn test_batch_limits_expansion() {
        let maze = generate_maze(25, 25, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(6)))
            .unwrap();
        let mut solver = WaveSolver::new(&maze, WaveBatch::Paths(2));
        solver.step(&maze);
        // Start has at most two open neighbours in the corner
        assert!(solver.frontier_len() <= 2);
        let before = solver.frontier_len();
        let step = solver.step(&maze);
        // Each expanded path adds at most three new paths
        assert!(step.new_cells.len() <= 3 * before.min(2));
    }

    #[test]
    fn test_unsolvable_maze_terminates() {
        let mut maze = Maze::new(3, 3);
        for c in [Coord::new(0, 0), Coord::new(0, 1), Coord::new(2, 2)] {
            maze.grid_mut().set(c, CellKind::Open);
        }
        let mut solver = WaveSolver::new(&maze, WaveBatch::Level);
        let first = solver.step(&maze);
        assert_eq!(first.new_cells, vec![Coord::new(0, 1)]);
        assert_eq!(first.outcome, StepOutcome::Continue);
        assert_eq!(solver.step(&maze).outcome, StepOutcome::Unsolvable);
        assert_eq!(solver.step(&maze).outcome, StepOutcome::Unsolvable);
    }
}
