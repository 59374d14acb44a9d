use std::collections::HashSet;

use rand::{Rng, seq::SliceRandom};

use super::StepOutcome;
use crate::maze::{Coord, Maze, Path, get_neighbors};

/// Depth-first search with explicit backtracking, advanced one step at a time.
///
/// Every stack entry is the full path from the start to the cell at that
/// depth, so the path currently being explored can be shown as-is.
pub struct ClassicalSolver {
    stack: Vec<Path>,
    /// Cells already pushed onto the stack, indexed by the grid's ravel index
    visited: Vec<bool>,
    dead_ends: HashSet<Coord>,
    steps: usize,
}

impl ClassicalSolver {
    pub fn new(maze: &Maze) -> Self {
        let mut visited = vec![false; maze.cell_count()];
        visited[maze.grid().ravel_index(maze.start())] = true;
        ClassicalSolver {
            stack: vec![vec![maze.start()]],
            visited,
            dead_ends: HashSet::new(),
            steps: 0,
        }
    }

    /// Path from the start to the cell currently being explored.
    /// Empty once the search has been exhausted.
    pub fn current_path(&self) -> &[Coord] {
        self.stack.last().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dead_ends(&self) -> &HashSet<Coord> {
        &self.dead_ends
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Consume the search, keeping only what it proved unproductive.
    pub fn into_dead_ends(self) -> HashSet<Coord> {
        self.dead_ends
    }

    /// Advance the search by one step.
    ///
    /// Looks at the path on top of the stack: if it ends at the maze's end the
    /// search is solved. Otherwise the open, unvisited neighbours of its last
    /// cell are shuffled and the first one is pushed as an extended path. With
    /// no such neighbour, the whole path is marked as a dead end and popped.
    pub fn step<R: Rng + ?Sized>(&mut self, maze: &Maze, rng: &mut R) -> StepOutcome {
        let Some(&current) = self.stack.last().and_then(|path| path.last()) else {
            return StepOutcome::Unsolvable;
        };
        self.steps += 1;

        if current == maze.end() {
            return StepOutcome::Solved(self.current_path().to_vec());
        }

        let grid = maze.grid();
        let mut candidates = get_neighbors(current, grid)
            .filter(|&c| maze.is_open(c) && !self.visited[grid.ravel_index(c)])
            .collect::<Vec<_>>();
        candidates.shuffle(rng);

        match candidates.first() {
            Some(&next) => {
                self.visited[grid.ravel_index(next)] = true;
                let mut path = self.current_path().to_vec();
                path.push(next);
                self.stack.push(path);
            }
            None => {
                if let Some(path) = self.stack.pop() {
                    self.dead_ends.extend(path);
                }
                if self.stack.is_empty() {
                    tracing::debug!(steps = self.steps, "classical search exhausted");
                    return StepOutcome::Unsolvable;
                }
            }
        }
        StepOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        generators::{DEFAULT_CONNECTION_DENSITY, generate_maze, get_rng},
        maze::{CellKind, is_valid_path},
    };

    fn run_to_end(solver: &mut ClassicalSolver, maze: &Maze, seed: u64) -> StepOutcome {
        let mut rng = get_rng(Some(seed));
        loop {
            match solver.step(maze, &mut rng) {
                StepOutcome::Continue => continue,
                outcome => return outcome,
            }
        }
    }

    #[test]
    fn test_solves_generated_mazes() {
        for seed in 0..10 {
            let maze =
                generate_maze(25, 25, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(seed)))
                    .unwrap();
            let mut solver = ClassicalSolver::new(&maze);
            match run_to_end(&mut solver, &maze, seed) {
                StepOutcome::Solved(path) => {
                    assert!(is_valid_path(&maze, &path));
                    assert_eq!(path.last(), Some(&maze.end()));
                }
                other => panic!("expected a solution, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_dead_ends_are_never_revisited() {
        let maze = generate_maze(25, 25, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(8)))
            .unwrap();
        let mut solver = ClassicalSolver::new(&maze);
        let mut rng = get_rng(Some(8));
        loop {
            let dead_before = solver.dead_ends().clone();
            let depth_before = solver.current_path().len();
            let outcome = solver.step(&maze, &mut rng);
            if solver.current_path().len() > depth_before {
                let pushed = solver.current_path().last().unwrap();
                assert!(!dead_before.contains(pushed));
            }
            // Dead ends only grow
            assert!(dead_before.is_subset(solver.dead_ends()));
            if !matches!(outcome, StepOutcome::Continue) {
                break;
            }
        }
    }

    #[test]
    fn test_unsolvable_maze_terminates() {
        // Start and end are open but separated by a wall column
        let mut maze = Maze::new(3, 3);
        for c in [
            Coord::new(0, 0),
            Coord::new(1, 0),
            Coord::new(2, 0),
            Coord::new(2, 2),
        ] {
            maze.grid_mut().set(c, CellKind::Open);
        }
        let mut solver = ClassicalSolver::new(&maze);
        assert_eq!(run_to_end(&mut solver, &maze, 0), StepOutcome::Unsolvable);
        assert!(solver.current_path().is_empty());
        assert!(solver.dead_ends().contains(&Coord::new(2, 0)));
        // Stepping an exhausted search is harmless
        assert_eq!(
            solver.step(&maze, &mut get_rng(Some(0))),
            StepOutcome::Unsolvable
        );
    }
}
