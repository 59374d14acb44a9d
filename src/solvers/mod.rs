use std::time::Duration;

use rand::Rng;

pub mod classical;
pub mod wave;

pub use classical::ClassicalSolver;
pub use wave::{WaveBatch, WaveSolver, WaveStep};

use crate::{
    error::{MazeError, Result},
    maze::{Coord, Maze, Path},
};

/// What a single search step concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// More work remains
    Continue,
    /// The end cell was reached along this path
    Solved(Path),
    /// The frontier is empty and the end was never reached
    Unsolvable,
}

/// Lifecycle of one engine run.
///
/// `Idle -> Running -> {Solved | Unsolvable}`, and `Running -> Stopped` on
/// cancellation. Terminal states are never resumed; a new run starts over
/// from `Idle`.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum EngineState {
    #[default]
    Idle,
    Running,
    Solved {
        path: Path,
        elapsed: Duration,
    },
    Unsolvable,
    Stopped,
}

impl EngineState {
    pub fn is_running(&self) -> bool {
        matches!(self, EngineState::Running)
    }

    /// Whether this run is over, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineState::Solved { .. } | EngineState::Unsolvable | EngineState::Stopped
        )
    }

    pub fn solution(&self) -> Option<&[Coord]> {
        match self {
            EngineState::Solved { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            EngineState::Solved { elapsed, .. } => Some(*elapsed),
            _ => None,
        }
    }
}

/// The two racing search strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Solver {
    Classical,
    Wave,
}

impl std::fmt::Display for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Solver::Classical => write!(f, "Classical (backtracking DFS)"),
            Solver::Wave => write!(f, "Quantum (wave-front BFS)"),
        }
    }
}

/// Run the backtracking search to completion without any pacing.
pub fn solve_classical<R: Rng + ?Sized>(maze: &Maze, rng: &mut R) -> Result<Path> {
    let mut solver = ClassicalSolver::new(maze);
    loop {
        match solver.step(maze, rng) {
            StepOutcome::Continue => {}
            StepOutcome::Solved(path) => return Ok(path),
            StepOutcome::Unsolvable => return Err(MazeError::Unsolvable),
        }
    }
}

/// Run the wave-front search to completion without any pacing.
pub fn solve_wave(maze: &Maze, batch: WaveBatch) -> Result<Path> {
    let mut solver = WaveSolver::new(maze, batch);
    loop {
        match solver.step(maze).outcome {
            StepOutcome::Continue => {}
            StepOutcome::Solved(path) => return Ok(path),
            StepOutcome::Unsolvable => return Err(MazeError::Unsolvable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{DEFAULT_CONNECTION_DENSITY, generate_maze, get_rng};

    #[test]
    fn test_wave_never_longer_than_classical() {
        for seed in 0..10 {
            let maze =
                generate_maze(10, 10, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(seed)))
                    .unwrap();
            let classical = solve_classical(&maze, &mut get_rng(Some(seed))).unwrap();
            let wave = solve_wave(&maze, WaveBatch::default()).unwrap();
            assert_eq!(classical.first(), Some(&Coord::new(0, 0)));
            assert_eq!(classical.last(), Some(&Coord::new(9, 9)));
            assert!(wave.len() <= classical.len());
        }
    }

    #[test]
    fn test_engine_state_queries() {
        let solved = EngineState::Solved {
            path: vec![Coord::new(0, 0)],
            elapsed: Duration::from_millis(5),
        };
        assert!(solved.is_terminal());
        assert_eq!(solved.elapsed(), Some(Duration::from_millis(5)));
        assert_eq!(solved.solution().map(<[Coord]>::len), Some(1));
        assert!(!EngineState::Idle.is_terminal());
        assert!(EngineState::Running.is_running());
        assert!(EngineState::Stopped.is_terminal());
        assert_eq!(EngineState::Unsolvable.solution(), None);
    }
}
