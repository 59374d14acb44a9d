use std::collections::HashSet;

use crate::maze::{CellClass, CellKind, Coord, Maze};

/// Per-cell drawing classes for one engine's view of the maze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u16,
    height: u16,
    cells: Box<[CellClass]>,
}

/// Engine state layered over the maze, each layer optional.
#[derive(Default)]
pub struct Layers<'a> {
    /// Finished path and the class it is drawn with
    pub solution: Option<(&'a [Coord], CellClass)>,
    pub classical_path: &'a [Coord],
    pub dead_ends: Option<&'a HashSet<Coord>>,
    pub wave: Option<&'a HashSet<Coord>>,
}

impl Snapshot {
    /// Classify every cell of `maze`. When a cell belongs to several layers
    /// the first matching class in [`CellClass`] order wins.
    pub fn project(maze: &Maze, layers: &Layers<'_>) -> Self {
        let solution = layers
            .solution
            .map(|(path, _)| path.iter().copied().collect::<HashSet<_>>())
            .unwrap_or_default();
        let solution_class = layers
            .solution
            .map(|(_, class)| class)
            .unwrap_or(CellClass::ClassicalSolution);
        let current = layers
            .classical_path
            .iter()
            .copied()
            .collect::<HashSet<_>>();

        let cells = maze
            .grid()
            .cells()
            .map(|(coord, kind)| {
                if kind == CellKind::Wall {
                    CellClass::Wall
                } else if solution.contains(&coord) {
                    solution_class
                } else if coord == maze.start() {
                    CellClass::Start
                } else if coord == maze.end() {
                    CellClass::End
                } else if current.contains(&coord) {
                    CellClass::ClassicalPath
                } else if layers.dead_ends.is_some_and(|d| d.contains(&coord)) {
                    CellClass::ClassicalDeadEnd
                } else if layers.wave.is_some_and(|w| w.contains(&coord)) {
                    CellClass::QuantumWave
                } else {
                    CellClass::Open
                }
            })
            .collect();

        Snapshot {
            width: maze.width(),
            height: maze.height(),
            cells,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, coord: Coord) -> Option<CellClass> {
        if coord.row >= self.height || coord.col >= self.width {
            return None;
        }
        let index = coord.row as usize * self.width as usize + coord.col as usize;
        self.cells.get(index).copied()
    }

    /// Every cell with its class, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, CellClass)> + '_ {
        let width = self.width.max(1);
        self.cells.iter().enumerate().map(move |(i, class)| {
            let row = (i / width as usize) as u16;
            let col = (i % width as usize) as u16;
            (Coord::new(row, col), *class)
        })
    }

    /// Cells whose class differs from `previous`. Everything when the
    /// dimensions differ.
    pub fn changes_since<'a>(
        &'a self,
        previous: Option<&'a Snapshot>,
    ) -> impl Iterator<Item = (Coord, CellClass)> + 'a {
        let previous = previous.filter(|p| p.width == self.width && p.height == self.height);
        self.iter()
            .filter(move |(coord, class)| previous.and_then(|p| p.get(*coord)) != Some(*class))
    }

    pub fn count(&self, class: CellClass) -> usize {
        self.cells.iter().filter(|c| **c == class).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{DEFAULT_CONNECTION_DENSITY, generate_maze, get_rng};

    fn maze() -> Maze {
        generate_maze(10, 10, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(5))).unwrap()
    }

    #[test]
    fn test_bare_maze_projection() {
        let maze = maze();
        let snapshot = Snapshot::project(&maze, &Layers::default());
        for (coord, class) in snapshot.iter() {
            let expected = if !maze.is_open(coord) {
                CellClass::Wall
            } else if coord == maze.start() {
                CellClass::Start
            } else if coord == maze.end() {
                CellClass::End
            } else {
                CellClass::Open
            };
            assert_eq!(class, expected, "at {}", coord);
        }
    }

    #[test]
    fn test_priority_order() {
        let maze = maze();
        let start = maze.start();
        let open = maze
            .grid()
            .cells()
            .filter(|&(c, k)| k == CellKind::Open && c != maze.start() && c != maze.end())
            .map(|(c, _)| c)
            .take(3)
            .collect::<Vec<_>>();
        let (a, b, c) = (open[0], open[1], open[2]);

        let wave = HashSet::from([a, b, c]);
        let dead_ends = HashSet::from([a, b]);
        let path = [start, a];
        let solution = [start];
        let snapshot = Snapshot::project(
            &maze,
            &Layers {
                solution: Some((&solution, CellClass::ClassicalSolution)),
                classical_path: &path,
                dead_ends: Some(&dead_ends),
                wave: Some(&wave),
            },
        );
        // Solution beats start, path beats dead end, dead end beats wave
        assert_eq!(snapshot.get(start), Some(CellClass::ClassicalSolution));
        assert_eq!(snapshot.get(a), Some(CellClass::ClassicalPath));
        assert_eq!(snapshot.get(b), Some(CellClass::ClassicalDeadEnd));
        assert_eq!(snapshot.get(c), Some(CellClass::QuantumWave));
        assert_eq!(snapshot.get(maze.end()), Some(CellClass::End));
        assert_eq!(snapshot.get(Coord::new(10, 0)), None);
    }

    #[test]
    fn test_changes_since() {
        let maze = maze();
        let bare = Snapshot::project(&maze, &Layers::default());
        assert_eq!(bare.changes_since(None).count(), maze.cell_count());
        assert_eq!(bare.changes_since(Some(&bare)).count(), 0);

        let wave = maze
            .grid()
            .cells()
            .filter(|&(_, k)| k == CellKind::Open)
            .map(|(c, _)| c)
            .collect::<HashSet<_>>();
        let flooded = Snapshot::project(
            &maze,
            &Layers {
                wave: Some(&wave),
                ..Default::default()
            },
        );
        // Everything open except the two endpoints turns into wave
        assert_eq!(
            flooded.changes_since(Some(&bare)).count(),
            flooded.count(CellClass::QuantumWave)
        );
        assert_eq!(flooded.count(CellClass::QuantumWave), wave.len() - 2);
    }
}
