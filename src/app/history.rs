use std::{collections::VecDeque, time::Duration};

use crate::solvers::EngineState;

/// How one engine fared on one maze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneResult {
    /// The engine did not take part in this race
    Skipped,
    Solved { elapsed: Duration, distance: usize },
    Unsolvable,
}

impl LaneResult {
    /// Summarise a finished engine. Anything that did not finish counts as skipped.
    pub fn from_state(state: &EngineState) -> Self {
        match state {
            EngineState::Solved { path, elapsed } => LaneResult::Solved {
                elapsed: *elapsed,
                distance: path.len(),
            },
            EngineState::Unsolvable => LaneResult::Unsolvable,
            _ => LaneResult::Skipped,
        }
    }
}

impl std::fmt::Display for LaneResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneResult::Skipped => write!(f, "-"),
            LaneResult::Solved { elapsed, distance } => {
                write!(f, "{:.0?} / {} cells", elapsed, distance)
            }
            LaneResult::Unsolvable => write!(f, "no solution"),
        }
    }
}

/// One completed race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// 1-based count of completed races since the session started
    pub cycle: u64,
    pub dimension: u16,
    pub classical: LaneResult,
    pub wave: LaneResult,
}

pub struct CycleHistory {
    /// Completed races, with the most recent at the front.
    reports: VecDeque<CycleReport>,
    /// Browsing position. 0 is the most recent report.
    index: usize,
    /// Maximum number of reports kept. If 0, no history is kept.
    max_reports: usize,
}

impl CycleHistory {
    pub fn new(max_reports: usize) -> Self {
        CycleHistory {
            reports: VecDeque::with_capacity(max_reports),
            index: 0,
            max_reports,
        }
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Step towards newer reports.
    pub fn forward(&mut self) -> Option<&CycleReport> {
        match self.index {
            0 => None,
            _ => {
                self.index -= 1;
                self.reports.get(self.index)
            }
        }
    }

    /// Step towards older reports.
    pub fn backward(&mut self) -> Option<&CycleReport> {
        if self.index + 1 >= self.reports.len() {
            None
        } else {
            self.index += 1;
            self.reports.get(self.index)
        }
    }

    pub fn push(&mut self, report: CycleReport) {
        if self.max_reports == 0 {
            return;
        }
        self.reports.truncate(self.max_reports - 1);
        self.reports.push_front(report);
        self.index = 0;
    }

    pub fn current(&self) -> Option<&CycleReport> {
        self.reports.get(self.index)
    }

    /// Position of the browsed report counted from the newest, 1-based.
    pub fn position(&self) -> usize {
        self.index + 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &CycleReport> {
        self.reports.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::Coord;

    fn report(cycle: u64) -> CycleReport {
        CycleReport {
            cycle,
            dimension: 10,
            classical: LaneResult::Solved {
                elapsed: Duration::from_millis(cycle * 10),
                distance: 19,
            },
            wave: LaneResult::Skipped,
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = CycleHistory::new(3);
        for cycle in 1..=5 {
            history.push(report(cycle));
        }
        assert_eq!(history.len(), 3);
        let cycles = history.iter().map(|r| r.cycle).collect::<Vec<_>>();
        assert_eq!(cycles, vec![5, 4, 3]);
    }

    #[test]
    fn test_browsing() {
        let mut history = CycleHistory::new(10);
        assert!(history.current().is_none());
        for cycle in 1..=3 {
            history.push(report(cycle));
        }
        assert_eq!(history.current().map(|r| r.cycle), Some(3));
        assert!(history.forward().is_none());
        assert_eq!(history.backward().map(|r| r.cycle), Some(2));
        assert_eq!(history.backward().map(|r| r.cycle), Some(1));
        assert!(history.backward().is_none());
        assert_eq!(history.position(), 3);
        assert_eq!(history.forward().map(|r| r.cycle), Some(2));

        // A new report jumps back to the newest
        history.push(report(4));
        assert_eq!(history.current().map(|r| r.cycle), Some(4));
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut history = CycleHistory::new(0);
        history.push(report(1));
        assert!(history.is_empty());
    }

    #[test]
    fn test_lane_result_from_state() {
        let solved = EngineState::Solved {
            path: vec![Coord::new(0, 0), Coord::new(0, 1), Coord::new(1, 1), Coord::new(2, 1)],
            elapsed: Duration::from_millis(12),
        };
        assert_eq!(
            LaneResult::from_state(&solved),
            LaneResult::Solved {
                elapsed: Duration::from_millis(12),
                distance: 4
            }
        );
        assert_eq!(
            LaneResult::from_state(&EngineState::Unsolvable),
            LaneResult::Unsolvable
        );
        assert_eq!(
            LaneResult::from_state(&EngineState::Idle),
            LaneResult::Skipped
        );
    }
}
