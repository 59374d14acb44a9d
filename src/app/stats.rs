use std::time::Duration;

/// Accumulated results of one engine across mazes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    solved_count: u32,
    unsolved_count: u32,
    total_elapsed: Duration,
}

impl RunStats {
    pub fn solved_count(&self) -> u32 {
        self.solved_count
    }

    pub fn unsolved_count(&self) -> u32 {
        self.unsolved_count
    }

    pub fn total_elapsed(&self) -> Duration {
        self.total_elapsed
    }

    pub fn record_solved(&mut self, elapsed: Duration) {
        self.solved_count += 1;
        self.total_elapsed += elapsed;
    }

    pub fn record_unsolved(&mut self) {
        self.unsolved_count += 1;
    }

    /// Mean time to solve, or `None` before the first solve.
    pub fn average(&self) -> Option<Duration> {
        match self.solved_count {
            0 => None,
            n => Some(self.total_elapsed / n),
        }
    }

    pub fn reset(&mut self) {
        *self = RunStats::default();
    }
}

/// How many times faster the wave-front engine is on average:
/// classical average divided by wave average.
pub fn speed_ratio(classical: &RunStats, wave: &RunStats) -> Option<f64> {
    let classical = classical.average()?.as_secs_f64();
    let wave = wave.average()?.as_secs_f64();
    if classical == 0.0 || wave == 0.0 {
        return None;
    }
    Some(classical / wave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_is_total_over_count() {
        let mut stats = RunStats::default();
        assert_eq!(stats.average(), None);
        stats.record_solved(Duration::from_millis(100));
        stats.record_solved(Duration::from_millis(300));
        stats.record_unsolved();
        assert_eq!(stats.solved_count(), 2);
        assert_eq!(stats.unsolved_count(), 1);
        assert_eq!(stats.total_elapsed(), Duration::from_millis(400));
        assert_eq!(stats.average(), Some(Duration::from_millis(200)));

        stats.reset();
        assert_eq!(stats, RunStats::default());
    }

    #[test]
    fn test_speed_ratio() {
        let mut classical = RunStats::default();
        let mut wave = RunStats::default();
        assert_eq!(speed_ratio(&classical, &wave), None);
        classical.record_solved(Duration::from_millis(900));
        assert_eq!(speed_ratio(&classical, &wave), None);
        wave.record_solved(Duration::from_millis(300));
        let ratio = speed_ratio(&classical, &wave).unwrap();
        assert!((ratio - 3.0).abs() < 1e-9);
        wave.reset();
        wave.record_solved(Duration::ZERO);
        assert_eq!(speed_ratio(&classical, &wave), None);
    }
}
