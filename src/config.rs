use std::time::Duration;

use crate::{
    generators::DEFAULT_CONNECTION_DENSITY,
    solvers::{Solver, WaveBatch},
};

/// Environment variable holding a seed for reproducible sessions.
pub const SEED_ENV_VAR: &str = "MAZERACE_SEED";

/// Preset maze sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MazeSize {
    Small,
    Large,
    Mega,
}

impl MazeSize {
    pub const ALL: [MazeSize; 3] = [MazeSize::Small, MazeSize::Large, MazeSize::Mega];

    pub fn dimension(&self) -> u16 {
        match self {
            MazeSize::Small => 10,
            MazeSize::Large => 25,
            MazeSize::Mega => 50,
        }
    }
}

impl std::fmt::Display for MazeSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dim = self.dimension();
        match self {
            MazeSize::Small => write!(f, "Small ({}x{})", dim, dim),
            MazeSize::Large => write!(f, "Large ({}x{})", dim, dim),
            MazeSize::Mega => write!(f, "Mega ({}x{}, background worker)", dim, dim),
        }
    }
}

/// Which engines take part in a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceMode {
    Both,
    ClassicalOnly,
    WaveOnly,
}

impl RaceMode {
    pub const ALL: [RaceMode; 3] = [RaceMode::Both, RaceMode::ClassicalOnly, RaceMode::WaveOnly];

    pub fn includes(&self, solver: Solver) -> bool {
        match self {
            RaceMode::Both => true,
            RaceMode::ClassicalOnly => solver == Solver::Classical,
            RaceMode::WaveOnly => solver == Solver::Wave,
        }
    }
}

impl std::fmt::Display for RaceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RaceMode::Both => write!(f, "Both engines"),
            RaceMode::ClassicalOnly => write!(f, "Classical only"),
            RaceMode::WaveOnly => write!(f, "Quantum only"),
        }
    }
}

/// Everything that tunes a race.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceConfig {
    /// Side length of generated mazes
    pub dimension: u16,
    /// Minimum time between two backtracking steps
    pub classical_interval: Duration,
    /// Minimum time between two wave-front steps (inline or on the worker)
    pub wave_interval: Duration,
    pub wave_batch: WaveBatch,
    /// Run the wave-front search on a background worker thread
    pub offload_wave: bool,
    /// How long a finished race stays visible before the next maze is generated
    pub dwell: Duration,
    /// Delay between generating the next maze and restarting the engines
    pub settle: Duration,
    /// Cadence at which buffered worker results are flushed into the visible wave
    pub frame_interval: Duration,
    /// Fraction of cells sampled for extra connections
    pub connection_density: f64,
    /// Seed for maze generation and classical tie-breaking; random when unset
    pub seed: Option<u64>,
    /// Number of finished races kept in the history
    pub max_history: usize,
    pub mode: RaceMode,
}

impl Default for RaceConfig {
    fn default() -> Self {
        RaceConfig::for_size(MazeSize::Small)
    }
}

impl RaceConfig {
    /// One animation frame.
    pub const FRAME: Duration = Duration::from_millis(16);

    pub fn for_size(size: MazeSize) -> Self {
        let (classical_interval, wave_interval, wave_batch, offload_wave) = match size {
            MazeSize::Small => (
                Duration::from_millis(50),
                Duration::from_millis(50),
                WaveBatch::Level,
                false,
            ),
            MazeSize::Large => (
                Duration::from_millis(20),
                Duration::from_millis(15),
                WaveBatch::Level,
                false,
            ),
            MazeSize::Mega => (
                Duration::from_millis(20),
                RaceConfig::FRAME,
                WaveBatch::default(),
                true,
            ),
        };
        RaceConfig {
            dimension: size.dimension(),
            classical_interval,
            wave_interval,
            wave_batch,
            offload_wave,
            dwell: Duration::from_millis(1000),
            settle: Duration::from_millis(100),
            frame_interval: RaceConfig::FRAME,
            connection_density: DEFAULT_CONNECTION_DENSITY,
            seed: None,
            max_history: 100,
            mode: RaceMode::Both,
        }
    }

    /// Picks up a seed from [`SEED_ENV_VAR`] when one is set and valid.
    pub fn with_env_seed(mut self) -> Self {
        if let Ok(val) = std::env::var(SEED_ENV_VAR) {
            match val.trim().parse::<u64>() {
                Ok(seed) => self.seed = Some(seed),
                Err(_) => tracing::warn!("Ignoring invalid {}: {:?}", SEED_ENV_VAR, val),
            }
        }
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_mode(mut self, mode: RaceMode) -> Self {
        self.mode = mode;
        self
    }

    /// One-line summary of how fast each engine steps.
    pub fn pacing(&self) -> String {
        let batch = match self.wave_batch {
            WaveBatch::Level => "one level".to_string(),
            WaveBatch::Paths(1) => "1 path".to_string(),
            WaveBatch::Paths(k) => format!("{} paths", k),
        };
        let place = if self.offload_wave { "on a worker" } else { "inline" };
        format!(
            "classical every {:?}, quantum every {:?} ({} per step, {})",
            self.classical_interval, self.wave_interval, batch, place
        )
    }
}
