use std::{collections::HashSet, sync::Arc, time::Duration};

use rand::rngs::StdRng;

use super::{
    history::{CycleHistory, CycleReport, LaneResult},
    schedule::{Clock, MonotonicClock, Schedule, Task},
    snapshot::{Layers, Snapshot},
    stats::{self, RunStats},
};
use crate::{
    config::RaceConfig,
    error::Result,
    generators::{generate_maze, get_rng},
    maze::{CellClass, Coord, Maze},
    offload::{Inbound, Outbound, WaveWorker},
    solvers::{ClassicalSolver, EngineState, Solver, StepOutcome, WaveSolver},
};

/// Where the orchestrator is within a race cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing scheduled
    Idle,
    /// At least one engine is running
    Racing,
    /// Both engines finished; the result stays visible until the next maze
    Dwelling,
    /// A new maze is shown; engines start shortly
    Settling,
}

#[derive(Default)]
struct ClassicalLane {
    state: EngineState,
    solver: Option<ClassicalSolver>,
    /// Dead ends of the last finished search, kept for display
    dead_ends: HashSet<Coord>,
    started: Duration,
}

impl ClassicalLane {
    fn clear(&mut self) {
        *self = ClassicalLane::default();
    }

    fn current_path(&self) -> &[Coord] {
        self.solver
            .as_ref()
            .map(ClassicalSolver::current_path)
            .unwrap_or(&[])
    }

    fn dead_ends(&self) -> &HashSet<Coord> {
        self.solver
            .as_ref()
            .map(ClassicalSolver::dead_ends)
            .unwrap_or(&self.dead_ends)
    }

    fn finish(&mut self, state: EngineState) {
        if let Some(solver) = self.solver.take() {
            self.dead_ends = solver.into_dead_ends();
        }
        self.state = state;
    }
}

enum WaveBackend {
    Worker(WaveWorker),
    Inline(Option<WaveSolver>),
}

struct WaveLane {
    state: EngineState,
    backend: WaveBackend,
    /// Cells reported by the worker but not yet shown
    pending: Vec<Coord>,
    visible: HashSet<Coord>,
    started: Duration,
}

impl WaveLane {
    fn clear(&mut self) {
        self.state = EngineState::Idle;
        self.pending.clear();
        self.visible.clear();
        if let WaveBackend::Inline(solver) = &mut self.backend {
            *solver = None;
        }
    }

    /// Move buffered cells into the visible wave. Returns whether anything moved.
    fn flush(&mut self) -> bool {
        let moved = !self.pending.is_empty();
        self.visible.extend(self.pending.drain(..));
        moved
    }

    fn finish(&mut self, state: EngineState) {
        self.flush();
        if let WaveBackend::Inline(solver) = &mut self.backend {
            *solver = None;
        }
        self.state = state;
    }
}

/// Drives both engines over a sequence of mazes.
///
/// All work is cooperative: [`Orchestrator::tick`] runs whatever the schedule
/// says is due and returns. The caller decides how often to tick. The wave
/// engine either steps inline like the classical one or runs on a
/// [`WaveWorker`], whose messages are picked up on each tick.
pub struct Orchestrator {
    config: RaceConfig,
    rng: StdRng,
    maze: Arc<Maze>,
    /// Whether the installed maze has been raced on yet
    raced: bool,
    schedule: Schedule,
    classical: ClassicalLane,
    wave: WaveLane,
    classical_stats: RunStats,
    wave_stats: RunStats,
    continuous: bool,
    phase: Phase,
    history: CycleHistory,
    cycles: u64,
}

impl Orchestrator {
    pub fn create(config: RaceConfig) -> Result<Self> {
        Orchestrator::with_clock(config, Box::new(MonotonicClock::default()))
    }

    /// Like [`Orchestrator::create`] with an explicit time source.
    ///
    /// If the configuration asks for a background worker and it cannot be
    /// started, the wave-front search runs inline instead.
    pub fn with_clock(config: RaceConfig, clock: Box<dyn Clock>) -> Result<Self> {
        let mut rng = get_rng(config.seed);
        let maze = generate_maze(
            config.dimension,
            config.dimension,
            config.connection_density,
            &mut rng,
        )?;

        let backend = if config.offload_wave {
            match WaveWorker::spawn(config.wave_interval, config.wave_batch) {
                Ok(worker) => WaveBackend::Worker(worker),
                Err(e) => {
                    tracing::warn!("Running the wave-front search inline: {}", e);
                    WaveBackend::Inline(None)
                }
            }
        } else {
            WaveBackend::Inline(None)
        };
        tracing::info!(
            dimension = config.dimension,
            mode = %config.mode,
            offloaded = matches!(backend, WaveBackend::Worker(_)),
            "created race orchestrator"
        );

        Ok(Orchestrator {
            rng,
            maze: Arc::new(maze),
            raced: false,
            schedule: Schedule::new(clock),
            classical: ClassicalLane::default(),
            wave: WaveLane {
                state: EngineState::Idle,
                backend,
                pending: Vec::new(),
                visible: HashSet::new(),
                started: Duration::ZERO,
            },
            classical_stats: RunStats::default(),
            wave_stats: RunStats::default(),
            continuous: false,
            phase: Phase::Idle,
            history: CycleHistory::new(config.max_history),
            cycles: 0,
            config,
        })
    }

    /// Race both engines once. The first race uses the maze generated at
    /// creation, later ones a fresh maze. Any race in progress is abandoned.
    pub fn run_once(&mut self) -> Result<()> {
        self.continuous = false;
        self.start_race()
    }

    /// Race on new mazes until stopped. If a race is already in progress it
    /// simply becomes the first cycle.
    pub fn run_continuous(&mut self) -> Result<()> {
        self.continuous = true;
        match self.phase {
            Phase::Idle => self.start_race(),
            _ => {
                tracing::info!("continuing current race in continuous mode");
                Ok(())
            }
        }
    }

    /// Leave continuous mode. The current race runs to completion but no new
    /// maze follows it.
    pub fn stop_continuous(&mut self) {
        if self.continuous {
            tracing::info!("leaving continuous mode");
        }
        self.continuous = false;
    }

    /// Cancel both engines and anything scheduled. Finished results stay
    /// visible; running engines end up `Stopped`.
    pub fn stop(&mut self) {
        self.continuous = false;
        self.cancel_in_flight();
        if self.classical.state.is_running() {
            self.classical.finish(EngineState::Stopped);
        }
        if self.wave.state.is_running() {
            self.wave.finish(EngineState::Stopped);
        }
        if self.phase != Phase::Idle {
            tracing::info!(generation = self.schedule.generation(), "race stopped");
        }
        self.phase = Phase::Idle;
    }

    /// Stop and drop all engine state, returning both engines to `Idle`.
    pub fn reset(&mut self) {
        self.stop();
        if let WaveBackend::Worker(worker) = &self.wave.backend {
            worker.post(Inbound::Reset);
        }
        self.classical.clear();
        self.wave.clear();
        tracing::info!(generation = self.schedule.generation(), "race reset");
    }

    pub fn reset_stats(&mut self) {
        self.classical_stats.reset();
        self.wave_stats.reset();
        tracing::info!("statistics reset");
    }

    /// Pick up worker results and run every task that is due. Returns whether
    /// anything visible changed.
    pub fn tick(&mut self) -> Result<bool> {
        let mut changed = self.drain_worker();
        for due in self.schedule.take_due() {
            if !self.schedule.is_current(&due) {
                tracing::debug!(task = ?due.task, stale = due.generation, "skipping stale task");
                continue;
            }
            changed |= self.run_task(due.task)?;
        }
        Ok(changed)
    }

    /// Stop everything and shut down the background worker, if any. Idempotent.
    pub fn teardown(&mut self) {
        self.stop();
        if let WaveBackend::Worker(worker) = &mut self.wave.backend {
            worker.teardown();
        }
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn maze(&self) -> &Arc<Maze> {
        &self.maze
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn is_offloaded(&self) -> bool {
        matches!(self.wave.backend, WaveBackend::Worker(_))
    }

    pub fn generation(&self) -> u64 {
        self.schedule.generation()
    }

    pub fn classical_state(&self) -> &EngineState {
        &self.classical.state
    }

    pub fn wave_state(&self) -> &EngineState {
        &self.wave.state
    }

    pub fn classical_stats(&self) -> &RunStats {
        &self.classical_stats
    }

    pub fn wave_stats(&self) -> &RunStats {
        &self.wave_stats
    }

    pub fn speed_ratio(&self) -> Option<f64> {
        stats::speed_ratio(&self.classical_stats, &self.wave_stats)
    }

    /// Number of cells currently shown as reached by the wave.
    pub fn wave_size(&self) -> usize {
        self.wave.visible.len()
    }

    /// Number of races completed since creation.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles
    }

    pub fn history(&self) -> &CycleHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut CycleHistory {
        &mut self.history
    }

    /// Time until the next scheduled task, if any.
    pub fn time_until_next(&self) -> Option<Duration> {
        self.schedule.time_until_next()
    }

    pub fn classical_snapshot(&self) -> Snapshot {
        let layers = Layers {
            solution: self
                .classical
                .state
                .solution()
                .map(|path| (path, CellClass::ClassicalSolution)),
            classical_path: self.classical.current_path(),
            dead_ends: Some(self.classical.dead_ends()),
            wave: None,
        };
        Snapshot::project(&self.maze, &layers)
    }

    pub fn wave_snapshot(&self) -> Snapshot {
        let layers = Layers {
            solution: self
                .wave
                .state
                .solution()
                .map(|path| (path, CellClass::QuantumSolution)),
            wave: Some(&self.wave.visible),
            ..Default::default()
        };
        Snapshot::project(&self.maze, &layers)
    }

    fn start_race(&mut self) -> Result<()> {
        self.cancel_in_flight();
        if self.raced {
            let maze = self.generate()?;
            self.install_maze(maze);
        } else {
            self.classical.clear();
            self.wave.clear();
        }
        self.start_engines();
        Ok(())
    }

    fn generate(&mut self) -> Result<Maze> {
        let dimension = self.config.dimension;
        generate_maze(
            dimension,
            dimension,
            self.config.connection_density,
            &mut self.rng,
        )
    }

    /// Invalidate scheduled work and tell the worker to drop its search.
    fn cancel_in_flight(&mut self) {
        self.schedule.advance_generation();
        if let WaveBackend::Worker(worker) = &self.wave.backend {
            if self.wave.state.is_running() {
                worker.post(Inbound::Stop);
            }
        }
    }

    fn install_maze(&mut self, maze: Maze) {
        self.maze = Arc::new(maze);
        self.classical.clear();
        self.wave.clear();
    }

    fn start_engines(&mut self) {
        self.raced = true;
        let now = self.schedule.now();
        let generation = self.schedule.generation();

        if self.config.mode.includes(Solver::Classical) {
            self.classical.solver = Some(ClassicalSolver::new(&self.maze));
            self.classical.state = EngineState::Running;
            self.classical.started = now;
            self.schedule.schedule_next(Task::ClassicalStep, Duration::ZERO);
        }

        if self.config.mode.includes(Solver::Wave) {
            self.wave.state = EngineState::Running;
            self.wave.started = now;
            let posted = match &self.wave.backend {
                WaveBackend::Worker(worker) => worker.post(Inbound::Start {
                    generation,
                    maze: Maze::clone(&self.maze),
                }),
                WaveBackend::Inline(_) => false,
            };
            if posted {
                self.schedule
                    .schedule_next(Task::FlushWave, self.config.frame_interval);
            } else {
                if self.is_offloaded() {
                    tracing::warn!("wave-front worker is gone, continuing inline");
                }
                let solver = WaveSolver::new(&self.maze, self.config.wave_batch);
                self.wave.backend = WaveBackend::Inline(Some(solver));
                self.schedule.schedule_next(Task::WaveStep, Duration::ZERO);
            }
        }

        self.phase = Phase::Racing;
        tracing::info!(generation, dimension = self.maze.dimension(), "race started");
    }

    fn run_task(&mut self, task: Task) -> Result<bool> {
        match task {
            Task::ClassicalStep => Ok(self.step_classical()),
            Task::WaveStep => Ok(self.step_wave()),
            Task::FlushWave => {
                let changed = self.wave.flush();
                if self.wave.state.is_running() {
                    self.schedule
                        .schedule_next(Task::FlushWave, self.config.frame_interval);
                }
                Ok(changed)
            }
            Task::Regenerate => self.regenerate(),
            Task::Restart => Ok(self.restart()),
        }
    }

    fn step_classical(&mut self) -> bool {
        if !self.classical.state.is_running() {
            return false;
        }
        let Some(solver) = self.classical.solver.as_mut() else {
            return false;
        };
        let outcome = solver.step(&self.maze, &mut self.rng);
        let steps = solver.steps();

        match outcome {
            StepOutcome::Continue => {
                self.schedule
                    .schedule_next(Task::ClassicalStep, self.config.classical_interval);
            }
            StepOutcome::Solved(path) => {
                let elapsed = self.schedule.now().saturating_sub(self.classical.started);
                tracing::info!(
                    ?elapsed,
                    distance = path.len(),
                    steps,
                    "classical engine solved the maze"
                );
                self.classical.finish(EngineState::Solved { path, elapsed });
                self.complete_if_done();
            }
            StepOutcome::Unsolvable => {
                tracing::info!(steps, "classical engine found no solution");
                self.classical.finish(EngineState::Unsolvable);
                self.complete_if_done();
            }
        }
        true
    }

    fn step_wave(&mut self) -> bool {
        if !self.wave.state.is_running() {
            return false;
        }
        let WaveBackend::Inline(Some(solver)) = &mut self.wave.backend else {
            return false;
        };
        let step = solver.step(&self.maze);
        let steps = solver.steps();
        self.wave.visible.extend(step.new_cells);

        match step.outcome {
            StepOutcome::Continue => {
                self.schedule
                    .schedule_next(Task::WaveStep, self.config.wave_interval);
            }
            StepOutcome::Solved(path) => {
                let elapsed = self.schedule.now().saturating_sub(self.wave.started);
                tracing::info!(
                    ?elapsed,
                    distance = path.len(),
                    steps,
                    "wave-front engine solved the maze"
                );
                self.finish_wave(EngineState::Solved { path, elapsed });
            }
            StepOutcome::Unsolvable => {
                tracing::info!(steps, "wave-front engine found no solution");
                self.finish_wave(EngineState::Unsolvable);
            }
        }
        true
    }

    fn finish_wave(&mut self, state: EngineState) {
        self.wave.finish(state);
        self.schedule.cancel(Task::FlushWave);
        self.complete_if_done();
    }

    /// Apply worker messages of the current generation. Anything older belongs
    /// to a cancelled run and is dropped.
    fn drain_worker(&mut self) -> bool {
        let WaveBackend::Worker(worker) = &self.wave.backend else {
            return false;
        };
        let generation = self.schedule.generation();
        let mut messages = Vec::new();
        while let Some(message) = worker.try_recv() {
            if message.generation() == generation {
                messages.push(message);
            } else {
                tracing::debug!(
                    stale = message.generation(),
                    generation,
                    "dropping stale worker message"
                );
            }
        }

        let mut changed = false;
        for message in messages {
            changed |= self.apply_worker_message(message);
        }
        changed
    }

    fn apply_worker_message(&mut self, message: Outbound) -> bool {
        if !self.wave.state.is_running() {
            return false;
        }
        match message {
            Outbound::WaveUpdate { new_cells, .. } => {
                // Shown on the next flush
                self.wave.pending.extend(new_cells);
                false
            }
            Outbound::SolutionFound {
                path, elapsed_time, ..
            } => {
                tracing::info!(
                    elapsed = ?elapsed_time,
                    distance = path.len(),
                    "wave-front worker solved the maze"
                );
                self.finish_wave(EngineState::Solved {
                    path,
                    elapsed: elapsed_time,
                });
                true
            }
            Outbound::NoSolution { .. } => {
                tracing::info!("wave-front worker found no solution");
                self.finish_wave(EngineState::Unsolvable);
                true
            }
        }
    }

    /// Close the cycle once no engine is running: record the results and,
    /// in continuous mode, schedule the next maze.
    fn complete_if_done(&mut self) {
        if self.phase != Phase::Racing
            || self.classical.state.is_running()
            || self.wave.state.is_running()
        {
            return;
        }

        self.cycles += 1;
        let report = CycleReport {
            cycle: self.cycles,
            dimension: self.maze.dimension(),
            classical: LaneResult::from_state(&self.classical.state),
            wave: LaneResult::from_state(&self.wave.state),
        };
        record(&mut self.classical_stats, report.classical);
        record(&mut self.wave_stats, report.wave);
        self.history.push(report);
        tracing::info!(
            cycle = report.cycle,
            classical = %report.classical,
            wave = %report.wave,
            "race finished"
        );

        if self.continuous {
            self.phase = Phase::Dwelling;
            self.schedule
                .schedule_next(Task::Regenerate, self.config.dwell);
        } else {
            self.phase = Phase::Idle;
        }
    }

    fn regenerate(&mut self) -> Result<bool> {
        if !self.continuous {
            self.phase = Phase::Idle;
            return Ok(false);
        }
        let maze = self.generate()?;
        let generation = self.schedule.advance_generation();
        self.install_maze(maze);
        self.phase = Phase::Settling;
        self.schedule.schedule_next(Task::Restart, self.config.settle);
        tracing::debug!(generation, "generated next maze");
        Ok(true)
    }

    fn restart(&mut self) -> bool {
        if !self.continuous {
            self.phase = Phase::Idle;
            return false;
        }
        self.start_engines();
        true
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn record(stats: &mut RunStats, result: LaneResult) {
    match result {
        LaneResult::Solved { elapsed, .. } => stats.record_solved(elapsed),
        LaneResult::Unsolvable => stats.record_unsolved(),
        LaneResult::Skipped => {}
    }
}
