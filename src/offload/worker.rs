use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use super::messages::{Inbound, Outbound};
use crate::{
    error::Result,
    maze::Maze,
    solvers::{StepOutcome, WaveBatch, WaveSolver},
};

/// Handle to a wave-front search running on its own thread.
///
/// Both channels carry the JSON wire form of [`Inbound`] and [`Outbound`].
/// Each side validates what it receives; malformed messages and unknown
/// message types are logged and dropped.
///
/// The worker paces itself: after each step it waits `step_interval` for
/// incoming messages before stepping again, so a `Stop` or `Reset` takes effect
/// before the next step. The owner drains results with
/// [`WaveWorker::try_recv`] on its own cadence.
///
/// Dropping the handle closes the inbox and joins the thread.
pub struct WaveWorker {
    inbox: Option<Sender<String>>,
    outbox: Receiver<String>,
    handle: Option<JoinHandle<()>>,
}

/// The search currently owned by the worker thread.
struct Job {
    generation: u64,
    maze: Maze,
    solver: WaveSolver,
    started: Instant,
    next_step: Instant,
}

impl WaveWorker {
    /// Spawn the worker thread. Fails with
    /// [`MazeError::WorkerUnavailable`](crate::error::MazeError::WorkerUnavailable)
    /// if the thread cannot be created.
    pub fn spawn(step_interval: Duration, batch: WaveBatch) -> Result<Self> {
        let (inbox_tx, inbox_rx) = mpsc::channel::<String>();
        let (outbox_tx, outbox_rx) = mpsc::channel::<String>();
        let handle = std::thread::Builder::new()
            .name("wave-worker".to_string())
            .spawn(move || run_worker(inbox_rx, outbox_tx, step_interval, batch))?;
        tracing::info!(?step_interval, ?batch, "spawned wave-front worker");
        Ok(WaveWorker {
            inbox: Some(inbox_tx),
            outbox: outbox_rx,
            handle: Some(handle),
        })
    }

    /// Send a message to the worker. Returns false if the worker has exited.
    pub fn post(&self, message: Inbound) -> bool {
        match message.to_json() {
            Ok(raw) => self.post_json(raw),
            Err(e) => {
                tracing::error!("Cannot encode worker message: {}", e);
                false
            }
        }
    }

    /// Send an already encoded message. The worker drops it if it does not
    /// parse. Returns false if the worker has exited.
    pub fn post_json(&self, raw: String) -> bool {
        match &self.inbox {
            Some(inbox) => inbox.send(raw).is_ok(),
            None => false,
        }
    }

    /// Next valid message from the worker, without blocking.
    pub fn try_recv(&self) -> Option<Outbound> {
        loop {
            let raw = self.outbox.try_recv().ok()?;
            if let Some(message) = decode_outbound(&raw) {
                return Some(message);
            }
        }
    }

    /// Next valid message from the worker, waiting at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Outbound> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let raw = self.outbox.recv_timeout(remaining).ok()?;
            if let Some(message) = decode_outbound(&raw) {
                return Some(message);
            }
        }
    }

    /// Stop the worker thread and wait for it to exit. Idempotent.
    pub fn teardown(&mut self) {
        // Closing the inbox wakes the worker with a disconnect
        self.inbox.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("wave-front worker panicked");
            } else {
                tracing::info!("wave-front worker exited");
            }
        }
    }
}

impl Drop for WaveWorker {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn decode_outbound(raw: &str) -> Option<Outbound> {
    match Outbound::from_json(raw) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::warn!("Ignoring message from worker: {}", e);
            None
        }
    }
}

/// Encode and send one message. Returns false once the owner is gone.
fn send(outbox: &Sender<String>, message: &Outbound) -> bool {
    match message.to_json() {
        Ok(raw) => outbox.send(raw).is_ok(),
        Err(e) => {
            tracing::error!("Cannot encode worker result: {}", e);
            true
        }
    }
}

/// Worker thread body. Runs until the inbox or the outbox is disconnected.
fn run_worker(
    inbox: Receiver<String>,
    outbox: Sender<String>,
    step_interval: Duration,
    batch: WaveBatch,
) {
    let mut job: Option<Job> = None;
    loop {
        // Wait for a message, or until the next step is due
        let message = match &job {
            None => match inbox.recv() {
                Ok(message) => Some(message),
                Err(_) => break,
            },
            Some(job) => {
                let timeout = job.next_step.saturating_duration_since(Instant::now());
                match inbox.recv_timeout(timeout) {
                    Ok(message) => Some(message),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        };

        if let Some(raw) = message {
            match Inbound::from_json(&raw) {
                Ok(message) => job = handle_message(message, job, batch),
                Err(e) => tracing::warn!("Ignoring worker message: {}", e),
            }
            continue;
        }

        let Some(current) = job.as_mut() else {
            continue;
        };
        let step = current.solver.step(&current.maze);
        current.next_step = Instant::now() + step_interval;
        let generation = current.generation;

        if !step.new_cells.is_empty() {
            let update = Outbound::WaveUpdate {
                generation,
                new_cells: step.new_cells,
            };
            if !send(&outbox, &update) {
                break;
            }
        }

        let finished = match step.outcome {
            StepOutcome::Continue => None,
            StepOutcome::Solved(path) => {
                let elapsed_time = current.started.elapsed();
                tracing::info!(
                    generation,
                    ?elapsed_time,
                    length = path.len(),
                    "worker found a solution"
                );
                Some(Outbound::SolutionFound {
                    generation,
                    path,
                    elapsed_time,
                })
            }
            StepOutcome::Unsolvable => {
                tracing::info!(generation, "worker exhausted the maze without a solution");
                Some(Outbound::NoSolution { generation })
            }
        };
        if let Some(message) = finished {
            job = None;
            if !send(&outbox, &message) {
                break;
            }
        }
    }
    tracing::debug!("wave-front worker loop finished");
}

fn handle_message(message: Inbound, job: Option<Job>, batch: WaveBatch) -> Option<Job> {
    match message {
        Inbound::Start { generation, maze } => {
            if let Some(previous) = &job {
                tracing::debug!(
                    previous = previous.generation,
                    generation,
                    "replacing running search"
                );
            }
            let now = Instant::now();
            let solver = WaveSolver::new(&maze, batch);
            Some(Job {
                generation,
                maze,
                solver,
                started: now,
                next_step: now,
            })
        }
        Inbound::Stop => {
            if let Some(job) = &job {
                tracing::debug!(generation = job.generation, "worker stopped");
            }
            None
        }
        Inbound::Reset => {
            tracing::debug!("worker reset");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        generators::{DEFAULT_CONNECTION_DENSITY, generate_maze, get_rng},
        maze::is_valid_path,
        solvers::solve_wave,
    };
    use std::collections::HashSet;

    const WAIT: Duration = Duration::from_secs(5);

    fn maze(dim: u16, seed: u64) -> Maze {
        generate_maze(dim, dim, DEFAULT_CONNECTION_DENSITY, &mut get_rng(Some(seed))).unwrap()
    }

    #[test]
    fn test_worker_solves_maze() {
        let worker = WaveWorker::spawn(Duration::ZERO, WaveBatch::default()).unwrap();
        let maze = maze(25, 3);
        assert!(worker.post(Inbound::Start {
            generation: 1,
            maze: maze.clone(),
        }));

        let mut wave = HashSet::new();
        let path = loop {
            match worker.recv_timeout(WAIT).expect("worker went silent") {
                Outbound::WaveUpdate {
                    generation,
                    new_cells,
                } => {
                    assert_eq!(generation, 1);
                    for cell in new_cells {
                        assert!(wave.insert(cell));
                    }
                }
                Outbound::SolutionFound {
                    generation, path, ..
                } => {
                    assert_eq!(generation, 1);
                    break path;
                }
                Outbound::NoSolution { .. } => panic!("maze is solvable"),
            }
        };
        assert!(is_valid_path(&maze, &path));
        assert_eq!(
            path.len(),
            solve_wave(&maze, WaveBatch::default()).unwrap().len()
        );
    }

    #[test]
    fn test_reset_silences_worker() {
        let worker =
            WaveWorker::spawn(Duration::from_millis(20), WaveBatch::Paths(1)).unwrap();
        assert!(worker.post(Inbound::Start {
            generation: 4,
            maze: maze(50, 1),
        }));
        assert!(matches!(
            worker.recv_timeout(WAIT),
            Some(Outbound::WaveUpdate { generation: 4, .. })
        ));
        assert!(worker.post(Inbound::Reset));
        // Drain whatever was sent before the reset was handled
        while worker.recv_timeout(Duration::from_millis(100)).is_some() {}
        assert!(worker.recv_timeout(Duration::from_millis(200)).is_none());
    }

    #[test]
    fn test_unknown_json_is_ignored() {
        let worker = WaveWorker::spawn(Duration::ZERO, WaveBatch::default()).unwrap();
        assert!(worker.post_json(r#"{"type":"warp-drive"}"#.to_string()));
        assert!(worker.post_json("{not json".to_string()));
        assert!(worker.post_json(r#"{"type":"stop"}"#.to_string()));
        // A start with an unsolvable maze fails validation on the worker side
        assert!(worker.post(Inbound::Start {
            generation: 8,
            maze: Maze::new(5, 5),
        }));
        // Worker is still alive and serving
        assert!(worker.post(Inbound::Start {
            generation: 9,
            maze: maze(10, 2),
        }));
        let solved = std::iter::from_fn(|| worker.recv_timeout(WAIT))
            .inspect(|m| assert_eq!(m.generation(), 9))
            .find(|m| matches!(m, Outbound::SolutionFound { .. }));
        assert!(matches!(
            solved,
            Some(Outbound::SolutionFound { generation: 9, .. })
        ));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut worker = WaveWorker::spawn(Duration::ZERO, WaveBatch::default()).unwrap();
        worker.teardown();
        worker.teardown();
        assert!(!worker.post(Inbound::Reset));
    }
}
