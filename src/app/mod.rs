pub mod history;
pub mod menu;
pub mod orchestrator;
pub mod renderer;
pub mod schedule;
pub mod snapshot;
pub mod stats;

use std::io::{Stdout, Write};

use crossterm::{
    cursor,
    event::{self, KeyCode},
    queue, style,
    terminal::{self, ClearType},
};

pub use orchestrator::{Orchestrator, Phase};

use crate::{
    app::{
        history::CycleReport,
        menu::{Menu, MenuEntry},
        renderer::{Frame, Panel, Renderer},
        stats::RunStats,
    },
    config::{MazeSize, RaceConfig, RaceMode},
    solvers::{EngineState, Solver},
};

/// What a key press asks the race to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserAction {
    RunOnce,
    ToggleContinuous,
    Stop,
    Reset,
    ResetStats,
    /// Show an older finished race
    HistoryBack,
    /// Show a newer finished race
    HistoryForward,
    Quit,
}

impl UserAction {
    fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Enter => Some(UserAction::RunOnce),
            KeyCode::Char('c') => Some(UserAction::ToggleContinuous),
            KeyCode::Char('s') => Some(UserAction::Stop),
            KeyCode::Backspace => Some(UserAction::Reset),
            KeyCode::Char('r') => Some(UserAction::ResetStats),
            KeyCode::Up => Some(UserAction::HistoryBack),
            KeyCode::Down => Some(UserAction::HistoryForward),
            KeyCode::Esc | KeyCode::Char('q') => Some(UserAction::Quit),
            _ => None,
        }
    }
}

const HELP_LINE: &str = "Enter: run once  c: continuous  s: stop  Backspace: reset  r: reset stats  Up/Down: history  Esc: quit";

#[derive(Default)]
pub struct App {
    /// Seed applied on top of the environment, mostly for scripted runs
    seed: Option<u64>,
}

impl App {
    pub fn with_seed(seed: u64) -> Self {
        App { seed: Some(seed) }
    }

    /// Put the terminal back and log the panic before the default hook
    /// prints it. Panics on the worker thread pass through here too.
    fn set_panic_hook() {
        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            tracing::error!("panic: {}", panic_info);
            // Already failing, nothing useful to do with a restore error
            let _ = App::restore_terminal(&mut std::io::stdout());
            hook(panic_info);
        }));
    }

    /// Raw mode, alternate screen, hidden cursor, titled window.
    pub fn setup_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
        terminal::enable_raw_mode()?;
        App::set_panic_hook();
        queue!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::SetTitle("mazerace"),
            terminal::Clear(ClearType::All),
            cursor::Hide,
            cursor::MoveTo(0, 0)
        )?;
        stdout.flush()
    }

    /// Undo [`App::setup_terminal`]. Safe to call more than once.
    pub fn restore_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
        queue!(
            stdout,
            style::ResetColor,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;
        stdout.flush()?;
        if terminal::is_raw_mode_enabled()? {
            terminal::disable_raw_mode()?;
        }
        Ok(())
    }

    /// Build the race configuration for the chosen size and mode.
    pub fn race_config(&self, size: MazeSize, mode: RaceMode) -> RaceConfig {
        let config = RaceConfig::for_size(size).with_mode(mode).with_env_seed();
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    /// Main application loop
    pub fn run(&self, stdout: &mut Stdout) -> std::io::Result<()> {
        let Some(size) = App::choose(stdout, "Select maze size:", &MazeSize::ALL)? else {
            return Ok(());
        };
        let Some(mode) = App::choose(stdout, "Select racers:", &RaceMode::ALL)? else {
            return Ok(());
        };

        let config = self.race_config(size, mode);
        tracing::info!(?config, "starting race session");
        let mut orchestrator = Orchestrator::create(config).map_err(std::io::Error::other)?;
        let result = App::race_loop(&mut orchestrator);
        orchestrator.teardown();
        result
    }

    fn choose<T: MenuEntry>(
        stdout: &mut Stdout,
        prompt: &str,
        entries: &[T],
    ) -> std::io::Result<Option<T>> {
        match Menu::new(entries) {
            Some(menu) => menu.run(stdout, prompt),
            None => Ok(None),
        }
    }

    /// Poll keys, advance the race and redraw, once per frame, until Esc.
    fn race_loop(orchestrator: &mut Orchestrator) -> std::io::Result<()> {
        let frame_interval = orchestrator.config().frame_interval;
        let mut renderer = Renderer::new();
        renderer.invalidate()?;

        loop {
            if event::poll(frame_interval)? {
                match event::read()? {
                    event::Event::Key(key_event) if key_event.kind == event::KeyEventKind::Press => {
                        if let Some(action) = UserAction::from_key(key_event.code) {
                            tracing::debug!(?action, "user action");
                            if !App::apply(orchestrator, action)? {
                                break;
                            }
                        }
                    }
                    event::Event::Resize(_, _) => renderer.invalidate()?,
                    _ => {}
                }
            }

            orchestrator.tick().map_err(std::io::Error::other)?;
            renderer.draw(&App::frame(orchestrator))?;
        }
        tracing::info!(
            cycles = orchestrator.cycles_completed(),
            "race session finished"
        );
        Ok(())
    }

    /// Returns false when the session should end.
    fn apply(orchestrator: &mut Orchestrator, action: UserAction) -> std::io::Result<bool> {
        match action {
            UserAction::RunOnce => orchestrator.run_once().map_err(std::io::Error::other)?,
            UserAction::ToggleContinuous => {
                if orchestrator.is_continuous() {
                    orchestrator.stop_continuous();
                } else {
                    orchestrator
                        .run_continuous()
                        .map_err(std::io::Error::other)?;
                }
            }
            UserAction::Stop => orchestrator.stop(),
            UserAction::Reset => orchestrator.reset(),
            UserAction::ResetStats => orchestrator.reset_stats(),
            UserAction::HistoryBack => {
                orchestrator.history_mut().backward();
            }
            UserAction::HistoryForward => {
                orchestrator.history_mut().forward();
            }
            UserAction::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn frame(orchestrator: &Orchestrator) -> Frame {
        let wave_title = if orchestrator.is_offloaded() {
            format!("{} [worker]", Solver::Wave)
        } else {
            Solver::Wave.to_string()
        };
        Frame {
            panels: [
                Panel {
                    title: Solver::Classical.to_string(),
                    snapshot: orchestrator.classical_snapshot(),
                },
                Panel {
                    title: wave_title,
                    snapshot: orchestrator.wave_snapshot(),
                },
            ],
            status: status_lines(orchestrator),
        }
    }
}

fn describe_state(state: &EngineState) -> String {
    match state {
        EngineState::Idle => "idle".to_string(),
        EngineState::Running => "running".to_string(),
        EngineState::Solved { path, elapsed } => {
            format!("solved in {:.0?}, distance {} cells", elapsed, path.len())
        }
        EngineState::Unsolvable => "no solution".to_string(),
        EngineState::Stopped => "stopped".to_string(),
    }
}

fn describe_stats(stats: &RunStats) -> String {
    match stats.average() {
        Some(average) => format!(
            "{} solved, avg {:.1?}, total {:.1?}",
            stats.solved_count(),
            average,
            stats.total_elapsed()
        ),
        None => "no solves yet".to_string(),
    }
}

fn describe_report(report: &CycleReport, position: usize, len: usize) -> String {
    format!(
        "Race #{} ({}/{}, {}x{}): classical {}, quantum {}",
        report.cycle,
        position,
        len,
        report.dimension,
        report.dimension,
        report.classical,
        report.wave
    )
}

/// Text shown under the panels.
fn status_lines(orchestrator: &Orchestrator) -> Vec<String> {
    let mode = match (orchestrator.is_continuous(), orchestrator.phase()) {
        (true, _) => "continuous",
        (false, Phase::Idle) => "idle",
        (false, _) => "single run",
    };
    let ratio = match orchestrator.speed_ratio() {
        Some(ratio) => format!("quantum is {:.2}x faster", ratio),
        None => "speed ratio -".to_string(),
    };
    let history = orchestrator.history();
    let last_race = match history.current() {
        Some(report) => describe_report(report, history.position(), history.len()),
        None => "No finished races yet".to_string(),
    };

    vec![
        format!(
            "Classical: {} | {}",
            describe_state(orchestrator.classical_state()),
            describe_stats(orchestrator.classical_stats())
        ),
        format!(
            "Quantum:   {} | {} | {} cells reached",
            describe_state(orchestrator.wave_state()),
            describe_stats(orchestrator.wave_stats()),
            orchestrator.wave_size()
        ),
        format!(
            "Mode: {} | {} | races: {}",
            mode,
            ratio,
            orchestrator.cycles_completed()
        ),
        last_race,
        HELP_LINE.to_string(),
    ]
}
