use std::time::{Duration, Instant};

use mazerace::{
    app::Orchestrator,
    config::{MazeSize, RaceConfig},
};
use tracing_subscriber::EnvFilter;

/// Race continuously without rendering or pacing and print the statistics.
///
/// Usage: `profile [cycles] [small|large|mega]`
fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("MAZERACE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args();
    args.next(); // Skip executable name
    let num_cycles = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(10);
    let size = match args.next().as_deref() {
        Some("large") => MazeSize::Large,
        Some("mega") => MazeSize::Mega,
        _ => MazeSize::Small,
    };

    let config = RaceConfig {
        classical_interval: Duration::ZERO,
        wave_interval: Duration::ZERO,
        dwell: Duration::ZERO,
        settle: Duration::ZERO,
        frame_interval: Duration::ZERO,
        ..RaceConfig::for_size(size).with_env_seed()
    };
    let mut orchestrator = Orchestrator::create(config).map_err(std::io::Error::other)?;

    let started = Instant::now();
    orchestrator
        .run_continuous()
        .map_err(std::io::Error::other)?;
    while orchestrator.cycles_completed() < num_cycles {
        if !orchestrator.tick().map_err(std::io::Error::other)? {
            // Waiting on the worker
            std::thread::sleep(Duration::from_micros(100));
        }
    }
    orchestrator.teardown();

    let classical = orchestrator.classical_stats();
    let wave = orchestrator.wave_stats();
    println!(
        "{} races on {} mazes in {:.2?}",
        num_cycles,
        size,
        started.elapsed()
    );
    println!(
        "classical: {} solved, {} unsolved, total {:.2?}, average {:.2?}",
        classical.solved_count(),
        classical.unsolved_count(),
        classical.total_elapsed(),
        classical.average().unwrap_or_default()
    );
    println!(
        "quantum:   {} solved, {} unsolved, total {:.2?}, average {:.2?}",
        wave.solved_count(),
        wave.unsolved_count(),
        wave.total_elapsed(),
        wave.average().unwrap_or_default()
    );
    if let Some(ratio) = orchestrator.speed_ratio() {
        println!("quantum is {:.2}x faster on average", ratio);
    }
    Ok(())
}
