use mazerace::app::App;
use tracing_subscriber::EnvFilter;

/// The terminal is taken over by the race, so logs go to this file.
const LOG_FILE: &str = "mazerace.log";
const LOG_ENV_VAR: &str = "MAZERACE_LOG";

fn main() -> std::io::Result<()> {
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = App::default();
    let mut stdout = std::io::stdout();
    App::setup_terminal(&mut stdout)?;
    let result = app.run(&mut stdout);
    App::restore_terminal(&mut stdout)?;

    if let Err(e) = &result {
        tracing::error!("Race session failed: {}", e);
    }
    result
}
