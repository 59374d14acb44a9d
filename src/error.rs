use thiserror::Error;

#[derive(Error, Debug)]
pub enum MazeError {
    #[error("Invalid maze dimensions {width}x{height}: both must be at least {min}")]
    InvalidDimension { width: u16, height: u16, min: u16 },

    #[error("Search exhausted its frontier without reaching the end cell")]
    Unsolvable,

    #[error("Background worker could not be started: {0}")]
    WorkerUnavailable(#[from] std::io::Error),

    #[error("Malformed worker message: {0}")]
    MalformedMessage(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MazeError>;
