//! Messages exchanged with the background wave-front worker.
//!
//! Each direction is a closed, `type`-tagged enum. The JSON wire form mirrors
//! the enum exactly, e.g. `{"type":"wave-update","generation":3,"newCells":[...]}`.
//! Every message carries the generation token of the run it belongs to, so the
//! receiving side can drop messages from a run that has since been reset.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    maze::{Coord, Maze, Path},
};

/// Orchestrator to worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Inbound {
    /// Drop any current search and start a fresh one on `maze`.
    Start {
        #[serde(default)]
        generation: u64,
        maze: Maze,
    },
    /// Cancel the current search.
    Stop,
    /// Cancel the current search and drop all of its state.
    Reset,
}

impl Inbound {
    /// Parse and validate a JSON message. Unknown message types, malformed
    /// payloads and structurally invalid mazes are all rejected.
    pub fn from_json(raw: &str) -> Result<Self> {
        let message: Inbound = serde_json::from_str(raw)?;
        if let Inbound::Start { maze, .. } = &message {
            maze.validate()?;
        }
        Ok(message)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Worker to orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Outbound {
    /// Cells reached for the first time since the previous update.
    #[serde(rename_all = "camelCase")]
    WaveUpdate {
        generation: u64,
        new_cells: Vec<Coord>,
    },
    /// The search reached the end along `path`.
    #[serde(rename_all = "camelCase")]
    SolutionFound {
        generation: u64,
        path: Path,
        #[serde(with = "duration_ms")]
        elapsed_time: Duration,
    },
    /// The search exhausted its frontier without reaching the end.
    #[serde(rename_all = "camelCase")]
    NoSolution { generation: u64 },
}

impl Outbound {
    pub fn generation(&self) -> u64 {
        match self {
            Outbound::WaveUpdate { generation, .. }
            | Outbound::SolutionFound { generation, .. }
            | Outbound::NoSolution { generation } => *generation,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Durations travel as fractional milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(D::Error::custom(format!("invalid elapsed time {}", ms)));
        }
        Ok(Duration::from_secs_f64(ms / 1000.0))
    }
}
