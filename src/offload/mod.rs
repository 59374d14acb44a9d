//! Message boundary for running the wave-front search on a background thread.

pub mod messages;
pub mod worker;

pub use messages::{Inbound, Outbound};
pub use worker::WaveWorker;
