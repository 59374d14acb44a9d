pub mod app;
pub mod config;
pub mod error;
pub mod generators;
pub mod maze;
pub mod offload;
pub mod solvers;
