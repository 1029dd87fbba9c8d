//! `hospi-forecast` library crate.
//!
//! The binary (`hospi`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., a future HTTP transport, batch jobs)
//! - code stays easy to navigate as the project grows

pub mod adjust;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod models;
pub mod report;
pub mod rng;
