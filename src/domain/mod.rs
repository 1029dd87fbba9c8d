//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - wire-facing enums (`Scenario`, `AlertLevel`, `ConfidenceBand`)
//! - historical records and request/response payloads
//! - the resolved runtime configuration (`ServiceConfig`)

pub mod types;

pub use types::*;
