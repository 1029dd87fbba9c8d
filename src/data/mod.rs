//! Historical dataset access.
//!
//! - CSV ingest + validation and the in-memory store (`history`)

pub mod history;

pub use history::*;
