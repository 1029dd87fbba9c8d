//! Command-line parsing for the hospital capacity forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the forecasting code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::Scenario;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "hospi",
    version,
    about = "Pronóstico mensual de capacidad hospitalaria (consultas, cirugías, urgencias, ocupación)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast next-period metrics for one facility.
    Forecast(ForecastArgs),
    /// List the facilities known to the historical dataset.
    Hospitals(HospitalsArgs),
    /// Forecast every known facility and rank by predicted occupancy.
    Sweep(SweepArgs),
}

/// Where the historical CSV and the model artifacts live.
#[derive(Debug, Parser, Clone)]
pub struct DataArgs {
    /// Historical dataset CSV (overrides HOSPI_HISTORY).
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Directory with model/feature artifacts (overrides HOSPI_ARTIFACTS).
    #[arg(long)]
    pub artifacts: Option<PathBuf>,
}

/// Options for a single-facility forecast.
#[derive(Debug, Parser, Clone)]
pub struct ForecastArgs {
    /// Facility name; matched case-insensitively as a substring.
    /// Prompts interactively when omitted.
    #[arg(short = 'e', long)]
    pub establecimiento: Option<String>,

    /// Target year.
    #[arg(long, default_value_t = 2026)]
    pub anio: i32,

    /// Target month (1-12).
    #[arg(long, default_value_t = 6)]
    pub mes: u32,

    /// Operating scenario applied as a multiplicative adjustment.
    #[arg(long, value_enum, default_value_t = Scenario::Base)]
    pub escenario: Scenario,

    /// Random seed for reproducible jitter (entropy-seeded when omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the JSON response payload instead of the formatted report.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub data: DataArgs,
}

/// Options for the facility listing.
#[derive(Debug, Parser, Clone)]
pub struct HospitalsArgs {
    /// Print the JSON payload instead of the numbered listing.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub data: DataArgs,
}

/// Options for the all-facility sweep.
#[derive(Debug, Parser, Clone)]
pub struct SweepArgs {
    /// Target year.
    #[arg(long, default_value_t = 2026)]
    pub anio: i32,

    /// Target month (1-12).
    #[arg(long, default_value_t = 6)]
    pub mes: u32,

    /// Operating scenario applied to every facility.
    #[arg(long, value_enum, default_value_t = Scenario::Base)]
    pub escenario: Scenario,

    /// Base random seed; each facility derives its own stream from it.
    #[arg(long)]
    pub seed: Option<u64>,

    /// How many rows of the ranking to print (0 shows everything).
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Print the ranked JSON array instead of the table.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub data: DataArgs,
}
