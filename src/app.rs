//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves data/artifact locations (flags, then environment)
//! - loads the service state
//! - runs forecasts / listings / sweeps
//! - prints formatted reports or JSON payloads

use std::path::PathBuf;

use clap::Parser;
use log::error;

use crate::cli::{Cli, Command, DataArgs, ForecastArgs, HospitalsArgs, SweepArgs};
use crate::domain::{ErrorResponse, ForecastRequest, HospitalsResponse, ServiceConfig};
use crate::error::ForecastError;
use crate::report;
use crate::rng::RandomSource;

pub mod pipeline;

use pipeline::ServiceState;

/// Entry point for the `hospi` binary.
pub fn run() -> Result<(), ForecastError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Forecast(args) => handle_forecast(args),
        Command::Hospitals(args) => handle_hospitals(args),
        Command::Sweep(args) => handle_sweep(args),
    }
}

/// Resolve the runtime configuration: flags win, then environment
/// variables (a `.env` file is honored), then the conventional defaults.
fn service_config(data: &DataArgs) -> ServiceConfig {
    dotenvy::dotenv().ok();

    let history_csv = data
        .history
        .clone()
        .or_else(|| std::env::var("HOSPI_HISTORY").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("proyecciones_filtradas.csv"));
    let artifacts_dir = data
        .artifacts
        .clone()
        .or_else(|| std::env::var("HOSPI_ARTIFACTS").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("artifacts"));

    ServiceConfig {
        history_csv,
        artifacts_dir,
    }
}

fn handle_forecast(args: ForecastArgs) -> Result<(), ForecastError> {
    let config = service_config(&args.data);
    let state = ServiceState::load(&config)?;

    let facility = match &args.establecimiento {
        Some(name) => name.clone(),
        None => crate::cli::picker::prompt_for_facility(&state.history().facilities())?,
    };

    let request = ForecastRequest {
        establecimiento_nombre: facility,
        anio: args.anio,
        mes: args.mes,
        escenario: args.escenario.label().to_string(),
    };

    let mut rng = match args.seed {
        Some(seed) => RandomSource::seeded(seed),
        None => RandomSource::from_entropy(),
    };

    match pipeline::run_forecast_response(&state, &request, &mut rng) {
        Ok(response) => {
            if args.json {
                println!("{}", to_json(&response)?);
            } else {
                print!("{}", report::format_forecast_summary(&response.predicciones));
            }
            Ok(())
        }
        Err(err) => fail_request(err, args.json),
    }
}

fn handle_hospitals(args: HospitalsArgs) -> Result<(), ForecastError> {
    let config = service_config(&args.data);
    let state = ServiceState::load(&config)?;

    let response = HospitalsResponse {
        hospitales: state.history().facilities(),
    };
    if args.json {
        println!("{}", to_json(&response)?);
    } else {
        print!("{}", report::format_facilities(&response.hospitales));
    }
    Ok(())
}

fn handle_sweep(args: SweepArgs) -> Result<(), ForecastError> {
    let config = service_config(&args.data);
    let state = ServiceState::load(&config)?;

    match pipeline::sweep_forecasts(&state, args.anio, args.mes, args.escenario, args.seed) {
        Ok(results) => {
            let ranked = report::rank_by_occupancy(results);
            if args.json {
                println!("{}", to_json(&ranked)?);
            } else {
                print!("{}", report::format_sweep_rankings(&ranked, args.top));
            }
            Ok(())
        }
        Err(err) => fail_request(err, args.json),
    }
}

/// Request-boundary failure: report the structured payload, then surface
/// the error so the binary exits with the matching code.
fn fail_request(err: ForecastError, json: bool) -> Result<(), ForecastError> {
    error!("solicitud fallida: {err}");
    if json {
        let payload = ErrorResponse {
            error: err.to_string(),
        };
        println!("{}", to_json(&payload)?);
    }
    Err(err)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ForecastError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ForecastError::malformed(format!("no se pudo serializar la respuesta: {e}")))
}
