//! Shared forecast pipeline used by every front-end command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! feature build -> ensemble predict -> adjustment -> alert/confidence ->
//! assembled result
//!
//! The front-end commands then focus on presentation (formatted report vs
//! JSON payload).

use std::path::Path;

use log::{info, warn};
use rayon::prelude::*;

use crate::adjust;
use crate::data::HistoryStore;
use crate::domain::{
    ForecastRequest, ForecastResponse, ForecastResult, Scenario, ServiceConfig,
};
use crate::error::ForecastError;
use crate::features;
use crate::models::{Ensemble, load_ensemble};
use crate::report;
use crate::rng::RandomSource;

/// Immutable process-wide state, built once at startup and only read
/// afterwards. Forecasting borrows it immutably, so concurrent requests
/// need no locking.
pub struct ServiceState {
    history: HistoryStore,
    forecasting: Option<ForecastingState>,
}

struct ForecastingState {
    feature_order: Vec<String>,
    ensemble: Ensemble,
}

impl ServiceState {
    /// Load history and model artifacts.
    ///
    /// An unusable history is fatal. Missing or broken model artifacts
    /// degrade the service instead: the facility catalog keeps working and
    /// every forecast request fails fast with `ModelUnavailable`.
    pub fn load(config: &ServiceConfig) -> Result<Self, ForecastError> {
        let history = HistoryStore::load(&config.history_csv)?;
        let stats = history.stats();
        info!(
            "histórico cargado: {} filas utilizables de {} ({} establecimientos, {}-{})",
            stats.rows_used, stats.rows_read, stats.n_facilities, stats.year_min, stats.year_max
        );
        if !history.row_errors().is_empty() {
            warn!(
                "{} filas descartadas u observadas durante la carga",
                history.row_errors().len()
            );
        }

        let forecasting = match load_artifacts(&config.artifacts_dir) {
            Ok(forecasting) => {
                info!(
                    "artefactos de modelo cargados ({} features)",
                    forecasting.feature_order.len()
                );
                Some(forecasting)
            }
            Err(err) => {
                warn!("servicio degradado, solo catálogo: {err}");
                None
            }
        };

        Ok(Self {
            history,
            forecasting,
        })
    }

    /// Build a state from already-loaded parts (embedding callers, tests).
    pub fn new(history: HistoryStore, parts: Option<(Vec<String>, Ensemble)>) -> Self {
        Self {
            history,
            forecasting: parts.map(|(feature_order, ensemble)| ForecastingState {
                feature_order,
                ensemble,
            }),
        }
    }

    /// Whether forecast requests can be served (readiness check).
    pub fn can_forecast(&self) -> bool {
        self.forecasting.is_some()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }
}

fn load_artifacts(dir: &Path) -> Result<ForecastingState, ForecastError> {
    let (features, ensemble) = load_ensemble(dir)?;
    Ok(ForecastingState {
        feature_order: features.features,
        ensemble,
    })
}

/// Execute the full forecast pipeline for one request.
pub fn run_forecast(
    state: &ServiceState,
    request: &ForecastRequest,
    rng: &mut RandomSource,
) -> Result<ForecastResult, ForecastError> {
    if !(1..=12).contains(&request.mes) {
        return Err(ForecastError::malformed(format!(
            "mes fuera de rango: {}",
            request.mes
        )));
    }

    // Readiness first: a degraded service fails every forecast fast.
    let Some(forecasting) = &state.forecasting else {
        return Err(ForecastError::model(
            "artefactos no cargados al iniciar el servicio".to_string(),
        ));
    };

    let record = state.history.find_latest(&request.establecimiento_nombre)?;
    let scenario = request.scenario();

    let computed = features::build(
        request.anio,
        request.mes,
        record,
        state.history.year_span(),
        rng,
    );
    let vector = features::align(&computed, &forecasting.feature_order);

    let raw = forecasting.ensemble.predict_all(&vector)?;
    let adjusted = adjust::adjust(raw, scenario, rng);

    Ok(report::assemble_result(
        &record.facility,
        request.anio,
        request.mes,
        &adjusted,
        scenario,
    ))
}

/// Wrap a forecast result in the transport success payload.
pub fn run_forecast_response(
    state: &ServiceState,
    request: &ForecastRequest,
    rng: &mut RandomSource,
) -> Result<ForecastResponse, ForecastError> {
    let predicciones = run_forecast(state, request, rng)?;
    Ok(ForecastResponse {
        mensaje: "Predicción realizada correctamente.".to_string(),
        predicciones,
    })
}

/// Forecast every known facility for one target month.
///
/// Facilities run in parallel; each gets its own random source, derived
/// from the base seed and the facility name so a fixed seed reproduces the
/// whole sweep regardless of scheduling order.
pub fn sweep_forecasts(
    state: &ServiceState,
    anio: i32,
    mes: u32,
    scenario: Scenario,
    seed: Option<u64>,
) -> Result<Vec<ForecastResult>, ForecastError> {
    let facilities = state.history.facilities();
    facilities
        .par_iter()
        .map(|name| {
            let mut rng = match seed {
                Some(seed) => RandomSource::derive(seed, name),
                None => RandomSource::from_entropy(),
            };
            let request = ForecastRequest {
                establecimiento_nombre: name.clone(),
                anio,
                mes,
                escenario: scenario.label().to_string(),
            };
            run_forecast(state, &request, &mut rng)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjust::TOTAL_BEDS;
    use crate::domain::HistoricalRecord;
    use crate::models::{ModelArtifact, Regressor};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn history() -> HistoryStore {
        let record = |facility: &str, anio: i32, mes: u32, ocupacion: f64| HistoricalRecord {
            facility: facility.to_string(),
            anio,
            mes,
            fecha: NaiveDate::from_ymd_opt(anio, mes, 1).unwrap(),
            consultas_medicas: 420.0,
            porcentaje_ocupacion: ocupacion,
            cirugias: 18.0,
            urgencias: 130.0,
        };
        HistoryStore::from_records(vec![
            record("HOSPITAL X", 2024, 5, 55.0),
            record("HOSPITAL X", 2024, 6, 60.0),
            record("CLINICA SUR", 2024, 6, 48.0),
        ])
        .unwrap()
    }

    fn feature_order() -> Vec<String> {
        [
            "anio_norm",
            "sin_mes",
            "cos_mes",
            "consultas_lag1",
            "ocupacion_lag1",
            "cirugias_lag1",
            "urgencias_lag1",
            "feriados",
            "covid_dummy",
            "clima_calor",
            "clima_templado",
            "clima_frio",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }

    fn constant_ensemble() -> Ensemble {
        let constant = |target: &str, intercept: f64| {
            Regressor::from_artifact(
                ModelArtifact {
                    target: target.to_string(),
                    intercept,
                    coefficients: HashMap::new(),
                    log1p_target: false,
                },
                &feature_order(),
            )
            .unwrap()
        };
        Ensemble::new(
            constant("consultas", 350.0),
            constant("ocupacion", 8.0),
            constant("cirugias", 15.0),
            constant("urgencias", 110.0),
        )
    }

    fn ready_state() -> ServiceState {
        ServiceState::new(history(), Some((feature_order(), constant_ensemble())))
    }

    fn request(facility: &str, mes: u32, escenario: &str) -> ForecastRequest {
        ForecastRequest {
            establecimiento_nombre: facility.to_string(),
            anio: 2026,
            mes,
            escenario: escenario.to_string(),
        }
    }

    #[test]
    fn winter_forecast_end_to_end() {
        let state = ready_state();
        let mut rng = RandomSource::seeded(42);
        let result = run_forecast(&state, &request("hospital x", 7, "invierno"), &mut rng).unwrap();

        assert_eq!(result.establecimiento_nombre, "HOSPITAL X");
        assert_eq!(result.fecha_prediccion, "2026-07-01");
        assert_eq!(result.escenario, "invierno");
        assert!(
            (0.0..=100.0).contains(&result.porcentaje_ocupacion_pred),
            "occupancy {}",
            result.porcentaje_ocupacion_pred
        );
        assert_eq!(result.camas_ocupadas + result.camas_libres, TOTAL_BEDS);
        assert!(result.consultas_pred > 0);
        assert!((10.0..=95.0).contains(&result.confianza));
    }

    #[test]
    fn fixed_seed_reproduces_the_forecast() {
        let state = ready_state();
        let mut a = RandomSource::seeded(7);
        let mut b = RandomSource::seeded(7);
        let first = run_forecast(&state, &request("HOSPITAL X", 6, ""), &mut a).unwrap();
        let second = run_forecast(&state, &request("HOSPITAL X", 6, ""), &mut b).unwrap();
        assert_eq!(
            first.porcentaje_ocupacion_pred,
            second.porcentaje_ocupacion_pred
        );
        assert_eq!(first.consultas_pred, second.consultas_pred);
    }

    #[test]
    fn unknown_facility_is_not_found() {
        let state = ready_state();
        let mut rng = RandomSource::seeded(1);
        let err = run_forecast(&state, &request("HOSPITAL NORTE", 6, ""), &mut rng).unwrap_err();
        assert!(matches!(err, ForecastError::FacilityNotFound { .. }));
    }

    #[test]
    fn month_out_of_range_is_malformed() {
        let state = ready_state();
        let mut rng = RandomSource::seeded(1);
        let err = run_forecast(&state, &request("HOSPITAL X", 13, ""), &mut rng).unwrap_err();
        assert!(matches!(err, ForecastError::MalformedRequest(_)));
    }

    #[test]
    fn degraded_state_fails_forecasts_but_keeps_catalog() {
        let state = ServiceState::new(history(), None);
        assert!(!state.can_forecast());

        let mut rng = RandomSource::seeded(1);
        let err = run_forecast(&state, &request("HOSPITAL X", 6, ""), &mut rng).unwrap_err();
        assert!(matches!(err, ForecastError::ModelUnavailable(_)));

        // Catalog still answers.
        assert_eq!(
            state.history().facilities(),
            vec!["CLINICA SUR".to_string(), "HOSPITAL X".to_string()]
        );
    }

    #[test]
    fn sweep_covers_every_facility_reproducibly() {
        let state = ready_state();
        let first = sweep_forecasts(&state, 2026, 6, Scenario::Base, Some(42)).unwrap();
        let second = sweep_forecasts(&state, 2026, 6, Scenario::Base, Some(42)).unwrap();

        assert_eq!(first.len(), 2);
        let occ =
            |results: &[ForecastResult]| -> Vec<f64> {
                results.iter().map(|r| r.porcentaje_ocupacion_pred).collect()
            };
        assert_eq!(occ(&first), occ(&second));
    }

    #[test]
    fn response_wraps_result_with_message() {
        let state = ready_state();
        let mut rng = RandomSource::seeded(5);
        let response =
            run_forecast_response(&state, &request("CLINICA", 6, ""), &mut rng).unwrap();
        assert_eq!(response.mensaje, "Predicción realizada correctamente.");
        assert_eq!(response.predicciones.establecimiento_nombre, "CLINICA SUR");
    }
}
