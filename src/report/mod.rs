//! Alert classification, recommendations, confidence and result assembly.
//!
//! Everything here is a pure function of the adjusted forecast (plus the
//! scenario), kept apart from formatting so the pipeline stays testable.

use chrono::Local;

use crate::adjust::AdjustedForecast;
use crate::domain::{AlertLevel, ConfidenceBand, ForecastResult, Scenario};

pub mod format;

pub use format::*;

/// Occupancy (%) at or above which the critical alert fires.
const CRITICAL_OCCUPANCY: f64 = 85.0;
/// Occupancy (%) at or above which the high alert fires.
const HIGH_OCCUPANCY: f64 = 70.0;

/// One-shot alert classification from the final occupancy.
pub fn alert_level(ocupacion: f64) -> (bool, AlertLevel) {
    if ocupacion >= CRITICAL_OCCUPANCY {
        (true, AlertLevel::Critica)
    } else if ocupacion >= HIGH_OCCUPANCY {
        (true, AlertLevel::Alta)
    } else {
        (false, AlertLevel::Normal)
    }
}

/// Recommendation text.
///
/// At or above the critical threshold the occupancy message always wins.
/// Below it the message depends only on the scenario — the `Alta` alert
/// band carries no message of its own.
pub fn recommendation(ocupacion: f64, scenario: Scenario) -> &'static str {
    if ocupacion >= CRITICAL_OCCUPANCY {
        return "Alta ocupación. Redistribuir pacientes y optimizar recursos.";
    }
    match scenario {
        Scenario::BroteCovid | Scenario::Emergencia => {
            "Reforzar personal y aumentar stock de insumos críticos."
        }
        Scenario::Invierno | Scenario::AltaDemanda => {
            "Revisar turnos y disponibilidad por incremento estacional."
        }
        _ => "Espacio disponible. Se pueden aumentar cirugías o consultas.",
    }
}

/// Confidence score and band.
///
/// Confidence peaks when occupancy sits near the 50% midpoint and degrades
/// symmetrically toward either extreme — a heuristic proxy, not a
/// statistical interval.
pub fn confidence(ocupacion: f64) -> (f64, ConfidenceBand) {
    let value = round2((100.0 - (ocupacion - 50.0).abs()).clamp(10.0, 95.0));
    let band = if value > 75.0 {
        ConfidenceBand::Alta
    } else if value > 50.0 {
        ConfidenceBand::Media
    } else {
        ConfidenceBand::Baja
    };
    (value, band)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Assemble the final forecast record for one request.
pub fn assemble_result(
    facility: &str,
    anio: i32,
    mes: u32,
    adjusted: &AdjustedForecast,
    scenario: Scenario,
) -> ForecastResult {
    let (alerta, nivel_alerta) = alert_level(adjusted.ocupacion);
    let (confianza, nivel_confianza) = confidence(adjusted.ocupacion);

    ForecastResult {
        anio,
        mes,
        fecha_prediccion: format!("{anio}-{mes:02}-01"),
        establecimiento_nombre: facility.to_string(),
        consultas_pred: adjusted.consultas.round() as i64,
        cirugias_pred: adjusted.cirugias.round() as i64,
        urgencias_pred: adjusted.urgencias.round() as i64,
        porcentaje_ocupacion_pred: round2(adjusted.ocupacion),
        camas_ocupadas: adjusted.camas_ocupadas,
        camas_libres: adjusted.camas_libres,
        alerta,
        nivel_alerta,
        confianza,
        nivel_confianza,
        escenario: scenario.label().to_string(),
        recomendacion: recommendation(adjusted.ocupacion, scenario).to_string(),
        timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}
