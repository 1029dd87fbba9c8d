//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they
//! can be:
//!
//! - used in-memory during forecasting
//! - rendered to the JSON payloads the transport expects
//! - reloaded later for comparisons or batch reports
//!
//! Wire field names stay in Spanish: they are the contract with the
//! existing clients of the service.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Operating-condition scenario applied as a multiplicative adjustment.
///
/// Unknown or empty labels resolve to `Base`, which applies no multiplier
/// and is reported back as `"base"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    #[default]
    Base,
    #[value(name = "alta_demanda")]
    AltaDemanda,
    #[value(name = "brote_covid")]
    BroteCovid,
    Invierno,
    Verano,
    #[value(name = "paro_medico")]
    ParoMedico,
    Emergencia,
}

impl Scenario {
    /// Resolve a free-text scenario label. Unknown labels are `Base`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "alta_demanda" => Scenario::AltaDemanda,
            "brote_covid" => Scenario::BroteCovid,
            "invierno" => Scenario::Invierno,
            "verano" => Scenario::Verano,
            "paro_medico" => Scenario::ParoMedico,
            "emergencia" => Scenario::Emergencia,
            _ => Scenario::Base,
        }
    }

    /// Multiplier applied to the count predictions; `None` for `Base`.
    ///
    /// Occupancy uses this factor plus 0.2 (see the adjustment pipeline).
    pub fn factor(self) -> Option<f64> {
        match self {
            Scenario::Base => None,
            Scenario::AltaDemanda => Some(1.4),
            Scenario::BroteCovid => Some(1.6),
            Scenario::Invierno => Some(1.2),
            Scenario::Verano => Some(0.8),
            Scenario::ParoMedico => Some(0.6),
            Scenario::Emergencia => Some(1.8),
        }
    }

    /// Wire label reported back in responses.
    pub fn label(self) -> &'static str {
        match self {
            Scenario::Base => "base",
            Scenario::AltaDemanda => "alta_demanda",
            Scenario::BroteCovid => "brote_covid",
            Scenario::Invierno => "invierno",
            Scenario::Verano => "verano",
            Scenario::ParoMedico => "paro_medico",
            Scenario::Emergencia => "emergencia",
        }
    }
}

/// Alert level derived from the final occupancy prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertLevel {
    Normal,
    Alta,
    #[serde(rename = "Crítica")]
    Critica,
}

impl AlertLevel {
    pub fn display_name(self) -> &'static str {
        match self {
            AlertLevel::Normal => "Normal",
            AlertLevel::Alta => "Alta",
            AlertLevel::Critica => "Crítica",
        }
    }
}

/// Qualitative confidence bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceBand {
    Alta,
    Media,
    Baja,
}

impl ConfidenceBand {
    pub fn display_name(self) -> &'static str {
        match self {
            ConfidenceBand::Alta => "Alta",
            ConfidenceBand::Media => "Media",
            ConfidenceBand::Baja => "Baja",
        }
    }
}

/// One historical row per (facility, year, month).
///
/// Records are immutable once loaded; the facility name is normalized
/// (trimmed, upper-cased) at ingest and `fecha` is the first of the month.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRecord {
    pub facility: String,
    pub anio: i32,
    pub mes: u32,
    pub fecha: NaiveDate,
    pub consultas_medicas: f64,
    pub porcentaje_ocupacion: f64,
    pub cirugias: f64,
    pub urgencias: f64,
}

/// Inbound forecast request, as handed over by the transport.
///
/// All fields are optional on the wire with the documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRequest {
    #[serde(default)]
    pub establecimiento_nombre: String,
    #[serde(default = "default_anio")]
    pub anio: i32,
    #[serde(default = "default_mes")]
    pub mes: u32,
    #[serde(default)]
    pub escenario: String,
}

fn default_anio() -> i32 {
    2026
}

fn default_mes() -> u32 {
    6
}

impl ForecastRequest {
    pub fn scenario(&self) -> Scenario {
        Scenario::parse(&self.escenario)
    }
}

/// Fully assembled forecast for one facility and one target month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub anio: i32,
    pub mes: u32,
    pub fecha_prediccion: String,
    pub establecimiento_nombre: String,
    pub consultas_pred: i64,
    pub cirugias_pred: i64,
    pub urgencias_pred: i64,
    pub porcentaje_ocupacion_pred: f64,
    pub camas_ocupadas: i64,
    pub camas_libres: i64,
    pub alerta: bool,
    pub nivel_alerta: AlertLevel,
    pub confianza: f64,
    pub nivel_confianza: ConfidenceBand,
    pub escenario: String,
    pub recomendacion: String,
    pub timestamp: String,
}

/// Success payload for a forecast request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub mensaje: String,
    pub predicciones: ForecastResult,
}

/// Payload for the facility listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalsResponse {
    pub hospitales: Vec<String>,
}

/// Failure payload; the error kind decides the transport status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Resolved runtime configuration (CLI flags plus environment defaults).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Historical dataset CSV.
    pub history_csv: PathBuf,
    /// Directory holding the four model artifacts and the feature list.
    pub artifacts_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_parse_is_case_insensitive_and_trims() {
        assert_eq!(Scenario::parse("  INVIERNO "), Scenario::Invierno);
        assert_eq!(Scenario::parse("brote_covid"), Scenario::BroteCovid);
    }

    #[test]
    fn unknown_or_empty_scenario_is_base() {
        assert_eq!(Scenario::parse(""), Scenario::Base);
        assert_eq!(Scenario::parse("tsunami"), Scenario::Base);
        assert_eq!(Scenario::Base.factor(), None);
        assert_eq!(Scenario::parse("tsunami").label(), "base");
    }

    #[test]
    fn scenario_factor_table_is_exact() {
        assert_eq!(Scenario::AltaDemanda.factor(), Some(1.4));
        assert_eq!(Scenario::BroteCovid.factor(), Some(1.6));
        assert_eq!(Scenario::Invierno.factor(), Some(1.2));
        assert_eq!(Scenario::Verano.factor(), Some(0.8));
        assert_eq!(Scenario::ParoMedico.factor(), Some(0.6));
        assert_eq!(Scenario::Emergencia.factor(), Some(1.8));
    }

    #[test]
    fn request_defaults_apply_on_missing_fields() {
        let request: ForecastRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.anio, 2026);
        assert_eq!(request.mes, 6);
        assert_eq!(request.establecimiento_nombre, "");
        assert_eq!(request.scenario(), Scenario::Base);
    }

    #[test]
    fn critical_alert_serializes_with_accent() {
        let json = serde_json::to_string(&AlertLevel::Critica).unwrap();
        assert_eq!(json, "\"Crítica\"");
    }
}
