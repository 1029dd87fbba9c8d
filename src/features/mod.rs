//! Feature derivation for the forecast models.
//!
//! Every model consumes the same fixed-order numeric vector. This module
//! derives the three feature families and aligns them onto the externally
//! supplied feature order:
//!
//! - lag features copied from the most recent historical record, with a
//!   smoothing floor for missing or degenerate values
//! - calendar one-hots (holiday months, covid years, climate season)
//! - cyclic month encoding plus a normalized year
//!
//! Functions here are small and pure (given the injected random source) so
//! the pipeline code stays generic.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::domain::HistoricalRecord;
use crate::rng::RandomSource;

/// Months containing at least one public holiday in the training data
/// (New Year, Memoria, Easter, Labor Day, Güemes/Bandera, Independencia,
/// San Martín, Diversidad Cultural, Inmaculada/Navidad).
const HOLIDAY_MONTHS: [u32; 9] = [1, 3, 4, 5, 6, 7, 8, 10, 12];

/// Lag features from the last observed month.
///
/// The floor rule keeps degenerate near-zero lags from destabilizing the
/// models: non-positive or missing values become a small uniform draw, and
/// values below 2 are scaled up. This is a smoothing heuristic, not
/// observed data.
pub fn lag_features(last: &HistoricalRecord, rng: &mut RandomSource) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    out.insert(
        "consultas_lag1".to_string(),
        smooth_lag(last.consultas_medicas, rng),
    );
    out.insert(
        "ocupacion_lag1".to_string(),
        smooth_lag(last.porcentaje_ocupacion, rng),
    );
    out.insert("cirugias_lag1".to_string(), smooth_lag(last.cirugias, rng));
    out.insert("urgencias_lag1".to_string(), smooth_lag(last.urgencias, rng));
    out
}

fn smooth_lag(value: f64, rng: &mut RandomSource) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        rng.uniform(1.0, 10.0)
    } else if value < 2.0 {
        value * rng.uniform(1.5, 2.5)
    } else {
        value
    }
}

/// Calendar one-hots: holidays, covid years and the climate season.
///
/// The three climate flags partition the twelve months: exactly one of
/// them is 1 for any month.
pub fn calendar_features(anio: i32, mes: u32) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    out.insert(
        "feriados".to_string(),
        if HOLIDAY_MONTHS.contains(&mes) { 1.0 } else { 0.0 },
    );
    out.insert(
        "covid_dummy".to_string(),
        if anio == 2020 || anio == 2021 { 1.0 } else { 0.0 },
    );
    out.insert(
        "clima_calor".to_string(),
        if matches!(mes, 12 | 1 | 2) { 1.0 } else { 0.0 },
    );
    out.insert(
        "clima_templado".to_string(),
        if matches!(mes, 3..=5 | 9..=11) { 1.0 } else { 0.0 },
    );
    out.insert(
        "clima_frio".to_string(),
        if matches!(mes, 6..=8) { 1.0 } else { 0.0 },
    );
    out
}

/// Cyclic month encoding plus the year normalized over the historical span.
///
/// The sine/cosine pair avoids a December-to-January discontinuity. When the
/// dataset spans a single year the normalization denominator is zero, so
/// `anio_norm` defaults to 0 instead of propagating NaN.
pub fn temporal_features(anio: i32, mes: u32, year_span: (i32, i32)) -> HashMap<String, f64> {
    let angle = 2.0 * PI * f64::from(mes) / 12.0;
    let (year_min, year_max) = year_span;
    let anio_norm = if year_max > year_min {
        f64::from(anio - year_min) / f64::from(year_max - year_min)
    } else {
        0.0
    };

    let mut out = HashMap::new();
    out.insert("sin_mes".to_string(), angle.sin());
    out.insert("cos_mes".to_string(), angle.cos());
    out.insert("anio_norm".to_string(), anio_norm);
    out
}

/// Merge all feature families for one request.
pub fn build(
    anio: i32,
    mes: u32,
    last: &HistoricalRecord,
    year_span: (i32, i32),
    rng: &mut RandomSource,
) -> HashMap<String, f64> {
    let mut out = lag_features(last, rng);
    out.extend(calendar_features(anio, mes));
    out.extend(temporal_features(anio, mes, year_span));
    out
}

/// Align a computed feature map onto the model feature order.
///
/// Features the models do not expect are dropped; expected features that
/// were not computed are zero-filled.
pub fn align(features: &HashMap<String, f64>, order: &[String]) -> Vec<f64> {
    order
        .iter()
        .map(|name| features.get(name).copied().unwrap_or(0.0))
        .collect()
}
