//! Historical dataset ingest and indexed, read-only access.
//!
//! This module turns the monthly facility CSV into a clean set of
//! `HistoricalRecord`s that are safe to forecast from.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors at startup)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Normalization**: facility names trimmed + upper-cased, dates derived
//!   as the first of the month
//! - **At most one record per (facility, year, month)**: the last CSV row
//!   wins; the displaced row is reported as a row error
//!
//! The store is immutable after load, so concurrent forecast requests can
//! share it without locking.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::HistoricalRecord;
use crate::error::ForecastError;

const REQUIRED_COLUMNS: [&str; 7] = [
    "establecimiento_nombre",
    "anio",
    "mes",
    "consultas_medicas",
    "porcentaje_ocupacion",
    "cirugias",
    "urgencias",
];

/// Facility-name values that stand for "missing" in the source extracts.
const NAME_SENTINELS: [&str; 4] = ["", "NAN", "NONE", "NULL"];

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub facility: Option<String>,
    pub message: String,
}

/// Summary stats about the rows actually loaded.
#[derive(Debug, Clone)]
pub struct HistoryStats {
    pub rows_read: usize,
    pub rows_used: usize,
    pub n_facilities: usize,
    pub year_min: i32,
    pub year_max: i32,
}

/// Indexed, read-only store of historical records.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    records: Vec<HistoricalRecord>,
    stats: HistoryStats,
    row_errors: Vec<RowError>,
}

/// Normalize a facility name or query the way the dataset stores names.
pub fn normalize_facility(name: &str) -> String {
    name.trim().to_uppercase()
}

impl HistoryStore {
    /// Load and normalize the historical CSV.
    pub fn load(path: &Path) -> Result<Self, ForecastError> {
        let file = File::open(path).map_err(|e| {
            ForecastError::history(format!("no se pudo abrir '{}': {e}", path.display()))
        })?;
        Self::load_from_reader(file)
    }

    /// Load from any reader; `load` is a thin file wrapper around this.
    pub fn load_from_reader<R: Read>(reader: R) -> Result<Self, ForecastError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| ForecastError::history(format!("cabeceras ilegibles: {e}")))?
            .clone();
        let header_map = build_header_map(&headers);

        for column in REQUIRED_COLUMNS {
            if !header_map.contains_key(column) {
                return Err(ForecastError::history(format!(
                    "falta la columna requerida '{column}'"
                )));
            }
        }

        let mut records: Vec<HistoricalRecord> = Vec::new();
        let mut index: HashMap<(String, i32, u32), usize> = HashMap::new();
        let mut row_errors = Vec::new();
        let mut rows_read = 0usize;

        for (i, row) in csv_reader.records().enumerate() {
            // Header is line 1; data starts at line 2.
            let line = i + 2;
            rows_read += 1;

            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    row_errors.push(RowError {
                        line,
                        facility: None,
                        message: format!("fila ilegible: {e}"),
                    });
                    continue;
                }
            };

            match parse_row(&row, &header_map) {
                Ok(record) => {
                    let key = (record.facility.clone(), record.anio, record.mes);
                    if let Some(&existing) = index.get(&key) {
                        row_errors.push(RowError {
                            line,
                            facility: Some(record.facility.clone()),
                            message: format!(
                                "registro duplicado para {}-{:02}; la fila posterior reemplaza a la anterior",
                                record.anio, record.mes
                            ),
                        });
                        records[existing] = record;
                    } else {
                        index.insert(key, records.len());
                        records.push(record);
                    }
                }
                Err(message) => {
                    let facility = field(&row, &header_map, "establecimiento_nombre")
                        .map(normalize_facility);
                    row_errors.push(RowError {
                        line,
                        facility,
                        message,
                    });
                }
            }
        }

        if records.is_empty() {
            return Err(ForecastError::history(
                "el archivo no contiene filas utilizables".to_string(),
            ));
        }

        let year_min = records.iter().map(|r| r.anio).min().unwrap_or(0);
        let year_max = records.iter().map(|r| r.anio).max().unwrap_or(0);
        let n_facilities = records
            .iter()
            .map(|r| r.facility.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        let stats = HistoryStats {
            rows_read,
            rows_used: records.len(),
            n_facilities,
            year_min,
            year_max,
        };

        Ok(Self {
            records,
            stats,
            row_errors,
        })
    }

    /// Build a store directly from records (used by embedding callers).
    pub fn from_records(records: Vec<HistoricalRecord>) -> Result<Self, ForecastError> {
        if records.is_empty() {
            return Err(ForecastError::history("sin registros".to_string()));
        }
        let year_min = records.iter().map(|r| r.anio).min().unwrap_or(0);
        let year_max = records.iter().map(|r| r.anio).max().unwrap_or(0);
        let n_facilities = records
            .iter()
            .map(|r| r.facility.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let rows = records.len();
        Ok(Self {
            records,
            stats: HistoryStats {
                rows_read: rows,
                rows_used: rows,
                n_facilities,
                year_min,
                year_max,
            },
            row_errors: Vec::new(),
        })
    }

    /// Find the chronologically last record whose facility name contains the
    /// normalized query. Substring matching is what the existing clients
    /// rely on (an empty query matches every facility).
    pub fn find_latest(&self, query: &str) -> Result<&HistoricalRecord, ForecastError> {
        let normalized = normalize_facility(query);
        self.records
            .iter()
            .filter(|r| r.facility.contains(&normalized))
            .max_by_key(|r| r.fecha)
            .ok_or(ForecastError::FacilityNotFound { query: normalized })
    }

    /// Distinct facility names, normalized, sorted ascending.
    pub fn facilities(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.facility.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// (min, max) year across the loaded records, for `anio_norm`.
    pub fn year_span(&self) -> (i32, i32) {
        (self.stats.year_min, self.stats.year_max)
    }

    pub fn stats(&self) -> &HistoryStats {
        &self.stats
    }

    pub fn row_errors(&self) -> &[RowError] {
        &self.row_errors
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().to_lowercase(), idx))
        .collect()
}

fn field<'a>(
    row: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    header_map.get(name).and_then(|&idx| row.get(idx))
}

fn parse_row(
    row: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<HistoricalRecord, String> {
    let raw_name = field(row, header_map, "establecimiento_nombre").unwrap_or("");
    let facility = normalize_facility(raw_name);
    if NAME_SENTINELS.contains(&facility.as_str()) {
        return Err(format!("nombre de establecimiento ausente ('{raw_name}')"));
    }

    let anio = parse_int(field(row, header_map, "anio"), "anio")?;
    let mes = parse_int(field(row, header_map, "mes"), "mes")? as u32;
    if !(1..=12).contains(&mes) {
        return Err(format!("mes fuera de rango: {mes}"));
    }
    let fecha = NaiveDate::from_ymd_opt(anio, mes, 1)
        .ok_or_else(|| format!("fecha inválida: {anio}-{mes:02}"))?;

    Ok(HistoricalRecord {
        facility,
        anio,
        mes,
        fecha,
        consultas_medicas: parse_metric(field(row, header_map, "consultas_medicas")),
        porcentaje_ocupacion: parse_metric(field(row, header_map, "porcentaje_ocupacion")),
        cirugias: parse_metric(field(row, header_map, "cirugias")),
        urgencias: parse_metric(field(row, header_map, "urgencias")),
    })
}

fn parse_int(value: Option<&str>, name: &str) -> Result<i32, String> {
    let value = value.unwrap_or("").trim();
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .map(|v| v as i32)
        .ok_or_else(|| format!("'{name}' no es numérico: '{value}'"))
}

/// Metric columns may be empty in the source extracts; a missing value is
/// NaN so the lag floor rule can smooth it later.
fn parse_metric(value: Option<&str>) -> f64 {
    let value = value.unwrap_or("").trim();
    if value.is_empty() {
        return f64::NAN;
    }
    value.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
establecimiento_nombre,anio,mes,consultas_medicas,porcentaje_ocupacion,cirugias,urgencias
  hospital regional ,2023,11,420,61.5,18,130
HOSPITAL REGIONAL,2023,12,455,64.0,21,140
HOSPITAL DEL NIÑO,2024,1,310,58.2,9,95
nan,2024,1,100,50.0,5,40
HOSPITAL DEL NIÑO,2022,6,280,,7,
";

    fn store() -> HistoryStore {
        HistoryStore::load_from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn names_are_normalized_and_sentinels_skipped() {
        let store = store();
        assert_eq!(
            store.facilities(),
            vec![
                "HOSPITAL DEL NIÑO".to_string(),
                "HOSPITAL REGIONAL".to_string()
            ]
        );
        // The "nan" row is reported, not loaded.
        assert!(
            store
                .row_errors()
                .iter()
                .any(|e| e.message.contains("ausente")),
            "expected a sentinel-name row error"
        );
    }

    #[test]
    fn find_latest_matches_substring_and_picks_latest_date() {
        let store = store();
        let record = store.find_latest("regional").unwrap();
        assert_eq!(record.facility, "HOSPITAL REGIONAL");
        assert_eq!((record.anio, record.mes), (2023, 12));
    }

    #[test]
    fn empty_query_matches_everything() {
        let store = store();
        let record = store.find_latest("").unwrap();
        // Latest date overall is HOSPITAL DEL NIÑO 2024-01.
        assert_eq!(record.facility, "HOSPITAL DEL NIÑO");
    }

    #[test]
    fn unknown_facility_is_not_found() {
        let err = store().find_latest("CLINICA SUR").unwrap_err();
        assert!(matches!(
            err,
            ForecastError::FacilityNotFound { ref query } if query == "CLINICA SUR"
        ));
    }

    #[test]
    fn missing_metrics_are_nan_not_errors() {
        let store = store();
        let record = store.find_latest("NIÑO").unwrap();
        // Latest NIÑO row is 2024-01 with full metrics; the 2022 row keeps
        // NaN for its empty columns.
        assert_eq!((record.anio, record.mes), (2024, 1));
        let older = store
            .records
            .iter()
            .find(|r| r.anio == 2022)
            .expect("2022 row loaded");
        assert!(older.porcentaje_ocupacion.is_nan());
        assert!(older.urgencias.is_nan());
    }

    #[test]
    fn duplicate_key_keeps_last_row_and_reports() {
        let csv = "\
establecimiento_nombre,anio,mes,consultas_medicas,porcentaje_ocupacion,cirugias,urgencias
HOSPITAL A,2024,3,100,50,10,30
HOSPITAL A,2024,3,200,60,12,35
";
        let store = HistoryStore::load_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(store.stats().rows_used, 1);
        let record = store.find_latest("HOSPITAL A").unwrap();
        assert_eq!(record.consultas_medicas, 200.0);
        assert!(
            store
                .row_errors()
                .iter()
                .any(|e| e.message.contains("duplicado"))
        );
    }

    #[test]
    fn year_span_covers_all_loaded_rows() {
        assert_eq!(store().year_span(), (2022, 2024));
    }

    #[test]
    fn missing_required_column_fails_load() {
        let csv = "establecimiento_nombre,anio,mes\nA,2024,1\n";
        let err = HistoryStore::load_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ForecastError::History(_)));
    }
}
