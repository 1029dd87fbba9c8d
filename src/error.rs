//! Crate-wide error taxonomy.
//!
//! Every failure a forecast request can hit maps onto one of these variants,
//! so the request boundary can build a structured `{"error": ...}` payload
//! and the binary can report a stable exit code:
//!
//! - `2` — malformed input or configuration
//! - `3` — facility not found
//! - `4` — internal failure (model artifacts, history, prediction)
//!
//! Display strings are client-facing and therefore in Spanish, matching the
//! rest of the wire vocabulary.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ForecastError {
    /// No historical record matched the requested facility.
    #[error("No se encontraron datos para {query}.")]
    FacilityNotFound { query: String },

    /// A model or feature artifact failed to load or produced an unusable
    /// prediction. The service keeps answering catalog requests while every
    /// forecast request fails with this variant.
    #[error("Modelo no disponible: {0}")]
    ModelUnavailable(String),

    /// The request itself is invalid (month out of range, feature mapping
    /// inconsistent with the loaded artifacts).
    #[error("Solicitud inválida: {0}")]
    MalformedRequest(String),

    /// The historical dataset could not be loaded or contains no usable
    /// rows. Unlike model artifacts, this is fatal at startup: nothing in
    /// the service can answer without history.
    #[error("Histórico no disponible: {0}")]
    History(String),
}

impl ForecastError {
    pub fn model(message: impl Into<String>) -> Self {
        ForecastError::ModelUnavailable(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        ForecastError::MalformedRequest(message.into())
    }

    pub fn history(message: impl Into<String>) -> Self {
        ForecastError::History(message.into())
    }

    /// Process exit code for the binary front-end.
    pub fn exit_code(&self) -> u8 {
        match self {
            ForecastError::MalformedRequest(_) => 2,
            ForecastError::FacilityNotFound { .. } => 3,
            ForecastError::ModelUnavailable(_) | ForecastError::History(_) => 4,
        }
    }
}
