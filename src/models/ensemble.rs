//! The four-model ensemble.
//!
//! Four independently trained regressors — consultations, occupancy,
//! surgeries and emergency visits — are invoked with the identical feature
//! vector, each exactly once per request. A failure in any of them fails
//! the whole request; the ensemble never substitutes a value silently.

use std::path::Path;

use crate::error::ForecastError;
use crate::models::artifact::{FeatureList, Regressor, read_feature_list, read_model_artifact};

/// Artifact file names inside the artifacts directory.
const FEATURES_FILE: &str = "features.json";
const CONSULTAS_FILE: &str = "modelo_consultas.json";
const OCUPACION_FILE: &str = "modelo_ocupacion.json";
const CIRUGIAS_FILE: &str = "modelo_cirugias.json";
const URGENCIAS_FILE: &str = "modelo_urgencias.json";

/// Raw per-target model outputs, before any adjustment.
///
/// The surgeries value has already been mapped back from the log1p scale
/// its model is trained on.
#[derive(Debug, Clone, Copy)]
pub struct RawForecast {
    pub consultas: f64,
    pub ocupacion: f64,
    pub cirugias: f64,
    pub urgencias: f64,
}

#[derive(Debug, Clone)]
pub struct Ensemble {
    consultas: Regressor,
    ocupacion: Regressor,
    cirugias: Regressor,
    urgencias: Regressor,
}

impl Ensemble {
    pub fn new(
        consultas: Regressor,
        ocupacion: Regressor,
        cirugias: Regressor,
        urgencias: Regressor,
    ) -> Self {
        Self {
            consultas,
            ocupacion,
            cirugias,
            urgencias,
        }
    }

    /// Invoke every model exactly once with the identical feature vector.
    pub fn predict_all(&self, x: &[f64]) -> Result<RawForecast, ForecastError> {
        let consultas = self.consultas.predict(x)?;
        let ocupacion = self.ocupacion.predict(x)?;
        let cirugias = invert_target(&self.cirugias, self.cirugias.predict(x)?);
        let urgencias = invert_target(&self.urgencias, self.urgencias.predict(x)?);
        Ok(RawForecast {
            consultas,
            ocupacion,
            cirugias,
            urgencias,
        })
    }
}

fn invert_target(model: &Regressor, y: f64) -> f64 {
    if model.log1p_target() { y.exp_m1() } else { y }
}

/// Load the feature order and the four model artifacts from a directory.
pub fn load_ensemble(dir: &Path) -> Result<(FeatureList, Ensemble), ForecastError> {
    let features = read_feature_list(&dir.join(FEATURES_FILE))?;
    let order = &features.features;

    let consultas = Regressor::from_artifact(read_model_artifact(&dir.join(CONSULTAS_FILE))?, order)?;
    let ocupacion = Regressor::from_artifact(read_model_artifact(&dir.join(OCUPACION_FILE))?, order)?;
    let cirugias = Regressor::from_artifact(read_model_artifact(&dir.join(CIRUGIAS_FILE))?, order)?;
    let urgencias = Regressor::from_artifact(read_model_artifact(&dir.join(URGENCIAS_FILE))?, order)?;

    let ensemble = Ensemble::new(consultas, ocupacion, cirugias, urgencias);
    Ok((features, ensemble))
}
