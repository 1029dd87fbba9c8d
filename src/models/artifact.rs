//! Model and feature artifacts.
//!
//! Each regressor ships as a JSON artifact holding an intercept and one
//! coefficient per feature name; a separate feature-list artifact fixes the
//! input order every model expects. Artifacts are the portable hand-off
//! from the training side: the service never retrains or validates them, it
//! only restores and evaluates.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Ordered feature names consumed by every model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureList {
    pub features: Vec<String>,
}

/// On-disk shape of a trained linear regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Target column the model was trained on (informational).
    pub target: String,
    pub intercept: f64,
    pub coefficients: HashMap<String, f64>,
    /// True when the model was trained on a log1p-transformed target; the
    /// ensemble inverts with `exp_m1` after prediction.
    #[serde(default)]
    pub log1p_target: bool,
}

/// A regressor resolved against the feature order, ready to evaluate.
#[derive(Debug, Clone)]
pub struct Regressor {
    target: String,
    intercept: f64,
    weights: DVector<f64>,
    log1p_target: bool,
}

pub fn read_feature_list(path: &Path) -> Result<FeatureList, ForecastError> {
    let file = File::open(path).map_err(|e| {
        ForecastError::model(format!("no se pudo abrir '{}': {e}", path.display()))
    })?;
    let list: FeatureList = serde_json::from_reader(file)
        .map_err(|e| ForecastError::model(format!("features inválidas: {e}")))?;
    if list.features.is_empty() {
        return Err(ForecastError::model("lista de features vacía".to_string()));
    }
    Ok(list)
}

pub fn read_model_artifact(path: &Path) -> Result<ModelArtifact, ForecastError> {
    let file = File::open(path).map_err(|e| {
        ForecastError::model(format!("no se pudo abrir '{}': {e}", path.display()))
    })?;
    serde_json::from_reader(file)
        .map_err(|e| ForecastError::model(format!("artefacto inválido: {e}")))
}

impl Regressor {
    /// Resolve an artifact against the feature order.
    ///
    /// Every coefficient must name a known feature; features without a
    /// coefficient get weight 0, matching the zero-fill on the input side.
    pub fn from_artifact(artifact: ModelArtifact, order: &[String]) -> Result<Self, ForecastError> {
        for name in artifact.coefficients.keys() {
            if !order.iter().any(|f| f == name) {
                return Err(ForecastError::model(format!(
                    "el modelo '{}' usa una feature desconocida: '{name}'",
                    artifact.target
                )));
            }
        }
        let weights = DVector::from_iterator(
            order.len(),
            order
                .iter()
                .map(|name| artifact.coefficients.get(name).copied().unwrap_or(0.0)),
        );
        Ok(Self {
            target: artifact.target,
            intercept: artifact.intercept,
            weights,
            log1p_target: artifact.log1p_target,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn log1p_target(&self) -> bool {
        self.log1p_target
    }

    /// Evaluate the regressor on an aligned feature vector.
    ///
    /// Pure and side-effect free; a dimension mismatch means the caller
    /// aligned against a different feature order than the artifacts were
    /// resolved with.
    pub fn predict(&self, x: &[f64]) -> Result<f64, ForecastError> {
        if x.len() != self.weights.len() {
            return Err(ForecastError::malformed(format!(
                "vector de features inconsistente para '{}': {} != {}",
                self.target,
                x.len(),
                self.weights.len()
            )));
        }
        let y = self.intercept + self.weights.dot(&DVector::from_column_slice(x));
        if !y.is_finite() {
            return Err(ForecastError::model(format!(
                "predicción no finita del modelo '{}'",
                self.target
            )));
        }
        Ok(y)
    }
}
