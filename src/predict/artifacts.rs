//! Pre-fit pipeline artifacts, deserialized from JSON files in the model
//! directory. Three files, matching the three stages of the pipeline:
//! input scaler, regression model, output scaler.

use std::fs;
use std::path::Path;

use ndarray::Array1;
use serde::Deserialize;

use crate::core::errors::ApiError;

/// Standard scaler over the input features: `(x - mean) / scale`.
#[derive(Debug, Clone, Deserialize)]
pub struct InputScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl InputScaler {
    pub fn transform(&self, features: &Array1<f64>) -> Result<Array1<f64>, ApiError> {
        if features.len() != self.mean.len() || features.len() != self.scale.len() {
            return Err(ApiError::Internal(format!(
                "Input scaler dimension mismatch: {} features, {} means, {} scales",
                features.len(),
                self.mean.len(),
                self.scale.len()
            )));
        }

        let mean = Array1::from_vec(self.mean.clone());
        let scale = Array1::from_vec(self.scale.clone());
        Ok((features - &mean) / &scale)
    }
}

/// Min-max scaler applied in inverse on the model output.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputScaler {
    pub data_min: f64,
    pub data_max: f64,
}

impl OutputScaler {
    pub fn inverse_transform(&self, scaled: f64) -> f64 {
        scaled * (self.data_max - self.data_min) + self.data_min
    }
}

/// Additive tree ensemble regressor (the portable form of the original
/// gradient-boosted model): prediction = base_score + sum of tree outputs.
#[derive(Debug, Clone, Deserialize)]
pub struct RegressionModel {
    pub base_score: f64,
    pub trees: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        value: f64,
    },
}

impl TreeNode {
    fn evaluate(&self, features: &Array1<f64>) -> Result<f64, ApiError> {
        match self {
            TreeNode::Leaf { value } => Ok(*value),
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let value = features.get(*feature).copied().ok_or_else(|| {
                    ApiError::Internal(format!(
                        "Model references feature index {} but only {} features were given",
                        feature,
                        features.len()
                    ))
                })?;
                if value <= *threshold {
                    left.evaluate(features)
                } else {
                    right.evaluate(features)
                }
            }
        }
    }
}

impl RegressionModel {
    pub fn predict(&self, features: &Array1<f64>) -> Result<f64, ApiError> {
        let mut total = self.base_score;
        for tree in &self.trees {
            total += tree.evaluate(features)?;
        }
        Ok(total)
    }
}

pub fn load_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ApiError> {
    if !path.exists() {
        return Err(ApiError::ServiceUnavailable(format!(
            "Model or preprocessor file not found at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|err| ApiError::Internal(format!("Failed to read {}: {}", path.display(), err)))?;
    serde_json::from_str(&raw)
        .map_err(|err| ApiError::Internal(format!("Failed to parse {}: {}", path.display(), err)))
}
