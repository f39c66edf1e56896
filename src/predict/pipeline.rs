//! Power prediction pipeline: input scaler -> regression model -> output
//! inverse-transform, composed into one `features -> scalar` call.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use ndarray::Array1;
use serde::Deserialize;

use crate::core::errors::ApiError;

use super::artifacts::{load_artifact, InputScaler, OutputScaler, RegressionModel};

pub const INPUT_SCALER_FILE: &str = "preprocessing_inputs.json";
pub const MODEL_FILE: &str = "prediction_model.json";
pub const OUTPUT_SCALER_FILE: &str = "preprocessing_output.json";

/// The 20 weather and solar-geometry features the model was trained on,
/// in training order.
pub const FEATURE_NAMES: [&str; 20] = [
    "temperature_2_m_above_gnd",
    "relative_humidity_2_m_above_gnd",
    "mean_sea_level_pressure_MSL",
    "total_precipitation_sfc",
    "snowfall_amount_sfc",
    "total_cloud_cover_sfc",
    "high_cloud_cover_high_cld_lay",
    "medium_cloud_cover_mid_cld_lay",
    "low_cloud_cover_low_cld_lay",
    "shortwave_radiation_backwards_sfc",
    "wind_speed_10_m_above_gnd",
    "wind_direction_10_m_above_gnd",
    "wind_speed_80_m_above_gnd",
    "wind_direction_80_m_above_gnd",
    "wind_speed_900_mb",
    "wind_direction_900_mb",
    "wind_gust_10_m_above_gnd",
    "angle_of_incidence",
    "zenith",
    "azimuth",
];

#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
pub struct WeatherFeatures {
    pub temperature_2_m_above_gnd: f64,
    pub relative_humidity_2_m_above_gnd: f64,
    pub mean_sea_level_pressure_MSL: f64,
    pub total_precipitation_sfc: f64,
    pub snowfall_amount_sfc: f64,
    pub total_cloud_cover_sfc: f64,
    pub high_cloud_cover_high_cld_lay: f64,
    pub medium_cloud_cover_mid_cld_lay: f64,
    pub low_cloud_cover_low_cld_lay: f64,
    pub shortwave_radiation_backwards_sfc: f64,
    pub wind_speed_10_m_above_gnd: f64,
    pub wind_direction_10_m_above_gnd: f64,
    pub wind_speed_80_m_above_gnd: f64,
    pub wind_direction_80_m_above_gnd: f64,
    pub wind_speed_900_mb: f64,
    pub wind_direction_900_mb: f64,
    pub wind_gust_10_m_above_gnd: f64,
    pub angle_of_incidence: f64,
    pub zenith: f64,
    pub azimuth: f64,
}

impl WeatherFeatures {
    /// Feature vector in `FEATURE_NAMES` order.
    pub fn to_vector(&self) -> Array1<f64> {
        Array1::from_vec(vec![
            self.temperature_2_m_above_gnd,
            self.relative_humidity_2_m_above_gnd,
            self.mean_sea_level_pressure_MSL,
            self.total_precipitation_sfc,
            self.snowfall_amount_sfc,
            self.total_cloud_cover_sfc,
            self.high_cloud_cover_high_cld_lay,
            self.medium_cloud_cover_mid_cld_lay,
            self.low_cloud_cover_low_cld_lay,
            self.shortwave_radiation_backwards_sfc,
            self.wind_speed_10_m_above_gnd,
            self.wind_direction_10_m_above_gnd,
            self.wind_speed_80_m_above_gnd,
            self.wind_direction_80_m_above_gnd,
            self.wind_speed_900_mb,
            self.wind_direction_900_mb,
            self.wind_gust_10_m_above_gnd,
            self.angle_of_incidence,
            self.zenith,
            self.azimuth,
        ])
    }
}

struct Artifacts {
    input_scaler: InputScaler,
    model: RegressionModel,
    output_scaler: OutputScaler,
}

/// Loads the three artifacts on first use and caches them for the life of
/// the process.
pub struct PowerPredictor {
    model_dir: PathBuf,
    artifacts: Mutex<Option<Arc<Artifacts>>>,
}

impl PowerPredictor {
    pub fn new(model_dir: PathBuf) -> Self {
        Self {
            model_dir,
            artifacts: Mutex::new(None),
        }
    }

    pub fn predict(&self, features: &WeatherFeatures) -> Result<f64, ApiError> {
        let artifacts = self.artifacts()?;

        let vector = features.to_vector();
        let scaled = artifacts.input_scaler.transform(&vector)?;
        let raw = artifacts.model.predict(&scaled)?;
        Ok(artifacts.output_scaler.inverse_transform(raw))
    }

    pub fn is_ready(&self) -> bool {
        self.artifacts().is_ok()
    }

    fn artifacts(&self) -> Result<Arc<Artifacts>, ApiError> {
        let mut guard = self
            .artifacts
            .lock()
            .map_err(|_| ApiError::Internal("Predictor lock poisoned".to_string()))?;

        if let Some(artifacts) = guard.as_ref() {
            return Ok(artifacts.clone());
        }

        let input_scaler: InputScaler = load_artifact(&self.model_dir.join(INPUT_SCALER_FILE))?;
        let model: RegressionModel = load_artifact(&self.model_dir.join(MODEL_FILE))?;
        let output_scaler: OutputScaler = load_artifact(&self.model_dir.join(OUTPUT_SCALER_FILE))?;

        if input_scaler.feature_names != FEATURE_NAMES {
            return Err(ApiError::Internal(format!(
                "Input scaler was fit on different features: {:?}",
                input_scaler.feature_names
            )));
        }

        tracing::info!(
            "Loaded prediction artifacts from {} ({} trees)",
            self.model_dir.display(),
            model.trees.len()
        );

        let artifacts = Arc::new(Artifacts {
            input_scaler,
            model,
            output_scaler,
        });
        *guard = Some(artifacts.clone());
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_features() -> WeatherFeatures {
        serde_json::from_value(json!({
            "temperature_2_m_above_gnd": 15.068111,
            "relative_humidity_2_m_above_gnd": 51.361025,
            "mean_sea_level_pressure_MSL": 1019.337812,
            "total_precipitation_sfc": 0.031759,
            "snowfall_amount_sfc": 0.002808,
            "total_cloud_cover_sfc": 34.056990,
            "high_cloud_cover_high_cld_lay": 14.458818,
            "medium_cloud_cover_mid_cld_lay": 20.023499,
            "low_cloud_cover_low_cld_lay": 21.373368,
            "shortwave_radiation_backwards_sfc": 387.759036,
            "wind_speed_10_m_above_gnd": 16.228787,
            "wind_direction_10_m_above_gnd": 195.078452,
            "wind_speed_80_m_above_gnd": 18.978483,
            "wind_direction_80_m_above_gnd": 191.166862,
            "wind_speed_900_mb": 16.363190,
            "wind_direction_900_mb": 192.447911,
            "wind_gust_10_m_above_gnd": 20.583489,
            "angle_of_incidence": 50.837490,
            "zenith": 59.980947,
            "azimuth": 169.167651
        }))
        .unwrap()
    }

    fn write_artifacts(dir: &std::path::Path) {
        let names: Vec<&str> = FEATURE_NAMES.to_vec();
        std::fs::write(
            dir.join(INPUT_SCALER_FILE),
            json!({
                "feature_names": names,
                "mean": vec![0.0; 20],
                "scale": vec![1.0; 20],
            })
            .to_string(),
        )
        .unwrap();

        // Single stump on shortwave radiation (index 9).
        std::fs::write(
            dir.join(MODEL_FILE),
            json!({
                "base_score": 0.1,
                "trees": [{
                    "feature": 9,
                    "threshold": 200.0,
                    "left": { "value": 0.0 },
                    "right": { "value": 0.4 }
                }]
            })
            .to_string(),
        )
        .unwrap();

        std::fs::write(
            dir.join(OUTPUT_SCALER_FILE),
            json!({ "data_min": 0.0, "data_max": 3000.0 }).to_string(),
        )
        .unwrap();
    }

    #[test]
    fn feature_vector_follows_training_order() {
        let vector = sample_features().to_vector();
        assert_eq!(vector.len(), FEATURE_NAMES.len());
        assert!((vector[0] - 15.068111).abs() < 1e-9);
        assert!((vector[19] - 169.167651).abs() < 1e-9);
    }

    #[test]
    fn predicts_through_all_three_stages() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());

        let predictor = PowerPredictor::new(dir.path().to_path_buf());
        assert!(predictor.is_ready());

        // radiation 387.8 > 200 -> 0.1 + 0.4 = 0.5 scaled -> 1500 kW
        let power = predictor.predict(&sample_features()).unwrap();
        assert!((power - 1500.0).abs() < 1e-6);
    }

    #[test]
    fn missing_artifacts_are_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = PowerPredictor::new(dir.path().to_path_buf());

        let err = predictor.predict(&sample_features()).unwrap_err();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
        assert!(!predictor.is_ready());
    }

    #[test]
    fn mismatched_scaler_features_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        std::fs::write(
            dir.path().join(INPUT_SCALER_FILE),
            json!({
                "feature_names": ["temperature"],
                "mean": [0.0],
                "scale": [1.0],
            })
            .to_string(),
        )
        .unwrap();

        let predictor = PowerPredictor::new(dir.path().to_path_buf());
        let err = predictor.predict(&sample_features()).unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
