// 🔮 Prediction Model - opaque AQI predictor behind a port
//
// The dashboards only ever see `ModelPort::predict`. The shipped
// implementation is a linear model whose weights are stored as JSON and
// loaded once at startup.

use anyhow::{ensure, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::category::{classify, AqiCategory, AqiValue};
use crate::pollutants::PollutantReadings;

// ============================================================================
// PORT
// ============================================================================

pub trait ModelPort: Send + Sync {
    /// Predict an AQI from `[PM2.5, PM10, NO2, CO, O3]`.
    fn predict(&self, readings: &PollutantReadings) -> AqiValue;

    /// Short description for logs and the dashboards.
    fn describe(&self) -> String {
        "opaque model".to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub aqi: AqiValue,
    pub category: AqiCategory,
}

/// Run the model and classify its output.
pub fn predict_with_category(model: &dyn ModelPort, readings: &PollutantReadings) -> Prediction {
    let aqi = model.predict(readings);
    log::debug!("Predicted AQI {:.2} for {:?}", aqi, readings.to_vector());

    Prediction {
        aqi,
        category: classify(aqi),
    }
}

// ============================================================================
// LINEAR MODEL
// ============================================================================

/// `aqi = intercept + Σ coefficient[i] * reading[i]`, readings in model order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: [f64; 5],

    /// Free-form provenance (training set, date, score).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: [f64; 5]) -> Self {
        LinearModel {
            intercept,
            coefficients,
            description: None,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read model file: {:?}", path.as_ref()))?;

        let model = Self::from_json(&content)
            .with_context(|| format!("Invalid model file: {:?}", path.as_ref()))?;

        log::info!("Loaded model from {:?}: {}", path.as_ref(), model.describe());
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: LinearModel = serde_json::from_str(json).context("Failed to parse model JSON")?;

        ensure!(model.intercept.is_finite(), "Model intercept is not finite");
        ensure!(
            model.coefficients.iter().all(|c| c.is_finite()),
            "Model coefficients must be finite"
        );

        Ok(model)
    }
}

impl ModelPort for LinearModel {
    fn predict(&self, readings: &PollutantReadings) -> AqiValue {
        readings
            .to_vector()
            .iter()
            .zip(self.coefficients.iter())
            .fold(self.intercept, |acc, (x, w)| acc + x * w)
    }

    fn describe(&self) -> String {
        match &self.description {
            Some(d) => format!("linear model ({})", d),
            None => "linear model".to_string(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(f64);

    impl ModelPort for FixedModel {
        fn predict(&self, _readings: &PollutantReadings) -> AqiValue {
            self.0
        }
    }

    #[test]
    fn test_linear_prediction() {
        let model = LinearModel::new(10.0, [1.0, 0.5, 0.0, 2.0, 0.0]);
        let readings = PollutantReadings::new(40.0, 20.0, 99.0, 3.0, 99.0);

        // 10 + 40 + 10 + 0 + 6 + 0
        assert_eq!(model.predict(&readings), 66.0);
    }

    #[test]
    fn test_prediction_is_classified() {
        let prediction = predict_with_category(&FixedModel(250.0), &PollutantReadings::default());

        assert_eq!(prediction.aqi, 250.0);
        assert_eq!(prediction.category, AqiCategory::Poor);
    }

    #[test]
    fn test_model_json() {
        let json = r#"{
            "intercept": 5.0,
            "coefficients": [1.0, 0.1, 0.2, 3.0, 0.05],
            "description": "city_day 2015-2020"
        }"#;
        let model = LinearModel::from_json(json).unwrap();

        assert_eq!(model.intercept, 5.0);
        assert_eq!(model.describe(), "linear model (city_day 2015-2020)");
    }

    #[test]
    fn test_model_json_rejects_wrong_arity() {
        let json = r#"{"intercept": 0.0, "coefficients": [1.0, 2.0]}"#;
        assert!(LinearModel::from_json(json).is_err());
    }

    #[test]
    fn test_missing_model_file() {
        assert!(LinearModel::from_file("/no/such/model.json").is_err());
    }
}
