//! Inference backends for the crop disease classifier
//!
//! The Keras model is exported as a SavedModel and served by TensorFlow
//! Serving; this module talks to its REST predict endpoint.
//! ref: https://www.tensorflow.org/tfx/serving/api_rest#predict_api

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::Array4;
use serde::{Deserialize, Serialize};

// ============================================================================
// InferenceBackend Trait
// ============================================================================

/// Runs one forward pass of the classifier
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Class scores for a single `(1, H, W, 3)` input
    async fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>>;

    /// Backend name
    fn name(&self) -> &str;
}

// ============================================================================
// TensorFlow Serving
// ============================================================================

/// TensorFlow Serving REST backend
#[derive(Debug)]
pub struct TfServingBackend {
    url: String,
    client: reqwest::Client,
}

/// Row-format predict request: `{"instances": [H][W][C]}`
#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Vec<Vec<[f32; 3]>>>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ServingError {
    error: String,
}

impl TfServingBackend {
    /// # Arguments
    /// * `url` - full predict URL, e.g. `http://localhost:8501/v1/models/crop_disease:predict`
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Convert the NHWC tensor into TF Serving row format
fn to_instances(input: &Array4<f32>) -> Result<Vec<Vec<Vec<[f32; 3]>>>> {
    let shape = input.shape();
    if shape[3] != 3 {
        anyhow::bail!("Expected 3 channels, got shape {:?}", shape);
    }

    let instances = input
        .outer_iter()
        .map(|image| {
            image
                .outer_iter()
                .map(|row| {
                    row.outer_iter()
                        .map(|px| [px[0], px[1], px[2]])
                        .collect()
                })
                .collect()
        })
        .collect();

    Ok(instances)
}

#[async_trait]
impl InferenceBackend for TfServingBackend {
    async fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        let request = PredictRequest {
            instances: to_instances(input)?,
        };

        tracing::debug!("Sending predict request to {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("Failed to send predict request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read predict response body")?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ServingError>(&body) {
                anyhow::bail!("Model server error ({}): {}", status, error.error);
            }
            anyhow::bail!("Model server error ({}): {}", status, body);
        }

        let parsed: PredictResponse =
            serde_json::from_str(&body).context("Failed to parse predict response")?;

        parsed
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Model server returned no predictions"))
    }

    fn name(&self) -> &str {
        "tensorflow-serving"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_instances_layout() {
        let mut input = Array4::<f32>::zeros([1, 2, 3, 3]);
        input[[0, 1, 2, 0]] = 0.5;
        input[[0, 1, 2, 2]] = -0.5;

        let instances = to_instances(&input).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].len(), 2);
        assert_eq!(instances[0][0].len(), 3);
        assert_eq!(instances[0][1][2], [0.5, 0.0, -0.5]);
    }

    #[test]
    fn test_to_instances_rejects_wrong_channels() {
        let input = Array4::<f32>::zeros([1, 2, 2, 4]);
        assert!(to_instances(&input).is_err());
    }

    #[test]
    fn test_request_serialization() {
        let input = Array4::<f32>::zeros([1, 1, 1, 3]);
        let request = PredictRequest {
            instances: to_instances(&input).unwrap(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"instances":[[[[0.0,0.0,0.0]]]]}"#);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"predictions": [[0.1, 0.7, 0.2]]}"#;
        let parsed: PredictResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.predictions[0], vec![0.1, 0.7, 0.2]);
    }
}
