//! Crop disease detection
//!
//! - preprocess: image -> normalized `(1, 224, 224, 3)` tensor
//! - backend: forward pass through the served Keras model
//! - labels / remedy: class names and treatment recommendations
//!
//! A detection is a single request/response; nothing is persisted.

mod backend;
mod labels;
mod preprocess;
mod remedy;

use std::path::Path;

use anyhow::Result;
use image::DynamicImage;
use ndarray::Array4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

pub use backend::{InferenceBackend, TfServingBackend};
pub use labels::Labels;
pub use preprocess::{preprocess, preprocess_bytes, INPUT_SHAPE, INPUT_SIZE};
pub use remedy::{Remedy, RemedyPolicy, REMEDIES};

use crate::config::AppConfig;

/// Alternatives must exceed this probability
pub const ALTERNATIVE_THRESHOLD: f32 = 0.1;

/// Tolerance when checking that scores already form a distribution
const SUM_TOLERANCE: f32 = 1e-3;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("could not read image: {0}")]
    Image(#[from] image::ImageError),

    #[error("inference failed: {0:#}")]
    Backend(anyhow::Error),

    #[error("model returned {got} scores but {expected} labels are loaded")]
    LabelMismatch { expected: usize, got: usize },

    #[error("model returned an empty score vector")]
    EmptyOutput,

    #[error("model returned invalid scores: {0}")]
    InvalidOutput(String),
}

// ============================================================================
// Types
// ============================================================================

/// A lower-ranked class above [`ALTERNATIVE_THRESHOLD`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub disease: String,
    pub confidence: f32,
}

/// Classification result for one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Arg-max class index
    pub index: usize,
    pub disease: String,
    /// Probability of the arg-max class, in [0, 1]
    pub confidence: f32,
    /// Other classes above the threshold, in model output order
    pub alternatives: Vec<Alternative>,
    /// Present only when the arg-max class is infected
    pub remedy: Option<Remedy>,
}

impl Prediction {
    pub fn is_healthy(&self) -> bool {
        self.remedy.is_none()
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Make sure scores form a probability distribution
///
/// Softmax output is returned unchanged. Anything else (negative values or
/// a sum above one) is treated as logits.
pub fn normalize_probabilities(scores: &[f32]) -> Vec<f32> {
    let is_distribution = scores.iter().all(|s| *s >= 0.0 && s.is_finite())
        && scores.iter().sum::<f32>() <= 1.0 + SUM_TOLERANCE;

    if is_distribution {
        return scores.to_vec();
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; scores.len()];
    }

    exps.into_iter().map(|e| e / sum).collect()
}

/// Arg-max index; ties resolve to the first position
pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| i)
}

/// Pick the primary class and the alternatives from a probability vector
pub fn select(
    probabilities: &[f32],
    labels: &Labels,
) -> Result<(usize, f32, Vec<Alternative>), DetectError> {
    if probabilities.len() != labels.len() {
        return Err(DetectError::LabelMismatch {
            expected: labels.len(),
            got: probabilities.len(),
        });
    }

    let index = argmax(probabilities).ok_or(DetectError::EmptyOutput)?;

    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(DetectError::InvalidOutput("non-finite probability".to_string()));
    }
    if probabilities[index] <= 0.0 {
        return Err(DetectError::InvalidOutput("all probabilities are zero".to_string()));
    }

    let alternatives = probabilities
        .iter()
        .enumerate()
        .filter(|(i, p)| *i != index && **p > ALTERNATIVE_THRESHOLD)
        .filter_map(|(i, p)| {
            labels.get(i).map(|name| Alternative {
                disease: name.to_string(),
                confidence: *p,
            })
        })
        .collect();

    Ok((index, probabilities[index], alternatives))
}

// ============================================================================
// DiseaseDetector
// ============================================================================

/// Crop disease classifier adapter
pub struct DiseaseDetector {
    backend: Box<dyn InferenceBackend>,
    labels: Labels,
    policy: RemedyPolicy,
}

impl DiseaseDetector {
    pub fn new(backend: Box<dyn InferenceBackend>, labels: Labels, policy: RemedyPolicy) -> Self {
        Self {
            backend,
            labels,
            policy,
        }
    }

    /// Build from configuration (label file + TF Serving URL)
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let labels = Labels::load(&config.labels_path)?;

        let policy = match &config.infected_indices {
            Some(indices) => RemedyPolicy::from_indices(indices.iter().copied()),
            None => RemedyPolicy::from_labels(&labels),
        };

        let backend = TfServingBackend::new(config.model_url.clone())?;
        tracing::info!(
            "Disease detector ready ({} labels, {} infected, backend: {} at {})",
            labels.len(),
            policy.infected_indices().count(),
            backend.name(),
            backend.url()
        );

        Ok(Self::new(Box::new(backend), labels, policy))
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Classify an already decoded image
    pub async fn predict_with_rng<R: Rng + ?Sized>(
        &self,
        image: &DynamicImage,
        rng: &mut R,
    ) -> Result<Prediction, DetectError> {
        self.classify(&preprocess(image), rng).await
    }

    pub async fn predict(&self, image: &DynamicImage) -> Result<Prediction, DetectError> {
        let mut rng = StdRng::from_entropy();
        self.predict_with_rng(image, &mut rng).await
    }

    /// Decode an image file (jpg / jpeg / png) and classify it
    pub async fn predict_path(&self, path: &Path) -> Result<Prediction, DetectError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DetectError::Image(image::ImageError::IoError(e)))?;
        let input = preprocess_bytes(&bytes)?;
        let mut rng = StdRng::from_entropy();
        self.classify(&input, &mut rng).await
    }

    async fn classify<R: Rng + ?Sized>(
        &self,
        input: &Array4<f32>,
        rng: &mut R,
    ) -> Result<Prediction, DetectError> {
        let scores = self
            .backend
            .predict(input)
            .await
            .map_err(DetectError::Backend)?;

        if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(DetectError::InvalidOutput(format!("score {}", bad)));
        }

        let probabilities = normalize_probabilities(&scores);
        let (index, confidence, alternatives) = select(&probabilities, &self.labels)?;

        let disease = self
            .labels
            .get(index)
            .map(str::to_string)
            .unwrap_or_default();
        let remedy = self.policy.remedy_for(index, rng);

        tracing::info!(
            "Predicted '{}' ({:.1}%), {} alternatives, remedy: {}",
            disease,
            confidence * 100.0,
            alternatives.len(),
            remedy.is_some()
        );

        Ok(Prediction {
            index,
            disease,
            confidence,
            alternatives,
            remedy,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
