//! Inference over a fitted pipeline artifact

use super::{PredictionInput, Predictor};
use crate::error::Result;
use crate::generator::round_to;
use crate::models::DEFAULT_CURRENT_YEAR;
use crate::training::{EvaluationReport, FeatureImportance, LoadedPipeline, TrainedPipeline};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
const MAX_INFERENCE_MS: u128 = 50;

/// Predictor backed by a loaded [`TrainedPipeline`]
///
/// Immutable after construction apart from its counters, so one instance is
/// shared by reference across request handlers.
pub struct PipelinePredictor {
    pipeline: TrainedPipeline,
    version: String,
    reference_year: i32,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl PipelinePredictor {
    pub fn new(loaded: LoadedPipeline, reference_year: i32) -> Self {
        Self {
            version: loaded.version().to_string(),
            pipeline: loaded.pipeline,
            reference_year,
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        }
    }

    /// Load the artifact at `path`
    pub fn load(path: impl AsRef<Path>, reference_year: i32) -> Result<Self> {
        Ok(Self::new(TrainedPipeline::load(path)?, reference_year))
    }

    /// Load with the default reference year
    pub fn load_default(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(path, DEFAULT_CURRENT_YEAR)
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    pub fn feature_importances(&self) -> Vec<FeatureImportance> {
        self.pipeline.feature_importances()
    }

    pub fn metrics(&self) -> &EvaluationReport {
        &self.pipeline.metrics
    }

    pub fn tree_count(&self) -> usize {
        self.pipeline.forest.trees().len()
    }

    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

impl Predictor for PipelinePredictor {
    fn predict(&self, input: &PredictionInput) -> Result<f64> {
        let start = Instant::now();

        let row = input.to_features(self.reference_year);
        let raw = self.pipeline.predict(&row)?;

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Inference exceeded {}ms target", MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros() as u64, "Inference completed");
        }

        Ok(round_to(raw, 2))
    }

    fn model_version(&self) -> &str {
        &self.version
    }
}

/// Inference counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::assemble;
    use crate::generator::{generate, GenerationConfig};
    use crate::predictor::tests::diesel_request;
    use crate::training::{train, ForestParams, TrainingConfig};
    use tempfile::TempDir;

    fn saved_pipeline(dir: &TempDir) -> std::path::PathBuf {
        let data = assemble(
            &generate(&GenerationConfig {
                num_samples: 400,
                ..Default::default()
            })
            .unwrap(),
        );
        let config = TrainingConfig {
            forest: ForestParams {
                n_estimators: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        let path = dir.path().join("vehicle_maintenance_model.json");
        train(&data, &config).unwrap().save(&path).unwrap();
        path
    }

    #[test]
    fn test_prediction_is_rounded_and_counted() {
        let dir = TempDir::new().unwrap();
        let predictor = PipelinePredictor::load_default(saved_pipeline(&dir)).unwrap();
        assert_eq!(predictor.reference_year(), 2024);
        assert_eq!(predictor.model_version().len(), 12);
        assert_eq!(predictor.tree_count(), 10);

        let cost = predictor.predict(&diesel_request()).unwrap();
        assert_eq!(cost, round_to(cost, 2));
        assert!((50.0..=2000.0).contains(&cost));

        predictor.predict(&diesel_request()).unwrap();
        assert_eq!(predictor.stats().total_inferences, 2);
    }

    #[test]
    fn test_reloaded_artifact_predicts_identically() {
        let dir = TempDir::new().unwrap();
        let path = saved_pipeline(&dir);
        let a = PipelinePredictor::load(&path, 2024).unwrap();
        let b = PipelinePredictor::load(&path, 2024).unwrap();
        assert_eq!(
            a.predict(&diesel_request()).unwrap(),
            b.predict(&diesel_request()).unwrap()
        );
        assert!(!a.feature_importances().is_empty());
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let err = PipelinePredictor::load_default(dir.path().join("missing.json"))
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }
}
