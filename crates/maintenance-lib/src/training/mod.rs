//! Model training: split, fit, evaluate, persist
//!
//! The pipeline is a [`Preprocessor`] (standard scaling plus one-hot
//! encoding) feeding a [`RandomForest`]. [`train`] fits it on a seeded 80/20
//! split and records held-out accuracy in the returned [`TrainedPipeline`].

mod forest;
mod metrics;
mod pipeline;
mod preprocess;

pub use forest::{ForestParams, RandomForest, RegressionTree};
pub use metrics::{mae, mse, r2, rmse, EvaluationReport};
pub use pipeline::{
    checksum_path, compute_checksum, FeatureImportance, LoadedPipeline, TrainedPipeline,
};
pub use preprocess::{
    OneHotEncoder, Preprocessor, StandardScaler, CATEGORICAL_FEATURES, NUMERIC_FEATURES,
};

use crate::dataset::Dataset;
use crate::error::{MaintenanceError, Result};
use crate::models::FeatureRow;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Default rows in the exported visualization sample
pub const DEFAULT_SAMPLE_ROWS: usize = 1000;

/// Parameters of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed of the train/test shuffle and of the sample export
    pub seed: u64,
    pub forest: ForestParams,
    pub sample_rows: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            forest: ForestParams::default(),
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(MaintenanceError::invalid(format!(
                "test_size must lie in (0, 1), got {}",
                self.test_size
            )));
        }
        self.forest.validate()
    }
}

/// Seeded shuffle of `0..n` split into (train, test) index sets
///
/// The test part holds `ceil(n * test_size)` rows; both parts must be non-empty.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(MaintenanceError::invalid("test_size must lie in (0, 1)"));
    }
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(MaintenanceError::invalid(format!(
            "cannot split {} rows with test_size {}",
            n, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Fit the pipeline on the training split and evaluate it on the rest
pub fn train(dataset: &Dataset, config: &TrainingConfig) -> Result<TrainedPipeline> {
    config.validate()?;
    let start = Instant::now();

    let (train_idx, test_idx) = train_test_split(dataset.len(), config.test_size, config.seed)?;
    let rows = dataset.rows();
    let features =
        |idx: &[usize]| -> Vec<FeatureRow> { idx.iter().map(|&i| rows[i].features()).collect() };
    let targets =
        |idx: &[usize]| -> Vec<f64> { idx.iter().map(|&i| rows[i].maintenance_cost).collect() };

    let train_rows = features(&train_idx);
    let preprocessor = Preprocessor::fit(&train_rows)?;
    let x_train = preprocessor.transform_all(&train_rows);
    let forest = RandomForest::fit(&x_train, &targets(&train_idx), &config.forest)?;

    let x_test = preprocessor.transform_all(&features(&test_idx));
    let predicted = forest.predict_all(&x_test)?;
    let metrics = EvaluationReport::compute(&targets(&test_idx), &predicted, train_idx.len());

    info!(
        event = "model_trained",
        train_rows = metrics.train_rows,
        test_rows = metrics.test_rows,
        trees = config.forest.n_estimators,
        mae = metrics.mae,
        rmse = metrics.rmse,
        r2 = metrics.r2,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Training complete"
    );

    Ok(TrainedPipeline {
        feature_names: preprocessor.feature_names(),
        preprocessor,
        forest,
        metrics,
        trained_at: Utc::now(),
    })
}

/// Output locations of [`train_from_file`]
#[derive(Debug, Clone)]
pub struct TrainingOutputs {
    pub model_path: PathBuf,
    pub sample_path: PathBuf,
}

/// Result of [`train_from_file`]
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub pipeline: TrainedPipeline,
    pub checksum: String,
    pub sample_rows: usize,
}

/// Read a dataset file, train, save the artifact and export the sample rows
pub fn train_from_file(
    data_path: impl AsRef<Path>,
    outputs: &TrainingOutputs,
    config: &TrainingConfig,
) -> Result<TrainingRun> {
    let dataset = Dataset::read(data_path)?;
    let pipeline = train(&dataset, config)?;
    let checksum = pipeline.save(&outputs.model_path)?;

    let sample = dataset.sample(config.sample_rows, config.seed);
    sample.write(&outputs.sample_path)?;

    Ok(TrainingRun {
        pipeline,
        checksum,
        sample_rows: sample.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::assemble;
    use crate::generator::{generate, GenerationConfig};
    use tempfile::TempDir;

    fn dataset(samples: usize) -> Dataset {
        let config = GenerationConfig {
            num_samples: samples,
            ..Default::default()
        };
        assemble(&generate(&config).unwrap())
    }

    fn quick_config() -> TrainingConfig {
        TrainingConfig {
            forest: ForestParams {
                n_estimators: 15,
                ..Default::default()
            },
            sample_rows: 50,
            ..Default::default()
        }
    }

    #[test]
    fn test_split_sizes_and_disjointness() {
        let (train, test) = train_test_split(100, 0.2, 42).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
        assert_eq!(train_test_split(100, 0.2, 42).unwrap().1, test);
    }

    #[test]
    fn test_split_rejects_degenerate_inputs() {
        assert!(train_test_split(1, 0.2, 42).is_err());
        assert!(train_test_split(100, 0.0, 42).is_err());
        assert!(train_test_split(100, 1.0, 42).is_err());
    }

    #[test]
    fn test_train_learns_cost_signal() {
        let pipeline = train(&dataset(800), &quick_config()).unwrap();
        assert_eq!(pipeline.metrics.train_rows, 640);
        assert_eq!(pipeline.metrics.test_rows, 160);
        assert!(pipeline.metrics.r2 > 0.3, "metrics: {:?}", pipeline.metrics);
        assert!(pipeline.metrics.mae.is_finite());

        let importances = pipeline.feature_importances();
        assert_eq!(importances.len(), pipeline.feature_names.len());
        let total: f64 = importances.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-6);
        for pair in importances.windows(2) {
            assert!(pair[0].importance >= pair[1].importance);
        }
    }

    #[test]
    fn test_train_rejects_empty_dataset() {
        assert!(matches!(
            train(&Dataset::default(), &quick_config()),
            Err(MaintenanceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_train_from_file_persists_artifacts() {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("vehicle_maintenance_data.csv");
        dataset(300).write(&data_path).unwrap();

        let outputs = TrainingOutputs {
            model_path: dir.path().join("model").join("vehicle_maintenance_model.json"),
            sample_path: dir.path().join("visualizations").join("sample_data.csv"),
        };
        let run = train_from_file(&data_path, &outputs, &quick_config()).unwrap();
        assert_eq!(run.sample_rows, 50);
        assert!(checksum_path(&outputs.model_path).exists());
        assert_eq!(Dataset::read(&outputs.sample_path).unwrap().len(), 50);

        let loaded = TrainedPipeline::load(&outputs.model_path).unwrap();
        assert_eq!(loaded.checksum, run.checksum);
        assert_eq!(loaded.version().len(), 12);

        let row = dataset(1).rows()[0].features();
        let before = run.pipeline.predict(&row).unwrap();
        let after = loaded.pipeline.predict(&row).unwrap();
        assert!((before - after).abs() < 1e-6);
    }

    #[test]
    fn test_load_detects_tampering() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        let pipeline = train(&dataset(100), &quick_config()).unwrap();
        pipeline.save(&path).unwrap();

        std::fs::write(checksum_path(&path), "deadbeef").unwrap();
        assert!(matches!(
            TrainedPipeline::load(&path),
            Err(MaintenanceError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let err = TrainedPipeline::load(dir.path().join("absent.json")).unwrap_err();
        assert!(err.is_not_found());
    }
}
