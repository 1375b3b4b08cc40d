//! Fitted pipeline artifact: preprocessing plus forest, persisted as JSON
//!
//! Every saved artifact gets a `<file>.sha256` sidecar holding the hex
//! SHA-256 of the JSON bytes. Loading verifies it when present.

use super::forest::RandomForest;
use super::metrics::EvaluationReport;
use super::preprocess::Preprocessor;
use crate::error::{MaintenanceError, Result};
use crate::models::FeatureRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Length of the version string derived from the artifact checksum
const VERSION_LEN: usize = 12;

/// Importance of one encoded model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Preprocessor and forest fitted together, with their evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedPipeline {
    pub preprocessor: Preprocessor,
    pub forest: RandomForest,
    pub feature_names: Vec<String>,
    pub metrics: EvaluationReport,
    pub trained_at: DateTime<Utc>,
}

/// A pipeline read back from disk together with its checksum
#[derive(Debug, Clone)]
pub struct LoadedPipeline {
    pub pipeline: TrainedPipeline,
    pub checksum: String,
    pub path: PathBuf,
}

impl LoadedPipeline {
    pub fn version(&self) -> &str {
        version_of(&self.checksum)
    }
}

impl TrainedPipeline {
    /// Raw model output for one row
    pub fn predict(&self, row: &FeatureRow) -> Result<f64> {
        self.forest.predict(&self.preprocessor.transform(row))
    }

    /// Importances per encoded feature, most important first
    pub fn feature_importances(&self) -> Vec<FeatureImportance> {
        let mut out: Vec<FeatureImportance> = self
            .feature_names
            .iter()
            .zip(self.forest.feature_importances())
            .map(|(feature, importance)| FeatureImportance {
                feature: feature.clone(),
                importance: *importance,
            })
            .collect();
        out.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        out
    }

    /// Write the artifact and its checksum sidecar; returns the checksum
    pub fn save(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let bytes = serde_json::to_vec(self)?;
        let checksum = compute_checksum(&bytes);

        write_atomic(path, &bytes)?;
        write_atomic(&checksum_path(path), checksum.as_bytes())?;

        info!(
            event = "model_saved",
            path = %path.display(),
            size = bytes.len(),
            version = version_of(&checksum),
            "Pipeline artifact saved"
        );
        Ok(checksum)
    }

    /// Read an artifact, verifying the sidecar checksum when one exists
    pub fn load(path: impl AsRef<Path>) -> Result<LoadedPipeline> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MaintenanceError::ArtifactNotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path)?;
        let checksum = compute_checksum(&bytes);

        let sidecar = checksum_path(path);
        if sidecar.exists() {
            let expected = fs::read_to_string(&sidecar)?.trim().to_string();
            if expected != checksum {
                return Err(MaintenanceError::ChecksumMismatch {
                    path: path.to_path_buf(),
                    expected,
                    actual: checksum,
                });
            }
        } else {
            warn!(path = %path.display(), "No checksum sidecar, skipping verification");
        }

        let pipeline: TrainedPipeline = serde_json::from_slice(&bytes)?;
        Ok(LoadedPipeline {
            pipeline,
            checksum,
            path: path.to_path_buf(),
        })
    }
}

/// Hex SHA-256 of `data`
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Path of the checksum sidecar of `path`
pub fn checksum_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".sha256");
    PathBuf::from(name)
}

fn version_of(checksum: &str) -> &str {
    &checksum[..checksum.len().min(VERSION_LEN)]
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp = OsString::from(path.as_os_str());
    temp.push(".tmp");
    let temp_path = PathBuf::from(temp);

    let mut file = File::create(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_checksum() {
        let checksum = compute_checksum(b"test data");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, compute_checksum(b"test data"));
        assert_ne!(checksum, compute_checksum(b"other data"));
    }

    #[test]
    fn test_checksum_path_appends_suffix() {
        let p = checksum_path(Path::new("model/vehicle_maintenance_model.json"));
        assert_eq!(p, PathBuf::from("model/vehicle_maintenance_model.json.sha256"));
    }

    #[test]
    fn test_version_is_checksum_prefix() {
        assert_eq!(version_of("0123456789abcdef"), "0123456789ab");
        assert_eq!(version_of("abc"), "abc");
    }
}
