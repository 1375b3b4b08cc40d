//! Vehicle maintenance cost library
//!
//! This crate provides the core functionality for:
//! - Synthetic fleet and maintenance observation generation
//! - Dataset assembly, CSV persistence and summary statistics
//! - Random forest training and pipeline artifacts
//! - Cost prediction and the prediction log
//! - Health checks and observability

pub mod dataset;
pub mod error;
pub mod generator;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod store;
pub mod training;

pub use dataset::{assemble, Dataset, DatasetRow, DatasetSummary};
pub use error::{MaintenanceError, Result};
pub use generator::{generate, GenerationConfig};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::{PipelinePredictor, PredictionInput, Predictor};
pub use store::{PredictionRecord, PredictionStore};
pub use training::{train, TrainedPipeline, TrainingConfig};
