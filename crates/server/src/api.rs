//! HTTP API: predictions, exported data, health checks and Prometheus metrics

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use maintenance_lib::{
    dataset::{Dataset, DatasetRow},
    health::{components, ComponentStatus, HealthRegistry},
    models::{DrivingCondition, EngineType, Make, OilLevel},
    observability::{ServiceMetrics, StructuredLogger},
    predictor::{PipelinePredictor, PredictionInput, Predictor},
    store::{PredictionRecord, PredictionStore},
    training::{EvaluationReport, FeatureImportance},
    MaintenanceError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};

/// Default and maximum page size of `/api/predictions`
const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 1000;

/// Shared application state
pub struct AppState {
    /// `None` when no artifact could be loaded at startup
    pub predictor: Option<PipelinePredictor>,
    pub store: PredictionStore,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
    pub sample_data_path: PathBuf,
}

impl AppState {
    /// Load the model and open the store named by `config`
    ///
    /// A missing or corrupt model leaves the service running without
    /// predictions and marks the `model` component unhealthy. A store that
    /// cannot be opened is fatal.
    pub async fn from_config(
        config: &ServerConfig,
        health_registry: HealthRegistry,
    ) -> anyhow::Result<Self> {
        let metrics = ServiceMetrics::new();
        let logger = StructuredLogger::new("vmms-server");

        let loaded = PipelinePredictor::load(&config.model_path, config.reference_year);
        health_registry.record(components::MODEL, &loaded).await;
        let predictor = match loaded {
            Ok(predictor) => {
                logger.log_model_loaded(
                    &config.model_path.display().to_string(),
                    predictor.model_version(),
                    predictor.tree_count(),
                    predictor.metrics().r2,
                );
                metrics.set_model_version(predictor.model_version());
                Some(predictor)
            }
            Err(e) => {
                logger.log_model_unavailable(
                    &config.model_path.display().to_string(),
                    &e.to_string(),
                );
                None
            }
        };

        let opened = PredictionStore::open(&config.database_path).await;
        health_registry.record(components::STORE, &opened).await;
        let store = opened?;
        metrics.set_stored_predictions(store.count().await?);

        Ok(Self {
            predictor,
            store,
            health_registry,
            metrics,
            logger,
            sample_data_path: config.sample_data_path.clone(),
        })
    }

    fn predictor(&self) -> ApiResult<&PipelinePredictor> {
        self.predictor.as_ref().ok_or_else(|| {
            ApiError::NotFound("No trained model is loaded; run `vmms train` first".to_string())
        })
    }
}

/// Body of `POST /api/predict/`
///
/// Categorical fields arrive as text and integers as `i64` so that
/// out-of-domain values surface as field errors instead of parse failures.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PredictionRequest {
    #[validate(custom = "validate_make")]
    pub make: String,
    #[validate(range(min = 2010, max = 2024))]
    pub model_year: i64,
    #[validate(custom = "validate_engine_type")]
    pub engine_type: String,
    #[validate(range(min = 0.0))]
    pub mileage: f64,
    #[validate(custom = "validate_driving_condition")]
    pub driving_condition: String,
    #[validate(range(min = 90, max = 365))]
    pub service_interval: i64,
    #[validate(range(min = 0))]
    pub days_since_service: i64,
    #[validate(custom = "validate_oil_level")]
    pub oil_level: String,
    #[validate(range(min = 25.0, max = 40.0))]
    pub tire_pressure: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub brake_wear: f64,
    #[validate(range(min = 0))]
    pub fault_codes: i64,
}

/// JSON type expected for a request field
#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Text,
    Integer,
    Number,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.as_i64().is_some(),
            FieldKind::Number => value.is_number(),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            FieldKind::Text => "Expected a string.",
            FieldKind::Integer => "Expected an integer.",
            FieldKind::Number => "Expected a number.",
        }
    }
}

const REQUEST_FIELDS: [(&str, FieldKind); 11] = [
    ("make", FieldKind::Text),
    ("model_year", FieldKind::Integer),
    ("engine_type", FieldKind::Text),
    ("mileage", FieldKind::Number),
    ("driving_condition", FieldKind::Text),
    ("service_interval", FieldKind::Integer),
    ("days_since_service", FieldKind::Integer),
    ("oil_level", FieldKind::Text),
    ("tire_pressure", FieldKind::Number),
    ("brake_wear", FieldKind::Number),
    ("fault_codes", FieldKind::Integer),
];

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

impl PredictionRequest {
    /// Decode and validate a JSON body
    ///
    /// Missing, null and mistyped fields are reported per field (`required`,
    /// `invalid_type`) together, before the range and choice rules run.
    pub fn decode(body: Value) -> ApiResult<Self> {
        let Some(object) = body.as_object() else {
            return Err(ApiError::BadRequest(
                "Request body must be a JSON object".to_string(),
            ));
        };

        let mut errors = ValidationErrors::new();
        for (field, kind) in REQUEST_FIELDS {
            match object.get(field) {
                None | Some(Value::Null) => {
                    errors.add(field, field_error("required", "This field is required."))
                }
                Some(value) if !kind.accepts(value) => {
                    errors.add(field, field_error("invalid_type", kind.expected()))
                }
                Some(_) => {}
            }
        }
        if !errors.errors().is_empty() {
            return Err(ApiError::Validation(errors));
        }

        let request: Self =
            serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }
}

fn choice_error(code: &'static str, value: &str, choices: &[&str]) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(format!("\"{}\" is not one of: {}", value, choices.join(", ")).into());
    err
}

fn validate_make(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<Make>()
        .map(|_| ())
        .map_err(|_| choice_error("invalid_choice", value, &Make::ALL.map(|m| m.as_str())))
}

fn validate_engine_type(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<EngineType>()
        .map(|_| ())
        .map_err(|_| choice_error("invalid_choice", value, &EngineType::ALL.map(|e| e.as_str())))
}

fn validate_driving_condition(value: &str) -> Result<(), ValidationError> {
    value.parse::<DrivingCondition>().map(|_| ()).map_err(|_| {
        choice_error("invalid_choice", value, &DrivingCondition::ALL.map(|d| d.as_str()))
    })
}

fn validate_oil_level(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<OilLevel>()
        .map(|_| ())
        .map_err(|_| choice_error("invalid_choice", value, &OilLevel::ALL.map(|o| o.as_str())))
}

impl TryFrom<PredictionRequest> for PredictionInput {
    type Error = ApiError;

    /// Expects a request that already passed validation
    fn try_from(req: PredictionRequest) -> Result<Self, Self::Error> {
        let bad = |e: maintenance_lib::models::UnknownCategory| ApiError::BadRequest(e.to_string());
        let int = |field: &str, v: i64| {
            u32::try_from(v).map_err(|_| ApiError::BadRequest(format!("{} out of range", field)))
        };
        Ok(PredictionInput {
            make: req.make.parse().map_err(bad)?,
            model_year: i32::try_from(req.model_year)
                .map_err(|_| ApiError::BadRequest("model_year out of range".to_string()))?,
            engine_type: req.engine_type.parse().map_err(bad)?,
            mileage: req.mileage,
            driving_condition: req.driving_condition.parse().map_err(bad)?,
            service_interval: int("service_interval", req.service_interval)?,
            days_since_service: int("days_since_service", req.days_since_service)?,
            oil_level: req.oil_level.parse().map_err(bad)?,
            tire_pressure: req.tire_pressure,
            brake_wear: req.brake_wear,
            fault_codes: int("fault_codes", req.fault_codes)?,
        })
    }
}

/// Validate, predict, persist; 201 with the stored record
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload.map_err(|e| {
        state.metrics.inc_validation_rejections();
        ApiError::BadRequest(e.body_text())
    })?;

    let request = PredictionRequest::decode(body).map_err(|e| {
        state.metrics.inc_validation_rejections();
        if let ApiError::Validation(errors) = &e {
            let fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
            state.logger.log_validation_rejected(&fields);
        }
        e
    })?;

    let predictor = state.predictor()?;
    let input = PredictionInput::try_from(request)?;

    let start = Instant::now();
    let predicted_cost = predictor.predict(&input).map_err(|e| {
        state.metrics.inc_prediction_errors();
        ApiError::from(e)
    })?;
    state
        .metrics
        .observe_prediction_latency(start.elapsed().as_secs_f64());

    let stored = state.store.insert(input, predicted_cost).await;
    state
        .health_registry
        .record(components::STORE, &stored)
        .await;
    let record = stored.map_err(|e| {
        state.metrics.inc_prediction_errors();
        ApiError::from(e)
    })?;

    state.metrics.inc_predictions_served();
    state.metrics.inc_stored_predictions();
    state.logger.log_prediction(
        record.id,
        record.input.make.as_str(),
        record.input.model_year,
        record.input.engine_type.as_str(),
        record.predicted_cost,
        predictor.model_version(),
    );

    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
}

/// Most recent stored predictions
async fn prediction_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<Vec<PredictionRecord>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);
    let records = state.store.recent(limit).await?;
    Ok(Json(records))
}

/// Rows of the visualization sample exported at training time
async fn sample_data(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<DatasetRow>>> {
    let path = state.sample_data_path.clone();
    let dataset = tokio::task::spawn_blocking(move || Dataset::read(path))
        .await
        .map_err(MaintenanceError::from)??;
    Ok(Json(dataset.into_rows()))
}

async fn feature_importance(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<FeatureImportance>>> {
    Ok(Json(state.predictor()?.feature_importances()))
}

/// Loaded model description
#[derive(Debug, Serialize)]
struct ModelInfo {
    version: String,
    trees: usize,
    reference_year: i32,
    metrics: EvaluationReport,
    inferences: u64,
}

async fn model_info(State(state): State<Arc<AppState>>) -> ApiResult<Json<ModelInfo>> {
    let predictor = state.predictor()?;
    Ok(Json(ModelInfo {
        version: predictor.model_version().to_string(),
        trees: predictor.tree_count(),
        reference_year: predictor.reference_year(),
        metrics: *predictor.metrics(),
        inferences: predictor.stats().total_inferences,
    }))
}

/// 200 unless a component is unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// 200 once started with no unhealthy component, 503 otherwise
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        body,
    ))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/predict/", post(predict))
        .route("/api/predict", post(predict))
        .route("/api/predictions", get(prediction_history))
        .route("/api/sample-data/", get(sample_data))
        .route("/api/feature-importance/", get(feature_importance))
        .route("/api/model/", get(model_info))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server; returns after `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
