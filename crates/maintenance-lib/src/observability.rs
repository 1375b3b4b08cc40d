//! Observability for the prediction service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, request counters, loaded model version)
//! - Structured logging of service events with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_gauge, Encoder,
    GaugeVec, Histogram, IntCounter, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_served: IntCounter,
    prediction_errors: IntCounter,
    validation_rejections: IntCounter,
    stored_predictions: IntGauge,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "vmms_prediction_latency_seconds",
                "Time spent running the cost model for one request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_served: register_int_counter!(
                "vmms_predictions_served_total",
                "Total number of predictions returned to clients"
            )
            .expect("Failed to register predictions_served"),

            prediction_errors: register_int_counter!(
                "vmms_prediction_errors_total",
                "Total number of failed prediction requests"
            )
            .expect("Failed to register prediction_errors"),

            validation_rejections: register_int_counter!(
                "vmms_validation_rejections_total",
                "Total number of prediction requests rejected by validation"
            )
            .expect("Failed to register validation_rejections"),

            stored_predictions: register_int_gauge!(
                "vmms_stored_predictions",
                "Number of rows in the prediction log"
            )
            .expect("Failed to register stored_predictions"),

            model_info: register_gauge_vec!(
                "vmms_model_info",
                "Information about the currently loaded cost model",
                &["version"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide service metrics
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a handle, registering the metrics on first call
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions_served(&self) {
        self.inner().predictions_served.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    pub fn inc_validation_rejections(&self) {
        self.inner().validation_rejections.inc();
    }

    pub fn set_stored_predictions(&self, count: i64) {
        self.inner().stored_predictions.set(count);
    }

    pub fn inc_stored_predictions(&self) {
        self.inner().stored_predictions.inc();
    }

    /// Replace the model version label
    pub fn set_model_version(&self, version: &str) {
        self.inner().model_info.reset();
        self.inner().model_info.with_label_values(&[version]).set(1.0);
    }

    pub fn predictions_served(&self) -> u64 {
        self.inner().predictions_served.get()
    }

    /// Text exposition of every registered metric
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model_version: Option<&str>) {
        info!(
            event = "service_started",
            service = %self.service,
            service_version = %version,
            model_version = model_version.unwrap_or("none"),
            "Prediction service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Prediction service shutting down"
        );
    }

    pub fn log_model_loaded(&self, path: &str, version: &str, trees: usize, r2: f64) {
        info!(
            event = "model_loaded",
            service = %self.service,
            path = %path,
            model_version = %version,
            trees = trees,
            r2 = r2,
            "Cost model loaded"
        );
    }

    pub fn log_model_unavailable(&self, path: &str, error: &str) {
        warn!(
            event = "model_unavailable",
            service = %self.service,
            path = %path,
            error = %error,
            "Cost model could not be loaded, predictions disabled"
        );
    }

    pub fn log_prediction(
        &self,
        id: i64,
        make: &str,
        model_year: i32,
        engine_type: &str,
        predicted_cost: f64,
        model_version: &str,
    ) {
        info!(
            event = "prediction_served",
            service = %self.service,
            id = id,
            make = %make,
            model_year = model_year,
            engine_type = %engine_type,
            predicted_cost = predicted_cost,
            model_version = %model_version,
            "Served maintenance cost prediction"
        );
    }

    pub fn log_validation_rejected(&self, fields: &[String]) {
        info!(
            event = "validation_rejected",
            service = %self.service,
            fields = %fields.join(","),
            "Prediction request rejected"
        );
    }
}
