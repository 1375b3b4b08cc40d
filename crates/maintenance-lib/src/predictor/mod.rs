//! Maintenance cost prediction from a fitted pipeline

mod inference;

pub use inference::{InferenceStats, PipelinePredictor};

use crate::error::Result;
use crate::models::{DrivingCondition, EngineType, FeatureRow, Make, OilLevel};
use serde::{Deserialize, Serialize};

/// One prediction request row, as submitted by clients
///
/// Carries every model input except `vehicle_age`, which is derived from a
/// reference year at prediction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub make: Make,
    pub model_year: i32,
    pub engine_type: EngineType,
    pub mileage: f64,
    pub driving_condition: DrivingCondition,
    pub service_interval: u32,
    pub days_since_service: u32,
    pub oil_level: OilLevel,
    pub tire_pressure: f64,
    pub brake_wear: f64,
    pub fault_codes: u32,
}

impl PredictionInput {
    /// Full model input row with `vehicle_age = reference_year - model_year`
    pub fn to_features(&self, reference_year: i32) -> FeatureRow {
        FeatureRow {
            make: self.make,
            model_year: self.model_year,
            engine_type: self.engine_type,
            vehicle_age: reference_year - self.model_year,
            mileage: self.mileage,
            driving_condition: self.driving_condition,
            service_interval: self.service_interval,
            days_since_service: self.days_since_service,
            oil_level: self.oil_level,
            tire_pressure: self.tire_pressure,
            brake_wear: self.brake_wear,
            fault_codes: self.fault_codes,
        }
    }
}

/// Trait for cost prediction implementations
pub trait Predictor: Send + Sync {
    /// Predicted maintenance cost, rounded to cents
    fn predict(&self, input: &PredictionInput) -> Result<f64>;

    /// Identifier of the model behind the predictions
    fn model_version(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn diesel_request() -> PredictionInput {
        PredictionInput {
            make: Make::Ford,
            model_year: 2015,
            engine_type: EngineType::Diesel,
            mileage: 120_000.0,
            driving_condition: DrivingCondition::City,
            service_interval: 180,
            days_since_service: 170,
            oil_level: OilLevel::Low,
            tire_pressure: 30.5,
            brake_wear: 85.0,
            fault_codes: 2,
        }
    }

    #[test]
    fn test_to_features_derives_age() {
        let row = diesel_request().to_features(2024);
        assert_eq!(row.vehicle_age, 9);
        assert_eq!(row.brake_wear, 85.0);
        assert_eq!(row.oil_level, OilLevel::Low);
    }

    #[test]
    fn test_request_json_uses_wire_names() {
        let json = serde_json::to_value(diesel_request()).unwrap();
        assert_eq!(json["engine_type"], "diesel");
        assert_eq!(json["driving_condition"], "city");
        assert_eq!(json["oil_level"], "Low");

        let electric: PredictionInput = serde_json::from_value(serde_json::json!({
            "make": "Tesla", "model_year": 2021, "engine_type": "electric",
            "mileage": 40000.0, "driving_condition": "highway", "service_interval": 365,
            "days_since_service": 10, "oil_level": "N/A", "tire_pressure": 34.0,
            "brake_wear": 20.0, "fault_codes": 0
        }))
        .unwrap();
        assert_eq!(electric.oil_level, OilLevel::NotApplicable);
    }
}
