//! Core data models for vehicle maintenance estimation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference year used to derive vehicle age
pub const DEFAULT_CURRENT_YEAR: i32 = 2024;

/// Inclusive model year range of generated archetypes
pub const MIN_MODEL_YEAR: i32 = 2010;
pub const MAX_MODEL_YEAR: i32 = 2023;

/// Inclusive daily distance range of generated archetypes (km)
pub const MIN_DAILY_DISTANCE_KM: u32 = 20;
pub const MAX_DAILY_DISTANCE_KM: u32 = 100;

/// Scheduled service intervals in days
pub const SERVICE_INTERVALS: [u32; 3] = [90, 180, 365];

/// Reliability factor bounds (lower = more reliable)
pub const MIN_RELIABILITY: f64 = 0.8;
pub const MAX_RELIABILITY: f64 = 1.2;

/// Vehicle manufacturer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Make {
    Toyota,
    Honda,
    Ford,
    Chevrolet,
    #[serde(rename = "BMW")]
    Bmw,
    Tesla,
}

impl Make {
    pub const ALL: [Make; 6] = [
        Make::Toyota,
        Make::Honda,
        Make::Ford,
        Make::Chevrolet,
        Make::Bmw,
        Make::Tesla,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Make::Toyota => "Toyota",
            Make::Honda => "Honda",
            Make::Ford => "Ford",
            Make::Chevrolet => "Chevrolet",
            Make::Bmw => "BMW",
            Make::Tesla => "Tesla",
        }
    }
}

/// Engine / powertrain type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    Gas,
    Diesel,
    Electric,
}

impl EngineType {
    pub const ALL: [EngineType; 3] = [EngineType::Gas, EngineType::Diesel, EngineType::Electric];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineType::Gas => "gas",
            EngineType::Diesel => "diesel",
            EngineType::Electric => "electric",
        }
    }
}

/// Dominant driving condition of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrivingCondition {
    City,
    Highway,
    Mixed,
}

impl DrivingCondition {
    pub const ALL: [DrivingCondition; 3] = [
        DrivingCondition::City,
        DrivingCondition::Highway,
        DrivingCondition::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DrivingCondition::City => "city",
            DrivingCondition::Highway => "highway",
            DrivingCondition::Mixed => "mixed",
        }
    }

    /// Brake wear multiplier applied to the mileage-based base wear
    pub fn brake_wear_factor(&self) -> f64 {
        match self {
            DrivingCondition::City => 1.3,
            DrivingCondition::Highway => 0.7,
            DrivingCondition::Mixed => 1.0,
        }
    }
}

/// Oil level reported at inspection; electric engines report `N/A`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OilLevel {
    Low,
    Medium,
    High,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl OilLevel {
    pub const ALL: [OilLevel; 4] = [
        OilLevel::Low,
        OilLevel::Medium,
        OilLevel::High,
        OilLevel::NotApplicable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OilLevel::Low => "Low",
            OilLevel::Medium => "Medium",
            OilLevel::High => "High",
            OilLevel::NotApplicable => "N/A",
        }
    }
}

/// Error returned when parsing an unknown category label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" is not a valid {}", self.value, self.kind)
    }
}

impl std::error::Error for UnknownCategory {}

fn parse_category<T: Copy>(
    all: &[T],
    label: fn(&T) -> &'static str,
    kind: &'static str,
    s: &str,
) -> Result<T, UnknownCategory> {
    all.iter()
        .copied()
        .find(|v| label(v) == s)
        .ok_or_else(|| UnknownCategory {
            kind,
            value: s.to_string(),
        })
}

impl FromStr for Make {
    type Err = UnknownCategory;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_category(&Make::ALL, Make::as_str, "make", s)
    }
}

impl FromStr for EngineType {
    type Err = UnknownCategory;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_category(&EngineType::ALL, EngineType::as_str, "engine type", s)
    }
}

impl FromStr for DrivingCondition {
    type Err = UnknownCategory;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_category(&DrivingCondition::ALL, DrivingCondition::as_str, "driving condition", s)
    }
}

impl FromStr for OilLevel {
    type Err = UnknownCategory;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_category(&OilLevel::ALL, OilLevel::as_str, "oil level", s)
    }
}

impl fmt::Display for Make {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DrivingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OilLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latent vehicle profile from which observations are sampled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleArchetype {
    pub make: Make,
    pub model_year: i32,
    pub engine_type: EngineType,
    pub daily_distance_km: u32,
    pub driving_condition: DrivingCondition,
    pub service_interval_days: u32,
    pub reliability_factor: f64,
}

/// One synthesized maintenance inspection event
///
/// Archetype attributes are copied by value; the record keeps no link back
/// to the fleet it was drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub make: Make,
    pub model_year: i32,
    pub engine_type: EngineType,
    pub daily_distance_km: u32,
    pub driving_condition: DrivingCondition,
    pub service_interval_days: u32,
    pub reliability_factor: f64,
    pub vehicle_age: i32,
    pub mileage: f64,
    pub days_since_service: u32,
    pub oil_level: OilLevel,
    pub tire_pressure: f64,
    pub brake_wear_pct: f64,
    pub fault_codes: u32,
    pub maintenance_cost: f64,
}

/// Model input row: the dataset columns minus the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub make: Make,
    pub model_year: i32,
    pub engine_type: EngineType,
    pub vehicle_age: i32,
    pub mileage: f64,
    pub driving_condition: DrivingCondition,
    pub service_interval: u32,
    pub days_since_service: u32,
    pub oil_level: OilLevel,
    pub tire_pressure: f64,
    pub brake_wear: f64,
    pub fault_codes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels_round_trip_through_from_str() {
        for make in Make::ALL {
            assert_eq!(make.as_str().parse::<Make>().unwrap(), make);
        }
        for level in OilLevel::ALL {
            assert_eq!(level.as_str().parse::<OilLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = "Lada".parse::<Make>().unwrap_err();
        assert_eq!(err.kind, "make");
        assert!(err.to_string().contains("Lada"));
        assert!("Electric".parse::<EngineType>().is_err());
    }

    #[test]
    fn test_serde_labels_match_dataset_text() {
        assert_eq!(serde_json::to_string(&Make::Bmw).unwrap(), "\"BMW\"");
        assert_eq!(
            serde_json::to_string(&OilLevel::NotApplicable).unwrap(),
            "\"N/A\""
        );
        assert_eq!(
            serde_json::from_str::<DrivingCondition>("\"highway\"").unwrap(),
            DrivingCondition::Highway
        );
    }

    #[test]
    fn test_brake_wear_factor() {
        assert_eq!(DrivingCondition::City.brake_wear_factor(), 1.3);
        assert_eq!(DrivingCondition::Highway.brake_wear_factor(), 0.7);
        assert_eq!(DrivingCondition::Mixed.brake_wear_factor(), 1.0);
    }
}
