//! Feature preprocessing: standard scaling and one-hot encoding

use crate::error::{MaintenanceError, Result};
use crate::models::FeatureRow;
use serde::{Deserialize, Serialize};

/// Numeric model inputs, scaled to zero mean and unit variance
pub const NUMERIC_FEATURES: [&str; 8] = [
    "model_year",
    "vehicle_age",
    "mileage",
    "service_interval",
    "days_since_service",
    "tire_pressure",
    "brake_wear",
    "fault_codes",
];

/// Categorical model inputs, one-hot encoded
pub const CATEGORICAL_FEATURES: [&str; 4] = ["make", "engine_type", "driving_condition", "oil_level"];

fn numeric_values(row: &FeatureRow) -> [f64; 8] {
    [
        row.model_year as f64,
        row.vehicle_age as f64,
        row.mileage,
        row.service_interval as f64,
        row.days_since_service as f64,
        row.tire_pressure,
        row.brake_wear,
        row.fault_codes as f64,
    ]
}

fn categorical_values(row: &FeatureRow) -> [&'static str; 4] {
    [
        row.make.as_str(),
        row.engine_type.as_str(),
        row.driving_condition.as_str(),
        row.oil_level.as_str(),
    ]
}

/// Per-column standardization with population statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[[f64; 8]]) -> Self {
        let n = rows.len() as f64;
        let mut means = vec![0.0; NUMERIC_FEATURES.len()];
        let mut scales = vec![1.0; NUMERIC_FEATURES.len()];

        for j in 0..NUMERIC_FEATURES.len() {
            let mean = rows.iter().map(|r| r[j]).sum::<f64>() / n;
            let var = rows.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n;
            means[j] = mean;
            // constant columns pass through centered but unscaled
            if var.sqrt() > f64::EPSILON {
                scales[j] = var.sqrt();
            }
        }
        Self { means, scales }
    }

    pub fn transform(&self, values: &[f64; 8]) -> Vec<f64> {
        values
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }
}

/// One-hot encoder; categories seen at fit time, sorted, unknowns encode as zeros
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn fit(rows: &[[&'static str; 4]]) -> Self {
        let categories = (0..CATEGORICAL_FEATURES.len())
            .map(|j| {
                let mut seen: Vec<String> = rows.iter().map(|r| r[j].to_string()).collect();
                seen.sort();
                seen.dedup();
                seen
            })
            .collect();
        Self { categories }
    }

    pub fn width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    pub fn transform(&self, values: &[&str; 4]) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.width());
        for (value, cats) in values.iter().zip(&self.categories) {
            out.extend(cats.iter().map(|c| if c == value { 1.0 } else { 0.0 }));
        }
        out
    }

    pub fn feature_names(&self) -> Vec<String> {
        CATEGORICAL_FEATURES
            .iter()
            .zip(&self.categories)
            .flat_map(|(name, cats)| cats.iter().map(move |c| format!("{}_{}", name, c)))
            .collect()
    }
}

/// Column transformer mapping a feature row to the model's input vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    scaler: StandardScaler,
    encoder: OneHotEncoder,
}

impl Preprocessor {
    pub fn fit(rows: &[FeatureRow]) -> Result<Self> {
        if rows.is_empty() {
            return Err(MaintenanceError::invalid("cannot fit preprocessor on zero rows"));
        }
        let numeric: Vec<[f64; 8]> = rows.iter().map(numeric_values).collect();
        let categorical: Vec<[&'static str; 4]> = rows.iter().map(categorical_values).collect();
        Ok(Self {
            scaler: StandardScaler::fit(&numeric),
            encoder: OneHotEncoder::fit(&categorical),
        })
    }

    /// Scaled numeric features followed by the one-hot block
    pub fn transform(&self, row: &FeatureRow) -> Vec<f64> {
        let mut out = self.scaler.transform(&numeric_values(row));
        out.extend(self.encoder.transform(&categorical_values(row)));
        out
    }

    pub fn transform_all(&self, rows: &[FeatureRow]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    pub fn n_features(&self) -> usize {
        NUMERIC_FEATURES.len() + self.encoder.width()
    }

    pub fn feature_names(&self) -> Vec<String> {
        NUMERIC_FEATURES
            .iter()
            .map(|n| n.to_string())
            .chain(self.encoder.feature_names())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DrivingCondition, EngineType, Make, OilLevel};

    fn row(make: Make, engine: EngineType, oil: OilLevel, mileage: f64) -> FeatureRow {
        FeatureRow {
            make,
            model_year: 2018,
            engine_type: engine,
            vehicle_age: 6,
            mileage,
            driving_condition: DrivingCondition::City,
            service_interval: 180,
            days_since_service: 30,
            oil_level: oil,
            tire_pressure: 33.0,
            brake_wear: 50.0,
            fault_codes: 1,
        }
    }

    fn rows() -> Vec<FeatureRow> {
        vec![
            row(Make::Toyota, EngineType::Gas, OilLevel::High, 10_000.0),
            row(Make::Ford, EngineType::Diesel, OilLevel::Low, 30_000.0),
            row(Make::Tesla, EngineType::Electric, OilLevel::NotApplicable, 50_000.0),
        ]
    }

    #[test]
    fn test_fit_rejects_empty() {
        assert!(Preprocessor::fit(&[]).is_err());
    }

    #[test]
    fn test_feature_names_and_width() {
        let p = Preprocessor::fit(&rows()).unwrap();
        let names = p.feature_names();
        // 8 numeric + 3 makes + 3 engines + 1 condition + 3 oil levels
        assert_eq!(p.n_features(), 18);
        assert_eq!(names.len(), 18);
        assert_eq!(names[0], "model_year");
        assert!(names.contains(&"make_Ford".to_string()));
        assert!(names.contains(&"oil_level_N/A".to_string()));
    }

    #[test]
    fn test_scaling_centers_and_scales() {
        let data = rows();
        let p = Preprocessor::fit(&data).unwrap();
        let encoded = p.transform_all(&data);
        let mileage: Vec<f64> = encoded.iter().map(|r| r[2]).collect();
        let mean = mileage.iter().sum::<f64>() / 3.0;
        let var = mileage.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-9);
        // constant column: centered, not blown up
        assert_eq!(encoded[0][0], 0.0);
    }

    #[test]
    fn test_one_hot_block() {
        let data = rows();
        let p = Preprocessor::fit(&data).unwrap();
        let encoded = p.transform(&data[1]);
        let one_hot = &encoded[8..];
        assert_eq!(one_hot.iter().filter(|v| **v == 1.0).count(), 4);
    }

    #[test]
    fn test_unknown_category_encodes_as_zeros() {
        let p = Preprocessor::fit(&rows()).unwrap();
        let unseen = row(Make::Bmw, EngineType::Gas, OilLevel::Medium, 20_000.0);
        let encoded = p.transform(&unseen);
        let names = p.feature_names();
        let make_cols: Vec<usize> = names
            .iter()
            .enumerate()
            .filter(|(_, n)| n.starts_with("make_"))
            .map(|(i, _)| i)
            .collect();
        assert!(make_cols.iter().all(|i| encoded[*i] == 0.0));
        assert_eq!(encoded.len(), p.n_features());
    }
}
