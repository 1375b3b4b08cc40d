//! Tabular dataset assembly and CSV persistence
//!
//! The on-disk format is a header row followed by one row per observation,
//! columns in [`COLUMNS`] order, no index column.

mod summary;

pub use summary::{ColumnStats, CorrelationMatrix, DatasetSummary, GroupMean};

use crate::error::{MaintenanceError, Result};
use crate::models::{
    DrivingCondition, EngineType, FeatureRow, Make, ObservationRecord, OilLevel,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Dataset columns, in file order
pub const COLUMNS: [&str; 13] = [
    "make",
    "model_year",
    "engine_type",
    "vehicle_age",
    "mileage",
    "driving_condition",
    "service_interval",
    "days_since_service",
    "oil_level",
    "tire_pressure",
    "brake_wear",
    "fault_codes",
    "maintenance_cost",
];

/// Numeric columns, in file order
pub const NUMERIC_COLUMNS: [&str; 9] = [
    "model_year",
    "vehicle_age",
    "mileage",
    "service_interval",
    "days_since_service",
    "tire_pressure",
    "brake_wear",
    "fault_codes",
    "maintenance_cost",
];

/// Regression target column
pub const TARGET_COLUMN: &str = "maintenance_cost";

/// One dataset row; field order matches [`COLUMNS`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
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
    pub maintenance_cost: f64,
}

impl From<&ObservationRecord> for DatasetRow {
    fn from(r: &ObservationRecord) -> Self {
        Self {
            make: r.make,
            model_year: r.model_year,
            engine_type: r.engine_type,
            vehicle_age: r.vehicle_age,
            mileage: r.mileage,
            driving_condition: r.driving_condition,
            service_interval: r.service_interval_days,
            days_since_service: r.days_since_service,
            oil_level: r.oil_level,
            tire_pressure: r.tire_pressure,
            brake_wear: r.brake_wear_pct,
            fault_codes: r.fault_codes,
            maintenance_cost: r.maintenance_cost,
        }
    }
}

impl DatasetRow {
    /// Model inputs of this row (everything but the target)
    pub fn features(&self) -> FeatureRow {
        FeatureRow {
            make: self.make,
            model_year: self.model_year,
            engine_type: self.engine_type,
            vehicle_age: self.vehicle_age,
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

    /// Numeric fields in [`NUMERIC_COLUMNS`] order
    pub fn numeric_values(&self) -> [f64; 9] {
        [
            self.model_year as f64,
            self.vehicle_age as f64,
            self.mileage,
            self.service_interval as f64,
            self.days_since_service as f64,
            self.tire_pressure,
            self.brake_wear,
            self.fault_codes as f64,
            self.maintenance_cost,
        ]
    }
}

/// In-memory maintenance dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DatasetRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one numeric column, or `None` for unknown/categorical names
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = NUMERIC_COLUMNS.iter().position(|c| *c == name)?;
        Some(self.rows.iter().map(|r| r.numeric_values()[idx]).collect())
    }

    /// Target values
    pub fn targets(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.maintenance_cost).collect()
    }

    /// Diagnostic statistics over the whole dataset
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary::compute(self)
    }

    /// Draw `n` distinct rows (all rows when `n >= len`)
    pub fn sample(&self, n: usize, seed: u64) -> Dataset {
        if n >= self.rows.len() {
            return self.clone();
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let picked = rand::seq::index::sample(&mut rng, self.rows.len(), n);
        Dataset {
            rows: picked.iter().map(|i| self.rows[i].clone()).collect(),
        }
    }

    /// Serialize as CSV with a header row
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if self.rows.is_empty() {
            csv_writer.write_record(COLUMNS)?;
        }
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write to `path` through a temporary file so readers never see a partial file
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            self.write_to(&file)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;

        info!(
            event = "dataset_written",
            path = %path.display(),
            rows = self.rows.len(),
            "Dataset saved"
        );
        Ok(())
    }

    /// Parse CSV produced by [`Dataset::write_to`]
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if headers.iter().ne(COLUMNS.iter().copied()) {
            return Err(MaintenanceError::invalid(format!(
                "unexpected dataset columns: {}",
                headers.iter().collect::<Vec<_>>().join(",")
            )));
        }

        let rows = csv_reader
            .deserialize()
            .collect::<std::result::Result<Vec<DatasetRow>, csv::Error>>()?;
        Ok(Self { rows })
    }

    /// Read a dataset file; a missing file is `ArtifactNotFound`
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MaintenanceError::ArtifactNotFound(path.to_path_buf()));
        }
        let dataset = Self::read_from(File::open(path)?)?;
        debug!(path = %path.display(), rows = dataset.len(), "Dataset loaded");
        Ok(dataset)
    }
}

/// Collect observation records into a dataset, one row per record
pub fn assemble(records: &[ObservationRecord]) -> Dataset {
    Dataset {
        rows: records.iter().map(DatasetRow::from).collect(),
    }
}

/// Write a dataset as CSV to `destination`
pub fn write(dataset: &Dataset, destination: impl AsRef<Path>) -> Result<()> {
    dataset.write(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate, GenerationConfig};
    use tempfile::TempDir;

    fn small_dataset(samples: usize) -> Dataset {
        let config = GenerationConfig {
            num_samples: samples,
            fleet_size: 50,
            ..Default::default()
        };
        assemble(&generate(&config).unwrap())
    }

    #[test]
    fn test_assemble_one_row_per_record() {
        let config = GenerationConfig {
            num_samples: 25,
            ..Default::default()
        };
        let records = generate(&config).unwrap();
        let dataset = assemble(&records);
        assert_eq!(dataset.len(), 25);
        assert_eq!(dataset.rows()[3].brake_wear, records[3].brake_wear_pct);
        assert_eq!(dataset.rows()[3].service_interval, records[3].service_interval_days);
    }

    #[test]
    fn test_header_row_matches_columns() {
        let dataset = small_dataset(3);
        let mut buf = Vec::new();
        dataset.write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn test_empty_dataset_still_has_header() {
        let mut buf = Vec::new();
        Dataset::default().write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.trim_end(), COLUMNS.join(","));
        assert!(Dataset::read_from(text.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("vehicle_maintenance_data.csv");

        let dataset = small_dataset(200);
        write(&dataset, &path).unwrap();
        assert!(!path.with_extension("tmp").exists());

        let loaded = Dataset::read(&path).unwrap();
        assert_eq!(loaded.len(), dataset.len());
        for (a, b) in loaded.rows().iter().zip(dataset.rows()) {
            assert_eq!(a.make, b.make);
            assert_eq!(a.model_year, b.model_year);
            assert_eq!(a.engine_type, b.engine_type);
            assert_eq!(a.vehicle_age, b.vehicle_age);
            assert_eq!(a.driving_condition, b.driving_condition);
            assert_eq!(a.service_interval, b.service_interval);
            assert_eq!(a.days_since_service, b.days_since_service);
            assert_eq!(a.oil_level, b.oil_level);
            assert_eq!(a.fault_codes, b.fault_codes);
            assert!((a.mileage - b.mileage).abs() < 1e-9);
            assert!((a.tire_pressure - b.tire_pressure).abs() < 1e-9);
            assert!((a.brake_wear - b.brake_wear).abs() < 1e-9);
            assert!((a.maintenance_cost - b.maintenance_cost).abs() < 1e-9);
        }
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn test_electric_rows_keep_na_oil_level_in_text() {
        let dataset = small_dataset(300);
        let mut buf = Vec::new();
        dataset.write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        for line in text.lines().skip(1) {
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 13);
            assert_eq!(fields[2] == "electric", fields[8] == "N/A", "row: {}", line);
        }
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Dataset::read(dir.path().join("absent.csv")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_read_rejects_wrong_header() {
        let text = "make,model_year\nToyota,2015\n";
        assert!(matches!(
            Dataset::read_from(text.as_bytes()),
            Err(MaintenanceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_sample_draws_distinct_rows() {
        let dataset = small_dataset(100);
        let sample = dataset.sample(10, 42);
        assert_eq!(sample.len(), 10);
        assert_eq!(sample, dataset.sample(10, 42));
        assert_eq!(dataset.sample(500, 42).len(), 100);
    }

    #[test]
    fn test_numeric_column() {
        let dataset = small_dataset(10);
        assert_eq!(dataset.numeric_column("fault_codes").unwrap().len(), 10);
        assert!(dataset.numeric_column("make").is_none());
        assert_eq!(dataset.targets(), dataset.numeric_column(TARGET_COLUMN).unwrap());
    }
}
