//! Durable prediction log on SQLite
//!
//! Each served prediction is appended with its request fields, the predicted
//! cost and an RFC 3339 timestamp. Every call opens its own connection on a
//! blocking thread, so the store is cheap to clone and share.

use crate::error::{MaintenanceError, Result};
use crate::predictor::PredictionInput;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{debug, info};

/// A persisted prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    #[serde(flatten)]
    pub input: PredictionInput,
    pub predicted_cost: f64,
    pub timestamp: DateTime<Utc>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    make TEXT NOT NULL,
    model_year INTEGER NOT NULL,
    engine_type TEXT NOT NULL,
    mileage REAL NOT NULL,
    driving_condition TEXT NOT NULL,
    service_interval INTEGER NOT NULL,
    days_since_service INTEGER NOT NULL,
    oil_level TEXT NOT NULL,
    tire_pressure REAL NOT NULL,
    brake_wear REAL NOT NULL,
    fault_codes INTEGER NOT NULL,
    predicted_cost REAL NOT NULL,
    timestamp TEXT NOT NULL
);
"#;

const SELECT_COLUMNS: &str = "id, make, model_year, engine_type, mileage, driving_condition, \
     service_interval, days_since_service, oil_level, tire_pressure, brake_wear, fault_codes, \
     predicted_cost, timestamp";

/// SQLite-backed prediction store
#[derive(Debug, Clone)]
pub struct PredictionStore {
    db_path: PathBuf,
}

impl PredictionStore {
    /// Open (creating if needed) the database and its schema
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let path_clone = path.clone();

        task::spawn_blocking(move || {
            if let Some(parent) = path_clone.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let conn = Connection::open(&path_clone)?;
            conn.execute_batch(SCHEMA)?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_predictions_timestamp ON predictions(timestamp);",
                [],
            )?;
            Ok::<_, MaintenanceError>(())
        })
        .await??;

        info!(event = "store_opened", path = %path.display(), "Prediction store ready");
        Ok(Self { db_path: path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Append one prediction; the id and timestamp are assigned here
    pub async fn insert(
        &self,
        input: PredictionInput,
        predicted_cost: f64,
    ) -> Result<PredictionRecord> {
        let path = self.db_path.clone();

        task::spawn_blocking(move || {
            let conn = Connection::open(&path)?;
            let timestamp = Utc::now();

            conn.execute(
                "INSERT INTO predictions (make, model_year, engine_type, mileage, driving_condition, \
                 service_interval, days_since_service, oil_level, tire_pressure, brake_wear, \
                 fault_codes, predicted_cost, timestamp) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    input.make.as_str(),
                    input.model_year,
                    input.engine_type.as_str(),
                    input.mileage,
                    input.driving_condition.as_str(),
                    input.service_interval,
                    input.days_since_service,
                    input.oil_level.as_str(),
                    input.tire_pressure,
                    input.brake_wear,
                    input.fault_codes,
                    predicted_cost,
                    timestamp.to_rfc3339(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(id = id, predicted_cost = predicted_cost, "Prediction stored");

            Ok::<_, MaintenanceError>(PredictionRecord {
                id,
                input,
                predicted_cost,
                timestamp,
            })
        })
        .await?
    }

    /// Most recent predictions first
    pub async fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>> {
        let path = self.db_path.clone();

        task::spawn_blocking(move || {
            let conn = Connection::open(&path)?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM predictions ORDER BY id DESC LIMIT ?1",
                SELECT_COLUMNS
            ))?;
            let rows = stmt
                .query_map(params![limit as i64], record_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok::<_, MaintenanceError>(rows)
        })
        .await?
    }

    /// Number of stored predictions
    pub async fn count(&self) -> Result<i64> {
        let path = self.db_path.clone();

        task::spawn_blocking(move || {
            let conn = Connection::open(&path)?;
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
            Ok::<_, MaintenanceError>(count)
        })
        .await?
    }
}

fn parsed<T, E>(idx: usize, value: std::result::Result<T, E>) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    value.map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<PredictionRecord> {
    let make: String = row.get(1)?;
    let engine_type: String = row.get(3)?;
    let driving_condition: String = row.get(5)?;
    let oil_level: String = row.get(8)?;
    let timestamp: String = row.get(13)?;

    Ok(PredictionRecord {
        id: row.get(0)?,
        input: PredictionInput {
            make: parsed(1, make.parse())?,
            model_year: row.get(2)?,
            engine_type: parsed(3, engine_type.parse())?,
            mileage: row.get(4)?,
            driving_condition: parsed(5, driving_condition.parse())?,
            service_interval: row.get(6)?,
            days_since_service: row.get(7)?,
            oil_level: parsed(8, oil_level.parse())?,
            tire_pressure: row.get(9)?,
            brake_wear: row.get(10)?,
            fault_codes: row.get(11)?,
        },
        predicted_cost: row.get(12)?,
        timestamp: parsed(13, DateTime::parse_from_rfc3339(&timestamp))?.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DrivingCondition, EngineType, Make, OilLevel};
    use tempfile::TempDir;

    fn request(make: Make, engine: EngineType, oil: OilLevel) -> PredictionInput {
        PredictionInput {
            make,
            model_year: 2019,
            engine_type: engine,
            mileage: 55_000.5,
            driving_condition: DrivingCondition::Mixed,
            service_interval: 180,
            days_since_service: 45,
            oil_level: oil,
            tire_pressure: 32.5,
            brake_wear: 40.0,
            fault_codes: 1,
        }
    }

    #[tokio::test]
    async fn test_open_creates_schema() {
        let dir = TempDir::new().unwrap();
        let store = PredictionStore::open(dir.path().join("data").join("predictions.db"))
            .await
            .unwrap();
        assert!(store.path().exists());
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let dir = TempDir::new().unwrap();
        let store = PredictionStore::open(dir.path().join("predictions.db")).await.unwrap();

        let first = store
            .insert(request(Make::Toyota, EngineType::Gas, OilLevel::High), 210.55)
            .await
            .unwrap();
        let second = store
            .insert(
                request(Make::Tesla, EngineType::Electric, OilLevel::NotApplicable),
                140.0,
            )
            .await
            .unwrap();

        assert!(second.id > first.id);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_recent_returns_newest_first_with_fields_intact() {
        let dir = TempDir::new().unwrap();
        let store = PredictionStore::open(dir.path().join("predictions.db")).await.unwrap();

        for cost in [100.0, 200.0, 300.0] {
            store
                .insert(request(Make::Bmw, EngineType::Diesel, OilLevel::Low), cost)
                .await
                .unwrap();
        }
        store
            .insert(
                request(Make::Tesla, EngineType::Electric, OilLevel::NotApplicable),
                150.25,
            )
            .await
            .unwrap();

        let recent = store.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].predicted_cost, 150.25);
        assert_eq!(recent[0].input.oil_level, OilLevel::NotApplicable);
        assert_eq!(recent[0].input.mileage, 55_000.5);
        assert_eq!(recent[1].predicted_cost, 300.0);
        assert_eq!(recent[1].input.make, Make::Bmw);
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("predictions.db");
        {
            let store = PredictionStore::open(&path).await.unwrap();
            store
                .insert(request(Make::Ford, EngineType::Gas, OilLevel::Medium), 99.99)
                .await
                .unwrap();
        }
        let store = PredictionStore::open(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[test]
    fn test_record_json_is_flat() {
        let record = PredictionRecord {
            id: 7,
            input: request(Make::Honda, EngineType::Gas, OilLevel::High),
            predicted_cost: 180.0,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["make"], "Honda");
        assert_eq!(json["predicted_cost"], 180.0);
        assert!(json.get("input").is_none());
    }
}
