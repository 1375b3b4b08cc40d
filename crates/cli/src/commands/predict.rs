//! Prediction requests and history against the running server

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use chrono::{DateTime, Utc};
use maintenance_lib::{predictor::PredictionInput, store::PredictionRecord};
use tabled::Tabled;

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Make")]
    make: String,
    #[tabled(rename = "Year")]
    model_year: i32,
    #[tabled(rename = "Engine")]
    engine_type: String,
    #[tabled(rename = "Mileage")]
    mileage: String,
    #[tabled(rename = "Condition")]
    driving_condition: String,
    #[tabled(rename = "Faults")]
    fault_codes: u32,
    #[tabled(rename = "Predicted Cost")]
    predicted_cost: String,
}

impl From<&PredictionRecord> for HistoryRow {
    fn from(record: &PredictionRecord) -> Self {
        let input = &record.input;
        Self {
            id: record.id,
            timestamp: format_timestamp(&record.timestamp),
            make: input.make.to_string(),
            model_year: input.model_year,
            engine_type: input.engine_type.to_string(),
            mileage: format!("{:.0}", input.mileage),
            driving_condition: input.driving_condition.to_string(),
            fault_codes: input.fault_codes,
            predicted_cost: output::color_cost(record.predicted_cost),
        }
    }
}

/// Submit a prediction request and print the stored record
pub async fn predict(client: &ApiClient, input: &PredictionInput, format: OutputFormat) -> Result<()> {
    let record = client.predict(input).await?;

    match format {
        OutputFormat::Json => output::print_json(&record)?,
        OutputFormat::Table => {
            output::print_header("Maintenance Cost Estimate");
            let input = &record.input;
            println!(
                "Vehicle:           {} {} ({})",
                input.model_year, input.make, input.engine_type
            );
            println!("Mileage:           {:.1}", input.mileage);
            println!("Driving condition: {}", input.driving_condition);
            println!(
                "Service:           {} of {} days, oil {}",
                input.days_since_service, input.service_interval, input.oil_level
            );
            println!(
                "Tires / brakes:    {:.1} psi, {:.1}% wear",
                input.tire_pressure, input.brake_wear
            );
            println!("Fault codes:       {}", input.fault_codes);
            println!();
            println!(
                "Predicted cost:    {}",
                output::color_cost(record.predicted_cost)
            );
            output::print_success(&format!(
                "Stored as prediction #{} at {}",
                record.id,
                format_timestamp(&record.timestamp)
            ));
        }
    }

    Ok(())
}

/// List the most recent stored predictions
pub async fn history(client: &ApiClient, limit: usize, format: OutputFormat) -> Result<()> {
    let records = client.history(limit).await?;

    match format {
        OutputFormat::Json => output::print_json(&records)?,
        OutputFormat::Table => {
            output::print_header("Recent Predictions");
            let rows: Vec<HistoryRow> = records.iter().map(HistoryRow::from).collect();
            output::print_table(&rows);
        }
    }

    Ok(())
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}
