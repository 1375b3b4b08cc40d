//! Model training

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use maintenance_lib::training::{
    train_from_file, EvaluationReport, FeatureImportance, TrainingConfig, TrainingOutputs,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;

/// Importances shown in table output
const TOP_FEATURES: usize = 10;

#[derive(Tabled)]
struct ImportanceRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Importance")]
    importance: String,
}

#[derive(Serialize)]
struct TrainReport<'a> {
    data: &'a Path,
    model_path: &'a Path,
    sample_path: &'a Path,
    version: String,
    checksum: String,
    sample_rows: usize,
    metrics: EvaluationReport,
    feature_importances: Vec<FeatureImportance>,
}

/// Fit the pipeline on a dataset file and persist the artifact and sample export
pub async fn train(
    data: PathBuf,
    outputs: TrainingOutputs,
    config: TrainingConfig,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Table {
        output::print_info(&format!(
            "Training {} trees on {}",
            config.forest.n_estimators,
            data.display()
        ));
    }

    let run = {
        let data = data.clone();
        let outputs = outputs.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || train_from_file(&data, &outputs, &config))
            .await
            .context("Training task panicked")?
            .context("Training failed")?
    };

    let report = TrainReport {
        data: &data,
        model_path: &outputs.model_path,
        sample_path: &outputs.sample_path,
        version: run.checksum.chars().take(12).collect(),
        checksum: run.checksum.clone(),
        sample_rows: run.sample_rows,
        metrics: run.pipeline.metrics,
        feature_importances: run.pipeline.feature_importances(),
    };

    match format {
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Table => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &TrainReport<'_>) {
    output::print_header("Evaluation");
    println!(
        "Train rows: {}    Test rows: {}",
        report.metrics.train_rows, report.metrics.test_rows
    );
    println!("MAE:  {}", output::format_currency(report.metrics.mae));
    println!("RMSE: {}", output::format_currency(report.metrics.rmse));
    println!("R²:   {}", output::color_r2(report.metrics.r2));

    output::print_header("Top Feature Importances");
    let rows: Vec<ImportanceRow> = report
        .feature_importances
        .iter()
        .take(TOP_FEATURES)
        .enumerate()
        .map(|(i, f)| ImportanceRow {
            rank: i + 1,
            feature: f.feature.clone(),
            importance: format!("{:.4}", f.importance),
        })
        .collect();
    output::print_table(&rows);

    println!();
    output::print_success(&format!(
        "Model {} saved to {}",
        report.version,
        report.model_path.display()
    ));
    output::print_success(&format!(
        "{} sample rows exported to {}",
        report.sample_rows,
        report.sample_path.display()
    ));
}
