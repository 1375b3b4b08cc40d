//! Dataset generation and statistics

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use maintenance_lib::{
    dataset::{DatasetSummary, GroupMean, TARGET_COLUMN},
    generator::{generate as generate_records, GenerationConfig},
    Dataset,
};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

#[derive(Tabled)]
struct ColumnRow {
    #[tabled(rename = "Column")]
    column: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Std")]
    std: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Rows")]
    count: usize,
    #[tabled(rename = "Mean Cost")]
    mean_cost: String,
}

#[derive(Tabled)]
struct CorrelationRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Correlation with cost")]
    correlation: String,
}

#[derive(Serialize)]
struct GenerateReport<'a> {
    output: &'a Path,
    config: &'a GenerationConfig,
    summary: DatasetSummary,
}

/// Build a synthetic dataset, write it as CSV and print its summary
pub fn generate(config: &GenerationConfig, output: &Path, format: OutputFormat) -> Result<()> {
    let records = generate_records(config).context("Dataset generation failed")?;
    let dataset = maintenance_lib::assemble(&records);
    dataset
        .write(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let summary = dataset.summary();
    match format {
        OutputFormat::Json => output::print_json(&GenerateReport {
            output,
            config,
            summary,
        })?,
        OutputFormat::Table => {
            output::print_success(&format!(
                "Wrote {} rows to {}",
                dataset.len(),
                output.display()
            ));
            output::print_info(&format!(
                "fleet size {}, seed {}, current year {}{}",
                config.fleet_size,
                config.seed,
                config.current_year,
                if config.noise_free { ", noise-free" } else { "" }
            ));
            print_summary(&summary);
        }
    }

    Ok(())
}

/// Print the summary statistics of an existing dataset file
pub fn stats(path: &Path, format: OutputFormat) -> Result<()> {
    let dataset =
        Dataset::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let summary = dataset.summary();

    match format {
        OutputFormat::Json => output::print_json(&summary)?,
        OutputFormat::Table => {
            if dataset.is_empty() {
                output::print_warning(&format!("{} contains no rows", path.display()));
                return Ok(());
            }
            output::print_info(&format!("{} rows in {}", summary.rows, path.display()));
            print_summary(&summary);
        }
    }

    Ok(())
}

fn print_summary(summary: &DatasetSummary) {
    output::print_header("Numeric Columns");
    let rows: Vec<ColumnRow> = summary
        .columns
        .iter()
        .map(|c| ColumnRow {
            column: c.column.clone(),
            count: c.count,
            mean: output::format_stat(c.mean),
            std: output::format_stat(c.std),
            min: output::format_stat(c.min),
            max: output::format_stat(c.max),
        })
        .collect();
    output::print_table(&rows);

    print_groups("Cost by Make", &summary.cost_by_make);
    print_groups("Cost by Engine Type", &summary.cost_by_engine_type);
    print_groups("Cost by Driving Condition", &summary.cost_by_driving_condition);

    output::print_header("Correlation with Maintenance Cost");
    output::print_table(&cost_correlations(summary));
}

fn print_groups(title: &str, groups: &[GroupMean]) {
    output::print_header(title);
    let rows: Vec<GroupRow> = groups
        .iter()
        .map(|g| GroupRow {
            group: g.group.clone(),
            count: g.count,
            mean_cost: output::format_currency(g.mean_cost),
        })
        .collect();
    output::print_table(&rows);
}

/// Feature columns ordered by the strength of their correlation with cost
fn cost_correlations(summary: &DatasetSummary) -> Vec<CorrelationRow> {
    let mut pairs: Vec<(String, f64)> = summary
        .correlation
        .columns
        .iter()
        .filter(|c| c.as_str() != TARGET_COLUMN)
        .filter_map(|c| Some((c.clone(), summary.correlation.get(c, TARGET_COLUMN)?)))
        .collect();
    pairs.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    pairs
        .into_iter()
        .map(|(feature, r)| CorrelationRow {
            feature,
            correlation: if r.is_nan() {
                "-".to_string()
            } else {
                format!("{:+.3}", r)
            },
        })
        .collect()
}
