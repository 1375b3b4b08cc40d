//! Diagnostic statistics over a dataset

use super::{Dataset, DatasetRow, NUMERIC_COLUMNS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptive statistics of one numeric column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1)
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Mean maintenance cost of one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMean {
    pub group: String,
    pub count: usize,
    pub mean_cost: f64,
}

/// Pearson correlation between numeric columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

/// Summary report of a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnStats>,
    /// Group means sorted by descending cost
    pub cost_by_make: Vec<GroupMean>,
    pub cost_by_engine_type: Vec<GroupMean>,
    pub cost_by_driving_condition: Vec<GroupMean>,
    pub correlation: CorrelationMatrix,
}

impl DatasetSummary {
    pub fn compute(dataset: &Dataset) -> Self {
        let rows = dataset.rows();
        let matrix: Vec<[f64; 9]> = rows.iter().map(DatasetRow::numeric_values).collect();
        let columns_data: Vec<Vec<f64>> = (0..NUMERIC_COLUMNS.len())
            .map(|j| matrix.iter().map(|r| r[j]).collect())
            .collect();

        let columns = NUMERIC_COLUMNS
            .iter()
            .zip(&columns_data)
            .map(|(name, values)| column_stats(name, values))
            .collect();

        let values = columns_data
            .iter()
            .map(|a| columns_data.iter().map(|b| pearson(a, b)).collect())
            .collect();

        Self {
            rows: rows.len(),
            columns,
            cost_by_make: group_means(rows, |r| r.make.as_str()),
            cost_by_engine_type: group_means(rows, |r| r.engine_type.as_str()),
            cost_by_driving_condition: group_means(rows, |r| r.driving_condition.as_str()),
            correlation: CorrelationMatrix {
                columns: NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
                values,
            },
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|c| c.column == name)
    }
}

fn column_stats(name: &str, values: &[f64]) -> ColumnStats {
    let count = values.len();
    if count == 0 {
        return ColumnStats {
            column: name.to_string(),
            count,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        };
    }
    let mean = mean(values);
    let std = if count > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
    } else {
        f64::NAN
    };
    ColumnStats {
        column: name.to_string(),
        count,
        mean,
        std,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn group_means(rows: &[DatasetRow], key: impl Fn(&DatasetRow) -> &'static str) -> Vec<GroupMean> {
    let mut groups: BTreeMap<&'static str, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = groups.entry(key(row)).or_insert((0.0, 0));
        entry.0 += row.maintenance_cost;
        entry.1 += 1;
    }

    let mut means: Vec<GroupMean> = groups
        .into_iter()
        .map(|(group, (sum, count))| GroupMean {
            group: group.to_string(),
            count,
            mean_cost: sum / count as f64,
        })
        .collect();
    means.sort_by(|a, b| {
        b.mean_cost
            .partial_cmp(&a.mean_cost)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    means
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Pearson correlation; NaN when either side has zero variance
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return f64::NAN;
    }
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma).powi(2);
        vb += (y - mb).powi(2);
    }
    let denom = (va * vb).sqrt();
    if denom < f64::EPSILON {
        return f64::NAN;
    }
    cov / denom
}
