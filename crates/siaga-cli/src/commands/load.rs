//! Record file loading and argument parsing

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use siaga_core::models::flexible_datetime;
use siaga_core::{AttendanceRecord, Transaction};

/// Load records from a `.json` array or a `.csv` file with a header row
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON records in {}", path.display()))
        }
        "csv" => {
            let file =
                File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
            let mut rdr = ReaderBuilder::new()
                .has_headers(true)
                .flexible(true)
                .trim(Trim::All)
                .from_reader(file);

            let mut records = Vec::new();
            for (i, row) in rdr.deserialize().enumerate() {
                // Header is line 1
                let record = row.with_context(|| {
                    format!("Invalid record on line {} of {}", i + 2, path.display())
                })?;
                records.push(record);
            }
            Ok(records)
        }
        _ => anyhow::bail!(
            "Unsupported record file {}: use .json or .csv",
            path.display()
        ),
    }
}

pub fn load_transactions(path: Option<&Path>) -> Result<Vec<Transaction>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let records: Vec<Transaction> = load_records(path)?;
    for tx in &records {
        tx.validate()
            .with_context(|| format!("Invalid transaction in {}", path.display()))?;
    }
    tracing::debug!(count = records.len(), file = %path.display(), "Loaded transactions");
    Ok(records)
}

pub fn load_attendance(path: Option<&Path>) -> Result<Vec<AttendanceRecord>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let records = load_records(path)?;
    tracing::debug!(count = records.len(), file = %path.display(), "Loaded attendance");
    Ok(records)
}

/// Explicit date, else the latest record date, else now
pub fn resolve_as_of(
    as_of: Option<&str>,
    transactions: &[Transaction],
    attendance: &[AttendanceRecord],
) -> Result<NaiveDateTime> {
    if let Some(raw) = as_of {
        return flexible_datetime::parse(raw).map_err(|e| anyhow::anyhow!("Invalid --as-of: {}", e));
    }

    let latest = transactions
        .iter()
        .map(|t| t.date)
        .chain(attendance.iter().map(|a| a.date))
        .max();
    Ok(latest.unwrap_or_else(|| chrono::Local::now().naive_local()))
}

/// Parse a comma-separated number series ("2500000, 2600000")
pub fn parse_series(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.replace('_', "")
                .parse::<f64>()
                .with_context(|| format!("Invalid number in series: {}", s))
        })
        .collect()
}
