//! The `stats` command: offline aggregation of NDJSON output

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use tokio::io::{AsyncBufReadExt, BufReader};
use volley_core::ResponseInfo;

/// Rounding applied to every reported figure
const PRECISION: i32 = 4;

/// Aggregate figures for one metric
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stat {
    pub average: f64,
    pub std_dev: f64,
    pub q95: f64,
    pub q5: f64,
    pub total: f64,
}

/// The full aggregation of a run's records
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stats {
    pub elapsed: Stat,
    pub transfer: Stat,
    pub count: usize,
    pub status_codes: HashMap<String, usize>,
}

pub async fn run() -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut records = Vec::new();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let record: ResponseInfo = serde_json::from_str(&line)
            .with_context(|| format!("error parsing line '{}'", line))?;
        records.push(record);
    }

    let stats = aggregate(&records)?;
    let output = serde_json::json!({ "Stats": stats });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Aggregate a run's records
pub fn aggregate(records: &[ResponseInfo]) -> Result<Stats> {
    if records.is_empty() {
        bail!("empty data");
    }

    let elapsed: Vec<f64> = records.iter().map(|r| r.elapsed).collect();
    let transfer: Vec<f64> = records.iter().map(|r| r.length as f64).collect();

    let mut status_codes = HashMap::new();
    for record in records {
        *status_codes
            .entry(record.status_code.to_string())
            .or_insert(0) += 1;
    }

    Ok(Stats {
        elapsed: aggregate_metric(&elapsed),
        transfer: aggregate_metric(&transfer),
        count: records.len(),
        status_codes,
    })
}

fn aggregate_metric(values: &[f64]) -> Stat {
    let total: f64 = values.iter().sum();
    let average = total / values.len() as f64;

    let variance = values
        .iter()
        .map(|value| (value - average).powi(2))
        .sum::<f64>()
        / values.len() as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    Stat {
        average: round(average),
        std_dev: round(variance.sqrt()),
        q95: round(percentile(95.0, &sorted)),
        q5: round(percentile(5.0, &sorted)),
        total: round(total),
    }
}

/// Linear-interpolated percentile over pre-sorted values
fn percentile(p: f64, sorted: &[f64]) -> f64 {
    let n = sorted.len();
    let rank = (p / 100.0) * n as f64;
    let idx = rank as usize;

    if idx >= n - 1 {
        return sorted[n - 1];
    }

    let value = sorted[idx];
    let next = sorted[idx + 1];
    let weight = rank - idx as f64;
    value + (next - value) * weight
}

fn round(value: f64) -> f64 {
    let factor = 10f64.powi(PRECISION);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(elapsed: f64, length: u64, status_code: u16) -> ResponseInfo {
        ResponseInfo {
            elapsed,
            length,
            status_code,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(aggregate(&[]).is_err());
    }

    #[test]
    fn test_average_and_total() {
        let records = vec![
            record(10.0, 100, 200),
            record(20.0, 200, 200),
            record(30.0, 300, 500),
        ];

        let stats = aggregate(&records).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.elapsed.total, 60.0);
        assert_eq!(stats.elapsed.average, 20.0);
        assert_eq!(stats.transfer.total, 600.0);
        assert_eq!(stats.status_codes["200"], 2);
        assert_eq!(stats.status_codes["500"], 1);
    }

    #[test]
    fn test_std_dev() {
        // Values 2, 4, 4, 4, 5, 5, 7, 9 have a population stddev of exactly 2
        let records: Vec<ResponseInfo> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .iter()
            .map(|&e| record(e, 0, 200))
            .collect();

        let stats = aggregate(&records).unwrap();
        assert_eq!(stats.elapsed.std_dev, 2.0);
    }

    #[test]
    fn test_percentiles_are_ordered() {
        let records: Vec<ResponseInfo> =
            (1..=100).map(|e| record(e as f64, 0, 200)).collect();

        let stats = aggregate(&records).unwrap();
        assert!(stats.elapsed.q5 < stats.elapsed.average);
        assert!(stats.elapsed.average < stats.elapsed.q95);
        assert!(stats.elapsed.q95 <= 100.0);
    }

    #[test]
    fn test_single_record() {
        let stats = aggregate(&[record(5.0, 10, 200)]).unwrap();
        assert_eq!(stats.elapsed.average, 5.0);
        assert_eq!(stats.elapsed.q95, 5.0);
        assert_eq!(stats.elapsed.std_dev, 0.0);
    }
}
