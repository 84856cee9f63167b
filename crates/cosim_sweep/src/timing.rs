//! Timing log written by the timing federate of an experiment.
//!
//! The log is a CSV file with the header
//! `Initialization time,Execution time,Closing time`. The first data row holds
//! CPU times, the second wall-clock times, all in seconds.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TIMING_LOG_NAME: &str = "timeDataLogging.csv";

#[derive(Debug, Error)]
pub enum TimingLogError {
    #[error("failed to read timing log: {0}")]
    Csv(#[from] csv::Error),
    #[error("timing log has {found} data rows, expected at least 2")]
    MissingRows { found: usize },
}

/// Initialization, execution and closing durations in seconds, CPU and wall.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TimingMetrics {
    pub init_cpu: f64,
    pub exec_cpu: f64,
    pub close_cpu: f64,
    pub init_wall: f64,
    pub exec_wall: f64,
    pub close_wall: f64,
}

impl TimingMetrics {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Deserialize)]
struct TimingRow {
    #[serde(rename = "Initialization time")]
    initialization: f64,
    #[serde(rename = "Execution time")]
    execution: f64,
    #[serde(rename = "Closing time")]
    closing: f64,
}

/// Read CPU times from row 0 and wall-clock times from row 1.
pub fn read_timing_log(path: impl AsRef<Path>) -> Result<TimingMetrics, TimingLogError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let rows = reader
        .deserialize::<TimingRow>()
        .take(2)
        .collect::<Result<Vec<_>, _>>()?;

    match rows.as_slice() {
        [cpu, wall] => Ok(TimingMetrics {
            init_cpu: cpu.initialization,
            exec_cpu: cpu.execution,
            close_cpu: cpu.closing,
            init_wall: wall.initialization,
            exec_wall: wall.execution,
            close_wall: wall.closing,
        }),
        _ => Err(TimingLogError::MissingRows { found: rows.len() }),
    }
}
