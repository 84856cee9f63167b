//! Sweep settings.
//!
//! Settings are read from a JSON file; every field is optional and falls back
//! to the defaults below.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cosim_core::{DocumentFormat, LogLevel, Platform, RuntimeConfig, TopologyKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::grid::{ExperimentPoint, SweepGrid};
use crate::runner::{ExperimentRunner, DEFAULT_CLEANUP_PATTERNS};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("sweep axis '{0}' must list at least one value")]
    EmptyAxis(&'static str),
    #[error("simulation timeout must be positive")]
    ZeroTimeout,
    #[error("update interval and stop time must be positive")]
    NonPositiveTime,
    #[error("{platform} federates cannot read {format:?} documents")]
    UnreadableDocumentFormat {
        platform: Platform,
        format: DocumentFormat,
    },
}

/// Everything a sweep needs, passed explicitly to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    /// Folder created under `output_root` for this sweep.
    pub experiment_name: String,
    pub output_root: PathBuf,
    pub experiment_type: TopologyKind,
    pub platform: Platform,
    /// Defaults to the platform's native format.
    pub document_format: Option<DocumentFormat>,
    pub federate_numbers: Vec<usize>,
    pub message_numbers: Vec<usize>,
    pub byte_numbers: Vec<usize>,
    pub core_types: Vec<String>,
    /// Ring neighbors per federate; defaults to every other federate.
    pub ring_neighbors: Option<usize>,
    pub update_interval: f64,
    pub sim_time: f64,
    pub log_level: LogLevel,
    pub log_files: bool,
    pub uninterruptible: bool,
    pub core_tick: String,
    pub core_timeout: String,
    pub simulation_timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub cleanup_patterns: Vec<String>,
    pub broker_program: Option<String>,
    pub federate_program: Option<String>,
    pub show_progress: bool,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            experiment_name: "test_HELICS".to_string(),
            output_root: PathBuf::from("."),
            experiment_type: TopologyKind::FanIn,
            platform: Platform::Helics,
            document_format: None,
            federate_numbers: vec![100, 200],
            message_numbers: vec![1, 10],
            byte_numbers: vec![1, 10],
            core_types: vec!["zmq".to_string(), "tcp".to_string()],
            ring_neighbors: None,
            update_interval: 10.0,
            sim_time: 100.0,
            log_level: LogLevel::Info,
            log_files: true,
            uninterruptible: false,
            core_tick: "30s".to_string(),
            core_timeout: "30s".to_string(),
            simulation_timeout_secs: 120,
            settle_delay_ms: 1000,
            cleanup_patterns: DEFAULT_CLEANUP_PATTERNS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
            broker_program: None,
            federate_program: None,
            show_progress: true,
        }
    }
}

impl SweepSettings {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(axis) = self.grid().empty_axis() {
            return Err(SettingsError::EmptyAxis(axis));
        }
        if self.simulation_timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout);
        }
        if self.update_interval <= 0.0 || self.sim_time <= 0.0 {
            return Err(SettingsError::NonPositiveTime);
        }
        // FNCS federates only load documents with a YAML file name.
        if self.platform == Platform::Fncs && self.document_format() != DocumentFormat::Yaml {
            return Err(SettingsError::UnreadableDocumentFormat {
                platform: self.platform,
                format: self.document_format(),
            });
        }
        Ok(())
    }

    pub fn grid(&self) -> SweepGrid {
        SweepGrid::new()
            .federates(self.federate_numbers.clone())
            .messages(self.message_numbers.clone())
            .bytes(self.byte_numbers.clone())
            .core_types(self.core_types.clone())
    }

    pub fn experiment_root(&self) -> PathBuf {
        self.output_root.join(&self.experiment_name)
    }

    pub fn document_format(&self) -> DocumentFormat {
        self.document_format
            .unwrap_or_else(|| self.platform.document_format())
    }

    /// Ring neighbor count for a ring of `federates` members.
    pub fn ring_neighbors_for(&self, federates: usize) -> usize {
        self.ring_neighbors
            .unwrap_or_else(|| federates.saturating_sub(1))
    }

    pub fn runtime_config(&self, point: &ExperimentPoint) -> RuntimeConfig {
        RuntimeConfig {
            platform: self.platform,
            document_format: self.document_format(),
            log_level: self.log_level,
            core_type: point.core_type.clone(),
            core_tick: self.core_tick.clone(),
            core_timeout: self.core_timeout.clone(),
            uninterruptible: self.uninterruptible,
            stop_time: self.sim_time,
            update_interval: self.update_interval,
            byte_count: point.bytes,
            log_files: self.log_files,
            broker_program: self.broker_program.clone(),
            federate_program: self.federate_program.clone(),
        }
    }

    pub fn runner(&self) -> ExperimentRunner {
        ExperimentRunner::new(Duration::from_secs(self.simulation_timeout_secs))
            .with_settle_delay(Duration::from_millis(self.settle_delay_ms))
            .with_cleanup_patterns(self.cleanup_patterns.clone())
    }

    /// Stable SHA-256 of the settings, identifying which sweep produced a table.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(self).unwrap_or_default());
        format!("{:x}", hasher.finalize())
    }
}
