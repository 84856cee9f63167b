use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::results::SweepResultTable;
use crate::runner::Outcome;
use crate::settings::SweepSettings;

pub const MANIFEST_SCHEMA_VERSION: &str = "v1";
pub const MANIFEST_NAME: &str = "sweep_manifest.json";

/// Summary written next to the results table so a table can be traced back
/// to the settings that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepManifest {
    pub schema_version: String,
    pub settings_fingerprint: String,
    pub experiment_type: String,
    pub platform: String,
    pub total_points: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
}

impl SweepManifest {
    pub fn new(settings: &SweepSettings, table: &SweepResultTable) -> Self {
        Self {
            schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
            settings_fingerprint: settings.fingerprint(),
            experiment_type: settings.experiment_type.label().to_string(),
            platform: settings.platform.label().to_string(),
            total_points: table.len(),
            succeeded: table.count(Outcome::Success),
            failed: table.count(Outcome::Failure),
            timed_out: table.count(Outcome::Timeout),
        }
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
