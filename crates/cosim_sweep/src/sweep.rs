//! Sequential sweep over the experiment grid.
//!
//! For every point the controller builds the topology, recreates the point's
//! directory from scratch, writes every participant document and the launch
//! script, runs the experiment, and appends a row to the results table. No
//! outcome stops the sweep; the table is persisted once the grid is done.
//!
//! Points are never run concurrently: the runner's timeout cleanup kills
//! processes by name across the whole system.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cosim_core::document::{document_file_name, write_document, DocumentError};
use cosim_core::launch::{build_launch_script, write_launch_script};
use cosim_core::topology::{build_fan_in, build_ring, TopologyError, TopologyKind, TopologySpec};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use thiserror::Error;

use crate::export::{export_to_csv, export_to_json};
use crate::grid::ExperimentPoint;
use crate::manifest::{SweepManifest, MANIFEST_NAME};
use crate::results::{SweepResultRow, SweepResultTable};
use crate::runner::{ExperimentResult, ExperimentRunner};
use crate::settings::SweepSettings;

pub const RESULTS_TABLE_NAME: &str = "data.csv";
pub const RESULTS_JSON_NAME: &str = "data.json";

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("failed to recreate experiment directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write launch script in {path}: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Topology for `point` under the configured experiment type.
pub fn build_topology(
    settings: &SweepSettings,
    point: &ExperimentPoint,
) -> Result<TopologySpec, TopologyError> {
    let params = settings.runtime_config(point).participant_params();
    match settings.experiment_type {
        TopologyKind::FanIn => Ok(build_fan_in(point.federates, point.messages, &params)),
        TopologyKind::Ring => build_ring(
            point.federates,
            settings.ring_neighbors_for(point.federates),
            point.messages,
            &params,
        ),
    }
}

/// Delete `dir` if it exists, then create it empty.
pub fn rebuild_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        info!(
            "experiment folder {} already exists, deleting and moving on...",
            dir.display()
        );
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

/// Write everything `point` needs into `dir`, replacing whatever was there.
///
/// The topology is built before the directory is touched, so an invalid
/// topology leaves any previous contents in place.
pub fn prepare_experiment(
    settings: &SweepSettings,
    point: &ExperimentPoint,
    dir: &Path,
) -> Result<TopologySpec, PrepareError> {
    let topology = build_topology(settings, point)?;

    rebuild_directory(dir).map_err(|source| PrepareError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let runtime = settings.runtime_config(point);
    let schema = runtime.platform.document_schema();
    for participant in topology.participants() {
        let file_name = document_file_name(&participant.name, runtime.document_format);
        write_document(
            participant,
            schema,
            runtime.document_format,
            dir.join(file_name),
        )?;
    }

    let script = build_launch_script(&topology, &runtime);
    write_launch_script(dir, &script).map_err(|source| PrepareError::Script {
        path: dir.to_path_buf(),
        source,
    })?;

    Ok(topology)
}

fn progress_bar(total: usize, enabled: bool) -> Option<ProgressBar> {
    if !enabled || total == 0 {
        return None;
    }
    let bar = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    Some(bar)
}

/// Owns one sweep: its settings, its runner and its results table.
pub struct SweepController {
    settings: SweepSettings,
    runner: ExperimentRunner,
    table: SweepResultTable,
}

impl SweepController {
    pub fn new(settings: SweepSettings) -> Self {
        let runner = settings.runner();
        Self {
            settings,
            runner,
            table: SweepResultTable::new(),
        }
    }

    pub fn with_runner(mut self, runner: ExperimentRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }

    /// Run every grid point in order and persist the table.
    ///
    /// Always returns a table with one row per grid point, whatever the
    /// individual outcomes. A failure to persist the table is logged.
    pub fn run(mut self) -> SweepResultTable {
        let grid = self.settings.grid();
        let total = grid.total_points();
        let root = self.settings.experiment_root();
        let platform = self.settings.platform;
        let experiment_type = self.settings.experiment_type;

        info!(
            "running {total} {platform} {experiment_type} experiments in {}",
            root.display()
        );
        let progress = progress_bar(total, self.settings.show_progress);

        for point in grid.points() {
            if let Some(bar) = &progress {
                bar.set_message(point.to_string());
            }

            let result = self.run_point(&point, &root);
            info!(
                "{platform} test {} of {total} with {point}: status={}",
                point.index + 1,
                result.outcome
            );
            let row = SweepResultRow::new(&point, experiment_type, platform, result);
            self.table.push(row);

            if let Some(bar) = &progress {
                bar.inc(1);
            }
        }

        if let Some(bar) = &progress {
            bar.finish_with_message("Completed");
        }

        if let Err(err) = self.persist(&root) {
            error!("failed to persist results in {}: {err}", root.display());
        }
        self.table
    }

    fn run_point(&self, point: &ExperimentPoint, root: &Path) -> ExperimentResult {
        let dir = point.directory(root);
        match prepare_experiment(&self.settings, point, &dir) {
            Ok(_) => self.runner.run(&dir),
            Err(err) => {
                error!("could not prepare experiment {point}: {err}");
                ExperimentResult::failure()
            }
        }
    }

    fn persist(&self, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
        export_to_csv(&self.table, root.join(RESULTS_TABLE_NAME))?;
        export_to_json(&self.table, root.join(RESULTS_JSON_NAME))?;
        let manifest = SweepManifest::new(&self.settings, &self.table);
        manifest.write(root.join(MANIFEST_NAME))?;
        info!(
            "results written to {}",
            root.join(RESULTS_TABLE_NAME).display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosim_core::launch::LAUNCH_SCRIPT_NAME;
    use tempfile::tempdir;

    fn point(federates: usize, messages: usize) -> ExperimentPoint {
        ExperimentPoint {
            index: 0,
            federates,
            messages,
            bytes: 8,
            core_type: "zmq".to_string(),
        }
    }

    #[test]
    fn ring_topology_uses_all_other_members_by_default() {
        let settings = SweepSettings {
            experiment_type: TopologyKind::Ring,
            ..SweepSettings::default()
        };
        let topology = build_topology(&settings, &point(4, 2)).unwrap();
        assert_eq!(topology.neighbor_count(), Some(3));
        assert_eq!(topology.participants()[0].subscriptions.len(), 6);
    }

    #[test]
    fn single_member_ring_is_a_construction_error() {
        let settings = SweepSettings {
            experiment_type: TopologyKind::Ring,
            ..SweepSettings::default()
        };
        assert_eq!(
            build_topology(&settings, &point(1, 1)),
            Err(TopologyError::NoNeighbors)
        );
    }

    #[test]
    fn prepare_writes_documents_and_script() {
        let root = tempdir().unwrap();
        let settings = SweepSettings::default();
        let p = point(3, 1);
        let dir = p.directory(root.path());

        let topology = prepare_experiment(&settings, &p, &dir).unwrap();

        assert_eq!(topology.participants().len(), 4);
        for name in [
            "sender0.json",
            "sender1.json",
            "sender2.json",
            "echo.json",
            LAUNCH_SCRIPT_NAME,
        ] {
            assert!(dir.join(name).is_file(), "{name} missing");
        }
    }

    #[test]
    fn prepare_discards_stale_files() {
        let root = tempdir().unwrap();
        let settings = SweepSettings::default();
        let p = point(2, 1);
        let dir = p.directory(root.path());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("timeDataLogging.csv"), "stale").unwrap();
        fs::write(dir.join("sender7.json"), "{}").unwrap();

        prepare_experiment(&settings, &p, &dir).unwrap();

        assert!(!dir.join("timeDataLogging.csv").exists());
        assert!(!dir.join("sender7.json").exists());
        assert!(dir.join("sender1.json").exists());
    }
}
