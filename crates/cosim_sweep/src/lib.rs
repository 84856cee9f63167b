//! Parameter-sweep benchmarking of co-simulation experiments.
//!
//! For every point of a grid of (federate count, message count, message size,
//! core type) this crate synthesizes an experiment with `cosim_core`, runs it
//! under a timeout, and collects the timing metrics into a results table.
//!
//! # Quick Start
//!
//! ```no_run
//! use cosim_sweep::{SweepController, SweepSettings};
//!
//! let settings = SweepSettings {
//!     federate_numbers: vec![2, 4],
//!     message_numbers: vec![1],
//!     byte_numbers: vec![10],
//!     core_types: vec!["zmq".to_string()],
//!     ..SweepSettings::default()
//! };
//! settings.validate().unwrap();
//!
//! let table = SweepController::new(settings).run();
//! println!("{} experiments", table.len());
//! ```
//!
//! # Architecture
//!
//! - [`grid`]: sweep axes and experiment points
//! - [`settings`]: sweep settings loaded from JSON
//! - [`runner`]: timeout-bounded execution of one experiment
//! - [`timing`]: the timing log written by the experiment
//! - [`sweep`]: the sequential sweep controller
//! - [`results`], [`export`], [`manifest`]: the results table and its persistence

pub mod export;
pub mod grid;
pub mod manifest;
pub mod results;
pub mod runner;
pub mod settings;
pub mod sweep;
pub mod timing;

pub use export::{export_to_csv, export_to_json};
pub use grid::{ExperimentPoint, SweepGrid};
pub use results::{SweepResultRow, SweepResultTable};
pub use runner::{ExperimentResult, ExperimentRunner, Outcome};
pub use settings::{SettingsError, SweepSettings};
pub use sweep::SweepController;
pub use timing::TimingMetrics;
