//! Experiment synthesis for co-simulation benchmarks.
//!
//! This crate owns the pure parts of a benchmark experiment: the communication
//! topology between federates, the per-federate configuration documents, and
//! the launch script that starts the broker and every federate. It never runs
//! anything; execution and sweeping live in `cosim_sweep`.
//!
//! # Quick Start
//!
//! ```no_run
//! use cosim_core::launch::{build_launch_script, write_launch_script, RuntimeConfig};
//! use cosim_core::topology::build_fan_in;
//!
//! let runtime = RuntimeConfig::default();
//! let topology = build_fan_in(3, 2, &runtime.participant_params());
//! let script = build_launch_script(&topology, &runtime);
//! write_launch_script("experiment", &script).unwrap();
//! ```
//!
//! # Architecture
//!
//! - [`topology`]: FanIn and Ring topology construction
//! - [`document`]: JSON/YAML participant documents
//! - [`launch`]: launch script synthesis with failure propagation
//! - [`log_level`], [`platform`]: runtime vocabulary shared by the above

pub mod document;
pub mod launch;
pub mod log_level;
pub mod platform;
pub mod topology;

pub use document::{
    write_document, write_document_named, DocumentError, DocumentFormat, DocumentSchema,
};
pub use launch::{build_launch_script, write_launch_script, RuntimeConfig};
pub use log_level::LogLevel;
pub use platform::Platform;
pub use topology::{
    build_fan_in, build_ring, ParticipantParams, ParticipantSpec, TopologyError, TopologyKind,
    TopologySpec,
};
