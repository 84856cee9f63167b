//! Append-only results table of a sweep.

use cosim_core::{Platform, TopologyKind};
use serde::Serialize;

use crate::grid::ExperimentPoint;
use crate::runner::{ExperimentResult, Outcome};
use crate::timing::TimingMetrics;

/// One row per experiment point: its coordinates plus its result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResultRow {
    pub experiment: usize,
    pub experiment_type: TopologyKind,
    pub platform: Platform,
    pub core_type: String,
    pub status: Outcome,
    pub federates: usize,
    pub messages: usize,
    pub bytes: usize,
    #[serde(flatten)]
    pub timings: TimingMetrics,
}

impl SweepResultRow {
    pub fn new(
        point: &ExperimentPoint,
        experiment_type: TopologyKind,
        platform: Platform,
        result: ExperimentResult,
    ) -> Self {
        Self {
            experiment: point.index,
            experiment_type,
            platform,
            core_type: point.core_type.clone(),
            status: result.outcome,
            federates: point.federates,
            messages: point.messages,
            bytes: point.bytes,
            timings: result.timings,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SweepResultTable {
    rows: Vec<SweepResultRow>,
}

impl SweepResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: SweepResultRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[SweepResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.rows.iter().filter(|row| row.status == outcome).count()
    }
}
