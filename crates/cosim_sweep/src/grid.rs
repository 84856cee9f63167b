//! Sweep grid: the Cartesian product of the sweep axes.
//!
//! Points are enumerated with federate count as the outermost axis, then
//! message count, byte count, and core type innermost.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// One coordinate of the sweep grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentPoint {
    /// Position in enumeration order, starting at 0.
    pub index: usize,
    pub federates: usize,
    pub messages: usize,
    pub bytes: usize,
    pub core_type: String,
}

impl ExperimentPoint {
    pub fn directory_name(&self) -> String {
        format!(
            "test_f_{}_m_{}_b_{}",
            self.federates, self.messages, self.bytes
        )
    }

    /// Private directory of this point: `<root>/<core type>/test_f_<N>_m_<M>_b_<B>`.
    pub fn directory(&self, experiment_root: &Path) -> PathBuf {
        experiment_root
            .join(&self.core_type)
            .join(self.directory_name())
    }
}

impl std::fmt::Display for ExperimentPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "federates={} messages={} bytes={} core={}",
            self.federates, self.messages, self.bytes, self.core_type
        )
    }
}

/// Sweep axes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepGrid {
    federates: Vec<usize>,
    messages: Vec<usize>,
    bytes: Vec<usize>,
    core_types: Vec<String>,
}

impl SweepGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn federates(mut self, values: Vec<usize>) -> Self {
        self.federates = values;
        self
    }

    pub fn messages(mut self, values: Vec<usize>) -> Self {
        self.messages = values;
        self
    }

    pub fn bytes(mut self, values: Vec<usize>) -> Self {
        self.bytes = values;
        self
    }

    pub fn core_types<S: Into<String>>(mut self, values: Vec<S>) -> Self {
        self.core_types = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn total_points(&self) -> usize {
        self.federates.len() * self.messages.len() * self.bytes.len() * self.core_types.len()
    }

    /// Name of the first empty axis, if any.
    pub fn empty_axis(&self) -> Option<&'static str> {
        if self.federates.is_empty() {
            Some("federates")
        } else if self.messages.is_empty() {
            Some("messages")
        } else if self.bytes.is_empty() {
            Some("bytes")
        } else if self.core_types.is_empty() {
            Some("core types")
        } else {
            None
        }
    }

    /// Enumerate every point in fixed nesting order.
    pub fn points(&self) -> impl Iterator<Item = ExperimentPoint> + '_ {
        self.federates
            .iter()
            .flat_map(move |&federates| self.expand_with_messages(federates))
            .enumerate()
            .map(|(index, (federates, messages, bytes, core_type))| ExperimentPoint {
                index,
                federates,
                messages,
                bytes,
                core_type: core_type.to_string(),
            })
    }

    fn expand_with_messages(
        &self,
        federates: usize,
    ) -> impl Iterator<Item = (usize, usize, usize, &str)> + '_ {
        self.messages
            .iter()
            .flat_map(move |&messages| self.expand_with_bytes(federates, messages))
    }

    fn expand_with_bytes(
        &self,
        federates: usize,
        messages: usize,
    ) -> impl Iterator<Item = (usize, usize, usize, &str)> + '_ {
        self.bytes.iter().flat_map(move |&bytes| {
            self.core_types
                .iter()
                .map(move |core_type| (federates, messages, bytes, core_type.as_str()))
        })
    }
}
