//! Launch script synthesis.
//!
//! The generated bash script starts the broker, then every federate, all in the
//! background. A `SIGCHLD` trap inspects the job table whenever a child exits;
//! any job that is neither running nor done takes the whole experiment down
//! with [`SUPERVISOR_ABORT_STATUS`]. The PID of every started job is appended
//! to [`PID_FILE_NAME`]; the script waits on each of them in turn, and a
//! supervisor can reap them after a timeout.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::debug;

use crate::document::{document_file_name, DocumentFormat};
use crate::log_level::LogLevel;
use crate::platform::Platform;
use crate::topology::{ParticipantParams, ParticipantSpec, TopologySpec};

pub const LAUNCH_SCRIPT_NAME: &str = "run.sh";
pub const PID_FILE_NAME: &str = "run.pids";
pub const BROKER_OUTPUT_NAME: &str = "broker";

/// Exit status of the launch script when a federate or the broker failed.
pub const SUPERVISOR_ABORT_STATUS: i32 = 3;

/// Run parameters of one experiment, shared by the broker and all federates.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub platform: Platform,
    pub document_format: DocumentFormat,
    pub log_level: LogLevel,
    pub core_type: String,
    pub core_tick: String,
    pub core_timeout: String,
    pub uninterruptible: bool,
    /// Simulated stop time in seconds.
    pub stop_time: f64,
    /// Interval between published updates in seconds.
    pub update_interval: f64,
    pub byte_count: usize,
    /// Redirect every process to `<name>.out` instead of `/dev/null`.
    pub log_files: bool,
    pub broker_program: Option<String>,
    pub federate_program: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let platform = Platform::Helics;
        Self {
            platform,
            document_format: platform.document_format(),
            log_level: LogLevel::Info,
            core_type: "zmq".to_string(),
            core_tick: "30s".to_string(),
            core_timeout: "30s".to_string(),
            uninterruptible: false,
            stop_time: 100.0,
            update_interval: 10.0,
            byte_count: 1,
            log_files: true,
            broker_program: None,
            federate_program: None,
        }
    }
}

impl RuntimeConfig {
    pub fn participant_params(&self) -> ParticipantParams {
        ParticipantParams {
            log_level: self.log_level,
            uninterruptible: self.uninterruptible,
            core_type: self.core_type.clone(),
            core_tick: self.core_tick.clone(),
            core_timeout: self.core_timeout.clone(),
            update_interval: self.update_interval,
        }
    }

    pub fn broker_program(&self) -> &str {
        self.broker_program
            .as_deref()
            .unwrap_or_else(|| self.platform.default_broker_program())
    }

    pub fn federate_program(&self) -> &str {
        self.federate_program
            .as_deref()
            .unwrap_or_else(|| self.platform.default_federate_program())
    }

    /// Broker command line; `federates` counts every participant that joins it.
    pub fn broker_command(&self, federates: usize) -> String {
        match self.platform {
            Platform::Helics => format!(
                "{} --federates={federates} --tick={} --timeout={} --log_level={} --coretype={}",
                self.broker_program(),
                self.core_tick,
                self.core_timeout,
                self.log_level.as_int(),
                self.core_type,
            ),
            Platform::Fncs => format!("{} {federates}", self.broker_program()),
        }
    }

    /// Federate command line: document, timing flag, role flag, stop time,
    /// update interval, message size.
    pub fn federate_command(&self, participant: &ParticipantSpec) -> String {
        format!(
            "{} {} {} {} {} {} {}",
            self.federate_program(),
            document_file_name(&participant.name, self.document_format),
            u8::from(participant.records_timing),
            participant.role.flag(),
            self.stop_time,
            self.update_interval,
            self.byte_count,
        )
    }

    fn redirect(&self, output_name: &str) -> String {
        if self.log_files {
            format!(" &> {output_name}.out &\n")
        } else {
            " > /dev/null 2>&1 &\n".to_string()
        }
    }
}

fn supervisor_preamble() -> String {
    format!(
        r#"#!/bin/bash

set -m

abortExperiment() {{
    echo "found an error"
    for job in $( jobs -p )
    do
        kill -- -$job > /dev/null 2>&1
    done
    exit {SUPERVISOR_ABORT_STATUS}
}}

catchFailures() {{
    rv=`jobs -n | grep -v 'Running \| Done'`
    if [ ! -z "$rv" ]
    then
        echo "$rv"
        abortExperiment
    fi
}}

trap "catchFailures" SIGCHLD

"#
    )
}

fn background(script: &mut String, command: &str, redirect: &str) {
    script.push_str(command);
    script.push_str(redirect);
    script.push_str(&format!("echo $! >> {PID_FILE_NAME}\n"));
}

/// Render the launch script for `topology`.
pub fn build_launch_script(topology: &TopologySpec, runtime: &RuntimeConfig) -> String {
    let mut script = supervisor_preamble();
    let log_level = runtime.log_level.name();
    script.push_str(&format!("export LOG_LEVEL={log_level}\n\n"));
    script.push_str(&format!(": > {PID_FILE_NAME}\n\n"));

    background(
        &mut script,
        &runtime.broker_command(topology.participants().len()),
        &runtime.redirect(BROKER_OUTPUT_NAME),
    );
    for participant in topology.launch_order() {
        background(
            &mut script,
            &runtime.federate_command(participant),
            &runtime.redirect(&participant.name),
        );
    }

    script.push_str("\necho \"Waiting for it to finish\"\n");
    // Jobs the trap missed still fail the script through their own exit status.
    script.push_str(&format!(
        "for pid in $(cat {PID_FILE_NAME})\ndo\n    wait $pid || abortExperiment\ndone\n"
    ));
    script
}

/// Write `script` as `run.sh` inside `directory` and make it executable.
pub fn write_launch_script(directory: impl AsRef<Path>, script: &str) -> io::Result<PathBuf> {
    let path = directory.as_ref().join(LAUNCH_SCRIPT_NAME);
    fs::write(&path, script)?;
    let mut permissions = fs::metadata(&path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions)?;
    debug!("wrote launch script {}", path.display());
    Ok(path)
}
