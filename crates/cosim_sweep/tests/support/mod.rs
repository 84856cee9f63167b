#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use cosim_core::launch::write_launch_script;
use cosim_sweep::SweepSettings;

pub const TIMING_LOG: &str =
    "Initialization time,Execution time,Closing time\n0.0100,0.2000,0.0010\n1.0000,2.0000,0.0000\n";

/// Stand-in federate: checks its document exists and, when it is the timing
/// federate, writes the timing log into its working directory.
const FAKE_FEDERATE: &str = r#"#!/bin/bash
[ -f "$1" ] || exit 2
if [ "$2" = "1" ]; then
    printf 'Initialization time,Execution time,Closing time\n0.0100,0.2000,0.0010\n1.0000,2.0000,0.0000\n' > timeDataLogging.csv
fi
exit 0
"#;

const HANGING_FEDERATE: &str = "#!/bin/bash\nsleep 30\n";

fn write_program(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, body).expect("program should be writable");
    format!("bash {}", path.display())
}

pub fn fake_federate(dir: &Path) -> String {
    write_program(dir, "fake_federate.sh", FAKE_FEDERATE)
}

pub fn hanging_federate(dir: &Path) -> String {
    write_program(dir, "hanging_federate.sh", HANGING_FEDERATE)
}

/// Settings for a small sweep under `root` that never touches real runtimes.
pub fn test_settings(root: &Path, federate_program: String) -> SweepSettings {
    SweepSettings {
        experiment_name: "sweep".to_string(),
        output_root: root.to_path_buf(),
        federate_numbers: vec![1, 2],
        message_numbers: vec![1],
        byte_numbers: vec![4],
        core_types: vec!["zmq".to_string(), "tcp".to_string()],
        simulation_timeout_secs: 20,
        settle_delay_ms: 0,
        cleanup_patterns: Vec::new(),
        broker_program: Some("true".to_string()),
        federate_program: Some(federate_program),
        show_progress: false,
        ..SweepSettings::default()
    }
}

/// Create an experiment directory holding only `script` as its launch script.
pub fn experiment_with_script(root: &Path, script: &str) -> PathBuf {
    let dir = root.join("experiment");
    fs::create_dir_all(&dir).expect("experiment dir should be creatable");
    write_launch_script(&dir, script).expect("launch script should be writable");
    dir
}

/// True while `pid` exists and is not a zombie.
pub fn process_alive(pid: u32) -> bool {
    match fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .and_then(|rest| rest.split_whitespace().next())
            .map(|state| state != "Z" && state != "X")
            .unwrap_or(false),
        Err(_) => false,
    }
}
