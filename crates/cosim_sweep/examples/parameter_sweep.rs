//! Example: generate the experiment directories of a small sweep.
//!
//! This example demonstrates how to:
//! 1. Describe a sweep with `SweepSettings`
//! 2. Enumerate the grid points
//! 3. Write every participant document and launch script
//!
//! Nothing is executed, so no co-simulation runtime needs to be installed.
//! Use `cargo xtask sweep --config <file>` to run a real sweep.

use cosim_core::launch::LAUNCH_SCRIPT_NAME;
use cosim_core::TopologyKind;
use cosim_sweep::sweep::prepare_experiment;
use cosim_sweep::SweepSettings;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_root = std::env::temp_dir().join("cosim_parameter_sweep");
    let settings = SweepSettings {
        experiment_name: "ring_demo".to_string(),
        output_root,
        experiment_type: TopologyKind::Ring,
        federate_numbers: vec![3, 5],
        message_numbers: vec![2],
        byte_numbers: vec![64],
        core_types: vec!["zmq".to_string()],
        ring_neighbors: Some(2),
        ..SweepSettings::default()
    };
    settings.validate()?;

    let grid = settings.grid();
    println!("Generating {} experiments...", grid.total_points());

    let root = settings.experiment_root();
    for point in grid.points() {
        let dir = point.directory(&root);
        let topology = prepare_experiment(&settings, &point, &dir)?;
        println!(
            "{point}: {} participants, {} dangling subscriptions -> {}",
            topology.participants().len(),
            topology.dangling_subscriptions().len(),
            dir.display()
        );
    }

    if let Some(first) = grid.points().next() {
        let path = first.directory(&root).join(LAUNCH_SCRIPT_NAME);
        let script = std::fs::read_to_string(path)?;
        println!("\n=== Launch script of {first} ===\n{script}");
    }

    Ok(())
}
