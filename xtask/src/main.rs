use std::io::Write;
use std::path::PathBuf;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use cosim_sweep::sweep::prepare_experiment;
use cosim_sweep::{Outcome, SweepController, SweepSettings};
use log::{error, info, LevelFilter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the co-simulation benchmark workspace",
    long_about = "A unified CLI for running benchmark sweeps and CI checks\n\
                  in the co-simulation benchmark workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a benchmark sweep described by a JSON settings file
    Sweep {
        /// Sweep settings; omitted fields take their defaults
        #[arg(long, env = "COSIM_SWEEP_CONFIG")]
        config: Option<PathBuf>,
        /// Override the folder the experiment folder is created in
        #[arg(long)]
        output_root: Option<PathBuf>,
        /// Only write the experiment directories, do not run anything
        #[arg(long)]
        dry_run: bool,
        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },
    /// Run CI checks (fmt, clippy, tests, examples)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build and run the examples
    Examples,
    /// Run check + examples
    All,
}

// ── helpers ────────────────────────────────────────────────────────

/// Configure the logger level and formatting string.
fn setup_logger(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();
}

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    match Command::new("cargo").args(args).status() {
        Ok(status) => status,
        Err(err) => {
            eprintln!("failed to execute cargo: {err}");
            exit(1);
        }
    }
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn load_settings(config: Option<PathBuf>, output_root: Option<PathBuf>) -> SweepSettings {
    let mut settings = match config {
        Some(path) => match SweepSettings::from_json_file(&path) {
            Ok(settings) => settings,
            Err(err) => {
                error!("{err}");
                exit(2);
            }
        },
        None => SweepSettings::default(),
    };
    if let Some(root) = output_root {
        settings.output_root = root;
    }
    if let Err(err) = settings.validate() {
        error!("invalid sweep settings: {err}");
        exit(2);
    }
    settings
}

// ── sweep ──────────────────────────────────────────────────────────

fn sweep(settings: SweepSettings) {
    let table = SweepController::new(settings).run();
    info!(
        "{} experiments: {} succeeded, {} failed, {} timed out",
        table.len(),
        table.count(Outcome::Success),
        table.count(Outcome::Failure),
        table.count(Outcome::Timeout)
    );
}

fn dry_run(settings: SweepSettings) {
    let root = settings.experiment_root();
    let mut failed = 0;
    for point in settings.grid().points() {
        let dir = point.directory(&root);
        match prepare_experiment(&settings, &point, &dir) {
            Ok(topology) => info!(
                "{point}: {} participants written to {}",
                topology.participants().len(),
                dir.display()
            ),
            Err(err) => {
                error!("{point}: {err}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        exit(1);
    }
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test cosim_core");
    run_cargo(&["test", "-p", "cosim_core"]);

    step("Test cosim_sweep");
    run_cargo(&["test", "-p", "cosim_sweep"]);
}

fn ci_examples() {
    step("Run parameter_sweep (experiment generation only)");
    run_cargo(&[
        "run",
        "-p",
        "cosim_sweep",
        "--example",
        "parameter_sweep",
    ]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sweep {
            config,
            output_root,
            dry_run: only_generate,
            debug,
        } => {
            setup_logger(debug);
            let settings = load_settings(config, output_root);
            if only_generate {
                dry_run(settings);
            } else {
                sweep(settings);
            }
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Examples => ci_examples(),
                CiJob::All => {
                    ci_check();
                    ci_examples();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
