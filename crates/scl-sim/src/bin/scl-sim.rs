//! CLI entrypoint for the SCL simulator.

#[path = "scl-sim/cli.rs"]
mod cli;
#[path = "scl-sim/completions.rs"]
mod completions;
#[path = "scl-sim/run.rs"]
mod run;
#[path = "scl-sim/style.rs"]
mod style;
#[path = "scl-sim/test.rs"]
mod test;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", style::error(format!("Error: {}", format_error_with_tip(&err))));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Transpile { unit } => run::run_transpile(&unit),
        Command::Run {
            unit,
            scans,
            config,
        } => run::run_scans(&unit, scans, config.as_ref()),
        Command::Test {
            unit,
            script,
            config,
            timing,
        } => test::run_test(&unit, &script, config.as_ref(), timing.as_ref()),
        Command::Completions { shell } => completions::run_completions(shell),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn format_error_with_tip(err: &anyhow::Error) -> String {
    let message = format!("{err:#}");
    let tip = if message.contains("Unsupported HW function") {
        Some("Tip: hardware and communication calls cannot run locally; simulate the unit that wraps them instead.")
    } else if message.contains("invalid config") {
        Some("Tip: check the [engine]/[test] keys of the settings file or the [unit]/[[variables]] tables of the unit description.")
    } else {
        None
    };
    match tip {
        Some(tip) => format!("{message}\n{tip}"),
        None => message,
    }
}
