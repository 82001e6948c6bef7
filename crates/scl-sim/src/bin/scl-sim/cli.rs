//! CLI definitions for scl-sim.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "scl-sim",
    version,
    about = "Scan-cycle simulator for SCL program units",
    infer_subcommands = true,
    after_help = "Examples:\n  scl-sim transpile --source conveyor.scl --unit conveyor.toml\n  scl-sim run --source conveyor.scl --unit conveyor.toml --scans 10\n  scl-sim test --source conveyor.scl --unit conveyor.toml --script start.test"
)]
pub struct Cli {
    /// Log debug details to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Unit source plus its interface description.
#[derive(Debug, Args)]
pub struct UnitArgs {
    /// SCL source file containing the unit.
    #[arg(long)]
    pub source: PathBuf,
    /// TOML description of the unit's name, kind and variables.
    #[arg(long)]
    pub unit: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the translated body of a unit.
    Transpile {
        #[command(flatten)]
        unit: UnitArgs,
    },
    /// Step a unit for a number of scans and print its memory.
    Run {
        #[command(flatten)]
        unit: UnitArgs,
        /// Number of scans to execute.
        #[arg(long, default_value_t = 1)]
        scans: u32,
        /// Simulator settings (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Execute a SET/RUN/ASSERT test script against a unit.
    #[command(
        after_help = "Script lines:\n  SET <path> = <value>\n  RUN <n> SCANS | RUN <n> MS\n  ASSERT <path> == <value>\n  // comment"
    )]
    Test {
        #[command(flatten)]
        unit: UnitArgs,
        /// Test script file.
        #[arg(long)]
        script: PathBuf,
        /// Simulator settings (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the recorded signal history as JSON.
        #[arg(long)]
        timing: Option<PathBuf>,
    },
    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}
