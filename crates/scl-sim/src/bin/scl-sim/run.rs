//! Transpile and free-stepping commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use scl_sim::context::WatchRow;
use scl_sim::{transpile, ExecutionContext, SimConfig, SimulationEngine, Snippet, UnitDescription};
use tracing::debug;

use crate::cli::UnitArgs;
use crate::style;

pub struct LoadedUnit {
    pub context: ExecutionContext,
    pub snippet: Snippet,
}

pub fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SimConfig> {
    match path {
        Some(path) => {
            SimConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
        }
        None => Ok(SimConfig::default()),
    }
}

pub fn load_unit(args: &UnitArgs) -> anyhow::Result<LoadedUnit> {
    let source = read_text(&args.source)?;
    let description = UnitDescription::load(&args.unit)
        .with_context(|| format!("failed to load {}", args.unit.display()))?;
    let context = description.context(&source);
    debug!(
        unit = %description.name,
        variables = description.variables.len(),
        "unit description loaded"
    );
    let snippet = transpile(&source, &context)?;
    Ok(LoadedUnit { context, snippet })
}

pub fn run_transpile(args: &UnitArgs) -> anyhow::Result<()> {
    let unit = load_unit(args)?;
    println!("{}", unit.snippet);
    Ok(())
}

pub fn run_scans(args: &UnitArgs, scans: u32, config: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let LoadedUnit { context, snippet } = load_unit(args)?;
    let engine = SimulationEngine::new(config.engine);
    engine.compile(&snippet, context)?;
    engine.step_scans(scans)?;

    let rows = engine.with_context(|ctx| ctx.watch_rows())?;
    print_rows(&rows);
    let stats = engine.cycle_stats();
    println!(
        "{}",
        style::muted(format!(
            "{} scan(s), last {:?}, min {:?}, max {:?}",
            stats.scans, stats.last, stats.min, stats.max
        ))
    );
    Ok(())
}

fn print_rows(rows: &[WatchRow]) {
    let name_width = rows.iter().map(|row| row.name.len()).max().unwrap_or(0).max(4);
    let type_width = rows
        .iter()
        .map(|row| row.type_name.len())
        .max()
        .unwrap_or(0)
        .max(4);
    println!(
        "{}",
        style::accent(format!(
            "{:<name_width$}  {:<type_width$}  {:<9}  VALUE",
            "NAME", "TYPE", "DIRECTION"
        ))
    );
    for row in rows {
        println!(
            "{:<name_width$}  {:<type_width$}  {:<9}  {}",
            row.name,
            row.type_name,
            row.direction.name(),
            row.value
        );
    }
}
