//! Scripted test command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use scl_sim::autotest::TestLogLine;
use scl_sim::{SimulationEngine, TestRunner};

use crate::cli::UnitArgs;
use crate::run::{load_config, load_unit, read_text, LoadedUnit};
use crate::style;

pub fn run_test(
    args: &UnitArgs,
    script: &Path,
    config: Option<&PathBuf>,
    timing: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let text = read_text(script)?;
    let LoadedUnit { context, snippet } = load_unit(args)?;
    let engine = SimulationEngine::new(config.engine);
    engine.compile(&snippet, context)?;

    let report = TestRunner::new(&engine, config.test)
        .with_log_callback(Arc::new(|line: &TestLogLine| {
            println!("{}", style::log_line(line));
        }))
        .run_script(&text);

    if let Some(path) = timing {
        let json = report.timing.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if !report.succeeded() {
        anyhow::bail!(
            "{} assertion(s) passed, {} failed",
            report.passed,
            report.failed
        );
    }
    Ok(())
}
