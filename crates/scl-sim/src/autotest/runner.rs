//! Script execution against a compiled engine.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::clock::TickSource;
use crate::config::TestConfig;
use crate::engine::{EngineState, ScanWindow, SimulationEngine};
use crate::error::SimError;
use crate::value::Value;

use super::script::{statement_lines, RunUnit, Statement};
use super::timing::TimingSeries;

/// Category of a log line, for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Header,
    Step,
    Input,
    Pass,
    Fail,
    Change,
    NoChange,
    Error,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestLogLine {
    pub kind: LogKind,
    pub text: String,
}

impl fmt::Display for TestLogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Outcome of one script run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestReport {
    pub passed: u32,
    pub failed: u32,
    /// A statement errored and the remaining lines were skipped.
    pub aborted: bool,
    pub log: Vec<TestLogLine>,
    pub timing: TimingSeries,
}

impl TestReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Log lines of one kind.
    pub fn lines(&self, kind: LogKind) -> impl Iterator<Item = &str> {
        self.log
            .iter()
            .filter(move |line| line.kind == kind)
            .map(|line| line.text.as_str())
    }
}

pub type LogCallback = Arc<dyn Fn(&TestLogLine) + Send + Sync>;

/// Tolerant comparison of an observed value against script text: exact
/// text (any case), then boolean/`0`/`1` synonyms, then numeric distance.
#[must_use]
pub fn values_match(actual: &Value, expected: &str, tolerance: f64) -> bool {
    let expected = expected.trim();
    let shown = actual.display();
    if shown.eq_ignore_ascii_case(expected) {
        return true;
    }
    if let Value::String(text) = actual {
        let unquoted = expected
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
            .unwrap_or(expected);
        return text.as_str() == unquoted;
    }
    let synonym = match expected {
        "1" => Some("TRUE"),
        "0" => Some("FALSE"),
        text if text.eq_ignore_ascii_case("TRUE") => Some("1"),
        text if text.eq_ignore_ascii_case("FALSE") => Some("0"),
        _ => None,
    };
    if synonym.is_some_and(|synonym| shown == synonym) {
        return true;
    }
    if matches!(actual, Value::Bool(_)) {
        return false;
    }
    match (actual.as_f64(), expected.parse::<f64>()) {
        (Some(actual), Ok(expected)) => (actual - expected).abs() <= tolerance + f64::EPSILON,
        _ => false,
    }
}

/// Runs test scripts against one engine.
pub struct TestRunner<'a> {
    engine: &'a SimulationEngine,
    config: TestConfig,
    on_log: Option<LogCallback>,
}

impl fmt::Debug for TestRunner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRunner")
            .field("engine", self.engine)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> TestRunner<'a> {
    #[must_use]
    pub fn new(engine: &'a SimulationEngine, config: TestConfig) -> Self {
        Self {
            engine,
            config,
            on_log: None,
        }
    }

    /// Receives every log line as it is produced.
    #[must_use]
    pub fn with_log_callback(mut self, callback: LogCallback) -> Self {
        self.on_log = Some(callback);
        self
    }

    /// Executes `script` to completion or to its first error.
    ///
    /// A running engine is paused for the duration and resumed afterwards.
    /// Virtual time is enabled and seeded from the real clock first, and is
    /// always disabled again before this returns.
    pub fn run_script(&self, script: &str) -> TestReport {
        let _guard = ScriptGuard::enter(self.engine);
        let mut session = Session {
            runner: self,
            report: TestReport::default(),
            scan: 0,
        };
        session.run(script);
        session.report
    }
}

/// Pauses a running engine and switches its clock to virtual time until
/// dropped.
struct ScriptGuard<'a> {
    engine: &'a SimulationEngine,
    clock: TickSource,
    resume: bool,
}

impl<'a> ScriptGuard<'a> {
    fn enter(engine: &'a SimulationEngine) -> Self {
        let resume = engine.state() == EngineState::Running;
        if resume {
            engine.pause();
        }
        let clock = engine.tick_source();
        clock.enable_virtual_from_real();
        Self {
            engine,
            clock,
            resume,
        }
    }
}

impl Drop for ScriptGuard<'_> {
    fn drop(&mut self) {
        self.clock.disable_virtual();
        if self.resume {
            if let Err(err) = self.engine.start() {
                warn!(error = %err, "engine did not resume after test");
            }
        }
    }
}

struct Session<'r, 'a> {
    runner: &'r TestRunner<'a>,
    report: TestReport,
    scan: u64,
}

impl Session<'_, '_> {
    fn run(&mut self, script: &str) {
        info!(
            unit = self.unit_name().as_deref().unwrap_or("?"),
            "test script started"
        );
        self.sample();
        self.log(LogKind::Header, "=== STARTING AUTOMATED TEST ===".to_string());

        for (step, (line, text)) in statement_lines(script).enumerate() {
            self.log(LogKind::Step, format!("[STEP {}] {text}", step + 1));
            if let Err(err) = self.execute(line, text) {
                warn!(line, error = %err, "test script aborted");
                self.log(LogKind::Error, format!("  ▶ ERROR: {}", error_text(&err)));
                self.report.failed += 1;
                self.report.aborted = true;
                break;
            }
        }

        self.sample();
        let TestReport { passed, failed, .. } = self.report;
        self.log(
            LogKind::Summary,
            format!("=== TEST COMPLETED: {passed} PASSED, {failed} FAILED ==="),
        );
        info!(passed, failed, "test script finished");
    }

    fn unit_name(&self) -> Option<String> {
        self.runner
            .engine
            .with_context(|ctx| ctx.unit_name().to_string())
            .ok()
    }

    fn log(&mut self, kind: LogKind, text: String) {
        debug!("{text}");
        let line = TestLogLine { kind, text };
        if let Some(callback) = &self.runner.on_log {
            callback(&line);
        }
        self.report.log.push(line);
    }

    fn execute(&mut self, line: usize, text: &str) -> Result<(), SimError> {
        let engine = self.runner.engine;
        match Statement::parse(line, text)? {
            Statement::Set { path, value } => {
                engine.with_context(|ctx| ctx.write_path_text(&path, &value))??;
                self.log(LogKind::Input, format!("  ▶ IN: {path} set to {value}"));
            }
            Statement::Run { amount, unit } => {
                let window = self.run_window(amount, unit)?;
                self.log_delta(&window.before, &window.after);
            }
            Statement::Assert { path, expected } => {
                let actual = engine.with_context(|ctx| ctx.read_path(&path))??;
                if values_match(&actual, &expected, self.runner.config.float_tolerance) {
                    self.log(LogKind::Pass, format!("  ▶ PASS ({})", actual.display()));
                    self.report.passed += 1;
                } else {
                    self.log(
                        LogKind::Fail,
                        format!("  ▶ FAIL: Expected {expected}, got {}", actual.display()),
                    );
                    self.report.failed += 1;
                }
            }
        }
        Ok(())
    }

    /// One scan per configured interval, all under a single engine lock.
    /// `MS` windows longer than the full sampling limit keep every
    /// `sample_stride`-th scan plus the last.
    fn run_window(&mut self, amount: u64, unit: RunUnit) -> Result<ScanWindow, SimError> {
        let config = self.runner.config;
        let interval = config.scan_interval_ms.max(1);
        let scans = match unit {
            RunUnit::Scans => amount,
            RunUnit::Ms => (amount / interval.unsigned_abs()).max(1),
        };
        let first = self.scan;
        let mut completed = 0;
        let timing = &mut self.report.timing;
        let result = self.runner.engine.run_window(scans, interval, |i, ctx| {
            completed = i + 1;
            let keep = unit == RunUnit::Scans
                || scans <= config.sample_full_limit
                || i % config.sample_stride.max(1) == 0
                || i + 1 == scans;
            if keep {
                timing.record(first + completed, ctx.signal_samples());
            }
        });
        self.scan = first + completed;
        result
    }

    fn sample(&mut self) {
        match self.runner.engine.with_context(|ctx| ctx.signal_samples()) {
            Ok(samples) => self.report.timing.record(self.scan, samples),
            Err(err) => debug!(error = %err, scan = self.scan, "timing sample skipped"),
        }
    }

    fn log_delta(&mut self, before: &IndexMap<String, String>, after: &IndexMap<String, String>) {
        let changes: Vec<String> = after
            .iter()
            .filter_map(|(name, post)| {
                let pre = before.get(name)?;
                (pre != post).then(|| format!("  ▶ OUT: {name} changed ({pre} -> {post})"))
            })
            .collect();
        if changes.is_empty() {
            self.log(LogKind::NoChange, "  ▶ (No output changes)".to_string());
        }
        for change in changes {
            self.log(LogKind::Change, change);
        }
    }
}

/// Script errors already carry their line in the step header.
fn error_text(err: &SimError) -> String {
    match err {
        SimError::Script { message, .. } => message.to_string(),
        other => other.to_string(),
    }
}

/// Runs `script` on a worker thread so the caller is not blocked.
pub fn spawn_script(
    engine: Arc<SimulationEngine>,
    config: TestConfig,
    script: String,
    on_log: Option<LogCallback>,
) -> Result<JoinHandle<TestReport>, SimError> {
    thread::Builder::new()
        .name("scl-sim-test".into())
        .spawn(move || {
            let mut runner = TestRunner::new(&engine, config);
            if let Some(callback) = on_log {
                runner = runner.with_log_callback(callback);
            }
            runner.run_script(&script)
        })
        .map_err(|err| SimError::ThreadSpawn(err.to_string().into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_match_their_numeric_synonyms() {
        assert!(values_match(&Value::Bool(false), "0", 0.01));
        assert!(values_match(&Value::Bool(true), "true", 0.01));
        assert!(values_match(&Value::Int(1), "TRUE", 0.01));
        assert!(!values_match(&Value::Bool(true), "0", 0.01));
        assert!(!values_match(&Value::Bool(false), "0.001", 0.01));
    }

    #[test]
    fn reals_match_within_tolerance() {
        assert!(values_match(&Value::Real(3.1405), "3.141", 0.01));
        assert!(values_match(&Value::Real(3.1415), "3.141", 0.01));
        assert!(values_match(&Value::Real(3.15), "3.141", 0.01));
        assert!(!values_match(&Value::Real(3.2), "3.141", 0.01));
        assert!(values_match(&Value::Int(42), "42", 0.01));
        assert!(!values_match(&Value::Int(42), "abc", 0.01));
    }

    #[test]
    fn strings_compare_exactly() {
        assert!(values_match(&Value::String("Idle".into()), "'Idle'", 0.01));
        assert!(values_match(&Value::String("Idle".into()), "idle", 0.01));
        assert!(!values_match(&Value::String("Idle".into()), "'Busy'", 0.01));
    }
}
