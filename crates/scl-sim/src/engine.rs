//! Scan scheduler.
//!
//! One lock guards the memory map and the compiled unit. Every scan, forced
//! write and snapshot goes through it, so a scan's effects are atomic with
//! respect to observers. The free-running loop lives on its own thread and
//! only yields between scans.

#![allow(missing_docs)]

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info};

use crate::clock::{Clock, TickSource};
use crate::config::{EngineConfig, DEFAULT_SCAN_INTERVAL_MS};
use crate::context::ExecutionContext;
use crate::error::{RuntimeError, SimError};
use crate::eval::{self, CompiledUnit};
use crate::transpile::Snippet;

/// Tag snapshots taken around a [`SimulationEngine::run_window`], in the
/// form of [`ExecutionContext::snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanWindow {
    pub before: IndexMap<String, String>,
    pub after: IndexMap<String, String>,
}

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Stopped,
    Running,
    Paused,
    Faulted,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EngineState::Stopped => "stopped",
            EngineState::Running => "running",
            EngineState::Paused => "paused",
            EngineState::Faulted => "faulted",
        };
        f.write_str(text)
    }
}

/// Scan timing since the last compile or restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub scans: u64,
    pub last: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl CycleStats {
    fn record(&mut self, elapsed: Duration) {
        self.min = if self.scans == 0 {
            elapsed
        } else {
            self.min.min(elapsed)
        };
        self.max = self.max.max(elapsed);
        self.last = elapsed;
        self.scans = self.scans.saturating_add(1);
    }
}

type ErrorCallback = Arc<dyn Fn(&RuntimeError) + Send + Sync>;

#[derive(Default)]
struct Session {
    context: Option<ExecutionContext>,
    unit: Option<CompiledUnit>,
}

#[derive(Default)]
struct Control {
    state: EngineState,
    stop: bool,
}

struct Shared {
    session: Mutex<Session>,
    control: Mutex<Control>,
    wake: Condvar,
    stats: Mutex<CycleStats>,
    last_error: Mutex<Option<RuntimeError>>,
    on_error: Mutex<Option<ErrorCallback>>,
    clock: TickSource,
    config: EngineConfig,
}

impl Shared {
    /// prepare → invoke, under the caller's session lock. `now` is read
    /// once and shared by every timer in the scan.
    fn scan(&self, session: &mut Session) -> Result<(), SimError> {
        let Session { context, unit } = session;
        let (Some(context), Some(unit)) = (context.as_mut(), unit.as_ref()) else {
            return Err(SimError::NotCompiled);
        };
        let started = Instant::now();
        context.prepare_for_next_scan();
        let now = self.clock.now_ms();
        if let Err(err) = unit.scan(context, now, self.config.scan_timeout) {
            *self.last_error.lock() = Some(err.clone());
            return Err(err.into());
        }
        self.stats.lock().record(started.elapsed());
        Ok(())
    }

    fn fault(&self, err: &SimError) {
        error!(error = %err, "scan faulted; engine stopped");
        self.control.lock().state = EngineState::Faulted;
        let callback = self.on_error.lock().clone();
        if let (Some(callback), SimError::Runtime(runtime)) = (callback, err) {
            callback(runtime);
        }
    }
}

fn run_scan_loop(shared: &Shared) {
    let period = shared.config.scan_period;
    loop {
        let started = Instant::now();
        let result = {
            let mut session = shared.session.lock();
            let state = {
                let control = shared.control.lock();
                if control.stop {
                    break;
                }
                control.state
            };
            (state == EngineState::Running).then(|| shared.scan(&mut session))
        };
        if let Some(Err(err)) = result {
            shared.fault(&err);
            break;
        }

        let deadline = started + period;
        let mut control = shared.control.lock();
        while !control.stop && Instant::now() < deadline {
            shared.wake.wait_until(&mut control, deadline);
        }
    }
    debug!("scan loop exited");
}

/// Compiles units and schedules their scans.
pub struct SimulationEngine {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("state", &self.state())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SimulationEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(Session::default()),
                control: Mutex::new(Control::default()),
                wake: Condvar::new(),
                stats: Mutex::new(CycleStats::default()),
                last_error: Mutex::new(None),
                on_error: Mutex::new(None),
                clock: TickSource::new(),
                config,
            }),
            worker: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.shared.config
    }

    /// Clock consulted at the start of every scan.
    #[must_use]
    pub fn tick_source(&self) -> TickSource {
        self.shared.clock.clone()
    }

    /// Compiles `snippet` and installs it together with the memory it runs
    /// against. A running loop picks the new unit up at its next scan.
    pub fn compile(&self, snippet: &Snippet, context: ExecutionContext) -> Result<(), SimError> {
        let unit = eval::compile(snippet, &context)?;
        let name = unit.unit().to_string();
        {
            let mut session = self.shared.session.lock();
            session.context = Some(context);
            session.unit = Some(unit);
        }
        *self.shared.stats.lock() = CycleStats::default();
        info!(unit = %name, "unit compiled");
        Ok(())
    }

    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.shared.session.lock().unit.is_some()
    }

    /// Starts the free-running loop, or resumes it when paused.
    pub fn start(&self) -> Result<(), SimError> {
        if !self.is_compiled() {
            return Err(SimError::NotCompiled);
        }
        {
            let mut control = self.shared.control.lock();
            match control.state {
                EngineState::Running => return Ok(()),
                EngineState::Paused => {
                    control.state = EngineState::Running;
                    self.shared.wake.notify_all();
                    info!("engine resumed");
                    return Ok(());
                }
                EngineState::Stopped | EngineState::Faulted => {}
            }
        }
        self.join_worker();
        {
            let mut control = self.shared.control.lock();
            control.state = EngineState::Running;
            control.stop = false;
        }
        *self.shared.last_error.lock() = None;

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("scl-sim-scan".into())
            .spawn(move || run_scan_loop(&shared))
            .map_err(|err| {
                self.shared.control.lock().state = EngineState::Stopped;
                SimError::ThreadSpawn(err.to_string().into())
            })?;
        *self.worker.lock() = Some(handle);
        info!(period = ?self.shared.config.scan_period, "engine started");
        Ok(())
    }

    /// Holds the loop between scans; compiled state and memory are kept.
    pub fn pause(&self) {
        let mut control = self.shared.control.lock();
        if control.state == EngineState::Running {
            control.state = EngineState::Paused;
            info!("engine paused");
        }
    }

    /// Stops the loop between scans and waits for its thread.
    pub fn stop(&self) {
        let was_active = {
            let mut control = self.shared.control.lock();
            let active = matches!(control.state, EngineState::Running | EngineState::Paused);
            control.stop = true;
            control.state = EngineState::Stopped;
            self.shared.wake.notify_all();
            active
        };
        self.join_worker();
        if was_active {
            info!("engine stopped");
        }
    }

    fn join_worker(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            // A fault callback may call back into the engine from the worker.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }

    /// Runs exactly `count` scans on the caller's thread. A fault is
    /// returned to the caller and recorded as the last error.
    pub fn step_scans(&self, count: u32) -> Result<(), SimError> {
        self.step_scans_by(count, DEFAULT_SCAN_INTERVAL_MS)
    }

    /// Like [`step_scans`](Self::step_scans); while the tick source is
    /// virtual, each scan first advances it by `interval_ms`.
    pub fn step_scans_by(&self, count: u32, interval_ms: i64) -> Result<(), SimError> {
        for _ in 0..count {
            let mut session = self.shared.session.lock();
            self.shared.clock.advance(interval_ms);
            self.shared.scan(&mut session)?;
        }
        Ok(())
    }

    /// Runs `count` scans under one hold of the memory lock, advancing the
    /// clock by `interval_ms` before each. `on_scan` sees the context after
    /// every scan together with its zero-based index in the window. Tags
    /// cannot be read or forced by anyone else until the window ends.
    pub fn run_window(
        &self,
        count: u64,
        interval_ms: i64,
        mut on_scan: impl FnMut(u64, &ExecutionContext),
    ) -> Result<ScanWindow, SimError> {
        let mut session = self.shared.session.lock();
        let before = session
            .context
            .as_ref()
            .ok_or(SimError::NotCompiled)?
            .snapshot();
        for index in 0..count {
            self.shared.clock.advance(interval_ms);
            self.shared.scan(&mut session)?;
            if let Some(context) = &session.context {
                on_scan(index, context);
            }
        }
        let after = session
            .context
            .as_ref()
            .ok_or(SimError::NotCompiled)?
            .snapshot();
        debug!(count, interval_ms, "scan window finished");
        Ok(ScanWindow { before, after })
    }

    /// Stops the loop, restores every tag to its initial value and resumes
    /// if the loop was active. The compiled unit is kept.
    pub fn restart(&self) -> Result<(), SimError> {
        let resume = matches!(self.state(), EngineState::Running | EngineState::Paused);
        self.stop();
        self.with_context(ExecutionContext::reset)?;
        *self.shared.stats.lock() = CycleStats::default();
        *self.shared.last_error.lock() = None;
        info!(resume, "engine restarted");
        if resume {
            self.start()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.shared.control.lock().state
    }

    #[must_use]
    pub fn last_cycle_time(&self) -> Duration {
        self.shared.stats.lock().last
    }

    #[must_use]
    pub fn cycle_stats(&self) -> CycleStats {
        *self.shared.stats.lock()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<RuntimeError> {
        self.shared.last_error.lock().clone()
    }

    /// Called on the scan thread when the free-running loop faults.
    pub fn on_error(&self, callback: impl Fn(&RuntimeError) + Send + Sync + 'static) {
        *self.shared.on_error.lock() = Some(Arc::new(callback));
    }

    /// Runs `f` under the memory lock, between scans.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut ExecutionContext) -> R) -> Result<R, SimError> {
        let mut session = self.shared.session.lock();
        let context = session.context.as_mut().ok_or(SimError::NotCompiled)?;
        Ok(f(context))
    }
}

impl Drop for SimulationEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Direction, UnitKind, VariableDecl};
    use crate::transpile::transpile;
    use crate::value::Value;

    fn engine_with(body: &str) -> SimulationEngine {
        let source = format!("PROGRAM Main\nBEGIN\n{body}\nEND_PROGRAM");
        let decls = [
            VariableDecl::new("count", "Int", Direction::Static),
            VariableDecl::new("zero", "Int", Direction::Static),
        ];
        let ctx = ExecutionContext::new("Main", UnitKind::Program, &decls, &source);
        let snippet = transpile(&source, &ctx).unwrap();
        let engine = SimulationEngine::new(EngineConfig {
            scan_period: Duration::from_millis(1),
            scan_timeout: None,
        });
        engine.compile(&snippet, ctx).unwrap();
        engine
    }

    #[test]
    fn step_scans_runs_exactly_n() {
        let engine = engine_with("count := count + 1;");
        engine.step_scans(3).unwrap();
        assert_eq!(
            engine.with_context(|ctx| ctx.read_path("count")).unwrap().unwrap(),
            Value::Int(3)
        );
        assert_eq!(engine.cycle_stats().scans, 3);
    }

    #[test]
    fn start_requires_a_compiled_unit() {
        let engine = SimulationEngine::default();
        assert!(matches!(engine.start(), Err(SimError::NotCompiled)));
        assert!(matches!(engine.with_context(|_| ()), Err(SimError::NotCompiled)));
    }

    #[test]
    fn pause_and_resume_keep_state() {
        let engine = engine_with("count := count + 1;");
        engine.start().unwrap();
        assert_eq!(engine.state(), EngineState::Running);
        engine.pause();
        assert_eq!(engine.state(), EngineState::Paused);
        engine.start().unwrap();
        assert_eq!(engine.state(), EngineState::Running);
        engine.stop();
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn step_fault_is_returned_and_recorded() {
        let engine = engine_with("count := count / zero;");
        let err = engine.step_scans(1).unwrap_err();
        assert!(matches!(err, SimError::Runtime(RuntimeError::DivisionByZero)));
        assert_eq!(engine.last_error(), Some(RuntimeError::DivisionByZero));
    }
}
