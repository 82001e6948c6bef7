use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use scl_sim::context::{Direction, ExecutionContext, UnitKind, VariableDecl};
use scl_sim::engine::{EngineState, SimulationEngine};
use scl_sim::error::{RuntimeError, SimError};
use scl_sim::transpile::transpile;
use scl_sim::value::Value;
use scl_sim::EngineConfig;

fn engine_with(body: &str, decls: &[VariableDecl], config: EngineConfig) -> SimulationEngine {
    let source = format!("PROGRAM Main\nBEGIN\n{body}\nEND_PROGRAM");
    let ctx = ExecutionContext::new("Main", UnitKind::Program, decls, &source);
    let snippet = transpile(&source, &ctx).unwrap();
    let engine = SimulationEngine::new(config);
    engine.compile(&snippet, ctx).unwrap();
    engine
}

fn counter() -> SimulationEngine {
    engine_with(
        "#n := #n + 1;",
        &[VariableDecl::new("n", "Int", Direction::Static)],
        EngineConfig::default(),
    )
}

fn read(engine: &SimulationEngine, path: &str) -> Value {
    engine.with_context(|ctx| ctx.read_path(path)).unwrap().unwrap()
}

fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn stepping_runs_exactly_the_requested_scans() {
    let engine = counter();
    engine.step_scans(5).unwrap();
    assert_eq!(read(&engine, "n"), Value::Int(5));
    assert_eq!(engine.cycle_stats().scans, 5);
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[test]
fn nothing_runs_before_compile() {
    let engine = SimulationEngine::default();
    assert!(!engine.is_compiled());
    assert!(matches!(engine.step_scans(1), Err(SimError::NotCompiled)));
    assert!(matches!(engine.start(), Err(SimError::NotCompiled)));
    assert!(matches!(engine.with_context(|_| ()), Err(SimError::NotCompiled)));
}

#[test]
fn free_running_loop_pauses_and_resumes() {
    let engine = counter();
    engine.start().unwrap();
    assert_eq!(engine.state(), EngineState::Running);
    wait_until(|| read(&engine, "n") != Value::Int(0));

    engine.pause();
    assert_eq!(engine.state(), EngineState::Paused);
    let held = read(&engine, "n");
    thread::sleep(Duration::from_millis(50));
    assert_eq!(read(&engine, "n"), held);

    engine.start().unwrap();
    assert_eq!(engine.state(), EngineState::Running);
    wait_until(|| read(&engine, "n") != held);

    engine.stop();
    assert_eq!(engine.state(), EngineState::Stopped);
    let stopped = read(&engine, "n");
    thread::sleep(Duration::from_millis(50));
    assert_eq!(read(&engine, "n"), stopped);
}

#[test]
fn restart_restores_initial_values() {
    let engine = engine_with(
        "#n := #n + 1;",
        &[VariableDecl::new("n", "Int", Direction::Static).with_initial("100")],
        EngineConfig::default(),
    );
    engine.step_scans(3).unwrap();
    assert_eq!(read(&engine, "n"), Value::Int(103));

    engine.restart().unwrap();
    assert_eq!(read(&engine, "n"), Value::Int(100));
    assert_eq!(engine.state(), EngineState::Stopped);
    assert_eq!(engine.cycle_stats().scans, 0);
    assert!(engine.is_compiled());
}

#[test]
fn stepped_fault_is_returned_and_memory_kept() {
    let engine = engine_with(
        "#x := 5;\n#y := #x / #z;",
        &[
            VariableDecl::new("x", "Int", Direction::Static),
            VariableDecl::new("y", "Int", Direction::Static),
            VariableDecl::new("z", "Int", Direction::Static),
        ],
        EngineConfig::default(),
    );
    let err = engine.step_scans(1).unwrap_err();
    assert!(matches!(err, SimError::Runtime(RuntimeError::DivisionByZero)));
    assert_eq!(engine.last_error(), Some(RuntimeError::DivisionByZero));
    assert_eq!(read(&engine, "x"), Value::Int(0));

    engine.with_context(|ctx| ctx.write_path("z", Value::Int(5))).unwrap().unwrap();
    engine.step_scans(1).unwrap();
    assert_eq!(read(&engine, "y"), Value::Int(1));
}

#[test]
fn loop_fault_stops_engine_and_notifies() {
    let engine = engine_with(
        "#y := 10 MOD #z;",
        &[
            VariableDecl::new("y", "Int", Direction::Static),
            VariableDecl::new("z", "Int", Direction::Static),
        ],
        EngineConfig::default(),
    );
    let seen: Arc<Mutex<Vec<RuntimeError>>> = Arc::default();
    let sink = Arc::clone(&seen);
    engine.on_error(move |err| sink.lock().push(err.clone()));

    engine.start().unwrap();
    wait_until(|| !seen.lock().is_empty());
    assert_eq!(engine.state(), EngineState::Faulted);
    assert_eq!(seen.lock().as_slice(), &[RuntimeError::ModuloByZero]);
    assert_eq!(engine.last_error(), Some(RuntimeError::ModuloByZero));

    // A faulted engine starts again once the cause is gone.
    engine.with_context(|ctx| ctx.write_path("z", Value::Int(3))).unwrap().unwrap();
    engine.start().unwrap();
    wait_until(|| read(&engine, "y") == Value::Int(1));
    engine.stop();
}

#[test]
fn watchdog_aborts_a_runaway_scan() {
    let config = EngineConfig {
        scan_timeout: Some(Duration::from_millis(30)),
        ..EngineConfig::default()
    };
    let engine = engine_with(
        "WHILE TRUE DO\n   #x := #x + 1;\nEND_WHILE;",
        &[VariableDecl::new("x", "DInt", Direction::Static)],
        config,
    );
    let err = engine.step_scans(1).unwrap_err();
    assert!(matches!(
        err,
        SimError::Runtime(RuntimeError::WatchdogTimeout { limit_ms: 30 })
    ));
    assert_eq!(read(&engine, "x"), Value::Int(0));
}

#[test]
fn virtual_time_drives_timers_deterministically() {
    let engine = engine_with(
        "#Timer(IN := TRUE, PT := T#100ms);\n#Done := #Timer.Q;",
        &[
            VariableDecl::new("Timer", "TON", Direction::Static),
            VariableDecl::new("Done", "Bool", Direction::Output),
        ],
        EngineConfig::default(),
    );
    let clock = engine.tick_source();
    clock.set_virtual_now(0);

    // First scan at t=10 starts the timer.
    engine.step_scans_by(10, 10).unwrap();
    assert_eq!(read(&engine, "Done"), Value::Bool(false));
    assert_eq!(read(&engine, "Timer.ET"), Value::Int(90));

    engine.step_scans_by(1, 10).unwrap();
    assert_eq!(read(&engine, "Done"), Value::Bool(true));
    assert_eq!(read(&engine, "Timer.ET"), Value::Int(100));
    clock.disable_virtual();
}

#[test]
fn compile_errors_keep_engine_uncompiled() {
    let source = "PROGRAM Main\nBEGIN\n#x := missing;\nEND_PROGRAM";
    let decls = [VariableDecl::new("x", "Int", Direction::Static)];
    let ctx = ExecutionContext::new("Main", UnitKind::Program, &decls, source);
    let snippet = transpile(source, &ctx).unwrap();
    let engine = SimulationEngine::default();
    let err = engine.compile(&snippet, ctx).unwrap_err();
    let SimError::Compilation { diagnostics, snippet } = err else {
        panic!("expected a compilation error");
    };
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 3);
    assert!(snippet.contains("x = missing;"));
    assert!(!engine.is_compiled());
}
