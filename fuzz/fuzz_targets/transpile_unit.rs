#![no_main]

use libfuzzer_sys::fuzz_target;
use scl_sim::clock::FixedClock;
use scl_sim::context::{Direction, ExecutionContext, UnitKind, VariableDecl};
use scl_sim::eval;
use scl_sim::transpile::transpile;
use scl_sim::Clock;

const MAX_SOURCE_BYTES: usize = 4096;

fn decls() -> Vec<VariableDecl> {
    vec![
        VariableDecl::new("x", "DInt", Direction::Static),
        VariableDecl::new("r", "Real", Direction::Static),
        VariableDecl::new("b", "Bool", Direction::Input),
        VariableDecl::new("arr", "Array[0..3] of Int", Direction::Static),
        VariableDecl::new("t", "TON", Direction::Static),
    ]
}

fuzz_target!(|data: &[u8]| {
    let capped = &data[..data.len().min(MAX_SOURCE_BYTES)];
    let body = String::from_utf8_lossy(capped);
    let source = format!("PROGRAM Main\nBEGIN\n{body}\nEND_PROGRAM\n");

    let mut ctx = ExecutionContext::new("Main", UnitKind::Program, &decls(), &source);
    let Ok(snippet) = transpile(&source, &ctx) else {
        return;
    };
    let Ok(unit) = eval::compile(&snippet, &ctx) else {
        return;
    };
    // Faults are fine; panics are not.
    let _ = unit.scan(
        &mut ctx,
        FixedClock(0).now_ms(),
        Some(std::time::Duration::from_millis(20)),
    );
});
