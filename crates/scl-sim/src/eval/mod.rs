//! Compilation of translated units and scan execution.
//!
//! A [`Snippet`] is lowered to a small typed IR with every variable resolved
//! to its memory slot; [`CompiledUnit::scan`] interprets it against a copy of
//! the context's memory and writes the copy back when the scan completes.

#![allow(missing_docs)]

mod compile;
mod exec;
mod ops;

use std::time::Duration;

use smol_str::SmolStr;

use crate::context::{ExecutionContext, UnitKind};
use crate::error::{RuntimeError, SimError};
use crate::stdlib::StdFunction;
use crate::transpile::ast::{BinaryOp, UnaryOp};
use crate::transpile::Snippet;
use crate::value::{DataType, Value};

/// Resolved memory location: a slot followed by field and index steps.
#[derive(Debug, Clone)]
pub(crate) struct Location {
    pub(crate) slot: usize,
    pub(crate) path: Vec<Step>,
}

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Field(SmolStr),
    Index(Node),
}

/// Typed expression.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Const(Value),
    Load(Location),
    /// Function block member read.
    Member {
        target: Location,
        member: &'static str,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Convert {
        operand: Box<Node>,
        to: DataType,
    },
    Call {
        func: StdFunction,
        args: Vec<Node>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Output {
    pub(crate) member: &'static str,
    pub(crate) target: Location,
    pub(crate) ty: DataType,
}

#[derive(Debug, Clone)]
pub(crate) enum Op {
    Store {
        target: Location,
        value: Node,
    },
    SetInput {
        target: Location,
        member: &'static str,
        value: Node,
    },
    Invoke {
        target: Location,
        inputs: Vec<(&'static str, Node)>,
        outputs: Vec<Output>,
    },
    Eval(Node),
    If {
        branches: Vec<(Node, Vec<Op>)>,
        else_body: Vec<Op>,
    },
    Case {
        selector: Node,
        arms: Vec<(Vec<(i64, i64)>, Vec<Op>)>,
        else_body: Vec<Op>,
    },
    For {
        var: Location,
        from: Node,
        to: Node,
        by: Node,
        body: Vec<Op>,
    },
    While {
        cond: Node,
        body: Vec<Op>,
    },
    Repeat {
        body: Vec<Op>,
        until: Node,
    },
    Exit,
    Continue,
    Return,
}

/// An executable unit. Holds no memory of its own; every scan runs against
/// the context it is given.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    unit: SmolStr,
    kind: UnitKind,
    slots: usize,
    body: Vec<Op>,
}

impl CompiledUnit {
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    #[must_use]
    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Runs the body once. `now` is the scan's tick in milliseconds, shared
    /// by every timer the body calls. Memory is only updated when the scan
    /// completes without a fault.
    pub fn scan(
        &self,
        ctx: &mut ExecutionContext,
        now: i64,
        watchdog: Option<Duration>,
    ) -> Result<(), RuntimeError> {
        if ctx.len() != self.slots {
            return Err(RuntimeError::TypeMismatch(
                format!("unit expects {} variables, memory has {}", self.slots, ctx.len()).into(),
            ));
        }
        let mut frame: Vec<Value> = ctx.tags().map(|tag| tag.value.clone()).collect();
        exec::Machine::new(&mut frame, now, watchdog).run(&self.body)?;
        for (slot, value) in frame.into_iter().enumerate() {
            if let Some(stored) = ctx.value_at_mut(slot) {
                *stored = value;
            }
        }
        Ok(())
    }
}

/// Type-checks and lowers a snippet. Every problem found is reported at
/// once, together with the rendered snippet.
pub fn compile(snippet: &Snippet, ctx: &ExecutionContext) -> Result<CompiledUnit, SimError> {
    let (body, mut diagnostics) = compile::lower(snippet);
    if snippet.locals.len() != ctx.len() {
        diagnostics.insert(
            0,
            crate::error::Diagnostic::new(
                0,
                format!(
                    "snippet maps {} variables but the context declares {}",
                    snippet.locals.len(),
                    ctx.len()
                ),
            ),
        );
    }
    if !diagnostics.is_empty() {
        return Err(SimError::Compilation {
            diagnostics,
            snippet: snippet.text().to_string(),
        });
    }
    Ok(CompiledUnit {
        unit: snippet.unit.clone(),
        kind: snippet.kind,
        slots: ctx.len(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::context::{Direction, VariableDecl};
    use crate::transpile::transpile;

    fn build(body: &str, decls: &[VariableDecl]) -> (ExecutionContext, Result<CompiledUnit, SimError>) {
        let source = format!(
            "TYPE Mode : (Idle, Run, Stop); END_TYPE\n\
             TYPE Point : STRUCT x : Real; y : Int; END_STRUCT; END_TYPE\n\
             PROGRAM Main\nBEGIN\n{body}\nEND_PROGRAM"
        );
        let ctx = ExecutionContext::new("Main", UnitKind::Program, decls, &source);
        let snippet = transpile(&source, &ctx).unwrap();
        let unit = compile(&snippet, &ctx);
        (ctx, unit)
    }

    fn run(body: &str, decls: &[VariableDecl]) -> ExecutionContext {
        let (mut ctx, unit) = build(body, decls);
        let unit = unit.unwrap();
        unit.scan(&mut ctx, FixedClock(0).now_ms(), None).unwrap();
        ctx
    }

    fn var(name: &str, ty: &str) -> VariableDecl {
        VariableDecl::new(name, ty, Direction::Static)
    }

    #[test]
    fn arithmetic_and_widening() {
        let ctx = run(
            "i := 7 / 2; r := i; m := 7 MOD 3; p := 2 ** 3;",
            &[var("i", "Int"), var("r", "Real"), var("m", "DInt"), var("p", "Real")],
        );
        assert_eq!(ctx.read_path("i").unwrap(), Value::Int(3));
        assert_eq!(ctx.read_path("r").unwrap(), Value::Real(3.0));
        assert_eq!(ctx.read_path("m").unwrap(), Value::Int(1));
        assert_eq!(ctx.read_path("p").unwrap(), Value::Real(8.0));
    }

    #[test]
    fn loops_and_case() {
        let ctx = run(
            "sum := 0;\n\
             FOR i := 1 TO 10 DO\n  IF i = 8 THEN EXIT; END_IF;\n  IF i MOD 2 = 0 THEN CONTINUE; END_IF;\n  sum := sum + i;\nEND_FOR;\n\
             CASE sum OF\n  1..9: label := 1;\n  16: label := 2;\nELSE\n  label := 3;\nEND_CASE;\n\
             REPEAT n := n + 1; UNTIL n >= 3 END_REPEAT;\n\
             WHILE n < 5 DO n := n + 1; END_WHILE;",
            &[var("sum", "Int"), var("i", "Int"), var("label", "Int"), var("n", "Int")],
        );
        assert_eq!(ctx.read_path("sum").unwrap(), Value::Int(16));
        assert_eq!(ctx.read_path("label").unwrap(), Value::Int(2));
        assert_eq!(ctx.read_path("n").unwrap(), Value::Int(5));
    }

    #[test]
    fn structs_arrays_and_enums() {
        let ctx = run(
            "pt.x := 1.5; pt.y := 2; arr[2] := pt.y * 10; state := Mode#Stop; other := Run;",
            &[
                var("pt", "Point"),
                var("arr", "Array[1..3] of Int"),
                var("state", "Mode"),
                var("other", "Mode"),
            ],
        );
        assert_eq!(ctx.read_path("pt.x").unwrap(), Value::Real(1.5));
        assert_eq!(ctx.read_path("arr[2]").unwrap(), Value::Int(20));
        assert_eq!(ctx.read_path("state").unwrap(), Value::Int(2));
        assert_eq!(ctx.read_path("other").unwrap(), Value::Int(1));
    }

    #[test]
    fn diagnostics_collect_every_problem() {
        let (_, unit) = build(
            "x := missing;\nEXIT;\nflag := 1.5;\ny := NOPE(1);\nz := %I0.0;",
            &[var("x", "Int"), var("flag", "Bool"), var("y", "Int"), var("z", "Bool")],
        );
        let Err(SimError::Compilation { diagnostics, snippet }) = unit else {
            panic!("expected a compilation error");
        };
        let lines: Vec<usize> = diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![5, 6, 7, 8, 9]);
        assert!(snippet.contains("// --- LOGIC ---"));
    }

    #[test]
    fn runtime_fault_leaves_memory_untouched() {
        let (mut ctx, unit) = build("x := 5; y := x / z;", &[var("x", "Int"), var("y", "Int"), var("z", "Int")]);
        let err = unit.unwrap().scan(&mut ctx, 0, None).unwrap_err();
        assert_eq!(err, RuntimeError::DivisionByZero);
        assert_eq!(ctx.read_path("x").unwrap(), Value::Int(0));
    }

    #[test]
    fn watchdog_stops_endless_loops() {
        let (mut ctx, unit) = build("WHILE TRUE DO x := x + 1; END_WHILE;", &[var("x", "Int")]);
        let err = unit
            .unwrap()
            .scan(&mut ctx, 0, Some(Duration::from_millis(20)))
            .unwrap_err();
        assert_eq!(err, RuntimeError::WatchdogTimeout { limit_ms: 20 });
    }
}
