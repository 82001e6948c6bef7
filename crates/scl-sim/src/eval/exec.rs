//! Interpreter for the lowered IR.

use std::time::{Duration, Instant};

use crate::error::RuntimeError;
use crate::stdlib::fbs::FbInstance;
use crate::stdlib::helpers::coerce;
use crate::transpile::ast::BinaryOp;
use crate::value::{mismatch, Value};

use super::{ops, Location, Node, Op, Step};

/// How control leaves a statement.
enum Flow {
    Next,
    Exit,
    Continue,
    Return,
}

struct Watchdog {
    started: Instant,
    limit: Duration,
}

pub(super) struct Machine<'a> {
    frame: &'a mut [Value],
    now: i64,
    watchdog: Option<Watchdog>,
}

impl<'a> Machine<'a> {
    pub(super) fn new(frame: &'a mut [Value], now: i64, limit: Option<Duration>) -> Self {
        Self {
            frame,
            now,
            watchdog: limit.map(|limit| Watchdog {
                started: Instant::now(),
                limit,
            }),
        }
    }

    pub(super) fn run(&mut self, body: &[Op]) -> Result<(), RuntimeError> {
        self.block(body)?;
        Ok(())
    }

    /// Checked on every loop back-edge.
    fn check_watchdog(&self) -> Result<(), RuntimeError> {
        match &self.watchdog {
            Some(watchdog) if watchdog.started.elapsed() > watchdog.limit => {
                Err(RuntimeError::WatchdogTimeout {
                    limit_ms: u64::try_from(watchdog.limit.as_millis()).unwrap_or(u64::MAX),
                })
            }
            _ => Ok(()),
        }
    }

    // ==== Statements ====

    fn block(&mut self, body: &[Op]) -> Result<Flow, RuntimeError> {
        for op in body {
            match self.exec(op)? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, op: &Op) -> Result<Flow, RuntimeError> {
        match op {
            Op::Store { target, value } => {
                let value = self.eval(value)?;
                *self.place_mut(target)? = value;
            }
            Op::SetInput {
                target,
                member,
                value,
            } => {
                let value = self.eval(value)?;
                self.instance_mut(target)?.set_input(member, &value)?;
            }
            Op::Invoke {
                target,
                inputs,
                outputs,
            } => {
                let values = inputs
                    .iter()
                    .map(|(member, node)| self.eval(node).map(|value| (*member, value)))
                    .collect::<Result<Vec<_>, _>>()?;
                let now = self.now;
                let instance = self.instance_mut(target)?;
                for (member, value) in &values {
                    instance.set_input(member, value)?;
                }
                instance.execute(now);
                let results = outputs
                    .iter()
                    .map(|output| {
                        instance
                            .get(output.member)
                            .ok_or_else(|| RuntimeError::UndefinedField(output.member.into()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                for (output, value) in outputs.iter().zip(results) {
                    let value = coerce(&value, &output.ty)?;
                    *self.place_mut(&output.target)? = value;
                }
            }
            Op::Eval(node) => {
                self.eval(node)?;
            }
            Op::If {
                branches,
                else_body,
            } => {
                for (cond, body) in branches {
                    if self.eval(cond)?.as_bool()? {
                        return self.block(body);
                    }
                }
                return self.block(else_body);
            }
            Op::Case {
                selector,
                arms,
                else_body,
            } => {
                let selector = self.eval(selector)?.as_i64()?;
                for (labels, body) in arms {
                    if labels
                        .iter()
                        .any(|(first, last)| (*first..=*last).contains(&selector))
                    {
                        return self.block(body);
                    }
                }
                return self.block(else_body);
            }
            Op::For {
                var,
                from,
                to,
                by,
                body,
            } => return self.for_loop(var, from, to, by, body),
            Op::While { cond, body } => {
                while self.eval(cond)?.as_bool()? {
                    self.check_watchdog()?;
                    match self.block(body)? {
                        Flow::Exit => break,
                        Flow::Return => return Ok(Flow::Return),
                        Flow::Next | Flow::Continue => {}
                    }
                }
            }
            Op::Repeat { body, until } => loop {
                self.check_watchdog()?;
                match self.block(body)? {
                    Flow::Exit => break,
                    Flow::Return => return Ok(Flow::Return),
                    Flow::Next | Flow::Continue => {}
                }
                if self.eval(until)?.as_bool()? {
                    break;
                }
            },
            Op::Exit => return Ok(Flow::Exit),
            Op::Continue => return Ok(Flow::Continue),
            Op::Return => return Ok(Flow::Return),
        }
        Ok(Flow::Next)
    }

    /// Bounds and step are evaluated once. The loop variable is re-read after
    /// each pass, so the body may move it; a step past the INT range ends the
    /// loop.
    fn for_loop(
        &mut self,
        var: &Location,
        from: &Node,
        to: &Node,
        by: &Node,
        body: &[Op],
    ) -> Result<Flow, RuntimeError> {
        let start = self.eval(from)?;
        let end = self.eval(to)?.as_i64()?;
        let step = self.eval(by)?.as_i64()?;
        if step == 0 {
            return Err(RuntimeError::ForStepZero);
        }
        *self.place_mut(var)? = start;
        loop {
            let current = self.place(var)?.as_i64()?;
            if (step > 0 && current > end) || (step < 0 && current < end) {
                break;
            }
            self.check_watchdog()?;
            match self.block(body)? {
                Flow::Exit => break,
                Flow::Return => return Ok(Flow::Return),
                Flow::Next | Flow::Continue => {}
            }
            let next = self.place(var)?.as_i64()?.saturating_add(step);
            let Ok(next) = i32::try_from(next) else {
                break;
            };
            *self.place_mut(var)? = Value::Int(next);
        }
        Ok(Flow::Next)
    }

    // ==== Expressions ====

    fn eval(&self, node: &Node) -> Result<Value, RuntimeError> {
        match node {
            Node::Const(value) => Ok(value.clone()),
            Node::Load(location) => self.place(location).cloned(),
            Node::Member { target, member } => self
                .instance(target)?
                .get(member)
                .ok_or_else(|| RuntimeError::UndefinedField((*member).into())),
            Node::Unary { op, operand } => ops::unary(*op, self.eval(operand)?),
            Node::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                match (op, &lhs) {
                    (BinaryOp::And, Value::Bool(false)) | (BinaryOp::Or, Value::Bool(true)) => {
                        return Ok(lhs);
                    }
                    _ => {}
                }
                ops::binary(*op, lhs, self.eval(rhs)?)
            }
            Node::Convert { operand, to } => coerce(&self.eval(operand)?, to),
            Node::Call { func, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                func.call(&args)
            }
        }
    }

    // ==== Places ====

    fn slot_missing(slot: usize) -> RuntimeError {
        RuntimeError::TypeMismatch(format!("memory slot {slot} does not exist").into())
    }

    fn place(&self, location: &Location) -> Result<&Value, RuntimeError> {
        let mut value = self
            .frame
            .get(location.slot)
            .ok_or_else(|| Self::slot_missing(location.slot))?;
        for step in &location.path {
            value = match (step, value) {
                (Step::Field(name), Value::Struct(fields)) => fields
                    .field(name)
                    .ok_or_else(|| RuntimeError::UndefinedField(name.clone()))?,
                (Step::Index(index), Value::Array(array)) => {
                    array.get(self.eval(index)?.as_i64()?)?
                }
                (_, other) => return Err(mismatch("STRUCT or ARRAY", other)),
            };
        }
        Ok(value)
    }

    /// Index expressions are evaluated before the frame is borrowed mutably.
    fn place_mut(&mut self, location: &Location) -> Result<&mut Value, RuntimeError> {
        let indices = location
            .path
            .iter()
            .filter_map(|step| match step {
                Step::Index(index) => Some(index),
                Step::Field(_) => None,
            })
            .map(|index| self.eval(index).and_then(|value| value.as_i64()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut indices = indices.into_iter();
        let mut value = self
            .frame
            .get_mut(location.slot)
            .ok_or_else(|| Self::slot_missing(location.slot))?;
        for step in &location.path {
            value = match (step, value) {
                (Step::Field(name), Value::Struct(fields)) => fields
                    .field_mut(name)
                    .ok_or_else(|| RuntimeError::UndefinedField(name.clone()))?,
                (Step::Index(_), Value::Array(array)) => {
                    let index = indices
                        .next()
                        .ok_or_else(|| RuntimeError::TypeMismatch("missing array index".into()))?;
                    array.get_mut(index)?
                }
                (_, other) => return Err(mismatch("STRUCT or ARRAY", other)),
            };
        }
        Ok(value)
    }

    fn instance(&self, location: &Location) -> Result<&FbInstance, RuntimeError> {
        match self.place(location)? {
            Value::Instance(instance) => Ok(&**instance),
            other => Err(mismatch("function block instance", other)),
        }
    }

    fn instance_mut(&mut self, location: &Location) -> Result<&mut FbInstance, RuntimeError> {
        match self.place_mut(location)? {
            Value::Instance(instance) => Ok(&mut **instance),
            other => Err(mismatch("function block instance", other)),
        }
    }
}
