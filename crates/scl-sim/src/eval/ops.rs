//! Operator semantics on runtime values.
//!
//! Operands arrive already widened to a common type. Integer arithmetic
//! wraps; integer division and modulo by zero fault.

use crate::error::RuntimeError;
use crate::stdlib::numeric::expt;
use crate::transpile::ast::{BinaryOp, UnaryOp};
use crate::value::{mismatch, Value};

pub(super) fn unary(op: UnaryOp, value: Value) -> Result<Value, RuntimeError> {
    Ok(match (op, value) {
        (UnaryOp::Plus, value @ (Value::Int(_) | Value::Real(_) | Value::Ticks(_))) => value,
        (UnaryOp::Neg, Value::Int(v)) => Value::Int(v.wrapping_neg()),
        (UnaryOp::Neg, Value::Real(v)) => Value::Real(-v),
        (UnaryOp::Neg, Value::Ticks(v)) => Value::Ticks(v.wrapping_neg()),
        (UnaryOp::Not, Value::Bool(v)) => Value::Bool(!v),
        (UnaryOp::Not, Value::Int(v)) => Value::Int(!v),
        (_, other) => return Err(mismatch("numeric or BOOL operand", &other)),
    })
}

pub(super) fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    if op == BinaryOp::Pow {
        return expt(&[lhs, rhs]);
    }
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => bools(op, a, b),
        (Value::Int(a), Value::Int(b)) => ints(op, a, b),
        (Value::Real(a), Value::Real(b)) => reals(op, a, b),
        (Value::Ticks(a), Value::Ticks(b)) => ticks(op, a, b),
        (Value::String(a), Value::String(b)) => compare(op, &a, &b)
            .map(Value::Bool)
            .ok_or_else(|| undefined(op, "STRING")),
        (a, b) => Err(RuntimeError::TypeMismatch(
            format!("{} {} {}", a.kind_name(), op.symbol(), b.kind_name()).into(),
        )),
    }
}

fn undefined(op: BinaryOp, ty: &str) -> RuntimeError {
    RuntimeError::TypeMismatch(format!("operator {} is not defined for {ty}", op.symbol()).into())
}

fn compare<T: PartialOrd + ?Sized>(op: BinaryOp, a: &T, b: &T) -> Option<bool> {
    Some(match op {
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        _ => return None,
    })
}

fn bools(op: BinaryOp, a: bool, b: bool) -> Result<Value, RuntimeError> {
    if let Some(result) = compare(op, &a, &b) {
        return Ok(Value::Bool(result));
    }
    Ok(Value::Bool(match op {
        BinaryOp::And => a && b,
        BinaryOp::Or => a || b,
        BinaryOp::Xor => a ^ b,
        _ => return Err(undefined(op, "BOOL")),
    }))
}

fn ints(op: BinaryOp, a: i32, b: i32) -> Result<Value, RuntimeError> {
    if let Some(result) = compare(op, &a, &b) {
        return Ok(Value::Bool(result));
    }
    Ok(Value::Int(match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div if b == 0 => return Err(RuntimeError::DivisionByZero),
        BinaryOp::Div => a.wrapping_div(b),
        BinaryOp::Mod if b == 0 => return Err(RuntimeError::ModuloByZero),
        BinaryOp::Mod => a.wrapping_rem(b),
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
        _ => return Err(undefined(op, "INT")),
    }))
}

fn reals(op: BinaryOp, a: f32, b: f32) -> Result<Value, RuntimeError> {
    if let Some(result) = compare(op, &a, &b) {
        return Ok(Value::Bool(result));
    }
    Ok(Value::Real(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        _ => return Err(undefined(op, "REAL")),
    }))
}

fn ticks(op: BinaryOp, a: i64, b: i64) -> Result<Value, RuntimeError> {
    if let Some(result) = compare(op, &a, &b) {
        return Ok(Value::Bool(result));
    }
    Ok(Value::Ticks(match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div if b == 0 => return Err(RuntimeError::DivisionByZero),
        BinaryOp::Div => a.wrapping_div(b),
        BinaryOp::Mod if b == 0 => return Err(RuntimeError::ModuloByZero),
        BinaryOp::Mod => a.wrapping_rem(b),
        _ => return Err(undefined(op, "TICKS")),
    }))
}
