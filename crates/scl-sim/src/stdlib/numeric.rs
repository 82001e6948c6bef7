//! Numeric standard functions.

#![allow(missing_docs)]

use crate::error::RuntimeError;
use crate::stdlib::helpers::{real, require_arity, to_f64};
use crate::stdlib::{Arity, ReturnRule, StandardLibrary, StdFunc};
use crate::value::{mismatch, DataType, Value};

pub fn register(lib: &mut StandardLibrary) {
    lib.register("ABS", Arity::Exact(1), ReturnRule::Arg(0), abs);
    let real_valued: [(&str, StdFunc); 11] = [
        ("SQRT", sqrt),
        ("LN", ln),
        ("LOG", log10),
        ("EXP", exp),
        ("EXPD", expd),
        ("SIN", sin),
        ("COS", cos),
        ("TAN", tan),
        ("ASIN", asin),
        ("ACOS", acos),
        ("ATAN", atan),
    ];
    for (name, func) in real_valued {
        lib.register(name, Arity::Exact(1), ReturnRule::Fixed(DataType::Real), func);
    }
    lib.register("EXPT", Arity::Exact(2), ReturnRule::Fixed(DataType::Real), expt);
}

fn abs(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    match &args[0] {
        Value::Int(v) => Ok(Value::Int(v.wrapping_abs())),
        Value::Real(v) => Ok(Value::Real(v.abs())),
        Value::Ticks(v) => Ok(Value::Ticks(v.wrapping_abs())),
        other => Err(mismatch("ANY_NUM", other)),
    }
}

fn unary(args: &[Value], op: fn(f64) -> f64) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    Ok(real(op(to_f64(&args[0])?)))
}

fn sqrt(args: &[Value]) -> Result<Value, RuntimeError> {
    unary(args, f64::sqrt)
}

fn ln(args: &[Value]) -> Result<Value, RuntimeError> {
    unary(args, f64::ln)
}

fn log10(args: &[Value]) -> Result<Value, RuntimeError> {
    unary(args, f64::log10)
}

fn exp(args: &[Value]) -> Result<Value, RuntimeError> {
    unary(args, f64::exp)
}

fn expd(args: &[Value]) -> Result<Value, RuntimeError> {
    unary(args, |x| 10f64.powf(x))
}

fn sin(args: &[Value]) -> Result<Value, RuntimeError> {
    unary(args, f64::sin)
}

fn cos(args: &[Value]) -> Result<Value, RuntimeError> {
    unary(args, f64::cos)
}

fn tan(args: &[Value]) -> Result<Value, RuntimeError> {
    unary(args, f64::tan)
}

fn asin(args: &[Value]) -> Result<Value, RuntimeError> {
    unary(args, f64::asin)
}

fn acos(args: &[Value]) -> Result<Value, RuntimeError> {
    unary(args, f64::acos)
}

fn atan(args: &[Value]) -> Result<Value, RuntimeError> {
    unary(args, f64::atan)
}

/// `**` lowers to this.
pub fn expt(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 2)?;
    let base = to_f64(&args[0])?;
    let exponent = to_f64(&args[1])?;
    Ok(real(base.powf(exponent)))
}
