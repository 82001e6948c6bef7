//! Selection standard functions (SEL, MIN, MAX, LIMIT, MUX, NORM_X, SCALE_X).

#![allow(missing_docs)]

use crate::error::RuntimeError;
use crate::stdlib::helpers::{
    coerce, common_value_type, real, require_arity, require_min, to_f64, to_i64,
};
use crate::stdlib::{Arity, ReturnRule, StandardLibrary};
use crate::value::{DataType, Value};

pub fn register(lib: &mut StandardLibrary) {
    lib.register("SEL", Arity::Exact(3), ReturnRule::Common(1), sel);
    lib.register("MIN", Arity::AtLeast(2), ReturnRule::Common(0), min);
    lib.register("MAX", Arity::AtLeast(2), ReturnRule::Common(0), max);
    lib.register("LIMIT", Arity::Exact(3), ReturnRule::Common(0), limit);
    lib.register("MUX", Arity::AtLeast(2), ReturnRule::Common(1), mux);
    lib.register("NORM_X", Arity::Exact(3), ReturnRule::Fixed(DataType::Real), norm_x);
    lib.register("SCALE_X", Arity::Exact(3), ReturnRule::Fixed(DataType::Real), scale_x);
}

fn sel(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 3)?;
    let selector = args[0].as_bool()?;
    let kind = common_value_type(&args[1..])?;
    coerce(if selector { &args[2] } else { &args[1] }, &kind)
}

fn min(args: &[Value]) -> Result<Value, RuntimeError> {
    min_max(args, true)
}

fn max(args: &[Value]) -> Result<Value, RuntimeError> {
    min_max(args, false)
}

fn min_max(args: &[Value], is_min: bool) -> Result<Value, RuntimeError> {
    require_min(args, 2)?;
    let kind = common_value_type(args)?;
    let mut best = coerce(&args[0], &kind)?;
    for value in &args[1..] {
        let candidate = coerce(value, &kind)?;
        let better = if is_min {
            to_f64(&candidate)? < to_f64(&best)?
        } else {
            to_f64(&candidate)? > to_f64(&best)?
        };
        if better {
            best = candidate;
        }
    }
    Ok(best)
}

/// LIMIT(MN, IN, MX)
fn limit(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 3)?;
    let kind = common_value_type(args)?;
    let low = coerce(&args[0], &kind)?;
    let value = coerce(&args[1], &kind)?;
    let high = coerce(&args[2], &kind)?;
    if to_f64(&value)? < to_f64(&low)? {
        Ok(low)
    } else if to_f64(&value)? > to_f64(&high)? {
        Ok(high)
    } else {
        Ok(value)
    }
}

/// MUX(K, IN0, IN1, ...). An out-of-range selector yields zero.
fn mux(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min(args, 2)?;
    let selector = to_i64(&args[0])?;
    let inputs = &args[1..];
    let kind = common_value_type(inputs)?;
    match usize::try_from(selector).ok().and_then(|k| inputs.get(k)) {
        Some(value) => coerce(value, &kind),
        None => coerce(&Value::Int(0), &kind),
    }
}

/// NORM_X(MIN, VALUE, MAX), clamped to 0..1.
fn norm_x(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 3)?;
    let low = to_f64(&args[0])?;
    let value = to_f64(&args[1])?;
    let high = to_f64(&args[2])?;
    if (high - low).abs() < f64::EPSILON {
        return Ok(Value::Real(0.0));
    }
    Ok(real(((value - low) / (high - low)).clamp(0.0, 1.0)))
}

/// SCALE_X(MIN, VALUE, MAX) with VALUE clamped to 0..1.
fn scale_x(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 3)?;
    let low = to_f64(&args[0])?;
    let value = to_f64(&args[1])?.clamp(0.0, 1.0);
    let high = to_f64(&args[2])?;
    Ok(real(value * (high - low) + low))
}
