//! Helpers for standard function implementations.

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::value::{mismatch, parse_bool, parse_int, parse_real, DataType, Value};

pub fn require_arity(args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RuntimeError::InvalidArgumentCount {
            expected,
            got: args.len(),
        })
    }
}

pub fn require_min(args: &[Value], min: usize) -> Result<(), RuntimeError> {
    if args.len() >= min {
        Ok(())
    } else {
        Err(RuntimeError::InvalidArgumentCount {
            expected: min,
            got: args.len(),
        })
    }
}

pub fn to_f64(value: &Value) -> Result<f64, RuntimeError> {
    value.as_f64().ok_or_else(|| mismatch("REAL", value))
}

pub fn to_i64(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Bool(flag) => Ok(i64::from(*flag)),
        Value::Int(v) => Ok(i64::from(*v)),
        Value::Ticks(v) => Ok(*v),
        #[allow(clippy::cast_possible_truncation)]
        Value::Real(v) => Ok(v.trunc() as i64),
        other => Err(mismatch("INT", other)),
    }
}

pub fn to_ticks(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Ticks(v) => Ok(*v),
        Value::Int(v) => Ok(i64::from(*v)),
        other => Err(mismatch("TICKS", other)),
    }
}

pub fn to_str(value: &Value) -> Result<&str, RuntimeError> {
    value.as_str()
}

pub fn saturate_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

#[allow(clippy::cast_possible_truncation)]
pub fn real(value: f64) -> Value {
    Value::Real(value as f32)
}

/// Runtime type of a scalar value.
pub fn value_type(value: &Value) -> Option<DataType> {
    match value {
        Value::Bool(_) => Some(DataType::Bool),
        Value::Int(_) => Some(DataType::Int),
        Value::Real(_) => Some(DataType::Real),
        Value::String(_) => Some(DataType::String),
        Value::Ticks(_) => Some(DataType::Ticks),
        _ => None,
    }
}

/// Common type of a selection: REAL if any operand is REAL, then TICKS,
/// a shared BOOL/STRING type, else INT.
pub fn common_type<'a>(types: impl IntoIterator<Item = &'a DataType>) -> DataType {
    let seen: Vec<DataType> = types.into_iter().map(DataType::normalized).collect();
    let uniform = seen.first().filter(|first| seen.iter().all(|ty| ty == *first));
    if seen.contains(&DataType::Real) {
        DataType::Real
    } else if seen.contains(&DataType::Ticks) {
        DataType::Ticks
    } else if let Some(ty @ (DataType::Bool | DataType::String)) = uniform {
        ty.clone()
    } else {
        DataType::Int
    }
}

pub fn common_value_type(args: &[Value]) -> Result<DataType, RuntimeError> {
    let types = args
        .iter()
        .map(|value| value_type(value).ok_or_else(|| mismatch("scalar", value)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(common_type(&types))
}

/// Converts a scalar to `target`, the way assignment widening does.
pub fn coerce(value: &Value, target: &DataType) -> Result<Value, RuntimeError> {
    Ok(match (target.normalized(), value) {
        (DataType::Bool, Value::Bool(_))
        | (DataType::Int, Value::Int(_))
        | (DataType::Real, Value::Real(_))
        | (DataType::String, Value::String(_))
        | (DataType::Ticks, Value::Ticks(_)) => value.clone(),
        (DataType::Int | DataType::Real, Value::String(text)) => {
            parse_numeric_text(text, &target.normalized())
        }
        (DataType::Int, other) => Value::Int(saturate_i32(to_i64(other)?)),
        (DataType::Real, other) => real(to_f64(other)?),
        (DataType::Ticks, other) => Value::Ticks(to_i64(other)?),
        (DataType::Bool, Value::Int(v)) => Value::Bool(*v != 0),
        (DataType::Bool, Value::String(text)) => Value::Bool(parse_bool(text)),
        (DataType::String, other) => Value::String(SmolStr::new(plain_text(other))),
        (_, other) => return Err(mismatch(&target.to_string(), other)),
    })
}

/// Text form used by `*_TO_STRING`: full precision, unlike watch display.
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::Real(v) => v.to_string(),
        other => other.display(),
    }
}

/// Loose numeric parse of a string operand.
pub fn parse_numeric_text(text: &str, target: &DataType) -> Value {
    match target {
        DataType::Real => Value::Real(parse_real(text)),
        _ => Value::Int(parse_int(text)),
    }
}
