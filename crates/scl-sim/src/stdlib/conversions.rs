//! Type conversion functions (`<A>_TO_<B>`).

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::stdlib::helpers::{coerce, require_arity, saturate_i32, to_i64, to_ticks};
use crate::stdlib::{Arity, ReturnRule, StandardLibrary, StdFunc, StdFunction};
use crate::value::{date_part, parse_bool, time_of_day_part, DataType, Value};

/// Type names accepted on either side of `_TO_`.
const CONVERTIBLE: &[&str] = &[
    "BOOL", "INT", "DINT", "SINT", "USINT", "UINT", "UDINT", "WORD", "BYTE", "DWORD", "REAL",
    "LREAL", "TIME", "STRING",
];

pub fn register(lib: &mut StandardLibrary) {
    let ticks = || ReturnRule::Fixed(DataType::Ticks);
    lib.register("DATE_TO_DINT", Arity::Exact(1), ticks(), identity_ticks);
    lib.register("DINT_TO_DATE", Arity::Exact(1), ticks(), identity_ticks);
    lib.register("TOD_TO_DINT", Arity::Exact(1), ticks(), identity_ticks);
    lib.register("DT_TO_DATE", Arity::Exact(1), ticks(), dt_to_date);
    lib.register("DT_TO_TOD", Arity::Exact(1), ticks(), dt_to_tod);
}

/// Builds the conversion entry for `name` when both sides are known types.
pub fn resolve(name: &str) -> Option<StdFunction> {
    let (source, target) = name.split_once("_TO_")?;
    if !CONVERTIBLE.contains(&source) {
        return None;
    }
    let (returns, func): (DataType, StdFunc) = match target {
        "BOOL" => (DataType::Bool, to_bool),
        "INT" | "DINT" | "SINT" | "USINT" | "UINT" | "UDINT" | "DWORD" | "TIME" => {
            (DataType::Int, to_int)
        }
        "WORD" => (DataType::Int, to_word),
        "BYTE" => (DataType::Int, to_byte),
        "REAL" | "LREAL" => (DataType::Real, to_real),
        "STRING" => (DataType::String, to_string),
        _ => return None,
    };
    Some(StdFunction {
        name: SmolStr::new(name),
        arity: Arity::Exact(1),
        returns: ReturnRule::Fixed(returns),
        func,
    })
}

fn to_bool(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    Ok(Value::Bool(match &args[0] {
        Value::Bool(flag) => *flag,
        Value::String(text) => parse_bool(text),
        other => to_i64(other)? != 0,
    }))
}

/// REAL operands truncate toward zero.
fn to_int(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    coerce(&args[0], &DataType::Int)
}

fn masked(args: &[Value], mask: i64) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    let value = match &args[0] {
        Value::String(_) => i64::from(coerce(&args[0], &DataType::Int)?.as_int()?),
        other => to_i64(other)?,
    };
    Ok(Value::Int(saturate_i32(value & mask)))
}

fn to_word(args: &[Value]) -> Result<Value, RuntimeError> {
    masked(args, 0xFFFF)
}

fn to_byte(args: &[Value]) -> Result<Value, RuntimeError> {
    masked(args, 0xFF)
}

fn to_real(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    coerce(&args[0], &DataType::Real)
}

fn to_string(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    coerce(&args[0], &DataType::String)
}

fn identity_ticks(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    Ok(Value::Ticks(to_ticks(&args[0])?))
}

fn dt_to_date(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    Ok(Value::Ticks(date_part(to_ticks(&args[0])?)))
}

fn dt_to_tod(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    Ok(Value::Ticks(time_of_day_part(to_ticks(&args[0])?)))
}
