//! Bit shift standard functions on 32-bit values.

#![allow(missing_docs)]

use crate::error::RuntimeError;
use crate::stdlib::helpers::{require_arity, to_i64};
use crate::stdlib::{Arity, ReturnRule, StandardLibrary};
use crate::value::{DataType, Value};

pub fn register(lib: &mut StandardLibrary) {
    let int = || ReturnRule::Fixed(DataType::Int);
    lib.register("SHL", Arity::Exact(2), int(), shl);
    lib.register("SHR", Arity::Exact(2), int(), shr);
    lib.register("ROL", Arity::Exact(2), int(), rol);
    lib.register("ROR", Arity::Exact(2), int(), ror);
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn operands(args: &[Value]) -> Result<(i32, u32), RuntimeError> {
    require_arity(args, 2)?;
    let value = to_i64(&args[0])? as i32;
    let count = (to_i64(&args[1])? & 31) as u32;
    Ok((value, count))
}

fn shl(args: &[Value]) -> Result<Value, RuntimeError> {
    let (value, count) = operands(args)?;
    Ok(Value::Int(value.wrapping_shl(count)))
}

fn shr(args: &[Value]) -> Result<Value, RuntimeError> {
    let (value, count) = operands(args)?;
    Ok(Value::Int(value.wrapping_shr(count)))
}

fn rol(args: &[Value]) -> Result<Value, RuntimeError> {
    let (value, count) = operands(args)?;
    Ok(Value::Int(value.rotate_left(count)))
}

fn ror(args: &[Value]) -> Result<Value, RuntimeError> {
    let (value, count) = operands(args)?;
    Ok(Value::Int(value.rotate_right(count)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_at_32_bits() {
        assert_eq!(shl(&[Value::Int(1), Value::Int(4)]), Ok(Value::Int(16)));
        assert_eq!(shr(&[Value::Int(-16), Value::Int(2)]), Ok(Value::Int(-4)));
        assert_eq!(rol(&[Value::Int(i32::MIN), Value::Int(1)]), Ok(Value::Int(1)));
        assert_eq!(ror(&[Value::Int(1), Value::Int(1)]), Ok(Value::Int(i32::MIN)));
    }
}
