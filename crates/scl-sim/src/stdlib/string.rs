//! String standard functions. Positions are 1-based and clamped to the
//! string bounds; lengths count characters.

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::stdlib::helpers::{require_arity, require_min, saturate_i32, to_i64, to_str};
use crate::stdlib::{Arity, ReturnRule, StandardLibrary};
use crate::value::{DataType, Value};

pub fn register(lib: &mut StandardLibrary) {
    let text = || ReturnRule::Fixed(DataType::String);
    lib.register("LEN", Arity::Exact(1), ReturnRule::Fixed(DataType::Int), len);
    lib.register("LEFT", Arity::Exact(2), text(), left);
    lib.register("RIGHT", Arity::Exact(2), text(), right);
    lib.register("MID", Arity::Exact(3), text(), mid);
    lib.register("CONCAT", Arity::AtLeast(2), text(), concat);
    lib.register("FIND", Arity::Exact(2), ReturnRule::Fixed(DataType::Int), find);
    lib.register("INSERT", Arity::Exact(3), text(), insert);
    lib.register("DELETE", Arity::Exact(3), text(), delete);
    lib.register("REPLACE", Arity::Exact(4), text(), replace);
}

fn chars(value: &Value) -> Result<Vec<char>, RuntimeError> {
    Ok(to_str(value)?.chars().collect())
}

fn count(value: &Value) -> Result<usize, RuntimeError> {
    Ok(usize::try_from(to_i64(value)?.max(0)).unwrap_or(usize::MAX))
}

fn string(chars: &[char]) -> Value {
    Value::String(chars.iter().collect::<String>().into())
}

fn len(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    let length = i64::try_from(to_str(&args[0])?.chars().count()).unwrap_or(i64::MAX);
    Ok(Value::Int(saturate_i32(length)))
}

fn left(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 2)?;
    let text = chars(&args[0])?;
    let take = count(&args[1])?.min(text.len());
    Ok(string(&text[..take]))
}

fn right(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 2)?;
    let text = chars(&args[0])?;
    let take = count(&args[1])?.min(text.len());
    Ok(string(&text[text.len() - take..]))
}

/// MID(IN, L, P)
fn mid(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 3)?;
    let text = chars(&args[0])?;
    let length = count(&args[1])?;
    let position = to_i64(&args[2])?;
    if position < 1 || position > text.len() as i64 {
        return Ok(Value::String(SmolStr::default()));
    }
    let start = usize::try_from(position - 1).unwrap_or(0);
    let end = start.saturating_add(length).min(text.len());
    Ok(string(&text[start..end]))
}

fn concat(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min(args, 2)?;
    let mut joined = String::new();
    for value in args {
        joined.push_str(to_str(value)?);
    }
    Ok(Value::String(joined.into()))
}

/// FIND(IN1, IN2): 1-based position of IN2 in IN1, or 0.
fn find(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 2)?;
    let haystack = to_str(&args[0])?;
    let needle = to_str(&args[1])?;
    let position = haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count() + 1)
        .unwrap_or(0);
    Ok(Value::Int(saturate_i32(i64::try_from(position).unwrap_or(0))))
}

/// INSERT(IN1, IN2, P): inserts IN2 before position P.
fn insert(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 3)?;
    let mut text = chars(&args[0])?;
    let position = to_i64(&args[2])?;
    if position < 1 {
        return Ok(args[0].clone());
    }
    let at = usize::try_from(position - 1).unwrap_or(usize::MAX).min(text.len());
    let inserted = chars(&args[1])?;
    text.splice(at..at, inserted);
    Ok(string(&text))
}

/// DELETE(IN, L, P): removes L characters starting at P.
fn delete(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 3)?;
    let mut text = chars(&args[0])?;
    let length = count(&args[1])?;
    let position = to_i64(&args[2])?;
    if position < 1 {
        return Ok(args[0].clone());
    }
    let start = usize::try_from(position - 1).unwrap_or(usize::MAX).min(text.len());
    let end = start.saturating_add(length).min(text.len());
    text.drain(start..end);
    Ok(string(&text))
}

/// REPLACE(IN1, IN2, L, P): replaces L characters at P with IN2.
fn replace(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 4)?;
    let mut text = chars(&args[0])?;
    let length = count(&args[2])?;
    let position = to_i64(&args[3])?;
    if position < 1 {
        return Ok(args[0].clone());
    }
    let start = usize::try_from(position - 1).unwrap_or(usize::MAX).min(text.len());
    let end = start.saturating_add(length).min(text.len());
    let replacement = chars(&args[1])?;
    text.splice(start..end, replacement);
    Ok(string(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    #[test]
    fn substrings_are_clamped() {
        assert_eq!(left(&[s("Hello"), Value::Int(10)]), Ok(s("Hello")));
        assert_eq!(right(&[s("Hello"), Value::Int(3)]), Ok(s("llo")));
        assert_eq!(mid(&[s("Hello"), Value::Int(2), Value::Int(2)]), Ok(s("el")));
        assert_eq!(mid(&[s("Hello"), Value::Int(9), Value::Int(4)]), Ok(s("lo")));
        assert_eq!(mid(&[s("Hello"), Value::Int(2), Value::Int(0)]), Ok(s("")));
    }

    #[test]
    fn editing_functions() {
        assert_eq!(find(&[s("conveyor"), s("vey")]), Ok(Value::Int(4)));
        assert_eq!(find(&[s("conveyor"), s("x")]), Ok(Value::Int(0)));
        assert_eq!(insert(&[s("AC"), s("B"), Value::Int(2)]), Ok(s("ABC")));
        assert_eq!(delete(&[s("ABCDE"), Value::Int(2), Value::Int(2)]), Ok(s("ADE")));
        assert_eq!(
            replace(&[s("ABCDE"), s("xy"), Value::Int(3), Value::Int(2)]),
            Ok(s("AxyE"))
        );
        assert_eq!(concat(&[s("a"), s("b"), s("c")]), Ok(s("abc")));
        assert_eq!(len(&[s("motor")]), Ok(Value::Int(5)));
    }
}
