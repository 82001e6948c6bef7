//! Date and time-of-day component functions on 100 ns ticks.

#![allow(missing_docs)]

use crate::error::RuntimeError;
use crate::stdlib::helpers::{require_arity, saturate_i32, to_ticks};
use crate::stdlib::{Arity, ReturnRule, StandardLibrary, StdFunc};
use crate::value::{
    civil_from_ticks, date_part, CivilDateTime, DataType, Value, TICKS_PER_HOUR, TICKS_PER_MINUTE,
    TICKS_PER_SECOND,
};

pub fn register(lib: &mut StandardLibrary) {
    let components: [(&str, StdFunc); 9] = [
        ("DATE_YEAR", date_year),
        ("DATE_MONTH", date_month),
        ("DATE_DAY", date_day),
        ("TOD_HOUR", tod_hour),
        ("TOD_MINUTE", tod_minute),
        ("TOD_SECOND", tod_second),
        ("DT_HOUR", dt_hour),
        ("DT_MINUTE", dt_minute),
        ("DT_SECOND", dt_second),
    ];
    for (name, func) in components {
        lib.register(name, Arity::Exact(1), ReturnRule::Fixed(DataType::Int), func);
    }
    lib.register(
        "CONCAT_DATE_TOD",
        Arity::Exact(2),
        ReturnRule::Fixed(DataType::Ticks),
        concat_date_tod,
    );
}

/// Calendar component of an absolute tick value; zero ticks yield zero.
fn civil(args: &[Value], pick: fn(&CivilDateTime) -> i64) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    let ticks = to_ticks(&args[0])?;
    if ticks == 0 {
        return Ok(Value::Int(0));
    }
    Ok(Value::Int(saturate_i32(pick(&civil_from_ticks(ticks)))))
}

fn date_year(args: &[Value]) -> Result<Value, RuntimeError> {
    civil(args, |c| c.year)
}

fn date_month(args: &[Value]) -> Result<Value, RuntimeError> {
    civil(args, |c| c.month)
}

fn date_day(args: &[Value]) -> Result<Value, RuntimeError> {
    civil(args, |c| c.day)
}

fn dt_hour(args: &[Value]) -> Result<Value, RuntimeError> {
    civil(args, |c| c.hour)
}

fn dt_minute(args: &[Value]) -> Result<Value, RuntimeError> {
    civil(args, |c| c.minute)
}

fn dt_second(args: &[Value]) -> Result<Value, RuntimeError> {
    civil(args, |c| c.second)
}

/// TOD_HOUR counts whole hours, so durations past a day keep growing.
fn tod_hour(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    Ok(Value::Int(saturate_i32(to_ticks(&args[0])? / TICKS_PER_HOUR)))
}

fn tod_minute(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    Ok(Value::Int(saturate_i32((to_ticks(&args[0])? / TICKS_PER_MINUTE) % 60)))
}

fn tod_second(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 1)?;
    Ok(Value::Int(saturate_i32((to_ticks(&args[0])? / TICKS_PER_SECOND) % 60)))
}

/// A zero date returns the time of day unchanged.
fn concat_date_tod(args: &[Value]) -> Result<Value, RuntimeError> {
    require_arity(args, 2)?;
    let date = to_ticks(&args[0])?;
    let tod = to_ticks(&args[1])?;
    if date == 0 {
        return Ok(Value::Ticks(tod));
    }
    Ok(Value::Ticks(date_part(date).saturating_add(tod)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{parse_date_and_time_literal, parse_date_literal, parse_time_of_day_literal};

    #[test]
    fn date_components() {
        let dt = Value::Ticks(parse_date_and_time_literal("DT#2024-03-15-08:05:09").unwrap());
        assert_eq!(date_year(&[dt.clone()]), Ok(Value::Int(2024)));
        assert_eq!(date_month(&[dt.clone()]), Ok(Value::Int(3)));
        assert_eq!(date_day(&[dt.clone()]), Ok(Value::Int(15)));
        assert_eq!(dt_hour(&[dt.clone()]), Ok(Value::Int(8)));
        assert_eq!(dt_minute(&[dt.clone()]), Ok(Value::Int(5)));
        assert_eq!(dt_second(&[dt]), Ok(Value::Int(9)));
        assert_eq!(date_year(&[Value::Ticks(0)]), Ok(Value::Int(0)));
    }

    #[test]
    fn combining_date_and_time_of_day() {
        let date = parse_date_literal("D#2024-03-15").unwrap();
        let tod = parse_time_of_day_literal("TOD#08:05:09").unwrap();
        let expected = parse_date_and_time_literal("DT#2024-03-15-08:05:09").unwrap();
        assert_eq!(
            concat_date_tod(&[Value::Ticks(date), Value::Ticks(tod)]),
            Ok(Value::Ticks(expected))
        );
        assert_eq!(tod_minute(&[Value::Ticks(tod)]), Ok(Value::Int(5)));
    }
}
