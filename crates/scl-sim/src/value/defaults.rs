//! Default values and best-effort literal parsing.
//!
//! Malformed literals never fail: they resolve to the zero value of the
//! requested type.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::warn;

use crate::stdlib::fbs::FbInstance;

use super::datetime::{date_to_ticks, time_of_day_to_ticks};
use super::{ArrayValue, DataType, StructValue, TypeCatalog, Value};

/// Nesting limit for struct defaults (guards self-referencing types).
const MAX_STRUCT_DEPTH: usize = 16;

/// Largest element count an array declaration may allocate. Declarations
/// past it, or with inverted bounds, default to an empty array.
pub const MAX_ARRAY_LEN: usize = 1 << 20;

/// Default value for a resolved type with an optional initializer literal.
#[must_use]
pub fn default_value(data_type: &DataType, initial: &str, catalog: &TypeCatalog) -> Value {
    default_value_at(data_type, initial, catalog, 0)
}

/// Element count for `[lower..upper]`, or zero when the bounds are inverted
/// or the range exceeds [`MAX_ARRAY_LEN`].
fn array_len(lower: i64, upper: i64) -> usize {
    let len = upper
        .checked_sub(lower)
        .and_then(|span| span.checked_add(1))
        .and_then(|len| usize::try_from(len).ok());
    match len {
        Some(len) if len <= MAX_ARRAY_LEN => len,
        _ if upper >= lower => {
            warn!(lower, upper, limit = MAX_ARRAY_LEN, "array bounds too large, using empty array");
            0
        }
        _ => 0,
    }
}

fn default_value_at(
    data_type: &DataType,
    initial: &str,
    catalog: &TypeCatalog,
    depth: usize,
) -> Value {
    match data_type {
        DataType::Fb(kind) => Value::Instance(Box::new(FbInstance::new(*kind))),
        DataType::Array {
            lower,
            upper,
            element,
        } => {
            let len = array_len(*lower, *upper);
            let element = default_value_at(element, "", catalog, depth);
            Value::Array(ArrayValue {
                lower: *lower,
                upper: *upper,
                elements: vec![element; len],
            })
        }
        DataType::Struct(name) => {
            let mut fields = IndexMap::new();
            if depth < MAX_STRUCT_DEPTH {
                if let Some(def) = catalog.struct_def(name) {
                    for (field, type_text) in &def.fields {
                        let field_type = DataType::resolve(type_text, catalog);
                        fields.insert(
                            field.clone(),
                            default_value_at(&field_type, "", catalog, depth + 1),
                        );
                    }
                }
            }
            Value::Struct(StructValue {
                type_name: name.clone(),
                fields,
            })
        }
        DataType::Enum(name) => {
            let member = strip_type_prefix(initial.trim()).trim_start_matches('#');
            let ordinal = catalog
                .enum_def(name)
                .and_then(|def| def.ordinal(member))
                .unwrap_or(0);
            Value::Int(ordinal)
        }
        DataType::Bool => Value::Bool(parse_bool(initial)),
        DataType::Real => Value::Real(parse_real(initial)),
        DataType::String => Value::String(parse_string(initial)),
        DataType::Ticks => Value::Ticks(parse_ticks(initial)),
        DataType::Int => Value::Int(parse_int(initial)),
    }
}

/// Parses user text into the shape of an existing value (used by forced writes).
#[must_use]
pub fn parse_with_hint(text: &str, hint: &Value) -> Value {
    match hint {
        Value::Bool(_) => Value::Bool(parse_bool(text)),
        Value::Real(_) => Value::Real(parse_real(text)),
        Value::String(_) => Value::String(parse_string(text)),
        Value::Ticks(_) => {
            let ticks = parse_ticks(text);
            if ticks == 0 {
                Value::Ticks(text.trim().parse().unwrap_or(0))
            } else {
                Value::Ticks(ticks)
            }
        }
        _ => Value::Int(parse_int(text)),
    }
}

/// `TRUE` (any case) or `1`.
#[must_use]
pub fn parse_bool(text: &str) -> bool {
    let text = strip_type_prefix(text.trim());
    text.eq_ignore_ascii_case("TRUE") || text == "1"
}

#[must_use]
pub fn parse_real(text: &str) -> f32 {
    let text = strip_type_prefix(text.trim()).replace('_', "");
    text.parse::<f32>().unwrap_or(0.0)
}

#[must_use]
pub fn parse_string(text: &str) -> SmolStr {
    SmolStr::new(text.trim().trim_matches(|c| c == '\'' || c == '"'))
}

/// Integers in decimal or `16#`/`8#`/`2#` form, and durations in milliseconds.
#[must_use]
pub fn parse_int(text: &str) -> i32 {
    let text = text.trim();
    if let Some(ms) = parse_duration_ms(text) {
        return saturate_i32(ms);
    }
    parse_integer_literal(strip_type_prefix(text))
        .map(saturate_i32)
        .unwrap_or(0)
}

/// DATE, TIME_OF_DAY and DATE_AND_TIME literals, selected by their prefix.
#[must_use]
pub fn parse_ticks(text: &str) -> i64 {
    let text = text.trim();
    parse_date_literal(text)
        .or_else(|| parse_time_of_day_literal(text))
        .or_else(|| parse_date_and_time_literal(text))
        .unwrap_or(0)
}

fn saturate_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Removes a leading `TYPE#` qualifier, but only when a value follows it.
fn strip_type_prefix(text: &str) -> &str {
    match text.split_once('#') {
        Some((prefix, rest))
            if !prefix.is_empty()
                && prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !prefix.chars().all(|c| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => text,
    }
}

/// Parses `123`, `-5`, `1_000`, `16#FF`, `8#17`, `2#1010`.
#[must_use]
pub fn parse_integer_literal(text: &str) -> Option<i64> {
    let text = text.trim().replace('_', "");
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text.as_str())),
    };
    let value = if let Some((base, digits)) = body.split_once('#') {
        let radix = match base {
            "16" => 16,
            "8" => 8,
            "2" => 2,
            _ => return None,
        };
        i64::from_str_radix(digits, radix).ok()?
    } else {
        body.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| {
        let head = text.get(..prefix.len())?;
        head.eq_ignore_ascii_case(prefix)
            .then(|| &text[prefix.len()..])
    })
}

/// Duration literal (`T#1h30m`, `TIME#500ms`, `T#1s_250ms`) in milliseconds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_duration_ms(text: &str) -> Option<i64> {
    let body = strip_prefix_ignore_case(text.trim(), &["TIME#", "LTIME#", "T#", "LT#"])?;
    let body = body.to_ascii_lowercase();
    let (negative, mut rest) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body.strip_prefix('+').unwrap_or(body.as_str())),
    };
    if rest.is_empty() {
        return None;
    }
    let mut total = 0.0f64;
    while !rest.is_empty() {
        rest = rest.strip_prefix('_').unwrap_or(rest);
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let number: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];
        let (scale, unit_len) = if rest.starts_with("ms") {
            (1.0, 2)
        } else if rest.starts_with("us") {
            (0.001, 2)
        } else if rest.starts_with("ns") {
            (0.000_001, 2)
        } else if rest.starts_with('d') {
            (86_400_000.0, 1)
        } else if rest.starts_with('h') {
            (3_600_000.0, 1)
        } else if rest.starts_with('m') {
            (60_000.0, 1)
        } else if rest.starts_with('s') {
            (1_000.0, 1)
        } else {
            return None;
        };
        total += number * scale;
        rest = &rest[unit_len..];
    }
    let ms = total.trunc() as i64;
    Some(if negative { -ms } else { ms })
}

fn parse_ymd(text: &str) -> Option<(i64, i64, i64)> {
    let mut parts = text.splitn(3, '-');
    let year = parts.next()?.trim().parse().ok()?;
    let month = parts.next()?.trim().parse().ok()?;
    let day = parts.next()?.trim().parse().ok()?;
    Some((year, month, day))
}

fn parse_hms(text: &str) -> Option<i64> {
    let mut parts = text.split(':');
    let hour = parts.next()?.trim().parse().ok()?;
    let minute = parts.next()?.trim().parse().ok()?;
    let (second, millis) = match parts.next() {
        Some(sec) => match sec.split_once('.') {
            Some((whole, frac)) => {
                let frac = format!("{frac:0<3}");
                (whole.parse().ok()?, frac.get(..3)?.parse().ok()?)
            }
            None => (sec.trim().parse().ok()?, 0),
        },
        None => (0, 0),
    };
    if parts.next().is_some() {
        return None;
    }
    time_of_day_to_ticks(hour, minute, second, millis)
}

/// `D#2024-01-15` / `DATE#2024-1-5` as ticks.
#[must_use]
pub fn parse_date_literal(text: &str) -> Option<i64> {
    let body = strip_prefix_ignore_case(text.trim(), &["DATE#", "D#"])?;
    let (year, month, day) = parse_ymd(body)?;
    date_to_ticks(year, month, day)
}

/// `TOD#14:30:00` / `TIME_OF_DAY#8:15:00.250` as ticks since midnight.
#[must_use]
pub fn parse_time_of_day_literal(text: &str) -> Option<i64> {
    let body = strip_prefix_ignore_case(text.trim(), &["TIME_OF_DAY#", "TOD#"])?;
    parse_hms(body)
}

/// `DT#2024-01-15-14:30:00` as ticks.
#[must_use]
pub fn parse_date_and_time_literal(text: &str) -> Option<i64> {
    let body = strip_prefix_ignore_case(text.trim(), &["DATE_AND_TIME#", "DT#"])?;
    let mut parts = body.splitn(4, '-');
    let year = parts.next()?.trim().parse().ok()?;
    let month = parts.next()?.trim().parse().ok()?;
    let day = parts.next()?.trim().parse().ok()?;
    let time = parts.next()?;
    Some(date_to_ticks(year, month, day)? + parse_hms(time)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TICKS_PER_SECOND;

    #[test]
    fn durations_in_milliseconds() {
        assert_eq!(parse_duration_ms("T#500ms"), Some(500));
        assert_eq!(parse_duration_ms("TIME#2s"), Some(2000));
        assert_eq!(parse_duration_ms("t#1.5s"), Some(1500));
        assert_eq!(parse_duration_ms("T#1h30m"), Some(5_400_000));
        assert_eq!(parse_duration_ms("T#1m_30s_5ms"), Some(90_005));
        assert_eq!(parse_duration_ms("T#-250ms"), Some(-250));
        assert_eq!(parse_duration_ms("T#abc"), None);
        assert_eq!(parse_duration_ms("500"), None);
    }

    #[test]
    fn integer_literals() {
        assert_eq!(parse_int("16#FF"), 255);
        assert_eq!(parse_int("2#1010"), 10);
        assert_eq!(parse_int("8#17"), 15);
        assert_eq!(parse_int("1_000"), 1000);
        assert_eq!(parse_int("INT#-12"), -12);
        assert_eq!(parse_int("T#1s"), 1000);
        assert_eq!(parse_int("garbage"), 0);
        assert_eq!(parse_int(""), 0);
    }

    #[test]
    fn scalar_literals() {
        assert!(parse_bool("true"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("yes"));
        assert!((parse_real("2.5") - 2.5).abs() < f32::EPSILON);
        assert!(parse_real("x").abs() < f32::EPSILON);
        assert_eq!(parse_string("'Hello'"), "Hello");
    }

    #[test]
    fn tick_literals() {
        assert_eq!(
            parse_time_of_day_literal("TOD#00:00:05"),
            Some(5 * TICKS_PER_SECOND)
        );
        let dt = parse_date_and_time_literal("DT#2024-01-15-14:30:00").unwrap();
        let date = parse_date_literal("D#2024-01-15").unwrap();
        let tod = parse_time_of_day_literal("TOD#14:30:00").unwrap();
        assert_eq!(dt, date + tod);
        assert_eq!(parse_ticks("D#2024-02-30"), 0);
    }

    #[test]
    fn hint_parsing_follows_existing_shape() {
        assert_eq!(parse_with_hint("1", &Value::Bool(false)), Value::Bool(true));
        assert_eq!(parse_with_hint("2.5", &Value::Real(0.0)), Value::Real(2.5));
        assert_eq!(parse_with_hint("42", &Value::Int(0)), Value::Int(42));
        assert_eq!(parse_with_hint("oops", &Value::Int(3)), Value::Int(0));
    }
}
