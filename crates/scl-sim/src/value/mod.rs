//! Runtime values, declared types and default construction.

#![allow(missing_docs)]

mod catalog;
mod datetime;
mod defaults;
mod types;

pub use catalog::{EnumDef, StructDef, TypeCatalog};
pub use datetime::*;
pub use defaults::*;
pub use types::DataType;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::stdlib::fbs::FbInstance;

/// Fixed-bound array of scalar elements.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub lower: i64,
    pub upper: i64,
    pub elements: Vec<Value>,
}

impl ArrayValue {
    fn offset(&self, index: i64) -> Result<usize, RuntimeError> {
        let out_of_bounds = RuntimeError::IndexOutOfBounds {
            index,
            lower: self.lower,
            upper: self.upper,
        };
        if index < self.lower || index > self.upper {
            return Err(out_of_bounds);
        }
        let offset = index
            .checked_sub(self.lower)
            .and_then(|offset| usize::try_from(offset).ok())
            .ok_or_else(|| out_of_bounds.clone())?;
        if offset >= self.elements.len() {
            return Err(out_of_bounds);
        }
        Ok(offset)
    }

    /// Element at a declared-bound index.
    pub fn get(&self, index: i64) -> Result<&Value, RuntimeError> {
        let offset = self.offset(index)?;
        Ok(&self.elements[offset])
    }

    pub fn get_mut(&mut self, index: i64) -> Result<&mut Value, RuntimeError> {
        let offset = self.offset(index)?;
        Ok(&mut self.elements[offset])
    }

    /// Iterates `(declared index, element)` pairs.
    pub fn indexed(&self) -> impl Iterator<Item = (i64, &Value)> {
        (self.lower..).zip(self.elements.iter())
    }
}

/// Struct value with ordered, case-insensitively addressed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub type_name: SmolStr,
    pub fields: IndexMap<SmolStr, Value>,
}

impl StructValue {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// Runtime value held by a memory tag.
///
/// Enumerations and durations are stored as `Int` (ordinal and milliseconds);
/// dates, times of day and date-and-time values are `Ticks` of 100 ns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Real(f32),
    String(SmolStr),
    Ticks(i64),
    Array(ArrayValue),
    Struct(StructValue),
    Instance(Box<FbInstance>),
}

impl Value {
    /// Short name of the runtime shape, used in mismatch messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "BOOL",
            Value::Int(_) => "INT",
            Value::Real(_) => "REAL",
            Value::String(_) => "STRING",
            Value::Ticks(_) => "TICKS",
            Value::Array(_) => "ARRAY",
            Value::Struct(_) => "STRUCT",
            Value::Instance(instance) => instance.kind().name(),
        }
    }

    pub fn as_bool(&self) -> Result<bool, RuntimeError> {
        match self {
            Value::Bool(value) => Ok(*value),
            other => Err(mismatch("BOOL", other)),
        }
    }

    pub fn as_int(&self) -> Result<i32, RuntimeError> {
        match self {
            Value::Int(value) => Ok(*value),
            other => Err(mismatch("INT", other)),
        }
    }

    pub fn as_i64(&self) -> Result<i64, RuntimeError> {
        match self {
            Value::Int(value) => Ok(i64::from(*value)),
            Value::Ticks(value) => Ok(*value),
            other => Err(mismatch("INT", other)),
        }
    }

    pub fn as_real(&self) -> Result<f32, RuntimeError> {
        match self {
            Value::Real(value) => Ok(*value),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(value) => Ok(*value as f32),
            other => Err(mismatch("REAL", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str, RuntimeError> {
        match self {
            Value::String(value) => Ok(value.as_str()),
            other => Err(mismatch("STRING", other)),
        }
    }

    /// Numeric view used for time-series sampling and tolerant comparison.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            Value::Int(value) => Some(f64::from(*value)),
            Value::Real(value) => Some(f64::from(*value)),
            Value::Ticks(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Real(_) | Value::String(_) | Value::Ticks(_)
        )
    }

    /// Display form shared by snapshots, watch rows and assertions:
    /// booleans as `TRUE`/`FALSE`, reals with two decimals.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(value) => value.to_string(),
            Value::Real(value) => format!("{value:.2}"),
            Value::String(value) => value.to_string(),
            Value::Ticks(value) => value.to_string(),
            Value::Array(array) => format!("ARRAY[{}..{}]", array.lower, array.upper),
            Value::Struct(value) => value.type_name.to_string(),
            Value::Instance(instance) => instance.kind().name().to_string(),
        }
    }
}

pub(crate) fn mismatch(expected: &str, found: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch(format!("expected {expected}, found {}", found.kind_name()).into())
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(SmolStr::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_uses_declared_bounds() {
        let array = ArrayValue {
            lower: 1,
            upper: 3,
            elements: vec![Value::Int(10), Value::Int(20), Value::Int(30)],
        };
        assert_eq!(array.get(1), Ok(&Value::Int(10)));
        assert_eq!(array.get(3), Ok(&Value::Int(30)));
        assert_eq!(
            array.get(0),
            Err(RuntimeError::IndexOutOfBounds {
                index: 0,
                lower: 1,
                upper: 3
            })
        );
        let pairs: Vec<_> = array.indexed().map(|(idx, _)| idx).collect();
        assert_eq!(pairs, vec![1, 2, 3]);
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Bool(true).display(), "TRUE");
        assert_eq!(Value::Real(3.14159).display(), "3.14");
        assert_eq!(Value::Int(-7).display(), "-7");
        assert_eq!(Value::from("abc").display(), "abc");
    }

    #[test]
    fn struct_fields_ignore_case() {
        let mut fields = IndexMap::new();
        fields.insert(SmolStr::new("Speed"), Value::Real(1.5));
        let mut value = StructValue {
            type_name: "UDT_Motor".into(),
            fields,
        };
        assert_eq!(value.field("SPEED"), Some(&Value::Real(1.5)));
        *value.field_mut("speed").unwrap() = Value::Real(2.0);
        assert_eq!(value.field("Speed"), Some(&Value::Real(2.0)));
        assert!(value.field("missing").is_none());
    }
}
