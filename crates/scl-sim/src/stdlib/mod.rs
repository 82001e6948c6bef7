//! Standard library registry.

pub mod bit;
pub mod conversions;
pub mod fbs;
pub mod helpers;
pub mod numeric;
pub mod selection;
pub mod string;
pub mod time;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::value::{DataType, Value};

/// Standard function signature.
pub type StdFunc = fn(&[Value]) -> Result<Value, RuntimeError>;

/// Accepted argument counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments.
    Exact(usize),
    /// At least this many arguments.
    AtLeast(usize),
}

impl Arity {
    /// Whether `count` arguments are accepted.
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(expected) => count == expected,
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exact(expected) => write!(f, "{expected}"),
            Arity::AtLeast(min) => write!(f, "at least {min}"),
        }
    }
}

/// How a call's result type follows from its argument types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnRule {
    /// Always this type.
    Fixed(DataType),
    /// Same type as the argument at this index.
    Arg(usize),
    /// Common type of the arguments from this index on.
    Common(usize),
}

/// Standard function metadata.
#[derive(Debug, Clone)]
pub struct StdFunction {
    /// Upper-case name.
    pub name: SmolStr,
    /// Accepted argument counts.
    pub arity: Arity,
    /// Result typing rule.
    pub returns: ReturnRule,
    /// Function implementation.
    pub func: StdFunc,
}

impl StdFunction {
    /// Result type for the given argument types.
    #[must_use]
    pub fn return_type(&self, args: &[DataType]) -> DataType {
        match &self.returns {
            ReturnRule::Fixed(ty) => ty.clone(),
            ReturnRule::Arg(index) => args
                .get(*index)
                .map(DataType::normalized)
                .unwrap_or(DataType::Int),
            ReturnRule::Common(start) => helpers::common_type(args.iter().skip(*start)),
        }
    }

    /// Invokes the implementation.
    pub fn call(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        (self.func)(args)
    }
}

/// Standard library registry for functions callable from unit bodies.
#[derive(Debug, Default, Clone)]
pub struct StandardLibrary {
    functions: IndexMap<SmolStr, StdFunction>,
}

impl StandardLibrary {
    /// Build a standard library with default functions.
    #[must_use]
    pub fn new() -> Self {
        let mut lib = Self {
            functions: IndexMap::new(),
        };
        numeric::register(&mut lib);
        selection::register(&mut lib);
        bit::register(&mut lib);
        time::register(&mut lib);
        string::register(&mut lib);
        conversions::register(&mut lib);
        lib
    }

    /// Register a standard function by name.
    pub fn register(
        &mut self,
        name: impl Into<SmolStr>,
        arity: Arity,
        returns: ReturnRule,
        func: StdFunc,
    ) {
        let name = SmolStr::new(name.into().as_str().to_ascii_uppercase());
        self.functions.insert(
            name.clone(),
            StdFunction {
                name,
                arity,
                returns,
                func,
            },
        );
    }

    /// Get a standard function by name. `<A>_TO_<B>` conversions that are not
    /// registered explicitly are resolved from their type names.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<StdFunction> {
        let key = SmolStr::new(name.to_ascii_uppercase());
        if let Some(entry) = self.functions.get(&key) {
            return Some(entry.clone());
        }
        conversions::resolve(&key)
    }

    /// Call a standard function by name.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let function = self
            .get(name)
            .ok_or_else(|| RuntimeError::UndefinedFunction(name.into()))?;
        if !function.arity.accepts(args.len()) {
            let expected = match function.arity {
                Arity::Exact(expected) | Arity::AtLeast(expected) => expected,
            };
            return Err(RuntimeError::InvalidArgumentCount {
                expected,
                got: args.len(),
            });
        }
        function.call(args)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(SmolStr::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let lib = StandardLibrary::new();
        assert!(lib.get("sqrt").is_some());
        assert!(lib.get("Int_To_Real").is_some());
        assert!(lib.get("TSEND").is_none());
        assert_eq!(
            lib.call("ABS", &[Value::Int(-4)]),
            Ok(Value::Int(4))
        );
    }

    #[test]
    fn arity_is_checked_before_dispatch() {
        let lib = StandardLibrary::new();
        assert_eq!(
            lib.call("LIMIT", &[Value::Int(1)]),
            Err(RuntimeError::InvalidArgumentCount {
                expected: 3,
                got: 1
            })
        );
    }

    #[test]
    fn result_types_follow_arguments() {
        let lib = StandardLibrary::new();
        let max = lib.get("MAX").unwrap();
        assert_eq!(max.return_type(&[DataType::Int, DataType::Real]), DataType::Real);
        assert_eq!(max.return_type(&[DataType::Int, DataType::Int]), DataType::Int);
        let sel = lib.get("SEL").unwrap();
        assert_eq!(
            sel.return_type(&[DataType::Bool, DataType::Bool, DataType::Bool]),
            DataType::Bool
        );
    }
}
