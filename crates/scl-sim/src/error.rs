//! Simulator errors.

#![allow(missing_docs)]

use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

/// Faults raised while a scan is executing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Integer division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Integer modulo by zero.
    #[error("modulo by zero")]
    ModuloByZero,

    /// Index out of bounds.
    #[error("array index {index} out of bounds [{lower}..{upper}]")]
    IndexOutOfBounds { index: i64, lower: i64, upper: i64 },

    /// Value did not have the shape the compiled unit expected.
    #[error("type mismatch: {0}")]
    TypeMismatch(SmolStr),

    /// Undefined struct field or function block member.
    #[error("undefined field '{0}'")]
    UndefinedField(SmolStr),

    /// Function name not found in the standard library.
    #[error("undefined function '{0}'")]
    UndefinedFunction(SmolStr),

    /// Standard function called with the wrong number of arguments.
    #[error("invalid argument count: expected {expected}, got {got}")]
    InvalidArgumentCount { expected: usize, got: usize },

    /// FOR loop step cannot be zero.
    #[error("FOR loop step cannot be zero")]
    ForStepZero,

    /// A single scan ran past the configured watchdog.
    #[error("scan exceeded watchdog of {limit_ms} ms")]
    WatchdogTimeout { limit_ms: u64 },
}

/// One compile diagnostic, anchored to a source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub message: SmolStr,
}

impl Diagnostic {
    pub fn new(line: usize, message: impl Into<SmolStr>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors surfaced by the simulator API.
#[derive(Debug, Error)]
pub enum SimError {
    /// The unit calls hardware or communication primitives.
    #[error("Unsupported HW function '{name}' detected. Cannot simulate locally.")]
    UnsupportedFunction { name: SmolStr, line: usize },

    /// The translated snippet failed to compile.
    #[error(
        "Compilation Syntax Error:\n{}\n\n--- Generated Code ---\n{}",
        format_diagnostics(.diagnostics),
        .snippet
    )]
    Compilation {
        diagnostics: Vec<Diagnostic>,
        snippet: String,
    },

    /// A scan faulted.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Malformed test script statement.
    #[error("script line {line}: {message}")]
    Script { line: usize, message: SmolStr },

    /// Configuration error.
    #[error("invalid config '{0}'")]
    InvalidConfig(SmolStr),

    /// File access failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Path root is not a declared variable.
    #[error("Variable {0} not found.")]
    UnknownVariable(SmolStr),

    /// Path is malformed or addresses something that does not exist.
    #[error("invalid path '{0}'")]
    InvalidPath(SmolStr),

    /// Engine has no compiled unit.
    #[error("no unit has been compiled")]
    NotCompiled,

    /// Scan thread could not be spawned.
    #[error("thread spawn error '{0}'")]
    ThreadSpawn(SmolStr),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compilation_error_embeds_snippet() {
        let err = SimError::Compilation {
            diagnostics: vec![
                Diagnostic::new(3, "unknown variable 'x'"),
                Diagnostic::new(5, "EXIT outside of a loop"),
            ],
            snippet: "x = 1;".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("Compilation Syntax Error:\nline 3: unknown variable 'x'\nline 5"));
        assert!(text.ends_with("--- Generated Code ---\nx = 1;"));
    }

    #[test]
    fn unsupported_function_message() {
        let err = SimError::UnsupportedFunction {
            name: "TSEND".into(),
            line: 4,
        };
        assert_eq!(
            err.to_string(),
            "Unsupported HW function 'TSEND' detected. Cannot simulate locally."
        );
    }
}
