//! `scl-sim` - scan-cycle simulator for Siemens SCL program units.
//!
//! A unit's body is translated into a typed tree, compiled against the
//! unit's memory map and executed one scan at a time, either free-running
//! on a background thread or stepped by a test script under virtual time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// `SET` / `RUN` / `ASSERT` test scripts.
pub mod autotest;
/// Real and virtual tick sources.
pub mod clock;
/// TOML settings and unit descriptions.
pub mod config;
/// Memory map of a simulated unit.
pub mod context;
/// Scan scheduler.
pub mod engine;
/// Simulator errors.
pub mod error;
/// Compilation and execution of translated bodies.
pub mod eval;
/// Standard functions and function blocks.
pub mod stdlib;
/// Body translation.
pub mod transpile;
/// Runtime values and declared types.
pub mod value;

pub use autotest::{TestReport, TestRunner};
pub use clock::{Clock, TickSource};
pub use config::{EngineConfig, SimConfig, TestConfig, UnitDescription};
pub use context::{Direction, ExecutionContext, UnitKind, VariableDecl};
pub use engine::{EngineState, SimulationEngine};
pub use error::{RuntimeError, SimError};
pub use transpile::{transpile, Snippet};
pub use value::{DataType, Value};
