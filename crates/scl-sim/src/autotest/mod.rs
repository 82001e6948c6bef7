//! Scripted tests: `SET`, `RUN` and `ASSERT` against a compiled unit under
//! virtual time.
//!
//! ```text
//! // start the conveyor and wait for the delay timer
//! SET Start = TRUE
//! RUN 1 SCANS
//! RUN 1000 MS
//! ASSERT Done == TRUE
//! ```

#![allow(missing_docs)]

mod runner;
mod script;
mod timing;

pub use runner::{spawn_script, values_match, LogCallback, LogKind, TestLogLine, TestReport, TestRunner};
pub use script::{statement_lines, RunUnit, Statement};
pub use timing::TimingSeries;
