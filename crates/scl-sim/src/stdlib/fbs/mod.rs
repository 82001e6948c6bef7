//! Standard function blocks (TON, CTU, etc.).

#![allow(missing_docs)]

mod bistable;
mod counters;
mod instance;
mod registry;
mod timers;
mod triggers;

pub use bistable::{Rs, Sr};
pub use counters::{CounterOutput, CounterUpDownOutput, Ctd, Ctu, Ctud};
pub use instance::FbInstance;
pub use registry::{FbKind, FbParam, ParamRole, ParamType};
pub use timers::{TimerOutput, Tof, Ton, Tonr, Tp};
pub use triggers::{FTrig, RTrig};
