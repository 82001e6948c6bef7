use crate::error::RuntimeError;
use crate::value::Value;

use super::bistable::{Rs, Sr};
use super::counters::{Ctd, Ctu, Ctud};
use super::registry::{FbKind, ParamType};
use super::timers::{Tof, Ton, Tonr, Tp};
use super::triggers::{FTrig, RTrig};

/// Live state of one declared function block variable.
///
/// Inputs are stored in the instance, so a call that omits an input reuses
/// the last value written to it.
#[derive(Debug, Clone, PartialEq)]
pub enum FbInstance {
    Ton(Ton),
    Tof(Tof),
    Tp(Tp),
    Tonr(Tonr),
    RTrig(RTrig),
    FTrig(FTrig),
    Ctu(Ctu),
    Ctd(Ctd),
    Ctud(Ctud),
    Sr(Sr),
    Rs(Rs),
}

impl FbInstance {
    #[must_use]
    pub fn new(kind: FbKind) -> Self {
        match kind {
            FbKind::Ton => FbInstance::Ton(Ton::new()),
            FbKind::Tof => FbInstance::Tof(Tof::new()),
            FbKind::Tp => FbInstance::Tp(Tp::new()),
            FbKind::Tonr => FbInstance::Tonr(Tonr::new()),
            FbKind::RTrig => FbInstance::RTrig(RTrig::new()),
            FbKind::FTrig => FbInstance::FTrig(FTrig::new()),
            FbKind::Ctu => FbInstance::Ctu(Ctu::new()),
            FbKind::Ctd => FbInstance::Ctd(Ctd::new()),
            FbKind::Ctud => FbInstance::Ctud(Ctud::new()),
            FbKind::Sr => FbInstance::Sr(Sr::new()),
            FbKind::Rs => FbInstance::Rs(Rs::new()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FbKind {
        match self {
            FbInstance::Ton(_) => FbKind::Ton,
            FbInstance::Tof(_) => FbKind::Tof,
            FbInstance::Tp(_) => FbKind::Tp,
            FbInstance::Tonr(_) => FbKind::Tonr,
            FbInstance::RTrig(_) => FbKind::RTrig,
            FbInstance::FTrig(_) => FbKind::FTrig,
            FbInstance::Ctu(_) => FbKind::Ctu,
            FbInstance::Ctd(_) => FbKind::Ctd,
            FbInstance::Ctud(_) => FbKind::Ctud,
            FbInstance::Sr(_) => FbKind::Sr,
            FbInstance::Rs(_) => FbKind::Rs,
        }
    }

    /// Reads an input or output member by name (case-insensitive).
    #[must_use]
    pub fn get(&self, member: &str) -> Option<Value> {
        let member = member.to_ascii_uppercase();
        let value = match (self, member.as_str()) {
            (FbInstance::Ton(t), name) => timer_member(t.input, t.pt, t.output(), name)?,
            (FbInstance::Tof(t), name) => timer_member(t.input, t.pt, t.output(), name)?,
            (FbInstance::Tp(t), name) => timer_member(t.input, t.pt, t.output(), name)?,
            (FbInstance::Tonr(t), "R") => Value::Bool(t.r),
            (FbInstance::Tonr(t), name) => timer_member(t.input, t.pt, t.output(), name)?,
            (FbInstance::RTrig(t), "CLK") => Value::Bool(t.clk()),
            (FbInstance::RTrig(t), "Q") => Value::Bool(t.q()),
            (FbInstance::FTrig(t), "CLK") => Value::Bool(t.clk()),
            (FbInstance::FTrig(t), "Q") => Value::Bool(t.q()),
            (FbInstance::Ctu(c), "CU") => Value::Bool(c.cu),
            (FbInstance::Ctu(c), "R") => Value::Bool(c.r),
            (FbInstance::Ctu(c), "PV") => Value::Int(c.pv),
            (FbInstance::Ctu(c), "Q") => Value::Bool(c.q()),
            (FbInstance::Ctu(c), "CV") => Value::Int(c.cv()),
            (FbInstance::Ctd(c), "CD") => Value::Bool(c.cd),
            (FbInstance::Ctd(c), "LD") => Value::Bool(c.ld),
            (FbInstance::Ctd(c), "PV") => Value::Int(c.pv),
            (FbInstance::Ctd(c), "Q") => Value::Bool(c.q()),
            (FbInstance::Ctd(c), "CV") => Value::Int(c.cv()),
            (FbInstance::Ctud(c), "CU") => Value::Bool(c.cu),
            (FbInstance::Ctud(c), "CD") => Value::Bool(c.cd),
            (FbInstance::Ctud(c), "R") => Value::Bool(c.r),
            (FbInstance::Ctud(c), "LD") => Value::Bool(c.ld),
            (FbInstance::Ctud(c), "PV") => Value::Int(c.pv),
            (FbInstance::Ctud(c), "QU") => Value::Bool(c.qu()),
            (FbInstance::Ctud(c), "QD") => Value::Bool(c.qd()),
            (FbInstance::Ctud(c), "CV") => Value::Int(c.cv()),
            (FbInstance::Sr(s), "S1") => Value::Bool(s.s1()),
            (FbInstance::Sr(s), "R") => Value::Bool(s.r()),
            (FbInstance::Sr(s), "Q1") => Value::Bool(s.q1()),
            (FbInstance::Rs(s), "S") => Value::Bool(s.s()),
            (FbInstance::Rs(s), "R1") => Value::Bool(s.r1()),
            (FbInstance::Rs(s), "Q1") => Value::Bool(s.q1()),
            _ => return None,
        };
        Some(value)
    }

    /// Stores an input for the next [`execute`](Self::execute). Outputs are
    /// read-only.
    pub fn set_input(&mut self, member: &str, value: &Value) -> Result<(), RuntimeError> {
        let kind = self.kind();
        let param = kind
            .inputs()
            .find(|param| param.name.eq_ignore_ascii_case(member))
            .ok_or_else(|| RuntimeError::UndefinedField(format!("{}.{member}", kind.name()).into()))?;
        let (flag, number) = match param.ty {
            ParamType::Bool => (value.as_bool()?, 0),
            ParamType::Int => (false, value.as_int()?),
        };
        match (self, param.name) {
            (FbInstance::Ton(t), "IN") => t.input = flag,
            (FbInstance::Ton(t), "PT") => t.pt = number,
            (FbInstance::Tof(t), "IN") => t.input = flag,
            (FbInstance::Tof(t), "PT") => t.pt = number,
            (FbInstance::Tp(t), "IN") => t.input = flag,
            (FbInstance::Tp(t), "PT") => t.pt = number,
            (FbInstance::Tonr(t), "IN") => t.input = flag,
            (FbInstance::Tonr(t), "R") => t.r = flag,
            (FbInstance::Tonr(t), "PT") => t.pt = number,
            (FbInstance::RTrig(t), _) => t.set_clk(flag),
            (FbInstance::FTrig(t), _) => t.set_clk(flag),
            (FbInstance::Ctu(c), "CU") => c.cu = flag,
            (FbInstance::Ctu(c), "R") => c.r = flag,
            (FbInstance::Ctu(c), "PV") => c.pv = number,
            (FbInstance::Ctd(c), "CD") => c.cd = flag,
            (FbInstance::Ctd(c), "LD") => c.ld = flag,
            (FbInstance::Ctd(c), "PV") => c.pv = number,
            (FbInstance::Ctud(c), "CU") => c.cu = flag,
            (FbInstance::Ctud(c), "CD") => c.cd = flag,
            (FbInstance::Ctud(c), "R") => c.r = flag,
            (FbInstance::Ctud(c), "LD") => c.ld = flag,
            (FbInstance::Ctud(c), "PV") => c.pv = number,
            (FbInstance::Sr(s), "S1") => {
                let r = s.r();
                s.set_inputs(flag, r);
            }
            (FbInstance::Sr(s), _) => {
                let s1 = s.s1();
                s.set_inputs(s1, flag);
            }
            (FbInstance::Rs(s), "S") => {
                let r1 = s.r1();
                s.set_inputs(flag, r1);
            }
            (FbInstance::Rs(s), _) => {
                let set = s.s();
                s.set_inputs(set, flag);
            }
            _ => {}
        }
        Ok(())
    }

    /// Runs one step with the stored inputs. `now` is the scan's tick in ms.
    pub fn execute(&mut self, now: i64) {
        match self {
            FbInstance::Ton(t) => {
                t.step(t.input, t.pt, now);
            }
            FbInstance::Tof(t) => {
                t.step(t.input, t.pt, now);
            }
            FbInstance::Tp(t) => {
                t.step(t.input, t.pt, now);
            }
            FbInstance::Tonr(t) => {
                t.step(t.input, t.r, t.pt, now);
            }
            FbInstance::RTrig(t) => {
                t.step(t.clk());
            }
            FbInstance::FTrig(t) => {
                t.step(t.clk());
            }
            FbInstance::Ctu(c) => {
                c.step(c.cu, c.r, c.pv);
            }
            FbInstance::Ctd(c) => {
                c.step(c.cd, c.ld, c.pv);
            }
            FbInstance::Ctud(c) => {
                c.step(c.cu, c.cd, c.r, c.ld, c.pv);
            }
            FbInstance::Sr(s) => {
                s.step(s.s1(), s.r());
            }
            FbInstance::Rs(s) => {
                s.step(s.s(), s.r1());
            }
        }
    }
}

fn timer_member(
    input: bool,
    pt: i32,
    output: super::timers::TimerOutput,
    name: &str,
) -> Option<Value> {
    match name {
        "IN" => Some(Value::Bool(input)),
        "PT" => Some(Value::Int(pt)),
        "Q" => Some(Value::Bool(output.q)),
        "ET" => Some(Value::Int(output.et)),
        _ => None,
    }
}
