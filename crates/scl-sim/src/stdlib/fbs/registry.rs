use crate::value::DataType;

/// Standard function block types known to the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FbKind {
    Ton,
    Tof,
    Tp,
    Tonr,
    RTrig,
    FTrig,
    Ctu,
    Ctd,
    Ctud,
    Sr,
    Rs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    Int,
}

impl ParamType {
    #[must_use]
    pub fn data_type(self) -> DataType {
        match self {
            ParamType::Bool => DataType::Bool,
            ParamType::Int => DataType::Int,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    Input,
    Output,
}

/// One formal parameter of a standard function block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbParam {
    pub name: &'static str,
    pub ty: ParamType,
    pub role: ParamRole,
}

const fn input(name: &'static str, ty: ParamType) -> FbParam {
    FbParam {
        name,
        ty,
        role: ParamRole::Input,
    }
}

const fn output(name: &'static str, ty: ParamType) -> FbParam {
    FbParam {
        name,
        ty,
        role: ParamRole::Output,
    }
}

use ParamType::{Bool, Int};

const TIMER: &[FbParam] = &[
    input("IN", Bool),
    input("PT", Int),
    output("Q", Bool),
    output("ET", Int),
];
const TONR: &[FbParam] = &[
    input("IN", Bool),
    input("R", Bool),
    input("PT", Int),
    output("Q", Bool),
    output("ET", Int),
];
const TRIGGER: &[FbParam] = &[input("CLK", Bool), output("Q", Bool)];
const SR: &[FbParam] = &[input("S1", Bool), input("R", Bool), output("Q1", Bool)];
const RS: &[FbParam] = &[input("S", Bool), input("R1", Bool), output("Q1", Bool)];
const CTU: &[FbParam] = &[
    input("CU", Bool),
    input("R", Bool),
    input("PV", Int),
    output("Q", Bool),
    output("CV", Int),
];
const CTD: &[FbParam] = &[
    input("CD", Bool),
    input("LD", Bool),
    input("PV", Int),
    output("Q", Bool),
    output("CV", Int),
];
const CTUD: &[FbParam] = &[
    input("CU", Bool),
    input("CD", Bool),
    input("R", Bool),
    input("LD", Bool),
    input("PV", Int),
    output("QU", Bool),
    output("QD", Bool),
    output("CV", Int),
];

impl FbKind {
    pub const ALL: [FbKind; 11] = [
        FbKind::Ton,
        FbKind::Tof,
        FbKind::Tp,
        FbKind::Tonr,
        FbKind::RTrig,
        FbKind::FTrig,
        FbKind::Ctu,
        FbKind::Ctd,
        FbKind::Ctud,
        FbKind::Sr,
        FbKind::Rs,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FbKind::Ton => "TON",
            FbKind::Tof => "TOF",
            FbKind::Tp => "TP",
            FbKind::Tonr => "TONR",
            FbKind::RTrig => "R_TRIG",
            FbKind::FTrig => "F_TRIG",
            FbKind::Ctu => "CTU",
            FbKind::Ctd => "CTD",
            FbKind::Ctud => "CTUD",
            FbKind::Sr => "SR",
            FbKind::Rs => "RS",
        }
    }

    /// Looks up a declared type name. Siemens `IEC_TIMER`/`IEC_COUNTER`
    /// aliases map to TON and CTU.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().trim_matches('"').to_ascii_uppercase();
        match upper.as_str() {
            "TON" | "TON_TIME" | "IEC_TIMER" => Some(FbKind::Ton),
            "TOF" | "TOF_TIME" => Some(FbKind::Tof),
            "TP" | "TP_TIME" => Some(FbKind::Tp),
            "TONR" | "TONR_TIME" => Some(FbKind::Tonr),
            "R_TRIG" => Some(FbKind::RTrig),
            "F_TRIG" => Some(FbKind::FTrig),
            "CTU" | "CTU_INT" | "CTU_DINT" | "IEC_COUNTER" => Some(FbKind::Ctu),
            "CTD" | "CTD_INT" | "CTD_DINT" => Some(FbKind::Ctd),
            "CTUD" | "CTUD_INT" | "CTUD_DINT" => Some(FbKind::Ctud),
            "SR" => Some(FbKind::Sr),
            "RS" => Some(FbKind::Rs),
            _ => None,
        }
    }

    /// Formal parameters, inputs first in positional order.
    #[must_use]
    pub fn params(self) -> &'static [FbParam] {
        match self {
            FbKind::Ton | FbKind::Tof | FbKind::Tp => TIMER,
            FbKind::Tonr => TONR,
            FbKind::RTrig | FbKind::FTrig => TRIGGER,
            FbKind::Ctu => CTU,
            FbKind::Ctd => CTD,
            FbKind::Ctud => CTUD,
            FbKind::Sr => SR,
            FbKind::Rs => RS,
        }
    }

    #[must_use]
    pub fn param(self, name: &str) -> Option<&'static FbParam> {
        self.params()
            .iter()
            .find(|param| param.name.eq_ignore_ascii_case(name))
    }

    pub fn inputs(self) -> impl Iterator<Item = &'static FbParam> {
        self.params()
            .iter()
            .filter(|param| param.role == ParamRole::Input)
    }

    /// Timers are the only blocks that consult the clock.
    #[must_use]
    pub fn is_timer(self) -> bool {
        matches!(self, FbKind::Ton | FbKind::Tof | FbKind::Tp | FbKind::Tonr)
    }
}
