//! Simulator settings and unit descriptions loaded from TOML.

#![allow(missing_docs)]

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use smol_str::SmolStr;

use crate::context::{Direction, ExecutionContext, UnitKind, VariableDecl};
use crate::error::SimError;

pub const DEFAULT_SCAN_PERIOD_MS: u64 = 10;
pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_SCAN_INTERVAL_MS: i64 = 10;
pub const DEFAULT_SAMPLE_FULL_LIMIT: u64 = 100;
pub const DEFAULT_SAMPLE_STRIDE: u64 = 10;
pub const DEFAULT_FLOAT_TOLERANCE: f64 = 0.01;

/// Scan scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Target period of the free-running loop.
    pub scan_period: Duration,
    /// Per-scan watchdog; `None` disables it.
    pub scan_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_period: Duration::from_millis(DEFAULT_SCAN_PERIOD_MS),
            scan_timeout: Some(Duration::from_millis(DEFAULT_SCAN_TIMEOUT_MS)),
        }
    }
}

/// Test runner settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestConfig {
    /// Virtual milliseconds per scan during `RUN`.
    pub scan_interval_ms: i64,
    /// `RUN n MS` windows with at most this many scans are sampled every scan.
    pub sample_full_limit: u64,
    /// Larger windows are sampled every `sample_stride` scans plus the last.
    pub sample_stride: u64,
    /// Absolute tolerance of numeric `ASSERT` comparisons.
    pub float_tolerance: f64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            sample_full_limit: DEFAULT_SAMPLE_FULL_LIMIT,
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            float_tolerance: DEFAULT_FLOAT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimConfig {
    pub engine: EngineConfig,
    pub test: TestConfig,
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| SimError::InvalidConfig(format!("{}: {err}", path.display()).into()))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        let raw: SimToml =
            toml::from_str(text).map_err(|err| SimError::InvalidConfig(err.to_string().into()))?;
        raw.into_config()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SimToml {
    engine: Option<EngineSection>,
    test: Option<TestSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineSection {
    scan_period_ms: Option<u64>,
    scan_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TestSection {
    scan_interval_ms: Option<u64>,
    sample_full_limit: Option<u64>,
    sample_stride: Option<u64>,
    float_tolerance: Option<f64>,
}

fn non_zero(value: u64, key: &str) -> Result<u64, SimError> {
    if value == 0 {
        return Err(SimError::InvalidConfig(format!("{key} must be greater than zero").into()));
    }
    Ok(value)
}

impl SimToml {
    fn into_config(self) -> Result<SimConfig, SimError> {
        let engine = self.engine.unwrap_or_default();
        let test = self.test.unwrap_or_default();

        let scan_period = non_zero(
            engine.scan_period_ms.unwrap_or(DEFAULT_SCAN_PERIOD_MS),
            "engine.scan_period_ms",
        )?;
        let scan_timeout = match engine.scan_timeout_ms.unwrap_or(DEFAULT_SCAN_TIMEOUT_MS) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        let interval = non_zero(
            test.scan_interval_ms
                .unwrap_or(DEFAULT_SCAN_INTERVAL_MS.unsigned_abs()),
            "test.scan_interval_ms",
        )?;
        let scan_interval_ms = i64::try_from(interval)
            .map_err(|_| SimError::InvalidConfig("test.scan_interval_ms is too large".into()))?;
        let sample_stride = non_zero(
            test.sample_stride.unwrap_or(DEFAULT_SAMPLE_STRIDE),
            "test.sample_stride",
        )?;
        let float_tolerance = test.float_tolerance.unwrap_or(DEFAULT_FLOAT_TOLERANCE);
        if !float_tolerance.is_finite() || float_tolerance < 0.0 {
            return Err(SimError::InvalidConfig(
                "test.float_tolerance must be a non-negative number".into(),
            ));
        }

        Ok(SimConfig {
            engine: EngineConfig {
                scan_period: Duration::from_millis(scan_period),
                scan_timeout,
            },
            test: TestConfig {
                scan_interval_ms,
                sample_full_limit: test.sample_full_limit.unwrap_or(DEFAULT_SAMPLE_FULL_LIMIT),
                sample_stride,
                float_tolerance,
            },
        })
    }
}

/// A unit's name, kind and declared variables, as an interface parser would
/// report them.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDescription {
    pub name: SmolStr,
    pub kind: UnitKind,
    pub variables: Vec<VariableDecl>,
}

impl UnitDescription {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| SimError::InvalidConfig(format!("{}: {err}", path.display()).into()))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        let raw: UnitToml =
            toml::from_str(text).map_err(|err| SimError::InvalidConfig(err.to_string().into()))?;
        raw.into_description()
    }

    /// Builds the execution context, discovering enum and struct types in
    /// `source`.
    #[must_use]
    pub fn context(&self, source: &str) -> ExecutionContext {
        ExecutionContext::new(self.name.clone(), self.kind, &self.variables, source)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitToml {
    unit: UnitSection,
    #[serde(default)]
    variables: Vec<VariableSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitSection {
    name: String,
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariableSection {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    direction: Option<String>,
    initial: Option<String>,
    comment: Option<String>,
}

impl UnitToml {
    fn into_description(self) -> Result<UnitDescription, SimError> {
        let kind = UnitKind::parse(&self.unit.kind).ok_or_else(|| {
            SimError::InvalidConfig(format!("unit.kind '{}' is not a unit kind", self.unit.kind).into())
        })?;
        let variables = self
            .variables
            .into_iter()
            .map(|var| {
                let direction = match var.direction.as_deref() {
                    None => Direction::Static,
                    Some(text) => Direction::parse(text).ok_or_else(|| {
                        SimError::InvalidConfig(
                            format!("variables.{}: unknown direction '{text}'", var.name).into(),
                        )
                    })?,
                };
                let mut decl = VariableDecl::new(var.name, var.type_name, direction);
                if let Some(initial) = var.initial {
                    decl = decl.with_initial(initial);
                }
                if let Some(comment) = var.comment {
                    decl = decl.with_comment(comment);
                }
                Ok(decl)
            })
            .collect::<Result<Vec<_>, SimError>>()?;
        Ok(UnitDescription {
            name: SmolStr::new(self.unit.name),
            kind,
            variables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(SimConfig::from_toml_str("").unwrap(), SimConfig::default());
    }

    #[test]
    fn zero_timeout_disables_watchdog() {
        let config = SimConfig::from_toml_str("[engine]\nscan_timeout_ms = 0\n").unwrap();
        assert_eq!(config.engine.scan_timeout, None);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = SimConfig::from_toml_str("[test]\nscan_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }
}
