//! Per-scan signal history for charting a test run.

use indexmap::IndexMap;
use serde::Serialize;

use crate::context::SignalSample;

/// Column-oriented samples: `signals[name][i]` was observed at `scans[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingSeries {
    pub scans: Vec<u64>,
    pub signals: IndexMap<String, Vec<f64>>,
    pub digital: IndexMap<String, bool>,
}

impl TimingSeries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one sample row. A second sample for the scan index already
    /// recorded last is dropped.
    pub fn record(&mut self, scan: u64, samples: Vec<SignalSample>) {
        if self.scans.last() == Some(&scan) {
            return;
        }
        let row = self.scans.len();
        self.scans.push(scan);
        for sample in samples {
            self.digital.entry(sample.name.clone()).or_insert(sample.digital);
            let column = self.signals.entry(sample.name).or_default();
            // Columns first seen late are padded so every column lines up.
            column.resize(row, 0.0);
            column.push(sample.value);
        }
        for column in self.signals.values_mut() {
            let fill = column.last().copied().unwrap_or(0.0);
            column.resize(row + 1, fill);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    /// Values of one signal, in scan order.
    #[must_use]
    pub fn signal(&self, name: &str) -> Option<&[f64]> {
        self.signals.get(name).map(Vec::as_slice)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, value: f64, digital: bool) -> SignalSample {
        SignalSample {
            name: name.to_string(),
            value,
            digital,
        }
    }

    #[test]
    fn duplicate_scan_index_is_dropped() {
        let mut series = TimingSeries::new();
        series.record(0, vec![sample("Start", 0.0, true)]);
        series.record(0, vec![sample("Start", 1.0, true)]);
        series.record(1, vec![sample("Start", 1.0, true)]);
        assert_eq!(series.scans, vec![0, 1]);
        assert_eq!(series.signal("Start"), Some(&[0.0, 1.0][..]));
        assert_eq!(series.digital.get("Start"), Some(&true));
    }

    #[test]
    fn serializes_as_three_columns() {
        let mut series = TimingSeries::new();
        series.record(3, vec![sample("Level", 2.5, false)]);
        let json: serde_json::Value = serde_json::from_str(&series.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "scans": [3],
                "signals": { "Level": [2.5] },
                "digital": { "Level": false }
            })
        );
    }
}
