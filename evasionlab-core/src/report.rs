//! Analysis report value

use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Result of one analysis run. Built once, then only serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub original_payload: String,
    /// Transform name -> transformed payload
    pub encoding_results: BTreeMap<String, String>,
    /// Test name -> evasion success
    pub evasion_results: BTreeMap<String, bool>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_encodings: usize,
    pub total_tests: usize,
    /// Percentage of tests that evaded detection, 0 when none ran
    pub evasion_success_rate: f64,
}

impl Report {
    /// Build a report stamped with the current time
    pub fn new(
        payload: impl Into<String>,
        encodings: BTreeMap<String, String>,
        evasion_results: BTreeMap<String, bool>,
    ) -> Self {
        Self::at(Utc::now(), payload, encodings, evasion_results)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        payload: impl Into<String>,
        encodings: BTreeMap<String, String>,
        evasion_results: BTreeMap<String, bool>,
    ) -> Self {
        let summary = ReportSummary {
            total_encodings: encodings.len(),
            total_tests: evasion_results.len(),
            evasion_success_rate: success_rate(&evasion_results),
        };

        Self {
            timestamp,
            original_payload: payload.into(),
            encoding_results: encodings,
            evasion_results,
            summary,
        }
    }

    /// Names of the tests that evaded detection
    pub fn successful_evasions(&self) -> impl Iterator<Item = &str> {
        self.evasion_results
            .iter()
            .filter(|(_, success)| **success)
            .map(|(name, _)| name.as_str())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Write pretty JSON to `path`, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_json(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn success_rate(results: &BTreeMap<String, bool>) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let successes = results.values().filter(|v| **v).count();
    (successes as f64 / results.len() as f64) * 100.0
}
