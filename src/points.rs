// SPDX-License-Identifier: MIT

//! Category point table.
//!
//! Maps a video-type category code (S1..S9C) to the point weight credited
//! per unit of work. The table is fixed for the lifetime of the process;
//! changing a weight is a deployment-time configuration change.

use std::collections::BTreeMap;

/// Immutable category -> point weight mapping.
#[derive(Debug, Clone)]
pub struct PointTable {
    weights: BTreeMap<String, f64>,
}

impl Default for PointTable {
    fn default() -> Self {
        let weights = [
            ("S1", 3.0),
            ("S2A", 2.0),
            ("S2B", 2.5),
            ("S3A", 2.0),
            ("S3B", 5.0),
            ("S4", 5.0),
            ("S5", 6.0),
            ("S6", 7.0),
            ("S7", 10.0),
            ("S8", 48.0),
            ("S9A", 2.5),
            ("S9B", 4.0),
            ("S9C", 7.0),
        ]
        .into_iter()
        .map(|(code, weight)| (code.to_string(), weight))
        .collect();

        Self { weights }
    }
}

impl PointTable {
    /// Build a table from a JSON object of `{"CODE": weight}` pairs,
    /// e.g. the `POINT_TABLE` environment variable.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let weights: BTreeMap<String, f64> = serde_json::from_str(json)?;
        Ok(Self { weights })
    }

    /// Point weight for a category code, if the code is mapped.
    pub fn weight(&self, code: &str) -> Option<f64> {
        self.weights.get(code).copied()
    }

    /// All known category codes in sorted order (filter UI contract).
    pub fn codes(&self) -> Vec<&str> {
        self.weights.keys().map(String::as_str).collect()
    }
}
