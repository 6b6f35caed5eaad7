// SPDX-License-Identifier: MIT

//! Weekly point targets, maintained externally per member per week.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// (assignee, week) -> target points. The aggregator only reads these;
/// writes replace the full set in bulk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyTarget {
    pub assignee_name: String,
    /// First day of the target week
    pub week_start_date: NaiveDate,
    pub target_points: f64,
}

impl WeeklyTarget {
    /// Composite document ID. The assignee name is URL-encoded so
    /// arbitrary display names stay valid Firestore document IDs.
    pub fn doc_id(&self) -> String {
        format!(
            "{}_{}",
            urlencoding::encode(&self.assignee_name),
            self.week_start_date
        )
    }
}
