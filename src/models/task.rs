// SPDX-License-Identifier: MIT

//! Normalized task model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Completion status derived from the Asana `completed` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Done,
    NotDone,
}

/// Stored task record in Firestore.
///
/// Exactly one record exists per `asana_id`; repeated syncs overwrite in
/// place (upsert), so duplicates never accumulate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Asana task GID (also used as document ID / upsert conflict target)
    pub asana_id: String,
    /// Task name/title
    pub name: String,
    /// Free-text notes
    pub description: Option<String>,
    /// Assignee display name
    pub assignee_name: Option<String>,
    /// Assignee email
    pub assignee_email: Option<String>,
    pub status: TaskStatus,
    /// When the task was completed (present for done tasks with history)
    pub completed_at: Option<DateTime<Utc>>,
    /// Due date (date only, no time component)
    pub due_date: Option<NaiveDate>,
    /// Derived video-type category code (e.g. "S4")
    pub category: Option<String>,
    /// Units of work this task represents; floored at 1
    pub quantity: u32,
    /// weight(category) x quantity, or 0 if the category is unmapped
    pub points: f64,
    /// Creative tool (CTST custom field)
    pub tool: Option<String>,
    pub tags: Vec<String>,
    /// Original Asana record, retained for audit/debug
    pub raw_payload: serde_json::Value,
    /// When this record was last normalized
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Date portion of the completion timestamp, used for all
    /// day/week bucketing.
    pub fn completed_date(&self) -> Option<NaiveDate> {
        self.completed_at.map(|ts| ts.date_naive())
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}
