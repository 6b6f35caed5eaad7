// SPDX-License-Identifier: MIT

//! Sync run log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Success,
    Error,
}

/// One record per synchronization attempt.
///
/// Created at sync start with status `running`, finalized exactly once
/// with `success` or `error`, and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRun {
    /// Document ID
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SyncStatus,
    /// Raw records fetched from the source
    pub tasks_processed: u32,
    /// Records successfully upserted (skipped records are excluded)
    pub tasks_updated: u32,
    pub error_message: Option<String>,
}

impl SyncRun {
    /// A fresh run record in the `running` state.
    pub fn started(now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            started_at: now,
            ended_at: None,
            status: SyncStatus::Running,
            tasks_processed: 0,
            tasks_updated: 0,
            error_message: None,
        }
    }

    /// Finalize as successful.
    pub fn succeed(mut self, now: DateTime<Utc>, processed: u32, updated: u32) -> Self {
        self.ended_at = Some(now);
        self.status = SyncStatus::Success;
        self.tasks_processed = processed;
        self.tasks_updated = updated;
        self
    }

    /// Finalize as failed.
    pub fn fail(mut self, now: DateTime<Utc>, message: String) -> Self {
        self.ended_at = Some(now);
        self.status = SyncStatus::Error;
        self.error_message = Some(message);
        self
    }
}
