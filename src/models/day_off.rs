// SPDX-License-Identifier: MIT

//! Day-off records and target-point reduction.
//!
//! One record per day a member is off. Records are created and deleted,
//! never edited in place.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Target points a full day of absence is worth.
pub const POINTS_PER_DAY: u32 = 32;
/// Target points a half day of absence is worth.
pub const POINTS_PER_HALF_DAY: u32 = 16;

/// A registered absence for one member on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayOff {
    /// Document ID
    pub id: String,
    pub user_email: String,
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub is_half_day: bool,
    pub created_at: DateTime<Utc>,
}

impl DayOff {
    pub fn new(
        user_email: String,
        date: NaiveDate,
        reason: Option<String>,
        is_half_day: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_email,
            date,
            reason,
            is_half_day,
            created_at,
        }
    }
}

/// Total target-point reduction for a set of day-off records.
///
/// The aggregator does not apply this automatically; the caller combines
/// it with the team target.
pub fn target_reduction(records: &[DayOff]) -> u32 {
    records
        .iter()
        .map(|d| {
            if d.is_half_day {
                POINTS_PER_HALF_DAY
            } else {
                POINTS_PER_DAY
            }
        })
        .sum()
}
