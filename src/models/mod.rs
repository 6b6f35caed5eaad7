// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod day_off;
pub mod sync;
pub mod target;
pub mod task;

pub use day_off::DayOff;
pub use sync::{SyncRun, SyncStatus};
pub use target::WeeklyTarget;
pub use task::{Task, TaskStatus};
