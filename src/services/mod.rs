// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod asana;
pub mod normalize;
pub mod sync;

pub use asana::AsanaClient;
pub use sync::{SyncOutcome, SyncService};
