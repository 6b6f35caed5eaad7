//! Database layer (Firestore).

pub mod firestore;

pub use firestore::Db;

/// Collection names as constants.
pub mod collections {
    pub const TASKS: &str = "tasks";
    pub const SYNC_RUNS: &str = "sync_runs";
    pub const TARGETS: &str = "targets";
    pub const DAY_OFFS: &str = "day_offs";
}
