// SPDX-License-Identifier: MIT

use std::sync::Arc;

use taskboard::config::Config;
use taskboard::db::Db;
use taskboard::routes::create_router;
use taskboard::services::SyncService;
use taskboard::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> Db {
    Db::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db_offline();
    let sync_service = SyncService::new(db.clone(), config.clone());

    let state = Arc::new(AppState {
        config,
        db,
        sync_service,
        sync_lock: tokio::sync::Mutex::new(()),
    });

    (create_router(state.clone()), state)
}
