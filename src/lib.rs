// SPDX-License-Identifier: MIT

//! Taskboard: team performance dashboard backend.
//!
//! This crate syncs tasks from Asana, scores them against a category
//! point table, and serves aggregated dashboard views (per-member
//! rollups, leaderboards, daily trends, on-time rates) over HTTP.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod points;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::SyncService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub sync_service: SyncService,
    /// Held for the duration of a sync run so only one runs at a time
    /// per deployment.
    pub sync_lock: tokio::sync::Mutex<()>,
}
