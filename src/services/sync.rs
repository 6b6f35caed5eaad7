// SPDX-License-Identifier: MIT

//! Sync orchestrator.
//!
//! Reconciles the local task store with the external source:
//! 1. Record a sync run (status running)
//! 2. Page through the Asana project until the source stops returning a
//!    continuation token, or the configured page bound is hit
//! 3. Normalize and upsert each record keyed by `asana_id`
//! 4. Finalize the run exactly once with success or error
//!
//! Per-record upsert failures are skipped and only visible through the
//! processed/updated counters; source transport and credential failures
//! abort the whole run with nothing committed from the fetched pages.

use chrono::Utc;
use futures_util::{stream, StreamExt};

use crate::config::Config;
use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::SyncRun;
use crate::services::asana::{AsanaClient, AsanaTask};
use crate::services::normalize;

/// Concurrent upserts per batch. Page fetches stay sequential because
/// each request needs the previous page's continuation token.
const MAX_CONCURRENT_UPSERTS: usize = 50;

/// Result of a completed sync run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncOutcome {
    pub success: bool,
    pub tasks_processed: u32,
    pub tasks_updated: u32,
    pub duration_ms: i64,
    pub finished_at: String,
}

/// High-level sync service; one instance per app, at most one run at a
/// time (callers hold `AppState::sync_lock` for the duration).
#[derive(Clone)]
pub struct SyncService {
    db: Db,
    config: Config,
}

impl SyncService {
    pub fn new(db: Db, config: Config) -> Self {
        Self { db, config }
    }

    /// Run one full sync. The run record is finalized exactly once, on
    /// both the success and the error path.
    pub async fn run(&self) -> Result<SyncOutcome> {
        let started_at = Utc::now();
        let run = SyncRun::started(started_at);
        self.db.create_sync_run(&run).await?;

        tracing::info!(run_id = %run.id, "Sync run started");

        match self.execute().await {
            Ok((processed, updated)) => {
                let ended = Utc::now();
                let finalized = run.succeed(ended, processed, updated);
                self.db.finalize_sync_run(&finalized).await?;

                tracing::info!(
                    run_id = %finalized.id,
                    processed,
                    updated,
                    "Sync run succeeded"
                );

                Ok(SyncOutcome {
                    success: true,
                    tasks_processed: processed,
                    tasks_updated: updated,
                    duration_ms: (ended - started_at).num_milliseconds(),
                    finished_at: crate::time_utils::format_utc_rfc3339(ended),
                })
            }
            Err(e) => {
                let finalized = run.fail(Utc::now(), e.to_string());
                if let Err(log_err) = self.db.finalize_sync_run(&finalized).await {
                    tracing::error!(error = %log_err, "Failed to record sync error");
                }
                tracing::warn!(run_id = %finalized.id, error = %e, "Sync run failed");
                Err(e)
            }
        }
    }

    /// Fetch, normalize, and upsert. Returns (processed, updated).
    async fn execute(&self) -> Result<(u32, u32)> {
        let client = AsanaClient::from_config(&self.config)?;

        // Sequential pagination; the loop is bounded so a source that
        // never stops returning continuation tokens cannot run forever.
        let mut raw_records: Vec<serde_json::Value> = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages: u32 = 0;

        loop {
            let page = client
                .list_tasks_page(offset.as_deref(), self.config.sync_page_size)
                .await?;
            raw_records.extend(page.tasks);
            pages += 1;

            match page.next_offset {
                Some(next) => {
                    if pages >= self.config.sync_max_pages {
                        return Err(AppError::AsanaApi(format!(
                            "Pagination exceeded {} pages without completing",
                            self.config.sync_max_pages
                        )));
                    }
                    offset = Some(next);
                }
                None => break,
            }
        }

        let processed = raw_records.len() as u32;
        tracing::debug!(processed, pages, "Fetched all task pages");

        // Upserts are independent per asana_id; run them with bounded
        // concurrency and count only the successes.
        let now = Utc::now();
        let table = &self.config.point_table;
        let db = &self.db;

        let updated = stream::iter(raw_records)
            .map(|value| async move {
                let raw: AsanaTask = match serde_json::from_value(value.clone()) {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping malformed task record");
                        return false;
                    }
                };

                let task = normalize::normalize(&raw, value, table, now);
                match db.upsert_task(&task).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(asana_id = %task.asana_id, error = %e, "Skipping failed upsert");
                        false
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_UPSERTS)
            .filter(|ok| std::future::ready(*ok))
            .count()
            .await as u32;

        Ok((processed, updated))
    }
}
