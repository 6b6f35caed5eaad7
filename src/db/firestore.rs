// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Tasks (normalized, scored records; upsert keyed by asana_id)
//! - Sync runs (append-only run log)
//! - Weekly targets (bulk replace-all writes)
//! - Day-offs (insert/delete only)

use chrono::NaiveDate;
use futures_util::{stream, StreamExt};

use crate::db::collections;
use crate::error::AppError;
use crate::models::{DayOff, SyncRun, Task, WeeklyTarget};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct Db {
    client: Option<firestore::FirestoreDb>,
}

impl Db {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Task Operations ─────────────────────────────────────────

    /// Create or overwrite a task, keyed by its Asana GID.
    ///
    /// This is the only write path for tasks; repeated syncs reconcile to
    /// one record per external ID.
    pub async fn upsert_task(&self, task: &Task) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TASKS)
            .document_id(&task.asana_id)
            .object(task)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Fetch the full task collection, most recently updated first.
    ///
    /// The aggregator operates on this as an in-memory snapshot.
    pub async fn list_tasks(&self) -> Result<Vec<Task>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TASKS)
            .order_by([(
                "updated_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Sync Run Operations ─────────────────────────────────────

    /// Record the start of a sync run.
    pub async fn create_sync_run(&self, run: &SyncRun) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SYNC_RUNS)
            .document_id(&run.id)
            .object(run)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write the finalized state of a sync run (success or error).
    pub async fn finalize_sync_run(&self, run: &SyncRun) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SYNC_RUNS)
            .document_id(&run.id)
            .object(run)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Most recent sync runs in reverse-chronological order.
    pub async fn latest_sync_runs(&self, limit: u32) -> Result<Vec<SyncRun>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SYNC_RUNS)
            .order_by([(
                "started_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Weekly Target Operations ────────────────────────────────

    /// All weekly targets.
    pub async fn list_targets(&self) -> Result<Vec<WeeklyTarget>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TARGETS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace the full target set: delete everything, insert the new set.
    ///
    /// Readers between the delete and the insert see no targets (target=0).
    /// That window is an accepted simplification of the save flow, not a
    /// bug to work around here.
    pub async fn replace_targets(&self, targets: &[WeeklyTarget]) -> Result<(), AppError> {
        let existing: Vec<WeeklyTarget> = self.list_targets().await?;

        self.batch_delete(&existing, collections::TARGETS, |t: &WeeklyTarget| t.doc_id())
            .await?;

        let client = self.get_client()?;
        stream::iter(targets.to_vec())
            .map(|target| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::TARGETS)
                    .document_id(target.doc_id())
                    .object(&target)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::info!(
            deleted = existing.len(),
            inserted = targets.len(),
            "Weekly targets replaced"
        );

        Ok(())
    }

    // ─── Day-Off Operations ──────────────────────────────────────

    /// Day-offs for one member within an inclusive date range.
    pub async fn list_day_offs(
        &self,
        user_email: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayOff>, AppError> {
        let email = user_email.to_string();
        let start = start.to_string();
        let end = end.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::DAY_OFFS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_email").eq(email.clone()),
                    q.field("date").greater_than_or_equal(start.clone()),
                    q.field("date").less_than_or_equal(end.clone()),
                ])
            })
            .order_by([("date", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch a single day-off record by ID.
    pub async fn get_day_off(&self, id: &str) -> Result<Option<DayOff>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DAY_OFFS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new day-off record.
    pub async fn insert_day_off(&self, day_off: &DayOff) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::DAY_OFFS)
            .document_id(&day_off.id)
            .object(day_off)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a day-off record by ID.
    pub async fn delete_day_off(&self, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::DAY_OFFS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}
