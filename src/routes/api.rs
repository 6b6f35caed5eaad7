// SPDX-License-Identifier: MIT

//! Dashboard API routes.

use crate::aggregate::{
    self, AggregateConfig, DateWindow, FilterSpec, RankingMode, StatusFilter, TargetStrategy,
};
use crate::error::{AppError, Result};
use crate::models::{day_off, DayOff, Task, WeeklyTarget};
use crate::time_utils::week_start_containing;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_STATUS_LIMIT: u32 = 5;
const MAX_STATUS_LIMIT: u32 = 50;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sync", post(trigger_sync))
        .route("/api/sync/status", get(get_sync_status))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/tasks", get(get_tasks))
        .route("/api/categories", get(get_categories))
        .route("/api/targets", get(get_targets).put(put_targets))
        .route("/api/day-offs", get(get_day_offs).post(create_day_off))
        .route("/api/day-offs/{id}", delete(delete_day_off))
}

// ─── Sync ────────────────────────────────────────────────────

/// Trigger a full sync against the task source.
///
/// At most one sync runs at a time; a second trigger while one is in
/// flight gets 409 instead of queueing behind it.
async fn trigger_sync(
    State(state): State<Arc<AppState>>,
) -> Result<Json<crate::services::SyncOutcome>> {
    let _guard = state
        .sync_lock
        .try_lock()
        .map_err(|_| AppError::SyncInProgress)?;

    let outcome = state.sync_service.run().await?;
    Ok(Json(outcome))
}

#[derive(Deserialize)]
struct SyncStatusQuery {
    limit: Option<u32>,
}

/// Requested run count clamped to a sane window.
fn status_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_STATUS_LIMIT)
        .clamp(1, MAX_STATUS_LIMIT)
}

/// Most recent sync runs, newest first.
async fn get_sync_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SyncStatusQuery>,
) -> Result<Json<Vec<crate::models::SyncRun>>> {
    let runs = state.db.latest_sync_runs(status_limit(query.limit)).await?;
    Ok(Json(runs))
}

// ─── Dashboard & Tasks ───────────────────────────────────────

#[derive(Deserialize)]
struct DashboardQuery {
    /// Any date inside the week to view; snapped to the configured week
    /// start. Ignored when an explicit start/end range is given.
    week: Option<String>,
    start: Option<String>,
    end: Option<String>,
    /// Comma-separated assignee names
    assignees: Option<String>,
    /// Comma-separated category codes
    categories: Option<String>,
    status: Option<StatusFilter>,
    /// Leaderboard ranking mode override; defaults to the configured mode
    ranking: Option<RankingMode>,
    /// Team-target strategy override; defaults to the configured strategy
    target_strategy: Option<TargetStrategy>,
}

fn parse_date(raw: &str, param: &str) -> Result<NaiveDate> {
    raw.parse().map_err(|_| {
        AppError::BadRequest(format!(
            "Invalid '{}' parameter: must be a YYYY-MM-DD date",
            param
        ))
    })
}

fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

impl DashboardQuery {
    /// Resolve query parameters into a validated filter. An explicit
    /// range takes precedence over a week; with neither, the window is
    /// the current week.
    fn into_filter(self, state: &AppState) -> Result<FilterSpec> {
        let window = match (self.start.as_deref(), self.end.as_deref()) {
            (Some(start), Some(end)) => DateWindow::Range {
                start: parse_date(start, "start")?,
                end: parse_date(end, "end")?,
            },
            (Some(_), None) => {
                return Err(AppError::BadRequest(
                    "Missing 'end' parameter for date range".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(AppError::BadRequest(
                    "Missing 'start' parameter for date range".to_string(),
                ))
            }
            (None, None) => {
                let anchor = match self.week.as_deref() {
                    Some(raw) => parse_date(raw, "week")?,
                    None => chrono::Utc::now().date_naive(),
                };
                DateWindow::Week(week_start_containing(
                    anchor,
                    state.config.week_starts_on,
                ))
            }
        };

        let filter = FilterSpec {
            assignees: split_csv(self.assignees.as_deref()),
            categories: split_csv(self.categories.as_deref()),
            status: self.status.unwrap_or_default(),
            window,
        };
        filter.validate()?;
        Ok(filter)
    }

    /// Aggregation constants with any per-request view overrides applied.
    fn aggregate_config(&self, state: &AppState) -> AggregateConfig {
        let mut cfg = state.config.aggregate_config();
        if let Some(ranking) = self.ranking {
            cfg.ranking = ranking;
        }
        if let Some(strategy) = self.target_strategy {
            cfg.target_strategy = strategy;
        }
        cfg
    }
}

/// All dashboard views for one filter, computed from a fresh snapshot.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<aggregate::Dashboard>> {
    let cfg = query.aggregate_config(&state);
    let filter = query.into_filter(&state)?;
    let tasks = state.db.list_tasks().await?;
    let targets = state.db.list_targets().await?;
    let dashboard = aggregate::aggregate(&tasks, &filter, &targets, &cfg)?;
    Ok(Json(dashboard))
}

/// The filtered task list backing the dashboard table view.
async fn get_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<Task>>> {
    let filter = query.into_filter(&state)?;
    let tasks = state.db.list_tasks().await?;
    let filtered: Vec<Task> = aggregate::filter_tasks(&tasks, &filter)?
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(filtered))
}

#[derive(Serialize)]
struct CategoriesResponse {
    categories: Vec<String>,
}

/// Known category codes, for the dashboard filter controls.
async fn get_categories(State(state): State<Arc<AppState>>) -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: state
            .config
            .point_table
            .codes()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

// ─── Weekly Targets ──────────────────────────────────────────

async fn get_targets(State(state): State<Arc<AppState>>) -> Result<Json<Vec<WeeklyTarget>>> {
    let targets = state.db.list_targets().await?;
    Ok(Json(targets))
}

#[derive(Serialize)]
struct ReplaceTargetsResponse {
    success: bool,
    count: usize,
}

/// Replace the full weekly-target table with the submitted set.
async fn put_targets(
    State(state): State<Arc<AppState>>,
    Json(targets): Json<Vec<WeeklyTarget>>,
) -> Result<Json<ReplaceTargetsResponse>> {
    for target in &targets {
        if target.assignee_name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Target assignee name must not be empty".to_string(),
            ));
        }
        if target.target_points < 0.0 || !target.target_points.is_finite() {
            return Err(AppError::BadRequest(format!(
                "Invalid target points for {}",
                target.assignee_name
            )));
        }
    }

    state.db.replace_targets(&targets).await?;
    Ok(Json(ReplaceTargetsResponse {
        success: true,
        count: targets.len(),
    }))
}

// ─── Day-Offs ────────────────────────────────────────────────

#[derive(Deserialize)]
struct DayOffsQuery {
    email: String,
    start: String,
    end: String,
}

#[derive(Serialize)]
struct DayOffsResponse {
    day_offs: Vec<DayOff>,
    /// Points to subtract from the member's target over the range
    target_reduction: u32,
}

/// Day-offs for one member in a date range, with the target reduction
/// they imply.
async fn get_day_offs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DayOffsQuery>,
) -> Result<Json<DayOffsResponse>> {
    let start = parse_date(&query.start, "start")?;
    let end = parse_date(&query.end, "end")?;
    if end < start {
        return Err(AppError::BadRequest(format!(
            "End date {} is before start date {}",
            end, start
        )));
    }

    let day_offs = state.db.list_day_offs(&query.email, start, end).await?;
    let target_reduction = day_off::target_reduction(&day_offs);
    Ok(Json(DayOffsResponse {
        day_offs,
        target_reduction,
    }))
}

#[derive(Deserialize)]
struct CreateDayOffRequest {
    user_email: String,
    date: String,
    reason: Option<String>,
    #[serde(default)]
    is_half_day: bool,
}

async fn create_day_off(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDayOffRequest>,
) -> Result<Json<DayOff>> {
    if request.user_email.trim().is_empty() {
        return Err(AppError::BadRequest(
            "user_email must not be empty".to_string(),
        ));
    }
    let date = parse_date(&request.date, "date")?;

    let day_off = DayOff::new(
        request.user_email.trim().to_string(),
        date,
        request.reason,
        request.is_half_day,
        chrono::Utc::now(),
    );
    state.db.insert_day_off(&day_off).await?;

    tracing::info!(id = %day_off.id, date = %day_off.date, "Day-off recorded");
    Ok(Json(day_off))
}

#[derive(Serialize)]
struct DeleteDayOffResponse {
    success: bool,
}

async fn delete_day_off(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteDayOffResponse>> {
    if id.trim().is_empty() {
        return Err(AppError::BadRequest("Missing day-off id".to_string()));
    }
    if state.db.get_day_off(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Day-off {} not found", id)));
    }
    state.db.delete_day_off(&id).await?;
    Ok(Json(DeleteDayOffResponse { success: true }))
}
