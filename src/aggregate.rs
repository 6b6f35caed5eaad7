// SPDX-License-Identifier: MIT

//! Task aggregation: the pure computation behind every dashboard view.
//!
//! Given a snapshot of the task collection, a filter specification, and
//! the weekly-target table, this module computes per-assignee rollups,
//! team KPIs, the daily trend, the leaderboard, and on-time/late
//! statistics. No side effects, no I/O; safe to invoke concurrently.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Task, WeeklyTarget};
use crate::time_utils::{week_start_containing, weeks_in_window};

/// Leaderboard entries exposed; ties beyond the cutoff are dropped.
pub const LEADERBOARD_SIZE: usize = 10;

/// Best/worst due-date performers shown.
const DUE_DATE_TOP_N: usize = 3;

// ─── Filter specification ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Done,
    NotDone,
}

/// Active date window: one dashboard week or an arbitrary range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// A 7-day week beginning on this date.
    Week(NaiveDate),
    Range { start: NaiveDate, end: NaiveDate },
}

/// Which views the aggregation is restricted to.
///
/// Empty assignee/category selections mean "no filtering on that
/// dimension".
#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub assignees: Vec<String>,
    pub categories: Vec<String>,
    pub status: StatusFilter,
    pub window: DateWindow,
}

impl FilterSpec {
    /// Fail fast on nonsensical input instead of returning an empty
    /// result.
    pub fn validate(&self) -> Result<(), AppError> {
        if let DateWindow::Range { start, end } = self.window {
            if end < start {
                return Err(AppError::BadRequest(format!(
                    "End date {} is before start date {}",
                    end, start
                )));
            }
        }
        Ok(())
    }

    /// Inclusive [start, end] bounds of the active window.
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        match self.window {
            DateWindow::Week(start) => (start, start + Days::new(6)),
            DateWindow::Range { start, end } => (start, end),
        }
    }
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Team-target computation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStrategy {
    /// Sum of each member's explicit weekly targets in the window.
    #[default]
    Sum,
    /// Default per-member weekly target x members x weeks in window.
    Constant,
}

/// Leaderboard ranking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Weeks achieved desc, points desc, name asc.
    #[default]
    Weeks,
    /// Target-attainment percent desc, name asc.
    Percent,
}

/// Business constants the aggregation depends on, injected once from
/// config rather than re-declared per call site.
#[derive(Debug, Clone)]
pub struct AggregateConfig {
    pub weekly_threshold: f64,
    pub default_weekly_target: f64,
    pub week_starts_on: Weekday,
    pub target_strategy: TargetStrategy,
    pub ranking: RankingMode,
}

// ─── Output shapes ───────────────────────────────────────────────────────────

/// Per-assignee rollup over in-scope done tasks.
#[derive(Debug, Clone, Serialize)]
pub struct AssigneeRollup {
    pub name: String,
    pub points: f64,
    /// Sum of quantities (units of work)
    pub videos: u32,
    /// Sum of weekly targets whose week start falls in the window
    pub target: f64,
    pub percent: f64,
    /// category -> summed quantity, for distribution charts
    pub category_mix: BTreeMap<String, u32>,
    /// Calendar weeks (over all data, not just the window) in which this
    /// member's points met the weekly threshold
    pub weeks_achieved: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamRollup {
    pub total_points: f64,
    pub total_videos: u32,
    pub done_count: u32,
    pub not_done_count: u32,
    pub active_assignees: u32,
    pub avg_points_per_video: f64,
    pub team_target: f64,
    pub team_achieved_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyTrendPoint {
    pub date: NaiveDate,
    pub points: f64,
    pub tasks: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: String,
    pub points: f64,
    pub target: f64,
    pub percent: f64,
    pub weeks_achieved: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DueDateStat {
    pub name: String,
    pub total: u32,
    pub on_time: u32,
    pub late: u32,
    pub on_time_rate: f64,
    pub late_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DueDateStats {
    pub per_assignee: Vec<DueDateStat>,
    /// Top performers by on-time rate
    pub best: Vec<DueDateStat>,
    /// Members with the highest late rate (> 0 only)
    pub worst: Vec<DueDateStat>,
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub team: TeamRollup,
    pub assignees: Vec<AssigneeRollup>,
    pub daily_trend: Vec<DailyTrendPoint>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub due_dates: DueDateStats,
}

// ─── Filtering ───────────────────────────────────────────────────────────────

fn passes_base(task: &Task, filter: &FilterSpec) -> bool {
    if !filter.assignees.is_empty() {
        let name = task.assignee_name.as_deref().unwrap_or("");
        if !filter.assignees.iter().any(|a| a == name) {
            return false;
        }
    }
    if !filter.categories.is_empty() {
        let category = task.category.as_deref().unwrap_or("");
        if !filter.categories.iter().any(|c| c == category) {
            return false;
        }
    }
    match filter.status {
        StatusFilter::All => true,
        StatusFilter::Done => task.is_done(),
        StatusFilter::NotDone => !task.is_done(),
    }
}

/// Date-window predicate. Done tasks are included only when their
/// completion date falls inside the window; not-done tasks pass
/// unconditionally since they represent the current backlog regardless
/// of age.
fn passes_window(task: &Task, start: NaiveDate, end: NaiveDate) -> bool {
    if !task.is_done() {
        return true;
    }
    match task.completed_date() {
        Some(date) => date >= start && date <= end,
        // A done task without a completion timestamp cannot be
        // time-bucketed; it is never in scope.
        None => false,
    }
}

/// Apply the full filter (dimension predicates + date window).
pub fn filter_tasks<'a>(tasks: &'a [Task], filter: &FilterSpec) -> Result<Vec<&'a Task>, AppError> {
    filter.validate()?;
    let (start, end) = filter.bounds();
    Ok(tasks
        .iter()
        .filter(|t| passes_base(t, filter) && passes_window(t, start, end))
        .collect())
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Compute all dashboard views from a task snapshot.
pub fn aggregate(
    tasks: &[Task],
    filter: &FilterSpec,
    targets: &[WeeklyTarget],
    cfg: &AggregateConfig,
) -> Result<Dashboard, AppError> {
    filter.validate()?;
    let (start, end) = filter.bounds();

    // Dimension filters apply everywhere; the date window applies to
    // everything except weeks-achieved bucketing.
    let base: Vec<&Task> = tasks.iter().filter(|t| passes_base(t, filter)).collect();
    let in_scope: Vec<&Task> = base
        .iter()
        .copied()
        .filter(|t| passes_window(t, start, end))
        .collect();
    let done: Vec<&Task> = in_scope.iter().copied().filter(|t| t.is_done()).collect();
    let not_done_count = (in_scope.len() - done.len()) as u32;

    let window_targets: Vec<&WeeklyTarget> = targets
        .iter()
        .filter(|t| t.week_start_date >= start && t.week_start_date <= end)
        .collect();

    let weeks_achieved = weeks_achieved_by_assignee(&base, cfg);

    // Rollup candidates: anyone with a done task in scope or a target in
    // the window. Zero-signal entries are dropped below.
    let mut names: BTreeSet<&str> = done
        .iter()
        .filter_map(|t| t.assignee_name.as_deref())
        .collect();
    names.extend(window_targets.iter().map(|t| t.assignee_name.as_str()));

    let assignees: Vec<AssigneeRollup> = names
        .into_iter()
        .map(|name| {
            let user_tasks: Vec<&&Task> = done
                .iter()
                .filter(|t| t.assignee_name.as_deref() == Some(name))
                .collect();

            let points: f64 = user_tasks.iter().map(|t| t.points).sum();
            let videos: u32 = user_tasks.iter().map(|t| t.quantity).sum();
            let target: f64 = window_targets
                .iter()
                .filter(|t| t.assignee_name == name)
                .map(|t| t.target_points)
                .sum();

            let mut category_mix: BTreeMap<String, u32> = BTreeMap::new();
            for task in &user_tasks {
                if let Some(category) = &task.category {
                    *category_mix.entry(category.clone()).or_insert(0) += task.quantity;
                }
            }

            AssigneeRollup {
                name: name.to_string(),
                points,
                videos,
                target,
                percent: if target > 0.0 {
                    points / target * 100.0
                } else {
                    0.0
                },
                category_mix,
                weeks_achieved: weeks_achieved.get(name).copied().unwrap_or(0),
            }
        })
        .filter(|a| a.points > 0.0 || a.videos > 0 || a.target > 0.0)
        .collect();

    let team = team_rollup(&done, not_done_count, &assignees, start, end, cfg);
    let daily_trend = daily_trend(&done, &filter.window);
    let leaderboard = leaderboard(&assignees, cfg.ranking);
    let due_dates = due_date_stats(&in_scope);

    Ok(Dashboard {
        team,
        assignees,
        daily_trend,
        leaderboard,
        due_dates,
    })
}

/// Distinct calendar weeks per assignee in which summed points met the
/// threshold. Buckets by completion date over the whole (pre-window)
/// task set: the question is "how many weeks did this person hit the
/// bar", not "how many weeks inside the filter".
fn weeks_achieved_by_assignee(base: &[&Task], cfg: &AggregateConfig) -> HashMap<String, u32> {
    let mut weekly_points: HashMap<(String, NaiveDate), f64> = HashMap::new();

    for task in base {
        if !task.is_done() {
            continue;
        }
        let (Some(name), Some(date)) = (task.assignee_name.as_deref(), task.completed_date())
        else {
            continue;
        };
        let week = week_start_containing(date, cfg.week_starts_on);
        *weekly_points.entry((name.to_string(), week)).or_insert(0.0) += task.points;
    }

    let mut achieved: HashMap<String, u32> = HashMap::new();
    for ((name, _week), points) in weekly_points {
        if points >= cfg.weekly_threshold {
            *achieved.entry(name).or_insert(0) += 1;
        }
    }
    achieved
}

fn team_rollup(
    done: &[&Task],
    not_done_count: u32,
    assignees: &[AssigneeRollup],
    start: NaiveDate,
    end: NaiveDate,
    cfg: &AggregateConfig,
) -> TeamRollup {
    let total_points: f64 = done.iter().map(|t| t.points).sum();
    let total_videos: u32 = done.iter().map(|t| t.quantity).sum();

    let active_assignees = done
        .iter()
        .filter_map(|t| t.assignee_name.as_deref())
        .collect::<HashSet<_>>()
        .len() as u32;

    let team_target = match cfg.target_strategy {
        TargetStrategy::Sum => assignees.iter().map(|a| a.target).sum(),
        TargetStrategy::Constant => {
            cfg.default_weekly_target
                * assignees.len() as f64
                * f64::from(weeks_in_window(start, end, cfg.week_starts_on))
        }
    };

    TeamRollup {
        total_points,
        total_videos,
        done_count: done.len() as u32,
        not_done_count,
        active_assignees,
        avg_points_per_video: if total_videos > 0 {
            total_points / f64::from(total_videos)
        } else {
            0.0
        },
        team_target,
        team_achieved_percent: if team_target > 0.0 {
            total_points / team_target * 100.0
        } else {
            0.0
        },
    }
}

/// Points and done-task count per day of the active week. Range windows
/// have no natural 7-day shape, so their trend is empty.
fn daily_trend(done: &[&Task], window: &DateWindow) -> Vec<DailyTrendPoint> {
    let DateWindow::Week(week_start) = window else {
        return Vec::new();
    };

    (0..7)
        .map(|i| {
            let date = *week_start + Days::new(i);
            let day_tasks: Vec<&&Task> = done
                .iter()
                .filter(|t| t.completed_date() == Some(date))
                .collect();
            DailyTrendPoint {
                date,
                points: day_tasks.iter().map(|t| t.points).sum(),
                tasks: day_tasks.len() as u32,
            }
        })
        .collect()
}

/// Rank rollups with a total order so truncation at the cutoff is
/// deterministic: any remaining tie breaks on the assignee name.
fn leaderboard(assignees: &[AssigneeRollup], ranking: RankingMode) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&AssigneeRollup> = assignees.iter().collect();

    match ranking {
        RankingMode::Weeks => ranked.sort_by(|a, b| {
            b.weeks_achieved
                .cmp(&a.weeks_achieved)
                .then(b.points.total_cmp(&a.points))
                .then_with(|| a.name.cmp(&b.name))
        }),
        RankingMode::Percent => ranked.sort_by(|a, b| {
            b.percent
                .total_cmp(&a.percent)
                .then_with(|| a.name.cmp(&b.name))
        }),
    }

    ranked
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(i, a)| LeaderboardEntry {
            rank: (i + 1) as u32,
            name: a.name.clone(),
            points: a.points,
            target: a.target,
            percent: a.percent,
            weeks_achieved: a.weeks_achieved,
        })
        .collect()
}

/// On-time/late statistics over done tasks carrying both a due date and
/// a completion date. Completing on the due date counts as on-time.
/// Tasks missing either date are excluded entirely.
fn due_date_stats(in_scope: &[&Task]) -> DueDateStats {
    let mut by_name: BTreeMap<&str, (u32, u32)> = BTreeMap::new(); // (on_time, late)

    for task in in_scope {
        if !task.is_done() {
            continue;
        }
        let (Some(name), Some(due), Some(completed)) = (
            task.assignee_name.as_deref(),
            task.due_date,
            task.completed_date(),
        ) else {
            continue;
        };

        let entry = by_name.entry(name).or_insert((0, 0));
        if completed > due {
            entry.1 += 1;
        } else {
            entry.0 += 1;
        }
    }

    let per_assignee: Vec<DueDateStat> = by_name
        .into_iter()
        .map(|(name, (on_time, late))| {
            let total = on_time + late;
            DueDateStat {
                name: name.to_string(),
                total,
                on_time,
                late,
                on_time_rate: f64::from(on_time) / f64::from(total) * 100.0,
                late_rate: f64::from(late) / f64::from(total) * 100.0,
            }
        })
        .collect();

    let mut best = per_assignee.clone();
    best.sort_by(|a, b| {
        b.on_time_rate
            .total_cmp(&a.on_time_rate)
            .then(b.total.cmp(&a.total))
            .then_with(|| a.name.cmp(&b.name))
    });
    best.truncate(DUE_DATE_TOP_N);

    let mut worst: Vec<DueDateStat> = per_assignee
        .iter()
        .filter(|s| s.late_rate > 0.0)
        .cloned()
        .collect();
    worst.sort_by(|a, b| {
        b.late_rate
            .total_cmp(&a.late_rate)
            .then(b.total.cmp(&a.total))
            .then_with(|| a.name.cmp(&b.name))
    });
    worst.truncate(DUE_DATE_TOP_N);

    DueDateStats {
        per_assignee,
        best,
        worst,
    }
}
