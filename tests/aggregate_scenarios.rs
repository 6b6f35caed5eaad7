// SPDX-License-Identifier: MIT

//! End-to-end aggregation scenario: raw Asana records through the
//! normalizer and the aggregator, the same path a sync followed by a
//! dashboard request takes (minus storage).

use chrono::{NaiveDate, Utc};
use serde_json::json;

use taskboard::aggregate::{self, DateWindow, FilterSpec, StatusFilter};
use taskboard::config::Config;
use taskboard::models::{Task, WeeklyTarget};
use taskboard::points::PointTable;
use taskboard::services::normalize;

mod common;

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Build a raw Asana record and run it through the normalizer.
fn normalized(
    gid: &str,
    assignee: &str,
    completed_at: Option<&str>,
    due_on: Option<&str>,
    category: Option<&str>,
    quantity: Option<f64>,
) -> Task {
    let mut custom_fields = Vec::new();
    if let Some(code) = category {
        custom_fields.push(json!({
            "name": "Video Type",
            "enum_value": { "name": code }
        }));
    }
    if let Some(count) = quantity {
        custom_fields.push(json!({
            "name": "Quantity",
            "number_value": count
        }));
    }

    let raw = json!({
        "gid": gid,
        "name": format!("Task {}", gid),
        "completed": completed_at.is_some(),
        "completed_at": completed_at,
        "due_on": due_on,
        "assignee": { "name": assignee, "email": format!("{}@example.com", assignee.to_lowercase()) },
        "custom_fields": custom_fields,
    });

    let parsed = serde_json::from_value(raw.clone()).expect("valid raw record");
    normalize::normalize(&parsed, raw, &PointTable::default(), Utc::now())
}

#[tokio::test]
async fn test_week_dashboard_scenario() {
    // Week of 2025-06-02 (Mon). Ana completes one S2A and a batch of two
    // S4s in the week; her S1 from the previous week stays out of scope.
    // Bo has an open backlog item and a late S3B.
    let tasks = vec![
        normalized("1", "Ana", Some("2025-06-02T09:00:00.000Z"), Some("2025-06-02"), Some("S2A"), None),
        normalized("2", "Ana", Some("2025-06-04T15:30:00.000Z"), Some("2025-06-06"), Some("S4"), Some(2.0)),
        normalized("3", "Ana", Some("2025-05-28T10:00:00.000Z"), None, Some("S1"), None),
        normalized("4", "Bo", None, Some("2025-06-05"), Some("S5"), None),
        normalized("5", "Bo", Some("2025-06-06T18:00:00.000Z"), Some("2025-06-04"), Some("S3B"), None),
    ];

    let targets = vec![
        WeeklyTarget {
            assignee_name: "Ana".to_string(),
            week_start_date: d("2025-06-02"),
            target_points: 24.0,
        },
        WeeklyTarget {
            assignee_name: "Bo".to_string(),
            week_start_date: d("2025-06-02"),
            target_points: 20.0,
        },
    ];

    let filter = FilterSpec {
        assignees: vec![],
        categories: vec![],
        status: StatusFilter::All,
        window: DateWindow::Week(d("2025-06-02")),
    };
    let cfg = Config::default().aggregate_config();

    let dashboard = aggregate::aggregate(&tasks, &filter, &targets, &cfg).unwrap();

    // Ana: S2A x1 = 2 + S4 x2 = 10 -> 12 points, 3 units
    let ana = dashboard
        .assignees
        .iter()
        .find(|a| a.name == "Ana")
        .unwrap();
    assert_eq!(ana.points, 12.0);
    assert_eq!(ana.videos, 3);
    assert_eq!(ana.target, 24.0);
    assert_eq!(ana.percent, 50.0);

    // Bo: S3B x1 = 5 points; the open backlog item adds no points
    let bo = dashboard.assignees.iter().find(|a| a.name == "Bo").unwrap();
    assert_eq!(bo.points, 5.0);

    // Team view: 17 points over 4 units, 3 done, 1 not done
    assert_eq!(dashboard.team.total_points, 17.0);
    assert_eq!(dashboard.team.total_videos, 4);
    assert_eq!(dashboard.team.done_count, 3);
    assert_eq!(dashboard.team.not_done_count, 1);
    assert_eq!(dashboard.team.team_target, 44.0);

    // Daily trend covers the full week; Wednesday carries Ana's batch
    assert_eq!(dashboard.daily_trend.len(), 7);
    assert_eq!(dashboard.daily_trend[2].date, d("2025-06-04"));
    assert_eq!(dashboard.daily_trend[2].points, 10.0);

    // Due dates: Ana on time twice, Bo late once
    let ana_due = dashboard
        .due_dates
        .per_assignee
        .iter()
        .find(|s| s.name == "Ana")
        .unwrap();
    assert_eq!(ana_due.on_time, 2);
    assert_eq!(ana_due.late, 0);
    assert_eq!(dashboard.due_dates.worst[0].name, "Bo");

    // Leaderboard is a total order over the two members
    assert_eq!(dashboard.leaderboard.len(), 2);
    assert_eq!(dashboard.leaderboard[0].rank, 1);
}

#[tokio::test]
async fn test_unmapped_and_missing_fields_flow_through() {
    let tasks = vec![
        // Unknown category code scores zero but keeps its quantity
        normalized("1", "Ana", Some("2025-06-02T09:00:00.000Z"), None, Some("ZZZ"), Some(4.0)),
        // No custom fields at all: zero points, quantity defaults to 1
        normalized("2", "Ana", Some("2025-06-03T09:00:00.000Z"), None, None, None),
    ];

    let filter = FilterSpec {
        assignees: vec![],
        categories: vec![],
        status: StatusFilter::All,
        window: DateWindow::Week(d("2025-06-02")),
    };
    let cfg = Config::default().aggregate_config();

    let dashboard = aggregate::aggregate(&tasks, &filter, &[], &cfg).unwrap();

    assert_eq!(dashboard.team.total_points, 0.0);
    assert_eq!(dashboard.team.total_videos, 5);
    // Zero points but nonzero units still count as signal
    assert_eq!(dashboard.assignees.len(), 1);
}

#[tokio::test]
async fn test_range_window_spanning_weeks() {
    let tasks = vec![
        normalized("1", "Ana", Some("2025-06-02T09:00:00.000Z"), None, Some("S8"), Some(4.0)),
        normalized("2", "Ana", Some("2025-06-09T09:00:00.000Z"), None, Some("S8"), Some(4.0)),
    ];
    let targets = vec![
        WeeklyTarget {
            assignee_name: "Ana".to_string(),
            week_start_date: d("2025-06-02"),
            target_points: 160.0,
        },
        WeeklyTarget {
            assignee_name: "Ana".to_string(),
            week_start_date: d("2025-06-09"),
            target_points: 160.0,
        },
    ];

    let filter = FilterSpec {
        assignees: vec![],
        categories: vec![],
        status: StatusFilter::Done,
        window: DateWindow::Range {
            start: d("2025-06-01"),
            end: d("2025-06-15"),
        },
    };
    let cfg = Config::default().aggregate_config();

    let dashboard = aggregate::aggregate(&tasks, &filter, &targets, &cfg).unwrap();

    // S8 x4 = 192 points per week, both weeks in range
    let ana = &dashboard.assignees[0];
    assert_eq!(ana.points, 384.0);
    assert_eq!(ana.target, 320.0);
    assert_eq!(ana.weeks_achieved, 2);

    // Range windows have no daily trend
    assert!(dashboard.daily_trend.is_empty());
}
