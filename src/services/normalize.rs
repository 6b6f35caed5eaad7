// SPDX-License-Identifier: MIT

//! Task normalization: derive category, quantity, tool, and points from
//! a raw Asana task.
//!
//! Custom-field lookup is tolerant by design: the rules match field names
//! case-insensitively, the first matching field wins, and anything
//! missing or malformed degrades to a default (null / 1 / 0) instead of
//! failing the sync.

use chrono::{DateTime, Utc};

use crate::models::{Task, TaskStatus};
use crate::points::PointTable;
use crate::services::asana::{AsanaCustomField, AsanaTask};

/// A single field-name matching rule.
#[derive(Debug, Clone, Copy)]
enum NameRule {
    Contains(&'static str),
    Equals(&'static str),
}

impl NameRule {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            NameRule::Contains(needle) => lowered.contains(needle),
            NameRule::Equals(exact) => lowered == *exact,
        }
    }
}

/// Field names that identify the video-type category.
const CATEGORY_RULES: &[NameRule] = &[
    NameRule::Contains("video type"),
    NameRule::Contains("videotype"),
    NameRule::Equals("type"),
];

/// Field names that identify the quantity.
const QUANTITY_RULES: &[NameRule] = &[
    NameRule::Contains("quantity"),
    NameRule::Contains("count"),
    NameRule::Equals("qty"),
];

/// Field names that identify the creative tool.
const TOOL_RULES: &[NameRule] = &[NameRule::Equals("ctst"), NameRule::Contains("creative tool")];

/// First custom field whose lowercased name matches any rule.
fn find_field<'a>(fields: &'a [AsanaCustomField], rules: &[NameRule]) -> Option<&'a AsanaCustomField> {
    fields.iter().find(|f| {
        let lowered = f.name.to_lowercase();
        rules.iter().any(|r| r.matches(&lowered))
    })
}

/// Enum label first, display string as fallback; empty strings count as
/// absent.
fn label_value(field: &AsanaCustomField) -> Option<String> {
    field
        .enum_value
        .as_ref()
        .map(|e| e.name.clone())
        .filter(|v| !v.is_empty())
        .or_else(|| field.display_value.clone().filter(|v| !v.is_empty()))
}

/// Derived category code, or `None` when no field matches or both values
/// are empty.
pub fn derive_category(fields: &[AsanaCustomField]) -> Option<String> {
    find_field(fields, CATEGORY_RULES).and_then(label_value)
}

/// Derived quantity, floored at 1. Missing, zero, and negative values all
/// normalize to 1.
pub fn derive_quantity(fields: &[AsanaCustomField]) -> u32 {
    let raw = find_field(fields, QUANTITY_RULES)
        .and_then(|f| f.number_value)
        .unwrap_or(1.0);
    (raw as i64).max(1) as u32
}

/// Derived creative tool, with the same enum-then-display fallback as
/// the category.
pub fn derive_tool(fields: &[AsanaCustomField]) -> Option<String> {
    find_field(fields, TOOL_RULES).and_then(label_value)
}

/// Map one raw Asana task into the stored, scored form.
///
/// `raw_payload` is the original JSON record, retained on the task for
/// audit/debug. Never errors; see module docs.
pub fn normalize(
    raw: &AsanaTask,
    raw_payload: serde_json::Value,
    table: &PointTable,
    now: DateTime<Utc>,
) -> Task {
    let category = derive_category(&raw.custom_fields);
    let quantity = derive_quantity(&raw.custom_fields);
    let tool = derive_tool(&raw.custom_fields);

    let points = match category.as_deref().and_then(|c| table.weight(c)) {
        Some(weight) => weight * f64::from(quantity),
        None => {
            if let Some(code) = &category {
                // Unmapped codes score zero rather than failing the sync;
                // log so newly introduced categories are discoverable.
                tracing::debug!(category = %code, task = %raw.gid, "Unmapped category, scoring 0");
            }
            0.0
        }
    };

    Task {
        asana_id: raw.gid.clone(),
        name: raw.name.clone(),
        description: raw.notes.clone().filter(|n| !n.is_empty()),
        assignee_name: raw.assignee.as_ref().map(|a| a.name.clone()),
        assignee_email: raw.assignee.as_ref().and_then(|a| a.email.clone()),
        status: if raw.completed {
            TaskStatus::Done
        } else {
            TaskStatus::NotDone
        },
        completed_at: raw.completed_at,
        due_date: raw.due_on,
        category,
        quantity,
        points,
        tool,
        tags: raw.tags.iter().map(|t| t.name.clone()).collect(),
        raw_payload,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::asana::AsanaEnumValue;

    fn field(name: &str) -> AsanaCustomField {
        AsanaCustomField {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn enum_field(name: &str, label: &str) -> AsanaCustomField {
        AsanaCustomField {
            name: name.to_string(),
            enum_value: Some(AsanaEnumValue {
                name: label.to_string(),
            }),
            ..Default::default()
        }
    }

    fn number_field(name: &str, value: f64) -> AsanaCustomField {
        AsanaCustomField {
            name: name.to_string(),
            number_value: Some(value),
            ..Default::default()
        }
    }

    fn raw_task(fields: Vec<AsanaCustomField>) -> AsanaTask {
        serde_json::from_value::<AsanaTask>(serde_json::json!({ "gid": "1" }))
            .map(|mut t| {
                t.custom_fields = fields;
                t
            })
            .unwrap()
    }

    #[test]
    fn test_category_prefers_enum_label() {
        let mut f = enum_field("Video Type", "S1");
        f.display_value = Some("something else".to_string());
        assert_eq!(derive_category(&[f]), Some("S1".to_string()));
    }

    #[test]
    fn test_category_display_fallback() {
        let mut f = field("videotype");
        f.display_value = Some("S2A".to_string());
        assert_eq!(derive_category(&[f]), Some("S2A".to_string()));
    }

    #[test]
    fn test_category_exact_type_match() {
        let f = enum_field("Type", "S5");
        assert_eq!(derive_category(&[f]), Some("S5".to_string()));
        // "type" must match exactly, not as a substring
        let f = enum_field("Prototype", "S5");
        assert_eq!(derive_category(&[f]), None);
    }

    #[test]
    fn test_category_empty_values_are_absent() {
        let mut f = enum_field("Video Type", "");
        f.display_value = Some(String::new());
        assert_eq!(derive_category(&[f]), None);
    }

    #[test]
    fn test_first_matching_field_wins() {
        let fields = vec![enum_field("Video Type", "S1"), enum_field("Type", "S8")];
        assert_eq!(derive_category(&fields), Some("S1".to_string()));
    }

    #[test]
    fn test_quantity_floor() {
        assert_eq!(derive_quantity(&[number_field("Quantity", 0.0)]), 1);
        assert_eq!(derive_quantity(&[number_field("Quantity", -3.0)]), 1);
        assert_eq!(derive_quantity(&[number_field("qty", 4.0)]), 4);
        assert_eq!(derive_quantity(&[]), 1);
        // Field present but without a numeric value
        assert_eq!(derive_quantity(&[field("Video Count")]), 1);
    }

    #[test]
    fn test_tool_rules() {
        assert_eq!(
            derive_tool(&[enum_field("CTST", "Premiere")]),
            Some("Premiere".to_string())
        );
        assert_eq!(
            derive_tool(&[enum_field("Creative Tool (new)", "AE")]),
            Some("AE".to_string())
        );
        assert_eq!(derive_tool(&[enum_field("Tooling", "x")]), None);
    }

    #[test]
    fn test_points_mapped_category() {
        // S1 (weight 3) x 2 = 6
        let raw = raw_task(vec![
            enum_field("Video Type", "S1"),
            number_field("Quantity", 2.0),
        ]);
        let task = normalize(&raw, serde_json::Value::Null, &PointTable::default(), Utc::now());
        assert_eq!(task.points, 6.0);
        assert_eq!(task.quantity, 2);
        assert_eq!(task.category.as_deref(), Some("S1"));
    }

    #[test]
    fn test_points_unmapped_category() {
        let raw = raw_task(vec![
            enum_field("Video Type", "ZZZ"),
            number_field("Quantity", 4.0),
        ]);
        let task = normalize(&raw, serde_json::Value::Null, &PointTable::default(), Utc::now());
        assert_eq!(task.points, 0.0);
        assert_eq!(task.quantity, 4);
    }

    #[test]
    fn test_points_no_category_field() {
        let raw = raw_task(vec![]);
        let task = normalize(&raw, serde_json::Value::Null, &PointTable::default(), Utc::now());
        assert_eq!(task.points, 0.0);
        assert_eq!(task.quantity, 1);
        assert!(task.category.is_none());
    }

    #[test]
    fn test_status_from_completed_flag() {
        let raw: AsanaTask = serde_json::from_value(serde_json::json!({
            "gid": "9",
            "completed": true,
            "completed_at": "2025-06-02T10:00:00Z"
        }))
        .unwrap();
        let task = normalize(&raw, serde_json::Value::Null, &PointTable::default(), Utc::now());
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_date(), Some("2025-06-02".parse().unwrap()));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let raw = raw_task(vec![
            enum_field("Video Type", "S4"),
            number_field("Quantity", 2.0),
        ]);
        let now = Utc::now();
        let a = normalize(&raw, serde_json::Value::Null, &PointTable::default(), now);
        let b = normalize(&raw, serde_json::Value::Null, &PointTable::default(), now);
        assert_eq!(a.points, b.points);
        assert_eq!(a.quantity, b.quantity);
        assert_eq!(a.category, b.category);
    }
}
