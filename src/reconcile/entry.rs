//! Import entries.
//!
//! An entry is either a bare title string or an object with `title` and
//! optional `status` / `priority`. Anything else, and any entry whose
//! title normalizes to nothing, is dropped.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{TaskPriority, TaskStatus};
use crate::validate::{normalize_priority, normalize_status};

use super::normalize::normalize_title;

/// A usable import entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub title: String,
    pub key: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

/// Parse a JSON array of entries.
///
/// # Errors
///
/// Returns `InvalidArgument` if `value` is not an array.
pub fn parse_entries(value: &Value) -> Result<Vec<TaskEntry>> {
    let Value::Array(items) = value else {
        return Err(Error::InvalidArgument(
            "task entries must be a JSON array".into(),
        ));
    };

    Ok(items.iter().enumerate().filter_map(|(i, item)| {
        let entry = parse_entry(item);
        if entry.is_none() {
            debug!(index = i, "Dropping entry without a usable title");
        }
        entry
    }).collect())
}

fn parse_entry(item: &Value) -> Option<TaskEntry> {
    let (title, status, priority) = match item {
        Value::String(title) => (title.as_str(), None, None),
        Value::Object(map) => (
            map.get("title")?.as_str()?,
            map.get("status").and_then(Value::as_str),
            map.get("priority").and_then(Value::as_str),
        ),
        _ => return None,
    };

    let key = normalize_title(title);
    if key.is_empty() {
        return None;
    }

    Some(TaskEntry {
        title: title.trim().to_string(),
        key,
        status: status.map_or_else(TaskStatus::default, resolve_status),
        priority: priority.map_or_else(TaskPriority::default, resolve_priority),
    })
}

fn resolve_status(raw: &str) -> TaskStatus {
    normalize_status(raw).unwrap_or_else(|(input, _)| {
        warn!(status = %input, "Unknown status, using pending");
        TaskStatus::default()
    })
}

fn resolve_priority(raw: &str) -> TaskPriority {
    normalize_priority(raw).unwrap_or_else(|(input, _)| {
        warn!(priority = %input, "Unknown priority, using medium");
        TaskPriority::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strings_and_objects() {
        let entries = parse_entries(&json!([
            "Fix login bug.",
            {"title": "Write docs", "status": "completed", "priority": "urgent"},
            {"title": "Plan sprint", "status": "wip"}
        ]))
        .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "Fix login bug.");
        assert_eq!(entries[0].key, "fix login bug");
        assert_eq!(entries[0].status, TaskStatus::Pending);
        assert_eq!(entries[0].priority, TaskPriority::Medium);
        assert_eq!(entries[1].status, TaskStatus::Done);
        assert_eq!(entries[1].priority, TaskPriority::High);
        assert_eq!(entries[2].status, TaskStatus::InProgress);
    }

    #[test]
    fn test_unknown_values_fall_back_to_defaults() {
        let entries = parse_entries(&json!([
            {"title": "A", "status": "someday", "priority": "whenever"},
            {"title": "B", "status": 3}
        ]))
        .unwrap();
        assert_eq!(entries[0].status, TaskStatus::Pending);
        assert_eq!(entries[0].priority, TaskPriority::Medium);
        assert_eq!(entries[1].status, TaskStatus::Pending);
    }

    #[test]
    fn test_unusable_entries_are_dropped() {
        let entries = parse_entries(&json!([
            "",
            "   ",
            {"status": "done"},
            {"title": ""},
            {"title": 42},
            42,
            null,
            ["nested"],
            "Keep me"
        ]))
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Keep me");
    }

    #[test]
    fn test_non_array_is_invalid() {
        assert!(matches!(
            parse_entries(&json!({"title": "x"})),
            Err(Error::InvalidArgument(_))
        ));
        assert!(parse_entries(&json!("x")).is_err());
    }
}
