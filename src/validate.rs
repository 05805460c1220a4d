//! Input validation and synonym resolution for task fields.
//!
//! Statuses and priorities arrive from humans, OCR output and LLM
//! extraction, so resolution is three-tier: exact match → synonym
//! lookup → error with suggestion.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::model::{TaskPriority, TaskStatus};

// ── Valid value sets (O(1) lookups) ──────────────────────────

pub static VALID_STATUSES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["pending", "in_progress", "done"].into_iter().collect());

pub static VALID_PRIORITIES: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["low", "medium", "high"].into_iter().collect());

// ── Synonym maps ─────────────────────────────────────────────

pub static STATUS_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("todo", "pending"),
        ("to_do", "pending"),
        ("open", "pending"),
        ("new", "pending"),
        ("backlog", "pending"),
        ("wip", "in_progress"),
        ("in-progress", "in_progress"),
        ("in progress", "in_progress"),
        ("doing", "in_progress"),
        ("started", "in_progress"),
        ("active", "in_progress"),
        ("completed", "done"),
        ("complete", "done"),
        ("finished", "done"),
        ("closed", "done"),
        ("resolved", "done"),
    ]
    .into_iter()
    .collect()
});

pub static PRIORITY_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("critical", "high"),
        ("urgent", "high"),
        ("important", "high"),
        ("p0", "high"),
        ("p1", "high"),
        ("normal", "medium"),
        ("default", "medium"),
        ("med", "medium"),
        ("p2", "medium"),
        ("minor", "low"),
        ("trivial", "low"),
        ("p3", "low"),
    ]
    .into_iter()
    .collect()
});

/// Normalize a status string via exact match or synonym lookup.
///
/// Returns the canonical status, or an error with the original input
/// and an optional suggestion.
pub fn normalize_status(input: &str) -> Result<TaskStatus, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    let canonical = if VALID_STATUSES.contains(lower.as_str()) {
        Some(lower.as_str())
    } else {
        STATUS_SYNONYMS.get(lower.as_str()).copied()
    };

    if let Some(status) = canonical.and_then(|c| c.parse().ok()) {
        return Ok(status);
    }

    let suggestion = find_closest_match(&lower, &VALID_STATUSES, &STATUS_SYNONYMS);
    Err((input.to_string(), suggestion))
}

/// Normalize a priority string via exact match or synonym lookup.
pub fn normalize_priority(input: &str) -> Result<TaskPriority, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    let canonical = if VALID_PRIORITIES.contains(lower.as_str()) {
        Some(lower.as_str())
    } else {
        PRIORITY_SYNONYMS.get(lower.as_str()).copied()
    };

    if let Some(priority) = canonical.and_then(|c| c.parse().ok()) {
        return Ok(priority);
    }

    let suggestion = find_closest_match(&lower, &VALID_PRIORITIES, &PRIORITY_SYNONYMS);
    Err((input.to_string(), suggestion))
}

/// Turn a rejected value into a user-facing `InvalidArgument` error.
pub fn rejection_error(field: &str, (input, suggestion): (String, Option<String>)) -> crate::Error {
    match suggestion {
        Some(s) => crate::Error::InvalidArgument(format!(
            "unknown {field} '{input}' (did you mean '{s}'?)"
        )),
        None => crate::Error::InvalidArgument(format!("unknown {field} '{input}'")),
    }
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &v in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, v);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            let canonical = synonyms.get(v).copied().unwrap_or(v);
            best = Some((canonical, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let a_len = a.len();
    let b_len = b.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Find existing names similar to the searched one.
///
/// Returns up to `max` suggestions with edit distance ≤ 3,
/// sorted by distance then alphabetically.
pub fn find_similar_names(searched: &str, existing: &[String], max: usize) -> Vec<String> {
    let searched = searched.to_lowercase();
    let mut candidates: Vec<(usize, &str)> = existing
        .iter()
        .map(|name| (levenshtein_distance(&searched, &name.to_lowercase()), name.as_str()))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    candidates
        .into_iter()
        .take(max)
        .map(|(_, name)| name.to_string())
        .collect()
}
