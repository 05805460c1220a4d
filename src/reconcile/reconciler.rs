//! Merge-on-import of task lists.
//!
//! Task identity here is the normalized title, not the ID. Two unrelated
//! tasks whose titles normalize to the same string are treated as one.
//!
//! The whole batch runs in a single IMMEDIATE transaction: the snapshot of
//! existing tasks is read inside it, so a batch applies completely or not
//! at all, and concurrent imports into the same project are serialized.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Task, TaskStatus};
use crate::storage::events::EventType;
use crate::storage::sqlite::{insert_task, set_task_status, tasks_for_project};
use crate::storage::SqliteStorage;

use super::entry::parse_entries;
use super::normalize::normalize_title;

/// How entries are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Match entries to existing tasks by normalized title.
    #[default]
    Merge,
    /// Create every entry as a new task.
    #[value(name = "create_new", alias = "create-new")]
    CreateNew,
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::CreateNew => write!(f, "create_new"),
        }
    }
}

/// Records new tasks are linked to.
#[derive(Debug, Clone, Default)]
pub struct TaskLink {
    pub recording_id: Option<String>,
    pub decision_id: Option<String>,
}

impl TaskLink {
    /// Check that the linked records exist and belong to `project_id`.
    ///
    /// # Errors
    ///
    /// `RecordingNotFound` / `DecisionNotFound` for a dangling link,
    /// `InvalidArgument` for a record owned by another project.
    pub fn validate(&self, storage: &SqliteStorage, project_id: &str) -> Result<()> {
        if let Some(id) = &self.recording_id {
            let recording = storage
                .get_recording(id)?
                .ok_or_else(|| Error::RecordingNotFound { id: id.clone() })?;
            if recording.project_id != project_id {
                return Err(Error::InvalidArgument(format!(
                    "recording {id} belongs to project {}, not {project_id}",
                    recording.project_id
                )));
            }
        }
        if let Some(id) = &self.decision_id {
            let decision = storage
                .get_decision(id)?
                .ok_or_else(|| Error::DecisionNotFound { id: id.clone() })?;
            if decision.project_id != project_id {
                return Err(Error::InvalidArgument(format!(
                    "decision {id} belongs to project {}, not {project_id}",
                    decision.project_id
                )));
            }
        }
        Ok(())
    }
}

/// Outcome counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub project_id: String,
    pub mode: ImportMode,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Entries that carried a usable title.
    pub total: usize,
}

/// Snapshot entry: task ID and current status.
struct Known {
    id: String,
    status: TaskStatus,
}

/// Apply `entries` (a JSON array) to the tasks of `project` (ID or name).
///
/// # Errors
///
/// - `RequiredField` if `project` is blank, `ProjectNotFound` if unknown
/// - `InvalidArgument` if `entries` is not an array
/// - `RecordingNotFound` / `DecisionNotFound` for a dangling link,
///   `InvalidArgument` for a link into another project
/// - a storage error, in which case nothing was written
pub fn reconcile(
    storage: &mut SqliteStorage,
    project: &str,
    entries: &Value,
    mode: ImportMode,
    link: &TaskLink,
    actor: &str,
) -> Result<ReconcileStats> {
    if project.trim().is_empty() {
        return Err(Error::RequiredField("project"));
    }
    let project = storage.resolve_project(project)?;
    let entries = parse_entries(entries)?;

    link.validate(storage, &project.id)?;

    let mut stats = ReconcileStats {
        project_id: project.id.clone(),
        mode,
        total: entries.len(),
        ..Default::default()
    };

    storage.mutate("reconcile_tasks", actor, |tx, ctx| {
        let mut known: HashMap<String, Known> = HashMap::new();
        if mode == ImportMode::Merge {
            for task in tasks_for_project(tx, &project.id)? {
                known.entry(normalize_title(&task.title)).or_insert(Known {
                    id: task.id,
                    status: task.status,
                });
            }
        }

        let now = chrono::Utc::now().timestamp_millis();

        for entry in &entries {
            if mode == ImportMode::Merge {
                if let Some(existing) = known.get_mut(&entry.key) {
                    if entry.status == TaskStatus::Done && existing.status != TaskStatus::Done {
                        set_task_status(tx, &existing.id, TaskStatus::Done, now)?;
                        ctx.record_change(
                            "task",
                            &existing.id,
                            EventType::TaskCompleted,
                            Some(existing.status.to_string()),
                            Some(TaskStatus::Done.to_string()),
                        );
                        existing.status = TaskStatus::Done;
                        stats.updated += 1;
                    } else {
                        debug!(title = %entry.title, "Task already present, skipping");
                        stats.skipped += 1;
                    }
                    continue;
                }
            }

            let mut task = Task::new(Some(&project.id), &entry.title, entry.status, entry.priority);
            task.recording_id.clone_from(&link.recording_id);
            task.decision_id.clone_from(&link.decision_id);
            insert_task(tx, &task)?;
            ctx.record_event("task", &task.id, EventType::TaskCreated);

            if mode == ImportMode::Merge {
                known.insert(
                    entry.key.clone(),
                    Known {
                        id: task.id,
                        status: task.status,
                    },
                );
            }
            stats.created += 1;
        }

        Ok(())
    })?;

    info!(
        project = %stats.project_id,
        mode = %mode,
        created = stats.created,
        updated = stats.updated,
        skipped = stats.skipped,
        "Reconciled tasks"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Decision, Project, Recording, RecordingKind, TaskPriority};
    use serde_json::json;

    fn setup() -> (SqliteStorage, Project) {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let project = Project::new("Backend".into(), None);
        storage.create_project(&project, "t").unwrap();
        (storage, project)
    }

    fn add_task(storage: &mut SqliteStorage, project: &Project, title: &str, status: TaskStatus) -> Task {
        let task = Task::new(Some(&project.id), title, status, TaskPriority::Medium);
        storage.create_task(&task, "t").unwrap();
        task
    }

    #[test]
    fn test_merge_scenario() {
        let (mut storage, project) = setup();
        let existing = add_task(&mut storage, &project, "Fix login bug", TaskStatus::Pending);

        let stats = reconcile(
            &mut storage,
            &project.id,
            &json!([{"title": "fix login bug.", "status": "done"}, "Write docs"]),
            ImportMode::Merge,
            &TaskLink::default(),
            "t",
        )
        .unwrap();

        assert_eq!((stats.created, stats.updated, stats.skipped, stats.total), (1, 1, 0, 2));
        let updated = storage.get_task(&existing.id).unwrap().unwrap();
        assert_eq!(updated.status, TaskStatus::Done);
        assert!(updated.completed_at.is_some());
        assert_eq!(storage.list_tasks(&project.id, None).unwrap().len(), 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let (mut storage, project) = setup();
        let batch = json!(["Fix login bug", {"title": "Ship v2", "status": "done"}]);

        let first = reconcile(&mut storage, "Backend", &batch, ImportMode::Merge, &TaskLink::default(), "t").unwrap();
        assert_eq!(first.created, 2);

        let second = reconcile(&mut storage, "Backend", &batch, ImportMode::Merge, &TaskLink::default(), "t").unwrap();
        assert_eq!((second.created, second.updated, second.skipped), (0, 0, 2));
        assert_eq!(storage.list_tasks(&project.id, None).unwrap().len(), 2);
    }

    #[test]
    fn test_done_task_is_never_reopened() {
        let (mut storage, project) = setup();
        let done = add_task(&mut storage, &project, "Deploy", TaskStatus::Done);

        let stats = reconcile(
            &mut storage,
            &project.id,
            &json!([{"title": "DEPLOY", "status": "pending"}]),
            ImportMode::Merge,
            &TaskLink::default(),
            "t",
        )
        .unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(storage.get_task(&done.id).unwrap().unwrap().status, TaskStatus::Done);
    }

    #[test]
    fn test_duplicates_within_batch_collapse_in_merge_mode() {
        let (mut storage, project) = setup();
        let stats = reconcile(
            &mut storage,
            &project.id,
            &json!(["Write docs", "write docs!", {"title": "Write Docs", "status": "done"}]),
            ImportMode::Merge,
            &TaskLink::default(),
            "t",
        )
        .unwrap();
        assert_eq!((stats.created, stats.skipped, stats.updated, stats.total), (1, 1, 1, 3));
        let tasks = storage.list_tasks(&project.id, None).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Done);
    }

    #[test]
    fn test_create_new_creates_everything() {
        let (mut storage, project) = setup();
        add_task(&mut storage, &project, "Fix login bug", TaskStatus::Pending);

        let stats = reconcile(
            &mut storage,
            &project.id,
            &json!(["Fix login bug", "Fix login bug", {"priority": "high"}]),
            ImportMode::CreateNew,
            &TaskLink::default(),
            "t",
        )
        .unwrap();
        assert_eq!((stats.created, stats.updated, stats.skipped, stats.total), (2, 0, 0, 2));
        assert_eq!(storage.list_tasks(&project.id, None).unwrap().len(), 3);
    }

    #[test]
    fn test_links_are_applied_and_validated() {
        let (mut storage, project) = setup();
        let rec = Recording::new(&project.id, "Standup", RecordingKind::Voice, "fix it".into());
        storage.create_recording(&rec, "t").unwrap();

        let link = TaskLink {
            recording_id: Some(rec.id.clone()),
            decision_id: None,
        };
        reconcile(&mut storage, &project.id, &json!(["Fix it"]), ImportMode::Merge, &link, "t").unwrap();
        let tasks = storage.list_tasks(&project.id, None).unwrap();
        assert_eq!(tasks[0].recording_id.as_deref(), Some(rec.id.as_str()));

        let dangling = TaskLink {
            recording_id: Some("rec_missing".into()),
            decision_id: None,
        };
        assert!(matches!(
            reconcile(&mut storage, &project.id, &json!(["x"]), ImportMode::Merge, &dangling, "t"),
            Err(Error::RecordingNotFound { .. })
        ));
    }

    #[test]
    fn test_links_into_another_project_are_rejected() {
        let (mut storage, backend) = setup();
        let frontend = Project::new("Frontend".into(), None);
        storage.create_project(&frontend, "t").unwrap();

        let rec = Recording::new(&frontend.id, "Design review", RecordingKind::Ocr, "todo".into());
        storage.create_recording(&rec, "t").unwrap();
        let decision = Decision::new(&frontend.id, "Use Svelte", None, None, None);
        storage.create_decision(&decision, "t").unwrap();

        for link in [
            TaskLink { recording_id: Some(rec.id.clone()), decision_id: None },
            TaskLink { recording_id: None, decision_id: Some(decision.id.clone()) },
        ] {
            assert!(matches!(
                reconcile(&mut storage, &backend.id, &json!(["Fix it"]), ImportMode::Merge, &link, "t"),
                Err(Error::InvalidArgument(_))
            ));
            link.validate(&storage, &frontend.id).unwrap();
        }
        assert!(storage.list_tasks(&backend.id, None).unwrap().is_empty());
    }

    #[test]
    fn test_input_errors() {
        let (mut storage, project) = setup();
        let link = TaskLink::default();

        assert!(matches!(
            reconcile(&mut storage, " ", &json!([]), ImportMode::Merge, &link, "t"),
            Err(Error::RequiredField("project"))
        ));
        assert!(matches!(
            reconcile(&mut storage, "proj_missing_entirely", &json!([]), ImportMode::Merge, &link, "t"),
            Err(Error::ProjectNotFound { .. })
        ));
        assert!(matches!(
            reconcile(&mut storage, &project.id, &json!({"title": "x"}), ImportMode::Merge, &link, "t"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_failed_batch_writes_nothing() {
        let (mut storage, project) = setup();
        // A trigger that rejects the second insert simulates a mid-batch failure.
        storage
            .conn()
            .execute_batch(
                "CREATE TRIGGER reject_boom BEFORE INSERT ON tasks
                 WHEN NEW.title = 'boom'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let result = reconcile(
            &mut storage,
            &project.id,
            &json!(["first", "boom", "third"]),
            ImportMode::Merge,
            &TaskLink::default(),
            "t",
        );
        assert!(matches!(result, Err(Error::Database(_))));
        assert!(storage.list_tasks(&project.id, None).unwrap().is_empty());
    }
}
