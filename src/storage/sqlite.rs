//! SQLite storage implementation.
//!
//! This module provides the main storage backend for projmem using SQLite.
//! Every write goes through [`SqliteStorage::mutate`], which opens an
//! IMMEDIATE transaction and records audit events before committing.

use crate::error::{Error, Result};
use crate::model::{
    Decision, DecisionEmbedding, Project, Recording, RecordingKind, Task, TaskPriority, TaskStatus,
};
use crate::storage::events::{insert_event, Event, EventType};
use crate::storage::schema::apply_schema;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Context for a mutation operation, collecting audit events.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Actor performing the operation.
    pub actor: String,
    /// Events to write at the end of the transaction.
    pub events: Vec<Event>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            events: Vec::new(),
        }
    }

    /// Record an event for this operation.
    pub fn record_event(&mut self, entity_type: &str, entity_id: &str, event_type: EventType) {
        self.events
            .push(Event::new(entity_type, entity_id, event_type, &self.actor));
    }

    /// Record an event with old/new values for field tracking.
    pub fn record_change(
        &mut self,
        entity_type: &str,
        entity_id: &str,
        event_type: EventType,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        self.events.push(
            Event::new(entity_type, entity_id, event_type, &self.actor)
                .with_values(old_value, new_value)
                .with_comment(&self.op_name),
        );
    }
}

/// Field changes for [`SqliteStorage::update_decision`].
///
/// `None` leaves a field untouched; `Some("")` clears an optional field.
#[derive(Debug, Default, Clone)]
pub struct DecisionUpdate<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub reason: Option<&'a str>,
    pub consequences: Option<&'a str>,
}

impl DecisionUpdate<'_> {
    /// Whether any field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.reason.is_none()
            && self.consequences.is_none()
    }
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout (default 5 seconds).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(timeout_ms.map_or(Duration::from_secs(5), Duration::from_millis))?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// 1. Begins an IMMEDIATE transaction (takes the write lock up front)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Commits (or rolls back when the closure fails)
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, actor);

        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;

        Ok(result)
    }

    // ==================
    // Project Operations
    // ==================

    /// Create a project.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the name is taken, or a database error.
    pub fn create_project(&mut self, project: &Project, actor: &str) -> Result<()> {
        self.mutate("create_project", actor, |tx, ctx| {
            tx.execute(
                "INSERT INTO projects (id, name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    project.id,
                    project.name,
                    project.description,
                    project.created_at,
                    project.updated_at
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(f, _)
                    if f.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Error::InvalidArgument(format!("project '{}' already exists", project.name))
                }
                other => Error::Database(other),
            })?;

            ctx.record_event("project", &project.id, EventType::ProjectCreated);
            Ok(())
        })
    }

    /// Get a project by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        self.conn
            .query_row(
                "SELECT id, name, description, created_at, updated_at FROM projects WHERE id = ?1",
                [id],
                map_project_row,
            )
            .optional()
            .map_err(Error::from)
    }

    /// Get a project by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        self.conn
            .query_row(
                "SELECT id, name, description, created_at, updated_at
                 FROM projects WHERE name = ?1 COLLATE NOCASE",
                [name],
                map_project_row,
            )
            .optional()
            .map_err(Error::from)
    }

    /// Resolve a project from an ID or a name.
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound` (with similar names when any exist) if
    /// nothing matches.
    pub fn resolve_project(&self, id_or_name: &str) -> Result<Project> {
        if let Some(project) = self.get_project(id_or_name)? {
            return Ok(project);
        }
        if let Some(project) = self.get_project_by_name(id_or_name)? {
            return Ok(project);
        }

        let names: Vec<String> = self.list_projects()?.into_iter().map(|p| p.name).collect();
        let similar = crate::validate::find_similar_names(id_or_name, &names, 3);
        if similar.is_empty() {
            Err(Error::ProjectNotFound {
                id: id_or_name.to_string(),
            })
        } else {
            Err(Error::ProjectNotFoundSimilar {
                id: id_or_name.to_string(),
                similar,
            })
        }
    }

    /// List all projects, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM projects ORDER BY name COLLATE NOCASE",
        )?;
        let rows = stmt.query_map([], map_project_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // ===================
    // Decision Operations
    // ===================

    /// Create a decision. Any embedding on the struct is ignored; use
    /// [`Self::store_decision_embedding`] once one has been computed.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_decision(&mut self, decision: &Decision, actor: &str) -> Result<()> {
        self.mutate("create_decision", actor, |tx, ctx| {
            tx.execute(
                "INSERT INTO decisions (id, project_id, title, description, reason, consequences, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    decision.id,
                    decision.project_id,
                    decision.title,
                    decision.description,
                    decision.reason,
                    decision.consequences,
                    decision.created_at,
                    decision.updated_at
                ],
            )?;

            ctx.record_event("decision", &decision.id, EventType::DecisionCreated);
            Ok(())
        })
    }

    /// Get a decision by ID, including its cached embedding.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_decision(&self, id: &str) -> Result<Option<Decision>> {
        let sql = format!("SELECT {DECISION_COLUMNS} FROM decisions WHERE id = ?1");
        self.conn
            .query_row(&sql, [id], map_decision_row)
            .optional()
            .map_err(Error::from)
    }

    /// List decisions for a project in storage order (oldest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_decisions(&self, project_id: &str, limit: Option<usize>) -> Result<Vec<Decision>> {
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let sql = format!(
            "SELECT {DECISION_COLUMNS} FROM decisions
             WHERE project_id = ?1
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params![project_id, limit], map_decision_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Update decision text fields.
    ///
    /// The cached embedding is left as is; its content hash no longer
    /// matching is what marks the decision stale.
    ///
    /// # Errors
    ///
    /// Returns `DecisionNotFound` if the ID is unknown.
    pub fn update_decision(
        &mut self,
        id: &str,
        update: &DecisionUpdate<'_>,
        actor: &str,
    ) -> Result<Decision> {
        let now = chrono::Utc::now().timestamp_millis();
        let blank_to_null = |v: Option<&str>| v.map(|s| (!s.trim().is_empty()).then(|| s.to_string()));

        self.mutate("update_decision", actor, |tx, ctx| {
            let rows = tx.execute(
                "UPDATE decisions SET
                    title = COALESCE(?1, title),
                    description = CASE WHEN ?2 THEN ?3 ELSE description END,
                    reason = CASE WHEN ?4 THEN ?5 ELSE reason END,
                    consequences = CASE WHEN ?6 THEN ?7 ELSE consequences END,
                    updated_at = ?8
                 WHERE id = ?9",
                rusqlite::params![
                    update.title,
                    update.description.is_some(),
                    blank_to_null(update.description).flatten(),
                    update.reason.is_some(),
                    blank_to_null(update.reason).flatten(),
                    update.consequences.is_some(),
                    blank_to_null(update.consequences).flatten(),
                    now,
                    id
                ],
            )?;

            if rows == 0 {
                return Err(Error::DecisionNotFound { id: id.to_string() });
            }

            ctx.record_event("decision", id, EventType::DecisionUpdated);

            let sql = format!("SELECT {DECISION_COLUMNS} FROM decisions WHERE id = ?1");
            tx.query_row(&sql, [id], map_decision_row)
                .map_err(Error::from)
        })
    }

    /// Delete a decision. Tasks linked to it keep existing, unlinked.
    ///
    /// # Errors
    ///
    /// Returns `DecisionNotFound` if the ID is unknown.
    pub fn delete_decision(&mut self, id: &str, actor: &str) -> Result<()> {
        self.mutate("delete_decision", actor, |tx, ctx| {
            let rows = tx.execute("DELETE FROM decisions WHERE id = ?1", [id])?;
            if rows == 0 {
                return Err(Error::DecisionNotFound { id: id.to_string() });
            }
            ctx.record_event("decision", id, EventType::DecisionDeleted);
            Ok(())
        })
    }

    /// Store a computed embedding on a decision.
    ///
    /// The vector and its metadata are written by a single UPDATE, so a
    /// decision never carries a partial embedding.
    ///
    /// # Errors
    ///
    /// Returns `Embedding` if the vector is empty or disagrees with the
    /// declared dimensionality, `DecisionNotFound` if the ID is unknown.
    pub fn store_decision_embedding(
        &mut self,
        id: &str,
        embedding: &DecisionEmbedding,
        actor: &str,
    ) -> Result<()> {
        if embedding.vector.is_empty() || embedding.vector.len() != embedding.dimensions {
            return Err(Error::Embedding(format!(
                "refusing to store a {}-value vector declared as {} dimensions",
                embedding.vector.len(),
                embedding.dimensions
            )));
        }

        let blob = embedding_to_blob(&embedding.vector);
        let dimensions = i64::try_from(embedding.dimensions).unwrap_or(i64::MAX);

        self.mutate("store_decision_embedding", actor, |tx, ctx| {
            let rows = tx.execute(
                "UPDATE decisions SET
                    embedding = ?1,
                    embedding_provider = ?2,
                    embedding_model = ?3,
                    embedding_dimensions = ?4,
                    embedding_hash = ?5,
                    embedded_at = ?6
                 WHERE id = ?7",
                rusqlite::params![
                    blob,
                    embedding.provider,
                    embedding.model,
                    dimensions,
                    embedding.content_hash,
                    embedding.embedded_at,
                    id
                ],
            )?;

            if rows == 0 {
                return Err(Error::DecisionNotFound { id: id.to_string() });
            }

            ctx.record_change(
                "decision",
                id,
                EventType::DecisionEmbedded,
                None,
                Some(format!("{}:{}", embedding.provider, embedding.model)),
            );
            Ok(())
        })
    }

    /// Decisions of a project that carry an embedding, in storage order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_decisions_with_embedding(&self, project_id: &str) -> Result<Vec<Decision>> {
        let sql = format!(
            "SELECT {DECISION_COLUMNS} FROM decisions
             WHERE project_id = ?1 AND embedding IS NOT NULL
             ORDER BY created_at ASC, rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([project_id], map_decision_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Case-insensitive substring match over the decision text fields,
    /// most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn search_decisions_text(&self, project_id: &str, query: &str) -> Result<Vec<Decision>> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let sql = format!(
            "SELECT {DECISION_COLUMNS} FROM decisions
             WHERE project_id = ?1
               AND (title LIKE ?2 ESCAPE '\\'
                    OR description LIKE ?2 ESCAPE '\\'
                    OR reason LIKE ?2 ESCAPE '\\'
                    OR consequences LIKE ?2 ESCAPE '\\')
             ORDER BY updated_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params![project_id, pattern], map_decision_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // ====================
    // Recording Operations
    // ====================

    /// Create a recording.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_recording(&mut self, recording: &Recording, actor: &str) -> Result<()> {
        self.mutate("create_recording", actor, |tx, ctx| {
            tx.execute(
                "INSERT INTO recordings (id, project_id, title, kind, transcript, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    recording.id,
                    recording.project_id,
                    recording.title,
                    recording.kind.as_str(),
                    recording.transcript,
                    recording.created_at
                ],
            )?;
            ctx.record_event("recording", &recording.id, EventType::RecordingCreated);
            Ok(())
        })
    }

    /// Get a recording by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_recording(&self, id: &str) -> Result<Option<Recording>> {
        self.conn
            .query_row(
                "SELECT id, project_id, title, kind, transcript, created_at FROM recordings WHERE id = ?1",
                [id],
                map_recording_row,
            )
            .optional()
            .map_err(Error::from)
    }

    /// List recordings of a project, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_recordings(&self, project_id: &str) -> Result<Vec<Recording>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, title, kind, transcript, created_at
             FROM recordings WHERE project_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([project_id], map_recording_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Delete a recording. Tasks extracted from it keep existing, unlinked.
    ///
    /// # Errors
    ///
    /// Returns `RecordingNotFound` if the ID is unknown.
    pub fn delete_recording(&mut self, id: &str, actor: &str) -> Result<()> {
        self.mutate("delete_recording", actor, |tx, ctx| {
            let rows = tx.execute("DELETE FROM recordings WHERE id = ?1", [id])?;
            if rows == 0 {
                return Err(Error::RecordingNotFound { id: id.to_string() });
            }
            ctx.record_event("recording", id, EventType::RecordingDeleted);
            Ok(())
        })
    }

    // ===============
    // Task Operations
    // ===============

    /// Create a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_task(&mut self, task: &Task, actor: &str) -> Result<()> {
        self.mutate("create_task", actor, |tx, ctx| {
            insert_task(tx, task)?;
            ctx.record_event("task", &task.id, EventType::TaskCreated);
            Ok(())
        })
    }

    /// Get a task by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        self.conn
            .query_row(&sql, [id], map_task_row)
            .optional()
            .map_err(Error::from)
    }

    /// List tasks of a project (oldest first), optionally by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tasks(&self, project_id: &str, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        match status {
            None => tasks_for_project(&self.conn, project_id),
            Some(status) => {
                let sql = format!(
                    "SELECT {TASK_COLUMNS} FROM tasks
                     WHERE project_id = ?1 AND status = ?2
                     ORDER BY created_at ASC, rowid ASC"
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map(rusqlite::params![project_id, status.as_str()], map_task_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(Error::from)
            }
        }
    }

    /// Change a task's status.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` if the ID is unknown.
    pub fn update_task_status(&mut self, id: &str, status: TaskStatus, actor: &str) -> Result<Task> {
        self.mutate("update_task_status", actor, |tx, ctx| {
            let old: Option<String> = tx
                .query_row("SELECT status FROM tasks WHERE id = ?1", [id], |r| r.get(0))
                .optional()?;
            let Some(old) = old else {
                return Err(Error::TaskNotFound { id: id.to_string() });
            };

            set_task_status(tx, id, status, chrono::Utc::now().timestamp_millis())?;

            let event_type = if status == TaskStatus::Done {
                EventType::TaskCompleted
            } else {
                EventType::TaskUpdated
            };
            ctx.record_change("task", id, event_type, Some(old), Some(status.to_string()));

            let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
            tx.query_row(&sql, [id], map_task_row).map_err(Error::from)
        })
    }

    /// Delete a task.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` if the ID is unknown.
    pub fn delete_task(&mut self, id: &str, actor: &str) -> Result<()> {
        self.mutate("delete_task", actor, |tx, ctx| {
            let rows = tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
            if rows == 0 {
                return Err(Error::TaskNotFound { id: id.to_string() });
            }
            ctx.record_event("task", id, EventType::TaskDeleted);
            Ok(())
        })
    }
}

// ======================================
// Connection-level helpers (transactions)
// ======================================

/// Insert a task row. Usable inside a [`SqliteStorage::mutate`] closure.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "INSERT INTO tasks (id, project_id, recording_id, decision_id, title, status, priority, created_at, updated_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            task.id,
            task.project_id,
            task.recording_id,
            task.decision_id,
            task.title,
            task.status.as_str(),
            task.priority.as_str(),
            task.created_at,
            task.updated_at,
            task.completed_at
        ],
    )?;
    Ok(())
}

/// Set a task's status, maintaining `completed_at`.
///
/// Returns the number of rows changed (0 if the ID is unknown).
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_task_status(conn: &Connection, id: &str, status: TaskStatus, now: i64) -> Result<usize> {
    let completed_at = (status == TaskStatus::Done).then_some(now);
    conn.execute(
        "UPDATE tasks SET status = ?1, completed_at = ?2, updated_at = ?3 WHERE id = ?4",
        rusqlite::params![status.as_str(), completed_at, now, id],
    )
    .map_err(Error::from)
}

/// All tasks of a project, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn tasks_for_project(conn: &Connection, project_id: &str) -> Result<Vec<Task>> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE project_id = ?1
         ORDER BY created_at ASC, rowid ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([project_id], map_task_row)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

// ===========
// Row mapping
// ===========

const DECISION_COLUMNS: &str = "id, project_id, title, description, reason, consequences, \
     embedding, embedding_provider, embedding_model, embedding_dimensions, embedding_hash, embedded_at, \
     created_at, updated_at";

const TASK_COLUMNS: &str = "id, project_id, recording_id, decision_id, title, status, priority, \
     created_at, updated_at, completed_at";

fn map_project_row(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn map_decision_row(row: &rusqlite::Row) -> rusqlite::Result<Decision> {
    let blob: Option<Vec<u8>> = row.get(6)?;
    let provider: Option<String> = row.get(7)?;
    let model: Option<String> = row.get(8)?;

    let dimensions: Option<i64> = row.get(9)?;

    // Rows embedded before model metadata was tracked have a blob but no
    // model; they count as missing and get re-embedded on the next backfill.
    // So does a blob whose length disagrees with the recorded dimensions.
    let embedding = match (blob, provider, model) {
        (Some(blob), Some(provider), Some(model)) => {
            let vector = blob_to_embedding(&blob);
            if dimensions.and_then(|d| usize::try_from(d).ok()) == Some(vector.len()) {
                Some(DecisionEmbedding {
                    dimensions: vector.len(),
                    vector,
                    provider,
                    model,
                    content_hash: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
                    embedded_at: row.get::<_, Option<i64>>(11)?.unwrap_or_default(),
                })
            } else {
                let id: String = row.get(0)?;
                warn!(
                    decision = %id,
                    recorded = ?dimensions,
                    stored = vector.len(),
                    "Embedding does not match its recorded dimensions, ignoring it"
                );
                None
            }
        }
        _ => None,
    };

    Ok(Decision {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        reason: row.get(4)?,
        consequences: row.get(5)?,
        embedding,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn map_task_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let status: String = row.get(5)?;
    let priority: String = row.get(6)?;

    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        recording_id: row.get(2)?,
        decision_id: row.get(3)?,
        title: row.get(4)?,
        status: status.parse().unwrap_or(TaskStatus::Pending),
        priority: priority.parse().unwrap_or(TaskPriority::Medium),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        completed_at: row.get(9)?,
    })
}

fn map_recording_row(row: &rusqlite::Row) -> rusqlite::Result<Recording> {
    let kind: String = row.get(3)?;
    Ok(Recording {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        kind: kind.parse().unwrap_or(RecordingKind::Voice),
        transcript: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Encode an embedding as little-endian f32 bytes.
#[must_use]
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode little-endian f32 bytes. Trailing bytes that do not form a
/// whole f32 are ignored.
#[must_use]
pub fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect()
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_with_project() -> (SqliteStorage, Project) {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let project = Project::new("Backend".to_string(), None);
        storage.create_project(&project, "actor").unwrap();
        (storage, project)
    }

    fn embedding_for(decision: &Decision, vector: Vec<f32>) -> DecisionEmbedding {
        DecisionEmbedding {
            dimensions: vector.len(),
            vector,
            provider: "test".into(),
            model: "test-model".into(),
            content_hash: decision.content_hash(),
            embedded_at: 1,
        }
    }

    #[test]
    fn test_open_memory() {
        assert!(SqliteStorage::open_memory().is_ok());
    }

    #[test]
    fn test_project_crud_and_resolution() {
        let (mut storage, project) = storage_with_project();

        assert_eq!(storage.resolve_project(&project.id).unwrap().name, "Backend");
        assert_eq!(storage.resolve_project("backend").unwrap().id, project.id);

        let dup = Project::new("BACKEND".to_string(), None);
        let err = storage.create_project(&dup, "actor").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        match storage.resolve_project("Bakend") {
            Err(Error::ProjectNotFoundSimilar { similar, .. }) => {
                assert_eq!(similar, vec!["Backend".to_string()]);
            }
            other => panic!("expected similar suggestion, got {other:?}"),
        }
        assert!(matches!(
            storage.resolve_project("zzzzzzzzzz"),
            Err(Error::ProjectNotFound { .. })
        ));
    }

    #[test]
    fn test_decision_crud() {
        let (mut storage, project) = storage_with_project();
        let decision = Decision::new(&project.id, "Use SQLite", Some("embedded".into()), None, None);
        storage.create_decision(&decision, "actor").unwrap();

        let loaded = storage.get_decision(&decision.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Use SQLite");
        assert!(loaded.embedding.is_none());

        let updated = storage
            .update_decision(
                &decision.id,
                &DecisionUpdate {
                    reason: Some("No server"),
                    description: Some(""),
                    ..Default::default()
                },
                "actor",
            )
            .unwrap();
        assert_eq!(updated.reason.as_deref(), Some("No server"));
        assert!(updated.description.is_none(), "blank clears the field");
        assert_eq!(updated.title, "Use SQLite");

        storage.delete_decision(&decision.id, "actor").unwrap();
        assert!(storage.get_decision(&decision.id).unwrap().is_none());
        assert!(matches!(
            storage.delete_decision(&decision.id, "actor"),
            Err(Error::DecisionNotFound { .. })
        ));
    }

    #[test]
    fn test_store_and_load_embedding() {
        let (mut storage, project) = storage_with_project();
        let with = Decision::new(&project.id, "Embedded", None, None, None);
        let without = Decision::new(&project.id, "Plain", None, None, None);
        storage.create_decision(&with, "actor").unwrap();
        storage.create_decision(&without, "actor").unwrap();

        storage
            .store_decision_embedding(&with.id, &embedding_for(&with, vec![0.5, -1.25, 3.0]), "actor")
            .unwrap();

        let candidates = storage.get_decisions_with_embedding(&project.id).unwrap();
        assert_eq!(candidates.len(), 1);
        let emb = candidates[0].embedding.as_ref().unwrap();
        assert_eq!(emb.vector, vec![0.5, -1.25, 3.0]);
        assert_eq!(emb.dimensions, 3);
        assert_eq!(emb.model, "test-model");
        assert!(!candidates[0].is_stale(Some("test-model")));
    }

    #[test]
    fn test_embedding_disagreeing_with_recorded_dimensions_is_missing() {
        let (mut storage, project) = storage_with_project();
        let d = Decision::new(&project.id, "Truncated", None, None, None);
        storage.create_decision(&d, "actor").unwrap();
        storage
            .store_decision_embedding(&d.id, &embedding_for(&d, vec![1.0, 0.0, 0.0]), "actor")
            .unwrap();

        storage
            .conn()
            .execute("UPDATE decisions SET embedding_dimensions = 768 WHERE id = ?1", [&d.id])
            .unwrap();

        assert!(storage.get_decision(&d.id).unwrap().unwrap().embedding.is_none());
        assert!(storage.get_decisions_with_embedding(&project.id).unwrap()[0].embedding.is_none());
    }

    #[test]
    fn test_store_embedding_rejects_inconsistent_vector() {
        let (mut storage, project) = storage_with_project();
        let d = Decision::new(&project.id, "X", None, None, None);
        storage.create_decision(&d, "actor").unwrap();

        let mut emb = embedding_for(&d, vec![1.0, 2.0]);
        emb.dimensions = 3;
        assert!(matches!(
            storage.store_decision_embedding(&d.id, &emb, "actor"),
            Err(Error::Embedding(_))
        ));
        assert!(storage.get_decision(&d.id).unwrap().unwrap().embedding.is_none());
    }

    #[test]
    fn test_edit_after_embedding_is_stale() {
        let (mut storage, project) = storage_with_project();
        let d = Decision::new(&project.id, "Cache tokens", None, None, None);
        storage.create_decision(&d, "actor").unwrap();
        storage
            .store_decision_embedding(&d.id, &embedding_for(&d, vec![1.0, 0.0]), "actor")
            .unwrap();

        let edited = storage
            .update_decision(&d.id, &DecisionUpdate { title: Some("Cache sessions"), ..Default::default() }, "actor")
            .unwrap();
        assert!(edited.embedding.is_some(), "edits keep the cached vector");
        assert!(edited.is_stale(None));
    }

    #[test]
    fn test_search_decisions_text() {
        let (mut storage, project) = storage_with_project();
        let mut a = Decision::new(&project.id, "Adopt Redis", None, Some("fast cache".into()), None);
        a.updated_at = 100;
        let mut b = Decision::new(&project.id, "Drop memcached", Some("replaced by a CACHE layer".into()), None, None);
        b.updated_at = 200;
        let c = Decision::new(&project.id, "Use 100% Rust", None, None, None);
        for d in [&a, &b, &c] {
            storage.create_decision(d, "actor").unwrap();
        }

        let hits = storage.search_decisions_text(&project.id, "cache").unwrap();
        let titles: Vec<&str> = hits.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Drop memcached", "Adopt Redis"]);

        let hits = storage.search_decisions_text(&project.id, "100%").unwrap();
        assert_eq!(hits.len(), 1);
        let hits = storage.search_decisions_text(&project.id, "%").unwrap();
        assert_eq!(hits.len(), 1, "wildcards are matched literally");
    }

    #[test]
    fn test_task_crud() {
        let (mut storage, project) = storage_with_project();
        let task = Task::new(Some(&project.id), "Fix login bug", TaskStatus::Pending, TaskPriority::High);
        storage.create_task(&task, "actor").unwrap();

        let loaded = storage.get_task(&task.id).unwrap().unwrap();
        assert_eq!(loaded.priority, TaskPriority::High);
        assert!(loaded.completed_at.is_none());

        let done = storage.update_task_status(&task.id, TaskStatus::Done, "actor").unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        assert!(done.completed_at.is_some());

        assert_eq!(storage.list_tasks(&project.id, Some(TaskStatus::Done)).unwrap().len(), 1);
        assert!(storage.list_tasks(&project.id, Some(TaskStatus::Pending)).unwrap().is_empty());

        let reopened = storage.update_task_status(&task.id, TaskStatus::Pending, "actor").unwrap();
        assert!(reopened.completed_at.is_none());

        storage.delete_task(&task.id, "actor").unwrap();
        assert!(matches!(
            storage.update_task_status(&task.id, TaskStatus::Done, "actor"),
            Err(Error::TaskNotFound { .. })
        ));
    }

    #[test]
    fn test_recording_crud() {
        let (mut storage, project) = storage_with_project();
        let rec = Recording::new(&project.id, "Standup", RecordingKind::Voice, "we must fix login".into());
        storage.create_recording(&rec, "actor").unwrap();

        let loaded = storage.get_recording(&rec.id).unwrap().unwrap();
        assert_eq!(loaded.transcript, "we must fix login");
        assert_eq!(storage.list_recordings(&project.id).unwrap().len(), 1);

        storage.delete_recording(&rec.id, "actor").unwrap();
        assert!(storage.get_recording(&rec.id).unwrap().is_none());
    }

    #[test]
    fn test_mutate_rolls_back_on_error() {
        let (mut storage, project) = storage_with_project();
        let task = Task::new(Some(&project.id), "Inside tx", TaskStatus::Pending, TaskPriority::Low);

        let result: Result<()> = storage.mutate("failing", "actor", |tx, _ctx| {
            insert_task(tx, &task)?;
            Err(Error::Other("boom".into()))
        });
        assert!(result.is_err());
        assert!(storage.get_task(&task.id).unwrap().is_none());
    }

    #[test]
    fn test_mutations_write_audit_events() {
        let (storage, project) = storage_with_project();
        let events =
            crate::storage::events::get_events(storage.conn(), "project", &project.id, None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::ProjectCreated);
        assert_eq!(events[0].actor, "actor");
    }

    #[test]
    fn test_blob_encoding() {
        let v = vec![0.0_f32, 1.5, -2.25];
        let blob = embedding_to_blob(&v);
        assert_eq!(blob.len(), 12);
        assert_eq!(blob_to_embedding(&blob), v);
    }
}
