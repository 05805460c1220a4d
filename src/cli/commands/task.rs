//! Task commands.
//!
//! - `pm task add <title> -p <project>` - Add a single task
//! - `pm task list -p <project>` - List tasks
//! - `pm task update <id> --status <s>` - Change status
//! - `pm task delete <id>` - Delete a task
//! - `pm task import -p <project> --file <path|->` - Reconcile a JSON task list
//! - `pm task extract --recording <id>` - Extract tasks from a transcript and reconcile them

use super::{format_timestamp, open_storage, print_json, read_input, resolve_actor, runtime, text_generator};
use crate::cli::{TaskAddArgs, TaskCommands, TaskExtractArgs, TaskImportArgs};
use crate::config::load_config;
use crate::error::{Error, Result};
use crate::model::{Task, TaskPriority, TaskStatus};
use crate::reconcile::{extract_tasks, parse_entries, reconcile, ReconcileStats, TaskLink};
use crate::storage::SqliteStorage;
use crate::validate::{normalize_priority, normalize_status, rejection_error};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct TaskListOutput<'a> {
    project_id: &'a str,
    tasks: &'a [Task],
    count: usize,
}

#[derive(Serialize)]
struct ExtractOutput<'a> {
    recording_id: &'a str,
    extracted: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<ReconcileStats>,
}

/// Execute a task command.
pub fn execute(
    command: &TaskCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut storage = open_storage(db_path)?;
    let actor = resolve_actor(actor);

    match command {
        TaskCommands::Add(args) => execute_add(&mut storage, args, &actor, json),
        TaskCommands::List { project, status } => execute_list(&storage, project, status.as_deref(), json),
        TaskCommands::Update { id, status } => execute_update(&mut storage, id, status, &actor, json),
        TaskCommands::Delete { id } => execute_delete(&mut storage, id, &actor, json),
        TaskCommands::Import(args) => execute_import(&mut storage, args, &actor, json),
        TaskCommands::Extract(args) => execute_extract(&mut storage, args, &actor, json),
    }
}

/// Parse a status flag. Unlike import entries, an unknown value is an error here.
fn parse_status(raw: &str) -> Result<TaskStatus> {
    normalize_status(raw).map_err(|rejected| rejection_error("status", rejected))
}

fn parse_priority(raw: &str) -> Result<TaskPriority> {
    normalize_priority(raw).map_err(|rejected| rejection_error("priority", rejected))
}

fn execute_add(storage: &mut SqliteStorage, args: &TaskAddArgs, actor: &str, json: bool) -> Result<()> {
    let title = args.title.trim();
    if title.is_empty() {
        return Err(Error::RequiredField("title"));
    }
    let project = storage.resolve_project(&args.project)?;
    let status = args.status.as_deref().map(parse_status).transpose()?.unwrap_or_default();
    let priority = args.priority.as_deref().map(parse_priority).transpose()?.unwrap_or_default();

    let link = TaskLink {
        recording_id: args.recording.clone(),
        decision_id: args.decision.clone(),
    };
    link.validate(storage, &project.id)?;

    let mut task = Task::new(Some(&project.id), title, status, priority);
    task.recording_id = link.recording_id;
    task.decision_id = link.decision_id;
    storage.create_task(&task, actor)?;

    if json {
        return print_json(&task);
    }
    println!("{} {}", "Added task:".green(), task.title.bold());
    println!("  ID: {}  [{} / {}]", task.id, task.status, task.priority);
    Ok(())
}

fn execute_list(storage: &SqliteStorage, project: &str, status: Option<&str>, json: bool) -> Result<()> {
    let project = storage.resolve_project(project)?;
    let status = status.map(parse_status).transpose()?;
    let tasks = storage.list_tasks(&project.id, status)?;

    if json {
        return print_json(&TaskListOutput {
            project_id: &project.id,
            tasks: &tasks,
            count: tasks.len(),
        });
    }

    if tasks.is_empty() {
        println!("No tasks in {}.", project.name);
        return Ok(());
    }

    println!("Tasks in {} ({}):", project.name.bold(), tasks.len());
    println!();
    for t in &tasks {
        let marker = match t.status {
            TaskStatus::Done => "✓".green(),
            TaskStatus::InProgress => "●".yellow(),
            TaskStatus::Pending => "○".normal(),
        };
        println!(
            "  {marker} {} {} {}",
            t.title,
            format!("[{}]", t.priority).dimmed(),
            t.id.dimmed()
        );
    }
    Ok(())
}

fn execute_update(storage: &mut SqliteStorage, id: &str, status: &str, actor: &str, json: bool) -> Result<()> {
    let status = parse_status(status)?;
    let task = storage.update_task_status(id, status, actor)?;

    if json {
        return print_json(&task);
    }
    println!("{} {} → {}", "Updated task:".green(), task.title.bold(), task.status);
    if let Some(completed) = task.completed_at {
        println!("  Completed: {}", format_timestamp(completed));
    }
    Ok(())
}

fn execute_delete(storage: &mut SqliteStorage, id: &str, actor: &str, json: bool) -> Result<()> {
    storage.delete_task(id, actor)?;
    if json {
        print_json(&serde_json::json!({ "id": id, "deleted": true }))
    } else {
        println!("Deleted task {id}");
        Ok(())
    }
}

fn execute_import(storage: &mut SqliteStorage, args: &TaskImportArgs, actor: &str, json: bool) -> Result<()> {
    let raw = read_input(&args.file)?;
    let entries: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| Error::InvalidArgument(format!("task file is not valid JSON: {e}")))?;

    let link = TaskLink {
        recording_id: args.recording.clone(),
        decision_id: args.decision.clone(),
    };
    let stats = reconcile(storage, &args.project, &entries, args.mode, &link, actor)?;

    if json {
        return print_json(&stats);
    }
    print_stats(&stats);
    Ok(())
}

fn execute_extract(storage: &mut SqliteStorage, args: &TaskExtractArgs, actor: &str, json: bool) -> Result<()> {
    let recording = storage
        .get_recording(&args.recording)?
        .ok_or_else(|| Error::RecordingNotFound { id: args.recording.clone() })?;
    let config = load_config()?;

    let extracted = runtime()?.block_on(async {
        let generator = text_generator(&config)
            .await
            .ok_or(Error::ProviderNotConfigured("text generation"))?;
        extract_tasks(&generator, &recording).await
    })?;

    let stats = if args.dry_run {
        None
    } else {
        let link = TaskLink {
            recording_id: Some(recording.id.clone()),
            decision_id: None,
        };
        Some(reconcile(storage, &recording.project_id, &extracted, args.mode, &link, actor)?)
    };

    if json {
        return print_json(&ExtractOutput {
            recording_id: &recording.id,
            extracted,
            stats,
        });
    }

    match stats {
        Some(stats) => print_stats(&stats),
        None => {
            let entries = parse_entries(&extracted)?;
            println!("Extracted {} task(s) from {} (not imported):", entries.len(), recording.title.bold());
            for entry in &entries {
                println!("  - {} {}", entry.title, format!("[{} / {}]", entry.status, entry.priority).dimmed());
            }
        }
    }
    Ok(())
}

fn print_stats(stats: &ReconcileStats) {
    println!(
        "Imported {} task(s) ({}): {} created, {} updated, {} skipped",
        stats.total,
        stats.mode,
        stats.created.to_string().green(),
        stats.updated.to_string().yellow(),
        stats.skipped.to_string().dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Project, Recording, RecordingKind};

    #[test]
    fn test_status_flag_accepts_synonyms_and_rejects_unknown() {
        assert_eq!(parse_status("wip").unwrap(), TaskStatus::InProgress);
        assert_eq!(parse_status("DONE").unwrap(), TaskStatus::Done);
        assert!(matches!(parse_status("someday"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_add_rejects_recording_from_another_project() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let backend = Project::new("Backend".into(), None);
        let frontend = Project::new("Frontend".into(), None);
        storage.create_project(&backend, "t").unwrap();
        storage.create_project(&frontend, "t").unwrap();
        let rec = Recording::new(&frontend.id, "Standup", RecordingKind::Voice, "x".into());
        storage.create_recording(&rec, "t").unwrap();

        let args = TaskAddArgs {
            title: "Rotate keys".into(),
            project: "Backend".into(),
            status: None,
            priority: None,
            recording: Some(rec.id.clone()),
            decision: None,
        };
        assert!(matches!(
            execute_add(&mut storage, &args, "t", true),
            Err(Error::InvalidArgument(_))
        ));
        assert!(storage.list_tasks(&backend.id, None).unwrap().is_empty());

        let args = TaskAddArgs { project: "Frontend".into(), ..args };
        execute_add(&mut storage, &args, "t", true).unwrap();
        let tasks = storage.list_tasks(&frontend.id, None).unwrap();
        assert_eq!(tasks[0].recording_id.as_deref(), Some(rec.id.as_str()));
    }

    #[test]
    fn test_priority_flag() {
        assert_eq!(parse_priority("urgent").unwrap(), TaskPriority::High);
        assert!(parse_priority("whenever").is_err());
    }
}
