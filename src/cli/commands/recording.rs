//! Recording commands: store and browse transcripts.

use super::{format_timestamp, open_storage, print_json, read_input, resolve_actor, truncate};
use crate::cli::{RecordingAddArgs, RecordingCommands};
use crate::error::{Error, Result};
use crate::model::Recording;
use crate::storage::SqliteStorage;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct RecordingListOutput<'a> {
    project_id: &'a str,
    recordings: &'a [Recording],
    count: usize,
}

#[derive(Serialize)]
struct RecordingDetails<'a> {
    #[serde(flatten)]
    recording: &'a Recording,
    task_ids: Vec<String>,
}

/// Execute a recording command.
pub fn execute(
    command: &RecordingCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut storage = open_storage(db_path)?;

    match command {
        RecordingCommands::Add(args) => execute_add(&mut storage, args, &resolve_actor(actor), json),
        RecordingCommands::List { project } => execute_list(&storage, project, json),
        RecordingCommands::Show { id } => execute_show(&storage, id, json),
        RecordingCommands::Delete { id } => {
            storage.delete_recording(id, &resolve_actor(actor))?;
            if json {
                print_json(&serde_json::json!({ "id": id, "deleted": true }))
            } else {
                println!("Deleted recording {id}");
                Ok(())
            }
        }
    }
}

fn execute_add(storage: &mut SqliteStorage, args: &RecordingAddArgs, actor: &str, json: bool) -> Result<()> {
    let title = args.title.trim();
    if title.is_empty() {
        return Err(Error::RequiredField("title"));
    }

    let transcript = match (&args.transcript, &args.transcript_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => read_input(path)?,
        (None, None) => return Err(Error::RequiredField("transcript")),
    };
    if transcript.trim().is_empty() {
        return Err(Error::RequiredField("transcript"));
    }

    let project = storage.resolve_project(&args.project)?;
    let recording = Recording::new(&project.id, title, args.kind, transcript);
    storage.create_recording(&recording, actor)?;

    if json {
        return print_json(&recording);
    }
    println!("{} {}", "Stored recording:".green(), recording.title.bold());
    println!("  ID: {}  [{}]", recording.id, recording.kind.as_str());
    println!();
    println!("Extract tasks with: pm task extract --recording {}", recording.id);
    Ok(())
}

fn execute_list(storage: &SqliteStorage, project: &str, json: bool) -> Result<()> {
    let project = storage.resolve_project(project)?;
    let recordings = storage.list_recordings(&project.id)?;

    if json {
        return print_json(&RecordingListOutput {
            project_id: &project.id,
            recordings: &recordings,
            count: recordings.len(),
        });
    }

    if recordings.is_empty() {
        println!("No recordings in {}.", project.name);
        return Ok(());
    }

    println!("Recordings in {} ({}):", project.name.bold(), recordings.len());
    println!();
    for r in &recordings {
        println!(
            "  {} {} {} {}",
            format_timestamp(r.created_at).dimmed(),
            r.title,
            format!("[{}]", r.kind.as_str()).dimmed(),
            r.id.dimmed()
        );
        println!("    {}", truncate(r.transcript.trim(), 80));
    }
    Ok(())
}

fn execute_show(storage: &SqliteStorage, id: &str, json: bool) -> Result<()> {
    let recording = storage
        .get_recording(id)?
        .ok_or_else(|| Error::RecordingNotFound { id: id.to_string() })?;
    let task_ids: Vec<String> = storage
        .list_tasks(&recording.project_id, None)?
        .into_iter()
        .filter(|t| t.recording_id.as_deref() == Some(recording.id.as_str()))
        .map(|t| t.id)
        .collect();

    if json {
        return print_json(&RecordingDetails {
            recording: &recording,
            task_ids,
        });
    }

    println!("{}", recording.title.bold());
    println!("  ID:      {}", recording.id);
    println!("  Kind:    {}", recording.kind.as_str());
    println!("  Created: {}", format_timestamp(recording.created_at));
    println!("  Tasks:   {}", task_ids.len());
    println!();
    println!("{}", recording.transcript.trim());
    Ok(())
}
