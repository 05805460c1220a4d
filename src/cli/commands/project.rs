//! Project management commands.
//!
//! - `pm project create <name>` - Create a project
//! - `pm project list` - List all projects
//! - `pm project show <id|name>` - Show a project with its counts

use super::{format_timestamp, open_storage, print_json, resolve_actor};
use crate::cli::ProjectCommands;
use crate::error::{Error, Result};
use crate::model::Project;
use crate::storage::SqliteStorage;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ProjectOutput {
    id: String,
    name: String,
    description: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<Project> for ProjectOutput {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            created_at: format_timestamp(p.created_at),
            updated_at: format_timestamp(p.updated_at),
        }
    }
}

#[derive(Serialize)]
struct ProjectListOutput {
    projects: Vec<ProjectOutput>,
    count: usize,
}

#[derive(Serialize)]
struct ProjectDetails {
    #[serde(flatten)]
    project: ProjectOutput,
    decision_count: usize,
    task_count: usize,
    open_task_count: usize,
    recording_count: usize,
}

/// Execute a project command.
pub fn execute(
    command: &ProjectCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut storage = open_storage(db_path)?;

    match command {
        ProjectCommands::Create { name, description } => {
            execute_create(&mut storage, name, description.as_deref(), &resolve_actor(actor), json)
        }
        ProjectCommands::List => execute_list(&storage, json),
        ProjectCommands::Show { id } => execute_show(&storage, id, json),
    }
}

fn execute_create(
    storage: &mut SqliteStorage,
    name: &str,
    description: Option<&str>,
    actor: &str,
    json: bool,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::RequiredField("name"));
    }

    let project = Project::new(
        name.to_string(),
        description.map(str::trim).filter(|d| !d.is_empty()).map(String::from),
    );
    storage.create_project(&project, actor)?;

    if json {
        print_json(&ProjectOutput::from(project))
    } else {
        println!("{} {}", "Created project:".green(), project.name.bold());
        println!("  ID: {}", project.id);
        Ok(())
    }
}

fn execute_list(storage: &SqliteStorage, json: bool) -> Result<()> {
    let projects = storage.list_projects()?;

    if json {
        return print_json(&ProjectListOutput {
            count: projects.len(),
            projects: projects.into_iter().map(ProjectOutput::from).collect(),
        });
    }

    if projects.is_empty() {
        println!("No projects found.");
        println!("\nCreate one with: pm project create <name>");
        return Ok(());
    }

    println!("Projects ({}):", projects.len());
    println!();
    for p in &projects {
        println!("  {} {}", p.name.bold(), format!("[{}]", p.id).dimmed());
        if let Some(desc) = &p.description {
            println!("    {desc}");
        }
    }
    Ok(())
}

fn execute_show(storage: &SqliteStorage, id: &str, json: bool) -> Result<()> {
    let project = storage.resolve_project(id)?;
    let decisions = storage.list_decisions(&project.id, None)?;
    let tasks = storage.list_tasks(&project.id, None)?;
    let recordings = storage.list_recordings(&project.id)?;

    let details = ProjectDetails {
        decision_count: decisions.len(),
        task_count: tasks.len(),
        open_task_count: tasks
            .iter()
            .filter(|t| t.status != crate::model::TaskStatus::Done)
            .count(),
        recording_count: recordings.len(),
        project: ProjectOutput::from(project),
    };

    if json {
        return print_json(&details);
    }

    let p = &details.project;
    println!("{}", p.name.bold());
    println!("  ID:          {}", p.id);
    if let Some(desc) = &p.description {
        println!("  Description: {desc}");
    }
    println!("  Created:     {}", p.created_at);
    println!("  Decisions:   {}", details.decision_count);
    println!(
        "  Tasks:       {} ({} open)",
        details.task_count, details.open_task_count
    );
    println!("  Recordings:  {}", details.recording_count);
    Ok(())
}
