//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::model::RecordingKind;
use crate::reconcile::ImportMode;
use crate::search::EmbedMode;

pub mod commands;

/// projmem - project memory for decisions, tasks and transcribed captures
#[derive(Parser, Debug)]
#[command(name = "pm", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.projmem/data/projmem.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Actor name for audit trail
    #[arg(long, global = true, env = "PM_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the projmem database
    Init {
        /// Recreate the database if it exists
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Project management
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Technical decisions
    Decision {
        #[command(subcommand)]
        command: DecisionCommands,
    },

    /// Search a project's decisions
    Search(SearchArgs),

    /// Tasks, including bulk import and extraction from recordings
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Transcribed voice notes and OCR captures
    Recording {
        #[command(subcommand)]
        command: RecordingCommands,
    },

    /// Embedding provider status and diagnostics
    Embeddings {
        #[command(subcommand)]
        command: EmbeddingsCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Project Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    Create {
        /// Project name (unique, case-insensitive)
        name: String,

        /// Project description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List all projects
    List,

    /// Show project details
    Show {
        /// Project ID or name
        id: String,
    },
}

// ============================================================================
// Decision Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum DecisionCommands {
    /// Record a decision (embedded immediately when a provider is available)
    Add(DecisionAddArgs),

    /// List decisions of a project, oldest first
    List {
        /// Project ID or name
        #[arg(short, long)]
        project: String,

        /// Maximum decisions to return
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a decision
    Show {
        /// Decision ID
        id: String,
    },

    /// Edit a decision (its embedding becomes stale until re-embedded)
    Update(DecisionUpdateArgs),

    /// Delete a decision
    Delete {
        /// Decision ID
        id: String,
    },

    /// Compute embeddings for one decision or backfill many
    Embed(DecisionEmbedArgs),
}

#[derive(Args, Debug)]
pub struct DecisionAddArgs {
    /// Decision title
    pub title: String,

    /// Project ID or name
    #[arg(short, long)]
    pub project: String,

    /// What was decided
    #[arg(short, long)]
    pub description: Option<String>,

    /// Why it was decided
    #[arg(short, long)]
    pub reason: Option<String>,

    /// Expected consequences
    #[arg(short, long)]
    pub consequences: Option<String>,

    /// Do not embed the new decision
    #[arg(long)]
    pub no_embed: bool,
}

#[derive(Args, Debug)]
pub struct DecisionUpdateArgs {
    /// Decision ID
    pub id: String,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New description (empty string clears it)
    #[arg(short, long)]
    pub description: Option<String>,

    /// New reason (empty string clears it)
    #[arg(short, long)]
    pub reason: Option<String>,

    /// New consequences (empty string clears it)
    #[arg(short, long)]
    pub consequences: Option<String>,
}

#[derive(Args, Debug)]
pub struct DecisionEmbedArgs {
    /// Embed a single decision
    #[arg(long, conflicts_with_all = ["project", "mode", "limit"])]
    pub id: Option<String>,

    /// Restrict the backfill to one project (ID or name)
    #[arg(short, long)]
    pub project: Option<String>,

    /// Which decisions to embed
    #[arg(short, long, value_enum)]
    pub mode: Option<EmbedMode>,

    /// Maximum decisions to embed
    #[arg(short, long)]
    pub limit: Option<usize>,
}

// ============================================================================
// Search
// ============================================================================

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// What to look for
    pub query: String,

    /// Project ID or name
    #[arg(short, long)]
    pub project: String,

    /// Maximum results (default from config, else 5)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Minimum similarity, exclusive (default from config, else 0.3)
    #[arg(short, long, allow_negative_numbers = true)]
    pub threshold: Option<f32>,

    /// Skip answer generation
    #[arg(long)]
    pub no_answer: bool,
}

// ============================================================================
// Task Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Add a task
    Add(TaskAddArgs),

    /// List tasks of a project
    List {
        /// Project ID or name
        #[arg(short, long)]
        project: String,

        /// Filter by status (pending, in_progress, done)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Change a task's status
    Update {
        /// Task ID
        id: String,

        /// New status (pending, in_progress, done)
        #[arg(short, long)]
        status: String,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },

    /// Import a JSON array of tasks, merging by title
    Import(TaskImportArgs),

    /// Extract tasks from a recording transcript and import them
    Extract(TaskExtractArgs),
}

#[derive(Args, Debug)]
pub struct TaskAddArgs {
    /// Task title
    pub title: String,

    /// Project ID or name
    #[arg(short, long)]
    pub project: String,

    /// Status (pending, in_progress, done; synonyms accepted)
    #[arg(short, long)]
    pub status: Option<String>,

    /// Priority (low, medium, high; synonyms accepted)
    #[arg(long)]
    pub priority: Option<String>,

    /// Link to a recording
    #[arg(long)]
    pub recording: Option<String>,

    /// Link to a decision
    #[arg(long)]
    pub decision: Option<String>,
}

#[derive(Args, Debug)]
pub struct TaskImportArgs {
    /// Project ID or name
    #[arg(short, long)]
    pub project: String,

    /// JSON file with the entries, or `-` for stdin
    #[arg(short, long)]
    pub file: PathBuf,

    /// How entries are applied
    #[arg(short, long, value_enum, default_value_t)]
    pub mode: ImportMode,

    /// Link created tasks to a recording
    #[arg(long)]
    pub recording: Option<String>,

    /// Link created tasks to a decision
    #[arg(long)]
    pub decision: Option<String>,
}

#[derive(Args, Debug)]
pub struct TaskExtractArgs {
    /// Recording ID
    #[arg(short, long)]
    pub recording: String,

    /// How extracted entries are applied
    #[arg(short, long, value_enum, default_value_t)]
    pub mode: ImportMode,

    /// Print the extracted entries without importing them
    #[arg(long)]
    pub dry_run: bool,
}

// ============================================================================
// Recording Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum RecordingCommands {
    /// Store a transcript
    Add(RecordingAddArgs),

    /// List recordings of a project, newest first
    List {
        /// Project ID or name
        #[arg(short, long)]
        project: String,
    },

    /// Show a recording with its transcript
    Show {
        /// Recording ID
        id: String,
    },

    /// Delete a recording (linked tasks are kept and unlinked)
    Delete {
        /// Recording ID
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct RecordingAddArgs {
    /// Recording title
    pub title: String,

    /// Project ID or name
    #[arg(short, long)]
    pub project: String,

    /// Where the transcript came from
    #[arg(short, long, value_enum, default_value_t)]
    pub kind: RecordingKind,

    /// Transcript text
    #[arg(long, conflicts_with = "transcript_file", required_unless_present = "transcript_file")]
    pub transcript: Option<String>,

    /// Read the transcript from a file (`-` for stdin)
    #[arg(long)]
    pub transcript_file: Option<PathBuf>,
}

// ============================================================================
// Embeddings Commands
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum EmbeddingsCommands {
    /// Show provider configuration and embedding coverage
    Status {
        /// Restrict coverage to one project (ID or name)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Edit the embeddings section of ~/.projmem/config.json
    Configure {
        /// Provider (ollama, huggingface)
        #[arg(short, long)]
        provider: Option<String>,

        /// Enable embeddings
        #[arg(long)]
        enable: bool,

        /// Disable embeddings (search falls back to text matching)
        #[arg(long)]
        disable: bool,

        /// Model for the provider
        #[arg(short, long)]
        model: Option<String>,

        /// Endpoint for the provider
        #[arg(long)]
        endpoint: Option<String>,

        /// HuggingFace API token
        #[arg(long)]
        token: Option<String>,
    },

    /// Embed a text with the active provider
    Test {
        /// Text to embed
        #[arg(default_value = "Hello world")]
        text: String,
    },
}
