//! Error types for the projmem CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=invalid_input, 9=service_unavailable)
//! - Retryability flags
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for projmem operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Category ────────────────────────────────────────────

/// Coarse error taxonomy shared by the ranker and the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The caller's fault: missing field, wrong shape, bad value.
    InvalidInput,
    /// A referenced project, decision, task or recording is absent.
    NotFound,
    /// The embedding or generation provider is not configured or failed.
    ServiceUnavailable,
    /// Storage, configuration, I/O and everything else.
    Internal,
}

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    ProjectNotFound,
    DecisionNotFound,
    TaskNotFound,
    RecordingNotFound,

    // Invalid input (exit 4)
    InvalidArgument,
    RequiredField,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Service unavailable (exit 9)
    EmbeddingError,
    GenerationError,
    ProviderNotConfigured,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::DecisionNotFound => "DECISION_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::RecordingNotFound => "RECORDING_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::EmbeddingError => "EMBEDDING_ERROR",
            Self::GenerationError => "GENERATION_ERROR",
            Self::ProviderNotConfigured => "PROVIDER_NOT_CONFIGURED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category this code belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument | Self::RequiredField => ErrorCategory::InvalidInput,
            Self::ProjectNotFound
            | Self::DecisionNotFound
            | Self::TaskNotFound
            | Self::RecordingNotFound => ErrorCategory::NotFound,
            Self::EmbeddingError | Self::GenerationError | Self::ProviderNotConfigured => {
                ErrorCategory::ServiceUnavailable
            }
            Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::DatabaseError
            | Self::ConfigError
            | Self::IoError
            | Self::JsonError
            | Self::InternalError => ErrorCategory::Internal,
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::ProjectNotFound
            | Self::DecisionNotFound
            | Self::TaskNotFound
            | Self::RecordingNotFound => 3,
            Self::InvalidArgument | Self::RequiredField => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::EmbeddingError | Self::GenerationError | Self::ProviderNotConfigured => 9,
        }
    }

    /// Whether a caller should retry with corrected input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument | Self::RequiredField | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in projmem operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `pm init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    #[error("Project not found: {id} (did you mean: {}?)", similar.join(", "))]
    ProjectNotFoundSimilar { id: String, similar: Vec<String> },

    #[error("Decision not found: {id}")]
    DecisionNotFound { id: String },

    #[error("Task not found: {id}")]
    TaskNotFound { id: String },

    #[error("Recording not found: {id}")]
    RecordingNotFound { id: String },

    #[error("Missing required field: {0}")]
    RequiredField(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("No {0} provider configured")]
    ProviderNotConfigured(&'static str),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::ProjectNotFound { .. } | Self::ProjectNotFoundSimilar { .. } => {
                ErrorCode::ProjectNotFound
            }
            Self::DecisionNotFound { .. } => ErrorCode::DecisionNotFound,
            Self::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            Self::RecordingNotFound { .. } => ErrorCode::RecordingNotFound,
            Self::RequiredField(_) => ErrorCode::RequiredField,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Embedding(_) => ErrorCode::EmbeddingError,
            Self::Generation(_) => ErrorCode::GenerationError,
            Self::ProviderNotConfigured(_) => ErrorCode::ProviderNotConfigured,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Coarse category (invalid input / not found / service unavailable).
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.error_code().category()
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `pm init` to initialize the database".to_string()),

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::ProjectNotFound { id } => Some(format!(
                "No project with ID or name '{id}'. Use `pm project list` to see available projects."
            )),
            Self::ProjectNotFoundSimilar { similar, .. } => {
                Some(format!("Did you mean: {}?", similar.join(", ")))
            }

            Self::DecisionNotFound { id } => Some(format!(
                "No decision with ID '{id}'. Use `pm decision list -p <project>` to list decisions."
            )),
            Self::TaskNotFound { id } => Some(format!(
                "No task with ID '{id}'. Use `pm task list -p <project>` to list tasks."
            )),
            Self::RecordingNotFound { id } => Some(format!(
                "No recording with ID '{id}'. Use `pm recording list -p <project>` to list recordings."
            )),

            Self::InvalidArgument(msg) => {
                if msg.contains("status") {
                    Some(
                        "Valid statuses: pending, in_progress, done. \
                         Synonyms: todo→pending, wip→in_progress, completed→done"
                            .to_string(),
                    )
                } else if msg.contains("priority") {
                    Some("Valid priorities: low, medium, high".to_string())
                } else if msg.contains("mode") {
                    Some("Valid import modes: merge, create_new".to_string())
                } else {
                    None
                }
            }

            Self::ProviderNotConfigured(kind) => Some(format!(
                "Configure a {kind} provider in ~/.projmem/config.json or via environment \
                 (see `pm embeddings status`)."
            )),

            Self::Embedding(_) | Self::Generation(_) => Some(
                "The AI provider call failed. Check that the provider is running and reachable."
                    .to_string(),
            ),

            Self::RequiredField(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "category": code.category(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::RequiredField("query").category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(
            Error::ProjectNotFound { id: "x".into() }.category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            Error::Embedding("down".into()).category(),
            ErrorCategory::ServiceUnavailable
        );
        assert_eq!(
            Error::ProviderNotConfigured("embedding").category(),
            ErrorCategory::ServiceUnavailable
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::NotInitialized.exit_code(), 2);
        assert_eq!(Error::TaskNotFound { id: "t".into() }.exit_code(), 3);
        assert_eq!(Error::InvalidArgument("bad".into()).exit_code(), 4);
        assert_eq!(Error::Generation("oops".into()).exit_code(), 9);
    }

    #[test]
    fn test_structured_json() {
        let err = Error::InvalidArgument("unknown status 'x'".into());
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "INVALID_ARGUMENT");
        assert_eq!(json["error"]["category"], "invalid_input");
        assert_eq!(json["error"]["retryable"], true);
        assert!(json["error"]["hint"].as_str().unwrap().contains("pending"));
    }
}
