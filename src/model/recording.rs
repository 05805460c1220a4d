//! Recording model: a transcribed voice note or OCR'd image.

use serde::{Deserialize, Serialize};

/// Where the transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordingKind {
    /// Speech-to-text transcript of a voice recording
    #[default]
    Voice,
    /// Text extracted from an image
    Ocr,
}

impl RecordingKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Ocr => "ocr",
        }
    }
}

impl std::fmt::Display for RecordingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordingKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "voice" => Ok(Self::Voice),
            "ocr" => Ok(Self::Ocr),
            _ => Err(format!("Unknown recording kind: {s}")),
        }
    }
}

/// A transcribed capture belonging to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub kind: RecordingKind,
    pub transcript: String,
    pub created_at: i64,
}

impl Recording {
    pub fn new(project_id: &str, title: &str, kind: RecordingKind, transcript: String) -> Self {
        Self {
            id: format!("rec_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            project_id: project_id.to_string(),
            title: title.to_string(),
            kind,
            transcript,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
