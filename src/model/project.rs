//! Project model.
//!
//! Projects own decisions, tasks and recordings.

use serde::{Deserialize, Serialize};

/// A project in projmem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier (`proj_` + 12 hex chars)
    pub id: String,

    /// Display name, unique across projects
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Project {
    /// Create a new project with a fresh ID.
    pub fn new(name: String, description: Option<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let id = format!("proj_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);

        Self {
            id,
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project() {
        let project = Project::new("My Project".to_string(), None);

        assert!(project.id.starts_with("proj_"));
        assert_eq!(project.id.len(), 17);
        assert_eq!(project.name, "My Project");
        assert_eq!(project.created_at, project.updated_at);
    }
}
