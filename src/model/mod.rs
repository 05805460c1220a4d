//! Data models for projmem.
//!
//! This module contains all domain models:
//! - Project
//! - Decision (with its cached embedding)
//! - Task
//! - Recording

pub mod decision;
pub mod project;
pub mod recording;
pub mod task;

pub use decision::{Decision, DecisionEmbedding};
pub use project::Project;
pub use recording::{Recording, RecordingKind};
pub use task::{Task, TaskPriority, TaskStatus};
