//! Task reconciliation: merging imported task lists into a project.
//!
//! - [`normalize`] - title normalization used as task identity
//! - [`entry`] - parsing loosely shaped import entries
//! - [`reconciler`] - the merge / create-new import itself
//! - [`extract`] - turning a recording transcript into entries

pub mod entry;
pub mod extract;
pub mod normalize;
pub mod reconciler;

pub use entry::{parse_entries, TaskEntry};
pub use extract::{build_extraction_prompt, extract_tasks, parse_task_array};
pub use normalize::normalize_title;
pub use reconciler::{reconcile, ImportMode, ReconcileStats, TaskLink};
