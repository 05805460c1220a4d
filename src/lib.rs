//! projmem CLI - project memory for decisions, tasks and transcribed captures
//!
//! This crate provides the core functionality for the `pm` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (Project, Decision, Task, Recording)
//! - [`storage`] - SQLite database layer
//! - [`search`] - Embedding search ranker and decision embedding
//! - [`reconcile`] - Merge-on-import of task lists
//! - [`embeddings`] - Embedding providers (Ollama, HuggingFace)
//! - [`generation`] - Text generators (Ollama, OpenAI-compatible)
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod model;
pub mod reconcile;
pub mod search;
pub mod storage;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
