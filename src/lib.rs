//! tasktrack - single-user task and project tracking
//!
//! Projects group tasks; tasks carry status, priority, an optional assignee
//! and due date, tags and subtasks. State lives in two JSON files inside a
//! data directory and is rewritten after every mutation.
//!
//! # Module Organization
//!
//! - `storage`: the [`storage::Store`], owner of all records and their files
//! - `manager`: session context (current user), queries and statistics
//! - `project`, `task`: record types and their partial updates
//! - `config`: per-environment configuration and TOML overrides
//! - `cli`: command-line interface using clap
//! - `output`: human and JSON rendering for the CLI
//! - `utils`: date, validation, text and list helpers
//! - `error`: error types and result aliases

pub mod cli;
pub mod config;
pub mod error;
pub mod manager;
pub mod output;
pub mod project;
pub mod storage;
pub mod task;
pub mod utils;

pub use error::{Error, Result};
pub use manager::Manager;
pub use storage::Store;
