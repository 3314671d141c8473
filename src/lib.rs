// ABOUTME: Library root for stagehand - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod prompt;
pub mod release;
pub mod remote;
pub mod retention;
pub mod serving;
pub mod ssh;
pub mod tasks;
pub mod types;
pub mod vcs;
