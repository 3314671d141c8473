// ABOUTME: SSH transport for remote deployment commands.
// ABOUTME: Supports SSH agent and key-based authentication with known_hosts verification.

mod client;
mod error;

pub use client::{Session, SessionConfig};
pub use error::{Error, Result};
