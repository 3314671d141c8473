// ABOUTME: SSH transport error types.
// ABOUTME: Separates reachability, credential, and channel failures.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot reach {host}:{port}: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("authentication failed: no valid credentials")]
    AuthenticationFailed,

    #[error("SSH agent not available: {0}")]
    AgentUnavailable(String),

    #[error("failed to load key from {path}: {reason}")]
    KeyLoadFailed { path: PathBuf, reason: String },

    #[error("channel error: {0}")]
    Channel(String),

    #[error("remote command timed out after {0:?}")]
    CommandTimeout(Duration),

    #[error("channel closed before the command reported an exit status")]
    ChannelClosed,

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
