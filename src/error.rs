// ABOUTME: Application-wide error types for stagehand.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::DeployError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown environment: {name} (configured: {known})")]
    UnknownEnvironment { name: String, known: String },

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("SSH error: {0}")]
    Ssh(#[from] crate::ssh::Error),

    #[error(transparent)]
    Connect(#[from] crate::remote::ConnectError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
