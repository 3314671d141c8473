// ABOUTME: Error taxonomy for deployment workflows.
// ABOUTME: Every variant aborts the current workflow; tolerated failures never become errors.

/// Errors that stop a deploy, rollback, or clean deploy.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Bad argument combination, rejected before any remote command.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Required configuration or remote path is missing.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A remote command exited non-zero outside a failure-tolerant step.
    #[error("remote command failed with exit code {exit_code}: {command}{}", render_output(.stdout, .stderr))]
    RemoteCommandFailed {
        command: String,
        exit_code: u32,
        stdout: String,
        stderr: String,
    },

    /// Operator declined a confirmation prompt.
    #[error("aborted: {0}")]
    UserAbort(String),

    /// Unknown VCS or webserver identifier.
    #[error("unsupported {kind}: {name}")]
    UnsupportedBackend { kind: &'static str, name: String },

    /// Requested archive does not exist.
    #[error(
        "cannot roll back to version {0}: it does not exist (run `list` to see available versions)"
    )]
    VersionNotFound(String),

    /// Path that is deliberately left unimplemented.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Transport failed before the command produced an exit status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Reading operator input failed.
    #[error("prompt failed: {0}")]
    Prompt(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Validation,
    Precondition,
    RemoteCommandFailed,
    UserAbort,
    UnsupportedBackend,
    VersionNotFound,
    NotSupported,
    Transport,
    Prompt,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Validation(_) => DeployErrorKind::Validation,
            DeployError::Precondition(_) => DeployErrorKind::Precondition,
            DeployError::RemoteCommandFailed { .. } => DeployErrorKind::RemoteCommandFailed,
            DeployError::UserAbort(_) => DeployErrorKind::UserAbort,
            DeployError::UnsupportedBackend { .. } => DeployErrorKind::UnsupportedBackend,
            DeployError::VersionNotFound(_) => DeployErrorKind::VersionNotFound,
            DeployError::NotSupported(_) => DeployErrorKind::NotSupported,
            DeployError::Transport(_) => DeployErrorKind::Transport,
            DeployError::Prompt(_) => DeployErrorKind::Prompt,
        }
    }

    pub fn unsupported_vcs(name: impl Into<String>) -> Self {
        DeployError::UnsupportedBackend {
            kind: "VCS",
            name: name.into(),
        }
    }

    pub fn unsupported_webserver(name: impl Into<String>) -> Self {
        DeployError::UnsupportedBackend {
            kind: "webserver",
            name: name.into(),
        }
    }
}

fn render_output(stdout: &str, stderr: &str) -> String {
    let detail = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };
    if detail.is_empty() {
        String::new()
    } else {
        format!("\n{detail}")
    }
}
