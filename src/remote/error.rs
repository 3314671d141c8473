// ABOUTME: Host connection error types with SNAFU pattern.
// ABOUTME: Unifies SSH session and privilege probe failures for programmatic handling.

use snafu::Snafu;

use crate::deploy::DeployError;

/// Failure to get a usable handle on a deployment host.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConnectError {
    #[snafu(display("could not connect to {host}: {source}"))]
    Session {
        host: String,
        source: crate::ssh::Error,
    },

    #[snafu(display("{host} is not usable for deployment: {source}"))]
    Probe { host: String, source: DeployError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectErrorKind {
    /// Network-level failure reaching the host.
    Unreachable,
    /// Host reached, credentials rejected.
    AuthenticationFailed,
    /// Connected, but a readiness check failed.
    ProbeFailed,
}

impl ConnectError {
    pub fn kind(&self) -> ConnectErrorKind {
        match self {
            ConnectError::Session { source, .. } => match source {
                crate::ssh::Error::AuthenticationFailed
                | crate::ssh::Error::AgentUnavailable(_)
                | crate::ssh::Error::KeyLoadFailed { .. } => {
                    ConnectErrorKind::AuthenticationFailed
                }
                _ => ConnectErrorKind::Unreachable,
            },
            ConnectError::Probe { .. } => ConnectErrorKind::ProbeFailed,
        }
    }
}
