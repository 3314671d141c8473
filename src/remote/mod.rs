// ABOUTME: Capabilities the deployment core needs from the outside world.
// ABOUTME: Remote and local command execution, remote file probes, and structured commands.

mod command;
mod error;
mod host;
mod local;

pub use command::{Command, CommandOutput, Tolerance, check_output, shell_quote};
pub use error::{ConnectError, ConnectErrorKind, ProbeSnafu, SessionSnafu};
pub use host::Host;
pub use local::ProcessExecutor;

use async_trait::async_trait;

use crate::deploy::DeployError;
use crate::types::RemotePath;

/// Runs structured commands on the deployment target.
///
/// Implementations report a non-zero exit as [`DeployError::RemoteCommandFailed`]
/// unless `tolerance` is [`Tolerance::Warn`], in which case the failed output is
/// returned for the caller to inspect. Transport failures are always errors.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn run(
        &self,
        command: &Command,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError>;

    async fn run_privileged(
        &self,
        command: &Command,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError>;
}

/// Existence checks against the remote filesystem.
#[async_trait]
pub trait FileProbe: Send + Sync {
    async fn exists(&self, path: &RemotePath) -> Result<bool, DeployError>;
}

/// Runs commands on the operator's machine.
#[async_trait]
pub trait LocalExecutor: Send + Sync {
    async fn run(&self, command: &Command) -> Result<CommandOutput, DeployError>;
}
