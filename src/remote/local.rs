// ABOUTME: Local command execution on the operator's machine.
// ABOUTME: Wraps tokio::process so local checks share the structured command type.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command as Process;

use super::{Command, CommandOutput, LocalExecutor};
use crate::deploy::DeployError;

/// [`LocalExecutor`] backed by child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

#[async_trait]
impl LocalExecutor for ProcessExecutor {
    async fn run(&self, command: &Command) -> Result<CommandOutput, DeployError> {
        tracing::debug!("running locally: {}", command);

        let mut process = Process::new(command.program());
        process
            .args(command.arg_values())
            .envs(command.env_vars().iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = command.cwd() {
            process.current_dir(dir.as_str());
        }

        let output = process.output().await.map_err(|e| {
            DeployError::Transport(format!("failed to run `{}` locally: {}", command, e))
        })?;

        Ok(CommandOutput {
            // Killed by a signal: no code, report as generic failure.
            exit_code: output.status.code().map(|c| c as u32).unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let output = ProcessExecutor
            .run(&Command::new("sh").args(["-c", "echo hello; exit 3"]))
            .await
            .unwrap();
        assert_eq!(output.trimmed(), "hello");
        assert_eq!(output.exit_code, 3);
    }

    #[tokio::test]
    async fn missing_program_is_transport_error() {
        let err = ProcessExecutor
            .run(&Command::new("definitely-not-a-real-program-xyz"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Transport(_)));
    }
}
