// ABOUTME: Deployment target handle combining execution, probing, and sudo policy.
// ABOUTME: Provides the filesystem primitives the release rotation is built from.

use super::{Command, CommandOutput, FileProbe, RemoteExecutor, Tolerance};
use crate::deploy::DeployError;
use crate::types::RemotePath;

/// The remote host as the deployment core sees it.
///
/// Commands go through [`RemoteExecutor::run_privileged`] when `use_sudo` is
/// set and through [`RemoteExecutor::run`] otherwise.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    executor: &'a dyn RemoteExecutor,
    probe: &'a dyn FileProbe,
    use_sudo: bool,
}

impl std::fmt::Debug for Host<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("use_sudo", &self.use_sudo)
            .finish()
    }
}

impl<'a> Host<'a> {
    pub fn new(executor: &'a dyn RemoteExecutor, probe: &'a dyn FileProbe, use_sudo: bool) -> Self {
        Self {
            executor,
            probe,
            use_sudo,
        }
    }

    /// Run with the configured privilege, aborting on failure.
    pub async fn run(&self, command: Command) -> Result<CommandOutput, DeployError> {
        self.run_with(command, Tolerance::Abort).await
    }

    /// Run with the configured privilege, recording failure as a warning.
    pub async fn run_tolerant(&self, command: Command) -> Result<CommandOutput, DeployError> {
        self.run_with(command, Tolerance::Warn).await
    }

    pub async fn run_with(
        &self,
        command: Command,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError> {
        tracing::debug!(sudo = self.use_sudo, "running: {}", command);
        if self.use_sudo {
            self.executor.run_privileged(&command, tolerance).await
        } else {
            self.executor.run(&command, tolerance).await
        }
    }

    /// Run without elevated privileges regardless of configuration.
    pub async fn run_unprivileged(
        &self,
        command: Command,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError> {
        tracing::debug!("running: {}", command);
        self.executor.run(&command, tolerance).await
    }

    /// Run with elevated privileges regardless of configuration.
    pub async fn run_privileged(
        &self,
        command: Command,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError> {
        tracing::debug!(sudo = true, "running: {}", command);
        self.executor.run_privileged(&command, tolerance).await
    }

    pub async fn exists(&self, path: &RemotePath) -> Result<bool, DeployError> {
        self.probe.exists(path).await
    }

    pub async fn ensure_dir(&self, path: &RemotePath) -> Result<(), DeployError> {
        if !self.exists(path).await? {
            self.run(Command::new("mkdir").arg("-p").arg(path.as_str()))
                .await?;
        }
        Ok(())
    }

    pub async fn remove_all(&self, path: &RemotePath) -> Result<(), DeployError> {
        self.run(Command::new("rm").arg("-rf").arg(path.as_str()))
            .await
            .map(drop)
    }

    /// `rm` a single file if it is present.
    pub async fn remove_file(&self, path: &RemotePath) -> Result<(), DeployError> {
        if self.exists(path).await? {
            self.run(Command::new("rm").arg(path.as_str())).await?;
        }
        Ok(())
    }

    pub async fn rename(&self, from: &RemotePath, to: &RemotePath) -> Result<(), DeployError> {
        self.run(Command::new("mv").arg(from.as_str()).arg(to.as_str()))
            .await
            .map(drop)
    }

    /// `cp -a`: keeps links, modes, and timestamps.
    pub async fn copy_preserving(
        &self,
        from: &RemotePath,
        to: &RemotePath,
    ) -> Result<(), DeployError> {
        self.run(Command::new("cp").arg("-a").arg(from.as_str()).arg(to.as_str()))
            .await
            .map(drop)
    }

    /// Create a symlink unless something already sits at `link`.
    pub async fn symlink(&self, target: &RemotePath, link: &RemotePath) -> Result<(), DeployError> {
        if !self.exists(link).await? {
            self.run(Command::new("ln").arg("-s").arg(target.as_str()).arg(link.as_str()))
                .await?;
        }
        Ok(())
    }

    pub async fn touch(&self, path: &RemotePath) -> Result<(), DeployError> {
        self.run(Command::new("touch").arg(path.as_str()))
            .await
            .map(drop)
    }

    /// Entry names directly under `dir`, one per line as `ls -1` prints them.
    pub async fn list_dir(&self, dir: &RemotePath) -> Result<Vec<String>, DeployError> {
        let output = self
            .run_unprivileged(Command::new("ls").arg("-1").arg(dir.as_str()), Tolerance::Abort)
            .await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}
