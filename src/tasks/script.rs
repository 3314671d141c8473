// ABOUTME: Task runner invoking deploy/tasks.py and deploy/bootstrap.py inside a release.
// ABOUTME: Runs with the host's configured privilege from the release directory.

use async_trait::async_trait;

use super::{ProvisioningTask, Task};
use crate::deploy::DeployError;
use crate::remote::{Command, CommandOutput, Host, Tolerance};
use crate::types::RemotePath;

const PYTHON: &str = "python";

#[derive(Debug, Clone, Copy)]
pub struct TasksScript<'a> {
    host: Host<'a>,
    verbose: bool,
}

impl<'a> TasksScript<'a> {
    pub fn new(host: Host<'a>, verbose: bool) -> Self {
        Self { host, verbose }
    }

    /// Command line for `task` using the scripts in `release`.
    pub fn command(&self, release: &RemotePath, task: &Task) -> Command {
        let deploy_dir = release.join("deploy");
        let command = match task {
            Task::SetupEnv => Command::new(PYTHON)
                .arg(deploy_dir.join("bootstrap.py").as_str())
                .args(["--full-rebuild", "--quiet"]),
            _ => {
                let mut command = Command::new(deploy_dir.join("tasks.py").as_str());
                if self.verbose {
                    command = command.arg("-v");
                }
                command.arg(task.invocation())
            }
        };
        command.current_dir(release)
    }
}

#[async_trait]
impl ProvisioningTask for TasksScript<'_> {
    async fn run_task(
        &self,
        release: &RemotePath,
        task: &Task,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError> {
        tracing::info!("running task {} in {}", task, release);
        self.host
            .run_with(self.command(release, task), tolerance)
            .await
    }
}
