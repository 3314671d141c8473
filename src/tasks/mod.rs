// ABOUTME: Provisioning tasks run on the host by the release's own deploy scripts.
// ABOUTME: Typed task names and arguments, executed through deploy/tasks.py.

mod script;

pub use script::TasksScript;

use async_trait::async_trait;

use crate::deploy::DeployError;
use crate::remote::{CommandOutput, Tolerance};
use crate::types::{EnvironmentName, RemotePath};

/// A task the core asks the provisioning layer to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Create or refresh the deploy virtualenv and dependencies.
    SetupEnv,
    /// Environment-specific deploy steps, including migrations.
    Deploy { environment: EnvironmentName },
    CleanDb,
    DumpDb { file: RemotePath },
    LoadDb { file: RemotePath },
    /// Configure scheduled dumps into `dir`.
    SetupDbDumps { dir: RemotePath },
    UpdateDb { force_use_migrations: bool },
    /// Bring the virtualenv in line with the release's requirements.
    UpdateVe,
    CollectStatic,
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::SetupEnv => "setup_env",
            Task::Deploy { .. } => "deploy",
            Task::CleanDb => "clean_db",
            Task::DumpDb { .. } => "dump_db",
            Task::LoadDb { .. } => "load_dbdump",
            Task::SetupDbDumps { .. } => "setup_db_dumps",
            Task::UpdateDb { .. } => "update_db",
            Task::UpdateVe => "update_ve",
            Task::CollectStatic => "collect_static",
        }
    }

    /// Argument string passed after `name:`, if any.
    pub fn args(&self) -> Option<String> {
        match self {
            Task::SetupEnv | Task::CleanDb | Task::UpdateVe | Task::CollectStatic => None,
            Task::Deploy { environment } => Some(environment.to_string()),
            Task::DumpDb { file } | Task::LoadDb { file } => Some(file.to_string()),
            Task::SetupDbDumps { dir } => Some(dir.to_string()),
            Task::UpdateDb {
                force_use_migrations,
            } => Some(format!(
                "force_use_migrations={}",
                if *force_use_migrations { "True" } else { "False" }
            )),
        }
    }

    /// `name` or `name:args`.
    pub fn invocation(&self) -> String {
        match self.args() {
            Some(args) => format!("{}:{}", self.name(), args),
            None => self.name().to_string(),
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.invocation())
    }
}

/// Runs provisioning tasks against a release directory.
#[async_trait]
pub trait ProvisioningTask: Send + Sync {
    /// Run `task` using the scripts shipped in `release`.
    async fn run_task(
        &self,
        release: &RemotePath,
        task: &Task,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError>;
}
