// ABOUTME: One-off operator actions against the live release.
// ABOUTME: Task wrappers, webserver restart, and the remote test run.

use super::DeployError;
use crate::config::Environment;

/// An action that runs against the current release without rotating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveAction {
    /// Apply database changes; migrations are forced when asked.
    UpdateDb { force_use_migrations: bool },
    UpdateRequirements,
    CollectStatic,
    RestartWebserver,
    /// Run the project's test command on the host.
    RemoteTest,
}

impl LiveAction {
    /// What the action does, for progress and success lines.
    pub fn describe(&self) -> &'static str {
        match self {
            LiveAction::UpdateDb { .. } => "update the database",
            LiveAction::UpdateRequirements => "update the requirements",
            LiveAction::CollectStatic => "collect static files",
            LiveAction::RestartWebserver => "restart the webserver",
            LiveAction::RemoteTest => "run the tests",
        }
    }

    /// Checks that need no connection.
    pub fn validate(&self, env: &Environment) -> Result<(), DeployError> {
        if *self != LiveAction::RemoteTest {
            return Ok(());
        }
        if env.name.is_production() {
            return Err(DeployError::Validation(
                "do not run tests on the production environment".to_string(),
            ));
        }
        if env.django.is_none() {
            return Err(DeployError::NotSupported(
                "remote tests need a django project".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the action needs a current release to run in.
    pub fn needs_release(&self) -> bool {
        !matches!(self, LiveAction::RestartWebserver)
    }
}
