// ABOUTME: DeploymentOrchestrator sequencing checks, rotation, provisioning, and retention.
// ABOUTME: Any failing step aborts the rest; tolerated failures end up in Diagnostics.

use super::{Capabilities, DeployError, LiveAction};
use crate::config::Environment;
use crate::diagnostics::{Diagnostics, Warning};
use crate::release::{DeployOutcome, ReleaseDirector, RollbackOutcome, RollbackRequest};
use crate::remote::{Command, Tolerance};
use crate::retention::{PruneReport, RetentionPolicy};
use crate::tasks::Task;
use crate::types::{ArchiveName, Revision};
use crate::vcs::{self, VcsContext, VersionControl};

/// Arguments of a deploy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployRequest {
    /// Revision to deploy; falls back to the branch check result, then the default branch.
    pub revision: Option<Revision>,
    /// Retention override for this run.
    pub keep: Option<u32>,
}

#[derive(Debug)]
pub struct DeployReport {
    pub outcome: DeployOutcome,
    pub prune: PruneReport,
}

/// `deploy_clean` deletes the database, so production is always refused.
pub fn refuse_clean_on_production(env: &Environment) -> Result<(), DeployError> {
    if env.name.is_production() {
        return Err(DeployError::Validation(
            "deploy_clean refuses to run on production: it deletes the database".to_string(),
        ));
    }
    Ok(())
}

/// Runs one workflow against one environment.
pub struct Orchestrator<'a> {
    director: ReleaseDirector<'a>,
    vcs: Box<dyn VersionControl>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(env: &'a Environment, caps: Capabilities<'a>) -> Result<Self, DeployError> {
        let vcs = vcs::backend(&env.vcs)?;
        Ok(Self::with_backend(env, caps, vcs))
    }

    pub fn with_backend(
        env: &'a Environment,
        caps: Capabilities<'a>,
        vcs: Box<dyn VersionControl>,
    ) -> Self {
        Self {
            director: ReleaseDirector::new(env, caps),
            vcs,
        }
    }

    fn caps(&self) -> Capabilities<'a> {
        self.director.caps
    }

    /// Local changes check, plus the branch check on git.
    pub async fn check(&self) -> Result<Option<Revision>, DeployError> {
        let env = self.director.env;
        let caps = self.caps();
        vcs::check_for_local_changes(
            self.vcs.as_ref(),
            caps.host,
            caps.local,
            caps.prompt,
            &env.layout.current,
            &env.vcs.default_branch,
        )
        .await
    }

    pub async fn deploy(
        &self,
        request: &DeployRequest,
        diag: &mut Diagnostics,
    ) -> Result<DeployReport, DeployError> {
        let env = self.director.env;
        let host = self.caps().host;
        tracing::info!("deploying {} to {}", env.project_name, env.name);

        host.ensure_dir(&env.layout.root).await?;

        let resolved = self.check().await?;
        let revision = request.revision.clone().or(resolved);

        let staged = self.director.stage().await?;
        let checked_out = staged
            .checkout(&self.director, self.vcs.as_ref(), revision.as_ref())
            .await?;
        let provisioned = checked_out.provision(&self.director, diag).await?;
        let maintenance = provisioned.enter_maintenance(&self.director, diag).await?;
        let rotated = maintenance.rotate(&self.director, diag).await?;
        let migrated = rotated.migrate(&self.director).await?;
        let outcome = migrated.go_live(&self.director).await?.finish();

        let prune = self.prune(request.keep, diag).await?;

        if env.name.is_production() {
            let task = Task::SetupDbDumps {
                dir: env.layout.dump_dir.clone(),
            };
            self.director
                .run_task(&outcome.release.path, task, Tolerance::Abort)
                .await?;
        }

        tracing::info!(
            "deployed {} (downtime {:.1}s)",
            outcome
                .release
                .revision
                .as_ref()
                .map_or("working copy", Revision::as_str),
            outcome.downtime.seconds()
        );
        Ok(DeployReport { outcome, prune })
    }

    /// Wipe database and files, then deploy from scratch. Refused on production.
    pub async fn deploy_clean(
        &self,
        request: &DeployRequest,
        diag: &mut Diagnostics,
    ) -> Result<DeployReport, DeployError> {
        let env = self.director.env;
        refuse_clean_on_production(env)?;

        let caps = self.caps();
        let stop = caps.serving.stop(Tolerance::Warn).await?;
        if !stop.success() {
            diag.warn(Warning::service_stop(format!(
                "stopping the webserver exited with {}",
                stop.exit_code
            )));
        }

        if caps.host.exists(&env.layout.current).await? {
            self.director
                .run_task(&env.layout.current, Task::CleanDb, Tolerance::Abort)
                .await?;
        } else {
            tracing::info!("no current release; skipping database clean");
        }

        caps.host.remove_all(&env.layout.root).await?;
        self.deploy(request, diag).await
    }

    /// Run a one-off action against the current release.
    pub async fn perform(&self, action: LiveAction) -> Result<(), DeployError> {
        let env = self.director.env;
        let caps = self.caps();
        action.validate(env)?;

        let current = &env.layout.current;
        if action.needs_release() && !caps.host.exists(current).await? {
            return Err(DeployError::Precondition(format!(
                "no current release at {current}; deploy first"
            )));
        }
        tracing::info!("{} on {}", action.describe(), env.name);

        match action {
            LiveAction::UpdateDb {
                force_use_migrations,
            } => {
                let task = Task::UpdateDb {
                    force_use_migrations,
                };
                self.director.run_task(current, task, Tolerance::Abort).await?;
            }
            LiveAction::UpdateRequirements => {
                self.director
                    .run_task(current, Task::UpdateVe, Tolerance::Abort)
                    .await?;
            }
            LiveAction::CollectStatic => {
                self.director
                    .run_task(current, Task::CollectStatic, Tolerance::Abort)
                    .await?;
            }
            LiveAction::RestartWebserver => {
                caps.serving.restart(Tolerance::Abort).await?;
            }
            LiveAction::RemoteTest => {
                let Some(django_dir) = env.django_dir(current) else {
                    return Err(DeployError::NotSupported(
                        "remote tests need a django project".to_string(),
                    ));
                };
                let command = Command::new("python")
                    .args(env.test_command.split_whitespace())
                    .current_dir(&django_dir);
                caps.host.run_with(command, Tolerance::Abort).await?;
            }
        }
        Ok(())
    }

    pub async fn rollback(
        &self,
        request: &RollbackRequest,
        diag: &mut Diagnostics,
    ) -> Result<RollbackOutcome, DeployError> {
        self.director.rollback(request, diag).await
    }

    /// Archives available to roll back to, oldest first.
    pub async fn list(&self) -> Result<Vec<ArchiveName>, DeployError> {
        self.director.retention().list().await
    }

    /// Head of the revision log of the current release.
    pub async fn version(&self) -> Result<String, DeployError> {
        let env = self.director.env;
        let caps = self.caps();
        let ctx = VcsContext {
            host: caps.host,
            prompt: caps.prompt,
            project_root: &env.layout.root,
        };
        self.vcs.log(ctx, &env.layout.current).await
    }

    pub async fn prune(
        &self,
        keep: Option<u32>,
        diag: &mut Diagnostics,
    ) -> Result<PruneReport, DeployError> {
        let policy = RetentionPolicy::resolve(keep, Some(self.director.env.keep));
        let report = self.director.retention().prune(policy).await?;
        for (name, error) in &report.failed {
            diag.warn(Warning::prune_failure(format!(
                "could not delete archive {name}: {error}"
            )));
        }
        Ok(report)
    }
}
