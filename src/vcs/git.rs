// ABOUTME: Git backend: re-point, fetch, and check out an existing clone, or clone fresh.
// ABOUTME: Local modifications are stashed around the checkout and submodules initialised after.

use async_trait::async_trait;

use super::{VcsContext, VcsKind, VersionControl};
use crate::deploy::DeployError;
use crate::remote::Command;
use crate::types::{RemotePath, Revision};

const NOTHING_STASHED: &str = "No local changes";

#[derive(Debug, Clone)]
pub struct Git {
    repository: String,
    default_branch: String,
}

impl Git {
    pub fn new(repository: String, default_branch: String) -> Self {
        Self {
            repository,
            default_branch,
        }
    }

    fn git<I, S>(dir: &RemotePath, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::new("git").args(args).current_dir(dir)
    }

    async fn update(
        &self,
        ctx: VcsContext<'_>,
        target: &RemotePath,
        revision: &str,
    ) -> Result<(), DeployError> {
        let host = ctx.host;

        // origin may already be gone after an interrupted run
        host.run_tolerant(Self::git(target, ["remote", "rm", "origin"]))
            .await?;
        host.run(Self::git(target, ["remote", "add", "origin"]).arg(&self.repository))
            .await?;
        host.run(Self::git(target, ["fetch", "origin"])).await?;

        let stash = host.run(Self::git(target, ["stash"])).await?;
        let stashed = !stash.stdout.trim_start().starts_with(NOTHING_STASHED);

        host.run(Self::git(target, ["checkout", revision])).await?;

        let remote_branches = host.run(Self::git(target, ["branch", "-r"])).await?;
        let tracking = format!("origin/{revision}");
        if remote_branches
            .stdout
            .lines()
            .any(|line| line.trim() == tracking)
        {
            host.run(Self::git(target, ["merge"]).arg(&tracking)).await?;
        }

        if stashed {
            host.run(Self::git(target, ["stash", "pop"])).await?;
        }
        Ok(())
    }

    async fn clone_into(
        &self,
        ctx: VcsContext<'_>,
        target: &RemotePath,
        revision: Option<&Revision>,
    ) -> Result<(), DeployError> {
        ctx.host
            .run(
                Command::new("git")
                    .args(["clone", "-b", self.default_branch.as_str(), self.repository.as_str()])
                    .arg(target.as_str())
                    .current_dir(ctx.project_root),
            )
            .await?;

        if let Some(revision) = revision.filter(|r| r.as_str() != self.default_branch) {
            ctx.host
                .run(Self::git(target, ["checkout", revision.as_str()]))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl VersionControl for Git {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    async fn checkout_or_update(
        &self,
        ctx: VcsContext<'_>,
        target: &RemotePath,
        revision: Option<&Revision>,
    ) -> Result<Option<Revision>, DeployError> {
        let deployed = if ctx.host.exists(&target.join(".git")).await? {
            let wanted = revision.map_or(self.default_branch.as_str(), Revision::as_str);
            tracing::info!("updating git working copy {} to {}", target, wanted);
            self.update(ctx, target, wanted).await?;
            wanted.to_string()
        } else {
            if ctx.host.exists(target).await? {
                return Err(DeployError::Precondition(format!(
                    "{target} exists but is not a git working copy"
                )));
            }
            tracing::info!("cloning {} into {}", self.repository, target);
            self.clone_into(ctx, target, revision).await?;
            revision.map_or_else(|| self.default_branch.clone(), |r| r.to_string())
        };

        if ctx.host.exists(&target.join(".gitmodules")).await? {
            ctx.host
                .run(Self::git(target, ["submodule", "update", "--init"]))
                .await?;
        }

        Ok(Revision::new(&deployed).ok())
    }

    fn status_command(&self) -> Option<Command> {
        Some(Command::new("git").args(["status", "--short"]))
    }

    async fn log(
        &self,
        ctx: VcsContext<'_>,
        working_copy: &RemotePath,
    ) -> Result<String, DeployError> {
        let output = ctx
            .host
            .run(Self::git(working_copy, ["log", "-n", "1"]))
            .await?;
        Ok(output.trimmed().to_string())
    }
}
