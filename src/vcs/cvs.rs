// ABOUTME: CVS backend updating in place or checking out a module.
// ABOUTME: Every invocation carries the configured remote shell in CVS_RSH.

use async_trait::async_trait;

use super::{VcsContext, VcsKind, VersionControl};
use crate::config::CvsSettings;
use crate::deploy::DeployError;
use crate::remote::Command;
use crate::types::{RemotePath, Revision};

#[derive(Debug, Clone)]
pub struct Cvs {
    repository: String,
    settings: CvsSettings,
}

impl Cvs {
    pub fn new(repository: String, settings: CvsSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// `-d:<type>:[user@]<repository>:<path>`
    pub fn cvsroot_option(&self) -> String {
        let user = self
            .settings
            .user
            .as_deref()
            .map(|u| format!("{u}@"))
            .unwrap_or_default();
        format!(
            "-d:{}:{}{}:{}",
            self.settings.connection_type, user, self.repository, self.settings.repo_path
        )
    }

    fn cvs(&self) -> Command {
        Command::new("cvs").env("CVS_RSH", &self.settings.rsh)
    }
}

#[async_trait]
impl VersionControl for Cvs {
    fn kind(&self) -> VcsKind {
        VcsKind::Cvs
    }

    async fn checkout_or_update(
        &self,
        ctx: VcsContext<'_>,
        target: &RemotePath,
        revision: Option<&Revision>,
    ) -> Result<Option<Revision>, DeployError> {
        if ctx.host.exists(target).await? {
            tracing::info!("updating cvs working copy {}", target);
            ctx.host
                .run(self.cvs().args(["update", "-d", "-P"]).current_dir(target))
                .await?;
        } else {
            tracing::info!("checking out cvs module {}", self.settings.module);
            let mut command = self
                .cvs()
                .arg(self.cvsroot_option())
                .args(["checkout", "-d", target.as_str()]);
            if let Some(revision) = revision {
                command = command.args(["-r", revision.as_str()]);
            }
            ctx.host
                .run(
                    command
                        .arg(&self.settings.module)
                        .current_dir(ctx.project_root),
                )
                .await?;
        }
        Ok(revision.cloned())
    }

    fn status_command(&self) -> Option<Command> {
        None
    }

    async fn log(
        &self,
        _ctx: VcsContext<'_>,
        _working_copy: &RemotePath,
    ) -> Result<String, DeployError> {
        Err(DeployError::unsupported_vcs("cvs (revision log)"))
    }
}
