// ABOUTME: Subversion backend with credentials asked once per session.
// ABOUTME: Updates an existing working copy or checks out fresh, optionally pinned to a revision.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{VcsContext, VcsKind, VersionControl};
use crate::deploy::DeployError;
use crate::prompt::{InteractivePrompt, Validator};
use crate::remote::Command;
use crate::types::{RemotePath, Revision};

#[derive(Clone)]
struct Credentials {
    user: String,
    password: String,
}

pub struct Svn {
    repository: String,
    preset_user: Option<String>,
    preset_password: Option<String>,
    session: Mutex<Option<Credentials>>,
}

impl std::fmt::Debug for Svn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Svn")
            .field("repository", &self.repository)
            .field("preset_user", &self.preset_user)
            .finish_non_exhaustive()
    }
}

impl Svn {
    pub fn new(repository: String, user: Option<String>, password: Option<String>) -> Self {
        Self {
            repository,
            preset_user: user,
            preset_password: password,
            session: Mutex::new(None),
        }
    }

    fn credentials(&self, prompt: &dyn InteractivePrompt) -> Result<Credentials, DeployError> {
        let mut session = self.session.lock();
        if let Some(credentials) = session.as_ref() {
            return Ok(credentials.clone());
        }

        let user = match &self.preset_user {
            Some(user) => user.clone(),
            None => prompt.ask("Enter SVN username:", None, &Validator::NonEmpty)?,
        };
        let password = match &self.preset_password {
            Some(password) => password.clone(),
            None => prompt.ask_secret(&format!("Enter SVN password for {user}:"))?,
        };

        let credentials = Credentials { user, password };
        *session = Some(credentials.clone());
        Ok(credentials)
    }

    fn svn(subcommand: &str, credentials: &Credentials) -> Command {
        Command::new("svn")
            .args([subcommand, "--non-interactive", "--no-auth-cache"])
            .args(["--username", credentials.user.as_str(), "--password"])
            .secret_arg(&credentials.password)
    }
}

#[async_trait]
impl VersionControl for Svn {
    fn kind(&self) -> VcsKind {
        VcsKind::Svn
    }

    async fn checkout_or_update(
        &self,
        ctx: VcsContext<'_>,
        target: &RemotePath,
        revision: Option<&Revision>,
    ) -> Result<Option<Revision>, DeployError> {
        let credentials = self.credentials(ctx.prompt)?;

        if ctx.host.exists(&target.join(".svn")).await? {
            tracing::info!("updating svn working copy {}", target);
            let mut command = Self::svn("update", &credentials);
            if let Some(revision) = revision {
                command = command.args(["--revision", revision.as_str()]);
            }
            ctx.host.run(command.current_dir(target)).await?;
        } else {
            tracing::info!("checking out {} into {}", self.repository, target);
            let source = match revision {
                Some(revision) => format!("{}@{}", self.repository, revision),
                None => self.repository.clone(),
            };
            ctx.host
                .run(
                    Self::svn("checkout", &credentials)
                        .arg(source)
                        .arg(target.as_str())
                        .current_dir(ctx.project_root),
                )
                .await?;
        }

        Ok(revision.cloned())
    }

    fn status_command(&self) -> Option<Command> {
        Some(Command::new("svn").args(["status", "--quiet"]))
    }

    async fn log(
        &self,
        ctx: VcsContext<'_>,
        working_copy: &RemotePath,
    ) -> Result<String, DeployError> {
        let credentials = self.credentials(ctx.prompt)?;
        let output = ctx
            .host
            .run(
                Self::svn("log", &credentials)
                    .args(["-l", "1"])
                    .current_dir(working_copy),
            )
            .await?;
        Ok(output.trimmed().to_string())
    }
}
