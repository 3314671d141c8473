// ABOUTME: ReleaseDirector owns the directory protocol shared by deploy and rollback.
// ABOUTME: Staging of the next directory, archive-time dumps, and task dispatch.

use super::Rotation;
use super::state::Staged;
use crate::config::Environment;
use crate::deploy::{Capabilities, DeployError};
use crate::diagnostics::{Diagnostics, Warning};
use crate::prompt::confirm_or_abort;
use crate::remote::{CommandOutput, Tolerance};
use crate::retention::{ArchivedRelease, DB_DUMP_FILE, RetentionStore};
use crate::tasks::Task;
use crate::types::RemotePath;

const LOCAL_SETTINGS: &str = "local_settings.py";

/// Drives one environment's release directories.
pub struct ReleaseDirector<'a> {
    pub(crate) env: &'a Environment,
    pub(crate) caps: Capabilities<'a>,
}

impl<'a> ReleaseDirector<'a> {
    pub fn new(env: &'a Environment, caps: Capabilities<'a>) -> Self {
        Self { env, caps }
    }

    pub fn retention(&self) -> RetentionStore<'a> {
        RetentionStore::new(self.caps.host, self.env.layout.previous.clone())
    }

    /// Prepare the next directory as a copy of the current release.
    ///
    /// A leftover next directory is only removed after the operator agrees.
    pub async fn stage(&self) -> Result<Rotation<Staged>, DeployError> {
        let host = self.caps.host;
        let layout = &self.env.layout;

        if host.exists(&layout.next).await? {
            tracing::warn!(
                "the next directory {} already exists; maybe a previous deploy failed, or another deploy is in progress",
                layout.next
            );
            confirm_or_abort(
                self.caps.prompt,
                "The \"next\" directory already exists. Maybe a previous deploy failed, or maybe another deploy is in progress.\nWould you like to continue anyway (and delete the current next dir)? [no/yes]",
                "Aborting deploy - try again when you're certain what to do.",
            )?;
            host.remove_all(&layout.next).await?;
        }

        // first deploy: leave next absent so the checkout starts clean
        if host.exists(&layout.current).await? {
            host.copy_preserving(&layout.current, &layout.next).await?;
            host.remove_file(&layout.next.join(DB_DUMP_FILE)).await?;
        }
        Ok(Rotation::staged())
    }

    pub async fn run_task(
        &self,
        release: &RemotePath,
        task: Task,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError> {
        self.caps.tasks.run_task(release, &task, tolerance).await
    }

    /// Dump the database into a fresh archive. Never fails the caller.
    ///
    /// A dump carried in from an earlier archive never survives: the archive
    /// holds a fresh dump or none.
    pub async fn dump_into_archive(&self, archived: &ArchivedRelease, diag: &mut Diagnostics) {
        if let Err(e) = self.caps.host.remove_file(&archived.db_dump()).await {
            diag.warn(Warning::db_dump(format!(
                "could not remove the stale dump {}: {}",
                archived.db_dump(),
                e
            )));
            return;
        }
        if !self.env.archive_db_dump {
            return;
        }

        let ready = match self.env.django_settings_dir(&archived.path) {
            Some(settings) => self.caps.host.exists(&settings.join(LOCAL_SETTINGS)).await,
            None => {
                self.caps
                    .host
                    .exists(&archived.path.join("deploy").join("tasks.py"))
                    .await
            }
        };
        match ready {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("no database settings in {}; skipping dump", archived.path);
                return;
            }
            Err(e) => {
                diag.warn(Warning::db_dump(format!(
                    "could not check {} for database settings: {}",
                    archived.path, e
                )));
                return;
            }
        }

        let task = Task::DumpDb {
            file: archived.db_dump(),
        };
        match self.run_task(&archived.path, task, Tolerance::Warn).await {
            Ok(output) if output.success() => {
                tracing::info!("database dumped to {}", archived.db_dump());
            }
            Ok(output) => diag.warn(Warning::db_dump(format!(
                "database dump into {} exited with {}",
                archived.path, output.exit_code
            ))),
            Err(e) => diag.warn(Warning::db_dump(format!(
                "database dump into {} failed: {}",
                archived.path, e
            ))),
        }
    }
}
