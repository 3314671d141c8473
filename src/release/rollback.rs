// ABOUTME: Rollback to an archived release with optional database restore.
// ABOUTME: Validation happens before any remote command; the replaced release is archived first.

use super::director::ReleaseDirector;
use crate::deploy::DeployError;
use crate::diagnostics::Diagnostics;
use crate::remote::Tolerance;
use crate::retention::{ArchiveMode, ArchivedRelease, DB_DUMP_FILE, LATEST};
use crate::tasks::Task;

/// Arguments of a rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackRequest {
    /// Archive name, or `last` for the most recent archive.
    pub version: String,
    pub migrate: bool,
    pub restore_db: bool,
}

impl Default for RollbackRequest {
    fn default() -> Self {
        Self {
            version: LATEST.to_string(),
            migrate: false,
            restore_db: false,
        }
    }
}

impl RollbackRequest {
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.migrate && self.restore_db {
            return Err(DeployError::Validation(
                "rollback cannot do both migrate and restore_db".to_string(),
            ));
        }
        if self.migrate {
            return Err(DeployError::NotSupported(
                "rollback with migrate: deriving migrations between releases is not implemented"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RollbackOutcome {
    /// Archive now serving as the current release.
    pub restored: ArchivedRelease,
    /// Copy of the release that was replaced.
    pub safety_archive: Option<ArchivedRelease>,
    pub db_restored: bool,
}

impl ReleaseDirector<'_> {
    pub async fn rollback(
        &self,
        request: &RollbackRequest,
        diag: &mut Diagnostics,
    ) -> Result<RollbackOutcome, DeployError> {
        request.validate()?;

        let host = self.caps.host;
        let current = &self.env.layout.current;
        let store = self.retention();
        let target = store.resolve(&request.version).await?;
        tracing::info!("rolling back {} to {}", self.env.name, target.name);

        let archive_at = self.caps.clock.now();
        let has_current = host.exists(current).await?;
        if has_current {
            store.ensure_available(&archive_at).await?;
        }

        self.caps.serving.stop(Tolerance::Abort).await?;

        let safety_archive = if has_current {
            let archived = store.archive(current, &archive_at, ArchiveMode::Copy).await?;
            self.dump_into_archive(&archived, diag).await;
            Some(archived)
        } else {
            None
        };

        if request.restore_db {
            let task = Task::LoadDb {
                file: target.db_dump(),
            };
            self.run_task(&target.path, task, Tolerance::Abort).await?;
        }

        // no stray files from the replaced release
        host.remove_all(current).await?;
        host.copy_preserving(&target.path, current).await?;
        // the dump belongs to the archive, not to the release
        host.remove_file(&current.join(DB_DUMP_FILE)).await?;

        self.caps.serving.start(Tolerance::Abort).await?;

        Ok(RollbackOutcome {
            restored: target,
            safety_archive,
            db_restored: request.restore_db,
        })
    }
}
