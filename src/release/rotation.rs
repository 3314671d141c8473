// ABOUTME: State transition methods for the release rotation.
// ABOUTME: Each method consumes self and returns the next state on success.

use chrono::{DateTime, Local};
use serde::Serialize;

use super::director::ReleaseDirector;
use super::state::{CheckedOut, Live, Maintenance, Migrated, Provisioned, Rotated, Staged};
use super::Release;
use crate::deploy::DeployError;
use crate::diagnostics::{Diagnostics, Warning};
use crate::remote::{Command, Tolerance};
use crate::retention::{ArchiveMode, ArchivedRelease};
use crate::tasks::Task;
use crate::types::Revision;
use crate::vcs::{VcsContext, VersionControl};

/// Window during which the site showed maintenance instead of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Downtime {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl Downtime {
    pub fn seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Result of a completed rotation.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub release: Release,
    /// Release that was live before, now archived (None on first deploy).
    pub archived: Option<ArchivedRelease>,
    pub downtime: Downtime,
}

/// A deploy in progress, parameterized by its current state.
#[derive(Debug)]
pub struct Rotation<S> {
    pub(crate) state: S,
}

impl Rotation<Staged> {
    pub(crate) fn staged() -> Self {
        Rotation { state: Staged }
    }

    /// Check out or update the next directory.
    pub async fn checkout(
        self,
        director: &ReleaseDirector<'_>,
        vcs: &dyn VersionControl,
        revision: Option<&Revision>,
    ) -> Result<Rotation<CheckedOut>, DeployError> {
        let layout = &director.env.layout;
        let ctx = VcsContext {
            host: director.caps.host,
            prompt: director.caps.prompt,
            project_root: &layout.root,
        };
        let revision = vcs.checkout_or_update(ctx, &layout.next, revision).await?;

        Ok(Rotation {
            state: CheckedOut {
                release: Release {
                    path: layout.next.clone(),
                    created_at: director.caps.clock.now(),
                    revision,
                },
            },
        })
    }
}

impl Rotation<CheckedOut> {
    /// Remove stale compiled files, then set up the environment in next.
    pub async fn provision(
        self,
        director: &ReleaseDirector<'_>,
        diag: &mut Diagnostics,
    ) -> Result<Rotation<Provisioned>, DeployError> {
        let release = self.state.release;

        if let Some(django_dir) = director.env.django_dir(&release.path) {
            let cleanup = Command::new("find")
                .args([django_dir.as_str(), "-name", "*.pyc", "-delete"]);
            match director.caps.host.run_tolerant(cleanup).await {
                Ok(output) if output.success() => {}
                Ok(output) => diag.warn(Warning::artifact_cleanup(format!(
                    "removing .pyc files under {} exited with {}",
                    django_dir, output.exit_code
                ))),
                Err(e) => diag.warn(Warning::artifact_cleanup(format!(
                    "removing .pyc files under {} failed: {}",
                    django_dir, e
                ))),
            }
        }

        director
            .run_task(&release.path, Task::SetupEnv, Tolerance::Abort)
            .await?;

        Ok(Rotation {
            state: Provisioned { release },
        })
    }
}

impl Rotation<Provisioned> {
    /// Show the maintenance page and start the downtime clock.
    ///
    /// Fails before the site is touched when the archive name for the
    /// current release is already taken.
    pub async fn enter_maintenance(
        self,
        director: &ReleaseDirector<'_>,
        diag: &mut Diagnostics,
    ) -> Result<Rotation<Maintenance>, DeployError> {
        let downtime_start = director.caps.clock.now();
        let archive_at = director.caps.clock.now();
        if director.caps.host.exists(&director.env.layout.current).await? {
            director.retention().ensure_available(&archive_at).await?;
        }
        let serving = director.caps.serving;

        serving.link_config(true).await?;
        // the maintenance config may be absent or incomplete; keep going
        let reload = serving.reload(Tolerance::Warn).await?;
        if !reload.success() {
            diag.warn(Warning::service_reload(format!(
                "webserver reload for maintenance exited with {}",
                reload.exit_code
            )));
        }

        Ok(Rotation {
            state: Maintenance {
                release: self.state.release,
                downtime_start,
                archive_at,
            },
        })
    }
}

impl Rotation<Maintenance> {
    /// Archive the current release, then promote next to current.
    pub async fn rotate(
        self,
        director: &ReleaseDirector<'_>,
        diag: &mut Diagnostics,
    ) -> Result<Rotation<Rotated>, DeployError> {
        let host = director.caps.host;
        let layout = &director.env.layout;

        let archived = if host.exists(&layout.current).await? {
            let archived = director
                .retention()
                .archive(&layout.current, &self.state.archive_at, ArchiveMode::Move)
                .await?;
            director.dump_into_archive(&archived, diag).await;
            Some(archived)
        } else {
            tracing::info!("no current release at {}; first deploy", layout.current);
            None
        };

        host.rename(&layout.next, &layout.current).await?;

        Ok(Rotation {
            state: Rotated {
                release: self.state.release.moved_to(layout.current.clone()),
                archived,
                downtime_start: self.state.downtime_start,
            },
        })
    }
}

impl Rotation<Rotated> {
    /// Run the environment's deploy task, migrations included, on the new release.
    pub async fn migrate(
        self,
        director: &ReleaseDirector<'_>,
    ) -> Result<Rotation<Migrated>, DeployError> {
        let task = Task::Deploy {
            environment: director.env.name.clone(),
        };
        director
            .run_task(&self.state.release.path, task, Tolerance::Abort)
            .await?;

        Ok(Rotation {
            state: Migrated {
                release: self.state.release,
                archived: self.state.archived,
                downtime_start: self.state.downtime_start,
            },
        })
    }
}

impl Rotation<Migrated> {
    /// Link the live config, reload, and make the application pick up new code.
    pub async fn go_live(
        self,
        director: &ReleaseDirector<'_>,
    ) -> Result<Rotation<Live>, DeployError> {
        let serving = director.caps.serving;
        serving.link_config(false).await?;
        serving.reload(Tolerance::Abort).await?;
        let finished_at = director.caps.clock.now();

        director
            .caps
            .host
            .touch(&self.state.release.path.join(&director.env.reload_file))
            .await?;

        Ok(Rotation {
            state: Live {
                release: self.state.release,
                archived: self.state.archived,
                downtime: Downtime {
                    started_at: self.state.downtime_start,
                    finished_at,
                },
            },
        })
    }
}

impl Rotation<Live> {
    pub fn finish(self) -> DeployOutcome {
        DeployOutcome {
            release: self.state.release,
            archived: self.state.archived,
            downtime: self.state.downtime,
        }
    }
}
