// ABOUTME: Archive store for retired releases under the previous-releases root.
// ABOUTME: Timestamp-named archives, chronological listing, and oldest-first pruning.

mod policy;

pub use policy::{RetentionPolicy, plan_prune};

use chrono::{DateTime, TimeZone};

use crate::deploy::DeployError;
use crate::remote::Host;
use crate::types::{ArchiveName, RemotePath};

/// Database dump written into an archive when it is created.
pub const DB_DUMP_FILE: &str = "db_dump.sql";

/// Version name that selects the most recent archive.
pub const LATEST: &str = "last";

/// A retired release kept for rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedRelease {
    pub name: ArchiveName,
    pub path: RemotePath,
}

impl ArchivedRelease {
    /// Dump file that accompanies this archive, when one was taken.
    pub fn db_dump(&self) -> RemotePath {
        self.path.join(DB_DUMP_FILE)
    }
}

/// How a release gets into the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveMode {
    /// `mv`: the release leaves its old location.
    Move,
    /// `cp -a`: the release stays in place.
    Copy,
}

/// Outcome of a prune.
#[derive(Debug, Default)]
pub struct PruneReport {
    pub kept: Vec<ArchiveName>,
    pub removed: Vec<ArchiveName>,
    pub failed: Vec<(ArchiveName, DeployError)>,
}

#[derive(Debug, Clone)]
pub struct RetentionStore<'a> {
    host: Host<'a>,
    root: RemotePath,
}

impl<'a> RetentionStore<'a> {
    pub fn new(host: Host<'a>, root: RemotePath) -> Self {
        Self { host, root }
    }

    /// The archive an `archive` at `at` would create, provided nothing holds its name yet.
    pub async fn ensure_available<Tz>(
        &self,
        at: &DateTime<Tz>,
    ) -> Result<ArchivedRelease, DeployError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let name = ArchiveName::from_datetime(at);
        let path = self.root.join(name.as_str());
        if self.host.exists(&path).await? {
            return Err(DeployError::Precondition(format!(
                "archive {path} already exists; is another deploy running?"
            )));
        }
        Ok(ArchivedRelease { name, path })
    }

    /// Put `release` into a new archive named after `at`.
    pub async fn archive<Tz>(
        &self,
        release: &RemotePath,
        at: &DateTime<Tz>,
        mode: ArchiveMode,
    ) -> Result<ArchivedRelease, DeployError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let ArchivedRelease { name, path } = self.ensure_available(at).await?;
        self.host.ensure_dir(&self.root).await?;

        match mode {
            ArchiveMode::Move => self.host.rename(release, &path).await?,
            ArchiveMode::Copy => self.host.copy_preserving(release, &path).await?,
        }
        tracing::info!("archived {} as {}", release, name);
        Ok(ArchivedRelease { name, path })
    }

    /// Archive names in chronological order.
    pub async fn list(&self) -> Result<Vec<ArchiveName>, DeployError> {
        if !self.host.exists(&self.root).await? {
            return Ok(Vec::new());
        }

        let mut names: Vec<ArchiveName> = self
            .host
            .list_dir(&self.root)
            .await?
            .into_iter()
            .filter_map(|entry| match ArchiveName::parse(&entry) {
                Ok(name) => Some(name),
                Err(e) => {
                    tracing::debug!("ignoring {} in {}: {}", entry, self.root, e);
                    None
                }
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// Find the archive for `version`, which is an archive name or `last`.
    pub async fn resolve(&self, version: &str) -> Result<ArchivedRelease, DeployError> {
        let name = if version == LATEST {
            self.list()
                .await?
                .pop()
                .ok_or_else(|| DeployError::VersionNotFound(version.to_string()))?
        } else {
            let name = ArchiveName::parse(version)
                .map_err(|_| DeployError::VersionNotFound(version.to_string()))?;
            if !self.host.exists(&self.root.join(name.as_str())).await? {
                return Err(DeployError::VersionNotFound(version.to_string()));
            }
            name
        };

        Ok(ArchivedRelease {
            path: self.root.join(name.as_str()),
            name,
        })
    }

    /// Delete all but the newest archives allowed by `policy`.
    ///
    /// Each deletion stands alone; failures are reported, not fatal.
    pub async fn prune(&self, policy: RetentionPolicy) -> Result<PruneReport, DeployError> {
        if policy == RetentionPolicy::KeepAll {
            tracing::debug!("retention disabled; nothing pruned");
            return Ok(PruneReport::default());
        }

        let names = self.list().await?;
        let (kept, doomed) = plan_prune(&names, policy);
        let mut report = PruneReport {
            kept,
            ..PruneReport::default()
        };

        for name in doomed {
            match self.host.remove_all(&self.root.join(name.as_str())).await {
                Ok(()) => {
                    tracing::info!("pruned archive {}", name);
                    report.removed.push(name);
                }
                Err(e) => report.failed.push((name, e)),
            }
        }
        Ok(report)
    }
}
