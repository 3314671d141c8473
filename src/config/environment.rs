// ABOUTME: Immutable per-invocation view of one deployment environment.
// ABOUTME: Resolves paths, backends, and credentials once so nothing downstream reads raw config.

use std::time::Duration;

use super::{Config, EnvironmentConfig, ProjectType, ServerConfig};
use crate::error::{Error, Result};
use crate::serving::{LinuxFlavor, WebserverKind};
use crate::types::{EnvironmentName, RemotePath};
use crate::vcs::VcsKind;

pub const CURRENT_DIR_NAME: &str = "dev";
pub const NEXT_DIR_NAME: &str = "next";
pub const PREVIOUS_DIR_NAME: &str = "previous";
pub const DUMP_DIR_NAME: &str = "dbdumps";

/// Remote directory layout of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLayout {
    /// Project root holding every other directory.
    pub root: RemotePath,
    /// Release currently serving traffic.
    pub current: RemotePath,
    /// Staging path for the release being prepared.
    pub next: RemotePath,
    /// Root of timestamp-named archives.
    pub previous: RemotePath,
    /// Scheduled database dump output.
    pub dump_dir: RemotePath,
}

impl ReleaseLayout {
    pub fn under(root: RemotePath) -> Self {
        Self {
            current: root.join(CURRENT_DIR_NAME),
            next: root.join(NEXT_DIR_NAME),
            previous: root.join(PREVIOUS_DIR_NAME),
            dump_dir: root.join(DUMP_DIR_NAME),
            root,
        }
    }
}

/// CVS checkout coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvsSettings {
    pub connection_type: String,
    pub user: Option<String>,
    pub repo_path: String,
    pub module: String,
    /// Value of `CVS_RSH` for every cvs invocation.
    pub rsh: String,
}

/// Everything the version-control adapter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsSettings {
    pub kind: VcsKind,
    pub repository: String,
    /// Branch cloned on first deploy and proposed on branch mismatch.
    pub default_branch: String,
    pub cvs: Option<CvsSettings>,
    pub svn_user: Option<String>,
    pub svn_password: Option<String>,
}

/// Django source locations, relative to a release root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DjangoLayout {
    pub relative_dir: String,
    pub relative_settings_dir: String,
}

#[derive(Debug, Clone)]
pub struct Environment {
    pub name: EnvironmentName,
    pub server: ServerConfig,
    pub project_name: String,
    pub project_type: ProjectType,
    pub layout: ReleaseLayout,
    pub vcs: VcsSettings,
    pub use_sudo: bool,
    /// Archives kept by retention when the caller gives no override.
    pub keep: u32,
    pub verbose_tasks: bool,
    pub webserver: WebserverKind,
    pub linux_flavor: Option<LinuxFlavor>,
    /// File touched to make the application reload, relative to the current release.
    pub reload_file: String,
    pub archive_db_dump: bool,
    pub command_timeout: Duration,
    pub django: Option<DjangoLayout>,
    pub test_command: String,
}

impl Environment {
    pub(super) fn resolve(config: &Config, name: &str, env: &EnvironmentConfig) -> Result<Self> {
        let env_name =
            EnvironmentName::new(name).map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let root = match (&env.project_root, &config.project_root, &config.server_home) {
            (Some(root), _, _) | (None, Some(root), _) => root.clone(),
            (None, None, Some(home)) => home.join(&config.project_name),
            (None, None, None) => {
                return Err(Error::InvalidConfig(
                    "either server_home or project_root must be set".to_string(),
                ));
            }
        };
        if !root.is_absolute() {
            return Err(Error::InvalidConfig(format!(
                "project root must be an absolute path, got {root}"
            )));
        }

        let kind = VcsKind::parse(&config.vcs)?;
        let cvs = match (kind, &config.cvs) {
            (VcsKind::Cvs, None) => {
                return Err(Error::InvalidConfig(
                    "vcs is cvs but no cvs section is configured".to_string(),
                ));
            }
            (_, Some(cvs)) => Some(CvsSettings {
                connection_type: cvs.connection_type.clone(),
                user: cvs.user.clone(),
                repo_path: cvs.repo_path.clone(),
                module: cvs.module.clone(),
                rsh: cvs.rsh.clone(),
            }),
            (_, None) => None,
        };

        let svn_password = match &config.svn.password {
            Some(secret) => secret.resolve()?,
            None => None,
        };

        let default_branch = env
            .default_branch
            .clone()
            .or_else(|| config.default_branch.get(name).cloned())
            .unwrap_or_else(|| "master".to_string());

        let django = (config.project_type == ProjectType::Django).then(|| {
            let relative_dir = config
                .django
                .relative_dir
                .clone()
                .unwrap_or_else(|| config.project_name.clone());
            DjangoLayout {
                relative_settings_dir: config
                    .django
                    .relative_settings_dir
                    .clone()
                    .unwrap_or_else(|| relative_dir.clone()),
                relative_dir,
            }
        });

        let linux_flavor = config
            .linux_type
            .as_deref()
            .map(LinuxFlavor::parse)
            .transpose()?;

        Ok(Self {
            name: env_name,
            server: env.host.clone(),
            project_name: config.project_name.clone(),
            project_type: config.project_type,
            layout: ReleaseLayout::under(root),
            vcs: VcsSettings {
                kind,
                repository: config.repository.clone(),
                default_branch,
                cvs,
                svn_user: config.svn.user.clone().filter(|u| !u.is_empty()),
                svn_password,
            },
            use_sudo: env.use_sudo.unwrap_or(config.use_sudo),
            keep: env.keep.unwrap_or(config.keep),
            verbose_tasks: config.verbose,
            webserver: WebserverKind::parse(config.webserver.as_deref())?,
            linux_flavor,
            reload_file: config.reload_file.clone(),
            archive_db_dump: config.archive_db_dump,
            command_timeout: config.command_timeout,
            django,
            test_command: config.test_command.clone(),
        })
    }

    /// Django source directory inside the release rooted at `release`.
    pub fn django_dir(&self, release: &RemotePath) -> Option<RemotePath> {
        self.django
            .as_ref()
            .map(|d| release.join(&d.relative_dir))
    }

    pub fn django_settings_dir(&self, release: &RemotePath) -> Option<RemotePath> {
        self.django
            .as_ref()
            .map(|d| release.join(&d.relative_settings_dir))
    }
}
