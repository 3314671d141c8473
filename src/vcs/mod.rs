// ABOUTME: Version control adapter over git, svn, and cvs working copies.
// ABOUTME: One backend per VCS behind a single checkout-or-update interface.

mod branch;
mod changes;
mod cvs;
mod git;
mod svn;

pub use branch::{
    BranchState, choose_branch, gather_branch_state, parse_remote_branches, resolve_branch,
};
pub use changes::check_for_local_changes;
pub use cvs::Cvs;
pub use git::Git;
pub use svn::Svn;

use async_trait::async_trait;

use crate::config::VcsSettings;
use crate::deploy::DeployError;
use crate::prompt::InteractivePrompt;
use crate::remote::{Command, Host};
use crate::types::{RemotePath, Revision};

/// Supported version control systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsKind {
    Git,
    Svn,
    Cvs,
}

impl VcsKind {
    pub fn parse(name: &str) -> Result<Self, DeployError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "git" => Ok(VcsKind::Git),
            "svn" => Ok(VcsKind::Svn),
            "cvs" => Ok(VcsKind::Cvs),
            _ => Err(DeployError::unsupported_vcs(name)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VcsKind::Git => "git",
            VcsKind::Svn => "svn",
            VcsKind::Cvs => "cvs",
        }
    }

    /// Directory marking a working copy of this kind.
    pub fn metadata_dir(&self) -> &'static str {
        match self {
            VcsKind::Git => ".git",
            VcsKind::Svn => ".svn",
            VcsKind::Cvs => "CVS",
        }
    }
}

impl std::fmt::Display for VcsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a backend needs from the outside world for one call.
#[derive(Clone, Copy)]
pub struct VcsContext<'a> {
    pub host: Host<'a>,
    pub prompt: &'a dyn InteractivePrompt,
    /// Directory fresh checkouts are started from.
    pub project_root: &'a RemotePath,
}

/// One version control backend.
#[async_trait]
pub trait VersionControl: Send + Sync {
    fn kind(&self) -> VcsKind;

    /// Bring `target` to `revision`, cloning when no working copy exists.
    ///
    /// Returns the revision the working copy was left at, when known.
    async fn checkout_or_update(
        &self,
        ctx: VcsContext<'_>,
        target: &RemotePath,
        revision: Option<&Revision>,
    ) -> Result<Option<Revision>, DeployError>;

    /// Command listing uncommitted changes, run inside the working copy.
    fn status_command(&self) -> Option<Command>;

    /// Head of the revision log for the working copy at `working_copy`.
    async fn log(
        &self,
        ctx: VcsContext<'_>,
        working_copy: &RemotePath,
    ) -> Result<String, DeployError>;
}

/// Build the backend configured for an environment.
pub fn backend(settings: &VcsSettings) -> Result<Box<dyn VersionControl>, DeployError> {
    Ok(match settings.kind {
        VcsKind::Git => Box::new(Git::new(
            settings.repository.clone(),
            settings.default_branch.clone(),
        )),
        VcsKind::Svn => Box::new(Svn::new(
            settings.repository.clone(),
            settings.svn_user.clone(),
            settings.svn_password.clone(),
        )),
        VcsKind::Cvs => {
            let cvs = settings.cvs.clone().ok_or_else(|| {
                DeployError::Precondition("vcs is cvs but no cvs settings are configured".into())
            })?;
            Box::new(Cvs::new(settings.repository.clone(), cvs))
        }
    })
}
