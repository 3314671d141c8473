// ABOUTME: Pre-deploy check for uncommitted changes in the live working copy.
// ABOUTME: Non-empty status needs operator confirmation; git also runs the branch check.

use super::{VcsKind, VersionControl, branch};
use crate::deploy::DeployError;
use crate::prompt::{InteractivePrompt, confirm_or_abort};
use crate::remote::{Host, LocalExecutor};
use crate::types::{RemotePath, Revision};

/// Look for local modifications in `working_copy` before anything is touched.
///
/// Returns the branch resolved by the git branch check, if one ran.
pub async fn check_for_local_changes(
    vcs: &dyn VersionControl,
    host: Host<'_>,
    local: &dyn LocalExecutor,
    prompt: &dyn InteractivePrompt,
    working_copy: &RemotePath,
    default_branch: &str,
) -> Result<Option<Revision>, DeployError> {
    let kind = vcs.kind();
    let Some(status) = vcs.status_command() else {
        tracing::warn!(
            "no status command for {}: skipping the local changes check",
            kind
        );
        return Ok(None);
    };

    if !host.exists(&working_copy.join(kind.metadata_dir())).await? {
        tracing::debug!("no {} working copy at {}", kind, working_copy);
        return Ok(None);
    }

    let output = host.run(status.current_dir(working_copy)).await?;
    let changes = output.trimmed();
    if !changes.trim().is_empty() {
        tracing::warn!("found local changes on the server:\n{}", changes);
        confirm_or_abort(
            prompt,
            &format!(
                "Found local changes on the server:\n{changes}\nWould you like to continue with deployment? (yes/no)"
            ),
            "Aborting deployment",
        )?;
    }

    if kind == VcsKind::Git {
        let branch =
            branch::resolve_branch(host, local, prompt, working_copy, default_branch).await?;
        return Ok(Some(branch));
    }
    Ok(None)
}
