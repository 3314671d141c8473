// ABOUTME: Git branch consistency between server, operator, and environment default.
// ABOUTME: Agreement reuses the branch; any mismatch makes the operator pick a remote branch.

use crate::deploy::DeployError;
use crate::prompt::{InteractivePrompt, Validator};
use crate::remote::{Command, Host, LocalExecutor, Tolerance};
use crate::types::{RemotePath, Revision};

/// Name git reports for the branch of a detached HEAD.
const DETACHED: &str = "HEAD";

/// Branch information gathered before a git deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchState {
    pub server_branch: String,
    pub server_commit: String,
    pub local_branch: String,
    pub default_branch: String,
    pub remote_branches: Vec<String>,
}

impl BranchState {
    /// The branch when server, local, and default all name the same one.
    pub fn agreed(&self) -> Option<&str> {
        (self.server_branch == self.local_branch
            && self.local_branch == self.default_branch
            && !self.server_branch.is_empty())
        .then_some(self.server_branch.as_str())
    }

    pub fn server_detached(&self) -> bool {
        self.server_branch == DETACHED
    }

    /// Human-readable description of the mismatch.
    pub fn describe_mismatch(&self) -> String {
        let mut lines = Vec::new();
        if self.server_detached() {
            lines.push("The server git repository is not on a branch".to_string());
        }
        lines.push("Branch mismatch found:".to_string());
        lines.push(format!(
            "* {} is the default branch for this server",
            self.default_branch
        ));
        if self.server_detached() {
            lines.push(format!(
                "* {} is the commit checked out on the server.",
                self.server_commit
            ));
        } else {
            lines.push(format!(
                "* {} is the branch currently checked out on the server",
                self.server_branch
            ));
        }
        lines.push(format!(
            "* {} is the current branch of your local git repo",
            self.local_branch
        ));
        lines.push(String::new());
        lines.push("Available branches are:".to_string());
        lines.extend(self.remote_branches.iter().map(|b| format!("* {b}")));
        lines.join("\n")
    }
}

/// Branch names from `git branch -r` output, without the remote prefix.
///
/// `origin/feature/login` becomes `feature/login`; the symbolic `HEAD` entry is skipped.
pub fn parse_remote_branches(output: &str) -> Vec<String> {
    let mut branches: Vec<String> = Vec::new();
    for line in output.lines() {
        if line.contains(DETACHED) {
            continue;
        }
        let line = line.trim();
        let name = line.split_once('/').map_or(line, |(_, rest)| rest).trim();
        if !name.is_empty() && !branches.iter().any(|b| b == name) {
            branches.push(name.to_string());
        }
    }
    branches
}

fn git_in(dir: &RemotePath, args: &[&str]) -> Command {
    Command::new("git").args(args.iter().copied()).current_dir(dir)
}

/// Gather the three branch views and the remote branch list.
pub async fn gather_branch_state(
    host: Host<'_>,
    local: &dyn LocalExecutor,
    working_copy: &RemotePath,
    default_branch: &str,
) -> Result<BranchState, DeployError> {
    let server_branch = host
        .run_with(
            git_in(working_copy, &["rev-parse", "--abbrev-ref", DETACHED]),
            Tolerance::Warn,
        )
        .await?;
    let server_commit = host
        .run_with(
            git_in(working_copy, &["rev-parse", DETACHED]),
            Tolerance::Warn,
        )
        .await?;
    let local_branch = local
        .run(&Command::new("git").args(["rev-parse", "--abbrev-ref", DETACHED]))
        .await?;
    let remote = host
        .run_with(
            git_in(working_copy, &["branch", "--color=never", "-r"]),
            Tolerance::Warn,
        )
        .await?;

    Ok(BranchState {
        server_branch: server_branch.trimmed().trim().to_string(),
        server_commit: server_commit.trimmed().trim().to_string(),
        local_branch: local_branch.trimmed().trim().to_string(),
        default_branch: default_branch.to_string(),
        remote_branches: parse_remote_branches(&remote.stdout),
    })
}

/// Decide which branch to deploy, asking the operator on any mismatch.
pub async fn resolve_branch(
    host: Host<'_>,
    local: &dyn LocalExecutor,
    prompt: &dyn InteractivePrompt,
    working_copy: &RemotePath,
    default_branch: &str,
) -> Result<Revision, DeployError> {
    let state = gather_branch_state(host, local, working_copy, default_branch).await?;
    let chosen = choose_branch(&state, prompt)?;
    Revision::new(&chosen)
        .map_err(|e| DeployError::Validation(format!("branch '{chosen}': {e}")))
}

/// Pure decision step of [`resolve_branch`].
pub fn choose_branch(
    state: &BranchState,
    prompt: &dyn InteractivePrompt,
) -> Result<String, DeployError> {
    if let Some(branch) = state.agreed() {
        tracing::debug!("server, local, and default branch agree on {}", branch);
        return Ok(branch.to_string());
    }

    if state.remote_branches.is_empty() {
        return Err(DeployError::Precondition(
            "branch mismatch found but the server lists no remote branches to choose from"
                .to_string(),
        ));
    }

    let report = state.describe_mismatch();
    tracing::warn!("{}", report);
    prompt.ask(
        &format!(
            "{report}\n\nWhich branch would you like to use on the server? (or hit Ctrl-C to exit)"
        ),
        Some(state.default_branch.as_str()),
        &Validator::OneOf(state.remote_branches.clone()),
    )
}
