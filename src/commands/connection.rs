// ABOUTME: Shared helpers for opening and closing the SSH session to an environment.
// ABOUTME: Verifies passwordless sudo up front when the environment uses it.

use snafu::ResultExt;
use stagehand::config::Environment;
use stagehand::deploy::Capabilities;
use stagehand::diagnostics::{Diagnostics, Warning};
use stagehand::error::Result;
use stagehand::output::Output;
use stagehand::prompt::TerminalPrompt;
use stagehand::release::SystemClock;
use stagehand::remote::{
    Command, ConnectError, Host, ProbeSnafu, ProcessExecutor, RemoteExecutor, SessionSnafu,
    Tolerance,
};
use stagehand::serving::{self, ServingLayerControl};
use stagehand::ssh::Session;
use stagehand::tasks::TasksScript;

/// Connect to the environment's host.
pub async fn connect(env: &Environment, output: &Output) -> Result<Session> {
    let server = &env.server;
    output.progress(&format!(
        "  → Connecting to {} ({})...",
        server.host, env.name
    ));

    let session = Session::connect(server.ssh_session_config(env.command_timeout))
        .await
        .context(SessionSnafu {
            host: server.host.clone(),
        })?;

    if env.use_sudo {
        ensure_sudo(&session, &server.host).await?;
    }
    Ok(session)
}

async fn ensure_sudo(session: &Session, host: &str) -> std::result::Result<(), ConnectError> {
    session
        .run_privileged(&Command::new("true"), Tolerance::Abort)
        .await
        .map(drop)
        .context(ProbeSnafu {
            host: host.to_string(),
        })
}

/// Close the session; failure is only a warning.
pub async fn disconnect(session: Session, host: &str, diag: &mut Diagnostics) {
    if let Err(e) = session.disconnect().await {
        diag.warn(Warning::ssh_disconnect(format!(
            "SSH disconnect failed for {}: {}",
            host, e
        )));
    }
}

/// Print collected warnings.
pub fn report_warnings(diag: &Diagnostics, output: &Output) {
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
}

/// Collaborators backed by the SSH session and the operator's terminal.
pub struct Toolkit<'a> {
    host: Host<'a>,
    serving: Box<dyn ServingLayerControl + 'a>,
    tasks: TasksScript<'a>,
}

impl<'a> Toolkit<'a> {
    pub fn new(session: &'a Session, env: &Environment) -> Self {
        let host = Host::new(session, session, env.use_sudo);
        Self {
            host,
            serving: serving::for_environment(env, host),
            tasks: TasksScript::new(host, env.verbose_tasks),
        }
    }

    pub fn capabilities(&self) -> Capabilities<'_> {
        Capabilities {
            host: self.host,
            local: &ProcessExecutor,
            prompt: &TerminalPrompt,
            serving: self.serving.as_ref(),
            tasks: &self.tasks,
            clock: &SystemClock,
        }
    }
}
