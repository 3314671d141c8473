// ABOUTME: Read-mostly commands: list archives, show the deployed revision, check, and prune.
// ABOUTME: Each opens a session, runs one orchestrator call, and prints its result.

use super::connection::{Toolkit, connect, disconnect, report_warnings};
use stagehand::config::Config;
use stagehand::deploy::Orchestrator;
use stagehand::diagnostics::Diagnostics;
use stagehand::error::Result;
use stagehand::output::Output;

/// List archived releases, oldest first.
pub async fn list(config: &Config, environment: &str, output: Output) -> Result<()> {
    let env = config.environment(environment)?;
    let mut diag = Diagnostics::default();

    let session = connect(&env, &output).await?;
    let result = {
        let toolkit = Toolkit::new(&session, &env);
        match Orchestrator::new(&env, toolkit.capabilities()) {
            Ok(orchestrator) => orchestrator.list().await,
            Err(e) => Err(e),
        }
    };
    disconnect(session, &env.server.host, &mut diag).await;

    let archives = result?;
    if archives.is_empty() {
        output.progress(&format!("No archived releases in {}", env.layout.previous));
    }
    for name in &archives {
        output.item(name.as_str());
    }
    report_warnings(&diag, &output);
    Ok(())
}

/// Print the head of the deployed revision log.
pub async fn version(config: &Config, environment: &str, output: Output) -> Result<()> {
    let env = config.environment(environment)?;
    let mut diag = Diagnostics::default();

    let session = connect(&env, &output).await?;
    let result = {
        let toolkit = Toolkit::new(&session, &env);
        match Orchestrator::new(&env, toolkit.capabilities()) {
            Ok(orchestrator) => orchestrator.version().await,
            Err(e) => Err(e),
        }
    };
    disconnect(session, &env.server.host, &mut diag).await;

    output.item(&result?);
    report_warnings(&diag, &output);
    Ok(())
}

/// Run the pre-deploy local changes and branch checks on their own.
pub async fn check(config: &Config, environment: &str, output: Output) -> Result<()> {
    let env = config.environment(environment)?;
    let mut diag = Diagnostics::default();

    let session = connect(&env, &output).await?;
    let result = {
        let toolkit = Toolkit::new(&session, &env);
        match Orchestrator::new(&env, toolkit.capabilities()) {
            Ok(orchestrator) => orchestrator.check().await,
            Err(e) => Err(e),
        }
    };
    disconnect(session, &env.server.host, &mut diag).await;

    let message = match result? {
        Some(branch) => format!("Working copy is clean; next deploy uses {branch}"),
        None => "Working copy is clean".to_string(),
    };
    report_warnings(&diag, &output);
    output.success(&message);
    Ok(())
}

/// Delete archives beyond the retention count.
pub async fn prune(
    config: &Config,
    environment: &str,
    keep: Option<u32>,
    output: Output,
) -> Result<()> {
    let env = config.environment(environment)?;
    let mut diag = Diagnostics::default();

    let session = connect(&env, &output).await?;
    let result = {
        let toolkit = Toolkit::new(&session, &env);
        match Orchestrator::new(&env, toolkit.capabilities()) {
            Ok(orchestrator) => orchestrator.prune(keep, &mut diag).await,
            Err(e) => Err(e),
        }
    };
    disconnect(session, &env.server.host, &mut diag).await;

    let report = result?;
    for name in &report.removed {
        output.progress(&format!("  → Removed {name}"));
    }
    report_warnings(&diag, &output);
    output.success(&format!(
        "Pruned {} archive(s), {} kept",
        report.removed.len(),
        report.kept.len()
    ));
    Ok(())
}
