// ABOUTME: Deploy and clean deploy command implementations.
// ABOUTME: Connects, runs the orchestrator, and reports downtime and warnings.

use super::connection::{Toolkit, connect, disconnect, report_warnings};
use stagehand::config::Config;
use stagehand::deploy::{DeployReport, DeployRequest, Orchestrator, refuse_clean_on_production};
use stagehand::diagnostics::Diagnostics;
use stagehand::error::Result;
use stagehand::output::Output;

/// Deploy a new release to one environment.
pub async fn deploy(
    config: &Config,
    environment: &str,
    request: DeployRequest,
    output: Output,
) -> Result<()> {
    run(config, environment, request, false, output).await
}

/// Wipe the environment and deploy from scratch.
pub async fn deploy_clean(
    config: &Config,
    environment: &str,
    request: DeployRequest,
    output: Output,
) -> Result<()> {
    run(config, environment, request, true, output).await
}

async fn run(
    config: &Config,
    environment: &str,
    request: DeployRequest,
    clean: bool,
    mut output: Output,
) -> Result<()> {
    let env = config.environment(environment)?;
    if clean {
        refuse_clean_on_production(&env)?;
    }
    output.start_timer();
    let mut diag = Diagnostics::default();

    output.progress(&format!(
        "{} {} to {} ({})",
        if clean { "Clean deploying" } else { "Deploying" },
        env.project_name,
        env.name,
        env.server.host
    ));

    let session = connect(&env, &output).await?;
    let result = {
        let toolkit = Toolkit::new(&session, &env);
        match Orchestrator::new(&env, toolkit.capabilities()) {
            Ok(orchestrator) if clean => orchestrator.deploy_clean(&request, &mut diag).await,
            Ok(orchestrator) => orchestrator.deploy(&request, &mut diag).await,
            Err(e) => Err(e),
        }
    };
    disconnect(session, &env.server.host, &mut diag).await;

    let report = result?;
    print_report(&report, &output);
    report_warnings(&diag, &output);
    output.success("Deployment complete!");
    Ok(())
}

fn print_report(report: &DeployReport, output: &Output) {
    let outcome = &report.outcome;
    match &outcome.archived {
        Some(archived) => output.progress(&format!("  → Previous release archived as {}", archived.name)),
        None => output.progress("  → First deploy, nothing archived"),
    }
    if let Some(revision) = &outcome.release.revision {
        output.progress(&format!("  → Deployed {revision}"));
    }
    if !report.prune.removed.is_empty() {
        output.progress(&format!(
            "  → Pruned {} old archive(s)",
            report.prune.removed.len()
        ));
    }
    output.downtime(&outcome.downtime);
}
