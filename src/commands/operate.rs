// ABOUTME: One-off operator actions against the live release.
// ABOUTME: Database update, requirements, static files, webserver restart, and remote tests.

use super::connection::{Toolkit, connect, disconnect, report_warnings};
use stagehand::config::Config;
use stagehand::deploy::{LiveAction, Orchestrator};
use stagehand::diagnostics::Diagnostics;
use stagehand::error::Result;
use stagehand::output::Output;

pub async fn perform(
    config: &Config,
    environment: &str,
    action: LiveAction,
    mut output: Output,
) -> Result<()> {
    let env = config.environment(environment)?;
    action.validate(&env)?;

    output.start_timer();
    let mut diag = Diagnostics::default();
    output.progress(&format!(
        "Going to {} on {} ({})",
        action.describe(),
        env.project_name,
        env.name
    ));

    let session = connect(&env, &output).await?;
    let result = {
        let toolkit = Toolkit::new(&session, &env);
        match Orchestrator::new(&env, toolkit.capabilities()) {
            Ok(orchestrator) => orchestrator.perform(action).await,
            Err(e) => Err(e),
        }
    };
    disconnect(session, &env.server.host, &mut diag).await;

    result?;
    report_warnings(&diag, &output);
    output.success(&format!("Done: {} on {}", action.describe(), env.name));
    Ok(())
}
