// ABOUTME: Rollback command implementation.
// ABOUTME: Restores an archived release, optionally with its database dump.

use super::connection::{Toolkit, connect, disconnect, report_warnings};
use stagehand::config::Config;
use stagehand::deploy::Orchestrator;
use stagehand::diagnostics::Diagnostics;
use stagehand::error::Result;
use stagehand::output::Output;
use stagehand::release::RollbackRequest;

/// Roll one environment back to an archived release.
pub async fn rollback(
    config: &Config,
    environment: &str,
    request: RollbackRequest,
    mut output: Output,
) -> Result<()> {
    let env = config.environment(environment)?;
    // bad flag combinations fail before connecting
    request.validate()?;

    output.start_timer();
    let mut diag = Diagnostics::default();
    output.progress(&format!(
        "Rolling back {} on {} to {}",
        env.project_name, env.name, request.version
    ));

    let session = connect(&env, &output).await?;
    let result = {
        let toolkit = Toolkit::new(&session, &env);
        match Orchestrator::new(&env, toolkit.capabilities()) {
            Ok(orchestrator) => orchestrator.rollback(&request, &mut diag).await,
            Err(e) => Err(e),
        }
    };
    disconnect(session, &env.server.host, &mut diag).await;

    let outcome = result?;
    if let Some(safety) = &outcome.safety_archive {
        output.progress(&format!("  → Replaced release archived as {}", safety.name));
    }
    if outcome.db_restored {
        output.progress(&format!(
            "  → Database restored from {}",
            outcome.restored.db_dump()
        ));
    }
    report_warnings(&diag, &output);
    output.success(&format!("Rolled back to {}", outcome.restored.name));
    Ok(())
}
