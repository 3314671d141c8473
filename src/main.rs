// ABOUTME: Entry point for the stagehand CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use stagehand::config::{self, Config};
use stagehand::deploy::{DeployRequest, LiveAction};
use stagehand::error::Result;
use stagehand::output::{Output, OutputMode};
use stagehand::release::RollbackRequest;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli.command, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, mode: OutputMode) -> Result<()> {
    let cwd = env::current_dir()?;
    let output = Output::new(mode);

    match command {
        Commands::Init { project, force } => {
            config::init_config(&cwd, project.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy {
            environment,
            revision,
            keep,
        } => {
            let config = Config::discover(&cwd)?;
            let request = DeployRequest { revision, keep };
            commands::deploy(&config, &environment, request, output).await
        }
        Commands::DeployClean {
            environment,
            revision,
        } => {
            let config = Config::discover(&cwd)?;
            let request = DeployRequest {
                revision,
                keep: None,
            };
            commands::deploy_clean(&config, &environment, request, output).await
        }
        Commands::Rollback {
            environment,
            version,
            migrate,
            restore_db,
        } => {
            let config = Config::discover(&cwd)?;
            let request = RollbackRequest {
                version,
                migrate,
                restore_db,
            };
            commands::rollback(&config, &environment, request, output).await
        }
        Commands::List { environment } => {
            let config = Config::discover(&cwd)?;
            commands::list(&config, &environment, output).await
        }
        Commands::Version { environment } => {
            let config = Config::discover(&cwd)?;
            commands::version(&config, &environment, output).await
        }
        Commands::Check { environment } => {
            let config = Config::discover(&cwd)?;
            commands::check(&config, &environment, output).await
        }
        Commands::Prune { environment, keep } => {
            let config = Config::discover(&cwd)?;
            commands::prune(&config, &environment, keep, output).await
        }
        Commands::UpdateDb {
            environment,
            force_use_migrations,
        } => {
            let config = Config::discover(&cwd)?;
            let action = LiveAction::UpdateDb {
                force_use_migrations,
            };
            commands::perform(&config, &environment, action, output).await
        }
        Commands::UpdateRequirements { environment } => {
            let config = Config::discover(&cwd)?;
            commands::perform(&config, &environment, LiveAction::UpdateRequirements, output).await
        }
        Commands::CollectStatic { environment } => {
            let config = Config::discover(&cwd)?;
            commands::perform(&config, &environment, LiveAction::CollectStatic, output).await
        }
        Commands::Restart { environment } => {
            let config = Config::discover(&cwd)?;
            commands::perform(&config, &environment, LiveAction::RestartWebserver, output).await
        }
        Commands::RemoteTest { environment } => {
            let config = Config::discover(&cwd)?;
            commands::perform(&config, &environment, LiveAction::RemoteTest, output).await
        }
    }
}
