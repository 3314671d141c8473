// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use stagehand::types::Revision;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Near-zero-downtime release rotation for web applications over SSH")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new stagehand.yml configuration file
    Init {
        /// Project name to put in the template
        #[arg(short, long)]
        project: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Check out, provision, and rotate a new release into place
    Deploy {
        /// Environment to deploy to (defined in config)
        environment: String,

        /// Revision to deploy (branch, commit, tag, or svn revision)
        #[arg(short, long)]
        revision: Option<Revision>,

        /// Archives to keep after the deploy (0 keeps all)
        #[arg(short, long)]
        keep: Option<u32>,
    },

    /// Wipe the database and project files, then deploy (never on production)
    DeployClean {
        /// Environment to deploy to (defined in config)
        environment: String,

        /// Revision to deploy
        #[arg(short, long)]
        revision: Option<Revision>,
    },

    /// Restore an archived release
    Rollback {
        /// Environment to roll back (defined in config)
        environment: String,

        /// Archive name to restore, or "last" for the most recent
        #[arg(long, default_value = "last")]
        version: String,

        /// Migrate the database back to the restored release (not supported)
        #[arg(long)]
        migrate: bool,

        /// Restore the database dump taken with the archive
        #[arg(long)]
        restore_db: bool,
    },

    /// List archived releases available for rollback
    List {
        /// Environment to inspect (defined in config)
        environment: String,
    },

    /// Show the deployed revision
    Version {
        /// Environment to inspect (defined in config)
        environment: String,
    },

    /// Check the live working copy for local changes and branch mismatches
    Check {
        /// Environment to inspect (defined in config)
        environment: String,
    },

    /// Delete old archives beyond the retention count
    Prune {
        /// Environment to prune (defined in config)
        environment: String,

        /// Archives to keep (0 keeps all)
        #[arg(short, long)]
        keep: Option<u32>,
    },

    /// Run the database update task in the live release
    UpdateDb {
        /// Environment to update (defined in config)
        environment: String,

        /// Apply migrations even where the task would skip them
        #[arg(long)]
        force_use_migrations: bool,
    },

    /// Update the live release's virtualenv from its requirements
    UpdateRequirements {
        /// Environment to update (defined in config)
        environment: String,
    },

    /// Collect static files in the live release
    CollectStatic {
        /// Environment to update (defined in config)
        environment: String,
    },

    /// Restart the webserver
    Restart {
        /// Environment whose webserver restarts (defined in config)
        environment: String,
    },

    /// Run the project's tests on the host (never on production)
    RemoteTest {
        /// Environment to test on (defined in config)
        environment: String,
    },
}
