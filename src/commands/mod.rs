// ABOUTME: Command module aggregator for the stagehand CLI.
// ABOUTME: Re-exports deploy, rollback, inspection, and live action command handlers.

mod connection;
mod deploy;
mod inspect;
mod operate;
mod rollback;

pub use deploy::{deploy, deploy_clean};
pub use inspect::{check, list, prune, version};
pub use operate::perform;
pub use rollback::rollback;
