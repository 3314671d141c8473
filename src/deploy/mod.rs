// ABOUTME: Top-level deployment workflows: deploy, clean deploy, rollback, and inspection.
// ABOUTME: Composes version control, release rotation, and retention behind one orchestrator.

mod action;
mod capabilities;
mod error;
mod orchestrator;

pub use action::LiveAction;
pub use capabilities::Capabilities;
pub use error::{DeployError, DeployErrorKind};
pub use orchestrator::{DeployReport, DeployRequest, Orchestrator, refuse_clean_on_production};
