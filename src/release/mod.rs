// ABOUTME: Release rotation between next, current, and previous directories.
// ABOUTME: Typestate rotation for deploys and the rollback protocol, driven by ReleaseDirector.

mod clock;
mod director;
mod rollback;
mod rotation;
mod state;

pub use clock::{Clock, SystemClock};
pub use director::ReleaseDirector;
pub use rollback::{RollbackOutcome, RollbackRequest};
pub use rotation::{DeployOutcome, Downtime, Rotation};
pub use state::{CheckedOut, Live, Maintenance, Migrated, Provisioned, Rotated, Staged};

use chrono::{DateTime, Local};

use crate::types::{RemotePath, Revision};

/// Application code checked out at a revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub path: RemotePath,
    pub created_at: DateTime<Local>,
    /// Backend-specific revision, when the backend reports one.
    pub revision: Option<Revision>,
}

impl Release {
    /// The same release after it has been moved to `path`.
    pub fn moved_to(self, path: RemotePath) -> Self {
        Self { path, ..self }
    }
}
