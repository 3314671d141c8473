// ABOUTME: Rotation state types for the type state pattern.
// ABOUTME: Each state carries the data that is guaranteed to exist at that point.

use chrono::{DateTime, Local};

use super::Release;
use super::rotation::Downtime;
use crate::retention::ArchivedRelease;

/// The next directory is prepared from the current release (if any).
/// Available actions: `checkout()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Staged;

/// The next directory holds the requested revision.
/// Available actions: `provision()`
#[derive(Debug, Clone)]
pub struct CheckedOut {
    pub(crate) release: Release,
}

/// Dependencies are installed into the next directory.
/// Available actions: `enter_maintenance()`
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub(crate) release: Release,
}

/// Routing is disabled and the downtime clock is running.
/// Available actions: `rotate()`
#[derive(Debug, Clone)]
pub struct Maintenance {
    pub(crate) release: Release,
    pub(crate) downtime_start: DateTime<Local>,
    /// Name of the archive the current release moves into, checked free.
    pub(crate) archive_at: DateTime<Local>,
}

/// The old release is archived and the new one is current.
/// Available actions: `migrate()`
#[derive(Debug, Clone)]
pub struct Rotated {
    pub(crate) release: Release,
    pub(crate) archived: Option<ArchivedRelease>,
    pub(crate) downtime_start: DateTime<Local>,
}

/// Environment deploy task (migrations included) has run against the current release.
/// Available actions: `go_live()`
#[derive(Debug, Clone)]
pub struct Migrated {
    pub(crate) release: Release,
    pub(crate) archived: Option<ArchivedRelease>,
    pub(crate) downtime_start: DateTime<Local>,
}

/// Routing is back and the application was told to reload.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Live {
    pub(crate) release: Release,
    pub(crate) archived: Option<ArchivedRelease>,
    pub(crate) downtime: Downtime,
}
