// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects tolerated failures that shouldn't fail a workflow but should be shown to users.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an archive-time database dump warning.
    pub fn db_dump(message: impl Into<String>) -> Self {
        Self::new(WarningKind::DbDump, message)
    }

    /// Create a webserver reload warning.
    pub fn service_reload(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ServiceReload, message)
    }

    /// Create a webserver stop warning.
    pub fn service_stop(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ServiceStop, message)
    }

    /// Create a stale artifact cleanup warning.
    pub fn artifact_cleanup(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ArtifactCleanup, message)
    }

    /// Create an archive deletion warning.
    pub fn prune_failure(message: impl Into<String>) -> Self {
        Self::new(WarningKind::PruneFailure, message)
    }

    /// Create an SSH disconnect warning.
    pub fn ssh_disconnect(message: impl Into<String>) -> Self {
        Self::new(WarningKind::SshDisconnect, message)
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Archive-time database dump failed; the archive has no dump.
    DbDump,
    /// Webserver reload failed while the config was being swapped.
    ServiceReload,
    /// Webserver could not be stopped before a clean deploy.
    ServiceStop,
    /// Stale compiled files could not be removed.
    ArtifactCleanup,
    /// An old archive could not be deleted.
    PruneFailure,
    /// Failed to cleanly disconnect SSH session.
    SshDisconnect,
}
