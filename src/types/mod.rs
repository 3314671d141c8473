// ABOUTME: Validated domain types shared across the deployment core.
// ABOUTME: Archive names, revisions, environment names, and remote paths.

mod archive_name;
mod environment_name;
mod remote_path;
mod revision;

pub use archive_name::{ARCHIVE_NAME_FORMAT, ArchiveName, ArchiveNameError};
pub use environment_name::{EnvironmentName, EnvironmentNameError};
pub use remote_path::RemotePath;
pub use revision::{Revision, RevisionError};
