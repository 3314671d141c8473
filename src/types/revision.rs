// ABOUTME: Opaque version-control revision reference.
// ABOUTME: A git branch or commit, svn revision number, or cvs tag; never interpreted here.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("revision cannot be empty")]
    Empty,

    #[error("revision cannot contain whitespace")]
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(value: &str) -> Result<Self, RevisionError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(RevisionError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(RevisionError::Whitespace);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Revision {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Revision::new(s)
    }
}
