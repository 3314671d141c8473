// ABOUTME: POSIX path on the remote host.
// ABOUTME: Kept separate from std::path so local path semantics never leak in.

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = if value.len() > 1 {
            value.trim_end_matches('/').to_string()
        } else {
            value
        };
        Self(trimmed)
    }

    pub fn join(&self, segment: &str) -> RemotePath {
        let segment = segment.trim_start_matches('/');
        if self.0.ends_with('/') {
            RemotePath::new(format!("{}{}", self.0, segment))
        } else {
            RemotePath::new(format!("{}/{}", self.0, segment))
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RemotePath {
    fn from(value: &str) -> Self {
        RemotePath::new(value)
    }
}
