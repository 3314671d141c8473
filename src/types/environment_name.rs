// ABOUTME: Deployment environment names such as staging and production.
// ABOUTME: Names appear in paths and config file names, so separators are rejected.

use std::fmt;
use thiserror::Error;

const PRODUCTION: &str = "production";

#[derive(Debug, Error)]
pub enum EnvironmentNameError {
    #[error("environment name cannot be empty")]
    Empty,

    #[error("invalid character in environment name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentName(String);

impl EnvironmentName {
    pub fn new(value: &str) -> Result<Self, EnvironmentNameError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(EnvironmentNameError::Empty);
        }

        for c in trimmed.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
                return Err(EnvironmentNameError::InvalidChar(c));
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Production gets scheduled dumps and refuses destructive workflows.
    pub fn is_production(&self) -> bool {
        self.0 == PRODUCTION
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
