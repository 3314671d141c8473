// ABOUTME: Config values that may be written inline or read from the environment.
// ABOUTME: Used for credentials so they need not live in the project file.

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SecretValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
    },
}

impl SecretValue {
    /// Resolve to a value; an unset variable is an error, an empty one is `None`.
    pub fn resolve(&self) -> Result<Option<String>> {
        let value = match self {
            SecretValue::Literal(s) => s.clone(),
            SecretValue::FromEnv { var } => {
                std::env::var(var).map_err(|_| Error::MissingEnvVar(var.clone()))?
            }
        };
        Ok(Some(value).filter(|v| !v.is_empty()))
    }
}
