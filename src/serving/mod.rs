// ABOUTME: Serving layer control: webserver start/stop/reload/restart and config linking.
// ABOUTME: Apache on redhat or debian hosts, or a no-op when no webserver is managed.

mod apache;

pub use apache::Apache;

use async_trait::async_trait;

use crate::config::Environment;
use crate::deploy::DeployError;
use crate::remote::{CommandOutput, Host, Tolerance};

/// Webserver configured for an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebserverKind {
    /// Nothing to link or reload.
    Disabled,
    Apache,
}

impl WebserverKind {
    pub fn parse(name: Option<&str>) -> Result<Self, DeployError> {
        match name.map(|n| n.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("none") => Ok(WebserverKind::Disabled),
            Some("apache") => Ok(WebserverKind::Apache),
            Some(_) => Err(DeployError::unsupported_webserver(name.unwrap_or_default())),
        }
    }
}

/// Linux distribution family, which decides config and init script locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinuxFlavor {
    Redhat,
    Debian,
}

impl LinuxFlavor {
    pub fn parse(name: &str) -> Result<Self, DeployError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "redhat" => Ok(LinuxFlavor::Redhat),
            "debian" => Ok(LinuxFlavor::Debian),
            other => Err(DeployError::UnsupportedBackend {
                kind: "linux type",
                name: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LinuxFlavor::Redhat => "redhat",
            LinuxFlavor::Debian => "debian",
        }
    }
}

/// Control over whatever serves the application.
///
/// Service actions take a [`Tolerance`] so callers can keep going when, for
/// example, a reload fails while the config is half swapped.
#[async_trait]
pub trait ServingLayerControl: Send + Sync {
    async fn start(&self, tolerance: Tolerance) -> Result<CommandOutput, DeployError>;

    async fn stop(&self, tolerance: Tolerance) -> Result<CommandOutput, DeployError>;

    async fn reload(&self, tolerance: Tolerance) -> Result<CommandOutput, DeployError>;

    async fn restart(&self, tolerance: Tolerance) -> Result<CommandOutput, DeployError>;

    /// Point the webserver at the live or maintenance config of the current release.
    async fn link_config(&self, maintenance: bool) -> Result<(), DeployError>;

    async fn config_test(&self) -> Result<(), DeployError>;
}

/// Used when no webserver is managed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Disabled;

#[async_trait]
impl ServingLayerControl for Disabled {
    async fn start(&self, _tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        Ok(CommandOutput::default())
    }

    async fn stop(&self, _tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        Ok(CommandOutput::default())
    }

    async fn reload(&self, _tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        Ok(CommandOutput::default())
    }

    async fn restart(&self, _tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        tracing::info!("no webserver managed; nothing to restart");
        Ok(CommandOutput::default())
    }

    async fn link_config(&self, _maintenance: bool) -> Result<(), DeployError> {
        Ok(())
    }

    async fn config_test(&self) -> Result<(), DeployError> {
        Ok(())
    }
}

/// Serving layer for `env` on `host`.
pub fn for_environment<'a>(
    env: &Environment,
    host: Host<'a>,
) -> Box<dyn ServingLayerControl + 'a> {
    match env.webserver {
        WebserverKind::Disabled => Box::new(Disabled),
        WebserverKind::Apache => Box::new(Apache::new(host, env)),
    }
}
