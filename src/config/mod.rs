// ABOUTME: Configuration types and parsing for stagehand.yml.
// ABOUTME: Handles YAML parsing, discovery, and resolution into an immutable Environment.

mod environment;
mod init;
mod secret;
mod server;

pub use environment::{
    CURRENT_DIR_NAME, CvsSettings, DUMP_DIR_NAME, DjangoLayout, Environment, NEXT_DIR_NAME,
    PREVIOUS_DIR_NAME, ReleaseLayout, VcsSettings,
};
pub use init::init_config;
pub use secret::SecretValue;
pub use server::ServerConfig;

use crate::error::{Error, Result};
use crate::types::RemotePath;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "stagehand.yml";
pub const CONFIG_FILENAME_ALT: &str = "stagehand.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".stagehand/config.yml";

pub const DEFAULT_KEEP: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Django,
    #[default]
    Generic,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub project_name: String,

    #[serde(default)]
    pub project_type: ProjectType,

    #[serde(default)]
    pub server_home: Option<RemotePath>,

    #[serde(default)]
    pub project_root: Option<RemotePath>,

    /// Backend name; checked when an environment is resolved.
    pub vcs: String,

    pub repository: String,

    /// Environment name to branch.
    #[serde(default)]
    pub default_branch: HashMap<String, String>,

    #[serde(default)]
    pub cvs: Option<CvsConfig>,

    #[serde(default)]
    pub svn: SvnConfig,

    #[serde(default = "default_true")]
    pub use_sudo: bool,

    #[serde(default = "default_keep")]
    pub keep: u32,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub webserver: Option<String>,

    #[serde(default)]
    pub linux_type: Option<String>,

    #[serde(default = "default_reload_file")]
    pub reload_file: String,

    #[serde(default = "default_true")]
    pub archive_db_dump: bool,

    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,

    #[serde(default)]
    pub django: DjangoConfig,

    /// Arguments to python for `remote-test`, run from the django directory.
    #[serde(default = "default_test_command")]
    pub test_command: String,

    pub environments: HashMap<String, EnvironmentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(deserialize_with = "server::deserialize_server")]
    pub host: ServerConfig,

    #[serde(default)]
    pub default_branch: Option<String>,

    #[serde(default)]
    pub keep: Option<u32>,

    #[serde(default)]
    pub use_sudo: Option<bool>,

    #[serde(default)]
    pub project_root: Option<RemotePath>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CvsConfig {
    pub connection_type: String,
    #[serde(default)]
    pub user: Option<String>,
    pub repo_path: String,
    pub module: String,
    #[serde(default = "default_cvs_rsh")]
    pub rsh: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SvnConfig {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<SecretValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DjangoConfig {
    #[serde(default)]
    pub relative_dir: Option<String>,
    #[serde(default)]
    pub relative_settings_dir: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_keep() -> u32 {
    DEFAULT_KEEP
}

fn default_reload_file() -> String {
    "wsgi/wsgi_handler.py".to_string()
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_test_command() -> String {
    "manage.py test".to_string()
}

fn default_cvs_rsh() -> String {
    "ssh".to_string()
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading configuration from {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Resolve the named environment.
    pub fn environment(&self, name: &str) -> Result<Environment> {
        let env = self
            .environments
            .get(name)
            .ok_or_else(|| Error::UnknownEnvironment {
                name: name.to_string(),
                known: self.environment_names().join(", "),
            })?;
        Environment::resolve(self, name, env)
    }

    /// Configured environment names, sorted.
    pub fn environment_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.environments.keys().cloned().collect();
        names.sort();
        names
    }
}
