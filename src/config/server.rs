// ABOUTME: SSH endpoint of one deployment environment.
// ABOUTME: Parses formats like "host", "user@host", "host:port", "user@host:port".

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::ssh::SessionConfig;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    #[serde(default)]
    pub trust_first_connection: bool,
}

fn default_port() -> u16 {
    22
}

impl ServerConfig {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("server address cannot be empty".to_string());
        }

        // Parse format: [user@]host[:port]
        let (user, rest) = match s.split_once('@') {
            Some((user, rest)) if !user.is_empty() => (Some(user.to_string()), rest),
            Some(_) => return Err("user before '@' cannot be empty".to_string()),
            None => (None, s),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port: {}", port))?;
                (host, port)
            }
            None => (rest, default_port()),
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        Ok(ServerConfig {
            host: host.to_string(),
            port,
            user,
            key_path: None,
            trust_first_connection: false,
        })
    }

    /// Login user, falling back to the operator's `$USER`.
    pub fn login_user(&self) -> String {
        self.user
            .clone()
            .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "root".to_string()))
    }

    pub fn ssh_session_config(&self, command_timeout: Duration) -> SessionConfig {
        let config = SessionConfig::new(&self.host, self.login_user())
            .port(self.port)
            .trust_on_first_use(self.trust_first_connection)
            .command_timeout(command_timeout);
        match &self.key_path {
            Some(path) => config.key_path(path),
            None => config,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerEntry {
    Simple(String),
    Detailed(ServerConfig),
}

pub(super) fn deserialize_server<'de, D>(deserializer: D) -> Result<ServerConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match ServerEntry::deserialize(deserializer)? {
        ServerEntry::Simple(s) => ServerConfig::parse(&s).map_err(serde::de::Error::custom),
        ServerEntry::Detailed(c) => Ok(c),
    }
}
