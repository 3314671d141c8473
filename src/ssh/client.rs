// ABOUTME: SSH session over russh implementing the remote execution capabilities.
// ABOUTME: Handles connection, authentication, privilege selection, and command execution.

use async_trait::async_trait;
use russh::client::{self, Config, Handle};
use russh::keys::agent::client::AgentClient;
use russh::keys::known_hosts::{
    check_known_hosts, check_known_hosts_path, learn_known_hosts, learn_known_hosts_path,
};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use russh::{ChannelMsg, Disconnect};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;

use super::error::{Error, Result};
use crate::deploy::DeployError;
use crate::remote::{
    Command, CommandOutput, FileProbe, RemoteExecutor, Tolerance, check_output, shell_quote,
};
use crate::types::RemotePath;

/// Configuration for establishing an SSH session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Private key file; agent and default keys are tried when unset.
    pub key_path: Option<PathBuf>,
    /// Accept and record unknown host keys.
    pub trust_on_first_use: bool,
    /// Defaults to ~/.ssh/known_hosts.
    pub known_hosts_path: Option<PathBuf>,
    pub command_timeout: Duration,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            key_path: None,
            trust_on_first_use: false,
            known_hosts_path: None,
            command_timeout: Duration::from_secs(300),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn trust_on_first_use(mut self, tofu: bool) -> Self {
        self.trust_on_first_use = tofu;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

pub(crate) struct HostKeyCheck {
    host: String,
    port: u16,
    trust_on_first_use: bool,
    known_hosts_path: Option<PathBuf>,
}

impl HostKeyCheck {
    fn learn(&self, key: &ssh_key::PublicKey) {
        let learned = match &self.known_hosts_path {
            Some(path) => learn_known_hosts_path(&self.host, self.port, key, path),
            None => learn_known_hosts(&self.host, self.port, key),
        };
        if let Err(e) = learned {
            tracing::warn!("failed to save host key to known_hosts: {}", e);
        }
    }
}

impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let known = match &self.known_hosts_path {
            Some(path) => check_known_hosts_path(&self.host, self.port, server_public_key, path),
            None => check_known_hosts(&self.host, self.port, server_public_key),
        };

        match known {
            Ok(true) => Ok(true),
            Ok(false) if self.trust_on_first_use => {
                tracing::warn!(
                    "trust-on-first-use: accepting unknown host key for {}:{}",
                    self.host,
                    self.port
                );
                self.learn(server_public_key);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(russh::keys::Error::KeyChanged { line }) => {
                tracing::error!(
                    "host key for {}:{} does not match known_hosts line {}",
                    self.host,
                    self.port,
                    line
                );
                Ok(false)
            }
            Err(_) => Ok(self.trust_on_first_use),
        }
    }
}

enum Credentials {
    Agent(AgentClient<UnixStream>),
    KeyFile(Arc<ssh_key::PrivateKey>),
}

/// An authenticated SSH connection to a deployment host.
pub struct Session {
    config: SessionConfig,
    handle: Handle<HostKeyCheck>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let credentials = Self::credentials(&config).await?;

        let russh_config = Config {
            inactivity_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let check = HostKeyCheck {
            host: config.host.clone(),
            port: config.port,
            trust_on_first_use: config.trust_on_first_use,
            known_hosts_path: config.known_hosts_path.clone(),
        };

        let mut handle = client::connect(
            Arc::new(russh_config),
            (config.host.as_str(), config.port),
            check,
        )
        .await
        .map_err(|e| Error::Connection {
            host: config.host.clone(),
            port: config.port,
            reason: e.to_string(),
        })?;

        if !Self::authenticate(&mut handle, &config.user, credentials).await? {
            return Err(Error::AuthenticationFailed);
        }

        tracing::debug!("connected to {}@{}:{}", config.user, config.host, config.port);
        Ok(Self { config, handle })
    }

    async fn credentials(config: &SessionConfig) -> Result<Credentials> {
        if let Some(key_path) = &config.key_path {
            let key = load_secret_key(key_path, None).map_err(|e| Error::KeyLoadFailed {
                path: key_path.clone(),
                reason: e.to_string(),
            })?;
            return Ok(Credentials::KeyFile(Arc::new(key)));
        }

        if let Ok(agent) = AgentClient::connect_env().await {
            return Ok(Credentials::Agent(agent));
        }

        let home = std::env::var("HOME").map_err(|_| {
            Error::AgentUnavailable("SSH agent not available and HOME not set".to_string())
        })?;
        ["id_ed25519", "id_rsa", "id_ecdsa"]
            .iter()
            .find_map(|name| load_secret_key(format!("{home}/.ssh/{name}"), None).ok())
            .map(|key| Credentials::KeyFile(Arc::new(key)))
            .ok_or_else(|| {
                Error::AgentUnavailable(
                    "SSH agent not available and no default keys found".to_string(),
                )
            })
    }

    async fn authenticate(
        handle: &mut Handle<HostKeyCheck>,
        user: &str,
        credentials: Credentials,
    ) -> Result<bool> {
        match credentials {
            Credentials::Agent(mut agent) => {
                let keys = agent.request_identities().await.map_err(|e| {
                    Error::AgentUnavailable(format!("failed to list agent keys: {}", e))
                })?;
                if keys.is_empty() {
                    return Err(Error::AgentUnavailable("no keys in SSH agent".to_string()));
                }

                for key in keys {
                    if let Ok(result) = handle
                        .authenticate_publickey_with(user, key, None, &mut agent)
                        .await
                        && result.success()
                    {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Credentials::KeyFile(key) => {
                let hash_alg = handle.best_supported_rsa_hash().await?.flatten();
                let result = handle
                    .authenticate_publickey(user, PrivateKeyWithHashAlg::new(key, hash_alg))
                    .await?;
                Ok(result.success())
            }
        }
    }

    /// Execute a shell command line with the configured timeout.
    pub async fn exec(&self, command_line: &str) -> Result<CommandOutput> {
        let timeout = self.config.command_timeout;
        tokio::time::timeout(timeout, self.exec_inner(command_line))
            .await
            .map_err(|_| Error::CommandTimeout(timeout))?
    }

    async fn exec_inner(&self, command_line: &str) -> Result<CommandOutput> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| Error::Channel(format!("failed to open channel: {}", e)))?;
        channel
            .exec(true, command_line)
            .await
            .map_err(|e| Error::Channel(format!("failed to exec command: {}", e)))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;
        let mut got_eof = false;

        while let Some(message) = channel.wait().await {
            match message {
                ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
                // ext 1 is stderr
                ChannelMsg::ExtendedData { data, ext: 1 } => stderr.extend_from_slice(&data),
                ChannelMsg::ExitStatus { exit_status } => {
                    exit_code = Some(exit_status);
                    if got_eof {
                        break;
                    }
                }
                ChannelMsg::Eof => {
                    got_eof = true;
                    if exit_code.is_some() {
                        break;
                    }
                }
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        let exit_code = exit_code.ok_or(Error::ChannelClosed)?;
        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        })
    }

    async fn run_line(
        &self,
        command: &Command,
        privileged: bool,
        tolerance: Tolerance,
    ) -> std::result::Result<CommandOutput, DeployError> {
        let output = self
            .exec(&command.to_shell(privileged))
            .await
            .map_err(|e| DeployError::Transport(format!("{}: {}", command, e)))?;
        check_output(command, output, tolerance)
    }

    pub async fn disconnect(self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteExecutor for Session {
    async fn run(
        &self,
        command: &Command,
        tolerance: Tolerance,
    ) -> std::result::Result<CommandOutput, DeployError> {
        self.run_line(command, false, tolerance).await
    }

    async fn run_privileged(
        &self,
        command: &Command,
        tolerance: Tolerance,
    ) -> std::result::Result<CommandOutput, DeployError> {
        self.run_line(command, true, tolerance).await
    }
}

#[async_trait]
impl FileProbe for Session {
    async fn exists(&self, path: &RemotePath) -> std::result::Result<bool, DeployError> {
        // dangling symlinks count, so stale config links can be replaced
        let quoted = shell_quote(path.as_str());
        let line = format!("(test -e {quoted} || test -L {quoted}) && echo exists");
        let output = self
            .exec(&line)
            .await
            .map_err(|e| DeployError::Transport(format!("probing {}: {}", path, e)))?;
        Ok(output.success() && output.stdout.trim() == "exists")
    }
}
