// ABOUTME: Apache control through the distribution's init script and conf directory.
// ABOUTME: Links the release's live or maintenance vhost config and verifies it with -S.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{LinuxFlavor, ServingLayerControl};
use crate::config::Environment;
use crate::deploy::DeployError;
use crate::remote::{Command, CommandOutput, Host, Tolerance};
use crate::types::RemotePath;

const REDHAT_MARKER: &str = "/etc/redhat-release";
const DEBIAN_MARKER: &str = "/etc/debian_version";

impl LinuxFlavor {
    fn apache_conf_dir(&self) -> RemotePath {
        match self {
            LinuxFlavor::Redhat => RemotePath::new("/etc/httpd/conf.d"),
            LinuxFlavor::Debian => RemotePath::new("/etc/apache2/sites-available"),
        }
    }

    fn apache_init_script(&self) -> &'static str {
        match self {
            LinuxFlavor::Redhat => "/etc/init.d/httpd",
            LinuxFlavor::Debian => "/etc/init.d/apache2",
        }
    }

    fn apache_config_test(&self) -> Command {
        match self {
            LinuxFlavor::Redhat => Command::new("/usr/sbin/httpd").arg("-S"),
            LinuxFlavor::Debian => Command::new("/usr/sbin/apache2ctl").arg("-S"),
        }
    }
}

pub struct Apache<'a> {
    host: Host<'a>,
    /// `<project>_<env>.conf`
    conf_file_name: String,
    /// `<current>/apache/<env>`, completed with `.conf` or `-maintenance.conf`.
    config_stub: String,
    flavor: OnceCell<LinuxFlavor>,
}

impl std::fmt::Debug for Apache<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Apache")
            .field("conf_file_name", &self.conf_file_name)
            .field("config_stub", &self.config_stub)
            .field("flavor", &self.flavor.get())
            .finish()
    }
}

impl<'a> Apache<'a> {
    pub fn new(host: Host<'a>, env: &Environment) -> Self {
        let flavor = match env.linux_flavor {
            Some(flavor) => OnceCell::new_with(Some(flavor)),
            None => OnceCell::new(),
        };
        Self {
            host,
            conf_file_name: format!("{}_{}.conf", env.project_name, env.name),
            config_stub: env
                .layout
                .current
                .join("apache")
                .join(env.name.as_str())
                .to_string(),
            flavor,
        }
    }

    async fn flavor(&self) -> Result<LinuxFlavor, DeployError> {
        self.flavor
            .get_or_try_init(|| async {
                if self.host.exists(&RemotePath::new(REDHAT_MARKER)).await? {
                    Ok(LinuxFlavor::Redhat)
                } else if self.host.exists(&RemotePath::new(DEBIAN_MARKER)).await? {
                    Ok(LinuxFlavor::Debian)
                } else {
                    Err(DeployError::Precondition(
                        "cannot detect the linux flavour of the host; set linux_type".to_string(),
                    ))
                }
            })
            .await
            .copied()
    }

    /// Where the webserver reads this environment's vhost from.
    pub async fn conf_path(&self) -> Result<RemotePath, DeployError> {
        Ok(self.flavor().await?.apache_conf_dir().join(&self.conf_file_name))
    }

    fn live_config(&self) -> RemotePath {
        RemotePath::new(format!("{}.conf", self.config_stub))
    }

    fn maintenance_config(&self) -> RemotePath {
        RemotePath::new(format!("{}-maintenance.conf", self.config_stub))
    }

    async fn service(
        &self,
        action: &str,
        tolerance: Tolerance,
    ) -> Result<CommandOutput, DeployError> {
        let script = self.flavor().await?.apache_init_script();
        self.host
            .run_privileged(Command::new(script).arg(action), tolerance)
            .await
    }
}

#[async_trait]
impl ServingLayerControl for Apache<'_> {
    async fn start(&self, tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        self.service("start", tolerance).await
    }

    async fn stop(&self, tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        self.service("stop", tolerance).await
    }

    async fn reload(&self, tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        self.service("reload", tolerance).await
    }

    async fn restart(&self, tolerance: Tolerance) -> Result<CommandOutput, DeployError> {
        self.service("restart", tolerance).await
    }

    async fn link_config(&self, maintenance: bool) -> Result<(), DeployError> {
        let flavor = self.flavor().await?;
        let conf = self.conf_path().await?;

        if maintenance {
            self.host.remove_file(&conf).await?;
            let source = self.maintenance_config();
            if !self.host.exists(&source).await? {
                tracing::info!("no maintenance config at {}; site is unlinked", source);
                return Ok(());
            }
            self.host.symlink(&source, &conf).await?;
        } else {
            let source = self.live_config();
            if !self.host.exists(&source).await? {
                return Err(DeployError::Precondition(format!(
                    "No apache conf file found - expected {source}"
                )));
            }
            self.host.remove_file(&conf).await?;
            self.host.symlink(&source, &conf).await?;
        }

        if flavor == LinuxFlavor::Debian {
            let enabled = RemotePath::new(conf.as_str().replace("sites-available", "sites-enabled"));
            self.host.symlink(&conf, &enabled).await?;
        }

        self.config_test().await
    }

    async fn config_test(&self) -> Result<(), DeployError> {
        let test = self.flavor().await?.apache_config_test();
        self.host.run_privileged(test, Tolerance::Abort).await?;
        Ok(())
    }
}
