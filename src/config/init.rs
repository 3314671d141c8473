// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Writes a commented stagehand.yml template.

use std::path::Path;

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

pub fn init_config(dir: &Path, project_name: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let project_name = project_name.unwrap_or("myapp");
    if project_name.is_empty() || project_name.contains('/') {
        return Err(Error::InvalidConfig(format!(
            "invalid project name: '{project_name}'"
        )));
    }

    std::fs::write(&config_path, template_yaml(project_name))?;
    Ok(())
}

fn template_yaml(project_name: &str) -> String {
    format!(
        r#"project_name: {project_name}
project_type: generic        # or django
server_home: /var/django     # project lives in <server_home>/<project_name>

vcs: git                     # git, svn, or cvs
repository: git@example.com:org/{project_name}.git
default_branch:
  staging: master
  production: master

use_sudo: true
keep: 5                      # archived releases kept for rollback; 0 keeps all
webserver: apache            # or omit for no webserver control

environments:
  staging:
    host: deploy@staging.example.com
  production:
    host:
      host: www.example.com
      user: deploy
      # accept and record an unknown host key (default: false)
      trust_first_connection: false
    keep: 10
"#
    )
}
