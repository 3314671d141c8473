// ABOUTME: Integration tests for Apache control on redhat and debian hosts.
// ABOUTME: Config linking sequences, flavour detection, and privileged service commands.

mod support;

use stagehand::deploy::DeployErrorKind;
use stagehand::remote::{Host, Tolerance};
use stagehand::serving::{self, Apache, ServingLayerControl};
use support::{FakeHost, PROJECT_YAML, environment, staging};

const SITES_AVAILABLE: &str = "/etc/apache2/sites-available/shop_staging.conf";
const SITES_ENABLED: &str = "/etc/apache2/sites-enabled/shop_staging.conf";

fn apache_yaml(linux_type: Option<&str>) -> String {
    let mut yaml = format!("{PROJECT_YAML}webserver: apache\n");
    if let Some(linux_type) = linux_type {
        yaml.push_str(&format!("linux_type: {linux_type}\n"));
    }
    yaml
}

#[tokio::test]
async fn debian_maintenance_link_replaces_the_vhost() {
    let env = environment(&apache_yaml(Some("debian")), "staging");
    let host = FakeHost::new()
        .with_file("/srv/shop/dev/apache/staging.conf", "live")
        .with_file("/srv/shop/dev/apache/staging-maintenance.conf", "maintenance")
        .with_file(SITES_AVAILABLE, "-> old")
        .with_file(SITES_ENABLED, "-> old");
    let apache = Apache::new(Host::new(&host, &host, false), &env);

    apache.link_config(true).await.unwrap();

    assert_eq!(
        host.commands(),
        vec![
            "rm /etc/apache2/sites-available/shop_staging.conf",
            "ln -s /srv/shop/dev/apache/staging-maintenance.conf /etc/apache2/sites-available/shop_staging.conf",
            "/usr/sbin/apache2ctl -S",
        ]
    );
    let recorded = host.recorded();
    assert!(!recorded[0].privileged);
    assert!(recorded[2].privileged);
}

#[tokio::test]
async fn debian_live_link_enables_the_site() {
    let env = environment(&apache_yaml(Some("debian")), "staging");
    let host = FakeHost::new()
        .with_file("/srv/shop/dev/apache/staging.conf", "live")
        .with_dir("/etc/apache2/sites-enabled");
    let apache = Apache::new(Host::new(&host, &host, false), &env);

    apache.link_config(false).await.unwrap();

    assert_eq!(
        host.commands(),
        vec![
            "ln -s /srv/shop/dev/apache/staging.conf /etc/apache2/sites-available/shop_staging.conf",
            "ln -s /etc/apache2/sites-available/shop_staging.conf /etc/apache2/sites-enabled/shop_staging.conf",
            "/usr/sbin/apache2ctl -S",
        ]
    );
}

#[tokio::test]
async fn missing_maintenance_config_leaves_the_site_unlinked() {
    let env = environment(&apache_yaml(Some("debian")), "staging");
    let host = FakeHost::new().with_file(SITES_AVAILABLE, "-> old");
    let apache = Apache::new(Host::new(&host, &host, false), &env);

    apache.link_config(true).await.unwrap();

    assert_eq!(
        host.commands(),
        vec!["rm /etc/apache2/sites-available/shop_staging.conf"]
    );
    assert!(!host.exists(SITES_AVAILABLE));
}

#[tokio::test]
async fn missing_live_config_is_a_precondition_failure() {
    let env = environment(&apache_yaml(Some("debian")), "staging");
    let host = FakeHost::new().with_file(SITES_AVAILABLE, "-> old");
    let apache = Apache::new(Host::new(&host, &host, false), &env);

    let err = apache.link_config(false).await.unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::Precondition);
    assert!(err.to_string().contains("/srv/shop/dev/apache/staging.conf"));
    assert!(host.commands().is_empty());
    assert!(host.exists(SITES_AVAILABLE));
}

#[tokio::test]
async fn redhat_is_detected_and_service_runs_privileged() {
    let env = environment(&apache_yaml(None), "staging");
    let host = FakeHost::new().with_file("/etc/redhat-release", "Rocky Linux 9");
    let apache = Apache::new(Host::new(&host, &host, false), &env);

    apache.reload(Tolerance::Abort).await.unwrap();

    let recorded = host.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].line, "/etc/init.d/httpd reload");
    assert!(recorded[0].privileged);
    assert_eq!(
        apache.conf_path().await.unwrap().as_str(),
        "/etc/httpd/conf.d/shop_staging.conf"
    );
}

#[tokio::test]
async fn debian_restart_uses_the_apache2_init_script() {
    let env = environment(&apache_yaml(Some("debian")), "staging");
    let host = FakeHost::new();
    let apache = Apache::new(Host::new(&host, &host, false), &env);

    apache.restart(Tolerance::Abort).await.unwrap();

    let recorded = host.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].line, "/etc/init.d/apache2 restart");
    assert!(recorded[0].privileged);
}

#[tokio::test]
async fn unknown_flavour_is_a_precondition_failure() {
    let env = environment(&apache_yaml(None), "staging");
    let host = FakeHost::new();
    let apache = Apache::new(Host::new(&host, &host, false), &env);

    let err = apache.stop(Tolerance::Warn).await.unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::Precondition);
    assert!(host.commands().is_empty());
}

#[tokio::test]
async fn disabled_webserver_sends_nothing() {
    let env = staging();
    let host = FakeHost::new();
    let serving = serving::for_environment(&env, Host::new(&host, &host, false));

    serving.link_config(true).await.unwrap();
    serving.reload(Tolerance::Abort).await.unwrap();
    serving.stop(Tolerance::Abort).await.unwrap();
    serving.restart(Tolerance::Abort).await.unwrap();

    assert!(host.commands().is_empty());
}
