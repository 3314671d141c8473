// ABOUTME: Integration tests for rollback against an in-memory host.
// ABOUTME: Covers argument validation, version resolution, archive collisions, and database restore.

mod support;

use stagehand::deploy::{DeployErrorKind, DeployRequest, Orchestrator};
use stagehand::diagnostics::Diagnostics;
use stagehand::release::RollbackRequest;
use stagehand::tasks::TasksScript;
use stagehand::types::Revision;
use support::{CURRENT, FakeHost, Harness, RecordingServing, staging};

const OLD: &str = "/srv/shop/previous/2023-05-01_12-00-00";

fn rollback_to(version: &str) -> RollbackRequest {
    RollbackRequest {
        version: version.to_string(),
        ..RollbackRequest::default()
    }
}

#[tokio::test]
async fn rollback_after_deploy_restores_the_previous_release_exactly() {
    support::init_tracing();
    let h = Harness::new(staging(), FakeHost::new().with_git_release(CURRENT, "r1"));
    let before = h.host.snapshot(CURRENT);
    let serving = RecordingServing::new(&h.host);
    let tasks = TasksScript::new(h.remote(), false);
    let orchestrator = Orchestrator::new(&h.env, h.caps(&serving, &tasks)).unwrap();
    let mut diag = Diagnostics::default();

    let deploy = DeployRequest {
        revision: Some(Revision::new("r2").unwrap()),
        keep: None,
    };
    orchestrator.deploy(&deploy, &mut diag).await.unwrap();
    assert_ne!(h.host.snapshot(CURRENT), before);
    h.host.clear_log();

    let outcome = orchestrator
        .rollback(&RollbackRequest::default(), &mut diag)
        .await
        .unwrap();

    assert_eq!(h.host.snapshot(CURRENT), before);
    assert_eq!(outcome.restored.name.as_str(), "2024-03-01_10-00-02");
    let safety = outcome.safety_archive.expect("replaced release archived");
    assert_eq!(safety.name.as_str(), "2024-03-01_10-00-04");
    assert_eq!(
        h.host.read(&format!("{}/REVISION", safety.path)).as_deref(),
        Some("r2")
    );
    assert!(!outcome.db_restored);

    let positions: Vec<usize> = [
        "serving: stop",
        "cp -a /srv/shop/dev /srv/shop/previous/2024-03-01_10-00-04",
        "rm -rf /srv/shop/dev",
        "cp -a /srv/shop/previous/2024-03-01_10-00-02 /srv/shop/dev",
        "serving: start",
    ]
    .iter()
    .map(|f| h.host.position(f).unwrap())
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
}

#[tokio::test]
async fn round_trip_with_database_dumps_leaves_no_dump_in_the_release() {
    let h = Harness::new(
        staging(),
        FakeHost::new()
            .with_git_release(CURRENT, "r1")
            .with_file("/srv/shop/dev/deploy/tasks.py", ""),
    );
    let before = h.host.snapshot(CURRENT);
    let serving = RecordingServing::new(&h.host);
    let tasks = TasksScript::new(h.remote(), false);
    let orchestrator = Orchestrator::new(&h.env, h.caps(&serving, &tasks)).unwrap();
    let mut diag = Diagnostics::default();

    let deploy = DeployRequest {
        revision: Some(Revision::new("r2").unwrap()),
        keep: None,
    };
    orchestrator.deploy(&deploy, &mut diag).await.unwrap();
    assert!(h.host.exists("/srv/shop/previous/2024-03-01_10-00-02/db_dump.sql"));

    let outcome = orchestrator
        .rollback(&RollbackRequest::default(), &mut diag)
        .await
        .unwrap();

    assert_eq!(h.host.snapshot(CURRENT), before);
    assert!(!h.host.exists("/srv/shop/dev/db_dump.sql"));
    assert!(h.host.exists(&format!("{}/db_dump.sql", outcome.restored.path)));
    let safety = outcome.safety_archive.expect("replaced release archived");
    assert!(h.host.exists(&format!("{}/db_dump.sql", safety.path)));
    assert!(!diag.has_warnings());
}

#[tokio::test]
async fn taken_safety_archive_name_aborts_before_the_webserver_stops() {
    let h = Harness::new(
        staging(),
        FakeHost::new()
            .with_git_release(CURRENT, "r2")
            .with_git_release(OLD, "r1")
            .with_dir("/srv/shop/previous/2024-03-01_10-00-00"),
    );
    let serving = RecordingServing::new(&h.host);
    let tasks = TasksScript::new(h.remote(), false);
    let orchestrator = Orchestrator::new(&h.env, h.caps(&serving, &tasks)).unwrap();
    let mut diag = Diagnostics::default();

    let err = orchestrator
        .rollback(&rollback_to("2023-05-01_12-00-00"), &mut diag)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::Precondition);
    assert!(!h.host.ran("serving:"));
    assert!(!h.host.ran("rm -rf /srv/shop/dev"));
    assert_eq!(h.host.read("/srv/shop/dev/REVISION").as_deref(), Some("r2"));
}

#[tokio::test]
async fn restore_db_loads_the_dump_of_the_target_archive() {
    let h = Harness::new(
        staging(),
        FakeHost::new()
            .with_git_release(CURRENT, "r2")
            .with_file("/srv/shop/dev/deploy/tasks.py", "")
            .with_git_release(OLD, "r1")
            .with_file(&format!("{OLD}/deploy/tasks.py"), "")
            .with_file(&format!("{OLD}/db_dump.sql"), "-- r1 data"),
    );
    let serving = RecordingServing::new(&h.host);
    let tasks = TasksScript::new(h.remote(), false);
    let orchestrator = Orchestrator::new(&h.env, h.caps(&serving, &tasks)).unwrap();
    let mut diag = Diagnostics::default();

    let request = RollbackRequest {
        restore_db: true,
        ..rollback_to("2023-05-01_12-00-00")
    };
    let outcome = orchestrator.rollback(&request, &mut diag).await.unwrap();

    assert!(outcome.db_restored);
    assert!(h.host.ran(&format!(
        "cd {OLD} && {OLD}/deploy/tasks.py load_dbdump:{OLD}/db_dump.sql"
    )));
    let safety = "/srv/shop/previous/2024-03-01_10-00-00";
    assert!(h.host.exists(&format!("{safety}/db_dump.sql")));
    assert_eq!(h.host.read("/srv/shop/dev/REVISION").as_deref(), Some("r1"));
    assert!(
        h.host.position("dump_db:").unwrap() < h.host.position("load_dbdump:").unwrap(),
        "the replaced release is dumped before the old data is loaded"
    );
}

#[tokio::test]
async fn migrate_with_restore_db_is_rejected_before_any_command() {
    let h = Harness::new(staging(), FakeHost::new().with_git_release(CURRENT, "r2"));
    let serving = RecordingServing::new(&h.host);
    let tasks = TasksScript::new(h.remote(), false);
    let orchestrator = Orchestrator::new(&h.env, h.caps(&serving, &tasks)).unwrap();
    let mut diag = Diagnostics::default();

    let request = RollbackRequest {
        migrate: true,
        restore_db: true,
        ..RollbackRequest::default()
    };
    let err = orchestrator.rollback(&request, &mut diag).await.unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::Validation);
    assert!(h.host.commands().is_empty());
}

#[tokio::test]
async fn migrate_alone_is_not_supported() {
    let h = Harness::new(staging(), FakeHost::new().with_git_release(CURRENT, "r2"));
    let serving = RecordingServing::new(&h.host);
    let tasks = TasksScript::new(h.remote(), false);
    let orchestrator = Orchestrator::new(&h.env, h.caps(&serving, &tasks)).unwrap();
    let mut diag = Diagnostics::default();

    let request = RollbackRequest {
        migrate: true,
        ..RollbackRequest::default()
    };
    let err = orchestrator.rollback(&request, &mut diag).await.unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::NotSupported);
    assert!(h.host.commands().is_empty());
}

#[tokio::test]
async fn unknown_versions_are_not_found_and_touch_nothing() {
    let h = Harness::new(
        staging(),
        FakeHost::new()
            .with_git_release(CURRENT, "r2")
            .with_git_release(OLD, "r1"),
    );
    let serving = RecordingServing::new(&h.host);
    let tasks = TasksScript::new(h.remote(), false);
    let orchestrator = Orchestrator::new(&h.env, h.caps(&serving, &tasks)).unwrap();
    let mut diag = Diagnostics::default();

    for version in ["2020-01-01_00-00-00", "yesterday"] {
        let err = orchestrator
            .rollback(&rollback_to(version), &mut diag)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), DeployErrorKind::VersionNotFound, "{version}");
        assert!(err.to_string().contains(version));
    }

    assert!(!h.host.ran("serving:"));
    assert_eq!(h.host.read("/srv/shop/dev/REVISION").as_deref(), Some("r2"));
}

#[tokio::test]
async fn last_without_archives_is_not_found() {
    let h = Harness::new(staging(), FakeHost::new().with_git_release(CURRENT, "r1"));
    let serving = RecordingServing::new(&h.host);
    let tasks = TasksScript::new(h.remote(), false);
    let orchestrator = Orchestrator::new(&h.env, h.caps(&serving, &tasks)).unwrap();
    let mut diag = Diagnostics::default();

    let err = orchestrator
        .rollback(&RollbackRequest::default(), &mut diag)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), DeployErrorKind::VersionNotFound);
    assert!(h.host.commands().is_empty());
}
