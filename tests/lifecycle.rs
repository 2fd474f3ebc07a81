//! Integration tests for the install / use / uninstall lifecycle.

mod common;

use common::{node_archive, postgres_archive, test_engine, write_tar_gz};
use tempfile::TempDir;
use toolchest::error::Error;
use toolchest::tool::ToolKind;

fn shim_body(root: &std::path::Path, name: &str) -> String {
    std::fs::read_to_string(root.join("shims").join(name)).unwrap()
}

// =============================================================================
// Install
// =============================================================================

#[tokio::test]
async fn test_install_normalizes_wrapper_directory() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());
    let archive = node_archive(temp.path(), "20.11.1");

    let install_dir = engine.install(ToolKind::Node, "20.11.1", &archive).await.unwrap();

    // The wrapper directory is gone; bin/ sits at the canonical root.
    assert!(install_dir.join("bin/node").is_file());
    assert!(!install_dir.join("node-v20.11.1-linux-x64").exists());

    // Staging is cleaned up after a successful install.
    assert!(!temp.path().join("staging/node-20.11.1").exists());
}

#[tokio::test]
async fn test_install_side_by_side_and_list() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());

    for version in ["20.11.1", "18.19.0"] {
        let archive = node_archive(temp.path(), version);
        engine.install(ToolKind::Node, version, &archive).await.unwrap();
    }

    let versions = engine.list_installed(ToolKind::Node).unwrap();
    assert_eq!(versions, vec!["18.19.0", "20.11.1"]);
}

#[tokio::test]
async fn test_failed_install_leaves_staging_for_inspection() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());

    // No layout rule matches an archive without bin/ or a known wrapper.
    let archive = temp.path().join("broken.tar.gz");
    write_tar_gz(&archive, &[("stuff/readme.txt", b"?", 0o644)]);

    let err = engine.install(ToolKind::Postgres, "16.2", &archive).await.unwrap_err();
    assert!(matches!(err, Error::NoPayloadFound { .. }));

    // Partial state stays on disk; a retried install overwrites it.
    assert!(temp.path().join("staging/postgres-16.2/stuff/readme.txt").is_file());
}

#[tokio::test]
async fn test_install_unknown_format_fails() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());

    let archive = temp.path().join("node.pkg");
    std::fs::write(&archive, b"not an archive").unwrap();

    let err = engine.install(ToolKind::Node, "20.11.1", &archive).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
}

// =============================================================================
// Use / switch
// =============================================================================

#[tokio::test]
async fn test_use_writes_shims_and_persists_selection() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());
    let archive = node_archive(temp.path(), "20.11.1");
    let install_dir = engine.install(ToolKind::Node, "20.11.1", &archive).await.unwrap();

    engine.activate(ToolKind::Node, "20.11.1").await.unwrap();

    assert_eq!(
        engine.current_version(ToolKind::Node).unwrap().as_deref(),
        Some("20.11.1")
    );
    let body = shim_body(temp.path(), "node");
    assert!(body.contains(&install_dir.join("bin/node").display().to_string()));
    for name in ["node", "npm", "npx"] {
        assert!(temp.path().join("shims").join(name).is_file());
    }
}

#[tokio::test]
async fn test_switch_rewrites_shims_to_new_target() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());

    for version in ["18.19.0", "20.11.1"] {
        let archive = node_archive(temp.path(), version);
        engine.install(ToolKind::Node, version, &archive).await.unwrap();
    }

    engine.activate(ToolKind::Node, "18.19.0").await.unwrap();
    engine.activate(ToolKind::Node, "20.11.1").await.unwrap();

    // The shim name never changes; only its target does.
    let body = shim_body(temp.path(), "node");
    assert!(body.contains("20.11.1"));
    assert!(!body.contains("18.19.0"));
    assert_eq!(
        engine.current_version(ToolKind::Node).unwrap().as_deref(),
        Some("20.11.1")
    );
}

#[tokio::test]
async fn test_use_missing_version_fails_and_keeps_state() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());
    let archive = node_archive(temp.path(), "20.11.1");
    engine.install(ToolKind::Node, "20.11.1", &archive).await.unwrap();
    engine.activate(ToolKind::Node, "20.11.1").await.unwrap();

    let err = engine.activate(ToolKind::Node, "99.0.0").await.unwrap_err();
    assert!(matches!(err, Error::NotInstalled { .. }));

    // Selection and shims still point at the installed version.
    assert_eq!(
        engine.current_version(ToolKind::Node).unwrap().as_deref(),
        Some("20.11.1")
    );
    assert!(temp.path().join("shims/node").is_file());
}

#[tokio::test]
async fn test_use_empty_version_deactivates() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());
    let archive = node_archive(temp.path(), "20.11.1");
    engine.install(ToolKind::Node, "20.11.1", &archive).await.unwrap();
    engine.activate(ToolKind::Node, "20.11.1").await.unwrap();

    engine.activate(ToolKind::Node, "").await.unwrap();

    assert_eq!(engine.current_version(ToolKind::Node).unwrap(), None);
    for name in ["node", "npm", "npx"] {
        assert!(!temp.path().join("shims").join(name).exists());
    }
}

// =============================================================================
// Stateful engines
// =============================================================================

#[tokio::test]
async fn test_stateful_install_skips_initialized_cluster() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());
    let archive = postgres_archive(temp.path(), "16.2");

    // A previously initialized default cluster: marker + config.
    let data_dir = temp.path().join("data/postgres/16.2/main");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("PG_VERSION"), "16\n").unwrap();
    std::fs::write(data_dir.join("postgresql.conf"), "port = 5432\n").unwrap();

    // Auto-activation finds the marker, skips initdb, and starts the
    // (scripted) server binary.
    engine.install(ToolKind::Postgres, "16.2", &archive).await.unwrap();

    // Second install re-extracts but must not touch the cluster.
    engine.install(ToolKind::Postgres, "16.2", &archive).await.unwrap();
    assert_eq!(std::fs::read_to_string(data_dir.join("PG_VERSION")).unwrap(), "16\n");
    assert_eq!(
        std::fs::read_to_string(data_dir.join("postgresql.conf")).unwrap(),
        "port = 5432\n"
    );
}

#[tokio::test]
async fn test_reinstall_does_not_start_running_cluster() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());

    // An engine binary that records every launch.
    let sentinel = temp.path().join("launches.log");
    let server = format!("#!/bin/sh\necho launched >> \"{}\"\n", sentinel.display());
    let archive = temp.path().join("postgresql-16.2-linux-x64.tar.gz");
    write_tar_gz(&archive, &[("pgsql/bin/postgres", server.as_bytes(), 0o755)]);

    // The default cluster is initialized and looks alive: its pid file
    // carries a live pid (our own).
    let data_dir = engine.layout().data_dir(ToolKind::Postgres, "16.2", "main");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("PG_VERSION"), "16\n").unwrap();
    std::fs::write(
        data_dir.join("postmaster.pid"),
        format!("{}\n/data\n", std::process::id()),
    )
    .unwrap();
    assert!(engine.service_status(ToolKind::Postgres, "16.2").await.running);

    engine.install(ToolKind::Postgres, "16.2", &archive).await.unwrap();

    // Auto-activation skipped the start; only one server may ever serve
    // the cluster at a time.
    assert!(!sentinel.exists(), "install launched a second engine process");
}

#[tokio::test]
async fn test_stateful_switch_completes_when_service_fails() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());

    // Two installed versions, neither with working engine binaries.
    for version in ["15.6", "16.2"] {
        let install_dir = engine.layout().install_dir(ToolKind::Postgres, version);
        std::fs::create_dir_all(install_dir.join("bin")).unwrap();
    }

    // The outgoing version looks alive: its pid file carries a live pid
    // (our own). Stopping it will fail (no pg_ctl) and must only warn.
    let old_data = engine.layout().data_dir(ToolKind::Postgres, "15.6", "main");
    std::fs::create_dir_all(&old_data).unwrap();
    std::fs::write(
        old_data.join("postmaster.pid"),
        format!("{}\n/data\n", std::process::id()),
    )
    .unwrap();

    engine.activate(ToolKind::Postgres, "15.6").await.unwrap();
    engine.activate(ToolKind::Postgres, "16.2").await.unwrap();

    // The switch finished: selection and shims reflect the target even
    // though stop/start could not be carried out.
    assert_eq!(
        engine.current_version(ToolKind::Postgres).unwrap().as_deref(),
        Some("16.2")
    );
    assert!(shim_body(temp.path(), "psql").contains("16.2"));
}

#[tokio::test]
async fn test_service_status_reports_stopped_without_pid_file() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());

    let status = engine.service_status(ToolKind::Postgres, "16.2").await;
    assert!(!status.running);

    // Stateless tools never report a service.
    let status = engine.service_status(ToolKind::Node, "20.11.1").await;
    assert!(!status.running);
}

// =============================================================================
// Uninstall
// =============================================================================

#[tokio::test]
async fn test_uninstall_removes_install_tree() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());
    let archive = node_archive(temp.path(), "20.11.1");
    engine.install(ToolKind::Node, "20.11.1", &archive).await.unwrap();

    engine.uninstall(ToolKind::Node, "20.11.1").await.unwrap();

    assert!(engine.list_installed(ToolKind::Node).unwrap().is_empty());
    assert!(!temp.path().join("toolchains/node/20.11.1").exists());
}

#[tokio::test]
async fn test_uninstall_selected_version_clears_selection_and_shims() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());
    let archive = node_archive(temp.path(), "20.11.1");
    engine.install(ToolKind::Node, "20.11.1", &archive).await.unwrap();
    engine.activate(ToolKind::Node, "20.11.1").await.unwrap();

    engine.uninstall(ToolKind::Node, "20.11.1").await.unwrap();

    assert_eq!(engine.current_version(ToolKind::Node).unwrap(), None);
    assert!(!temp.path().join("shims/node").exists());
}

#[tokio::test]
async fn test_uninstall_other_version_keeps_selection() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());

    for version in ["18.19.0", "20.11.1"] {
        let archive = node_archive(temp.path(), version);
        engine.install(ToolKind::Node, version, &archive).await.unwrap();
    }
    engine.activate(ToolKind::Node, "20.11.1").await.unwrap();

    engine.uninstall(ToolKind::Node, "18.19.0").await.unwrap();

    assert_eq!(
        engine.current_version(ToolKind::Node).unwrap().as_deref(),
        Some("20.11.1")
    );
    assert!(temp.path().join("shims/node").is_file());
    assert_eq!(engine.list_installed(ToolKind::Node).unwrap(), vec!["20.11.1"]);
}

#[tokio::test]
async fn test_uninstall_stateful_removes_data_and_logs() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());

    let data_dir = engine.layout().data_dir(ToolKind::Mysql, "8.0.36", "main");
    std::fs::create_dir_all(&data_dir).unwrap();
    let log_dir = engine.layout().log_dir(ToolKind::Mysql);
    std::fs::create_dir_all(&log_dir).unwrap();
    std::fs::write(log_dir.join("8.0.36-main.log"), "log").unwrap();
    std::fs::write(log_dir.join("8.3.0-main.log"), "other version").unwrap();
    let install_dir = engine.layout().install_dir(ToolKind::Mysql, "8.0.36");
    std::fs::create_dir_all(install_dir.join("bin")).unwrap();

    engine.uninstall(ToolKind::Mysql, "8.0.36").await.unwrap();

    assert!(!data_dir.exists());
    assert!(!log_dir.join("8.0.36-main.log").exists());
    // Another version's logs survive.
    assert!(log_dir.join("8.3.0-main.log").is_file());
}

#[tokio::test]
async fn test_uninstall_missing_version_is_ok() {
    let temp = TempDir::new().unwrap();
    let engine = test_engine(temp.path());
    engine.uninstall(ToolKind::Java, "21.0.2").await.unwrap();
}
