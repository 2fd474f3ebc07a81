//! PostgreSQL service control.
//!
//! Initialization runs `initdb` and appends hardening settings to the
//! generated `postgresql.conf`. The `PG_VERSION` file in the data
//! directory is the initialization marker. Liveness reads the pid from
//! `postmaster.pid`.

use std::path::Path;

use super::probe;
use super::{append_config, run_engine_cmd, spawn_detached};
use super::{AuthMode, Initialized, ServiceSettings, ServiceStatus};
use crate::error::Result;

const MARKER: &str = "PG_VERSION";
const PID_FILE: &str = "postmaster.pid";

pub(super) async fn initialize(
    bin_dir: &Path,
    data_dir: &Path,
    settings: &ServiceSettings,
) -> Result<Initialized> {
    if data_dir.join(MARKER).exists() {
        return Ok(Initialized::AlreadyInitialized);
    }

    std::fs::create_dir_all(data_dir)?;

    let auth = match settings.auth {
        AuthMode::Trust => "trust",
        AuthMode::Password => "scram-sha-256",
    };
    let data = data_dir.to_string_lossy();
    run_engine_cmd(
        &bin_dir.join("initdb"),
        &["-D", &data, "-U", "postgres", "-A", auth],
    )
    .await?;

    append_config(
        &data_dir.join("postgresql.conf"),
        &[
            "listen_addresses = '127.0.0.1'".to_string(),
            format!("port = {}", settings.port),
        ],
    )?;

    Ok(Initialized::Fresh)
}

pub(super) async fn start(
    bin_dir: &Path,
    data_dir: &Path,
    log_file: &Path,
    port: u16,
) -> Result<()> {
    let args = vec![
        "-D".to_string(),
        data_dir.to_string_lossy().into_owned(),
        "-p".to_string(),
        port.to_string(),
    ];
    spawn_detached(&bin_dir.join("postgres"), &args, log_file)?;
    Ok(())
}

pub(super) async fn stop(bin_dir: &Path, data_dir: &Path) -> Result<()> {
    let data = data_dir.to_string_lossy();
    run_engine_cmd(&bin_dir.join("pg_ctl"), &["-D", &data, "stop", "-m", "fast"]).await
}

pub(super) fn status(data_dir: &Path, port: u16) -> ServiceStatus {
    let pid = match probe::read_pid_file(&data_dir.join(PID_FILE)) {
        Some(pid) => pid,
        None => return ServiceStatus::stopped(),
    };

    // A recycled pid makes this a false positive; accepted imprecision.
    if probe::pid_alive(pid) {
        ServiceStatus { running: true, pid: Some(pid), port: Some(port) }
    } else {
        ServiceStatus::stopped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_marker_short_circuits_initialize() {
        let temp = tempfile::tempdir().unwrap();
        let data_dir = temp.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(data_dir.join(MARKER), "16\n").unwrap();
        std::fs::write(data_dir.join("postgresql.conf"), "port = 5432\n").unwrap();

        // bin_dir has no initdb; if the marker check failed this would
        // error instead of returning early.
        let settings = ServiceSettings {
            cluster: "main".into(),
            port: 5432,
            auth: AuthMode::Trust,
        };
        let result = initialize(temp.path(), &data_dir, &settings).await.unwrap();
        assert_eq!(result, Initialized::AlreadyInitialized);

        // Existing data untouched.
        assert_eq!(
            std::fs::read_to_string(data_dir.join("postgresql.conf")).unwrap(),
            "port = 5432\n"
        );
    }

    #[test]
    fn test_status_without_pid_file() {
        let temp = tempfile::tempdir().unwrap();
        let status = status(temp.path(), 5432);
        assert!(!status.running);
        assert_eq!(status.pid, None);
    }

    #[test]
    fn test_status_with_live_pid() {
        let temp = tempfile::tempdir().unwrap();
        // Use our own pid so the probe sees a live process.
        let own = std::process::id();
        std::fs::write(temp.path().join(PID_FILE), format!("{}\n/data\n", own)).unwrap();

        let status = status(temp.path(), 5433);
        assert!(status.running);
        assert_eq!(status.pid, Some(own as i32));
        assert_eq!(status.port, Some(5433));
    }

    #[test]
    fn test_status_with_dead_pid() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join(PID_FILE), format!("{}\n", i32::MAX)).unwrap();

        let status = status(temp.path(), 5432);
        assert!(!status.running);
    }
}
