//! MySQL service control.
//!
//! Initialization runs `mysqld --initialize` and writes a minimal
//! `my.cnf` next to the data. The `mysql` system database directory is
//! the initialization marker (`auto.cnf` is not written by every
//! distribution). The engine keeps no pid file here, so liveness is a
//! port-listen probe.

use std::path::Path;

use super::probe;
use super::{append_config, run_engine_cmd, spawn_detached};
use super::{AuthMode, Initialized, ServiceSettings, ServiceStatus};
use crate::error::Result;
use crate::output;

const MARKER: &str = "mysql";

fn config_file(data_dir: &Path) -> std::path::PathBuf {
    data_dir.join("my.cnf")
}

pub(super) async fn initialize(
    bin_dir: &Path,
    data_dir: &Path,
    settings: &ServiceSettings,
) -> Result<Initialized> {
    if data_dir.join(MARKER).is_dir() {
        return Ok(Initialized::AlreadyInitialized);
    }

    std::fs::create_dir_all(data_dir)?;

    let datadir_arg = format!("--datadir={}", data_dir.display());
    let init_arg = match settings.auth {
        AuthMode::Trust => "--initialize-insecure",
        AuthMode::Password => "--initialize",
    };
    run_engine_cmd(
        &bin_dir.join("mysqld"),
        &["--no-defaults", init_arg, &datadir_arg],
    )
    .await?;

    append_config(
        &config_file(data_dir),
        &[
            "[mysqld]".to_string(),
            "bind-address = 127.0.0.1".to_string(),
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
        format!("--defaults-file={}", config_file(data_dir).display()),
        format!("--datadir={}", data_dir.display()),
        format!("--port={}", port),
        format!("--socket={}", data_dir.join("mysql.sock").display()),
    ];
    spawn_detached(&bin_dir.join("mysqld"), &args, log_file)?;
    Ok(())
}

/// Shutdown via `mysqladmin`. The engine offers no reliable way to
/// distinguish "already stopped" from a real failure here, so a
/// nonzero exit (or a missing client binary) is reported as a warning
/// and not an error; known imprecision.
pub(super) async fn stop(bin_dir: &Path, port: u16) -> Result<()> {
    let port_arg = port.to_string();
    let result = run_engine_cmd(
        &bin_dir.join("mysqladmin"),
        &["--host=127.0.0.1", "--port", &port_arg, "-u", "root", "shutdown"],
    )
    .await;

    if let Err(e) = result {
        output::warning(&format!("mysql shutdown: {}", e));
    }
    Ok(())
}

pub(super) async fn status(port: u16) -> ServiceStatus {
    if probe::port_listening(port).await {
        ServiceStatus { running: true, pid: None, port: Some(port) }
    } else {
        ServiceStatus::stopped()
    }
}
