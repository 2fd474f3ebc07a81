//! Service control for stateful engines.
//!
//! Each engine moves through Uninitialized -> Initialized(stopped) ->
//! Running and back. Initialization is idempotent via an
//! engine-specific marker; starting is launch-and-forget with a short
//! grace delay, and readiness is only observable through the separate
//! liveness probe.

mod mysql;
mod postgres;
pub mod probe;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Error, Result};
use crate::tool::ToolKind;

/// Fixed delay after spawning an engine before the call returns. The
/// engine is not awaited to readiness.
pub const START_GRACE: Duration = Duration::from_millis(800);

/// How clients authenticate against a freshly initialized cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Trust,
    Password,
}

/// Parameters for one named cluster of an engine version.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub cluster: String,
    pub port: u16,
    pub auth: AuthMode,
}

impl ServiceSettings {
    /// The profile's default cluster and port.
    pub fn defaults(tool: ToolKind) -> Option<ServiceSettings> {
        tool.profile().service.map(|s| ServiceSettings {
            cluster: s.default_cluster.to_string(),
            port: s.default_port,
            auth: AuthMode::Trust,
        })
    }
}

/// Outcome of `initialize`: both are success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initialized {
    Fresh,
    AlreadyInitialized,
}

/// Result of the liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatus {
    pub running: bool,
    pub pid: Option<i32>,
    pub port: Option<u16>,
}

impl ServiceStatus {
    pub fn stopped() -> ServiceStatus {
        ServiceStatus { running: false, pid: None, port: None }
    }
}

/// One-time data directory initialization.
///
/// If the engine's marker is already present the existing data is left
/// untouched and `AlreadyInitialized` is returned.
pub async fn initialize(
    tool: ToolKind,
    bin_dir: &Path,
    data_dir: &Path,
    settings: &ServiceSettings,
) -> Result<Initialized> {
    match tool {
        ToolKind::Postgres => postgres::initialize(bin_dir, data_dir, settings).await,
        ToolKind::Mysql => mysql::initialize(bin_dir, data_dir, settings).await,
        _ => Ok(Initialized::AlreadyInitialized),
    }
}

/// Launch the engine detached, with stdout/stderr appended to
/// `log_file`, then wait only [`START_GRACE`].
pub async fn start(
    tool: ToolKind,
    bin_dir: &Path,
    data_dir: &Path,
    log_file: &Path,
    port: u16,
) -> Result<()> {
    match tool {
        ToolKind::Postgres => postgres::start(bin_dir, data_dir, log_file, port).await?,
        ToolKind::Mysql => mysql::start(bin_dir, data_dir, log_file, port).await?,
        _ => return Ok(()),
    }

    tokio::time::sleep(START_GRACE).await;
    Ok(())
}

/// Invoke the engine's native shutdown command.
pub async fn stop(tool: ToolKind, bin_dir: &Path, data_dir: &Path, port: u16) -> Result<()> {
    match tool {
        ToolKind::Postgres => postgres::stop(bin_dir, data_dir).await,
        ToolKind::Mysql => mysql::stop(bin_dir, port).await,
        _ => Ok(()),
    }
}

/// Stop then start the same cluster.
pub async fn restart(
    tool: ToolKind,
    bin_dir: &Path,
    data_dir: &Path,
    log_file: &Path,
    port: u16,
) -> Result<()> {
    stop(tool, bin_dir, data_dir, port).await?;
    start(tool, bin_dir, data_dir, log_file, port).await
}

/// Best-effort liveness probe; can under- or over-report after abrupt
/// crashes (stale pid files are not disambiguated by process name).
pub async fn status(tool: ToolKind, data_dir: &Path, port: u16) -> ServiceStatus {
    match tool {
        ToolKind::Postgres => postgres::status(data_dir, port),
        ToolKind::Mysql => mysql::status(port).await,
        _ => ServiceStatus::stopped(),
    }
}

pub async fn is_running(tool: ToolKind, data_dir: &Path, port: u16) -> bool {
    status(tool, data_dir, port).await.running
}

/// Run an engine administration command to completion, surfacing a
/// nonzero exit as `ServiceCommandFailed` with its stderr.
pub(crate) async fn run_engine_cmd(program: &Path, args: &[&str]) -> Result<()> {
    let display = format!("{} {}", program.display(), args.join(" "));

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| Error::ServiceCommandFailed {
            cmd: display.clone(),
            code: None,
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::ServiceCommandFailed {
            cmd: display,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(())
}

/// Spawn an engine detached with both output streams appended to the
/// log file. The child is never awaited; a later nonzero exit is not
/// observed by this call.
pub(crate) fn spawn_detached(program: &Path, args: &[String], log_file: &Path) -> Result<u32> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;
    let log_err = log.try_clone()?;

    let child = Command::new(program)
        .args(args)
        .stdin(std::process::Stdio::null())
        .stdout(log)
        .stderr(log_err)
        .spawn()
        .map_err(|e| Error::ServiceCommandFailed {
            cmd: format!("{} {}", program.display(), args.join(" ")),
            code: None,
            stderr: e.to_string(),
        })?;

    Ok(child.id().unwrap_or(0))
}

/// Append hardening lines to a generated engine config file.
pub(crate) fn append_config(path: &PathBuf, lines: &[String]) -> Result<()> {
    let mut contents = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    for line in lines {
        contents.push_str(line);
        contents.push('\n');
    }
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_only_for_stateful_tools() {
        assert!(ServiceSettings::defaults(ToolKind::Node).is_none());
        let pg = ServiceSettings::defaults(ToolKind::Postgres).unwrap();
        assert_eq!(pg.port, 5432);
        assert_eq!(pg.cluster, "main");
        let my = ServiceSettings::defaults(ToolKind::Mysql).unwrap();
        assert_eq!(my.port, 3306);
    }

    #[tokio::test]
    async fn test_stateless_tools_noop() {
        let temp = tempfile::tempdir().unwrap();
        let settings = ServiceSettings {
            cluster: "main".into(),
            port: 0,
            auth: AuthMode::Trust,
        };

        let init = initialize(ToolKind::Node, temp.path(), temp.path(), &settings)
            .await
            .unwrap();
        assert_eq!(init, Initialized::AlreadyInitialized);
        assert!(!is_running(ToolKind::Node, temp.path(), 0).await);
    }

    #[test]
    fn test_append_config_creates_and_appends() {
        let temp = tempfile::tempdir().unwrap();
        let conf = temp.path().join("postgresql.conf");
        std::fs::write(&conf, "max_connections = 100").unwrap();

        append_config(&conf, &["port = 5433".to_string()]).unwrap();

        let contents = std::fs::read_to_string(&conf).unwrap();
        assert_eq!(contents, "max_connections = 100\nport = 5433\n");
    }

    #[tokio::test]
    async fn test_run_engine_cmd_surfaces_exit_code() {
        let err = run_engine_cmd(Path::new("/bin/sh"), &["-c", "echo boom >&2; exit 3"])
            .await
            .unwrap_err();
        match err {
            Error::ServiceCommandFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_spawn_detached_redirects_log() {
        let temp = tempfile::tempdir().unwrap();
        let log = temp.path().join("logs/engine.log");

        let pid = spawn_detached(
            Path::new("/bin/sh"),
            &["-c".to_string(), "echo started".to_string()],
            &log,
        )
        .unwrap();
        assert!(pid > 0);

        // Give the short-lived child a moment to write and exit.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let contents = std::fs::read_to_string(&log).unwrap();
        assert!(contents.contains("started"));
    }

    #[tokio::test]
    async fn test_spawn_failure_reported() {
        let temp = tempfile::tempdir().unwrap();
        let err = spawn_detached(
            Path::new("/nonexistent/engine-binary"),
            &[],
            &temp.path().join("engine.log"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ServiceCommandFailed { code: None, .. }));
    }
}
