//! Liveness probes.
//!
//! Two strategies: read a pid file and probe process existence with
//! `kill(pid, 0)`, or ask the OS whether a port is in the listening
//! state. Both are best-effort; a stale pid file whose pid the OS has
//! recycled to an unrelated process yields an accepted false positive.

use std::path::Path;

use tokio::process::Command;

/// True if a process with `pid` exists (signal 0 probe).
#[cfg(unix)]
pub fn pid_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    unsafe { libc::kill(pid, 0) == 0 }
}

#[cfg(not(unix))]
pub fn pid_alive(_pid: i32) -> bool {
    false
}

/// Read a pid from the first line of a pid file.
pub fn read_pid_file(path: &Path) -> Option<i32> {
    let contents = std::fs::read_to_string(path).ok()?;
    contents.lines().next()?.trim().parse().ok()
}

/// True if some process is listening on `port` (loopback or any).
#[cfg(target_os = "macos")]
pub async fn port_listening(port: u16) -> bool {
    // lsof exits nonzero when nothing matches.
    Command::new("lsof")
        .args(["-nP", &format!("-iTCP:{}", port), "-sTCP:LISTEN"])
        .output()
        .await
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[cfg(all(unix, not(target_os = "macos")))]
pub async fn port_listening(port: u16) -> bool {
    let output = match Command::new("ss").args(["-ltn"]).output().await {
        Ok(out) => out,
        Err(_) => return false,
    };

    let suffix = format!(":{}", port);
    String::from_utf8_lossy(&output.stdout).lines().any(|line| {
        line.split_whitespace()
            .nth(3)
            .map(|addr| addr.ends_with(&suffix))
            .unwrap_or(false)
    })
}

#[cfg(not(unix))]
pub async fn port_listening(_port: u16) -> bool {
    false
}
