//! Post-extraction quarantine scrubbing.
//!
//! macOS tags downloaded files with a quarantine attribute that blocks
//! execution. After extraction the install tree is made writable and
//! the attribute is cleared recursively. Both steps are best-effort and
//! never fail the caller; other platforms have no equivalent concept.

use std::path::Path;

/// Clear quarantine attributes under `dir`. Never fails.
#[cfg(target_os = "macos")]
pub fn scrub(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;
    use std::process::Command;

    // xattr removal needs write permission on every entry first.
    for entry in walkdir::WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if let Ok(metadata) = entry.metadata() {
            let mut perms = metadata.permissions();
            perms.set_mode(perms.mode() | 0o200);
            let _ = std::fs::set_permissions(entry.path(), perms);
        }
    }

    let _ = Command::new("xattr")
        .args(["-dr", "com.apple.quarantine"])
        .arg(dir)
        .output();
}

/// No-op on platforms without download quarantine.
#[cfg(not(target_os = "macos"))]
pub fn scrub(_dir: &Path) {}
