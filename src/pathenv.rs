//! PATH registration against a shell startup file.
//!
//! Collaborator boundary: the orchestrator only needs "the shim
//! directory is on PATH" to be ensurable and removable, idempotently.
//! Detection is line containment against the startup file; adding twice
//! never duplicates, removing an absent entry never errors.

use std::path::Path;

use crate::error::Result;

/// The line appended to the startup file for a given shim directory.
fn export_line(shim_dir: &Path) -> String {
    format!("export PATH=\"{}:$PATH\"", shim_dir.display())
}

/// True if the startup file already registers `shim_dir`.
pub fn is_registered(rc_file: &Path, shim_dir: &Path) -> Result<bool> {
    if !rc_file.exists() {
        return Ok(false);
    }
    let contents = std::fs::read_to_string(rc_file)?;
    let line = export_line(shim_dir);
    Ok(contents.lines().any(|l| l.trim() == line))
}

/// Append the PATH line to the startup file unless already present.
pub fn register(rc_file: &Path, shim_dir: &Path) -> Result<()> {
    if is_registered(rc_file, shim_dir)? {
        return Ok(());
    }

    if let Some(parent) = rc_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut contents = if rc_file.exists() {
        std::fs::read_to_string(rc_file)?
    } else {
        String::new()
    };
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&export_line(shim_dir));
    contents.push('\n');
    std::fs::write(rc_file, contents)?;
    Ok(())
}

/// Remove the PATH line from the startup file; absent entries are fine.
pub fn deregister(rc_file: &Path, shim_dir: &Path) -> Result<()> {
    if !rc_file.exists() {
        return Ok(());
    }

    let line = export_line(shim_dir);
    let contents = std::fs::read_to_string(rc_file)?;
    let kept: Vec<&str> = contents.lines().filter(|l| l.trim() != line).collect();
    let mut rewritten = kept.join("\n");
    if !rewritten.is_empty() {
        rewritten.push('\n');
    }
    std::fs::write(rc_file, rewritten)?;
    Ok(())
}
