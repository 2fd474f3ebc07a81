//! Forwarding shims.
//!
//! A shim is a small script under a fixed command name that invokes the
//! currently selected version's real binary. Shim files are named by
//! command only, so PATH never changes across version switches; only
//! file contents are rewritten.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Target platform for shim script bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShimOs {
    Unix,
    Windows,
}

impl ShimOs {
    /// The platform this build runs on.
    pub fn current() -> ShimOs {
        if cfg!(windows) {
            ShimOs::Windows
        } else {
            ShimOs::Unix
        }
    }
}

/// One shim to emit: command name, absolute target binary, and a fixed
/// argument prefix inserted before the caller's arguments.
#[derive(Debug, Clone)]
pub struct ShimSpec {
    pub name: String,
    pub target: PathBuf,
    pub arg_prefix: Vec<String>,
}

impl ShimSpec {
    pub fn new(name: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            arg_prefix: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arg_prefix = args.into_iter().map(Into::into).collect();
        self
    }

    /// File name of the shim on the given platform.
    pub fn file_name(&self, os: ShimOs) -> String {
        match os {
            ShimOs::Unix => self.name.clone(),
            ShimOs::Windows => format!("{}.cmd", self.name),
        }
    }
}

/// Write one shim script per spec into `shim_dir`, overwriting whole
/// files in place.
pub fn write_shims(os: ShimOs, shim_dir: &Path, specs: &[ShimSpec]) -> Result<()> {
    std::fs::create_dir_all(shim_dir)?;

    for spec in specs {
        let path = shim_dir.join(spec.file_name(os));
        let body = shim_body(os, spec);
        std::fs::write(&path, body)?;
        if os == ShimOs::Unix {
            make_executable(&path)?;
        }
    }

    Ok(())
}

/// Delete the shim files for `names`. Missing files are not an error.
pub fn remove_shims(os: ShimOs, shim_dir: &Path, names: &[String]) -> Result<()> {
    for name in names {
        let spec = ShimSpec::new(name.clone(), "");
        let path = shim_dir.join(spec.file_name(os));
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Script body: quote the target, splice the fixed prefix, forward all
/// caller arguments with boundaries intact, propagate the exit code.
fn shim_body(os: ShimOs, spec: &ShimSpec) -> String {
    match os {
        ShimOs::Unix => {
            let mut line = format!("exec \"{}\"", spec.target.display());
            for arg in &spec.arg_prefix {
                line.push_str(&format!(" \"{}\"", arg));
            }
            line.push_str(" \"$@\"");
            format!("#!/bin/sh\n{}\n", line)
        }
        ShimOs::Windows => {
            let mut line = format!("@\"{}\"", spec.target.display());
            for arg in &spec.arg_prefix {
                line.push_str(&format!(" \"{}\"", arg));
            }
            line.push_str(" %*");
            format!("@echo off\r\n{}\r\nexit /b %ERRORLEVEL%\r\n", line)
        }
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
