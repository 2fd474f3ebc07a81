//! Error types for the toolchain lifecycle engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::tool::ToolKind;

/// Errors that can occur during install, activation, and service control.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("extraction command failed: {cmd} (exit code: {code:?})")]
    ExtractionFailed { cmd: String, code: Option<i32> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive contains unsafe path: {}", .0.display())]
    UnsafePath(PathBuf),

    #[error("no {tool} payload found under {}", .dir.display())]
    NoPayloadFound { tool: ToolKind, dir: PathBuf },

    #[error("service command failed: {cmd} (exit code: {code:?})\nstderr: {stderr}")]
    ServiceCommandFailed {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} {version} is not installed")]
    NotInstalled { tool: ToolKind, version: String },

    #[error("state file error: {0}")]
    State(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
