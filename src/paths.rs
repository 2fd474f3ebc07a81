//! State root layout.
//!
//! Everything the engine persists lives under a single root directory
//! (default `$TOOLCHEST_HOME`, falling back to `~/.toolchest`):
//!
//! ```text
//! <root>/toolchains/<tool>/<version>/<platformKey>/   install trees
//! <root>/staging/<tool>-<version>/                    extraction staging
//! <root>/shims/                                       shared shim directory
//! <root>/data/<tool>/<version>/<cluster>/             engine data dirs
//! <root>/logs/<tool>/                                 engine log files
//! <root>/current.json                                 tool -> version map
//! ```

use std::path::{Path, PathBuf};

use crate::tool::ToolKind;

/// Platform key used to segregate install trees, e.g. `linux-x86_64`.
pub fn platform_key() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Default state root: `$TOOLCHEST_HOME` or `~/.toolchest`.
pub fn default_root() -> PathBuf {
    if let Ok(path) = std::env::var("TOOLCHEST_HOME") {
        return PathBuf::from(path);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".toolchest")
}

/// Resolves every path the engine reads or writes under one root.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    platform: String,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            platform: platform_key(),
        }
    }

    /// Override the platform key (used by tests).
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Root holding every installed version of one tool.
    pub fn tool_dir(&self, tool: ToolKind) -> PathBuf {
        self.root.join("toolchains").join(tool.dir_name())
    }

    pub fn version_dir(&self, tool: ToolKind, version: &str) -> PathBuf {
        self.tool_dir(tool).join(version)
    }

    /// Canonical install directory for (tool, version) on this platform.
    pub fn install_dir(&self, tool: ToolKind, version: &str) -> PathBuf {
        self.version_dir(tool, version).join(&self.platform)
    }

    /// Staging directory an archive is extracted into before
    /// normalization. Left in place when an install fails.
    pub fn staging_dir(&self, tool: ToolKind, version: &str) -> PathBuf {
        self.root
            .join("staging")
            .join(format!("{}-{}", tool.dir_name(), version))
    }

    pub fn shim_dir(&self) -> PathBuf {
        self.root.join("shims")
    }

    pub fn data_dir(&self, tool: ToolKind, version: &str, cluster: &str) -> PathBuf {
        self.root
            .join("data")
            .join(tool.dir_name())
            .join(version)
            .join(cluster)
    }

    /// All data directories for (tool, version), across clusters.
    pub fn data_version_dir(&self, tool: ToolKind, version: &str) -> PathBuf {
        self.root.join("data").join(tool.dir_name()).join(version)
    }

    pub fn log_file(&self, tool: ToolKind, version: &str, cluster: &str) -> PathBuf {
        self.root
            .join("logs")
            .join(tool.dir_name())
            .join(format!("{}-{}.log", version, cluster))
    }

    pub fn log_dir(&self, tool: ToolKind) -> PathBuf {
        self.root.join("logs").join(tool.dir_name())
    }

    pub fn selection_file(&self) -> PathBuf {
        self.root.join("current.json")
    }
}
