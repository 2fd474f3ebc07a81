//! Layout normalization.
//!
//! Upstream release archives disagree about wrapper directories: some
//! nest everything under `dist-name-1.2.3/`, macOS JDK bundles nest a
//! second time under `Contents/Home`, and some ship the payload at the
//! archive root. Normalization finds the real payload root with
//! per-tool rules and promotes its contents into the canonical install
//! directory.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::tool::ToolKind;

/// One payload-root detection rule, tried in profile order.
#[derive(Debug, Clone, Copy)]
pub enum LayoutRule {
    /// A top-level directory whose name starts with a distribution
    /// prefix. `nested` lists fall-back subpaths inside it; the first
    /// one that exists becomes the payload root, else the directory
    /// itself.
    DirPrefix {
        prefix: &'static str,
        nested: &'static [&'static str],
    },
    /// A top-level directory whose name ends with a bundle suffix and
    /// contains one of the nested well-known subpaths.
    BundleSuffix {
        suffix: &'static str,
        nested: &'static [&'static str],
    },
    /// No wrapper at all: one of the marker entries exists directly at
    /// top level, so the extraction root is the payload root.
    BareTree { markers: &'static [&'static str] },
}

/// Find the payload root inside a freshly extracted tree.
pub fn find_payload_root(extracted_dir: &Path, tool: ToolKind) -> Result<PathBuf> {
    let entries = top_level_dirs(extracted_dir)?;

    for rule in tool.profile().layout_rules {
        match rule {
            LayoutRule::DirPrefix { prefix, nested } => {
                for dir in &entries {
                    if dir_name(dir).starts_with(prefix) {
                        return Ok(resolve_nested(dir, nested));
                    }
                }
            }
            LayoutRule::BundleSuffix { suffix, nested } => {
                for dir in &entries {
                    if !dir_name(dir).ends_with(suffix) {
                        continue;
                    }
                    for candidate in *nested {
                        let path = dir.join(candidate);
                        if path.is_dir() {
                            return Ok(path);
                        }
                    }
                }
            }
            LayoutRule::BareTree { markers } => {
                for marker in *markers {
                    if extracted_dir.join(marker).exists() {
                        return Ok(extracted_dir.to_path_buf());
                    }
                }
            }
        }
    }

    Err(Error::NoPayloadFound {
        tool,
        dir: extracted_dir.to_path_buf(),
    })
}

/// Normalize an extracted tree into the canonical install directory.
///
/// Every entry under the payload root is moved into `canonical_dir`.
/// A pre-existing destination entry of the same name is deleted first,
/// so re-running after a partial failure converges on the same result.
pub fn normalize(extracted_dir: &Path, canonical_dir: &Path, tool: ToolKind) -> Result<()> {
    let payload_root = find_payload_root(extracted_dir, tool)?;
    std::fs::create_dir_all(canonical_dir)?;

    for entry in std::fs::read_dir(&payload_root)? {
        let entry = entry?;
        let dest = canonical_dir.join(entry.file_name());

        if dest.exists() {
            if dest.is_dir() {
                std::fs::remove_dir_all(&dest)?;
            } else {
                std::fs::remove_file(&dest)?;
            }
        }

        std::fs::rename(entry.path(), &dest)?;
    }

    Ok(())
}

fn top_level_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn resolve_nested(dir: &Path, nested: &[&str]) -> PathBuf {
    for candidate in nested {
        let path = dir.join(candidate);
        if path.is_dir() {
            return path;
        }
    }
    dir.to_path_buf()
}
