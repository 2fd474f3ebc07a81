//! Archive extraction.
//!
//! Turns a release archive into a directory tree, optionally stripping
//! leading path segments from every entry. Tar-based formats are read
//! natively with a streaming entry parser; zstd archives are decoded as
//! one frame into memory first and then fed through the same parser;
//! zip is delegated to the OS `unzip` utility.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Supported archive formats, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Zip,
    Tar,
    TarGz,
    TarZst,
}

impl Format {
    /// Detect the format from a file name. Unknown extensions yield `None`.
    pub fn detect(archive: &Path) -> Option<Format> {
        let name = archive.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Format::TarGz)
        } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            Some(Format::TarZst)
        } else if name.ends_with(".tar") {
            Some(Format::Tar)
        } else if name.ends_with(".zip") {
            Some(Format::Zip)
        } else {
            None
        }
    }
}

/// Extract `archive` into `dest`, stripping `strip_levels` leading path
/// segments from every entry.
///
/// `dest` is created if missing. Entries that have no segments left
/// after stripping (the wrapper directories themselves) are skipped.
/// Strip levels do not apply to zip archives, which are handed to the
/// OS utility whole.
pub fn extract(archive: &Path, dest: &Path, strip_levels: usize) -> Result<()> {
    let format = Format::detect(archive).ok_or_else(|| {
        Error::UnsupportedFormat(archive.file_name().unwrap_or_default().to_string_lossy().into_owned())
    })?;

    std::fs::create_dir_all(dest)?;

    match format {
        Format::Zip => extract_zip_cli(archive, dest),
        Format::Tar => {
            let reader = BufReader::new(File::open(archive)?);
            extract_tar_stream(reader, dest, strip_levels)
        }
        Format::TarGz => {
            let reader = BufReader::new(File::open(archive)?);
            extract_tar_stream(flate2::read::GzDecoder::new(reader), dest, strip_levels)
        }
        Format::TarZst => {
            // No OS utility is assumed for zstd: decode the whole frame
            // into memory, then stream the bytes through the tar parser.
            let reader = BufReader::new(File::open(archive)?);
            let bytes = zstd::decode_all(reader)?;
            extract_tar_stream(&bytes[..], dest, strip_levels)
        }
    }
}

/// Remove the first `strip` segments from an entry path.
///
/// Returns `None` when the path has no segments left, meaning the entry
/// is one of the stripped wrapper directories and must be skipped.
fn strip_entry_path(path: &Path, strip: usize) -> Option<PathBuf> {
    let segments: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(seg) if !seg.is_empty() => Some(seg),
            _ => None,
        })
        .collect();

    if segments.len() <= strip {
        return None;
    }

    Some(segments[strip..].iter().collect())
}

/// Stream tar entries from `reader` into `dest`.
///
/// Directory entries are created recursively; file entries are written
/// with the archive's recorded permission bits; every other entry type
/// is skipped. Any entry write failure aborts the whole job.
fn extract_tar_stream<R: Read>(reader: R, dest: &Path, strip: usize) -> Result<()> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        // Reject paths that could escape the destination.
        if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
            return Err(Error::UnsafePath(path));
        }

        // Some archives contain a "." entry; treat it as a no-op.
        if path.as_os_str().is_empty() || path == Path::new(".") {
            continue;
        }

        let rel = match strip_entry_path(&path, strip) {
            Some(rel) => rel,
            None => continue,
        };
        let full_path = dest.join(rel);

        match entry.header().entry_type() {
            tar::EntryType::Directory => {
                std::fs::create_dir_all(&full_path)?;
            }
            tar::EntryType::Regular => {
                if let Some(parent) = full_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let mode = entry.header().mode().unwrap_or(0o644);
                let mut out = File::create(&full_path)?;
                std::io::copy(&mut entry, &mut out)?;
                set_mode(&full_path, mode)?;
            }
            // Symlinks, hardlinks, fifos etc. are not part of the
            // payload contract and are skipped without error.
            _ => continue,
        }
    }

    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Delegate zip extraction to the OS utility, surfacing its exit code.
fn extract_zip_cli(archive: &Path, dest: &Path) -> Result<()> {
    let mut cmd = Command::new("unzip");
    cmd.arg("-o").arg("-q").arg(archive).arg("-d").arg(dest);

    let display = format!("unzip -o -q {} -d {}", archive.display(), dest.display());
    let status = cmd.status().map_err(|_| Error::ExtractionFailed {
        cmd: display.clone(),
        code: None,
    })?;

    if !status.success() {
        return Err(Error::ExtractionFailed {
            cmd: display,
            code: status.code(),
        });
    }

    Ok(())
}
