//! Shared fixtures: synthetic release archives and a sandboxed engine.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use toolchest::lifecycle::Lifecycle;
use toolchest::paths::Layout;
use toolchest::shim::ShimOs;

/// A sandboxed engine rooted in a temp directory, with deterministic
/// Unix shims regardless of the host platform.
pub fn test_engine(root: &Path) -> Lifecycle {
    Lifecycle::new(Layout::new(root)).with_shim_os(ShimOs::Unix)
}

/// Build a tar.gz archive from (path, contents, mode) entries.
/// Paths ending in '/' become directory entries.
pub fn write_tar_gz(archive: &Path, entries: &[(&str, &[u8], u32)]) {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, content, mode) in entries {
        if path.ends_with('/') {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, *path, std::io::empty()).unwrap();
        } else {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, *path, *content).unwrap();
        }
    }
    let bytes = builder.into_inner().unwrap();

    let file = std::fs::File::create(archive).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(&bytes).unwrap();
    encoder.finish().unwrap();
}

/// A Node.js release archive: node-v<version>-linux-x64/bin/node.
pub fn node_archive(dir: &Path, version: &str) -> PathBuf {
    let archive = dir.join(format!("node-v{}-linux-x64.tar.gz", version));
    let wrapper = format!("node-v{}-linux-x64", version);
    let marker = format!("node {}", version);
    write_tar_gz(
        &archive,
        &[
            (&format!("{}/", wrapper), b"", 0o755),
            (&format!("{}/bin/", wrapper), b"", 0o755),
            (&format!("{}/bin/node", wrapper), marker.as_bytes(), 0o755),
            (&format!("{}/bin/npm", wrapper), b"npm", 0o755),
            (&format!("{}/bin/npx", wrapper), b"npx", 0o755),
        ],
    );
    archive
}

/// A PostgreSQL release archive whose `postgres` binary is a harmless
/// short-lived shell script, so start can actually spawn it.
pub fn postgres_archive(dir: &Path, version: &str) -> PathBuf {
    let archive = dir.join(format!("postgresql-{}-linux-x64.tar.gz", version));
    let server: &[u8] = b"#!/bin/sh\nsleep 2\n";
    write_tar_gz(
        &archive,
        &[
            ("pgsql/", b"", 0o755),
            ("pgsql/bin/", b"", 0o755),
            ("pgsql/bin/postgres", server, 0o755),
            ("pgsql/bin/psql", b"#!/bin/sh\n", 0o755),
            ("pgsql/bin/pg_dump", b"#!/bin/sh\n", 0o755),
            ("pgsql/bin/pg_restore", b"#!/bin/sh\n", 0o755),
        ],
    );
    archive
}
