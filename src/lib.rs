//! Toolchain lifecycle engine for side-by-side developer tools.
//!
//! Manages multiple installed versions of language runtimes and
//! embedded database engines under one state root, exposes exactly one
//! active version per tool through generated command shims, and
//! sequences stop/start of the stateful engines across version
//! switches.
//!
//! # Pipeline
//!
//! - [`extract`]: release archive -> directory tree (tar, tar.gz,
//!   tar.zst natively; zip via the OS utility)
//! - [`layout`]: find the real payload root behind upstream wrapper
//!   directories and promote it into the canonical install directory
//! - [`scrub`]: clear macOS quarantine attributes, best-effort
//! - [`shim`]: version-independent forwarding scripts
//! - [`service`]: initialize/start/stop/probe for PostgreSQL and MySQL
//! - [`lifecycle`]: the orchestrator tying it all together, backed by
//!   the [`store`] selection state
//!
//! # Example
//!
//! ```no_run
//! use toolchest::lifecycle::Lifecycle;
//! use toolchest::paths::Layout;
//! use toolchest::tool::ToolKind;
//! use std::path::Path;
//!
//! # async fn run() -> toolchest::error::Result<()> {
//! let engine = Lifecycle::new(Layout::new("/home/me/.toolchest"));
//! engine.install(ToolKind::Node, "20.11.1", Path::new("node.tar.gz")).await?;
//! engine.activate(ToolKind::Node, "20.11.1").await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extract;
pub mod layout;
pub mod lifecycle;
pub mod output;
pub mod pathenv;
pub mod paths;
pub mod scrub;
pub mod service;
pub mod shim;
pub mod store;
pub mod tool;

pub use error::{Error, Result};
pub use lifecycle::Lifecycle;
pub use paths::Layout;
pub use tool::ToolKind;
