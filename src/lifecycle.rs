//! Lifecycle orchestration: install, activate ("use"), uninstall.
//!
//! Sequences the extractor, normalizer, scrubber, shim writer, service
//! controller, and selection store. One user-driven operation at a
//! time per tool is assumed; there is no internal locking and no
//! rollback — a failed install leaves its staging directory in place
//! and is retried by running install again.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout::normalize;
use crate::output;
use crate::paths::Layout;
use crate::scrub::scrub;
use crate::service::{self, ServiceSettings, ServiceStatus};
use crate::shim::{remove_shims, write_shims, ShimOs, ShimSpec};
use crate::store::{JsonStore, SelectionStore};
use crate::tool::{ToolKind, ToolProfile};
use crate::extract::extract;

/// Orchestrates every operation against one state root.
pub struct Lifecycle {
    layout: Layout,
    store: Box<dyn SelectionStore>,
    shim_os: ShimOs,
}

impl Lifecycle {
    pub fn new(layout: Layout) -> Self {
        let store = JsonStore::new(layout.selection_file());
        Self {
            layout,
            store: Box::new(store),
            shim_os: ShimOs::current(),
        }
    }

    /// Substitute the selection store (tests use an in-memory one).
    pub fn with_store(mut self, store: Box<dyn SelectionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_shim_os(mut self, os: ShimOs) -> Self {
        self.shim_os = os;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Install (tool, version) from a local archive.
    ///
    /// Extract -> normalize -> scrub; any step failing aborts the
    /// operation and leaves the staging directory for inspection.
    /// Auto-activating engines also get a default cluster initialized
    /// and started.
    pub async fn install(&self, tool: ToolKind, version: &str, archive: &Path) -> Result<PathBuf> {
        let staging = self.layout.staging_dir(tool, version);
        let install_dir = self.layout.install_dir(tool, version);

        output::action(&format!("Installing {} {}", tool, version));

        let pb = output::spinner(&format!(
            "extracting {}",
            archive.file_name().unwrap_or_default().to_string_lossy()
        ));
        let result = {
            let archive = archive.to_path_buf();
            let staging = staging.clone();
            let install_dir = install_dir.clone();
            tokio::task::spawn_blocking(move || -> Result<()> {
                extract(&archive, &staging, 0)?;
                normalize(&staging, &install_dir, tool)?;
                scrub(&install_dir);
                Ok(())
            })
            .await
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
        };
        output::spinner_done(pb);
        result?;

        // Staging only holds leftovers of the wrapper directories now.
        let _ = tokio::fs::remove_dir_all(&staging).await;
        output::detail(&format!("installed into {}", install_dir.display()));

        if let Some(defaults) = tool.profile().service {
            if defaults.auto_activate {
                let settings = ServiceSettings::defaults(tool).expect("stateful profile");
                // A re-install must not launch a second engine against a
                // cluster that is already serving.
                let data_dir = self.layout.data_dir(tool, version, &settings.cluster);
                if !service::is_running(tool, &data_dir, settings.port).await {
                    self.init_and_start(tool, version, &install_dir, &settings).await?;
                }
            }
        }

        Ok(install_dir)
    }

    /// Make `version` the active one for `tool`, rewriting shims and
    /// sequencing the service handover for stateful engines. An empty
    /// version deactivates the tool entirely.
    pub async fn activate(&self, tool: ToolKind, version: &str) -> Result<()> {
        if version.is_empty() {
            return self.deactivate(tool).await;
        }

        let install_dir = self.layout.install_dir(tool, version);
        if !install_dir.is_dir() {
            return Err(Error::NotInstalled {
                tool,
                version: version.to_string(),
            });
        }

        let mut selection = self.store.load()?;
        let previous = selection.get(tool).map(str::to_string);

        // Stop the outgoing version first so two engine versions never
        // serve the same port at once. Best-effort: a failed stop is
        // logged and the switch continues.
        if tool.is_stateful() {
            if let Some(prev) = previous.as_deref() {
                if prev != version {
                    self.stop_if_running(tool, prev).await;
                }
            }
        }

        let profile = tool.profile();
        write_shims(self.shim_os, &self.layout.shim_dir(), &shim_specs(profile, &install_dir))?;

        selection.set(tool, version);
        self.store.save(&selection)?;

        if tool.is_stateful() {
            let settings = ServiceSettings::defaults(tool).expect("stateful profile");
            let data_dir = self.layout.data_dir(tool, version, &settings.cluster);
            if !service::is_running(tool, &data_dir, settings.port).await {
                // Start failures do not abort the switch; the shims and
                // selection already point at the new version and the
                // caller can inspect status afterwards.
                if let Err(e) = self.init_and_start(tool, version, &install_dir, &settings).await {
                    output::warning(&format!("{} {} did not start: {}", tool, version, e));
                }
            }
        }

        output::success(&format!("{} {} is now active", tool, version));
        Ok(())
    }

    /// Unset the active version: stop its service (if running), remove
    /// the tool's shims, and clear the selection entry.
    pub async fn deactivate(&self, tool: ToolKind) -> Result<()> {
        let mut selection = self.store.load()?;

        if tool.is_stateful() {
            if let Some(version) = selection.get(tool).map(str::to_string) {
                self.stop_if_running(tool, &version).await;
            }
        }

        remove_shims(self.shim_os, &self.layout.shim_dir(), &tool.profile().shim_names())?;
        selection.clear(tool);
        self.store.save(&selection)?;

        output::info(&format!("{} deactivated", tool));
        Ok(())
    }

    /// Remove an installed version and, for stateful engines, its data
    /// and log directories.
    ///
    /// Deliberately does not stop a service that may still be running
    /// against the deleted data directory; deactivate first for a
    /// clean stop.
    pub async fn uninstall(&self, tool: ToolKind, version: &str) -> Result<()> {
        remove_dir_if_present(&self.layout.version_dir(tool, version)).await?;

        if tool.is_stateful() {
            remove_dir_if_present(&self.layout.data_version_dir(tool, version)).await?;
            remove_version_logs(&self.layout.log_dir(tool), version).await?;
        }

        let mut selection = self.store.load()?;
        if selection.get(tool) == Some(version) {
            remove_shims(self.shim_os, &self.layout.shim_dir(), &tool.profile().shim_names())?;
            selection.clear(tool);
            self.store.save(&selection)?;
        }

        output::info(&format!("{} {} uninstalled", tool, version));
        Ok(())
    }

    /// Installed versions of `tool` that resolve to a valid install
    /// path on this platform, version-sorted.
    pub fn list_installed(&self, tool: ToolKind) -> Result<Vec<String>> {
        let tool_dir = self.layout.tool_dir(tool);
        if !tool_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&tool_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let version = entry.file_name().to_string_lossy().into_owned();
            if self.layout.install_dir(tool, &version).is_dir() {
                versions.push(version);
            }
        }

        versions.sort_by(|a, b| compare_versions(a, b));
        Ok(versions)
    }

    /// The persisted active version, if any.
    pub fn current_version(&self, tool: ToolKind) -> Result<Option<String>> {
        Ok(self.store.load()?.get(tool).map(str::to_string))
    }

    /// Probe the default cluster of (tool, version).
    pub async fn service_status(&self, tool: ToolKind, version: &str) -> ServiceStatus {
        match ServiceSettings::defaults(tool) {
            Some(settings) => {
                let data_dir = self.layout.data_dir(tool, version, &settings.cluster);
                service::status(tool, &data_dir, settings.port).await
            }
            None => ServiceStatus::stopped(),
        }
    }

    /// Initialize (idempotent) and start the default cluster of an
    /// installed version.
    pub async fn service_start(&self, tool: ToolKind, version: &str) -> Result<()> {
        let install_dir = self.layout.install_dir(tool, version);
        if !install_dir.is_dir() {
            return Err(Error::NotInstalled {
                tool,
                version: version.to_string(),
            });
        }
        let settings = match ServiceSettings::defaults(tool) {
            Some(settings) => settings,
            None => return Ok(()),
        };
        self.init_and_start(tool, version, &install_dir, &settings).await
    }

    /// Stop the default cluster of an installed version.
    pub async fn service_stop(&self, tool: ToolKind, version: &str) -> Result<()> {
        let settings = match ServiceSettings::defaults(tool) {
            Some(settings) => settings,
            None => return Ok(()),
        };
        let install_dir = self.layout.install_dir(tool, version);
        let data_dir = self.layout.data_dir(tool, version, &settings.cluster);
        service::stop(tool, &install_dir.join("bin"), &data_dir, settings.port).await
    }

    async fn init_and_start(
        &self,
        tool: ToolKind,
        version: &str,
        install_dir: &Path,
        settings: &ServiceSettings,
    ) -> Result<()> {
        let bin_dir = install_dir.join("bin");
        let data_dir = self.layout.data_dir(tool, version, &settings.cluster);
        let log_file = self.layout.log_file(tool, version, &settings.cluster);

        service::initialize(tool, &bin_dir, &data_dir, settings).await?;
        service::start(tool, &bin_dir, &data_dir, &log_file, settings.port).await
    }

    async fn stop_if_running(&self, tool: ToolKind, version: &str) {
        let settings = match ServiceSettings::defaults(tool) {
            Some(settings) => settings,
            None => return,
        };
        let data_dir = self.layout.data_dir(tool, version, &settings.cluster);
        if !service::is_running(tool, &data_dir, settings.port).await {
            return;
        }

        let bin_dir = self.layout.install_dir(tool, version).join("bin");
        if let Err(e) = service::stop(tool, &bin_dir, &data_dir, settings.port).await {
            output::warning(&format!("could not stop {} {}: {}", tool, version, e));
        }
    }
}

/// Shims for one installed version: targets resolved against its
/// canonical install directory.
fn shim_specs(profile: &ToolProfile, install_dir: &Path) -> Vec<ShimSpec> {
    profile
        .shims
        .iter()
        .map(|def| {
            ShimSpec::new(def.name, install_dir.join(def.target))
                .with_args(def.args.iter().copied())
        })
        .collect()
}

// Install and data trees can be large; removing them goes through
// tokio::fs so the runtime worker is not blocked.
async fn remove_dir_if_present(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn remove_version_logs(log_dir: &Path, version: &str) -> Result<()> {
    if !log_dir.is_dir() {
        return Ok(());
    }
    let prefix = format!("{}-", version);
    let mut entries = tokio::fs::read_dir(log_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

/// Semver ordering where both sides parse, lexicographic otherwise.
fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_versions_semver_aware() {
        let mut versions = vec!["10.1.0".to_string(), "9.2.0".to_string(), "10.0.1".to_string()];
        versions.sort_by(|a, b| compare_versions(a, b));
        assert_eq!(versions, vec!["9.2.0", "10.0.1", "10.1.0"]);
    }

    #[test]
    fn test_compare_versions_fallback() {
        assert_eq!(compare_versions("main", "dev"), std::cmp::Ordering::Greater);
    }

    #[test]
    fn test_shim_specs_resolve_targets() {
        let specs = shim_specs(ToolKind::Node.profile(), Path::new("/root/node/20/linux-x86_64"));
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].name, "node");
        assert_eq!(specs[0].target, Path::new("/root/node/20/linux-x86_64/bin/node"));
    }

    #[tokio::test]
    async fn test_remove_dir_if_present_tolerates_absent() {
        remove_dir_if_present(Path::new("/nonexistent/toolchest-test")).await.unwrap();
    }
}
