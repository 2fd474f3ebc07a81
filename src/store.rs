//! Durable current-selection state.
//!
//! The tool -> version map is loaded and saved through an injectable
//! store so the orchestrator never touches ambient file state directly
//! and tests can substitute an in-memory implementation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tool::ToolKind;

/// The persisted tool -> version mapping. An absent entry means the
/// tool has no active version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentSelection {
    #[serde(flatten)]
    versions: BTreeMap<ToolKind, String>,
}

impl CurrentSelection {
    pub fn get(&self, tool: ToolKind) -> Option<&str> {
        self.versions.get(&tool).map(String::as_str)
    }

    pub fn set(&mut self, tool: ToolKind, version: impl Into<String>) {
        self.versions.insert(tool, version.into());
    }

    pub fn clear(&mut self, tool: ToolKind) {
        self.versions.remove(&tool);
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ToolKind, &str)> {
        self.versions.iter().map(|(t, v)| (*t, v.as_str()))
    }
}

/// Load/save boundary for the selection map.
pub trait SelectionStore: Send + Sync {
    fn load(&self) -> Result<CurrentSelection>;
    fn save(&self, selection: &CurrentSelection) -> Result<()>;
}

/// File-backed store over `current.json`. A missing file reads as an
/// empty selection.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SelectionStore for JsonStore {
    fn load(&self) -> Result<CurrentSelection> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(CurrentSelection::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, selection: &CurrentSelection) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(selection)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<CurrentSelection>,
}

impl SelectionStore for MemoryStore {
    fn load(&self) -> Result<CurrentSelection> {
        Ok(self.state.lock().unwrap().clone())
    }

    fn save(&self, selection: &CurrentSelection) -> Result<()> {
        *self.state.lock().unwrap() = selection.clone();
        Ok(())
    }
}
