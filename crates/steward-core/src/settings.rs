//! Settings file loading and bootstrap
//!
//! The settings file is a single JSON document with two top-level
//! blocks: `globalState` (opaque seed key/value pairs for the secret
//! store) and `settings` (hierarchical configuration overrides whose
//! dot-path keys expand into the nested tree). A missing or corrupt
//! file degrades to empty state; that is logged, never fatal.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{StewardError, StewardResult};
use crate::host::HostContext;

/// Default settings file name inside the storage directory
pub const SETTINGS_FILE: &str = "settings.json";
/// Default MCP-style settings file name inside the storage directory
pub const MCP_SETTINGS_FILE: &str = "mcp_settings.json";

/// Parsed settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsFile {
    /// Opaque seed key/value pairs
    #[serde(default, rename = "globalState")]
    pub global_state: HashMap<String, Value>,
    /// Hierarchical overrides; dot-path keys are auto-expanded, later
    /// entries override earlier ones at the leaf
    #[serde(default)]
    pub settings: serde_json::Map<String, Value>,
}

impl SettingsFile {
    /// Load a settings file, degrading to empty state on any failure.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    "settings file {} not readable ({}); starting with empty settings",
                    path.display(),
                    e
                );
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(
                    "settings file {} is corrupt ({}); starting with empty settings",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Apply the file to a freshly built host: seed secrets from
    /// `globalState` and merge `settings` into the configuration tree.
    pub fn apply(&self, host: &HostContext) {
        host.secrets.seed(self.global_state.clone());
        host.workspace
            .config_merge(self.settings.clone().into_iter());
    }

    /// Serialize and write the file, creating parent directories.
    pub fn save(&self, path: &Path) -> StewardResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StewardError::config(format!("cannot create settings directory: {e}"))
            })?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| StewardError::config(format!("cannot serialize settings: {e}")))?;
        std::fs::write(path, content).map_err(|e| {
            StewardError::config(format!("cannot write {}: {}", path.display(), e))
        })?;
        Ok(())
    }
}

/// Write the default settings file and the MCP-style settings file into
/// the storage directory. Idempotent: files that already exist are left
/// untouched.
pub fn init_storage(storage_dir: &Path) -> StewardResult<Vec<std::path::PathBuf>> {
    std::fs::create_dir_all(storage_dir)
        .map_err(|e| StewardError::config(format!("cannot create storage directory: {e}")))?;

    let mut written = Vec::new();

    let settings_path = storage_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        SettingsFile::default().save(&settings_path)?;
        written.push(settings_path);
    }

    let mcp_path = storage_dir.join(MCP_SETTINGS_FILE);
    if !mcp_path.exists() {
        let empty = serde_json::json!({ "mcpServers": {} });
        std::fs::write(&mcp_path, serde_json::to_string_pretty(&empty)?)
            .map_err(|e| StewardError::config(format!("cannot write {}: {}", mcp_path.display(), e)))?;
        written.push(mcp_path);
    }

    Ok(written)
}
