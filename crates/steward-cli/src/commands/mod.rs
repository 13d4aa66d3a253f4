//! CLI commands

pub mod init;
pub mod task;

use std::path::PathBuf;

use steward_core::error::{StewardError, StewardResult};

use crate::args::DEFAULT_STORAGE_DIR;

/// Resolve the storage directory, defaulting to `~/.steward`.
pub(crate) fn resolve_storage(storage: Option<PathBuf>) -> StewardResult<PathBuf> {
    match storage {
        Some(path) => Ok(path),
        None => dirs::home_dir()
            .map(|home| home.join(DEFAULT_STORAGE_DIR))
            .ok_or_else(|| {
                StewardError::config("cannot determine the home directory; pass --storage")
            }),
    }
}
