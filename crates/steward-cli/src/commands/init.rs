//! The `init` command: bootstrap the storage directory.

use std::path::PathBuf;

use steward_core::error::StewardResult;
use steward_core::settings;

use crate::console::CLIConsole;

pub fn execute(storage: Option<PathBuf>, console: &CLIConsole) -> StewardResult<()> {
    let storage = super::resolve_storage(storage)?;
    let written = settings::init_storage(&storage)?;
    if written.is_empty() {
        console.success(&format!(
            "storage {} already initialized",
            storage.display()
        ));
    } else {
        for path in written {
            console.success(&format!("wrote {}", path.display()));
        }
    }
    Ok(())
}
