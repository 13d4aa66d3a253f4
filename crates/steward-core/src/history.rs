//! Durable task history
//!
//! A JSON array of history items, read once at startup for resume
//! lookups and rewritten wholesale at process exit. Unknown fields on
//! items (token counts, cost figures written by other hosts) are
//! carried opaquely so a rewrite does not destroy them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{StewardError, StewardResult};

/// Default task-history file name inside the storage directory
pub const HISTORY_FILE: &str = "task_history.json";

/// One completed or in-flight task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskHistoryItem {
    pub id: String,
    pub task: String,
    pub ts: i64,
    /// Fields other hosts persist that we do not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl TaskHistoryItem {
    /// Build a new item with a fresh id, stamped with the current time.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task: task.into(),
            ts: chrono::Utc::now().timestamp_millis(),
            extra: serde_json::Map::new(),
        }
    }
}

/// File-backed task-history list
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    items: Vec<TaskHistoryItem>,
}

impl HistoryStore {
    /// Read the history file once. A missing or corrupt file degrades
    /// to an empty list; logged, not fatal.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(
                        "task history {} is corrupt ({}); starting empty",
                        path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    "task history {} not readable ({}); starting empty",
                    path.display(),
                    e
                );
                Vec::new()
            }
        };
        Self { path, items }
    }

    /// All items, oldest first.
    pub fn items(&self) -> &[TaskHistoryItem] {
        &self.items
    }

    /// Append a new item.
    pub fn push(&mut self, item: TaskHistoryItem) {
        self.items.push(item);
    }

    /// The most recent item whose task text matches exactly.
    pub fn find_by_task(&self, task: &str) -> Option<&TaskHistoryItem> {
        self.items.iter().rev().find(|item| item.task == task)
    }

    /// Rewrite the whole file from the in-memory list.
    pub fn save(&self) -> StewardResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StewardError::config(format!("cannot create history directory: {e}"))
            })?;
        }
        let content = serde_json::to_string_pretty(&self.items)?;
        std::fs::write(&self.path, content).map_err(|e| {
            StewardError::config(format!("cannot write {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
