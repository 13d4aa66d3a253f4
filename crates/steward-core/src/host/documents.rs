//! Open document tabs with cached text snapshots
//!
//! Snapshots are read-only and refresh only on an explicit external
//! change notification; nothing here ever polls the filesystem.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{StewardError, StewardResult};

/// A read-only in-memory snapshot of a file
#[derive(Debug, Clone, PartialEq)]
pub struct TextDocument {
    pub path: PathBuf,
    pub text: String,
    /// Bumped each time an external change notification refreshes the snapshot
    pub version: u64,
}

impl TextDocument {
    /// Number of lines in the snapshot.
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

/// The set of open document tabs
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: RwLock<HashMap<PathBuf, TextDocument>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document, reading its content from disk.
    ///
    /// Re-opening an already open document returns the cached snapshot
    /// unchanged; the cache refreshes only via [`Self::notify_changed`].
    pub fn open(&self, path: impl Into<PathBuf>) -> StewardResult<TextDocument> {
        let path = path.into();
        if let Some(doc) = self.docs.read().get(&path) {
            return Ok(doc.clone());
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|e| StewardError::host(format!("cannot open {}: {}", path.display(), e)))?;
        let doc = TextDocument {
            path: path.clone(),
            text,
            version: 0,
        };
        self.docs.write().insert(path, doc.clone());
        Ok(doc)
    }

    /// The cached snapshot for an open document, `None` when not open.
    pub fn get(&self, path: &Path) -> Option<TextDocument> {
        self.docs.read().get(path).cloned()
    }

    /// Whether the document is currently open.
    pub fn is_open(&self, path: &Path) -> bool {
        self.docs.read().contains_key(path)
    }

    /// External file-change notification: re-read the snapshot from disk.
    ///
    /// A no-op for documents that are not open. If the file vanished the
    /// tab is closed.
    pub fn notify_changed(&self, path: &Path) {
        let mut docs = self.docs.write();
        let Some(doc) = docs.get_mut(path) else {
            return;
        };
        match std::fs::read_to_string(path) {
            Ok(text) => {
                doc.text = text;
                doc.version += 1;
            }
            Err(e) => {
                tracing::warn!("document {} disappeared: {}; closing tab", path.display(), e);
                docs.remove(path);
            }
        }
    }

    /// Close a document tab.
    pub fn close(&self, path: &Path) -> Option<TextDocument> {
        self.docs.write().remove(path)
    }

    /// Paths of all open documents.
    pub fn open_paths(&self) -> Vec<PathBuf> {
        self.docs.read().keys().cloned().collect()
    }
}
