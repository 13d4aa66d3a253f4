//! Window capability: visible editors and user-facing notifications
//!
//! In the graphical host these are editor tabs and toast popups; here
//! the visible-editor list is plain state and notifications go to the
//! log stream.

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::documents::{DocumentStore, TextDocument};
use crate::error::StewardResult;

/// Visible-editor tracking over the shared document store
#[derive(Debug)]
pub struct WindowShim {
    documents: Arc<DocumentStore>,
    visible: RwLock<Vec<PathBuf>>,
}

impl WindowShim {
    pub fn new(documents: Arc<DocumentStore>) -> Self {
        Self {
            documents,
            visible: RwLock::new(Vec::new()),
        }
    }

    /// Open the document and mark it visible.
    ///
    /// An already visible document moves to the front (the "active"
    /// slot) rather than appearing twice.
    pub fn show_document(&self, path: impl Into<PathBuf>) -> StewardResult<TextDocument> {
        let path = path.into();
        let doc = self.documents.open(&path)?;
        let mut visible = self.visible.write();
        visible.retain(|p| p != &path);
        visible.insert(0, path);
        Ok(doc)
    }

    /// Currently visible editors, most recently shown first.
    pub fn visible_editors(&self) -> Vec<PathBuf> {
        self.visible.read().clone()
    }

    /// The active (front-most) editor, if any.
    pub fn active_editor(&self) -> Option<PathBuf> {
        self.visible.read().first().cloned()
    }

    /// Remove a document from the visible list.
    pub fn hide_document(&self, path: &Path) {
        self.visible.write().retain(|p| p != path);
    }

    pub fn show_information_message(&self, message: &str) {
        tracing::info!("{message}");
    }

    pub fn show_warning_message(&self, message: &str) {
        tracing::warn!("{message}");
    }

    pub fn show_error_message(&self, message: &str) {
        tracing::error!("{message}");
    }
}
