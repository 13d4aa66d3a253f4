//! Workspace capability: rooted file edits and configuration lookup

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{StewardError, StewardResult};

/// A zero-based line/character position within a document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub const fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// A half-open text span between two positions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Workspace shim: root path plus the merged configuration tree
#[derive(Debug)]
pub struct WorkspaceShim {
    root: PathBuf,
    config: RwLock<Value>,
}

impl WorkspaceShim {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config: RwLock::new(Value::Object(serde_json::Map::new())),
        }
    }

    /// The workspace root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replace a text range in a file on disk.
    ///
    /// Reads the file, splices lines by row/column, writes the whole
    /// content back. Any failure aborts the edit before anything is
    /// written; there is no partial write and no retry.
    pub fn apply_edit(&self, path: &Path, range: Range, replacement: &str) -> StewardResult<()> {
        let path = self.resolve(path);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| StewardError::host(format!("cannot read {}: {}", path.display(), e)))?;

        let edited = splice(&content, range, replacement)?;

        std::fs::write(&path, edited)
            .map_err(|e| StewardError::host(format!("cannot write {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Resolve a dotted configuration key through the merged tree.
    ///
    /// Missing segments yield the provided default.
    pub fn config_get(&self, dotted_key: &str, default: Value) -> Value {
        let config = self.config.read();
        let mut node = &*config;
        for segment in dotted_key.split('.') {
            match node.get(segment) {
                Some(next) => node = next,
                None => return default,
            }
        }
        node.clone()
    }

    /// Merge a flat map of overrides into the configuration tree.
    ///
    /// Dot-path keys expand into nested objects; later entries override
    /// earlier ones at the leaf.
    pub fn config_merge(&self, overrides: impl IntoIterator<Item = (String, Value)>) {
        let mut config = self.config.write();
        for (key, value) in overrides {
            let expanded = expand_dotted_key(&key, value);
            deep_merge(&mut config, expanded);
        }
    }

    /// Snapshot of the full configuration tree.
    pub fn config_snapshot(&self) -> Value {
        self.config.read().clone()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Splice `replacement` over `range` in `content`, by line and
/// character offset. Out-of-range coordinates fail the whole edit.
fn splice(content: &str, range: Range, replacement: &str) -> StewardResult<String> {
    let lines: Vec<&str> = content.split('\n').collect();

    let start_line = lines
        .get(range.start.line)
        .ok_or_else(|| StewardError::host(format!("start line {} out of range", range.start.line)))?;
    let end_line = lines
        .get(range.end.line)
        .ok_or_else(|| StewardError::host(format!("end line {} out of range", range.end.line)))?;

    let prefix = char_prefix(start_line, range.start.character).ok_or_else(|| {
        StewardError::host(format!(
            "start character {} out of range on line {}",
            range.start.character, range.start.line
        ))
    })?;
    let suffix = char_suffix(end_line, range.end.character).ok_or_else(|| {
        StewardError::host(format!(
            "end character {} out of range on line {}",
            range.end.character, range.end.line
        ))
    })?;

    let mut edited: Vec<&str> = Vec::with_capacity(lines.len());
    edited.extend(&lines[..range.start.line]);
    let middle = format!("{prefix}{replacement}{suffix}");
    edited.push(&middle);
    if range.end.line + 1 < lines.len() {
        edited.extend(&lines[range.end.line + 1..]);
    }
    Ok(edited.join("\n"))
}

/// The part of `line` before the given character offset, `None` when
/// the offset lies past the end of the line.
fn char_prefix(line: &str, character: usize) -> Option<&str> {
    if character == 0 {
        return Some("");
    }
    let mut count = 0;
    for (idx, _) in line.char_indices() {
        if count == character {
            return Some(&line[..idx]);
        }
        count += 1;
    }
    (count == character).then_some(line)
}

/// The part of `line` from the given character offset onward.
fn char_suffix(line: &str, character: usize) -> Option<&str> {
    if character == 0 {
        return Some(line);
    }
    let mut count = 0;
    for (idx, _) in line.char_indices() {
        if count == character {
            return Some(&line[idx..]);
        }
        count += 1;
    }
    (count == character).then_some("")
}

/// Expand `"a.b.c": v` into `{"a": {"b": {"c": v}}}`.
pub(crate) fn expand_dotted_key(key: &str, value: Value) -> Value {
    let mut result = value;
    for segment in key.rsplit('.') {
        let mut object = serde_json::Map::new();
        object.insert(segment.to_string(), result);
        result = Value::Object(object);
    }
    result
}

/// Merge `incoming` into `target`; objects merge recursively, anything
/// else overrides at the leaf.
pub(crate) fn deep_merge(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(target_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                match target_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target_slot, incoming_value) => *target_slot = incoming_value,
    }
}
