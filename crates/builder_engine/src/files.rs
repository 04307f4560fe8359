use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspacePathError {
    #[error("empty path")]
    Empty,
    #[error("path escapes the workspace: {0}")]
    ParentTraversal(String),
    #[error("{0} is a folder")]
    IsFolder(String),
    #[error("{0} is a file, not a folder")]
    NotAFolder(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileEntry {
    File { content: String, is_binary: bool },
    Folder,
}

/// In-memory project workspace keyed by normalized relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceFiles {
    entries: BTreeMap<String, FileEntry>,
}

impl WorkspaceFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file, creating missing parent folders.
    /// Returns the normalized path.
    pub fn write_file(&mut self, path: &str, content: &str) -> Result<String, WorkspacePathError> {
        let normalized = normalize_path(path)?;
        if let Some(FileEntry::Folder) = self.entries.get(&normalized) {
            return Err(WorkspacePathError::IsFolder(normalized));
        }

        let parents: Vec<&str> = normalized
            .match_indices('/')
            .map(|(idx, _)| &normalized[..idx])
            .collect();
        for parent in &parents {
            if let Some(FileEntry::File { .. }) = self.entries.get(*parent) {
                return Err(WorkspacePathError::NotAFolder(parent.to_string()));
            }
        }
        for parent in parents {
            self.entries
                .entry(parent.to_string())
                .or_insert(FileEntry::Folder);
        }

        self.entries.insert(
            normalized.clone(),
            FileEntry::File {
                content: content.to_string(),
                is_binary: false,
            },
        );
        Ok(normalized)
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        let normalized = normalize_path(path).ok()?;
        self.entries.get(&normalized)
    }

    pub fn file_content(&self, path: &str) -> Option<&str> {
        match self.get(path)? {
            FileEntry::File { content, .. } => Some(content),
            FileEntry::Folder => None,
        }
    }

    /// Files (not folders) in path order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|(path, entry)| match entry {
            FileEntry::File { content, .. } => Some((path.as_str(), content.as_str())),
            FileEntry::Folder => None,
        })
    }

    pub fn file_count(&self) -> usize {
        self.files().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Workspace-relative form of `raw`: separators unified, `.` and empty
/// segments dropped, leading `/` removed. `..` is rejected.
pub fn normalize_path(raw: &str) -> Result<String, WorkspacePathError> {
    let unified = raw.trim().replace('\\', "/");
    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(WorkspacePathError::ParentTraversal(raw.to_string())),
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        return Err(WorkspacePathError::Empty);
    }
    Ok(segments.join("/"))
}

/// Hex SHA-256 of file content, as used in deploy manifests.
pub fn content_digest(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_relative_forms() {
        assert_eq!(normalize_path("./src/App.jsx").unwrap(), "src/App.jsx");
        assert_eq!(normalize_path("/index.html").unwrap(), "index.html");
        assert_eq!(normalize_path("src\\lib//util.js").unwrap(), "src/lib/util.js");
    }

    #[test]
    fn rejects_escaping_and_empty_paths() {
        assert_eq!(
            normalize_path("../etc/passwd"),
            Err(WorkspacePathError::ParentTraversal("../etc/passwd".to_string()))
        );
        assert_eq!(normalize_path(""), Err(WorkspacePathError::Empty));
        assert_eq!(normalize_path("./"), Err(WorkspacePathError::Empty));
    }

    #[test]
    fn writing_creates_parent_folders() {
        let mut files = WorkspaceFiles::new();
        files.write_file("src/components/App.jsx", "x").unwrap();

        assert_eq!(files.get("src"), Some(&FileEntry::Folder));
        assert_eq!(files.get("src/components"), Some(&FileEntry::Folder));
        assert_eq!(files.file_content("./src/components/App.jsx"), Some("x"));
        assert_eq!(files.file_count(), 1);
    }

    #[test]
    fn files_and_folders_do_not_overlap() {
        let mut files = WorkspaceFiles::new();
        files.write_file("src/main.js", "x").unwrap();

        assert_eq!(
            files.write_file("src", "y"),
            Err(WorkspacePathError::IsFolder("src".to_string()))
        );
        assert_eq!(
            files.write_file("src/main.js/inner.js", "y"),
            Err(WorkspacePathError::NotAFolder("src/main.js".to_string()))
        );
    }

    #[test]
    fn digest_is_stable_hex() {
        let digest = content_digest("hello");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
