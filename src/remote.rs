//! Remote blob source: where the catalog and product photos come from.
//!
//! The shop keeps its menu spreadsheet export and photos in one shared
//! folder. The sync stage only needs five things from that folder, captured
//! by [`RemoteSource`]: the root container, a listing, a byte fetch, and the
//! two write operations used when publishing web images back.
//!
//! [`DirectorySource`] implements the trait over a directory tree, typically
//! a locally synced copy of the shared drive folder. Identifiers are
//! `/`-separated paths relative to the folder; the folder itself is `""`.
//!
//! ```text
//! shared-folder/           ← root container ""
//! ├── menu.csv             ← id "menu.csv"
//! ├── IMG_2041.jpg         ← id "IMG_2041.jpg"
//! └── web/                 ← id "web", mime "inode/directory"
//!     └── truffle-cake.jpg ← id "web/truffle-cake.jpg"
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// MIME type reported for folders.
pub const FOLDER_MIME: &str = "inode/directory";

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Listing failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Remote file not found: {0}")]
    NotFound(String),
    #[error("Invalid remote identifier: {0:?}")]
    InvalidId(String),
}

/// One entry of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
}

impl RemoteFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }
}

/// Trait for remote blob sources.
pub trait RemoteSource {
    /// Identifier of the configured top-level container.
    fn root(&self) -> String;

    /// List the direct children of a container.
    fn list(&self, container: &str) -> Result<Vec<RemoteFile>, RemoteError>;

    /// Fetch the full contents of a file.
    fn fetch(&self, id: &str) -> Result<Vec<u8>, RemoteError>;

    /// Create a child container and return its identifier.
    fn create_container(&self, parent: &str, name: &str) -> Result<String, RemoteError>;

    /// Store `bytes` as `name` inside a container, replacing any file with
    /// that name. Returns the file's identifier.
    fn upload(&self, container: &str, name: &str, bytes: &[u8]) -> Result<String, RemoteError>;
}

/// Guess a MIME type from a file extension.
pub fn mime_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

/// [`RemoteSource`] over a local directory tree.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an identifier onto the filesystem, refusing anything that could
    /// escape the folder.
    fn resolve(&self, id: &str) -> Result<PathBuf, RemoteError> {
        let relative = Path::new(id);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(RemoteError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn child_id(container: &str, name: &str) -> String {
        if container.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", container.trim_end_matches('/'), name)
        }
    }
}

impl RemoteSource for DirectorySource {
    fn root(&self) -> String {
        String::new()
    }

    fn list(&self, container: &str) -> Result<Vec<RemoteFile>, RemoteError> {
        let dir = self.resolve(container)?;
        if !dir.is_dir() {
            return Err(RemoteError::NotFound(container.to_string()));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let mime_type = if entry.file_type().is_dir() {
                FOLDER_MIME
            } else {
                mime_for(name)
            };
            files.push(RemoteFile {
                id: Self::child_id(container, name),
                name: name.to_string(),
                mime_type: mime_type.to_string(),
            });
        }
        Ok(files)
    }

    fn fetch(&self, id: &str) -> Result<Vec<u8>, RemoteError> {
        let path = self.resolve(id)?;
        if !path.is_file() {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(fs::read(path)?)
    }

    fn create_container(&self, parent: &str, name: &str) -> Result<String, RemoteError> {
        let id = Self::child_id(parent, name);
        fs::create_dir_all(self.resolve(&id)?)?;
        Ok(id)
    }

    fn upload(&self, container: &str, name: &str, bytes: &[u8]) -> Result<String, RemoteError> {
        let id = Self::child_id(container, name);
        let path = self.resolve(&id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(id)
    }
}
