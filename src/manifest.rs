//! Image manifest for incremental syncs.
//!
//! Every sync run re-downloads each product photo, so the expensive part to
//! skip is re-encoding. The manifest remembers, per remote file identifier,
//! the fingerprint of the bytes that were last processed and the web variants
//! that came out of it.
//!
//! # Change detection
//!
//! The fingerprint is a SHA-256 of the raw bytes. Content-based rather than
//! based on remote modification times, so a photo re-uploaded under the same
//! name and id is still caught. A missing entry counts as changed.
//!
//! # Storage
//!
//! ```json
//! {
//!   "version": 1,
//!   "images": {
//!     "<file id>": {
//!       "name": "Chocolate Truffle",
//!       "raw_name": "IMG_2041.jpg",
//!       "fingerprint": "9f86d0…",
//!       "raw_bytes": 2811442,
//!       "slug": "chocolate-truffle",
//!       "variants": { "jpeg": { "file": "chocolate-truffle.jpg", "bytes": 402114 } },
//!       "updated_at": 1760745600
//!     }
//!   }
//! }
//! ```
//!
//! The whole document is read at the start of a run and written once at the
//! end. Saving goes through a temporary sibling file and a rename, so an
//! interrupted run leaves the previous manifest readable. A missing or
//! unparsable file loads as an empty manifest: everything reprocesses once.
//! Entries are never pruned by the pipeline.

use crate::imaging::OutputFormat;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Version of the manifest format. Bump to force a full reprocess.
const MANIFEST_VERSION: u32 = 1;

/// SHA-256 of raw bytes as a 64-char lowercase hex string.
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// A web variant as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub file: String,
    pub bytes: u64,
}

/// Last known state of one remote photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Menu item display name.
    pub name: String,
    /// Original remote filename.
    pub raw_name: String,
    pub fingerprint: String,
    pub raw_bytes: u64,
    pub slug: String,
    #[serde(default)]
    pub variants: BTreeMap<OutputFormat, VariantRecord>,
    /// Unix seconds of the last successful pass.
    pub updated_at: u64,
}

/// On-disk manifest mapping remote file identifiers to entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageManifest {
    pub version: u32,
    pub images: BTreeMap<String, ManifestEntry>,
}

impl Default for ImageManifest {
    fn default() -> Self {
        Self::empty()
    }
}

impl ImageManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            images: BTreeMap::new(),
        }
    }

    /// Load from `path`. Returns an empty manifest if the file doesn't exist
    /// or can't be parsed (version mismatch, corruption).
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(_) => return Self::empty(),
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest
    }

    /// Write the whole manifest to `path`, replacing any previous file.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);
        std::fs::write(tmp_path, json)?;
        std::fs::rename(tmp_path, path)
    }

    pub fn get(&self, id: &str) -> Option<&ManifestEntry> {
        self.images.get(id)
    }

    pub fn put(&mut self, id: String, entry: ManifestEntry) {
        self.images.insert(id, entry);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ManifestEntry)> {
        self.images.iter()
    }
}
