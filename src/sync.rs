//! Catalog and photo sync.
//!
//! Stage 1 of the crumb pipeline. Pulls the menu catalog and every product
//! photo it references from the shared folder, and keeps web-sized copies of
//! the photos up to date.
//!
//! ## Per-item flow
//!
//! ```text
//! resolve ──▶ fetch ──▶ fingerprint ──▶ persist raw ──▶ reprocess? ──▶ manifest
//!    │                                                     │
//!    └─ not in folder: skipped (warning)                  ├─ yes: transcode (+ publish)
//!                                                          └─ no:  reuse files on disk
//! ```
//!
//! Photos are always re-downloaded: the fingerprint comparison against the
//! [`ImageManifest`] is what decides whether encoding is needed. An item is
//! reprocessed when its bytes changed, when `--force` is given, or when no
//! web variant exists locally for its slug.
//!
//! Any failure inside one item (download, decode, disk) is recorded and the
//! run moves on to the next row. The manifest is saved once at the end if at
//! least one item got through.
//!
//! ## Published web images
//!
//! The folder may contain a `web/` sub-folder of published variants. Files
//! there named after an item's slug are pulled down over the local copies
//! before the reprocess decision, so a hand-tuned upload wins. With
//! `source.publish` on, regenerated variants are uploaded there too.
//!
//! ## Output Structure
//!
//! ```text
//! data/
//! ├── menu.csv                   # Catalog copied from the folder
//! ├── images_manifest.json       # Fingerprints + variant sizes per file id
//! ├── images_raw/
//! │   └── IMG_2041.jpg           # Originals, original names
//! └── images_web/
//!     └── truffle-cake.jpg       # Variants, named by slug
//! ```

use crate::catalog::{self, CatalogError};
use crate::config::{Config, ConfigError};
use crate::imaging::{BackendError, ImageBackend, OutputFormat, transcode};
use crate::manifest::{ImageManifest, ManifestEntry, VariantRecord, fingerprint};
use crate::naming::{local_filename, item_slug, web_filename};
use crate::remote::{RemoteError, RemoteFile, RemoteSource};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Run-level failures. Any of these aborts before items are processed.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Catalog file {0:?} not found in the source folder")]
    CatalogNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures confined to one item.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("item name {0:?} has no usable slug")]
    InvalidName(String),
    #[error("{0}")]
    Remote(#[from] RemoteError),
    #[error("{0}")]
    Imaging(#[from] BackendError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Re-encode every photo even when unchanged.
    pub force: bool,
}

/// What happened to one catalog row.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Fresh variants were encoded.
    Reprocessed {
        changed: bool,
        variants: BTreeMap<OutputFormat, VariantRecord>,
    },
    /// Existing variants were kept.
    Reused {
        variants: BTreeMap<OutputFormat, VariantRecord>,
    },
    /// The row names no image.
    NoImage,
    /// The image is not in the source folder.
    MissingRemote { image: String },
    Failed { file_id: String, error: String },
}

impl ItemOutcome {
    /// Whether the row reached the manifest update.
    pub fn succeeded(&self) -> bool {
        matches!(
            self,
            ItemOutcome::Reprocessed { .. } | ItemOutcome::Reused { .. }
        )
    }
}

/// Progress events sent while the sync runs.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    CatalogFetched { path: PathBuf, bytes: usize },
    ItemDone { name: String, outcome: ItemOutcome },
}

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Clean,
    CompletedWithWarnings,
}

/// Result of a sync run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub items: Vec<(String, ItemOutcome)>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub manifest_saved: bool,
}

impl SyncReport {
    pub fn status(&self) -> RunStatus {
        if self.warnings.is_empty() && self.errors.is_empty() {
            RunStatus::Clean
        } else {
            RunStatus::CompletedWithWarnings
        }
    }

    pub fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|(_, o)| pred(o)).count()
    }
}

fn send(events: &Option<Sender<SyncEvent>>, event: SyncEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Copy the catalog from the source folder to the local catalog path.
pub fn fetch_catalog(
    remote: &impl RemoteSource,
    config: &Config,
    events: &Option<Sender<SyncEvent>>,
) -> Result<PathBuf, SyncError> {
    let listing = remote.list(&remote.root())?;
    let file = listing
        .iter()
        .find(|f| !f.is_folder() && f.name == config.source.catalog)
        .ok_or_else(|| SyncError::CatalogNotFound(config.source.catalog.clone()))?;
    let bytes = remote.fetch(&file.id)?;

    let path = config.catalog_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &bytes)?;
    send(
        events,
        SyncEvent::CatalogFetched {
            path: path.clone(),
            bytes: bytes.len(),
        },
    );
    Ok(path)
}

/// Fetch the catalog, then sync every photo it references.
pub fn sync(
    remote: &impl RemoteSource,
    backend: &impl ImageBackend,
    config: &Config,
    options: &SyncOptions,
    events: Option<Sender<SyncEvent>>,
) -> Result<SyncReport, SyncError> {
    config.source_folder()?;
    let catalog_path = fetch_catalog(remote, config, &events)?;
    sync_images(remote, backend, config, &catalog_path, options, events)
}

/// The remote `web/` sub-folder and the files it holds, by name.
struct WebFolder {
    id: Option<String>,
    files: HashMap<String, String>,
}

fn open_web_folder(
    remote: &impl RemoteSource,
    root: &str,
    listing: &[RemoteFile],
    config: &Config,
) -> Result<WebFolder, RemoteError> {
    let existing = listing
        .iter()
        .find(|f| f.is_folder() && f.name == config.source.web_folder);
    match existing {
        Some(folder) => {
            let files = remote
                .list(&folder.id)?
                .into_iter()
                .filter(|f| !f.is_folder())
                .map(|f| (f.name, f.id))
                .collect();
            Ok(WebFolder {
                id: Some(folder.id.clone()),
                files,
            })
        }
        None if config.source.publish => Ok(WebFolder {
            id: Some(remote.create_container(root, &config.source.web_folder)?),
            files: HashMap::new(),
        }),
        None => Ok(WebFolder {
            id: None,
            files: HashMap::new(),
        }),
    }
}

/// Sync every photo referenced by the catalog at `catalog_path`.
pub fn sync_images(
    remote: &impl RemoteSource,
    backend: &impl ImageBackend,
    config: &Config,
    catalog_path: &Path,
    options: &SyncOptions,
    events: Option<Sender<SyncEvent>>,
) -> Result<SyncReport, SyncError> {
    let root = remote.root();
    let listing = remote.list(&root)?;
    let web_folder = open_web_folder(remote, &root, &listing, config)?;
    let rows = catalog::read_rows(catalog_path)?;

    let raw_dir = config.raw_images_dir();
    let web_dir = config.web_images_dir();
    std::fs::create_dir_all(&raw_dir)?;
    std::fs::create_dir_all(&web_dir)?;

    let manifest_path = config.manifest_path();
    let mut manifest = ImageManifest::load(&manifest_path);
    let mut report = SyncReport::default();
    let mut needs_upload = false;

    let ctx = ItemContext {
        remote,
        backend,
        config,
        options,
        raw_dir: &raw_dir,
        web_dir: &web_dir,
        web_folder: &web_folder,
    };

    for (_, row) in rows {
        let name = row.name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        let image = row.image.trim();

        let outcome = if image.is_empty() {
            report
                .warnings
                .push(format!("No image name for item '{}', skipping", name));
            ItemOutcome::NoImage
        } else {
            match listing.iter().find(|f| !f.is_folder() && f.name == image) {
                None => {
                    report.warnings.push(format!(
                        "No file named '{}' found in the source folder, skipping '{}'",
                        image, name
                    ));
                    ItemOutcome::MissingRemote {
                        image: image.to_string(),
                    }
                }
                Some(file) => match ctx.process_item(&name, file, &mut manifest, &mut report) {
                    Ok(processed) => {
                        needs_upload |= processed.generated_from_scratch;
                        processed.outcome
                    }
                    Err(e) => {
                        report.errors.push(format!("file_id={}: {}", file.id, e));
                        ItemOutcome::Failed {
                            file_id: file.id.clone(),
                            error: e.to_string(),
                        }
                    }
                },
            }
        };

        send(
            &events,
            SyncEvent::ItemDone {
                name: name.clone(),
                outcome: outcome.clone(),
            },
        );
        report.items.push((name, outcome));
    }

    if report.items.iter().any(|(_, o)| o.succeeded()) {
        manifest.save(&manifest_path)?;
        report.manifest_saved = true;
    }

    if needs_upload && !config.source.publish {
        report.warnings.push(format!(
            "Some web images were generated but need to be uploaded to the '{}' folder by hand. Upload {}",
            config.source.web_folder,
            web_dir.display()
        ));
    }

    Ok(report)
}

/// Everything `process_item` needs that stays fixed for the whole run.
struct ItemContext<'a, R, B> {
    remote: &'a R,
    backend: &'a B,
    config: &'a Config,
    options: &'a SyncOptions,
    raw_dir: &'a Path,
    web_dir: &'a Path,
    web_folder: &'a WebFolder,
}

struct Processed {
    outcome: ItemOutcome,
    /// No local variant existed before this run.
    generated_from_scratch: bool,
}

impl<R: RemoteSource, B: ImageBackend> ItemContext<'_, R, B> {
    fn process_item(
        &self,
        name: &str,
        file: &RemoteFile,
        manifest: &mut ImageManifest,
        report: &mut SyncReport,
    ) -> Result<Processed, ItemError> {
        let slug = item_slug(name).ok_or_else(|| ItemError::InvalidName(name.to_string()))?;
        let bytes = self.remote.fetch(&file.id)?;
        let digest = fingerprint(&bytes);
        let raw_bytes = bytes.len() as u64;

        if raw_bytes > self.config.images.raw_warn_bytes {
            report.warnings.push(format!(
                "Raw {} {:.0}KB > {:.0}KB",
                file.name,
                raw_bytes as f64 / 1024.0,
                self.config.images.raw_warn_bytes as f64 / 1024.0
            ));
        }

        let changed = manifest
            .get(&file.id)
            .is_none_or(|prev| prev.fingerprint != digest);

        let raw_name = local_filename(&file.name)
            .ok_or_else(|| RemoteError::InvalidId(file.name.clone()))?;
        let raw_path = self.raw_dir.join(raw_name);
        if changed || !raw_path.exists() {
            std::fs::write(&raw_path, &bytes)?;
        }

        let formats = self.config.images.formats();
        self.pull_published(&slug, &formats)?;

        let existing = existing_variants(self.web_dir, &slug, &formats)?;
        let generated_from_scratch = existing.is_empty();
        let reprocess = changed || self.options.force || generated_from_scratch;

        let variants = if reprocess {
            let encoded = transcode(
                self.backend,
                &bytes,
                self.web_dir,
                &slug,
                &self.config.images.transcode_config(),
            )?;
            for variant in encoded.values().filter(|v| !v.within_budget) {
                report.warnings.push(format!(
                    "Web {} {:.0}KB still over budget at quality {}",
                    variant.file,
                    variant.bytes as f64 / 1024.0,
                    variant.quality.value()
                ));
            }
            let variants: BTreeMap<_, _> = encoded
                .into_iter()
                .map(|(format, v)| {
                    (
                        format,
                        VariantRecord {
                            file: v.file,
                            bytes: v.bytes,
                        },
                    )
                })
                .collect();
            self.publish(&variants)?;
            variants
        } else {
            existing
        };

        manifest.put(
            file.id.clone(),
            ManifestEntry {
                name: name.to_string(),
                raw_name: file.name.clone(),
                fingerprint: digest,
                raw_bytes,
                slug,
                variants: variants.clone(),
                updated_at: now_unix(),
            },
        );

        let outcome = if reprocess {
            ItemOutcome::Reprocessed { changed, variants }
        } else {
            ItemOutcome::Reused { variants }
        };
        Ok(Processed {
            outcome,
            generated_from_scratch,
        })
    }

    /// Overwrite local variants with any published copies.
    fn pull_published(&self, slug: &str, formats: &[OutputFormat]) -> Result<(), ItemError> {
        for format in formats {
            let file = web_filename(slug, *format);
            if let Some(id) = self.web_folder.files.get(&file) {
                let bytes = self.remote.fetch(id)?;
                std::fs::write(self.web_dir.join(&file), bytes)?;
            }
        }
        Ok(())
    }

    fn publish(&self, variants: &BTreeMap<OutputFormat, VariantRecord>) -> Result<(), ItemError> {
        if !self.config.source.publish {
            return Ok(());
        }
        let Some(folder) = &self.web_folder.id else {
            return Ok(());
        };
        for variant in variants.values() {
            let bytes = std::fs::read(self.web_dir.join(&variant.file))?;
            self.remote.upload(folder, &variant.file, &bytes)?;
        }
        Ok(())
    }
}

/// Variants already on disk for `slug`, with their current sizes.
fn existing_variants(
    web_dir: &Path,
    slug: &str,
    formats: &[OutputFormat],
) -> std::io::Result<BTreeMap<OutputFormat, VariantRecord>> {
    let mut variants = BTreeMap::new();
    for format in formats {
        let file = web_filename(slug, *format);
        let path = web_dir.join(&file);
        if path.is_file() {
            let bytes = std::fs::metadata(&path)?.len();
            variants.insert(*format, VariantRecord { file, bytes });
        }
    }
    Ok(variants)
}
