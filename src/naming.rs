//! Centralized naming rules shared by sync and generation.
//!
//! Menu item names become URL slugs, and slugs name every derived file:
//!
//! - `Chocolate Truffle` → slug `chocolate-truffle`
//! - web variants: `chocolate-truffle.jpg`, `chocolate-truffle.webp`
//! - content: `items/chocolate-truffle/index.md`
//!
//! Raw photos keep their original remote filename.

use crate::imaging::OutputFormat;
use std::path::Path;

/// Image extensions accepted in the catalog's `image` column.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic"];

/// Convert a menu item name to a URL-friendly slug.
///
/// Lowercases, turns spaces, underscores and path separators into dashes,
/// drops quotes and strips leading dots. Everything else passes through
/// untouched, so the result is always a single path component or empty.
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .map(|c| match c {
            ' ' | '_' | '/' | '\\' => '-',
            c => c,
        })
        .collect();
    slug.trim_start_matches('.').to_string()
}

/// Slug for `name`, or `None` when nothing usable is left of it.
pub fn item_slug(name: &str) -> Option<String> {
    Some(slugify(name)).filter(|s| !s.is_empty())
}

/// File name of a web variant for a slug.
pub fn web_filename(slug: &str, format: OutputFormat) -> String {
    format!("{}.{}", slug, format.extension())
}

/// Reduce a remote filename to a safe local file name.
///
/// Returns `None` for names with no final component (`""`, `".."`).
pub fn local_filename(name: &str) -> Option<&str> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
}

/// Whether `name` ends in a recognized image extension (case-insensitive).
pub fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
