//! # crumb
//!
//! Keeps a small bakery's website in step with the menu spreadsheet and the
//! product photos staff drop into a shared folder. Nobody on the shop floor
//! touches the site: they edit the sheet, upload a photo, and the next run
//! picks it up.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Sync      shared folder  →  data/         (catalog copy, raw photos, web photos, manifest)
//! 2. Generate  data/          →  content/      (markdown pages for a site generator)
//!    or Render data/          →  public/       (finished HTML pages)
//! ```
//!
//! Stage 1 is the expensive one. Photos arrive straight off a phone, several
//! megabytes each, and every run re-downloads them. What it avoids is
//! re-encoding: a content fingerprint per photo, kept in a JSON manifest,
//! tells it which photos actually changed since the last run.
//!
//! Stage 2 is cheap and stateless. It rebuilds its output directory from
//! scratch every time from the local catalog copy and web photos.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sync`] | Stage 1: catalog fetch, per-photo change detection, reprocess or reuse |
//! | [`generate`] | Stage 2: markdown item pages with TOML front matter, menu index |
//! | [`render`] | Stage 2 alternative: HTML pages via Maud |
//! | [`catalog`] | CSV reading and row validation into typed [`catalog::MenuItem`]s |
//! | [`manifest`] | Content fingerprints and the on-disk image manifest |
//! | [`imaging`] | Decode, shrink, and encode under a byte budget |
//! | [`remote`] | The shared folder abstraction and its directory implementation |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`naming`] | Slugs and file naming shared by every stage |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Content Fingerprints, Not Timestamps
//!
//! Shared-drive modification times are unreliable: re-uploading the same
//! photo bumps them, and some clients preserve the original capture time. The
//! manifest stores a SHA-256 of the raw bytes instead. Identical bytes never
//! reprocess; different bytes always do, whatever the timestamps say.
//!
//! ## Budget Search Instead of Fixed Quality
//!
//! A fixed JPEG quality either wastes bytes on simple photos or blows the
//! budget on busy ones. The transcoder starts high and steps quality down
//! until the encoding fits, stopping at a floor. A photo that still does not
//! fit is written anyway and reported.
//!
//! ## One Bad Row Never Stops the Run
//!
//! The sheet is edited by hand. Every per-item failure, from a typo in a
//! price to a corrupt photo, is collected and reported at the end while
//! the other items go through.

pub mod catalog;
pub mod config;
pub mod generate;
pub mod imaging;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod remote;
pub mod render;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_helpers;
