//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Every entity leads with what staff recognise, the menu item name, and
//! the files behind it follow as indented context. Anything that needs
//! attention is prefixed: `⚠` for warnings, `❌` for errors.
//!
//! # Output Format
//!
//! ## Sync
//!
//! ```text
//! Catalog → data/menu.csv (3.1 KB)
//! Chocolate Truffle
//!     jpeg: encoded chocolate-truffle.jpg (402.7 KB)
//! Oat Cookie
//!     jpeg: reused oat-cookie.jpg (88.0 KB)
//! Ghost Cake
//!     ⚠ not in source folder: ghost.jpg
//!
//! Synced 3 items: 1 reprocessed, 1 reused, 1 skipped, 0 failed
//! ⚠ No file named 'ghost.jpg' found in the source folder, skipping 'Ghost Cake'
//! Sync completed with warnings
//! ```
//!
//! ## Generate / Render
//!
//! ```text
//! Chocolate Truffle → items/chocolate-truffle/
//! Oat Cookie → items/oat-cookie/
//!
//! Generated 2 items (1 hidden)
//! Errors encountered during validation:
//! ❌ line 4 (Mystery Cake): Invalid price format: "abc"
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::catalog::Catalog;
use crate::generate::GenerateReport;
use crate::imaging::OutputFormat;
use crate::manifest::VariantRecord;
use crate::sync::{ItemOutcome, RunStatus, SyncEvent, SyncReport};
use std::collections::BTreeMap;

// ============================================================================
// Shared helpers
// ============================================================================

/// Human-readable byte count.
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn variant_lines(status: &str, variants: &BTreeMap<OutputFormat, VariantRecord>) -> Vec<String> {
    variants
        .iter()
        .map(|(format, v)| {
            format!(
                "{}{}: {} {} ({})",
                indent(1),
                format,
                status,
                v.file,
                format_bytes(v.bytes)
            )
        })
        .collect()
}

fn warning_lines(warnings: &[String]) -> impl Iterator<Item = String> + '_ {
    warnings.iter().map(|w| format!("\u{26a0} {}", w))
}

// ============================================================================
// Sync
// ============================================================================

/// Format a single sync progress event as display lines.
pub fn format_sync_event(event: &SyncEvent) -> Vec<String> {
    match event {
        SyncEvent::CatalogFetched { path, bytes } => vec![format!(
            "Catalog \u{2192} {} ({})",
            path.display(),
            format_bytes(*bytes as u64)
        )],
        SyncEvent::ItemDone { name, outcome } => {
            let mut lines = vec![name.clone()];
            match outcome {
                ItemOutcome::Reprocessed { variants, .. } => {
                    lines.extend(variant_lines("encoded", variants));
                }
                ItemOutcome::Reused { variants } => {
                    lines.extend(variant_lines("reused", variants));
                }
                ItemOutcome::NoImage => {
                    lines.push(format!("{}\u{26a0} no image in catalog", indent(1)));
                }
                ItemOutcome::MissingRemote { image } => {
                    lines.push(format!(
                        "{}\u{26a0} not in source folder: {}",
                        indent(1),
                        image
                    ));
                }
                ItemOutcome::Failed { error, .. } => {
                    lines.push(format!("{}\u{274c} {}", indent(1), error));
                }
            }
            lines
        }
    }
}

/// Format the end-of-run sync summary.
pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    let reprocessed = report.count(|o| matches!(o, ItemOutcome::Reprocessed { .. }));
    let reused = report.count(|o| matches!(o, ItemOutcome::Reused { .. }));
    let skipped = report.count(|o| {
        matches!(o, ItemOutcome::NoImage | ItemOutcome::MissingRemote { .. })
    });
    let failed = report.count(|o| matches!(o, ItemOutcome::Failed { .. }));

    let mut lines = vec![
        String::new(),
        format!(
            "Synced {} items: {} reprocessed, {} reused, {} skipped, {} failed",
            report.items.len(),
            reprocessed,
            reused,
            skipped,
            failed
        ),
    ];
    lines.extend(warning_lines(&report.warnings));
    lines.extend(report.errors.iter().map(|e| format!("\u{274c} {}", e)));
    lines.push(
        match report.status() {
            RunStatus::Clean => "Sync complete",
            RunStatus::CompletedWithWarnings => "Sync completed with warnings",
        }
        .to_string(),
    );
    lines
}

/// Print the sync summary to stdout.
pub fn print_sync_report(report: &SyncReport) {
    for line in format_sync_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate / render
// ============================================================================

fn validation_error_lines(errors: &[crate::catalog::RowError]) -> Vec<String> {
    if errors.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Errors encountered during validation:".to_string()];
    lines.extend(errors.iter().map(|e| format!("\u{274c} {}", e)));
    lines
}

/// Format the result of a generate or render run.
pub fn format_generate_report(report: &GenerateReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .items
        .iter()
        .map(|item| format!("{} \u{2192} items/{}/", item.name, item.slug))
        .collect();

    lines.push(String::new());
    let hidden = match report.hidden {
        0 => String::new(),
        n => format!(" ({} hidden)", n),
    };
    lines.push(format!("Generated {} items{}", report.items.len(), hidden));
    lines.extend(warning_lines(&report.warnings));
    lines.extend(validation_error_lines(&report.errors));
    lines
}

pub fn print_generate_report(report: &GenerateReport) {
    for line in format_generate_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format a catalog validation pass.
pub fn format_catalog_check(catalog: &Catalog) -> Vec<String> {
    let mut lines = vec![format!(
        "{} valid items, {} hidden, {} invalid",
        catalog.items.len(),
        catalog.hidden,
        catalog.errors.len()
    )];
    lines.extend(validation_error_lines(&catalog.errors));
    lines
}

pub fn print_catalog_check(catalog: &Catalog) {
    for line in format_catalog_check(catalog) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldError, RowError};
    use crate::generate::GeneratedItem;
    use std::path::PathBuf;

    fn jpeg(file: &str, bytes: u64) -> BTreeMap<OutputFormat, VariantRecord> {
        let mut variants = BTreeMap::new();
        variants.insert(
            OutputFormat::Jpeg,
            VariantRecord {
                file: file.into(),
                bytes,
            },
        );
        variants
    }

    fn bad_price() -> RowError {
        RowError {
            line: 4,
            name: "Mystery Cake".into(),
            errors: vec![FieldError::InvalidPrice("abc".into())],
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn bytes_formatting() {
        assert_eq!(format_bytes(850), "850 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(1536 * 1024), "1.5 MB");
    }

    // =========================================================================
    // Sync output
    // =========================================================================

    #[test]
    fn catalog_fetched_event() {
        let lines = format_sync_event(&SyncEvent::CatalogFetched {
            path: PathBuf::from("data/menu.csv"),
            bytes: 100,
        });
        assert_eq!(lines, vec!["Catalog \u{2192} data/menu.csv (100 B)"]);
    }

    #[test]
    fn reprocessed_event_lists_variants() {
        let lines = format_sync_event(&SyncEvent::ItemDone {
            name: "Truffle Cake".into(),
            outcome: ItemOutcome::Reprocessed {
                changed: true,
                variants: jpeg("truffle-cake.jpg", 2048),
            },
        });
        assert_eq!(
            lines,
            vec![
                "Truffle Cake".to_string(),
                "    jpeg: encoded truffle-cake.jpg (2.0 KB)".to_string(),
            ]
        );
    }

    #[test]
    fn problem_events_are_marked() {
        let missing = format_sync_event(&SyncEvent::ItemDone {
            name: "Ghost".into(),
            outcome: ItemOutcome::MissingRemote {
                image: "ghost.jpg".into(),
            },
        });
        assert!(missing[1].trim_start().starts_with('\u{26a0}'));

        let failed = format_sync_event(&SyncEvent::ItemDone {
            name: "Broken".into(),
            outcome: ItemOutcome::Failed {
                file_id: "id-1".into(),
                error: "connection reset".into(),
            },
        });
        assert_eq!(failed[1], "    \u{274c} connection reset");
    }

    #[test]
    fn sync_report_summary() {
        let report = SyncReport {
            items: vec![
                (
                    "A".into(),
                    ItemOutcome::Reused {
                        variants: jpeg("a.jpg", 1),
                    },
                ),
                ("B".into(), ItemOutcome::NoImage),
                (
                    "C".into(),
                    ItemOutcome::Failed {
                        file_id: "id-9".into(),
                        error: "boom".into(),
                    },
                ),
            ],
            warnings: vec!["No image name for item 'B', skipping".into()],
            errors: vec!["file_id=id-9: boom".into()],
            manifest_saved: true,
        };
        let lines = format_sync_report(&report);
        assert!(lines.contains(&"Synced 3 items: 0 reprocessed, 1 reused, 1 skipped, 1 failed".to_string()));
        assert!(lines.contains(&"\u{26a0} No image name for item 'B', skipping".to_string()));
        assert!(lines.contains(&"\u{274c} file_id=id-9: boom".to_string()));
        assert_eq!(lines.last().unwrap(), "Sync completed with warnings");
    }

    #[test]
    fn clean_sync_report() {
        let lines = format_sync_report(&SyncReport::default());
        assert_eq!(lines.last().unwrap(), "Sync complete");
    }

    // =========================================================================
    // Generate output
    // =========================================================================

    #[test]
    fn generate_report_lines() {
        let report = GenerateReport {
            items: vec![GeneratedItem {
                name: "Chocolate Truffle".into(),
                slug: "chocolate-truffle".into(),
                dir: PathBuf::from("content/items/chocolate-truffle"),
            }],
            hidden: 1,
            warnings: vec![],
            errors: vec![bad_price()],
        };
        let lines = format_generate_report(&report);
        assert_eq!(lines[0], "Chocolate Truffle \u{2192} items/chocolate-truffle/");
        assert!(lines.contains(&"Generated 1 items (1 hidden)".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "\u{274c} line 4 (Mystery Cake): Invalid price format: \"abc\""
        );
    }

    #[test]
    fn catalog_check_lines() {
        let catalog = Catalog {
            items: vec![],
            hidden: 2,
            errors: vec![bad_price()],
        };
        let lines = format_catalog_check(&catalog);
        assert_eq!(lines[0], "0 valid items, 2 hidden, 1 invalid");
        assert_eq!(lines[1], "Errors encountered during validation:");
    }
}
