//! Catalog reading and validation.
//!
//! The catalog is the menu spreadsheet exported as CSV, one product per row:
//!
//! ```text
//! name,category,description,price,weight_unit,image,testimonials,show
//! Chocolate Truffle,Cakes,Dark and rich.,"₹1,200",kg,truffle.jpg,Loved it!|Best cake,yes
//! ```
//!
//! Staff edit the sheet by hand, so rows are read loosely ([`CatalogRow`], all
//! strings, ragged rows allowed) and then parsed into a [`MenuItem`] that
//! downstream code can trust. A row either becomes a fully valid item or a
//! [`RowError`] listing every bad field; nothing half-valid leaks through.

use crate::config::CatalogConfig;
use crate::naming::{IMAGE_EXTENSIONS, has_image_extension, item_slug};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Columns the catalog header must contain.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "name",
    "category",
    "description",
    "price",
    "weight_unit",
    "image",
    "testimonials",
    "show",
];

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Catalog is missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// One catalog row as it appears in the sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRow {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: String,
    pub weight_unit: String,
    pub image: String,
    pub testimonials: String,
    pub show: String,
}

impl CatalogRow {
    /// Visible rows have a `show` cell whose first character is `y`/`Y`.
    /// Leading whitespace counts as that first character.
    pub fn is_visible(&self) -> bool {
        self.show
            .chars()
            .next()
            .is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
    }
}

/// A validated menu item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: u64,
    pub weight_unit: String,
    /// Original photo filename from the catalog.
    pub image: String,
    pub testimonials: Vec<String>,
}

/// A single field that failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("Name {0:?} has no usable slug")]
    UnusableName(String),
    #[error("Invalid price format: {0:?}")]
    InvalidPrice(String),
    #[error("Invalid category: {value:?}. Must be one of: {}", .allowed.join(", "))]
    InvalidCategory { value: String, allowed: Vec<String> },
    #[error("Unsupported image format: {0:?} (expected {exts})", exts = IMAGE_EXTENSIONS.join(", "))]
    UnsupportedImage(String),
}

/// Everything wrong with one catalog row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// Line number in the CSV file (header is line 1).
    pub line: usize,
    pub name: String,
    pub errors: Vec<FieldError>,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(
            f,
            "line {} ({}): {}",
            self.line,
            if self.name.is_empty() {
                "<unnamed>"
            } else {
                self.name.as_str()
            },
            details.join("; ")
        )
    }
}

/// Parse a currency-formatted price into an integer.
///
/// Strips the configured currency symbols and `,` thousands separators, then
/// requires plain ASCII digits.
pub fn parse_price(raw: &str, currency_symbols: &[String]) -> Result<u64, FieldError> {
    let mut value = raw.to_string();
    for symbol in currency_symbols.iter().filter(|s| !s.is_empty()) {
        value = value.replace(symbol.as_str(), "");
    }
    let value = value.replace(',', "");
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::InvalidPrice(raw.to_string()));
    }
    value
        .parse::<u64>()
        .map_err(|_| FieldError::InvalidPrice(raw.to_string()))
}

/// Split a `|`-delimited testimonials cell, dropping blanks.
pub fn split_testimonials(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl MenuItem {
    /// Validate a raw row. `line` is only used for error reporting.
    pub fn parse(row: &CatalogRow, line: usize, config: &CatalogConfig) -> Result<Self, RowError> {
        let mut errors = Vec::new();

        let name = row.name.trim();
        if name.is_empty() {
            errors.push(FieldError::EmptyName);
        } else if item_slug(name).is_none() {
            errors.push(FieldError::UnusableName(name.to_string()));
        }

        let price = match parse_price(&row.price, &config.currency_symbols) {
            Ok(price) => Some(price),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        if !config.categories.iter().any(|c| *c == row.category) {
            errors.push(FieldError::InvalidCategory {
                value: row.category.clone(),
                allowed: config.categories.clone(),
            });
        }

        if !has_image_extension(&row.image) {
            errors.push(FieldError::UnsupportedImage(row.image.clone()));
        }

        match price {
            Some(price) if errors.is_empty() => {
                let unit = row.weight_unit.trim();
                Ok(MenuItem {
                    name: name.to_string(),
                    category: row.category.clone(),
                    description: row.description.clone(),
                    price,
                    weight_unit: if unit.is_empty() {
                        config.default_unit.clone()
                    } else {
                        unit.to_string()
                    },
                    image: row.image.clone(),
                    testimonials: split_testimonials(&row.testimonials),
                })
            }
            _ => Err(RowError {
                line,
                name: row.name.trim().to_string(),
                errors,
            }),
        }
    }
}

/// Read raw rows from a catalog CSV, paired with their line numbers.
pub fn read_rows(path: &Path) -> Result<Vec<(usize, CatalogRow)>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h.trim() == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CatalogError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(idx + 2);
        let row = lookup_row(&headers, &record);
        rows.push((line, row));
    }
    Ok(rows)
}

/// Build a row by header name so extra columns and ragged rows both work.
fn lookup_row(headers: &csv::StringRecord, record: &csv::StringRecord) -> CatalogRow {
    let cell = |column: &str| -> String {
        headers
            .iter()
            .position(|h| h.trim() == column)
            .and_then(|i| record.get(i))
            .unwrap_or("")
            .to_string()
    };
    CatalogRow {
        name: cell("name"),
        category: cell("category"),
        description: cell("description"),
        price: cell("price"),
        weight_unit: cell("weight_unit"),
        image: cell("image"),
        testimonials: cell("testimonials"),
        show: cell("show"),
    }
}

/// Outcome of validating a whole catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Valid visible items, in sheet order.
    pub items: Vec<MenuItem>,
    /// Rows skipped because `show` was not truthy.
    pub hidden: usize,
    pub errors: Vec<RowError>,
}

/// Read and validate every visible row.
///
/// Hidden rows are skipped before validation and never produce errors.
pub fn load_catalog(path: &Path, config: &CatalogConfig) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::default();
    for (line, row) in read_rows(path)? {
        if !row.is_visible() {
            catalog.hidden += 1;
            continue;
        }
        match MenuItem::parse(&row, line, config) {
            Ok(item) => catalog.items.push(item),
            Err(e) => catalog.errors.push(e),
        }
    }
    Ok(catalog)
}
