//! Site content generation.
//!
//! Stage 2 of the crumb pipeline. Reads the local catalog, validates every
//! visible row, and writes Hugo-style markdown content for the valid ones.
//!
//! ## Output Structure
//!
//! ```text
//! content/
//! ├── menu/
//! │   └── _index.md              # title = "Our Menu"
//! └── items/
//!     └── truffle-cake/
//!         ├── index.md           # +++ front matter +++ then description
//!         └── truffle-cake.jpg   # copied from the web images dir
//! ```
//!
//! The content directory is removed and recreated on every run, so items
//! that were hidden or removed from the sheet disappear from the site.
//!
//! Rows that fail validation are reported and skipped; their siblings are
//! still generated. A missing web image is only a warning: the page is
//! written and simply has no photo until the next sync.

use crate::catalog::{Catalog, CatalogError, MenuItem, RowError, load_catalog};
use crate::config::Config;
use crate::imaging::OutputFormat;
use crate::naming::{slugify, web_filename};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Front matter error: {0}")]
    FrontMatter(#[from] toml::ser::Error),
}

/// One page written for a valid item.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedItem {
    pub name: String,
    pub slug: String,
    /// Directory holding the item's page.
    pub dir: PathBuf,
}

/// Result of a generate or render run.
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub items: Vec<GeneratedItem>,
    /// Rows skipped because `show` was not truthy.
    pub hidden: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<RowError>,
}

impl GenerateReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            hidden: catalog.hidden,
            errors: catalog.errors.clone(),
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct FrontMatter<'a> {
    title: &'a str,
    category: &'a str,
    description: &'a str,
    price: u64,
    weight_unit: &'a str,
    image: &'a str,
    testimonials: &'a [String],
}

/// Front matter followed by the description, as written to `index.md`.
pub fn item_markdown(item: &MenuItem, image: &str) -> Result<String, GenerateError> {
    let front = toml::to_string(&FrontMatter {
        title: &item.name,
        category: &item.category,
        description: &item.description,
        price: item.price,
        weight_unit: &item.weight_unit,
        image,
        testimonials: &item.testimonials,
    })?;
    Ok(format!("+++\n{}+++\n\n{}\n", front, item.description))
}

/// Remove `dir` if present and create it empty.
pub(crate) fn reset_dir(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

/// Copy the item's web JPEG into `item_dir`. Returns a warning when missing.
pub(crate) fn copy_item_image(
    web_dir: &Path,
    item_dir: &Path,
    image: &str,
) -> std::io::Result<Option<String>> {
    let src = web_dir.join(image);
    if !src.is_file() {
        return Ok(Some(format!("Image {} not found.", src.display())));
    }
    fs::copy(&src, item_dir.join(image))?;
    Ok(None)
}

/// Write markdown content for every valid visible row of the catalog.
pub fn generate_content(catalog_path: &Path, config: &Config) -> Result<GenerateReport, GenerateError> {
    let catalog = load_catalog(catalog_path, &config.catalog)?;
    let content_dir = config.content_dir();
    let web_dir = config.web_images_dir();
    reset_dir(&content_dir)?;

    let mut report = GenerateReport::from_catalog(&catalog);
    for item in &catalog.items {
        let slug = slugify(&item.name);
        let image = web_filename(&slug, OutputFormat::Jpeg);
        let item_dir = content_dir.join("items").join(&slug);
        fs::create_dir_all(&item_dir)?;

        if let Some(warning) = copy_item_image(&web_dir, &item_dir, &image)? {
            report.warnings.push(warning);
        }
        fs::write(item_dir.join("index.md"), item_markdown(item, &image)?)?;

        report.items.push(GeneratedItem {
            name: item.name.clone(),
            slug,
            dir: item_dir,
        });
    }

    let menu_dir = content_dir.join("menu");
    fs::create_dir_all(&menu_dir)?;
    fs::write(menu_dir.join("_index.md"), "+++\ntitle = \"Our Menu\"\n+++\n\n")?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldError;
    use crate::test_helpers::{TestProject, catalog_line};

    fn front_matter(markdown: &str) -> toml::Value {
        let body = markdown.strip_prefix("+++\n").unwrap();
        let end = body.find("+++\n").unwrap();
        body[..end].parse().unwrap()
    }

    fn truffle() -> MenuItem {
        MenuItem {
            name: "Truffle Cake".into(),
            category: "Cakes".into(),
            description: "Dark *and* rich.".into(),
            price: 1200,
            weight_unit: "kg".into(),
            image: "IMG_2041.jpg".into(),
            testimonials: vec!["Loved it!".into(), "Best cake".into()],
        }
    }

    // =========================================================================
    // Markdown
    // =========================================================================

    #[test]
    fn markdown_has_front_matter_then_description() {
        let md = item_markdown(&truffle(), "truffle-cake.jpg").unwrap();
        assert!(md.starts_with("+++\ntitle = \"Truffle Cake\"\n"));
        assert!(md.ends_with("+++\n\nDark *and* rich.\n"));
    }

    #[test]
    fn front_matter_fields() {
        let md = item_markdown(&truffle(), "truffle-cake.jpg").unwrap();
        let fm = front_matter(&md);
        assert_eq!(fm["title"].as_str(), Some("Truffle Cake"));
        assert_eq!(fm["category"].as_str(), Some("Cakes"));
        assert_eq!(fm["price"].as_integer(), Some(1200));
        assert_eq!(fm["weight_unit"].as_str(), Some("kg"));
        assert_eq!(fm["image"].as_str(), Some("truffle-cake.jpg"));
        let testimonials: Vec<&str> = fm["testimonials"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t.as_str())
            .collect();
        assert_eq!(testimonials, vec!["Loved it!", "Best cake"]);
    }

    #[test]
    fn front_matter_escapes_quotes() {
        let mut item = truffle();
        item.name = "Mom's \"Famous\" Pie".into();
        let fm = front_matter(&item_markdown(&item, "x.jpg").unwrap());
        assert_eq!(fm["title"].as_str(), Some("Mom's \"Famous\" Pie"));
    }

    // =========================================================================
    // Content generation
    // =========================================================================

    #[test]
    fn three_row_catalog() {
        let project = TestProject::new();
        let path = project.write_local_catalog(&[
            catalog_line("Chocolate Truffle", "Cakes", "₹1,200", "truffle.jpg", "yes"),
            catalog_line("Old Loaf", "Breads", "90", "loaf.jpg", "no"),
            catalog_line("Mystery Cake", "Cakes", "abc", "mystery.jpg", "yes"),
        ]);
        project.write_web_image("chocolate-truffle.jpg", b"jpeg bytes");

        let report = generate_content(&path, &project.config).unwrap();

        assert!(report.has_errors());
        assert_eq!(report.hidden, 1);
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].slug, "chocolate-truffle");
        assert!(report.warnings.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].name, "Mystery Cake");
        assert_eq!(
            report.errors[0].errors,
            vec![FieldError::InvalidPrice("abc".into())]
        );

        let items = project.config.content_dir().join("items");
        let md = fs::read_to_string(items.join("chocolate-truffle/index.md")).unwrap();
        assert_eq!(front_matter(&md)["price"].as_integer(), Some(1200));
        assert_eq!(
            fs::read(items.join("chocolate-truffle/chocolate-truffle.jpg")).unwrap(),
            b"jpeg bytes"
        );
        assert!(!items.join("old-loaf").exists());
        assert!(!items.join("mystery-cake").exists());
    }

    #[test]
    fn missing_web_image_is_a_warning() {
        let project = TestProject::new();
        let path = project.write_local_catalog(&[catalog_line(
            "Oat Cookie",
            "Cookies",
            "40",
            "oat.jpg",
            "yes",
        )]);

        let report = generate_content(&path, &project.config).unwrap();

        assert!(!report.has_errors());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("oat-cookie.jpg"));
        let dir = project.config.content_dir().join("items/oat-cookie");
        assert!(dir.join("index.md").exists());
        assert!(!dir.join("oat-cookie.jpg").exists());
    }

    #[test]
    fn menu_index_written() {
        let project = TestProject::new();
        let path = project.write_local_catalog(&[]);

        generate_content(&path, &project.config).unwrap();

        let index =
            fs::read_to_string(project.config.content_dir().join("menu/_index.md")).unwrap();
        assert_eq!(front_matter(&index)["title"].as_str(), Some("Our Menu"));
    }

    #[test]
    fn stale_content_is_removed() {
        let project = TestProject::new();
        let stale = project.config.content_dir().join("items/gone/index.md");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();
        let path = project.write_local_catalog(&[]);

        generate_content(&path, &project.config).unwrap();

        assert!(!stale.exists());
    }

    #[test]
    fn missing_catalog_is_an_error() {
        let project = TestProject::new();
        let result = generate_content(&project.config.catalog_path(), &project.config);
        assert!(matches!(result, Err(GenerateError::Catalog(_))));
    }
}
