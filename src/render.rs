//! Static HTML rendering.
//!
//! Alternative to [`crate::generate`] for shops that publish plain HTML
//! instead of running a site generator. Same input, same validation, but the
//! output is finished pages.
//!
//! ## Generated Pages
//!
//! - **Menu page** (`/index.html`): items grouped by category, in the
//!   configured category order, each card linking to its item page
//! - **Item pages** (`/items/{slug}/index.html`): photo, price, weight unit,
//!   description (markdown) and testimonials
//!
//! ## Output Structure
//!
//! ```text
//! public/
//! ├── index.html
//! └── items/
//!     └── truffle-cake/
//!         ├── index.html
//!         ├── truffle-cake.jpg
//!         └── truffle-cake.webp      # only when a WebP variant exists
//! ```
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating,
//! with automatic escaping of everything that comes from the sheet. The
//! description is the one exception: it is markdown, converted with
//! pulldown-cmark and inserted as HTML.

use crate::catalog::{MenuItem, load_catalog};
use crate::config::Config;
use crate::generate::{GenerateError, GenerateReport, GeneratedItem, copy_item_image, reset_dir};
use crate::imaging::OutputFormat;
use crate::naming::{slugify, web_filename};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use std::fs;
use std::path::Path;

const CSS: &str = include_str!("../static/style.css");

/// Format a price with `,` thousands separators and a currency prefix.
pub fn format_price(price: u64, symbol: &str) -> String {
    let digits = price.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}", symbol, grouped)
}

fn markdown_to_html(source: &str) -> String {
    let mut out = String::new();
    md_html::push_html(&mut out, Parser::new(source));
    out
}

/// A rendered item with what its pages need to link to.
struct Card<'a> {
    item: &'a MenuItem,
    slug: String,
    has_image: bool,
    has_webp: bool,
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                (content)
            }
        }
    }
}

fn site_header(breadcrumb: Markup) -> Markup {
    html! {
        header.site-header {
            nav.breadcrumb {
                (breadcrumb)
            }
        }
    }
}

/// `<picture>` for an item, with paths relative to `prefix`.
fn item_picture(card: &Card, prefix: &str) -> Markup {
    let jpeg = web_filename(&card.slug, OutputFormat::Jpeg);
    let webp = web_filename(&card.slug, OutputFormat::WebP);
    html! {
        picture {
            @if card.has_webp {
                source type="image/webp" srcset={ (prefix) (webp) };
            }
            img src={ (prefix) (jpeg) } alt=(card.item.name) loading="lazy";
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_menu(cards: &[Card], categories: &[String], symbol: &str) -> Markup {
    let breadcrumb = html! {
        a href="/" { "Our Menu" }
    };

    let content = html! {
        (site_header(breadcrumb))
        main.menu-page {
            h1 { "Our Menu" }
            @for category in categories {
                @let in_category: Vec<&Card> = cards.iter().filter(|c| c.item.category == *category).collect();
                @if !in_category.is_empty() {
                    section.category {
                        h2 { (category) }
                        div.item-grid {
                            @for card in in_category {
                                a.item-card href={ "items/" (card.slug) "/" } {
                                    @if card.has_image {
                                        (item_picture(card, &format!("items/{}/", card.slug)))
                                    }
                                    span.item-name { (card.item.name) }
                                    span.item-price { (format_price(card.item.price, symbol)) }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base_document("Our Menu", content)
}

fn render_item(card: &Card, symbol: &str) -> Markup {
    let item = card.item;
    let breadcrumb = html! {
        a href="/" { "Our Menu" }
        " › "
        (item.category)
    };

    let content = html! {
        (site_header(breadcrumb))
        main.item-page {
            @if card.has_image {
                figure.item-photo {
                    (item_picture(card, ""))
                }
            }
            article.item-details {
                h1 { (item.name) }
                p.item-meta {
                    span.item-category { (item.category) }
                    " · "
                    span.item-price { (format_price(item.price, symbol)) }
                    " / " (item.weight_unit)
                }
                div.item-description {
                    (PreEscaped(markdown_to_html(&item.description)))
                }
                @if !item.testimonials.is_empty() {
                    section.testimonials {
                        h2 { "What customers say" }
                        @for quote in &item.testimonials {
                            blockquote { (quote) }
                        }
                    }
                }
            }
        }
    };

    base_document(&item.name, content)
}

/// Render the HTML site for every valid visible row of the catalog.
pub fn render_site(catalog_path: &Path, config: &Config) -> Result<GenerateReport, GenerateError> {
    let catalog = load_catalog(catalog_path, &config.catalog)?;
    let site_dir = config.site_dir();
    let web_dir = config.web_images_dir();
    let symbol = config
        .catalog
        .currency_symbols
        .first()
        .map(String::as_str)
        .unwrap_or("");
    reset_dir(&site_dir)?;

    let mut report = GenerateReport::from_catalog(&catalog);
    let mut cards = Vec::with_capacity(catalog.items.len());
    for item in &catalog.items {
        let slug = slugify(&item.name);
        let item_dir = site_dir.join("items").join(&slug);
        fs::create_dir_all(&item_dir)?;

        let jpeg = web_filename(&slug, OutputFormat::Jpeg);
        let missing = copy_item_image(&web_dir, &item_dir, &jpeg)?;
        let has_image = missing.is_none();
        report.warnings.extend(missing);

        let webp = web_filename(&slug, OutputFormat::WebP);
        let has_webp = has_image && web_dir.join(&webp).is_file();
        if has_webp {
            fs::copy(web_dir.join(&webp), item_dir.join(&webp))?;
        }

        let card = Card {
            item,
            slug,
            has_image,
            has_webp,
        };
        fs::write(
            item_dir.join("index.html"),
            render_item(&card, symbol).into_string(),
        )?;
        report.items.push(GeneratedItem {
            name: item.name.clone(),
            slug: card.slug.clone(),
            dir: item_dir,
        });
        cards.push(card);
    }

    let menu = render_menu(&cards, &config.catalog.categories, symbol);
    fs::write(site_dir.join("index.html"), menu.into_string())?;

    Ok(report)
}

// ============================================================================
// Tests
// ============================================================================
