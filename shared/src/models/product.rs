//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sentinel image used when an import row carries no image of its own.
///
/// The upsert conflict rule on the server side must never let this value
/// overwrite a real stored image.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Unique product code (upsert conflict key)
    pub code: String,
    /// Unique among active products
    pub slug: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub description: Option<String>,
    pub image_url: String,
    pub category_id: Option<i64>,
    pub active: bool,
    pub featured: bool,
    pub featured_order: Option<i32>,
    pub brand: Option<String>,
    pub quantity: Option<i32>,
    pub unit_of_measure: Option<String>,
    pub reference: Option<String>,
    pub manufacturer_code: Option<String>,
    pub quick_filter_1: Option<String>,
    pub quick_filter_2: Option<String>,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub code: String,
    pub slug: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub active: Option<bool>,
    pub featured: Option<bool>,
    pub featured_order: Option<i32>,
    pub brand: Option<String>,
    pub quantity: Option<i32>,
    pub unit_of_measure: Option<String>,
    pub reference: Option<String>,
    pub manufacturer_code: Option<String>,
    pub quick_filter_1: Option<String>,
    pub quick_filter_2: Option<String>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub slug: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub active: Option<bool>,
    pub featured: Option<bool>,
    pub featured_order: Option<i32>,
    pub brand: Option<String>,
    pub quantity: Option<i32>,
    pub unit_of_measure: Option<String>,
    pub reference: Option<String>,
    pub manufacturer_code: Option<String>,
    pub quick_filter_1: Option<String>,
    pub quick_filter_2: Option<String>,
}

/// Bulk-import row, keyed on `code`
///
/// Import files routinely omit optional columns, so every field except
/// name/code/price carries a per-field default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpsertRow {
    pub name: String,
    pub code: String,
    pub slug: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub description: Option<String>,
    #[serde(default = "default_image")]
    pub image_url: String,
    pub category_id: Option<i64>,
    #[serde(default = "default_true")]
    pub active: bool,
    pub brand: Option<String>,
    pub quantity: Option<i32>,
    pub unit_of_measure: Option<String>,
    pub reference: Option<String>,
    pub manufacturer_code: Option<String>,
    pub quick_filter_1: Option<String>,
    pub quick_filter_2: Option<String>,
}

fn default_image() -> String {
    PLACEHOLDER_IMAGE.to_string()
}

fn default_true() -> bool {
    true
}

impl ProductUpsertRow {
    /// Build a minimal row from the mandatory import columns.
    pub fn new(name: impl Into<String>, code: impl Into<String>, price: Decimal) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self {
            name,
            code: code.into(),
            slug,
            price,
            original_price: None,
            description: None,
            image_url: default_image(),
            category_id: None,
            active: true,
            brand: None,
            quantity: None,
            unit_of_measure: None,
            reference: None,
            manufacturer_code: None,
            quick_filter_1: None,
            quick_filter_2: None,
        }
    }

    /// Whether this row still carries the placeholder image sentinel.
    pub fn has_placeholder_image(&self) -> bool {
        self.image_url == PLACEHOLDER_IMAGE
    }
}

/// Lowercase ASCII slug from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Cafe Torrado  500g"), "cafe-torrado-500g");
        assert_eq!(slugify("--x--"), "x");
    }

    #[test]
    fn upsert_row_defaults() {
        let row = ProductUpsertRow::new("Arroz Tipo 1", "A-100", Decimal::new(1290, 2));
        assert_eq!(row.slug, "arroz-tipo-1");
        assert!(row.active);
        assert!(row.has_placeholder_image());
    }

    #[test]
    fn upsert_row_deserializes_partial_dataset() {
        let row: ProductUpsertRow =
            serde_json::from_str(r#"{"name":"Feijao","code":"F-1","slug":"feijao","price":"8.5"}"#)
                .unwrap();
        assert_eq!(row.image_url, PLACEHOLDER_IMAGE);
        assert!(row.active);
        assert!(row.category_id.is_none());
    }
}
