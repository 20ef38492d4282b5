use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::color::Rgb;

pub mod matcher;

pub use matcher::{match_products, recommend_for_look, FilterRecommendation, MatchResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shades: Vec<String>,
}

impl Product {
    /// The product's own color, or the first shade of a multi-shade palette.
    pub fn primary_color(&self) -> Option<Rgb> {
        self.color_hex
            .as_deref()
            .and_then(Rgb::from_hex)
            .or_else(|| self.shades.first().and_then(|shade| Rgb::from_hex(shade)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Flat(Vec<Product>),
    ByCategory(HashMap<String, Vec<Product>>),
}

/// Read-only products grouped by lowercase category, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    by_category: HashMap<String, Vec<Product>>,
}

fn category_key(category: &str) -> String {
    category.trim().to_lowercase()
}

impl ProductCatalog {
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut by_category: HashMap<String, Vec<Product>> = HashMap::new();
        for product in products {
            by_category
                .entry(category_key(&product.category))
                .or_default()
                .push(product);
        }
        ProductCatalog { by_category }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: CatalogFile =
            serde_json::from_str(raw).context("catalog is neither a product list nor a category map")?;
        Ok(match parsed {
            CatalogFile::Flat(products) => ProductCatalog::from_products(products),
            CatalogFile::ByCategory(groups) => {
                let mut by_category: HashMap<String, Vec<Product>> = HashMap::new();
                for (category, products) in groups {
                    by_category
                        .entry(category_key(&category))
                        .or_default()
                        .extend(products);
                }
                ProductCatalog { by_category }
            }
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let catalog = ProductCatalog::from_json(&raw)
            .with_context(|| format!("failed to parse catalog {}", path.display()))?;
        info!(
            "Loaded {} product(s) in {} categor(ies) from {}",
            catalog.len(),
            catalog.by_category.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn products_for(&self, category: &str) -> &[Product] {
        self.by_category
            .get(&category_key(category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.by_category.keys().map(String::as_str).collect();
        categories.sort_unstable();
        categories
    }

    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_color_prefers_own_hex_then_first_shade() {
        let mut product: Product = serde_json::from_str(
            r##"{"id":"p1","name":"Palette","brand":"B","price":30,"category":"eyeshadow","shades":["#F7E7CE","#4B3A5A"]}"##,
        )
        .unwrap();
        assert_eq!(product.primary_color(), Rgb::from_hex("#F7E7CE"));

        product.color_hex = Some("#000000".to_string());
        assert_eq!(product.primary_color(), Some(Rgb::new(0, 0, 0)));

        product.color_hex = Some("not a color".to_string());
        product.shades.clear();
        assert_eq!(product.primary_color(), None);
    }

    #[test]
    fn loads_flat_lists_and_category_maps() {
        let flat = ProductCatalog::from_json(
            r##"[
                {"id":"1","name":"Rose","brand":"A","price":20,"category":"Lipstick","colorHex":"#E8A9A9"},
                {"id":"2","name":"Glow","brand":"A","price":25,"category":"highlighter","colorHex":"#FFF4E0"}
            ]"##,
        )
        .unwrap();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat.products_for("lipstick").len(), 1);
        assert_eq!(flat.categories(), vec!["highlighter", "lipstick"]);

        let grouped = ProductCatalog::from_json(
            r##"{"Blush": [{"id":"3","name":"Peach","brand":"B","price":18,"category":"blush","colorHex":"#F2B5A7"}]}"##,
        )
        .unwrap();
        assert_eq!(grouped.products_for("blush")[0].id, "3");
        assert!(grouped.products_for("contour").is_empty());
    }

    #[test]
    fn rejects_unrecognized_catalog_shapes() {
        assert!(ProductCatalog::from_json("42").is_err());
    }
}
