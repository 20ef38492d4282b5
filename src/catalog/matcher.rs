use serde::Serialize;

use crate::catalog::{Product, ProductCatalog};
use crate::color::{Rgb, MAX_DISTANCE};
use crate::look::types::{CanonicalLook, Filter, FilterType};

pub const DEFAULT_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub product: Product,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRecommendation {
    pub filter_type: FilterType,
    pub matches: Vec<MatchResult>,
}

/// Ranks products of the filter's category by RGB distance to the filter color.
///
/// Products without a resolvable color get `MAX_DISTANCE` and rank after every product
/// that has one. Equal distances keep catalog order.
pub fn match_products(filter: &Filter, catalog: &[Product], k: usize) -> Vec<MatchResult> {
    if k == 0 {
        return Vec::new();
    }
    let Some(target) = Rgb::from_hex(&filter.color_hex) else {
        return Vec::new();
    };
    let category = filter.filter_type.as_str();

    let mut ranked: Vec<(bool, MatchResult)> = catalog
        .iter()
        .filter(|product| product.category.trim().eq_ignore_ascii_case(category))
        .map(|product| match product.primary_color() {
            Some(color) => (
                false,
                MatchResult {
                    product: product.clone(),
                    distance: target.distance(color),
                },
            ),
            None => (
                true,
                MatchResult {
                    product: product.clone(),
                    distance: MAX_DISTANCE,
                },
            ),
        })
        .collect();

    ranked.sort_by(|(a_unresolved, a), (b_unresolved, b)| {
        a_unresolved
            .cmp(b_unresolved)
            .then_with(|| a.distance.total_cmp(&b.distance))
    });

    ranked
        .into_iter()
        .take(k)
        .map(|(_, result)| result)
        .collect()
}

pub fn recommend_for_look(
    look: &CanonicalLook,
    catalog: &ProductCatalog,
    k: usize,
) -> Vec<FilterRecommendation> {
    look.filters
        .iter()
        .map(|filter| FilterRecommendation {
            filter_type: filter.filter_type,
            matches: match_products(
                filter,
                catalog.products_for(filter.filter_type.as_str()),
                k,
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn filter(filter_type: FilterType, color_hex: &str) -> Filter {
        Filter {
            filter_type,
            color_hex: color_hex.to_string(),
            intensity: 0.8,
            color_name: None,
            style: None,
            extra: BTreeMap::new(),
        }
    }

    fn product(id: &str, category: &str, color_hex: Option<&str>) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            brand: "Test".to_string(),
            price: 10.0,
            category: category.to_string(),
            color_hex: color_hex.map(str::to_string),
            shades: Vec::new(),
        }
    }

    #[test]
    fn exact_color_ranks_first_with_zero_distance() {
        let catalog = vec![
            product("pink", "lipstick", Some("#E8A9A9")),
            product("red", "lipstick", Some("#FF0000")),
            product("wine", "lipstick", Some("#722F37")),
        ];
        let matches = match_products(&filter(FilterType::Lipstick, "#FF0000"), &catalog, 3);
        assert_eq!(matches[0].product.id, "red");
        assert_eq!(matches[0].distance, 0.0);
        assert!(matches.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
    }

    #[test]
    fn unresolvable_colors_rank_after_every_resolvable_color() {
        let catalog = vec![
            product("mystery", "lipstick", None),
            product("white", "lipstick", Some("#FFFFFF")),
            product("broken", "lipstick", Some("oops")),
        ];
        // Black vs white is exactly MAX_DISTANCE, the same score the unknowns get.
        let matches = match_products(&filter(FilterType::Lipstick, "#000000"), &catalog, 3);
        let ids: Vec<&str> = matches.iter().map(|m| m.product.id.as_str()).collect();
        assert_eq!(ids, vec!["white", "mystery", "broken"]);
        assert!((matches[1].distance - 441.67).abs() < 0.01);
    }

    #[test]
    fn ties_keep_catalog_order_and_k_truncates() {
        let catalog = vec![
            product("first", "blush", Some("#101010")),
            product("second", "blush", Some("#101010")),
            product("third", "blush", Some("#202020")),
        ];
        let matches = match_products(&filter(FilterType::Blush, "#101010"), &catalog, 2);
        let ids: Vec<&str> = matches.iter().map(|m| m.product.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert!(match_products(&filter(FilterType::Blush, "#101010"), &catalog, 0).is_empty());
    }

    #[test]
    fn never_mixes_categories_and_handles_empty_catalogs() {
        let catalog = vec![product("shadow", "eyeshadow", Some("#FF0000"))];
        assert!(match_products(&filter(FilterType::Lipstick, "#FF0000"), &catalog, 3).is_empty());
        assert!(match_products(&filter(FilterType::Lipstick, "#FF0000"), &[], 3).is_empty());
    }

    #[test]
    fn recommends_per_filter_of_a_look() {
        let catalog = ProductCatalog::from_products(vec![
            product("rose", "lipstick", Some("#E8A9A9")),
            product("red", "lipstick", Some("#C21807")),
            product("champagne", "eyeshadow", Some("#F7E7CE")),
        ]);
        let look = CanonicalLook {
            filters: vec![
                filter(FilterType::Lipstick, "#E8A4AC"),
                filter(FilterType::Eyeshadow, "#F7E7CE"),
                filter(FilterType::Blush, "#F4C2C2"),
            ],
            style: "Bridal".to_string(),
            description: String::new(),
            occasion: None,
            source: crate::look::types::LookSource::Fallback,
        };

        let recommendations = recommend_for_look(&look, &catalog, DEFAULT_RECOMMENDATIONS);
        assert_eq!(recommendations.len(), 3);
        assert_eq!(recommendations[0].matches[0].product.id, "rose");
        assert_eq!(recommendations[1].matches[0].product.id, "champagne");
        assert!(recommendations[2].matches.is_empty());
    }
}
