use serde_json::Value;
use tracing::warn;

use crate::color::normalize_hex;
use crate::error::LookError;
use crate::look::types::{CanonicalLook, Filter, FilterType, LookSource, RawFilter, RawLook};

const DEFAULT_STYLE: &str = "Custom";

fn resolve_intensity(filter_type: FilterType, value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(intensity) if intensity.is_finite() => intensity.clamp(0.0, 1.0),
        _ => filter_type.default_intensity(),
    }
}

fn resolve_color(filter_type: FilterType, value: Option<&str>) -> String {
    value
        .and_then(normalize_hex)
        .unwrap_or_else(|| filter_type.default_color().to_string())
}

fn build_filter(filter_type: FilterType, raw: &RawFilter) -> Filter {
    Filter {
        filter_type,
        color_hex: resolve_color(filter_type, raw.color_hex.as_deref()),
        intensity: resolve_intensity(filter_type, raw.intensity.as_ref()),
        color_name: raw.color_name.clone(),
        style: raw.style.clone(),
        extra: raw.extra.clone(),
    }
}

/// Reconciles raw suggestions into at most one bounded filter per type, in application
/// order. Unknown types are dropped; on duplicates the higher intensity wins and ties
/// keep the first suggestion.
pub fn normalize(raw_filters: &[RawFilter]) -> Vec<Filter> {
    let mut merged: Vec<Filter> = Vec::with_capacity(raw_filters.len());

    for raw in raw_filters {
        let Some(filter_type) = FilterType::from_str(&raw.filter_type) else {
            let err = LookError::UnknownFilterType(raw.filter_type.clone());
            warn!(target: "look.normalizer", "Dropping filter suggestion: {}", err);
            continue;
        };

        let candidate = build_filter(filter_type, raw);
        match merged
            .iter_mut()
            .find(|existing| existing.filter_type == filter_type)
        {
            Some(existing) => {
                if candidate.intensity > existing.intensity {
                    *existing = candidate;
                }
            }
            None => merged.push(candidate),
        }
    }

    merged.sort_by_key(|filter| filter.filter_type.application_rank());
    merged
}

pub fn normalize_look(raw: &RawLook, source: LookSource) -> CanonicalLook {
    let style = raw.style.trim();
    CanonicalLook {
        filters: normalize(&raw.filters),
        style: if style.is_empty() {
            DEFAULT_STYLE.to_string()
        } else {
            style.to_string()
        },
        description: raw.description.trim().to_string(),
        occasion: raw
            .occasion
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_with_intensity(filter_type: &str, intensity: Value) -> RawFilter {
        RawFilter {
            filter_type: filter_type.to_string(),
            intensity: Some(intensity),
            ..RawFilter::default()
        }
    }

    #[test]
    fn clamps_out_of_range_and_defaults_non_numeric_intensity() {
        let filters = normalize(&[raw_with_intensity("lipstick", json!(1.5))]);
        assert_eq!(filters[0].intensity, 1.0);

        let filters = normalize(&[raw_with_intensity("blush", json!(-0.2))]);
        assert_eq!(filters[0].intensity, 0.0);

        let filters = normalize(&[raw_with_intensity("eyeshadow", json!("abc"))]);
        assert_eq!(filters[0].intensity, 0.7);

        let filters = normalize(&[raw_with_intensity("contour", json!("0.25"))]);
        assert_eq!(filters[0].intensity, 0.25);

        let filters = normalize(&[RawFilter {
            filter_type: "foundation".to_string(),
            ..RawFilter::default()
        }]);
        assert_eq!(filters[0].intensity, 0.7);
    }

    #[test]
    fn duplicate_types_keep_the_stronger_suggestion() {
        let filters = normalize(&[
            raw_with_intensity("lipstick", json!(0.3)),
            raw_with_intensity("lipstick", json!(0.9)),
        ]);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].filter_type, FilterType::Lipstick);
        assert_eq!(filters[0].intensity, 0.9);
    }

    #[test]
    fn duplicate_ties_keep_the_first_suggestion() {
        let filters = normalize(&[
            RawFilter::new("blush", "#111111", 0.5),
            RawFilter::new("blush", "#222222", 0.5),
        ]);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].color_hex, "#111111");
    }

    #[test]
    fn invalid_colors_fall_back_to_type_defaults() {
        let filters = normalize(&[
            RawFilter::new("lipstick", "red", 0.5),
            RawFilter {
                filter_type: "eyeliner".to_string(),
                ..RawFilter::default()
            },
            RawFilter::new("blush", "f4c2c2", 0.5),
        ]);
        assert_eq!(filters[0].color_hex, FilterType::Lipstick.default_color());
        assert_eq!(filters[1].color_hex, FilterType::Eyeliner.default_color());
        assert_eq!(filters[2].color_hex, "#F4C2C2");
    }

    #[test]
    fn drops_unknown_types_and_orders_by_priority() {
        let filters = normalize(&[
            RawFilter::new("highlighter", "#FFFFFF", 0.3),
            RawFilter::new("mascara", "#000000", 0.9),
            RawFilter::new("blush", "#F4C2C2", 0.4),
            RawFilter::new("Foundation", "#E5C3A0", 0.5),
            RawFilter::new("eyeshadow", "#F7E7CE", 0.5),
            RawFilter::new("lipstick", "#E8A9A9", 0.6),
        ]);
        let order: Vec<FilterType> = filters.iter().map(|filter| filter.filter_type).collect();
        assert_eq!(
            order,
            vec![
                FilterType::Foundation,
                FilterType::Lipstick,
                FilterType::Eyeshadow,
                FilterType::Blush,
                FilterType::Highlighter,
            ]
        );
    }

    #[test]
    fn normalize_look_fills_missing_style() {
        let look = normalize_look(
            &RawLook {
                filters: vec![RawFilter::new("lipstick", "#B3001B", 0.9)],
                style: "   ".to_string(),
                description: " Bold lips ".to_string(),
                occasion: Some(String::new()),
            },
            LookSource::Model,
        );
        assert_eq!(look.style, "Custom");
        assert_eq!(look.description, "Bold lips");
        assert_eq!(look.occasion, None);
        assert_eq!(look.source, LookSource::Model);
    }
}
