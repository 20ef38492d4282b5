use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cosmetic effect kinds. Declaration order is the application priority, so the derived
/// `Ord` sorts filters the way they are layered onto a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Foundation,
    Lipstick,
    Eyeliner,
    Eyeshadow,
    Blush,
    Contour,
    Highlighter,
}

impl FilterType {
    pub const APPLICATION_ORDER: [FilterType; 7] = [
        FilterType::Foundation,
        FilterType::Lipstick,
        FilterType::Eyeliner,
        FilterType::Eyeshadow,
        FilterType::Blush,
        FilterType::Contour,
        FilterType::Highlighter,
    ];

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "foundation" => Some(Self::Foundation),
            "lipstick" => Some(Self::Lipstick),
            "eyeliner" => Some(Self::Eyeliner),
            "eyeshadow" => Some(Self::Eyeshadow),
            "blush" => Some(Self::Blush),
            "contour" => Some(Self::Contour),
            "highlighter" => Some(Self::Highlighter),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Foundation => "foundation",
            Self::Lipstick => "lipstick",
            Self::Eyeliner => "eyeliner",
            Self::Eyeshadow => "eyeshadow",
            Self::Blush => "blush",
            Self::Contour => "contour",
            Self::Highlighter => "highlighter",
        }
    }

    pub fn application_rank(self) -> usize {
        self as usize
    }

    pub const fn default_intensity(self) -> f64 {
        match self {
            Self::Lipstick => 0.8,
            Self::Eyeshadow => 0.7,
            Self::Blush => 0.6,
            Self::Foundation => 0.7,
            Self::Eyeliner => 0.8,
            Self::Highlighter | Self::Contour => 0.6,
        }
    }

    pub const fn default_color(self) -> &'static str {
        match self {
            Self::Foundation => "#E8C4A0",
            Self::Lipstick => "#C2185B",
            Self::Eyeliner => "#1A1A1A",
            Self::Eyeshadow => "#A67B5B",
            Self::Blush => "#F4A6A6",
            Self::Contour => "#8B6A4F",
            Self::Highlighter => "#FFF4E0",
        }
    }
}

/// Secondary per-filter parameter (finish, thickness, shimmer amount, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub color_hex: String,
    pub intensity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, ExtraValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookSource {
    Model,
    Cache,
    Fallback,
}

impl LookSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            LookSource::Model => "model",
            LookSource::Cache => "cache",
            LookSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalLook {
    pub filters: Vec<Filter>,
    pub style: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    pub source: LookSource,
}

impl CanonicalLook {
    pub fn filter(&self, filter_type: FilterType) -> Option<&Filter> {
        self.filters
            .iter()
            .find(|filter| filter.filter_type == filter_type)
    }

    pub fn filter_types(&self) -> Vec<FilterType> {
        self.filters.iter().map(|filter| filter.filter_type).collect()
    }

    pub fn with_source(&self, source: LookSource) -> CanonicalLook {
        CanonicalLook {
            source,
            ..self.clone()
        }
    }
}

/// Unvalidated filter suggestion, as produced by the model or the fallback library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFilter {
    pub filter_type: String,
    pub color_hex: Option<String>,
    pub color_name: Option<String>,
    pub intensity: Option<Value>,
    pub style: Option<String>,
    pub extra: BTreeMap<String, ExtraValue>,
}

const RAW_FILTER_KNOWN_KEYS: &[&str] = &[
    "type", "hex", "colorHex", "color_hex", "color", "intensity", "style",
];

impl RawFilter {
    pub fn new(filter_type: &str, color_hex: &str, intensity: f64) -> Self {
        RawFilter {
            filter_type: filter_type.to_string(),
            color_hex: Some(color_hex.to_string()),
            intensity: Some(Value::from(intensity)),
            ..RawFilter::default()
        }
    }

    pub fn with_style(mut self, style: &str) -> Self {
        self.style = Some(style.to_string());
        self
    }

    /// Reads one entry of a model `filters` array. Entries that are not objects or lack a
    /// string `type` are skipped; everything else is left for the normalizer to judge.
    pub fn from_json(value: &Value) -> Option<RawFilter> {
        let object = value.as_object()?;
        let filter_type = object.get("type")?.as_str()?.to_string();

        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let color = text("color");
        let color_is_hex = color
            .as_deref()
            .map(crate::color::is_valid_hex)
            .unwrap_or(false);
        let color_hex = text("hex")
            .or_else(|| text("colorHex"))
            .or_else(|| text("color_hex"))
            .or_else(|| if color_is_hex { color.clone() } else { None });
        let color_name = if color_is_hex { None } else { color };

        let mut extra = BTreeMap::new();
        for (key, value) in object {
            if RAW_FILTER_KNOWN_KEYS.contains(&key.as_str()) {
                continue;
            }
            match value {
                Value::Number(number) => {
                    if let Some(number) = number.as_f64() {
                        extra.insert(key.clone(), ExtraValue::Number(number));
                    }
                }
                Value::String(text) if !text.trim().is_empty() => {
                    extra.insert(key.clone(), ExtraValue::Text(text.trim().to_string()));
                }
                _ => {}
            }
        }

        Some(RawFilter {
            filter_type,
            color_hex,
            color_name,
            intensity: object.get("intensity").cloned(),
            style: text("style").or_else(|| text("finish")),
            extra,
        })
    }
}

/// Unvalidated look: raw filters plus the descriptive fields around them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLook {
    pub filters: Vec<RawFilter>,
    pub style: String,
    pub description: String,
    pub occasion: Option<String>,
}
