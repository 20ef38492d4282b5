use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?[0-9a-fA-F]{6}$").expect("valid hex color regex"));

/// Distance between black and white, `sqrt(3 * 255^2)`.
pub const MAX_DISTANCE: f64 = 441.672_955_930_063_7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parses `#RRGGBB` or `RRGGBB`, case-insensitive. Surrounding whitespace is ignored.
    pub fn from_hex(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if !is_valid_hex(trimmed) {
            return None;
        }
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Rgb { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn distance(self, other: Rgb) -> f64 {
        let dr = f64::from(self.r) - f64::from(other.r);
        let dg = f64::from(self.g) - f64::from(other.g);
        let db = f64::from(self.b) - f64::from(other.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub fn is_valid_hex(value: &str) -> bool {
    HEX_COLOR_RE.is_match(value.trim())
}

/// Canonical uppercase `#RRGGBB` form, or `None` when the value is not a hex color.
pub fn normalize_hex(value: &str) -> Option<String> {
    Rgb::from_hex(value).map(Rgb::to_hex)
}

pub fn color_distance(a: &str, b: &str) -> Option<f64> {
    Some(Rgb::from_hex(a)?.distance(Rgb::from_hex(b)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(Rgb::from_hex("#E8A9A9"), Some(Rgb::new(0xE8, 0xA9, 0xA9)));
        assert_eq!(Rgb::from_hex("e8a9a9"), Some(Rgb::new(0xE8, 0xA9, 0xA9)));
        assert_eq!(Rgb::from_hex("  #ff0000 "), Some(Rgb::new(255, 0, 0)));
    }

    #[test]
    fn rejects_short_and_non_hex_values() {
        assert!(Rgb::from_hex("#abc").is_none());
        assert!(Rgb::from_hex("#GGGGGG").is_none());
        assert!(Rgb::from_hex("##FF0000").is_none());
        assert!(Rgb::from_hex("soft pink").is_none());
        assert!(!is_valid_hex(""));
    }

    #[test]
    fn normalizes_to_uppercase_with_hash() {
        assert_eq!(normalize_hex("f7e7ce").as_deref(), Some("#F7E7CE"));
        assert_eq!(normalize_hex("nope"), None);
    }

    #[test]
    fn distance_spans_zero_to_max() {
        assert_eq!(color_distance("#FF0000", "#ff0000"), Some(0.0));
        let extreme = color_distance("#000000", "#FFFFFF").unwrap();
        assert!((extreme - MAX_DISTANCE).abs() < 1e-9);
        assert!((MAX_DISTANCE - 441.67).abs() < 0.01);
        assert_eq!(color_distance("#000000", "#030400"), Some(5.0));
        assert_eq!(color_distance("#000000", "bad"), None);
    }
}
