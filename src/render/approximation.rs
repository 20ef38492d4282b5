use serde::Serialize;

use crate::color::Rgb;
use crate::look::types::{Filter, FilterType};

/// CSS-level stand-in for a filter: global tone adjustments plus a translucent overlay of
/// the filter color. Factors are multiplicative, 1.0 leaves the image unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproximationChain {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    #[serde(serialize_with = "serialize_rgb")]
    pub overlay: Rgb,
    pub overlay_alpha: f64,
}

fn serialize_rgb<S: serde::Serializer>(rgb: &Rgb, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&rgb.to_hex())
}

struct Tuning {
    brightness: f64,
    contrast: f64,
    saturation: f64,
    overlay: f64,
}

const fn tuning(filter_type: FilterType) -> Tuning {
    match filter_type {
        FilterType::Foundation => Tuning {
            brightness: 0.05,
            contrast: -0.05,
            saturation: -0.10,
            overlay: 0.15,
        },
        FilterType::Lipstick => Tuning {
            brightness: 0.0,
            contrast: 0.05,
            saturation: 0.20,
            overlay: 0.35,
        },
        FilterType::Eyeliner => Tuning {
            brightness: 0.0,
            contrast: 0.15,
            saturation: 0.0,
            overlay: 0.20,
        },
        FilterType::Eyeshadow => Tuning {
            brightness: 0.0,
            contrast: 0.10,
            saturation: 0.05,
            overlay: 0.25,
        },
        FilterType::Blush => Tuning {
            brightness: 0.02,
            contrast: 0.0,
            saturation: 0.10,
            overlay: 0.20,
        },
        FilterType::Contour => Tuning {
            brightness: -0.08,
            contrast: 0.10,
            saturation: 0.0,
            overlay: 0.15,
        },
        FilterType::Highlighter => Tuning {
            brightness: 0.10,
            contrast: 0.0,
            saturation: 0.0,
            overlay: 0.20,
        },
    }
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

impl ApproximationChain {
    pub fn for_filter(filter: &Filter) -> Option<Self> {
        let overlay = Rgb::from_hex(&filter.color_hex)?;
        let intensity = filter.intensity.clamp(0.0, 1.0);
        let tuning = tuning(filter.filter_type);
        Some(ApproximationChain {
            brightness: 1.0 + tuning.brightness * intensity,
            contrast: 1.0 + tuning.contrast * intensity,
            saturation: 1.0 + tuning.saturation * intensity,
            overlay,
            overlay_alpha: tuning.overlay * intensity,
        })
    }

    pub fn css_filter(&self) -> String {
        format!(
            "brightness({:.2}) contrast({:.2}) saturate({:.2})",
            self.brightness, self.contrast, self.saturation
        )
    }

    pub fn css_overlay(&self) -> String {
        format!(
            "rgba({}, {}, {}, {:.2})",
            self.overlay.r, self.overlay.g, self.overlay.b, self.overlay_alpha
        )
    }

    /// Applies the chain to one RGBA pixel, leaving alpha untouched.
    pub fn apply_to_pixel(&self, pixel: [u8; 4]) -> [u8; 4] {
        let mut rgb = [
            f64::from(pixel[0]),
            f64::from(pixel[1]),
            f64::from(pixel[2]),
        ];

        for value in rgb.iter_mut() {
            *value *= self.brightness;
            *value = (*value - 128.0) * self.contrast + 128.0;
        }

        let luma = 0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2];
        for value in rgb.iter_mut() {
            *value = luma + (*value - luma) * self.saturation;
        }

        let overlay = [
            f64::from(self.overlay.r),
            f64::from(self.overlay.g),
            f64::from(self.overlay.b),
        ];
        let alpha = self.overlay_alpha.clamp(0.0, 1.0);
        for (value, tint) in rgb.iter_mut().zip(overlay) {
            *value = *value * (1.0 - alpha) + tint * alpha;
        }

        [channel(rgb[0]), channel(rgb[1]), channel(rgb[2]), pixel[3]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn filter(filter_type: FilterType, color_hex: &str, intensity: f64) -> Filter {
        Filter {
            filter_type,
            color_hex: color_hex.to_string(),
            intensity,
            color_name: None,
            style: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn zero_intensity_is_identity() {
        let chain = ApproximationChain::for_filter(&filter(FilterType::Lipstick, "#FF0000", 0.0))
            .unwrap();
        assert_eq!(chain.apply_to_pixel([10, 120, 200, 77]), [10, 120, 200, 77]);
        assert_eq!(chain.css_filter(), "brightness(1.00) contrast(1.00) saturate(1.00)");
        assert_eq!(chain.css_overlay(), "rgba(255, 0, 0, 0.00)");
    }

    #[test]
    fn overlay_pulls_pixels_toward_filter_color() {
        let chain = ApproximationChain::for_filter(&filter(FilterType::Lipstick, "#FF0000", 1.0))
            .unwrap();
        let [r, g, b, a] = chain.apply_to_pixel([128, 128, 128, 255]);
        assert!(r > 128);
        assert!(g < 128);
        assert!(b < 128);
        assert_eq!(a, 255);
        assert_eq!(chain.css_overlay(), "rgba(255, 0, 0, 0.35)");
    }

    #[test]
    fn contour_darkens_and_highlighter_brightens() {
        let contour = ApproximationChain::for_filter(&filter(FilterType::Contour, "#808080", 1.0))
            .unwrap();
        let highlighter =
            ApproximationChain::for_filter(&filter(FilterType::Highlighter, "#808080", 1.0))
                .unwrap();
        assert!(contour.brightness < 1.0);
        assert!(highlighter.brightness > 1.0);
    }

    #[test]
    fn invalid_color_yields_no_chain() {
        assert!(ApproximationChain::for_filter(&filter(FilterType::Blush, "pink", 0.5)).is_none());
    }
}
