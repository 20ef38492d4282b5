//! Network-free look selection used whenever the model cannot produce a usable answer.

use crate::look::types::{RawFilter, RawLook};

struct PresetFilter {
    filter_type: &'static str,
    color_hex: &'static str,
    intensity: f64,
    style: &'static str,
}

pub struct LookPreset {
    pub style: &'static str,
    pub description: &'static str,
    pub occasion: &'static str,
    keywords: &'static [&'static str],
    filters: &'static [PresetFilter],
}

impl LookPreset {
    pub fn to_raw_look(&self) -> RawLook {
        RawLook {
            filters: self
                .filters
                .iter()
                .map(|preset| {
                    RawFilter::new(preset.filter_type, preset.color_hex, preset.intensity)
                        .with_style(preset.style)
                })
                .collect(),
            style: self.style.to_string(),
            description: self.description.to_string(),
            occasion: Some(self.occasion.to_string()),
        }
    }

    fn matches(&self, prompt: &str) -> bool {
        self.keywords.iter().any(|keyword| prompt.contains(keyword))
    }
}

static BRIDAL: LookPreset = LookPreset {
    style: "Bridal",
    description: "Soft, luminous bridal look with rosy lips and champagne lids.",
    occasion: "wedding",
    keywords: &["wedding", "bridal", "bride"],
    filters: &[
        PresetFilter {
            filter_type: "lipstick",
            color_hex: "#E8A4AC",
            intensity: 0.6,
            style: "satin",
        },
        PresetFilter {
            filter_type: "eyeshadow",
            color_hex: "#F7E7CE",
            intensity: 0.5,
            style: "shimmer",
        },
        PresetFilter {
            filter_type: "blush",
            color_hex: "#F4C2C2",
            intensity: 0.4,
            style: "soft",
        },
        PresetFilter {
            filter_type: "eyeliner",
            color_hex: "#5C4033",
            intensity: 0.5,
            style: "thin",
        },
    ],
};

static EVENING: LookPreset = LookPreset {
    style: "Evening Glam",
    description: "Dramatic evening look with a deep red lip and smoky eyes.",
    occasion: "evening",
    keywords: &[
        "evening",
        "party",
        "glamorous",
        "glam",
        "dramatic",
        "bold",
        "night",
    ],
    filters: &[
        PresetFilter {
            filter_type: "lipstick",
            color_hex: "#B3001B",
            intensity: 0.9,
            style: "matte",
        },
        PresetFilter {
            filter_type: "eyeliner",
            color_hex: "#0D0D0D",
            intensity: 0.95,
            style: "winged",
        },
        PresetFilter {
            filter_type: "eyeshadow",
            color_hex: "#4B3A5A",
            intensity: 0.8,
            style: "smoky",
        },
        PresetFilter {
            filter_type: "contour",
            color_hex: "#7A5230",
            intensity: 0.6,
            style: "sculpted",
        },
    ],
};

static PROFESSIONAL: LookPreset = LookPreset {
    style: "Professional",
    description: "Polished, understated look suited to the office.",
    occasion: "work",
    keywords: &["professional", "office", "work", "business", "interview"],
    filters: &[
        PresetFilter {
            filter_type: "foundation",
            color_hex: "#E5C3A0",
            intensity: 0.6,
            style: "natural",
        },
        PresetFilter {
            filter_type: "lipstick",
            color_hex: "#B5707A",
            intensity: 0.5,
            style: "satin",
        },
        PresetFilter {
            filter_type: "eyeliner",
            color_hex: "#3B2F2F",
            intensity: 0.5,
            style: "tightline",
        },
        PresetFilter {
            filter_type: "eyeshadow",
            color_hex: "#B89B85",
            intensity: 0.4,
            style: "matte",
        },
    ],
};

static NATURAL: LookPreset = LookPreset {
    style: "Natural",
    description: "Fresh everyday look with sheer coverage and a nude lip.",
    occasion: "everyday",
    keywords: &["natural", "everyday", "daily", "casual"],
    filters: &[
        PresetFilter {
            filter_type: "foundation",
            color_hex: "#EAC9A8",
            intensity: 0.4,
            style: "sheer",
        },
        PresetFilter {
            filter_type: "lipstick",
            color_hex: "#D19C97",
            intensity: 0.4,
            style: "balm",
        },
        PresetFilter {
            filter_type: "blush",
            color_hex: "#F2B5A7",
            intensity: 0.3,
            style: "soft",
        },
        PresetFilter {
            filter_type: "highlighter",
            color_hex: "#FFF1E0",
            intensity: 0.3,
            style: "dewy",
        },
    ],
};

/// Evaluated in order; the first preset whose keyword occurs in the prompt wins.
static PRESETS: [&LookPreset; 3] = [&BRIDAL, &EVENING, &PROFESSIONAL];

pub fn classify_preset(prompt: &str) -> &'static LookPreset {
    let lowered = prompt.to_lowercase();
    PRESETS
        .iter()
        .copied()
        .find(|preset| preset.matches(&lowered))
        .unwrap_or(&NATURAL)
}

pub fn classify(prompt: &str) -> RawLook {
    classify_preset(prompt).to_raw_look()
}
