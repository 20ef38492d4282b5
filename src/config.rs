use std::env;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_dir: PathBuf,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gemini_temperature: f32,
    pub gemini_top_k: i32,
    pub gemini_top_p: f32,
    pub gemini_max_output_tokens: i32,
    pub gemini_safety_settings: String,
    pub model_timeout_seconds: u64,
    pub model_max_retry_attempts: usize,
    pub look_cache_ttl_seconds: u64,
    pub look_cache_max_entries: usize,
    pub reconcile_interval_ms: u64,
    pub reconcile_max_attempts: u32,
    pub recommendations_per_filter: usize,
    pub catalog_path: PathBuf,
    pub event_channel_capacity: usize,
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_i32(name: &str, default: i32) -> i32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<i32>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn normalize_gemini_safety_settings(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "standard".to_string();
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "permissive" | "off" | "none" => "permissive".to_string(),
        "standard" => "standard".to_string(),
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}'; defaulting to standard.",
                value
            );
            "standard".to_string()
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            log_dir: PathBuf::from(env_string("LOG_DIR", "logs")),
            gemini_api_key: env_string("GEMINI_API_KEY", "").trim().to_string(),
            gemini_model: env_string("GEMINI_MODEL", "gemini-2.0-flash"),
            gemini_base_url: env_string(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            )
            .trim_end_matches('/')
            .to_string(),
            gemini_temperature: env_f32("GEMINI_TEMPERATURE", 0.4),
            gemini_top_k: env_i32("GEMINI_TOP_K", 40),
            gemini_top_p: env_f32("GEMINI_TOP_P", 0.95),
            gemini_max_output_tokens: env_i32("GEMINI_MAX_OUTPUT_TOKENS", 1024),
            gemini_safety_settings: normalize_gemini_safety_settings(env_string(
                "GEMINI_SAFETY_SETTINGS",
                "standard",
            )),
            model_timeout_seconds: env_u64("MODEL_TIMEOUT_SECONDS", 8).max(1),
            model_max_retry_attempts: env_usize("MODEL_MAX_RETRY_ATTEMPTS", 2).max(1),
            look_cache_ttl_seconds: env_u64("LOOK_CACHE_TTL_SECONDS", 0),
            look_cache_max_entries: env_usize("LOOK_CACHE_MAX_ENTRIES", 256),
            reconcile_interval_ms: env_u64("RECONCILE_INTERVAL_MS", 2000),
            reconcile_max_attempts: env_u32("RECONCILE_MAX_ATTEMPTS", 10),
            recommendations_per_filter: env_usize("RECOMMENDATIONS_PER_FILTER", 3).max(1),
            catalog_path: PathBuf::from(env_string("CATALOG_PATH", "catalog.json")),
            event_channel_capacity: env_usize("EVENT_CHANNEL_CAPACITY", 64).max(1),
        }
    }

    pub fn model_configured(&self) -> bool {
        !self.gemini_api_key.is_empty()
    }
}

pub const LOOK_SYSTEM_PROMPT: &str = r##"You are a professional makeup artist configuring a virtual try-on engine.

Translate the user's styling request into makeup filter settings.

### RULES
1.  Use only these filter types: "lipstick", "eyeshadow", "eyeliner", "blush", "foundation", "highlighter", "contour".
2.  Use each filter type at most once. Pick 3 to 5 filters that define the look.
3.  "hex" must be a 6-digit hex color in the form "#RRGGBB".
4.  "intensity" is a number between 0.0 (barely visible) and 1.0 (full coverage).
5.  "color" is a short human-readable shade name.
6.  You may add one secondary parameter per filter when it matters, e.g. "finish" for lipstick, "thickness" for eyeliner, "shimmer" for eyeshadow, "coverage" for foundation.
7.  "style" is a short title for the whole look; "description" is one sentence.

### OUTPUT
Return ONLY a JSON object of this shape, with no prose and no markdown fences:
{
  "filters": [
    { "type": "lipstick", "color": "Soft Rose", "hex": "#E8A9A9", "intensity": 0.6, "description": "Satin rose lip", "finish": "satin" }
  ],
  "style": "Bridal",
  "description": "Soft, luminous look with rosy lips.",
  "occasion": "wedding"
}"##;
