//! Environment source: well-known variables mapped onto config keys.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;

/// Environment variable to config key. When several variables map to the same
/// key, the earlier entry wins.
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("OPENROUTER_API_KEY", "provider.api_key"),
    ("OPENROUTER_BASE_URL", "provider.endpoint"),
    ("SITESMITH_MODEL", "provider.model"),
    ("OPENROUTER_MODEL", "provider.model"),
    ("SITESMITH_FALLBACK_MODEL", "provider.fallback_model"),
    ("OPENROUTER_MODEL_FALLBACK", "provider.fallback_model"),
    ("SITESMITH_MAX_OUTPUT_TOKENS", "generation.max_output_tokens"),
    ("SITESMITH_SECTION_CONCURRENCY", "generation.section_concurrency"),
    ("SITESMITH_ARCHITECT_MAX_TOKENS", "generation.architect_max_tokens"),
    ("SITESMITH_ARCHITECT_TIMEOUT_MS", "generation.architect_timeout_ms"),
    ("SITESMITH_BUILDER_MAX_TOKENS", "generation.builder_max_tokens"),
    ("SITESMITH_MAX_PAGES", "generation.max_pages"),
    ("SITESMITH_MAX_SECTIONS_PER_PAGE", "generation.max_sections_per_page"),
    ("SITESMITH_MAX_SECTIONS_TOTAL", "generation.max_sections_total"),
];

const NUMERIC_PREFIX: &str = "generation.";

/// Apply environment overrides on top of every file source.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut applied: Vec<&str> = Vec::new();
    for (var, key) in ENV_OVERRIDES {
        if applied.contains(key) {
            continue;
        }
        let Ok(raw) = std::env::var(var) else {
            continue;
        };
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        builder = if key.starts_with(NUMERIC_PREFIX) {
            let parsed: i64 = value.parse().map_err(|_| {
                ConfigError::Message(format!("{} must be an integer, got {:?}", var, value))
            })?;
            builder.set_override(*key, parsed)?
        } else {
            builder.set_override(*key, value.to_string())?
        };
        applied.push(key);
    }
    Ok(builder)
}
