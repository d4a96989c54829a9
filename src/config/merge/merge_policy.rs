//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources (global file, workspace files, environment) override these.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("provider.provider_type", "openrouter")?
        .set_default("provider.model", crate::provider::DEFAULT_MODEL)?
        .set_default("provider.request_timeout_secs", 120_i64)?
        .set_default("generation.max_output_tokens", 16_384_i64)?
        .set_default("generation.min_output_tokens", 256_i64)?
        .set_default("generation.section_concurrency", 3_i64)?
        .set_default("generation.architect_max_tokens", 4_096_i64)?
        .set_default("generation.architect_timeout_ms", 90_000_i64)?
        .set_default("generation.builder_max_tokens", 6_144_i64)?
        .set_default("generation.builder_max_attempts", 3_i64)?
        .set_default("generation.retry_delay_ms", 750_i64)?
        .set_default("generation.max_pages", 3_i64)?
        .set_default("generation.max_sections_per_page", 6_i64)?
        .set_default("generation.max_sections_total", 10_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")
}
