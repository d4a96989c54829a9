//! Configuration System
//!
//! Layered configuration for the generation pipeline: built-in defaults, a global
//! user file, workspace files and finally environment variables. Every knob the
//! pipeline reads (models, token budgets, concurrency, site limits) lives here.

use crate::blueprint::SiteLimits;
use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::provider::{ProviderConfig, ProviderType};

mod merge {
    pub mod merge_policy;
}

mod sources {
    pub mod environment;
    pub mod global_file;
    pub mod workspace_file;
}

pub use sources::environment::ENV_OVERRIDES;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Model backend configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Pipeline budgets and limits
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Budgets, concurrency and site-size limits for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Upper clamp for any single model call
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Lower clamp for any single model call
    #[serde(default = "default_min_output_tokens")]
    pub min_output_tokens: u32,

    /// Number of concurrent section workers
    #[serde(default = "default_section_concurrency")]
    pub section_concurrency: usize,

    #[serde(default = "default_architect_max_tokens")]
    pub architect_max_tokens: u32,

    #[serde(default = "default_architect_timeout_ms")]
    pub architect_timeout_ms: u64,

    #[serde(default = "default_architect_temperature")]
    pub architect_temperature: f32,

    #[serde(default = "default_builder_max_tokens")]
    pub builder_max_tokens: u32,

    #[serde(default = "default_builder_temperature")]
    pub builder_temperature: f32,

    /// Attempts per section before the repair pass
    #[serde(default = "default_builder_max_attempts")]
    pub builder_max_attempts: usize,

    /// Base delay for rate-limit and network backoff (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    #[serde(default = "default_max_sections_per_page")]
    pub max_sections_per_page: usize,

    #[serde(default = "default_max_sections_total")]
    pub max_sections_total: usize,
}

fn default_max_output_tokens() -> u32 {
    16_384
}

fn default_min_output_tokens() -> u32 {
    256
}

fn default_section_concurrency() -> usize {
    3
}

fn default_architect_max_tokens() -> u32 {
    4_096
}

fn default_architect_timeout_ms() -> u64 {
    90_000
}

fn default_architect_temperature() -> f32 {
    0.4
}

fn default_builder_max_tokens() -> u32 {
    6_144
}

fn default_builder_temperature() -> f32 {
    0.6
}

fn default_builder_max_attempts() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    750
}

fn default_max_pages() -> usize {
    3
}

fn default_max_sections_per_page() -> usize {
    6
}

fn default_max_sections_total() -> usize {
    10
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_output_tokens: default_max_output_tokens(),
            min_output_tokens: default_min_output_tokens(),
            section_concurrency: default_section_concurrency(),
            architect_max_tokens: default_architect_max_tokens(),
            architect_timeout_ms: default_architect_timeout_ms(),
            architect_temperature: default_architect_temperature(),
            builder_max_tokens: default_builder_max_tokens(),
            builder_temperature: default_builder_temperature(),
            builder_max_attempts: default_builder_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            max_pages: default_max_pages(),
            max_sections_per_page: default_max_sections_per_page(),
            max_sections_total: default_max_sections_total(),
        }
    }
}

impl GenerationSettings {
    pub fn limits(&self) -> SiteLimits {
        SiteLimits::new(
            self.max_pages,
            self.max_sections_per_page,
            self.max_sections_total,
        )
    }

    /// Validate generation settings
    pub fn validate(&self) -> Result<(), String> {
        if self.section_concurrency == 0 {
            return Err("section_concurrency must be at least 1".to_string());
        }
        if self.builder_max_attempts == 0 {
            return Err("builder_max_attempts must be at least 1".to_string());
        }
        if self.min_output_tokens > self.max_output_tokens {
            return Err(format!(
                "min_output_tokens ({}) exceeds max_output_tokens ({})",
                self.min_output_tokens, self.max_output_tokens
            ));
        }
        if self.architect_timeout_ms == 0 {
            return Err("architect_timeout_ms must be positive".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String),
    Generation(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SiteConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if self.logging.format != "json" && self.logging.format != "text" {
            errors.push(ValidationError::Logging(format!(
                "Invalid log format: {}",
                self.logging.format
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold the error list into one `ConfigError`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ConfigError::Invalid(msgs.join("\n"))
        })?;
        Ok(self)
    }
}

/// Loads `SiteConfig` from all sources in precedence order.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace: defaults, global file, workspace
    /// files, then environment overrides.
    pub fn load(workspace_root: &Path) -> Result<SiteConfig, ConfigError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder)?;
        let config: SiteConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load configuration from one explicit file, still honouring env overrides.
    pub fn load_from_file(path: &Path) -> Result<SiteConfig, ConfigError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::Load(format!("Non UTF-8 config path: {:?}", path)))?;
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::with_name(path_str).required(true));
        let builder = sources::environment::add_to_builder(builder)?;
        let config: SiteConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }

    /// Defaults only, without touching the filesystem or environment.
    pub fn defaults() -> Result<SiteConfig, ConfigError> {
        let config: SiteConfig = merge::merge_policy::builder_with_defaults()?
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

/// Default directory for planning checkpoints when none is given.
pub fn default_planning_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "sitesmith", "sitesmith")
        .map(|dirs| dirs.data_dir().join("planning"))
        .unwrap_or_else(|| PathBuf::from(".sitesmith/planning"))
}
