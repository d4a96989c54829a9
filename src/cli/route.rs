//! CLI route: single route table and run context.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::blueprint::normalize_pages;
use crate::builder::build_deterministic_fallback_block;
use crate::checkpoint::PlanningOptions;
use crate::cli::parse::Commands;
use crate::cli::presentation::{format_config, format_generation_summary, format_preset_table};
use crate::config::{default_planning_dir, ConfigLoader, SiteConfig};
use crate::pipeline::SiteGenerator;
use crate::types::{Blueprint, ComponentManifest};

/// Runtime context for CLI execution: workspace and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: SiteConfig,
}

impl RunContext {
    /// Load configuration for the workspace, or from `config_path` when given.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let config = config.validated()?;
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Run one command and return what should be printed.
    pub async fn execute(&self, command: &Commands) -> Result<String> {
        match command {
            Commands::Generate {
                prompt,
                prompt_file,
                manifest,
                planning_dir,
                no_checkpoint,
                request_id,
                batch_size,
                out,
            } => {
                let prompt = self.read_prompt(prompt.as_deref(), prompt_file.as_deref())?;
                let manifest = match manifest {
                    Some(path) => self.read_json::<ComponentManifest>(path)?,
                    None => ComponentManifest::default(),
                };
                let planning = (!no_checkpoint).then(|| {
                    let dir = planning_dir
                        .as_ref()
                        .map(|d| self.resolve(d))
                        .unwrap_or_else(default_planning_dir);
                    let options = PlanningOptions::new(dir).with_batch_size(*batch_size);
                    match request_id {
                        Some(id) => options.with_request_id(id.clone()),
                        None => options,
                    }
                });

                let generator = SiteGenerator::from_config(&self.config)
                    .context("Failed to configure the model provider")?;
                let output = generator.generate(&prompt, &manifest, planning).await;
                let json = serde_json::to_string_pretty(&output)?;
                match out {
                    Some(path) => {
                        let path = self.resolve(path);
                        std::fs::write(&path, json)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        info!(path = %path.display(), "Wrote generated site");
                        Ok(format_generation_summary(&output))
                    }
                    None => Ok(json),
                }
            }
            Commands::Config { format } => format_config(&self.config, format),
            Commands::Presets { format } => Ok(format_preset_table(format)?),
            Commands::Normalize { blueprint } => {
                let raw: serde_json::Value = self.read_json(blueprint)?;
                let Some(blueprint) = Blueprint::from_value(&raw) else {
                    bail!("{} is not a blueprint object", blueprint.display());
                };
                let pages = normalize_pages(&blueprint, &self.config.generation.limits());
                Ok(serde_json::to_string_pretty(&pages)?)
            }
            Commands::FallbackBlock { section_type, id } => {
                let block = build_deterministic_fallback_block(section_type, id);
                Ok(serde_json::to_string_pretty(&block)?)
            }
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    fn read_prompt(&self, prompt: Option<&str>, prompt_file: Option<&Path>) -> Result<String> {
        let text = match (prompt, prompt_file) {
            (Some(text), _) => text.to_string(),
            (None, Some(path)) => {
                let path = self.resolve(path);
                std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read prompt file {}", path.display()))?
            }
            (None, None) => bail!("Provide --prompt or --prompt-file"),
        };
        if text.trim().is_empty() {
            bail!("Prompt is empty");
        }
        Ok(text)
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let path = self.resolve(path);
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
    }
}
