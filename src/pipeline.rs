//! Site generation pipeline
//!
//! Orchestrates architect -> normalizer -> worker pool -> assembly -> postcheck,
//! consulting the checkpoint store before each stage. The run never aborts: every
//! degradation ends up as a tag in `GenerationOutput::errors`.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::architect::{run_architect, ArchitectSettings};
use crate::assembly::assemble;
use crate::blueprint::normalize_pages;
use crate::builder::{BuildJob, BuildSettings, SectionBuilder};
use crate::cache::ContentCache;
use crate::checkpoint::{
    ArchitectCheckpoint, CheckpointStore, CheckpointWriter, PlanningOptions, SledCheckpointStore,
};
use crate::config::{GenerationSettings, SiteConfig};
use crate::error::ProviderError;
use crate::gateway::ModelGateway;
use crate::guardian::{post_generate_check, PostcheckReport, SiteTheme};
use crate::provider::{ChatCompletionsClient, ModelProviderClient};
use crate::template::{NoTemplates, SectionTemplateResolver};
use crate::types::{
    flatten_sections, Blueprint, Component, ComponentManifest, SectionOutput, SectionStatus,
    SitePage,
};

/// Everything one run produces. Always structurally complete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    pub blueprint: Blueprint,
    pub theme: SiteTheme,
    pub pages: Vec<SitePage>,
    pub components: Vec<Component>,
    pub errors: Vec<String>,
    pub report: PostcheckReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Sections taken from the checkpoint instead of rebuilt
    pub resumed_sections: usize,
}

/// Checkpoint handles for one run.
struct RunCheckpoint {
    request_id: String,
    store: Arc<dyn CheckpointStore>,
    writer: CheckpointWriter,
}

impl RunCheckpoint {
    fn open(options: &PlanningOptions, prompt: &str) -> Result<Self, crate::error::StorageError> {
        let request_id = options.resolve_request_id(prompt);
        let store: Arc<dyn CheckpointStore> =
            Arc::new(SledCheckpointStore::open(&options.dir, &request_id)?);
        let writer = CheckpointWriter::spawn(Arc::clone(&store), options.batch_size);
        Ok(Self {
            request_id,
            store,
            writer,
        })
    }
}

pub struct SiteGenerator {
    gateway: Arc<ModelGateway>,
    settings: GenerationSettings,
    cache: Arc<ContentCache>,
    templates: Arc<dyn SectionTemplateResolver>,
}

impl SiteGenerator {
    pub fn new(gateway: Arc<ModelGateway>, settings: GenerationSettings) -> Self {
        Self {
            gateway,
            settings,
            cache: Arc::new(ContentCache::new()),
            templates: Arc::new(NoTemplates),
        }
    }

    /// Build the gateway (primary plus optional fallback model) from configuration.
    pub fn from_config(config: &SiteConfig) -> Result<Self, ProviderError> {
        let provider = &config.provider;
        let primary: Arc<dyn ModelProviderClient> =
            Arc::new(ChatCompletionsClient::new(provider, &provider.model)?);
        let fallback = match provider
            .fallback_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty() && *m != provider.model)
        {
            Some(model) => {
                Some(Arc::new(ChatCompletionsClient::new(provider, model)?) as Arc<dyn ModelProviderClient>)
            }
            None => None,
        };
        let gateway = ModelGateway::new(
            primary,
            fallback,
            config.generation.min_output_tokens,
            config.generation.max_output_tokens,
        );
        Ok(Self::new(Arc::new(gateway), config.generation.clone()))
    }

    pub fn with_templates(mut self, templates: Arc<dyn SectionTemplateResolver>) -> Self {
        self.templates = templates;
        self
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Generate a site for `prompt`. Resumes from `planning` when a prior run
    /// with the same request id checkpointed there.
    pub async fn generate(
        &self,
        prompt: &str,
        manifest: &ComponentManifest,
        planning: Option<PlanningOptions>,
    ) -> GenerationOutput {
        let mut errors = Vec::new();
        let checkpoint = match planning.as_ref().map(|p| RunCheckpoint::open(p, prompt)) {
            Some(Ok(checkpoint)) => {
                info!(request_id = %checkpoint.request_id, "Checkpointing enabled");
                Some(checkpoint)
            }
            Some(Err(err)) => {
                warn!(error = %err, "Checkpoint store unavailable, running without it");
                errors.push(format!("checkpoint_unavailable:{}", err));
                None
            }
            None => None,
        };
        let sender = checkpoint.as_ref().map(|c| c.writer.sender());

        let (blueprint, pages) = match checkpoint.as_ref().and_then(|c| resume_blueprint(c.store.as_ref())) {
            Some(ArchitectCheckpoint { blueprint, pages }) => {
                info!(pages = pages.len(), "Resuming from checkpointed blueprint");
                (blueprint, pages)
            }
            None => {
                let architect = ArchitectSettings::from(&self.settings);
                let outcome = run_architect(&self.gateway, prompt, &architect, &self.cache).await;
                let pages = normalize_pages(&outcome.blueprint, &self.settings.limits());
                if let Some(sender) = &sender {
                    if let Err(err) = sender.mark_architect_complete(&outcome.blueprint, &pages) {
                        warn!(error = %err, "Failed to queue architect checkpoint");
                    }
                }
                (outcome.blueprint, pages)
            }
        };
        let theme = SiteTheme::from_value(&blueprint.theme);

        let (completed, mut outputs) = match &checkpoint {
            Some(c) => completed_outputs(c.store.as_ref()),
            None => (HashSet::new(), Vec::new()),
        };
        let resumed_sections = outputs.len();
        let pending: Vec<_> = flatten_sections(&pages)
            .into_iter()
            .filter(|ctx| !completed.contains(&ctx.key()))
            .collect();
        info!(
            pending = pending.len(),
            resumed = resumed_sections,
            "Building sections"
        );

        let builder = SectionBuilder::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.cache),
            Arc::clone(&self.templates),
            BuildSettings::from(&self.settings),
        );
        let job = Arc::new(BuildJob {
            prompt: prompt.to_string(),
            theme: theme.clone(),
            manifest: manifest.clone(),
        });
        outputs.extend(builder.build_all(job, pending, sender.clone()).await);

        let assembly = assemble(&pages, &outputs);
        errors.extend(assembly.errors.iter().cloned());
        let report = post_generate_check(&assembly.pages, &assembly.rendered_sections());
        debug!(
            issues = report.issues.len(),
            score = report.score.total,
            "Postcheck complete"
        );

        let mut request_id = None;
        if let Some(checkpoint) = checkpoint {
            if let Some(sender) = sender {
                if let Err(err) = sender.mark_postcheck_complete() {
                    warn!(error = %err, "Failed to queue postcheck checkpoint");
                }
            }
            match checkpoint.writer.finish().await {
                Ok(stats) => debug!(
                    written = stats.written,
                    failed = stats.failed,
                    flushes = stats.flushes,
                    "Checkpoint writer drained"
                ),
                Err(err) => {
                    warn!(error = %err, "Checkpoint writer failed");
                    errors.push(format!("checkpoint_write_failed:{}", err));
                }
            }
            request_id = Some(checkpoint.request_id);
        }

        info!(
            pages = assembly.pages.len(),
            components = assembly.components.len(),
            errors = errors.len(),
            "Generation complete"
        );
        GenerationOutput {
            blueprint,
            theme,
            pages: assembly.pages,
            components: assembly.components,
            errors,
            report,
            request_id,
            resumed_sections,
        }
    }
}

fn resume_blueprint(store: &dyn CheckpointStore) -> Option<ArchitectCheckpoint> {
    match store.get_blueprint() {
        Ok(found) => found.filter(|c| !c.pages.is_empty()),
        Err(err) => {
            warn!(error = %err, "Could not read checkpointed blueprint");
            None
        }
    }
}

/// Completed keys and their `ok` outputs. Read failures mean "nothing done yet".
fn completed_outputs(store: &dyn CheckpointStore) -> (HashSet<String>, Vec<SectionOutput>) {
    let completed = match store.get_completed_section_keys() {
        Ok(keys) => keys,
        Err(err) => {
            warn!(error = %err, "Could not read completed sections");
            return (HashSet::new(), Vec::new());
        }
    };
    let outputs: Vec<SectionOutput> = match store.get_section_outputs() {
        Ok(outputs) => outputs
            .into_iter()
            .filter(|o| completed.contains(&o.key) && o.result.status() == SectionStatus::Ok)
            .collect(),
        Err(err) => {
            warn!(error = %err, "Could not read section outputs");
            return (HashSet::new(), Vec::new());
        }
    };
    // Keys without a stored output are rebuilt.
    let completed = outputs.iter().map(|o| o.key.clone()).collect();
    (completed, outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;

    fn settings() -> GenerationSettings {
        GenerationSettings {
            retry_delay_ms: 0,
            ..GenerationSettings::default()
        }
    }

    #[tokio::test]
    async fn total_model_failure_still_yields_a_site() {
        let provider = Arc::new(MockProvider::new(
            "m",
            vec![Err(ProviderError::Provider("down".to_string()))],
        ));
        let gateway = Arc::new(ModelGateway::new(provider, None, 256, 16_384));
        let generator = SiteGenerator::new(gateway, settings());
        let output = generator
            .generate("A bakery", &ComponentManifest::default(), None)
            .await;

        assert_eq!(output.pages.len(), 1);
        assert_eq!(output.pages[0].content.len(), 6);
        assert_eq!(output.pages[0].content[0].block_type, "Navbar");
        assert!(output.components.is_empty());
        assert_eq!(output.errors.len(), 5);
        assert!(output
            .errors
            .iter()
            .all(|e| e.starts_with("builder_section_fallback:unknown:/:")));
        assert_eq!(output.request_id, None);
    }
}
