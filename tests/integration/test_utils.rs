//! Shared test utilities for integration tests
//!
//! A scripted model backend that answers planning and section calls by tool
//! name, plus environment isolation for configuration tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use sitesmith::blueprint::presets::preset_by_id;
use sitesmith::blueprint::humanize;
use sitesmith::error::ProviderError;
use sitesmith::gateway::ModelGateway;
use sitesmith::provider::{
    ChatMessage, CompletionOptions, CompletionResponse, ModelProviderClient, TokenUsage,
};
use sitesmith::config::GenerationSettings;
use sitesmith::SiteGenerator;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with the given variables set, restoring the previous values after.
pub fn with_env<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(k, _)| (k.to_string(), std::env::var(k).ok()))
        .collect();
    for (k, v) in vars {
        std::env::set_var(k, v);
    }

    let result = f();

    for (k, v) in saved {
        match v {
            Some(v) => std::env::set_var(&k, v),
            None => std::env::remove_var(&k),
        }
    }
    result
}

/// Blueprint JSON with one page per entry of `pages`, each a list of
/// `(id, type)` pairs.
pub fn blueprint_json(pages: &[(&str, &[(&str, &str)])]) -> Value {
    let pages: Vec<Value> = pages
        .iter()
        .map(|(path, sections)| {
            let sections: Vec<Value> = sections
                .iter()
                .map(|(id, section_type)| {
                    json!({ "id": id, "type": section_type, "intent": format!("The {} section", id) })
                })
                .collect();
            json!({ "path": path, "name": humanize(path.trim_start_matches('/')), "sections": sections })
        })
        .collect();
    json!({
        "designNorthStar": "Calm and confident",
        "theme": {
            "mode": "light",
            "radius": "lg",
            "fontHeading": "Inter",
            "fontBody": "Inter",
            "motion": "subtle",
            "contract": {
                "voice": "warm",
                "tokens": { "primary": "#2563eb", "accent": "#f59e0b" }
            }
        },
        "pages": pages
    })
}

/// A component that passes the validation battery for whichever preset the
/// section prompt names.
pub fn passing_component(name: &str, preset_id: &str) -> String {
    let required = preset_by_id(preset_id)
        .map(|p| {
            p.required_classes
                .iter()
                .map(|c| if c.ends_with('-') { format!("{}2xl", c) } else { c.to_string() })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    format!(
        r#"import {{ motion }} from "framer-motion";

export default function {name}() {{
  return (
    <section className="py-20 bg-background">
      <div className="max-w-6xl mx-auto grid flex items-start items-center items-end md:grid-cols-2 md:flex-row {required}">
        <motion.div className="shadow-2xl rounded-lg">
          <h2 className="text-3xl font-bold text-foreground">{name}</h2>
          <p className="text-lg text-muted-foreground">Made with care.</p>
        </motion.div>
      </div>
    </section>
  );
}}"#
    )
}

/// Backend answering by tool name. Planning calls get `blueprint`; section
/// calls get a passing component unless the section id is listed in
/// `broken_sections`.
pub struct ScriptedProvider {
    blueprint: Value,
    broken_sections: HashSet<String>,
    component_names: HashMap<String, String>,
    delay: Duration,
    calls: AtomicUsize,
    section_calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(blueprint: Value) -> Self {
        Self {
            blueprint,
            broken_sections: HashSet::new(),
            component_names: HashMap::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            section_calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Sections whose every response fails layout validation.
    pub fn with_broken_sections(mut self, ids: &[&str]) -> Self {
        self.broken_sections = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Force the emitted component name for a section.
    pub fn with_component_name(mut self, section_id: &str, name: &str) -> Self {
        self.component_names
            .insert(section_id.to_string(), name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Section ids in call order, one entry per section call.
    pub fn section_calls(&self) -> Vec<String> {
        self.section_calls.lock().unwrap().clone()
    }

    pub fn section_calls_for(&self, id: &str) -> usize {
        self.section_calls().iter().filter(|s| *s == id).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn section_response(&self, prompt: &str) -> String {
        let id_re = Regex::new(r"Section (\S+) of type").unwrap();
        let preset_re = Regex::new(r"Composition preset (\w+)").unwrap();
        let id = id_re
            .captures(prompt)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let preset = preset_re
            .captures(prompt)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        self.section_calls.lock().unwrap().push(id.clone());

        let name = self.component_names.get(&id).cloned().unwrap_or_else(|| {
            format!("{}Section", humanize(&id).replace(' ', ""))
        });
        let code = if self.broken_sections.contains(&id) {
            format!("export default function {}() {{ return <div>{}</div>; }}", name, id)
        } else {
            // Distinct source per section so shared names are real conflicts
            format!("{}\n// {}", passing_component(&name, &preset), id)
        };
        json!({
            "component": { "name": name, "code": code },
            "block": { "type": name, "props": { "title": humanize(&id) } }
        })
        .to_string()
    }
}

#[async_trait]
impl ModelProviderClient for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let content = match options.tool.as_ref().map(|t| t.name.as_str()) {
            Some("plan_site") => self.blueprint.to_string(),
            Some("emit_section") => {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                self.section_response(&prompt)
            }
            other => {
                return Err(ProviderError::Provider(format!(
                    "unexpected tool {:?}",
                    other
                )))
            }
        };

        Ok(CompletionResponse {
            content,
            tool_payload: None,
            model: "scripted".to_string(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Settings without backoff so failing paths run fast.
pub fn fast_settings() -> GenerationSettings {
    GenerationSettings {
        retry_delay_ms: 0,
        ..GenerationSettings::default()
    }
}

pub fn generator(provider: Arc<ScriptedProvider>, settings: GenerationSettings) -> SiteGenerator {
    let gateway = ModelGateway::new(provider, None, 256, 16_384);
    SiteGenerator::new(Arc::new(gateway), settings)
}
