//! Architect stage
//!
//! One structured planning call, raced against a timeout. Anything short of a
//! usable blueprint degrades to a deterministic one; the stage never fails.

use std::time::Duration;

use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::blueprint::fallback::detect_reference_profile;
use crate::blueprint::presets::{preset_ids, PRESETS};
use crate::blueprint::{generic_blueprint, reference_profile_blueprint, SiteLimits};
use crate::builder::parse_lenient;
use crate::cache::ContentCache;
use crate::config::GenerationSettings;
use crate::gateway::{GatewayCall, ModelGateway};
use crate::guardian::{pre_generate_validation, ContractReport};
use crate::provider::ToolSpec;
use crate::types::Blueprint;

pub const ARCHITECT_SYSTEM: &str = "You are a product designer and information architect. You plan small \
marketing sites as a theme plus pages of sections, choosing one composition preset per section.";

pub const PLANNING_TOOL_NAME: &str = "plan_site";

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(?:[0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b").expect("valid regex"));
static MODE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(dark|light)\b").expect("valid regex"));
static VOICE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(minimal|playful|luxury|corporate)\b").expect("valid regex")
});
static CENTERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcent(?:ered|red)\b").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct ArchitectSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    pub limits: SiteLimits,
}

impl From<&GenerationSettings> for ArchitectSettings {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            max_tokens: settings.architect_max_tokens,
            temperature: settings.architect_temperature,
            timeout: Duration::from_millis(settings.architect_timeout_ms),
            limits: settings.limits(),
        }
    }
}

/// Where the final blueprint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlueprintSource {
    Model,
    GenericFallback,
    ReferenceProfile(&'static str),
}

#[derive(Debug, Clone)]
pub struct ArchitectOutcome {
    pub blueprint: Blueprint,
    pub source: BlueprintSource,
    pub contract_report: ContractReport,
}

/// Planning schema with the composition preset constrained to the registry.
pub fn planning_tool(limits: &SiteLimits) -> ToolSpec {
    let section = json!({
        "type": "object",
        "required": ["id", "type", "intent"],
        "properties": {
            "id": { "type": "string" },
            "type": { "type": "string" },
            "intent": { "type": "string" },
            "propsHints": { "type": "object" },
            "layoutHint": {
                "type": "object",
                "properties": {
                    "structure": { "type": "string" },
                    "density": { "type": "string" },
                    "align": { "type": "string" },
                    "media": { "type": "string" },
                    "list": { "type": "string" },
                    "compositionPreset": { "type": "string", "enum": preset_ids() }
                }
            }
        }
    });
    ToolSpec {
        name: PLANNING_TOOL_NAME.to_string(),
        description: "Return the site blueprint: theme and pages of sections".to_string(),
        parameters: json!({
            "type": "object",
            "required": ["theme", "pages"],
            "properties": {
                "designNorthStar": { "type": "string" },
                "theme": {
                    "type": "object",
                    "required": ["mode", "radius", "fontHeading", "fontBody", "motion"],
                    "properties": {
                        "mode": { "type": "string", "enum": ["light", "dark"] },
                        "radius": { "type": "string" },
                        "fontHeading": { "type": "string" },
                        "fontBody": { "type": "string" },
                        "motion": { "type": "string" },
                        "contract": { "type": "object" }
                    }
                },
                "pages": {
                    "type": "array",
                    "maxItems": limits.max_pages,
                    "items": {
                        "type": "object",
                        "required": ["path", "name", "sections"],
                        "properties": {
                            "path": { "type": "string" },
                            "name": { "type": "string" },
                            "sections": {
                                "type": "array",
                                "maxItems": limits.max_sections_per_page,
                                "items": section
                            }
                        }
                    }
                }
            }
        }),
    }
}

pub fn planning_prompt(prompt: &str, limits: &SiteLimits, cache: &ContentCache) -> String {
    let catalog = cache.get_or_insert_with("preset-catalog", || {
        PRESETS
            .iter()
            .map(|p| format!("- {}: {}", p.id, p.name))
            .collect::<Vec<_>>()
            .join("\n")
    });
    format!(
        "Plan a site for this brief:\n{}\n\n\
         Use at most {} pages, {} sections per page and {} sections in total. \
         The first page starts with a hero. Give every section a short slug id, a type and a one-sentence intent.\n\
         Pick layoutHint.compositionPreset from:\n{}\n\n\
         Put the design contract (voice, tokens, layoutRules, motionRules, breakoutBudget) under theme.contract.",
        prompt.trim(),
        limits.max_pages,
        limits.max_sections_per_page,
        limits.max_sections_total,
        catalog
    )
}

/// Plan the site. Always returns a blueprint.
pub async fn run_architect(
    gateway: &ModelGateway,
    prompt: &str,
    settings: &ArchitectSettings,
    cache: &ContentCache,
) -> ArchitectOutcome {
    let planned = plan(gateway, prompt, settings, cache).await;
    let (mut blueprint, mut source) = match planned {
        Some(blueprint) => (blueprint, BlueprintSource::Model),
        None => (generic_blueprint(prompt), BlueprintSource::GenericFallback),
    };

    if let Some(profile) = detect_reference_profile(prompt) {
        info!(profile = profile.name, "Prompt matches a reference profile");
        let existing = (source == BlueprintSource::Model).then_some(&blueprint);
        blueprint = reference_profile_blueprint(profile, existing);
        source = BlueprintSource::ReferenceProfile(profile.name);
    }

    apply_theme_intent(&mut blueprint, prompt);

    let contract = blueprint
        .theme
        .get("contract")
        .cloned()
        .unwrap_or(Value::Null);
    let contract_report = pre_generate_validation(&contract);

    info!(
        source = ?source,
        pages = blueprint.pages.len(),
        sections = blueprint.section_count(),
        "Architect stage complete"
    );
    ArchitectOutcome {
        blueprint,
        source,
        contract_report,
    }
}

/// The timed model call. Dropping the timed-out future cancels the request.
async fn plan(
    gateway: &ModelGateway,
    prompt: &str,
    settings: &ArchitectSettings,
    cache: &ContentCache,
) -> Option<Blueprint> {
    let tool = planning_tool(&settings.limits);
    let user_prompt = planning_prompt(prompt, &settings.limits, cache);
    let call = gateway.call(GatewayCall {
        system: ARCHITECT_SYSTEM,
        prompt: &user_prompt,
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        tool: Some(&tool),
    });

    let text = match tokio::time::timeout(settings.timeout, call).await {
        Ok(Ok(text)) => text,
        Ok(Err(err)) => {
            warn!(error = %err, "Architect call failed, using fallback blueprint");
            return None;
        }
        Err(_) => {
            warn!(
                timeout_ms = settings.timeout.as_millis() as u64,
                "Architect call timed out, using fallback blueprint"
            );
            return None;
        }
    };

    let Some(value) = parse_lenient(&text) else {
        warn!("Architect output is not JSON, using fallback blueprint");
        return None;
    };
    let value = match value.get("blueprint") {
        Some(inner @ Value::Object(_)) => inner.clone(),
        _ => value,
    };
    match Blueprint::from_value(&value) {
        Some(blueprint) if blueprint.section_count() > 0 => {
            debug!(sections = blueprint.section_count(), "Parsed architect blueprint");
            Some(blueprint)
        }
        _ => {
            warn!("Architect output has no usable pages, using fallback blueprint");
            None
        }
    }
}

/// Borrow `parent[key]` as an object, replacing anything else with `{}`.
fn object_entry<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just made an object"),
    }
}

/// Fold explicit wishes from the prompt into the blueprint theme.
pub fn apply_theme_intent(blueprint: &mut Blueprint, prompt: &str) {
    if !blueprint.theme.is_object() {
        blueprint.theme = Value::Object(Map::new());
    }
    let Value::Object(theme) = &mut blueprint.theme else {
        return;
    };

    if let Some(mode) = MODE_WORD.captures(prompt).and_then(|c| c.get(1)) {
        theme.insert("mode".into(), json!(mode.as_str().to_lowercase()));
    }

    let contract = object_entry(theme, "contract");
    let colors: Vec<&str> = HEX_COLOR.find_iter(prompt).map(|m| m.as_str()).take(2).collect();
    if !colors.is_empty() {
        let tokens = object_entry(contract, "tokens");
        for (token, color) in ["primary", "accent"].iter().zip(&colors) {
            tokens.insert((*token).to_string(), json!(color.to_lowercase()));
        }
    }

    let has_voice = contract
        .get("voice")
        .and_then(Value::as_str)
        .is_some_and(|v| !v.trim().is_empty());
    if !has_voice {
        if let Some(voice) = VOICE_WORD.captures(prompt).and_then(|c| c.get(1)) {
            contract.insert("voice".into(), json!(voice.as_str().to_lowercase()));
        }
    }

    if CENTERED.is_match(prompt) {
        let overrides = object_entry(object_entry(contract, "layoutRules"), "sectionAlignOverrides");
        overrides.insert("hero".into(), json!("center"));
    }
}
