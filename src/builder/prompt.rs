//! Builder prompts and the section output schema.

use crate::blueprint::presets::{default_preset, preset_by_id};
use crate::cache::ContentCache;
use crate::guardian::contract::theme_class_map_text;
use crate::guardian::{build_constraints, build_creative_guidance, SiteTheme};
use crate::provider::ToolSpec;
use crate::types::{ComponentManifest, FailureType, SectionContext};
use serde_json::json;

pub const BUILDER_SYSTEM: &str = "You are a senior front-end engineer. You write one self-contained React \
component per request using Tailwind utility classes and theme tokens, and you reply with JSON only.";

pub const SECTION_TOOL_NAME: &str = "emit_section";

/// Structured-output schema for one section.
pub fn section_tool() -> ToolSpec {
    ToolSpec {
        name: SECTION_TOOL_NAME.to_string(),
        description: "Return the generated component and the block that renders it".to_string(),
        parameters: json!({
            "type": "object",
            "required": ["component", "block"],
            "properties": {
                "component": {
                    "type": "object",
                    "required": ["name", "code"],
                    "properties": {
                        "name": { "type": "string" },
                        "code": { "type": "string" },
                        "defaultProps": { "type": "object" }
                    }
                },
                "block": {
                    "type": "object",
                    "required": ["type"],
                    "properties": {
                        "type": { "type": "string" },
                        "props": { "type": "object" }
                    }
                }
            }
        }),
    }
}

/// Everything a section prompt is built from.
pub struct SectionPromptInput<'a> {
    pub prompt: &'a str,
    pub section: &'a SectionContext,
    pub theme: &'a SiteTheme,
    pub manifest: &'a ComponentManifest,
    pub breakout_eligible: bool,
}

pub fn section_prompt(input: &SectionPromptInput<'_>, cache: &ContentCache) -> String {
    let section = &input.section.section;
    let contract = &input.theme.contract;
    let hint = &section.layout_hint;

    let preset = preset_by_id(&hint.composition_preset).unwrap_or_else(default_preset);
    let preset_rules = cache.get_or_insert_with(&format!("preset:{}", preset.id), || preset.rules_text());
    let class_map = cache.get_or_insert_with("theme-class-map", theme_class_map_text);
    let motion_key = format!(
        "motion:{}:{}:{}",
        contract.motion_rules.level,
        contract.motion_rules.duration_ms,
        contract.motion_rules.presets.join(",")
    );
    let motion = cache.get_or_insert_with(&motion_key, || {
        format!(
            "Motion level {}: use framer-motion presets {} with duration {}ms and easing {}.",
            contract.motion_rules.level,
            contract.motion_rules.presets.join(", "),
            contract.motion_rules.duration_ms,
            contract.motion_rules.easing
        )
    });

    let constraints = build_constraints(section, contract);
    let guidance = build_creative_guidance(section);
    let breakout = if input.breakout_eligible {
        format!(
            "This section may break out: boost color by {:.0}% and motion by {:.0}% using gradients, blur or shadow-2xl.",
            contract.breakout_budget.color_boost * 100.0,
            contract.breakout_budget.motion_boost * 100.0
        )
    } else {
        "Stay within the standard tokens; no breakout emphasis.".to_string()
    };
    let block_types = input.manifest.block_types();
    let catalog = if block_types.is_empty() {
        "any descriptive PascalCase type".to_string()
    } else {
        block_types.join(", ")
    };
    let props_hints = section
        .props_hints
        .as_ref()
        .map(|hints| format!("\nContent hints: {}", hints))
        .unwrap_or_default();

    format!(
        "Site brief: {prompt}\n\
         Page: {page} ({path})\n\
         Section {id} of type {section_type}: {intent}{props_hints}\n\n\
         {preset_rules}\n\
         Layout hint: structure={structure}, density={density}, align={align}{locked}, media={media}\n\
         {constraints}\n\n\
         Theme ({mode}, radius {radius}, fonts {heading}/{body}, voice {voice}). Use these classes instead of literal colors:\n\
         {class_map}\n\
         {motion}\n\
         {guidance}\n\
         {breakout}\n\n\
         Allowed block types: {catalog}\n\
         Imports allowed: react, framer-motion, lucide-react, react-fast-marquee, clsx.\n\
         Reply with one JSON object: {{\"component\": {{\"name\", \"code\", \"defaultProps\"}}, \"block\": {{\"type\", \"props\"}}}}. \
         The component must `export default` a function, wrap content in a <section> with padding, \
         a max-w container, a heading and body text.",
        prompt = input.prompt.trim(),
        page = input.section.page_name,
        path = input.section.page_path,
        id = section.id,
        section_type = section.section_type,
        intent = section.intent,
        structure = hint.structure.as_str(),
        density = hint.density.as_str(),
        align = hint.align.as_str(),
        locked = if hint.align_locked { " (locked)" } else { "" },
        media = hint.media.as_str(),
        constraints = constraints.prompt_text(),
        mode = input.theme.mode,
        radius = input.theme.radius,
        heading = input.theme.font_heading,
        body = input.theme.font_body,
        voice = contract.voice,
        guidance = guidance.prompt_text(),
    )
}

/// Follow-up after an empty or degenerate response.
pub fn strict_retry_prompt(base: &str) -> String {
    format!(
        "{}\n\nYour previous reply was empty or not JSON. Reply with exactly one JSON object and nothing else: \
         no prose, no markdown fences.",
        base
    )
}

/// Final remediation attempt after repeated parse or layout failures.
pub fn repair_prompt(base: &str, failure: FailureType, error: &str) -> String {
    let remediation = match failure {
        FailureType::Parse => {
            "Return strictly valid JSON: double-quoted keys and strings, no comments, no trailing commas, \
             and escape every quote and newline inside `code`."
        }
        FailureType::Layout => {
            "Fix every listed layout issue: include a grid or flex container with the responsive column \
             breakpoints, every required preset class, the alignment classes, and the section shell \
             (padding, max-w container, heading, body text)."
        }
        _ => "Fix the problem described above.",
    };
    format!(
        "{}\n\nThe previous attempts failed ({}): {}\n{}",
        base, failure, error, remediation
    )
}
