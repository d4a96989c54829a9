//! Core data model shared by every stage of the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw plan produced by the architect stage (or synthesized deterministically).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_north_star: Option<String>,
    #[serde(default)]
    pub theme: Value,
    #[serde(default)]
    pub pages: Vec<BlueprintPage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlueprintPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub sections: Vec<BlueprintSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props_hints: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hint: Option<RawLayoutHint>,
}

/// Free-form layout vocabulary as emitted by the planner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLayoutHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition_preset: Option<String>,
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Blueprint {
    /// Lenient extraction from untrusted planner output. Fields with the wrong
    /// shape are dropped instead of failing the whole blueprint.
    pub fn from_value(value: &Value) -> Option<Self> {
        let pages = value.get("pages")?.as_array()?;
        let pages = pages
            .iter()
            .filter(|page| page.is_object())
            .map(BlueprintPage::from_value)
            .collect::<Vec<_>>();
        if pages.is_empty() {
            return None;
        }
        let theme = match value.get("theme") {
            Some(theme @ Value::Object(_)) => theme.clone(),
            _ => Value::Object(Map::new()),
        };
        Some(Self {
            design_north_star: str_field(value, "designNorthStar"),
            theme,
            pages,
        })
    }

    pub fn section_count(&self) -> usize {
        self.pages.iter().map(|page| page.sections.len()).sum()
    }
}

impl BlueprintPage {
    fn from_value(value: &Value) -> Self {
        let sections = value
            .get("sections")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.is_object())
                    .map(BlueprintSection::from_value)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            path: str_field(value, "path"),
            name: str_field(value, "name"),
            sections,
        }
    }
}

impl BlueprintSection {
    pub fn new(id: &str, section_type: &str, intent: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            section_type: Some(section_type.to_string()),
            intent: Some(intent.to_string()),
            props_hints: None,
            layout_hint: None,
        }
    }

    fn from_value(value: &Value) -> Self {
        let layout_hint = value.get("layoutHint").filter(|v| v.is_object()).map(|hint| {
            RawLayoutHint {
                structure: str_field(hint, "structure"),
                density: str_field(hint, "density"),
                align: str_field(hint, "align"),
                media: str_field(hint, "media"),
                list: str_field(hint, "list"),
                composition_preset: str_field(hint, "compositionPreset"),
            }
        });
        Self {
            id: str_field(value, "id"),
            section_type: str_field(value, "type"),
            intent: str_field(value, "intent"),
            props_hints: value.get("propsHints").filter(|v| !v.is_null()).cloned(),
            layout_hint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Single,
    Split,
    Grid,
    Carousel,
    Stacked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Compact,
    Normal,
    Airy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Media {
    None,
    Image,
    Video,
    Illustration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    Cards,
    Tiles,
    Rows,
    Bullets,
}

impl Structure {
    pub fn as_str(self) -> &'static str {
        match self {
            Structure::Single => "single",
            Structure::Split => "split",
            Structure::Grid => "grid",
            Structure::Carousel => "carousel",
            Structure::Stacked => "stacked",
        }
    }
}

impl Density {
    pub fn as_str(self) -> &'static str {
        match self {
            Density::Compact => "compact",
            Density::Normal => "normal",
            Density::Airy => "airy",
        }
    }
}

impl Media {
    pub fn as_str(self) -> &'static str {
        match self {
            Media::None => "none",
            Media::Image => "image",
            Media::Video => "video",
            Media::Illustration => "illustration",
        }
    }
}

impl ListStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            ListStyle::Cards => "cards",
            ListStyle::Tiles => "tiles",
            ListStyle::Rows => "rows",
            ListStyle::Bullets => "bullets",
        }
    }
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Start => "start",
            Align::Center => "center",
            Align::End => "end",
        }
    }
}

/// Resolved, closed-vocabulary layout hint. Always carries a preset id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutHint {
    pub structure: Structure,
    pub density: Density,
    pub align: Align,
    pub align_locked: bool,
    pub media: Media,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListStyle>,
    pub composition_preset: String,
}

/// A normalized section. Never mutated after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(rename = "type")]
    pub section_type: String,
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props_hints: Option<Value>,
    pub layout_hint: LayoutHint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub path: String,
    pub name: String,
    pub sections: Vec<Section>,
}

/// Flattened cursor over one section of one page.
#[derive(Debug, Clone)]
pub struct SectionContext {
    pub page_index: usize,
    pub page_path: String,
    pub page_name: String,
    pub section_index: usize,
    pub section: Section,
}

impl SectionContext {
    /// Unit of idempotent resumability: `pagePath:sectionId:sectionIndex`.
    pub fn key(&self) -> String {
        section_key(&self.page_path, &self.section.id, self.section_index)
    }
}

pub fn section_key(page_path: &str, section_id: &str, section_index: usize) -> String {
    format!("{}:{}:{}", page_path, section_id, section_index)
}

/// Flatten pages into per-section contexts, preserving page then section order.
pub fn flatten_sections(pages: &[Page]) -> Vec<SectionContext> {
    pages
        .iter()
        .enumerate()
        .flat_map(|(page_index, page)| {
            page.sections
                .iter()
                .enumerate()
                .map(move |(section_index, section)| SectionContext {
                    page_index,
                    page_path: page.path.clone(),
                    page_name: page.name.clone(),
                    section_index,
                    section: section.clone(),
                })
        })
        .collect()
}

/// Data half of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl Block {
    pub fn new(block_type: impl Into<String>, props: Map<String, Value>) -> Self {
        Self {
            block_type: block_type.into(),
            props,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.props.get("id").and_then(Value::as_str)
    }

    pub fn anchor(&self) -> Option<&str> {
        self.props.get("anchor").and_then(Value::as_str)
    }

    /// Fill in `id` and `anchor` when missing or blank.
    pub fn ensure_identity(&mut self, id: &str, anchor: &str) {
        if self.id().map_or(true, |v| v.trim().is_empty()) {
            self.props.insert("id".into(), Value::String(id.to_string()));
        }
        if self.anchor().map_or(true, |v| v.trim().is_empty()) {
            self.props
                .insert("anchor".into(), Value::String(anchor.to_string()));
        }
    }
}

/// An assembled page: navigation block first, then one block per section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitePage {
    pub path: String,
    pub name: String,
    pub content: Vec<Block>,
}

/// Named unit of generated UI source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_props: Option<Value>,
}

/// Section-level failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    Parse,
    Layout,
    Style,
    Module,
    Runtime,
    RateLimit,
    Network,
    Unknown,
}

impl FailureType {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureType::Parse => "parse",
            FailureType::Layout => "layout",
            FailureType::Style => "style",
            FailureType::Module => "module",
            FailureType::Runtime => "runtime",
            FailureType::RateLimit => "rate_limit",
            FailureType::Network => "network",
            FailureType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one per section per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuilderSectionResult {
    Ok {
        component: Component,
        block: Block,
    },
    Fallback {
        block: Block,
        error: String,
        #[serde(rename = "failureType")]
        failure_type: FailureType,
    },
    Error {
        error: String,
        #[serde(rename = "failureType")]
        failure_type: FailureType,
    },
}

impl BuilderSectionResult {
    pub fn status(&self) -> SectionStatus {
        match self {
            BuilderSectionResult::Ok { .. } => SectionStatus::Ok,
            BuilderSectionResult::Fallback { .. } => SectionStatus::Fallback,
            BuilderSectionResult::Error { .. } => SectionStatus::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Ok,
    Fallback,
    Error,
}

/// One finished section as persisted by the checkpoint collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionOutput {
    pub key: String,
    pub page_path: String,
    pub section_id: String,
    pub section_index: usize,
    pub result: BuilderSectionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionFailure {
    pub key: String,
    pub page_path: String,
    pub section_id: String,
    pub failure_type: FailureType,
    pub error: String,
    pub attempts: usize,
}

/// Allowed component catalog handed to the builder prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentManifest {
    #[serde(default)]
    pub components: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub props: Vec<String>,
}

impl ComponentManifest {
    pub fn block_types(&self) -> Vec<&str> {
        self.components
            .iter()
            .map(|entry| entry.block_type.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blueprint_from_value_drops_malformed_fields() {
        let value = json!({
            "designNorthStar": "calm and precise",
            "theme": "not-an-object",
            "pages": [
                {"path": "/", "sections": [
                    {"id": "hero", "type": "hero", "layoutHint": {"structure": "split"}},
                    "garbage",
                    {"id": 42, "type": ["bad"]}
                ]},
                7
            ]
        });
        let blueprint = Blueprint::from_value(&value).unwrap();
        assert_eq!(blueprint.pages.len(), 1);
        assert_eq!(blueprint.pages[0].sections.len(), 2);
        assert_eq!(blueprint.pages[0].sections[1].id.as_deref(), Some("42"));
        assert_eq!(blueprint.pages[0].sections[1].section_type, None);
        assert!(blueprint.theme.is_object());
        assert_eq!(
            blueprint.pages[0].sections[0]
                .layout_hint
                .as_ref()
                .and_then(|h| h.structure.as_deref()),
            Some("split")
        );
    }

    #[test]
    fn blueprint_from_value_requires_pages() {
        assert!(Blueprint::from_value(&json!({"theme": {}})).is_none());
        assert!(Blueprint::from_value(&json!({"pages": []})).is_none());
    }

    #[test]
    fn ensure_identity_keeps_existing_values() {
        let mut props = Map::new();
        props.insert("id".into(), json!("custom"));
        let mut block = Block::new("Hero", props);
        block.ensure_identity("hero", "hero-anchor");
        assert_eq!(block.id(), Some("custom"));
        assert_eq!(block.anchor(), Some("hero-anchor"));
    }

    #[test]
    fn section_result_serializes_with_status_tag() {
        let result = BuilderSectionResult::Error {
            error: "boom".into(),
            failure_type: FailureType::RateLimit,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["failureType"], "rate_limit");
    }
}
