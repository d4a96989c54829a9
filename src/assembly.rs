//! Assembly: worker outputs to ordered pages and a component registry.
//!
//! Never fails. Missing or errored sections become placeholder blocks and
//! every degradation is recorded as a string tag in `errors`.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::blueprint::{humanize, slugify};
use crate::builder::build_deterministic_fallback_block;
use crate::types::{
    section_key, Block, BuilderSectionResult, Component, FailureType, Page, Section, SectionOutput,
    SitePage,
};

pub const NAV_BLOCK_TYPE: &str = "Navbar";
pub const NAV_ID: &str = "nav";

/// Longest nav label, in words.
const NAV_LABEL_WORDS: usize = 3;

static NAV_EXCLUDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)footer|\bnav|navbar|navigation|header").expect("valid regex"));

/// Call-to-action candidates, best first.
static CTA_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)contact|quote|booking|get-in-touch", "Contact us"),
        (r"(?i)trial|signup|sign-up|demo|get-started", "Start free trial"),
        (r"(?i)pricing|plans?\b", "See pricing"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("valid regex"), label))
    .collect()
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    pub pages: Vec<SitePage>,
    pub components: Vec<Component>,
    /// Per assembled section in page order (nav excluded): index into
    /// `components` of the component it renders, `None` for fallbacks.
    pub section_components: Vec<Option<usize>>,
    pub errors: Vec<String>,
}

impl Assembly {
    /// The component each assembled section renders with.
    pub fn rendered_sections(&self) -> Vec<Option<&Component>> {
        self.section_components
            .iter()
            .map(|index| index.and_then(|i| self.components.get(i)))
            .collect()
    }
}

/// First-wins registry keyed by component name.
#[derive(Debug, Default)]
struct ComponentRegistry {
    components: Vec<Component>,
    by_name: HashMap<String, usize>,
}

impl ComponentRegistry {
    /// Index of the component holding the name, and false when that is a
    /// different component.
    fn register(&mut self, component: Component) -> (usize, bool) {
        match self.by_name.get(&component.name) {
            Some(&index) => (index, self.components[index].code == component.code),
            None => {
                let index = self.components.len();
                self.by_name.insert(component.name.clone(), index);
                self.components.push(component);
                (index, true)
            }
        }
    }
}

/// Per-page uniqueness of block ids and anchors.
#[derive(Debug, Default)]
struct IdentityPool {
    ids: HashSet<String>,
    anchors: HashSet<String>,
}

impl IdentityPool {
    fn with_reserved(reserved: &str) -> Self {
        let mut pool = Self::default();
        pool.ids.insert(reserved.to_string());
        pool.anchors.insert(reserved.to_string());
        pool
    }

    fn claim(taken: &mut HashSet<String>, base: &str) -> String {
        let base = match slugify(base) {
            slug if slug.is_empty() => "section".to_string(),
            slug => slug,
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        taken.insert(candidate.clone());
        candidate
    }

    /// Give `block` an id and anchor unique within the page.
    fn stamp(&mut self, block: &mut Block, section_id: &str) {
        let id_base = block
            .id()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(section_id)
            .to_string();
        let id = Self::claim(&mut self.ids, &id_base);
        let anchor_base = block
            .anchor()
            .filter(|a| !a.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| id.clone());
        let anchor = Self::claim(&mut self.anchors, &anchor_base);
        block.props.insert("id".into(), Value::String(id));
        block.props.insert("anchor".into(), Value::String(anchor));
    }
}

/// Merge section outputs into pages in blueprint order.
pub fn assemble(pages: &[Page], outputs: &[SectionOutput]) -> Assembly {
    let by_key: HashMap<&str, &SectionOutput> =
        outputs.iter().map(|o| (o.key.as_str(), o)).collect();
    let mut registry = ComponentRegistry::default();
    let mut errors = Vec::new();
    let mut site_pages = Vec::with_capacity(pages.len());
    let mut section_components = Vec::new();

    for page in pages {
        let mut identities = IdentityPool::with_reserved(NAV_ID);
        let mut content = Vec::with_capacity(page.sections.len() + 1);
        let mut linkable = Vec::new();

        for (index, section) in page.sections.iter().enumerate() {
            let key = section_key(&page.path, &section.id, index);
            let mut rendered = None;
            let mut block = match by_key.get(key.as_str()).map(|o| &o.result) {
                Some(BuilderSectionResult::Ok { component, block }) => {
                    let (index, consistent) = registry.register(component.clone());
                    if !consistent {
                        warn!(component = %component.name, section = %key, "Component name conflict, keeping the first");
                        errors.push(format!("builder_component_conflict:{}", component.name));
                    }
                    rendered = Some(index);
                    block.clone()
                }
                Some(BuilderSectionResult::Fallback {
                    block,
                    failure_type,
                    ..
                }) => {
                    errors.push(fallback_tag(*failure_type, &page.path, &section.id));
                    block.clone()
                }
                Some(BuilderSectionResult::Error { failure_type, .. }) => {
                    errors.push(fallback_tag(*failure_type, &page.path, &section.id));
                    build_deterministic_fallback_block(&section.section_type, &section.id)
                }
                None => {
                    debug!(section = %key, "No output for section, using placeholder");
                    errors.push(fallback_tag(FailureType::Unknown, &page.path, &section.id));
                    build_deterministic_fallback_block(&section.section_type, &section.id)
                }
            };
            identities.stamp(&mut block, &section.id);
            if is_linkable(section) {
                if let Some(anchor) = block.anchor() {
                    linkable.push((section, anchor.to_string()));
                }
            }
            content.push(block);
            section_components.push(rendered);
        }

        content.insert(0, nav_block(page, pages, &linkable));
        site_pages.push(SitePage {
            path: page.path.clone(),
            name: page.name.clone(),
            content,
        });
    }

    Assembly {
        pages: site_pages,
        components: registry.components,
        section_components,
        errors,
    }
}

fn fallback_tag(failure: FailureType, page_path: &str, section_id: &str) -> String {
    format!("builder_section_fallback:{}:{}:{}", failure, page_path, section_id)
}

fn is_linkable(section: &Section) -> bool {
    !NAV_EXCLUDED.is_match(&section.id) && !NAV_EXCLUDED.is_match(&section.section_type)
}

/// Humanized, at most a few words.
pub fn nav_label(section_id: &str) -> String {
    humanize(section_id)
        .split_whitespace()
        .take(NAV_LABEL_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Navigation block for one page from its own linkable sections.
fn nav_block(page: &Page, all_pages: &[Page], linkable: &[(&Section, String)]) -> Block {
    let links: Vec<Value> = linkable
        .iter()
        .map(|(section, anchor)| json!({ "label": nav_label(&section.id), "href": format!("#{}", anchor) }))
        .collect();

    let cta = CTA_RULES
        .iter()
        .find_map(|(re, label)| {
            linkable
                .iter()
                .find(|(s, _)| re.is_match(&s.id) || re.is_match(&s.section_type))
                .map(|(_, anchor)| json!({ "label": label, "href": format!("#{}", anchor) }))
        })
        .unwrap_or(Value::Null);

    let page_links: Vec<Value> = all_pages
        .iter()
        .filter(|p| p.path != page.path)
        .map(|p| json!({ "label": p.name, "href": p.path }))
        .collect();

    let mut props = Map::new();
    props.insert("id".into(), json!(NAV_ID));
    props.insert("anchor".into(), json!(NAV_ID));
    props.insert("links".into(), Value::Array(links));
    props.insert("cta".into(), cta);
    props.insert("pages".into(), Value::Array(page_links));
    Block::new(NAV_BLOCK_TYPE, props)
}
