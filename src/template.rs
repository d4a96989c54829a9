//! Style-template collaborator.
//!
//! A template resolver may supply a curated block for a section that is about to
//! degrade to the deterministic fallback. It is a pure lookup and never required
//! for correctness.

use crate::types::Block;

/// Everything a resolver may key a lookup on.
#[derive(Debug, Clone, Copy)]
pub struct TemplateQuery<'a> {
    pub prompt: &'a str,
    pub page_name: &'a str,
    pub section_type: &'a str,
    pub section_id: &'a str,
    pub section_intent: Option<&'a str>,
    pub id_base: &'a str,
    pub anchor: &'a str,
}

pub trait SectionTemplateResolver: Send + Sync {
    fn resolve_section_template_block(&self, query: &TemplateQuery<'_>) -> Option<Block>;
}

/// Resolver that never has a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl SectionTemplateResolver for NoTemplates {
    fn resolve_section_template_block(&self, _query: &TemplateQuery<'_>) -> Option<Block> {
        None
    }
}
