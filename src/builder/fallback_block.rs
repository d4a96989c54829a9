//! Deterministic fallback blocks.
//!
//! Keyed by a regex over `type id`. Every entry yields a populated block of a
//! known type; unmatched sections get the generic rich-text block.

use crate::blueprint::{humanize, slugify};
use crate::types::Block;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

type BlockBuilder = fn(&str) -> (&'static str, Value);

static FALLBACK_TABLE: LazyLock<Vec<(Regex, BlockBuilder)>> = LazyLock::new(|| {
    let entries: [(&str, BlockBuilder); 9] = [
        (r"hero|banner|masthead", hero),
        (r"product|catalog|shop|industr|collection", product_grid),
        (r"news|case|blog|article|stories|whats-new|update", news_list),
        (r"testimonial|review|quote", testimonials),
        (r"pricing|plan|tier", pricing),
        (r"faq|question", faq),
        (r"contact|cta|form|map|booking", contact),
        (r"footer", footer),
        (r"feature|stat|trust|number|benefit|service|metric", feature_grid),
    ];
    entries
        .into_iter()
        .map(|(pattern, builder)| (Regex::new(pattern).expect("valid regex"), builder))
        .collect()
});

fn hero(title: &str) -> (&'static str, Value) {
    (
        "Hero",
        json!({
            "headline": title,
            "subheadline": "Thoughtfully made, ready when you are.",
            "primaryCta": { "label": "Get started", "href": "#contact" },
            "secondaryCta": { "label": "Learn more", "href": "#features" },
            "image": { "src": "/placeholder/hero.jpg", "alt": title }
        }),
    )
}

fn product_grid(title: &str) -> (&'static str, Value) {
    let items: Vec<Value> = (1..=3)
        .map(|n| {
            json!({
                "title": format!("Offering {}", n),
                "description": "A short summary of what makes this worth a look.",
                "image": { "src": format!("/placeholder/item-{}.jpg", n), "alt": format!("Offering {}", n) },
                "href": "#contact"
            })
        })
        .collect();
    ("ProductGrid", json!({ "title": title, "items": items }))
}

fn news_list(title: &str) -> (&'static str, Value) {
    let items: Vec<Value> = (1..=3)
        .map(|n| {
            json!({
                "title": format!("Update {}", n),
                "date": "2024-01-01",
                "excerpt": "A brief note on what changed and why it matters.",
                "href": "#"
            })
        })
        .collect();
    ("NewsList", json!({ "title": title, "items": items }))
}

fn testimonials(title: &str) -> (&'static str, Value) {
    let items: Vec<Value> = ["Alex", "Sam", "Jordan"]
        .iter()
        .map(|author| {
            json!({
                "quote": "Working with this team was straightforward from start to finish.",
                "author": author,
                "role": "Customer"
            })
        })
        .collect();
    ("Testimonials", json!({ "title": title, "items": items }))
}

fn pricing(title: &str) -> (&'static str, Value) {
    let tiers: Vec<Value> = [("Starter", "$0"), ("Growth", "$29"), ("Scale", "$99")]
        .iter()
        .map(|(name, price)| {
            json!({
                "name": name,
                "price": price,
                "features": ["Core features", "Email support"],
                "cta": { "label": "Choose plan", "href": "#contact" }
            })
        })
        .collect();
    ("Pricing", json!({ "title": title, "tiers": tiers }))
}

fn faq(title: &str) -> (&'static str, Value) {
    let items: Vec<Value> = [
        "How do I get started?",
        "What does it cost?",
        "Can I change my plan later?",
        "How do I reach support?",
    ]
    .iter()
    .map(|question| json!({ "question": question, "answer": "Get in touch and we will walk you through it." }))
    .collect();
    ("Faq", json!({ "title": title, "items": items }))
}

fn contact(title: &str) -> (&'static str, Value) {
    (
        "Contact",
        json!({
            "title": title,
            "description": "Tell us what you need and we will get back to you within one business day.",
            "fields": [
                { "name": "name", "label": "Name", "type": "text" },
                { "name": "email", "label": "Email", "type": "email" },
                { "name": "message", "label": "Message", "type": "textarea" }
            ],
            "submitLabel": "Send message",
            "email": "hello@example.com"
        }),
    )
}

fn footer(_title: &str) -> (&'static str, Value) {
    (
        "Footer",
        json!({
            "brand": "Company",
            "columns": [
                { "title": "Company", "links": [{ "label": "About", "href": "#about" }, { "label": "Contact", "href": "#contact" }] },
                { "title": "Legal", "links": [{ "label": "Privacy", "href": "#" }, { "label": "Terms", "href": "#" }] }
            ],
            "copyright": "All rights reserved."
        }),
    )
}

fn feature_grid(title: &str) -> (&'static str, Value) {
    let items: Vec<Value> = [("Reliable", "shield"), ("Fast", "zap"), ("Supported", "life-buoy")]
        .iter()
        .map(|(name, icon)| {
            json!({
                "title": name,
                "description": "A concise explanation of this benefit.",
                "icon": icon
            })
        })
        .collect();
    ("FeatureGrid", json!({ "title": title, "items": items }))
}

fn rich_text(title: &str) -> (&'static str, Value) {
    (
        "RichText",
        json!({
            "title": title,
            "body": "More details about this part of the site are coming soon."
        }),
    )
}

/// Fully populated placeholder block for a section. Total: never empty.
pub fn build_deterministic_fallback_block(section_type: &str, section_id: &str) -> Block {
    let haystack = format!("{} {}", section_type, section_id).to_lowercase();
    let builder = FALLBACK_TABLE
        .iter()
        .find(|(re, _)| re.is_match(&haystack))
        .map(|(_, builder)| *builder)
        .unwrap_or(rich_text as BlockBuilder);

    let id = match slugify(section_id) {
        slug if !slug.is_empty() => slug,
        _ => match slugify(section_type) {
            slug if !slug.is_empty() => slug,
            _ => "section".to_string(),
        },
    };
    let title = match humanize(&id) {
        t if t.is_empty() => "Section".to_string(),
        t => t,
    };

    let (block_type, props) = builder(&title);
    let mut props = match props {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    props.insert("id".into(), Value::String(id.clone()));
    props.insert("anchor".into(), Value::String(id));
    Block::new(block_type, props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn table_picks_archetype_blocks() {
        assert_eq!(build_deterministic_fallback_block("hero", "hero").block_type, "Hero");
        assert_eq!(
            build_deterministic_fallback_block("section", "whats-new").block_type,
            "NewsList"
        );
        assert_eq!(
            build_deterministic_fallback_block("stats", "numbers").block_type,
            "FeatureGrid"
        );
        assert_eq!(build_deterministic_fallback_block("cta", "x").block_type, "Contact");
        assert_eq!(build_deterministic_fallback_block("about", "story").block_type, "RichText");
    }

    #[test]
    fn blocks_carry_identity() {
        let block = build_deterministic_fallback_block("faq", "Common Questions");
        assert_eq!(block.id(), Some("common-questions"));
        assert_eq!(block.anchor(), Some("common-questions"));
        assert_eq!(block.props["title"], "Common Questions");
        let anonymous = build_deterministic_fallback_block("", "");
        assert_eq!(anonymous.id(), Some("section"));
    }

    proptest! {
        #[test]
        fn fallback_is_total(section_type in ".{0,24}", section_id in ".{0,24}") {
            let block = build_deterministic_fallback_block(&section_type, &section_id);
            prop_assert!(!block.block_type.is_empty());
            prop_assert!(block.props.len() > 2);
            prop_assert!(block.id().is_some_and(|id| !id.is_empty()));
            prop_assert!(block.anchor().is_some_and(|a| !a.is_empty()));
        }
    }
}
