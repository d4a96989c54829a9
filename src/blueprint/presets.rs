//! Composition preset registry.
//!
//! Each preset is an immutable layout rule set. A section resolves to exactly one
//! preset during normalization and that preset is authoritative for validation.

use crate::types::{Align, Density, ListStyle, Media, Structure};
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_PRESET: &str = "F01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositionPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub structure: Structure,
    pub density: Density,
    pub align: Align,
    pub media: Media,
    pub list: Option<ListStyle>,
    /// Utility classes the generated component must contain
    pub required_classes: &'static [&'static str],
    /// Section types this preset is meant for (substring match)
    pub section_types: &'static [&'static str],
}

macro_rules! preset {
    ($id:literal, $name:literal, $s:ident, $d:ident, $a:ident, $m:ident, $l:expr, [$($req:literal),*], [$($ty:literal),*]) => {
        CompositionPreset {
            id: $id,
            name: $name,
            structure: Structure::$s,
            density: Density::$d,
            align: Align::$a,
            media: Media::$m,
            list: $l,
            required_classes: &[$($req),*],
            section_types: &[$($ty),*],
        }
    };
}

const CARDS: Option<ListStyle> = Some(ListStyle::Cards);
const TILES: Option<ListStyle> = Some(ListStyle::Tiles);
const ROWS: Option<ListStyle> = Some(ListStyle::Rows);
const BULLETS: Option<ListStyle> = Some(ListStyle::Bullets);

pub static PRESETS: &[CompositionPreset] = &[
    preset!("H01", "Hero / centered statement", Single, Airy, Center, None, None, ["text-center"], ["hero"]),
    preset!("H02", "Hero / split media", Split, Normal, Start, Image, None, ["md:grid-cols-2"], ["hero"]),
    preset!("H03", "Hero / full-bleed video", Single, Airy, Center, Video, None, ["relative", "overflow-hidden"], ["hero"]),
    preset!("H04", "Hero / product showcase", Split, Normal, Start, Image, None, ["lg:grid-cols-2"], ["hero", "showcase"]),
    preset!("H05", "Hero / editorial stack", Stacked, Airy, Start, None, None, ["max-w-3xl"], ["hero"]),
    preset!("H06", "Hero / stats banner", Grid, Normal, Center, None, None, ["md:grid-cols-3"], ["hero", "stats"]),
    preset!("F01", "Features / card grid", Grid, Normal, Start, None, CARDS, ["md:grid-cols-2", "lg:grid-cols-3"], ["feature", "service", "benefit", "section"]),
    preset!("F02", "Features / alternating rows", Split, Normal, Start, Image, ROWS, ["md:flex-row"], ["feature", "service"]),
    preset!("F03", "Features / icon list", Grid, Compact, Start, None, BULLETS, ["md:grid-cols-2"], ["feature", "benefit"]),
    preset!("F04", "Features / bento", Grid, Normal, Start, Image, TILES, ["md:grid-cols-4", "md:col-span-2"], ["feature", "showcase", "bento"]),
    preset!("F05", "Features / tabs", Single, Normal, Center, Image, None, ["flex"], ["feature", "showcase"]),
    preset!("F06", "Features / split highlight", Split, Airy, Start, Illustration, None, ["md:grid-cols-2"], ["feature", "about"]),
    preset!("C01", "Catalog / product grid", Grid, Normal, Start, Image, CARDS, ["sm:grid-cols-2", "lg:grid-cols-4"], ["catalog", "product", "shop", "collection"]),
    preset!("C02", "Catalog / category tiles", Grid, Compact, Start, Image, TILES, ["md:grid-cols-3"], ["catalog", "categor", "industr"]),
    preset!("C03", "Catalog / list rows", Stacked, Compact, Start, Image, ROWS, ["divide-y"], ["catalog", "product", "menu"]),
    preset!("C04", "Catalog / spotlight", Split, Airy, Start, Image, None, ["md:grid-cols-2"], ["spotlight", "product", "showcase"]),
    preset!("G01", "Gallery / stacked", Stacked, Normal, Center, Image, None, ["space-y-8"], ["gallery", "showcase", "portfolio"]),
    preset!("G02", "Gallery / masonry", Grid, Compact, Start, Image, TILES, ["columns-2", "md:columns-3"], ["gallery", "portfolio"]),
    preset!("G03", "Gallery / carousel", Carousel, Normal, Center, Image, None, ["overflow-x-auto", "snap-x"], ["gallery", "showcase", "scene"]),
    preset!("T01", "Testimonials / quote cards", Grid, Normal, Start, None, CARDS, ["md:grid-cols-3"], ["testimonial", "review"]),
    preset!("T02", "Testimonials / single quote", Single, Airy, Center, None, None, ["text-center"], ["testimonial", "quote"]),
    preset!("T03", "Testimonials / marquee", Carousel, Compact, Center, None, None, ["overflow-hidden"], ["testimonial", "review"]),
    preset!("P01", "Pricing / tiers", Grid, Normal, Center, None, CARDS, ["md:grid-cols-3"], ["pricing", "plan"]),
    preset!("P02", "Pricing / comparison table", Single, Compact, Start, None, ROWS, ["overflow-x-auto"], ["pricing", "comparison"]),
    preset!("Q01", "FAQ / accordion", Single, Normal, Start, None, ROWS, ["max-w-3xl", "divide-y"], ["faq", "question"]),
    preset!("Q02", "FAQ / two-column", Split, Normal, Start, None, ROWS, ["md:grid-cols-2"], ["faq", "question"]),
    preset!("N01", "News / article cards", Grid, Normal, Start, Image, CARDS, ["md:grid-cols-3"], ["news", "blog", "article", "case-stud", "whats-new"]),
    preset!("N02", "News / featured and list", Split, Normal, Start, Image, ROWS, ["lg:grid-cols-3", "lg:col-span-2"], ["news", "blog", "case-stud"]),
    preset!("S01", "Stats / number strip", Grid, Compact, Center, None, None, ["grid-cols-2", "md:grid-cols-4"], ["stat", "number", "metric"]),
    preset!("S02", "Stats / split narrative", Split, Normal, Start, None, None, ["md:grid-cols-2"], ["stat", "number", "about"]),
    preset!("K01", "CTA / banner", Single, Airy, Center, None, None, ["text-center", "rounded-"], ["cta", "call-to-action", "signup", "newsletter"]),
    preset!("K02", "Contact / form split", Split, Normal, Start, None, None, ["md:grid-cols-2"], ["contact", "form", "inquir"]),
    preset!("K03", "Contact / map and details", Split, Normal, Start, Image, None, ["md:grid-cols-2"], ["contact", "map", "location"]),
    preset!("L01", "Logos / strip", Grid, Compact, Center, Image, TILES, ["grid-cols-2", "md:grid-cols-6"], ["logo", "client", "partner", "trust"]),
    preset!("L02", "Logos / marquee", Carousel, Compact, Center, Image, None, ["overflow-hidden"], ["logo", "client", "partner"]),
    preset!("O01", "Footer / columns", Grid, Compact, Start, None, None, ["md:grid-cols-4"], ["footer"]),
    preset!("O02", "Footer / minimal", Single, Compact, Center, None, None, ["text-center"], ["footer"]),
    preset!("X01", "Timeline / vertical", Stacked, Normal, Start, None, None, ["border-l"], ["timeline", "history", "milestone"]),
    preset!("X02", "Process / steps grid", Grid, Normal, Start, None, CARDS, ["md:grid-cols-4"], ["process", "step", "how-it-works"]),
    preset!("A01", "About / story split", Split, Airy, Start, Image, None, ["md:grid-cols-2"], ["about", "story", "mission"]),
    preset!("A02", "Team / member grid", Grid, Normal, Center, Image, CARDS, ["sm:grid-cols-2", "lg:grid-cols-4"], ["team", "people"]),
];

/// Ordered type -> preset rules. First match wins.
static TYPE_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"hero|banner|masthead|jumbotron|splash", "H01"),
        (r"footer", "O01"),
        (r"faq|question", "Q01"),
        (r"pricing|\bplans?\b|\btiers?\b", "P01"),
        (r"testimonial|review|\bquotes?\b", "T01"),
        (r"logo|client|partner|trust", "L01"),
        (r"\bstats?\b|statistic|number|metric|\bkpis?\b", "S01"),
        (r"contact|\bform\b|inquir|\bmap\b|location", "K02"),
        (r"\bcta\b|call.to.action|signup|sign-up|newsletter", "K01"),
        (r"news|blog|article|case.stud|whats.new|insight|press", "N01"),
        (r"gallery|portfolio|showcase|scene", "G01"),
        (r"spotlight", "C04"),
        (r"catalog|product|shop|collection|categor|industr|menu", "C01"),
        (r"timeline|history|milestone", "X01"),
        (r"process|\bsteps?\b|how.it.works|workflow", "X02"),
        (r"team|people|leadership", "A02"),
        (r"about|story|mission", "A01"),
        (r"bento", "F04"),
        (r"feature|service|benefit|capabilit", "F01"),
    ]
    .into_iter()
    .map(|(pattern, id)| (Regex::new(pattern).expect("valid preset rule"), id))
    .collect()
});

pub fn preset_by_id(id: &str) -> Option<&'static CompositionPreset> {
    let id = id.trim();
    PRESETS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

/// The default preset. Always present in the registry.
pub fn default_preset() -> &'static CompositionPreset {
    &PRESETS[6]
}

pub fn preset_ids() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.id).collect()
}

impl CompositionPreset {
    /// True when the preset is meant for this section type.
    pub fn applies_to(&self, section_type: &str) -> bool {
        let section_type = section_type.to_ascii_lowercase();
        self.section_types
            .iter()
            .any(|t| section_type.contains(t) || (section_type.len() >= 3 && t.contains(&*section_type)))
    }

    /// Human-readable rule text embedded in builder prompts.
    pub fn rules_text(&self) -> String {
        let mut text = format!(
            "Composition preset {} ({}): structure={}, density={}, align={}, media={}",
            self.id,
            self.name,
            self.structure.as_str(),
            self.density.as_str(),
            self.align.as_str(),
            self.media.as_str(),
        );
        if let Some(list) = self.list {
            text.push_str(&format!(", list={}", list.as_str()));
        }
        let required: Vec<String> = self
            .required_classes
            .iter()
            .map(|class| match class.ends_with('-') {
                true => format!("{}* (any)", class),
                false => class.to_string(),
            })
            .collect();
        text.push_str(&format!(". Required classes: {}.", required.join(", ")));
        text
    }
}

/// Match a section type against the ordered rules.
pub fn preset_for_type(section_type: &str) -> &'static str {
    let section_type = section_type.to_ascii_lowercase();
    TYPE_RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(&section_type))
        .map(|(_, id)| *id)
        .unwrap_or(DEFAULT_PRESET)
}
