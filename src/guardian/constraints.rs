//! Per-section constraints derived from the theme contract.
//!
//! Constraints shape the builder prompt. They are guidance, not a filter.

use super::contract::{LayoutRules, ThemeContract, ThemeTokens};
use crate::types::{Align, ListStyle, Section, Structure};
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPattern {
    HeroCentered,
    HeroSplit,
    ThreeColumnCards,
    SingleColumn,
    TwoColumn,
}

impl LayoutPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutPattern::HeroCentered => "hero-centered",
            LayoutPattern::HeroSplit => "hero-split",
            LayoutPattern::ThreeColumnCards => "three-column-cards",
            LayoutPattern::SingleColumn => "single-column",
            LayoutPattern::TwoColumn => "two-column",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionConstraints {
    pub pattern: LayoutPattern,
    pub variant: &'static str,
    pub max_items: usize,
    pub align: Align,
    pub align_locked: bool,
    pub tokens: ThemeTokens,
    pub layout_rules: LayoutRules,
}

/// Block type -> (variant, max items). First match wins.
static BLOCK_VARIANTS: LazyLock<Vec<(Regex, &'static str, usize)>> = LazyLock::new(|| {
    [
        (r"hero", "hero-primary", 1),
        (r"footer", "footer-columns", 4),
        (r"faq", "accordion", 8),
        (r"pricing|plan", "pricing-tiers", 4),
        (r"testimonial|review", "quote-cards", 3),
        (r"stat|number|metric", "stat-strip", 4),
        (r"logo|client|partner", "logo-strip", 8),
        (r"news|blog|article|case", "article-cards", 3),
        (r"contact|form|cta", "contact-form", 1),
        (r"catalog|product|industr|categor", "product-grid", 8),
        (r"feature|service|benefit", "feature-grid", 6),
        (r"gallery|showcase|portfolio", "media-gallery", 6),
        (r"team|people", "member-grid", 8),
    ]
    .into_iter()
    .map(|(pattern, variant, max)| (Regex::new(pattern).expect("valid regex"), variant, max))
    .collect()
});

static LIST_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"feature|catalog|product|pricing|testimonial|review|team|news|blog|logo|industr|service")
        .expect("valid regex")
});

pub fn build_constraints(section: &Section, contract: &ThemeContract) -> SectionConstraints {
    let section_type = section.section_type.as_str();
    let hint = &section.layout_hint;

    let pattern = if section_type.contains("hero") {
        if hint.structure == Structure::Split {
            LayoutPattern::HeroSplit
        } else {
            LayoutPattern::HeroCentered
        }
    } else if LIST_LIKE.is_match(section_type)
        || matches!(hint.list, Some(ListStyle::Cards) | Some(ListStyle::Tiles))
    {
        LayoutPattern::ThreeColumnCards
    } else if hint.structure == Structure::Split {
        LayoutPattern::TwoColumn
    } else {
        LayoutPattern::SingleColumn
    };

    let (variant, max_items) = BLOCK_VARIANTS
        .iter()
        .find(|(re, _, _)| re.is_match(section_type))
        .map(|(_, variant, max)| (*variant, *max))
        .unwrap_or(("content", 4));

    SectionConstraints {
        pattern,
        variant,
        max_items,
        align: hint.align,
        align_locked: hint.align_locked,
        tokens: contract.tokens.clone(),
        layout_rules: contract.layout_rules.clone(),
    }
}

impl SectionConstraints {
    pub fn prompt_text(&self) -> String {
        let mut lines = vec![
            format!("Layout pattern: {}", self.pattern.as_str()),
            format!("Block variant: {} (at most {} items)", self.variant, self.max_items),
            format!(
                "Alignment: {}{}",
                self.align.as_str(),
                if self.align_locked { " (locked, use exactly)" } else { "" }
            ),
            format!(
                "Container: max-w-{} mx-auto, section padding \"{}\", grid gap \"{}\"",
                self.layout_rules.max_width, self.layout_rules.section_padding, self.layout_rules.grid.gap
            ),
        ];
        lines.push(format!(
            "Tokens: primary {}, accent {}, neutral {}, background {}, text {}, secondary text {}",
            self.tokens.primary,
            self.tokens.accent,
            self.tokens.neutral,
            self.tokens.bg,
            self.tokens.text,
            self.tokens.text_secondary
        ));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Density, LayoutHint, Media};

    fn section(section_type: &str, structure: Structure, list: Option<ListStyle>) -> Section {
        Section {
            id: section_type.to_string(),
            section_type: section_type.to_string(),
            intent: String::new(),
            props_hints: None,
            layout_hint: LayoutHint {
                structure,
                density: Density::Normal,
                align: Align::Start,
                align_locked: false,
                media: Media::None,
                list,
                composition_preset: "F01".to_string(),
            },
        }
    }

    #[test]
    fn test_pattern_selection() {
        let contract = ThemeContract::default();
        let cases = [
            (section("hero", Structure::Split, None), LayoutPattern::HeroSplit),
            (section("hero", Structure::Single, None), LayoutPattern::HeroCentered),
            (section("features", Structure::Grid, None), LayoutPattern::ThreeColumnCards),
            (section("about", Structure::Split, None), LayoutPattern::TwoColumn),
            (section("faq", Structure::Single, None), LayoutPattern::SingleColumn),
            (section("misc", Structure::Single, Some(ListStyle::Cards)), LayoutPattern::ThreeColumnCards),
        ];
        for (section, expected) in cases {
            assert_eq!(build_constraints(&section, &contract).pattern, expected, "{}", section.id);
        }
    }

    #[test]
    fn test_variant_table_and_token_echo() {
        let contract = ThemeContract::default();
        let constraints = build_constraints(&section("pricing", Structure::Grid, None), &contract);
        assert_eq!(constraints.variant, "pricing-tiers");
        assert_eq!(constraints.max_items, 4);
        assert_eq!(constraints.tokens.primary, contract.tokens.primary);
        assert!(constraints.prompt_text().contains("pricing-tiers"));

        let other = build_constraints(&section("widget", Structure::Single, None), &contract);
        assert_eq!((other.variant, other.max_items), ("content", 4));
    }
}
