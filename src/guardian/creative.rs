//! Creative latitude per section: importance, allowed effects, freedom score.

use super::contract::ThemeContract;
use crate::types::Section;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

/// Dimensions the builder must not improvise on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForbiddenDimensions {
    pub colors: bool,
    pub fonts: bool,
    pub spacing: bool,
    pub layout: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreativeGuidance {
    pub importance: Importance,
    pub effects: Vec<&'static str>,
    pub animation_hints: Vec<&'static str>,
    /// 0.0 (follow the preset exactly) to 1.0 (free composition)
    pub freedom: f32,
    pub forbidden: ForbiddenDimensions,
}

static HIGH_IMPORTANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"hero|showcase|product|catalog|pricing|cta").expect("valid regex")
});
static LOW_IMPORTANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"faq|footer|info|legal").expect("valid regex"));

/// Block type -> creative freedom. First match wins.
static FREEDOM_TABLE: LazyLock<Vec<(Regex, f32)>> = LazyLock::new(|| {
    [
        (r"hero", 0.8),
        (r"showcase|gallery|spotlight", 0.7),
        (r"feature|service|benefit", 0.5),
        (r"testimonial|review", 0.5),
        (r"stat|number", 0.5),
        (r"pricing", 0.4),
        (r"catalog|product", 0.4),
        (r"contact|form|cta", 0.3),
        (r"faq", 0.2),
        (r"footer|nav", 0.1),
    ]
    .into_iter()
    .map(|(pattern, freedom)| (Regex::new(pattern).expect("valid regex"), freedom))
    .collect()
});

const DEFAULT_FREEDOM: f32 = 0.4;

pub fn importance_for(section_id: &str) -> Importance {
    let id = section_id.to_lowercase();
    if HIGH_IMPORTANCE.is_match(&id) {
        Importance::High
    } else if LOW_IMPORTANCE.is_match(&id) {
        Importance::Low
    } else {
        Importance::Medium
    }
}

pub fn build_creative_guidance(section: &Section) -> CreativeGuidance {
    let importance = importance_for(&section.id);
    let (effects, animation_hints): (Vec<&str>, Vec<&str>) = match importance {
        Importance::High => (
            vec!["gradient-overlay", "hover-lift", "glass-panel", "staggered-reveal"],
            vec!["fadeUp on enter", "stagger children by 80ms", "scale 1.02 on hover"],
        ),
        Importance::Medium => (
            vec!["hover-lift", "subtle-shadow", "fade-in"],
            vec!["fadeIn on enter"],
        ),
        Importance::Low => (vec!["fade-in"], vec![]),
    };

    let section_type = section.section_type.to_lowercase();
    let freedom = FREEDOM_TABLE
        .iter()
        .find(|(re, _)| re.is_match(&section_type))
        .map(|(_, f)| *f)
        .unwrap_or(DEFAULT_FREEDOM);

    CreativeGuidance {
        importance,
        effects,
        animation_hints,
        freedom,
        forbidden: ForbiddenDimensions {
            colors: freedom < 0.7,
            fonts: true,
            spacing: freedom < 0.5,
            layout: freedom < 0.3,
        },
    }
}

/// Whether the contract's breakout budget admits this section.
pub fn is_breakout_eligible(section: &Section, contract: &ThemeContract) -> bool {
    contract
        .breakout_budget
        .allowed_sections
        .iter()
        .any(|allowed| {
            allowed.eq_ignore_ascii_case(&section.id) || allowed.eq_ignore_ascii_case(&section.section_type)
        })
}

impl CreativeGuidance {
    pub fn prompt_text(&self) -> String {
        let mut forbidden = Vec::new();
        if self.forbidden.colors {
            forbidden.push("colors");
        }
        if self.forbidden.fonts {
            forbidden.push("fonts");
        }
        if self.forbidden.spacing {
            forbidden.push("spacing");
        }
        if self.forbidden.layout {
            forbidden.push("layout");
        }
        format!(
            "Importance: {:?}. Allowed effects: {}. Animation: {}. Creative freedom: {:.1}. Do not improvise: {}.",
            self.importance,
            self.effects.join(", "),
            if self.animation_hints.is_empty() {
                "none".to_string()
            } else {
                self.animation_hints.join("; ")
            },
            self.freedom,
            if forbidden.is_empty() {
                "nothing".to_string()
            } else {
                forbidden.join(", ")
            }
        )
    }
}
