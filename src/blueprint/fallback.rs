//! Deterministic blueprints used when planning output is unusable, or when the
//! prompt matches a known reference profile.

use crate::types::{Blueprint, BlueprintPage, BlueprintSection, RawLayoutHint};
use regex::Regex;
use serde_json::{json, Value};

const SUMMARY_CHARS: usize = 80;

fn summarize(prompt: &str) -> String {
    let trimmed = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.is_empty() {
        return "the business".to_string();
    }
    let mut summary: String = trimmed.chars().take(SUMMARY_CHARS).collect();
    if trimmed.chars().count() > SUMMARY_CHARS {
        summary.push_str("...");
    }
    summary
}

fn with_preset(mut section: BlueprintSection, preset: &str) -> BlueprintSection {
    section.layout_hint = Some(RawLayoutHint {
        composition_preset: Some(preset.to_string()),
        ..Default::default()
    });
    section
}

fn default_theme() -> Value {
    json!({
        "mode": "light",
        "radius": "lg",
        "fontHeading": "Inter",
        "fontBody": "Inter",
        "motion": "subtle"
    })
}

/// Generic five-section site: hero, features, catalog, contact, footer.
pub fn generic_blueprint(prompt: &str) -> Blueprint {
    let summary = summarize(prompt);
    let sections = vec![
        with_preset(
            BlueprintSection::new(
                "hero",
                "hero",
                &format!("Introduce {} with a headline, supporting copy and a primary call to action", summary),
            ),
            "H02",
        ),
        with_preset(
            BlueprintSection::new("features", "features", &format!("Key benefits of {}", summary)),
            "F01",
        ),
        with_preset(
            BlueprintSection::new(
                "catalog",
                "catalog",
                &format!("Browse the main offerings of {}", summary),
            ),
            "C01",
        ),
        with_preset(
            BlueprintSection::new("contact", "contact", "Invite visitors to get in touch with a short form"),
            "K02",
        ),
        with_preset(
            BlueprintSection::new("footer", "footer", "Site links, contact details and legal notes"),
            "O01",
        ),
    ];
    Blueprint {
        design_north_star: Some(format!("Clear, trustworthy presentation of {}", summary)),
        theme: default_theme(),
        pages: vec![BlueprintPage {
            path: Some("/".to_string()),
            name: Some("Home".to_string()),
            sections,
        }],
    }
}

/// One fixed slot of a reference profile.
#[derive(Debug, Clone, Copy)]
pub struct ProfileSlot {
    pub id: &'static str,
    pub section_type: &'static str,
    pub preset: &'static str,
    /// Matched against `id type intent` of sections the planner produced
    pub pattern: &'static str,
    pub intent: &'static str,
}

/// A prescriptive site shape triggered by a prompt signature.
#[derive(Debug)]
pub struct ReferenceProfile {
    pub name: &'static str,
    keywords: &'static [&'static str],
    min_hits: usize,
    pub slots: &'static [ProfileSlot],
    north_star: &'static str,
}

pub static INDUSTRIAL_PROFILE: ReferenceProfile = ReferenceProfile {
    name: "industrial-manufacturer",
    keywords: &[
        "industrial", "manufactur", "factory", "b2b", "machinery", "engineering", "automation",
        "oem", "supplier", "plant",
    ],
    min_hits: 2,
    slots: &[
        ProfileSlot {
            id: "hero",
            section_type: "hero",
            preset: "H04",
            pattern: r"hero|banner|intro",
            intent: "Flagship capability statement with a product visual and a request-a-quote call to action",
        },
        ProfileSlot {
            id: "industries",
            section_type: "industries",
            preset: "C02",
            pattern: r"industr|sector|market|application|solution",
            intent: "Industries served, each as a tile with a short description",
        },
        ProfileSlot {
            id: "whats-new",
            section_type: "news",
            preset: "N01",
            pattern: r"news|what.?s.new|update|blog|press",
            intent: "Latest announcements, trade-show appearances and product updates",
        },
        ProfileSlot {
            id: "spotlight",
            section_type: "spotlight",
            preset: "C04",
            pattern: r"spotlight|product|showcase|featured|flagship",
            intent: "Spotlight on one flagship product with specifications",
        },
        ProfileSlot {
            id: "numbers",
            section_type: "stats",
            preset: "S01",
            pattern: r"stat|number|metric|figure|kpi",
            intent: "Company figures: years in operation, countries served, units shipped, certifications",
        },
        ProfileSlot {
            id: "contact",
            section_type: "contact",
            preset: "K02",
            pattern: r"contact|inquir|quote|form|cta",
            intent: "Request-a-quote form with sales contact details",
        },
        ProfileSlot {
            id: "footer",
            section_type: "footer",
            preset: "O01",
            pattern: r"footer",
            intent: "Company links, certifications and legal notes",
        },
    ],
    north_star: "Precise, credible engineering brand that makes requesting a quote effortless",
};

static PROFILES: &[&ReferenceProfile] = &[&INDUSTRIAL_PROFILE];

impl ReferenceProfile {
    fn hits(&self, prompt: &str) -> usize {
        let prompt = prompt.to_lowercase();
        self.keywords.iter().filter(|k| prompt.contains(*k)).count()
    }

    fn theme(&self) -> Value {
        json!({
            "mode": "light",
            "radius": "sm",
            "fontHeading": "IBM Plex Sans",
            "fontBody": "Inter",
            "motion": "subtle",
            "contract": {
                "voice": "corporate",
                "tokens": { "primary": "#0b3d91", "accent": "#f97316" }
            }
        })
    }
}

/// Find the reference profile whose signature the prompt matches, if any.
pub fn detect_reference_profile(prompt: &str) -> Option<&'static ReferenceProfile> {
    PROFILES
        .iter()
        .copied()
        .find(|profile| profile.hits(prompt) >= profile.min_hits)
}

/// Build the profile's fixed blueprint, re-slotting sections the planner already
/// produced into the named slots. Unmatched slots get synthetic content.
pub fn reference_profile_blueprint(
    profile: &ReferenceProfile,
    existing: Option<&Blueprint>,
) -> Blueprint {
    let candidates: Vec<&BlueprintSection> = existing
        .map(|bp| bp.pages.iter().flat_map(|p| p.sections.iter()).collect())
        .unwrap_or_default();
    let haystacks: Vec<String> = candidates
        .iter()
        .map(|s| {
            format!(
                "{} {} {}",
                s.id.as_deref().unwrap_or_default(),
                s.section_type.as_deref().unwrap_or_default(),
                s.intent.as_deref().unwrap_or_default()
            )
            .to_lowercase()
        })
        .collect();
    let mut used = vec![false; candidates.len()];

    let sections = profile
        .slots
        .iter()
        .map(|slot| {
            let matched = Regex::new(slot.pattern).ok().and_then(|re| {
                (0..candidates.len()).find(|&i| !used[i] && re.is_match(&haystacks[i]))
            });
            let (intent, props_hints) = match matched {
                Some(i) => {
                    used[i] = true;
                    let source = candidates[i];
                    (
                        source
                            .intent
                            .clone()
                            .unwrap_or_else(|| slot.intent.to_string()),
                        source.props_hints.clone(),
                    )
                }
                None => (slot.intent.to_string(), None),
            };
            let mut section = with_preset(
                BlueprintSection::new(slot.id, slot.section_type, &intent),
                slot.preset,
            );
            section.props_hints = props_hints;
            section
        })
        .collect();

    let theme = existing
        .map(|bp| bp.theme.clone())
        .filter(|t| t.as_object().is_some_and(|o| !o.is_empty()))
        .unwrap_or_else(|| profile.theme());

    Blueprint {
        design_north_star: Some(profile.north_star.to_string()),
        theme,
        pages: vec![BlueprintPage {
            path: Some("/".to_string()),
            name: Some("Home".to_string()),
            sections,
        }],
    }
}
