//! Blueprint normalization: raw planner output to canonical, size-bounded pages.

use super::layout_hint::{parse_align, PartialHint};
use super::presets::{self, CompositionPreset};
use super::SiteLimits;
use crate::types::{Align, Blueprint, BlueprintSection, LayoutHint, Media, Page, Section, Structure};
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a blueprint into pages. Pure and deterministic.
///
/// Budgets apply page-first: pages beyond `max_pages` are dropped, each page keeps
/// at most `max_sections_per_page`, and once `max_sections_total` is spent later
/// pages keep nothing. The first page always keeps at least one section.
pub fn normalize_pages(blueprint: &Blueprint, limits: &SiteLimits) -> Vec<Page> {
    let overrides = align_overrides(&blueprint.theme);
    let mut remaining = limits.max_sections_total;
    let mut used_paths = HashSet::new();
    let mut pages = Vec::new();

    for (page_index, raw_page) in blueprint.pages.iter().take(limits.max_pages).enumerate() {
        let path = page_path(raw_page.path.as_deref(), page_index, &mut used_paths);
        let name = raw_page
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Page {}", page_index + 1));

        let allowance = limits.max_sections_per_page.min(remaining);
        let mut seen_ids = HashSet::new();
        let mut sections = Vec::new();
        for (index, raw) in raw_page.sections.iter().take(allowance).enumerate() {
            sections.push(normalize_section(raw, index, &overrides, &mut seen_ids));
        }
        if page_index == 0 && sections.is_empty() {
            sections.push(synthetic_hero(&overrides, &mut seen_ids));
        }
        remaining = remaining.saturating_sub(sections.len());

        pages.push(Page {
            path,
            name,
            sections,
        });
    }

    if pages.is_empty() {
        let mut seen_ids = HashSet::new();
        pages.push(Page {
            path: "/".to_string(),
            name: "Page 1".to_string(),
            sections: vec![synthetic_hero(&overrides, &mut seen_ids)],
        });
    }

    pages
}

fn synthetic_hero(overrides: &HashMap<String, Align>, seen_ids: &mut HashSet<String>) -> Section {
    let raw = BlueprintSection::new("hero", "hero", "Introduce the site with a clear headline and call to action");
    normalize_section(&raw, 0, overrides, seen_ids)
}

/// Normalize one section. `seen_ids` holds ids already used on the page.
pub fn normalize_section(
    raw: &BlueprintSection,
    index: usize,
    overrides: &HashMap<String, Align>,
    seen_ids: &mut HashSet<String>,
) -> Section {
    let section_type = raw
        .section_type
        .as_deref()
        .map(slugify)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "section".to_string());

    let base_id = raw
        .id
        .as_deref()
        .map(slugify)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| slugify(&format!("{} {}", section_type, index + 1)));
    let id = unique_id(base_id, seen_ids);

    let intent = raw
        .intent
        .clone()
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| format!("{} section", section_type.replace('-', " ")));

    let hint = PartialHint::from_raw(raw.layout_hint.as_ref());
    let preset = resolve_preset(&id, &section_type, &intent, &hint);

    let mut layout_hint = LayoutHint {
        structure: hint.structure.unwrap_or(preset.structure),
        density: hint.density.unwrap_or(preset.density),
        align: hint.align.unwrap_or(preset.align),
        align_locked: false,
        media: hint.media.unwrap_or(preset.media),
        list: hint.list.or(preset.list),
        composition_preset: preset.id.to_string(),
    };

    if let Some(align) = overrides
        .get(&id)
        .or_else(|| overrides.get(&section_type))
        .copied()
    {
        layout_hint.align = align;
        layout_hint.align_locked = true;
    }

    Section {
        id,
        section_type,
        intent,
        props_hints: raw.props_hints.clone(),
        layout_hint,
    }
}

fn unique_id(base: String, seen: &mut HashSet<String>) -> String {
    let mut candidate = base.clone();
    let mut suffix = 2;
    while seen.contains(&candidate) {
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    seen.insert(candidate.clone());
    candidate
}

fn page_path(raw: Option<&str>, page_index: usize, used: &mut HashSet<String>) -> String {
    let default = if page_index == 0 {
        "/".to_string()
    } else {
        format!("/page-{}", page_index + 1)
    };
    let mut candidate = match raw.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) if p.starts_with('/') => p.to_string(),
        Some(p) => format!("/{}", p),
        None => default.clone(),
    };
    if used.contains(&candidate) {
        candidate = default.clone();
    }
    let mut suffix = 2;
    while used.contains(&candidate) {
        candidate = format!("{}-{}", default.trim_end_matches('/'), suffix);
        suffix += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Lowercase ASCII slug. Accents are folded, other separators collapse to `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.nfkd() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if is_combining_mark(c) || (!c.is_ascii() && c.is_alphanumeric()) {
            continue;
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Title-case a slug for display: `whats-new` becomes `Whats New`.
pub fn humanize(slug: &str) -> String {
    slug.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Section alignment overrides declared by the theme contract, keyed by
/// lowercased section id or type.
pub fn align_overrides(theme: &Value) -> HashMap<String, Align> {
    let source = theme
        .pointer("/contract/layoutRules/sectionAlignOverrides")
        .or_else(|| theme.pointer("/layoutRules/sectionAlignOverrides"));
    let Some(Value::Object(map)) = source else {
        return HashMap::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let align = parse_align(value.as_str()?)?;
            Some((key.trim().to_lowercase(), align))
        })
        .collect()
}

struct SectionFacts<'a> {
    id: &'a str,
    intent: &'a str,
    hint: &'a PartialHint,
}

struct UpgradeRule {
    from: &'static [&'static str],
    when: fn(&SectionFacts<'_>) -> bool,
    to: &'static str,
}

static CAROUSEL_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(scenes?|tabs?|carousel|slider|slides?)\b").expect("valid regex")
});
static MARQUEE_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)marquee|ticker|scrolling").expect("valid regex"));
static BENTO_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)bento").expect("valid regex"));

const UPGRADE_RULES: &[UpgradeRule] = &[
    UpgradeRule {
        from: &["G01", "G02"],
        when: |f| CAROUSEL_WORDS.is_match(f.id) || CAROUSEL_WORDS.is_match(f.intent),
        to: "G03",
    },
    UpgradeRule {
        from: &["H01"],
        when: |f| f.hint.structure == Some(Structure::Split),
        to: "H02",
    },
    UpgradeRule {
        from: &["H01"],
        when: |f| f.hint.media == Some(Media::Video),
        to: "H03",
    },
    UpgradeRule {
        from: &["F01", "F03"],
        when: |f| {
            BENTO_WORDS.is_match(f.id)
                || BENTO_WORDS.is_match(f.intent)
                || f.hint.structure_raw.as_deref() == Some("bento")
        },
        to: "F04",
    },
    UpgradeRule {
        from: &["T01"],
        when: |f| MARQUEE_WORDS.is_match(f.intent),
        to: "T03",
    },
    UpgradeRule {
        from: &["L01"],
        when: |f| MARQUEE_WORDS.is_match(f.intent) || f.hint.structure == Some(Structure::Carousel),
        to: "L02",
    },
    UpgradeRule {
        from: &["Q01"],
        when: |f| f.hint.structure == Some(Structure::Split),
        to: "Q02",
    },
];

fn resolve_preset(
    id: &str,
    section_type: &str,
    intent: &str,
    hint: &PartialHint,
) -> &'static CompositionPreset {
    let explicit = hint
        .preset
        .as_deref()
        .and_then(presets::preset_by_id)
        .filter(|preset| preset.applies_to(section_type));

    let mut preset = match explicit {
        Some(preset) => preset,
        None => {
            let key = if section_type == "section" { id } else { section_type };
            presets::preset_by_id(presets::preset_for_type(key)).unwrap_or(presets::default_preset())
        }
    };

    let facts = SectionFacts { id, intent, hint };
    for rule in UPGRADE_RULES {
        if rule.from.contains(&preset.id) && (rule.when)(&facts) {
            if let Some(upgraded) = presets::preset_by_id(rule.to) {
                preset = upgraded;
            }
        }
    }
    preset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlueprintPage, RawLayoutHint};
    use serde_json::json;

    fn page(path: Option<&str>, ids: &[&str]) -> BlueprintPage {
        BlueprintPage {
            path: path.map(str::to_string),
            name: None,
            sections: ids
                .iter()
                .map(|id| BlueprintSection::new(id, "features", "stuff"))
                .collect(),
        }
    }

    fn ids(page: &Page) -> Vec<&str> {
        page.sections.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_single_page_keeps_first_per_page_budget() {
        let blueprint = Blueprint {
            pages: vec![page(None, &["a", "b", "c", "d", "e", "f", "g"])],
            ..Default::default()
        };
        let pages = normalize_pages(&blueprint, &SiteLimits::new(3, 3, 5));
        assert_eq!(pages.len(), 1);
        assert_eq!(ids(&pages[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_total_budget_is_page_first() {
        let blueprint = Blueprint {
            pages: vec![
                page(None, &["a", "b", "c", "d"]),
                page(Some("about"), &["e", "f", "g"]),
                page(None, &["h", "i"]),
                page(None, &["j"]),
            ],
            ..Default::default()
        };
        let pages = normalize_pages(&blueprint, &SiteLimits::new(3, 3, 5));
        assert_eq!(pages.len(), 3);
        assert_eq!(ids(&pages[0]), vec!["a", "b", "c"]);
        assert_eq!(ids(&pages[1]), vec!["e", "f"]);
        assert!(pages[2].sections.is_empty());
        assert_eq!(pages[1].path, "/about");
        assert_eq!(pages[2].path, "/page-3");
        assert_eq!(pages[2].name, "Page 3");
    }

    #[test]
    fn test_first_page_gets_synthetic_hero_when_empty() {
        let blueprint = Blueprint {
            pages: vec![page(None, &[]), page(None, &["x"])],
            ..Default::default()
        };
        let pages = normalize_pages(&blueprint, &SiteLimits::default());
        assert_eq!(ids(&pages[0]), vec!["hero"]);
        assert_eq!(pages[0].sections[0].layout_hint.composition_preset, "H01");
    }

    #[test]
    fn test_ids_are_slugged_unique_and_generated() {
        let mut raw = page(None, &["Über Uns!", "über-uns", "", "  "]);
        raw.sections[2].id = None;
        let blueprint = Blueprint {
            pages: vec![raw],
            ..Default::default()
        };
        let pages = normalize_pages(&blueprint, &SiteLimits::default());
        assert_eq!(ids(&pages[0]), vec!["uber-uns", "uber-uns-2", "features-3", "features-4"]);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Hello, World  "), "hello-world");
        assert_eq!(slugify("Café Crème"), "cafe-creme");
        assert_eq!(slugify("what's_new"), "what-s-new");
        assert_eq!(slugify("日本"), "");
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("whats-new"), "Whats New");
        assert_eq!(humanize("case_studies"), "Case Studies");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_align_override_is_locked() {
        let mut hero = BlueprintSection::new("Hero", "hero", "intro");
        hero.layout_hint = Some(RawLayoutHint {
            align: Some("left".into()),
            ..Default::default()
        });
        let blueprint = Blueprint {
            theme: json!({"contract": {"layoutRules": {"sectionAlignOverrides": {"HERO": "centered"}}}}),
            pages: vec![BlueprintPage {
                path: None,
                name: None,
                sections: vec![hero, BlueprintSection::new("faq", "faq", "q")],
            }],
            ..Default::default()
        };
        let pages = normalize_pages(&blueprint, &SiteLimits::default());
        let hint = &pages[0].sections[0].layout_hint;
        assert_eq!(hint.align, Align::Center);
        assert!(hint.align_locked);
        assert!(!pages[0].sections[1].layout_hint.align_locked);
    }

    #[test]
    fn test_explicit_preset_kept_only_when_compatible() {
        let mut compatible = BlueprintSection::new("top", "hero", "intro");
        compatible.layout_hint = Some(RawLayoutHint {
            composition_preset: Some("h05".into()),
            ..Default::default()
        });
        let mut incompatible = BlueprintSection::new("plans", "pricing", "tiers");
        incompatible.layout_hint = Some(RawLayoutHint {
            composition_preset: Some("H05".into()),
            ..Default::default()
        });
        let blueprint = Blueprint {
            pages: vec![BlueprintPage {
                path: None,
                name: None,
                sections: vec![compatible, incompatible],
            }],
            ..Default::default()
        };
        let pages = normalize_pages(&blueprint, &SiteLimits::default());
        assert_eq!(pages[0].sections[0].layout_hint.composition_preset, "H05");
        assert_eq!(pages[0].sections[1].layout_hint.composition_preset, "P01");
    }

    #[test]
    fn test_gallery_mentioning_scenes_becomes_carousel() {
        let section = BlueprintSection::new("showcase", "gallery", "Three product scenes in tabs");
        let blueprint = Blueprint {
            pages: vec![BlueprintPage {
                path: None,
                name: None,
                sections: vec![section],
            }],
            ..Default::default()
        };
        let pages = normalize_pages(&blueprint, &SiteLimits::default());
        let hint = &pages[0].sections[0].layout_hint;
        assert_eq!(hint.composition_preset, "G03");
        assert_eq!(hint.structure, Structure::Carousel);
    }

    #[test]
    fn test_preset_defaults_fill_missing_hint() {
        let mut hero = BlueprintSection::new("hero", "hero", "intro");
        hero.layout_hint = Some(RawLayoutHint {
            structure: Some("two-column".into()),
            ..Default::default()
        });
        let blueprint = Blueprint {
            pages: vec![BlueprintPage {
                path: None,
                name: None,
                sections: vec![hero],
            }],
            ..Default::default()
        };
        let pages = normalize_pages(&blueprint, &SiteLimits::default());
        let hint = &pages[0].sections[0].layout_hint;
        assert_eq!(hint.composition_preset, "H02");
        assert_eq!(hint.structure, Structure::Split);
        assert_eq!(hint.media, Media::Image);
    }

    #[test]
    fn test_duplicate_paths_are_made_unique() {
        let blueprint = Blueprint {
            pages: vec![page(Some("/"), &["a"]), page(Some("/"), &["b"])],
            ..Default::default()
        };
        let pages = normalize_pages(&blueprint, &SiteLimits::default());
        assert_eq!(pages[0].path, "/");
        assert_eq!(pages[1].path, "/page-2");
    }
}
