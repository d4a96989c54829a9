//! Post-generation consistency scan and the aggregate "stunning" score.

use crate::types::{Component, SitePage};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

static LITERAL_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(#[0-9a-f]{3,8}|rgba?\(.*\)|hsla?\(.*\))\s*$").expect("valid regex")
});
static PIXEL_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*(px)?\s*$").expect("valid regex"));
static SPACING_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)padding|margin|gap|spacing|space").expect("valid regex"));
static URL_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)src|href|url|image|icon|alt").expect("valid regex"));

const VALID_ALIGN: &[&str] = &["start", "center", "end", "left", "right"];
const VALID_MAX_WIDTH: &[&str] = &[
    "sm", "md", "lg", "xl", "2xl", "3xl", "4xl", "5xl", "6xl", "7xl", "full", "prose",
    "screen", "container",
];

/// One signal family and the source markers that count as evidence for it.
struct Signal {
    name: &'static str,
    weight: f32,
    markers: &'static [&'static str],
    suggestion: &'static str,
}

const SIGNALS: &[Signal] = &[
    Signal {
        name: "animation",
        weight: 0.3,
        markers: &["motion.", "animate-", "transition", "whileInView"],
        suggestion: "Add entrance motion (fade/slide on scroll) to more sections",
    },
    Signal {
        name: "texture",
        weight: 0.2,
        markers: &["bg-gradient", "backdrop-blur", "bg-[url", "shadow-", "ring-"],
        suggestion: "Introduce depth with gradients, soft shadows or glass panels",
    },
    Signal {
        name: "interaction",
        weight: 0.25,
        markers: &["hover:", "group-hover", "onClick", "focus-visible:"],
        suggestion: "Give cards and buttons hover and focus states",
    },
    Signal {
        name: "whitespace",
        weight: 0.25,
        markers: &["py-16", "py-20", "py-24", "py-32", "gap-8", "gap-10", "gap-12", "space-y-8", "space-y-12"],
        suggestion: "Open up vertical rhythm with larger section padding and gaps",
    },
];

const LOW_SUB_SCORE: f32 = 0.5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StunningScore {
    /// 0 to 100
    pub total: u32,
    pub animation: f32,
    pub texture: f32,
    pub interaction: f32,
    pub whitespace: f32,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostcheckReport {
    pub issues: Vec<String>,
    pub score: StunningScore,
}

/// Scan assembled pages; `sections` holds the component each section renders
/// with (`None` for fallback blocks). Issues are recorded, never fatal.
pub fn post_generate_check(pages: &[SitePage], sections: &[Option<&Component>]) -> PostcheckReport {
    let mut issues = Vec::new();
    for page in pages {
        for block in &page.content {
            let block_id = block.id().unwrap_or(block.block_type.as_str()).to_string();
            for (key, value) in &block.props {
                scan_value(&page.path, &block_id, key, value, &mut issues);
            }
        }
    }
    PostcheckReport {
        issues,
        score: stunning_score(sections),
    }
}

fn scan_value(page: &str, block: &str, key: &str, value: &Value, issues: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                scan_value(page, block, k, v, issues);
            }
        }
        Value::Array(items) => {
            for item in items {
                scan_value(page, block, key, item, issues);
            }
        }
        _ => check_leaf(page, block, key, value, issues),
    }
}

fn check_leaf(page: &str, block: &str, key: &str, value: &Value, issues: &mut Vec<String>) {
    let location = format!("{}:{}:{}", page, block, key);

    if SPACING_KEY.is_match(key) {
        let numeric = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => PIXEL_VALUE
                .captures(s)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok()),
            _ => None,
        };
        if let Some(n) = numeric {
            if n.fract() != 0.0 || (n as i64) % 4 != 0 {
                issues.push(format!("spacing_not_multiple_of_4:{}={}", location, n));
            }
        }
    }

    if let Value::String(s) = value {
        if !URL_KEY.is_match(key) && LITERAL_COLOR.is_match(s) {
            issues.push(format!("literal_color:{}={}", location, s.trim()));
        }
        if key == "align" && !VALID_ALIGN.contains(&s.trim().to_lowercase().as_str()) {
            issues.push(format!("invalid_align:{}={}", location, s));
        }
        if key == "maxWidth" {
            let width = s.trim().trim_start_matches("max-w-").to_lowercase();
            if !VALID_MAX_WIDTH.contains(&width.as_str()) && !width.starts_with("screen-") {
                issues.push(format!("invalid_max_width:{}={}", location, s));
            }
        }
    }
}

/// Prevalence of each signal across sections, weighted into 0..100. Fallback
/// sections count toward the total but never as a hit.
pub fn stunning_score(sections: &[Option<&Component>]) -> StunningScore {
    let mut score = StunningScore::default();
    let total = sections.len();
    let mut weighted = 0.0_f32;

    for signal in SIGNALS {
        let hits = sections
            .iter()
            .flatten()
            .filter(|c| signal.markers.iter().any(|m| c.code.contains(m)))
            .count();
        let ratio = if total == 0 {
            0.0
        } else {
            hits as f32 / total as f32
        };
        weighted += ratio * signal.weight;
        match signal.name {
            "animation" => score.animation = ratio,
            "texture" => score.texture = ratio,
            "interaction" => score.interaction = ratio,
            _ => score.whitespace = ratio,
        }
        if ratio < LOW_SUB_SCORE {
            score.suggestions.push(signal.suggestion.to_string());
        }
    }

    score.total = (weighted * 100.0).round().clamp(0.0, 100.0) as u32;
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Block;
    use serde_json::json;

    fn page_with(props: Value) -> SitePage {
        let props = props.as_object().cloned().unwrap_or_default();
        SitePage {
            path: "/".to_string(),
            name: "Home".to_string(),
            content: vec![Block::new("Hero", props)],
        }
    }

    fn component(code: &str) -> Component {
        Component {
            name: "X".to_string(),
            code: code.to_string(),
            default_props: None,
        }
    }

    #[test]
    fn test_flags_spacing_colors_and_enums() {
        let page = page_with(json!({
            "id": "hero",
            "padding": 18,
            "style": { "gap": "24px", "marginTop": "10px" },
            "background": "#ff0000",
            "imageUrl": "#anchor",
            "align": "diagonal",
            "maxWidth": "9xl"
        }));
        let report = post_generate_check(&[page], &[]);
        let issues = report.issues.join("\n");
        assert!(issues.contains("spacing_not_multiple_of_4:/:hero:padding=18"));
        assert!(issues.contains("spacing_not_multiple_of_4:/:hero:marginTop=10"));
        assert!(!issues.contains(":gap="));
        assert!(issues.contains("literal_color:/:hero:background=#ff0000"));
        assert!(!issues.contains("imageUrl"));
        assert!(issues.contains("invalid_align"));
        assert!(issues.contains("invalid_max_width"));
    }

    #[test]
    fn test_clean_block_has_no_issues() {
        let page = page_with(json!({ "id": "hero", "padding": 16, "align": "center", "maxWidth": "7xl" }));
        assert!(post_generate_check(&[page], &[]).issues.is_empty());
    }

    #[test]
    fn test_stunning_score() {
        let rich = component(
            r#"<motion.section className="py-24 bg-gradient-to-b hover:shadow-lg">"#,
        );
        let plain = component(r#"<section className="p-4">"#);
        let score = stunning_score(&[Some(&rich), Some(&rich)]);
        assert_eq!(score.total, 100);
        assert!(score.suggestions.is_empty());

        let score = stunning_score(&[Some(&plain)]);
        assert_eq!(score.total, 0);
        assert_eq!(score.suggestions.len(), SIGNALS.len());

        assert_eq!(stunning_score(&[]).total, 0);
    }

    #[test]
    fn test_stunning_score_counts_every_section() {
        let rich = component(
            r#"<motion.section className="py-24 bg-gradient-to-b hover:shadow-lg">"#,
        );
        let score = stunning_score(&[Some(&rich), None]);
        assert_eq!(score.animation, 0.5);
        assert_eq!(score.total, 50);

        // Two sections sharing one component weigh twice.
        let plain = component(r#"<section className="p-4">"#);
        let score = stunning_score(&[Some(&rich), Some(&rich), Some(&plain), None]);
        assert_eq!(score.texture, 0.5);
        assert_eq!(score.total, 50);
    }
}
