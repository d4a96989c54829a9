//! Deterministic compliance post-processing of generated component source.
//!
//! Each rule pairs a condition on the component with a source transform. Rules
//! run in table order and each sees the output of the previous one.

use crate::guardian::contract::ThemeTokens;
use crate::types::Component;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

/// What a rule may look at besides the source itself.
pub struct ComplianceContext<'a> {
    pub component_name: &'a str,
    pub tokens: &'a ThemeTokens,
}

struct ComplianceRule {
    name: &'static str,
    when: fn(&ComplianceContext<'_>, &str) -> bool,
    apply: fn(&ComplianceContext<'_>, &str) -> String,
}

static BARE_GRID_COLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|[\s"'`])grid-cols-([2-9]|1[0-2])\b"#).expect("valid regex")
});
static MD_GRID_COLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bmd:grid-cols-([3-9]|1[0-2])\b").expect("valid regex"));
static ARBITRARY_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(bg|text|border|ring|from|via|to|fill|stroke)-\[(#[0-9a-fA-F]{3,8})\]")
        .expect("valid regex")
});
static BG_WHITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bbg-white\b").expect("valid regex"));
static TEXT_BLACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btext-black\b").expect("valid regex"));
static SECTION_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<section(\s[^>]*?)?\sclassName=""#).expect("valid regex"));
static GRID_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"className="((?:[^"]*\s)?grid)(\s|")"#).expect("valid regex")
});
static MARQUEE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"from\s+['"](?:react-marquee-slider|react-marquee|fast-marquee|react-fast-marquee/[^'"]+)['"]"#)
        .expect("valid regex")
});
static HERO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)hero|banner|landing").expect("valid regex"));
static GRID_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)feature|catalog|product|grid|card|pricing|service|industr|gallery")
        .expect("valid regex")
});

const RULES: &[ComplianceRule] = &[
    ComplianceRule {
        name: "bare_grid_breakpoints",
        when: |_, code| BARE_GRID_COLS.is_match(code) && !code.contains("md:grid-cols-"),
        apply: upgrade_bare_grid,
    },
    ComplianceRule {
        name: "single_breakpoint_grid",
        when: |_, code| MD_GRID_COLS.is_match(code) && !code.contains("lg:grid-cols-"),
        apply: upgrade_md_grid,
    },
    ComplianceRule {
        name: "literal_token_colors",
        when: |_, code| ARBITRARY_COLOR.is_match(code),
        apply: replace_token_colors,
    },
    ComplianceRule {
        name: "neutral_literals",
        when: |_, code| BG_WHITE.is_match(code) || TEXT_BLACK.is_match(code),
        apply: replace_neutral_literals,
    },
    ComplianceRule {
        name: "hero_min_height",
        when: |ctx, code| HERO_NAME.is_match(ctx.component_name) && !code.contains("min-h-"),
        apply: add_hero_min_height,
    },
    ComplianceRule {
        name: "grid_gap",
        when: |ctx, code| {
            GRID_NAME.is_match(ctx.component_name) && GRID_CLASS.is_match(code) && !code.contains("gap-")
        },
        apply: add_grid_gap,
    },
    ComplianceRule {
        name: "marquee_import",
        when: |_, code| MARQUEE_IMPORT.is_match(code),
        apply: |_, code| {
            MARQUEE_IMPORT
                .replace_all(code, "from \"react-fast-marquee\"")
                .into_owned()
        },
    },
];

fn upgrade_bare_grid(_: &ComplianceContext<'_>, code: &str) -> String {
    BARE_GRID_COLS
        .replace_all(code, |caps: &Captures| {
            let cols: u32 = caps[2].parse().unwrap_or(2);
            if cols >= 3 {
                format!("{}grid-cols-1 md:grid-cols-2 lg:grid-cols-{}", &caps[1], cols)
            } else {
                format!("{}grid-cols-1 md:grid-cols-{}", &caps[1], cols)
            }
        })
        .into_owned()
}

fn upgrade_md_grid(_: &ComplianceContext<'_>, code: &str) -> String {
    MD_GRID_COLS
        .replace_all(code, |caps: &Captures| {
            format!("md:grid-cols-2 lg:grid-cols-{}", &caps[1])
        })
        .into_owned()
}

/// Token name -> utility suffix used in class names.
const TOKEN_CLASSES: &[(&str, &str)] = &[
    ("primary", "primary"),
    ("accent", "accent"),
    ("neutral", "muted"),
    ("bg", "background"),
    ("text", "foreground"),
    ("textSecondary", "muted-foreground"),
];

fn token_value<'a>(tokens: &'a ThemeTokens, name: &str) -> &'a str {
    match name {
        "primary" => &tokens.primary,
        "accent" => &tokens.accent,
        "neutral" => &tokens.neutral,
        "bg" => &tokens.bg,
        "text" => &tokens.text,
        _ => &tokens.text_secondary,
    }
}

/// Literal colors equal to a contract token become that token's class. Other
/// literals are left for the style check.
fn replace_token_colors(ctx: &ComplianceContext<'_>, code: &str) -> String {
    ARBITRARY_COLOR
        .replace_all(code, |caps: &Captures| {
            let hex = &caps[2];
            TOKEN_CLASSES
                .iter()
                .find(|(token, _)| token_value(ctx.tokens, token).eq_ignore_ascii_case(hex))
                .map(|(_, class)| format!("{}-{}", &caps[1], class))
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn replace_neutral_literals(_: &ComplianceContext<'_>, code: &str) -> String {
    let code = BG_WHITE.replace_all(code, "bg-background");
    TEXT_BLACK.replace_all(&code, "text-foreground").into_owned()
}

fn add_hero_min_height(_: &ComplianceContext<'_>, code: &str) -> String {
    SECTION_CLASS
        .replacen(code, 1, |caps: &Captures| format!("{}min-h-[70vh] ", &caps[0]))
        .into_owned()
}

fn add_grid_gap(_: &ComplianceContext<'_>, code: &str) -> String {
    GRID_CLASS
        .replacen(code, 1, |caps: &Captures| {
            format!("className=\"{} gap-6{}", &caps[1], &caps[2])
        })
        .into_owned()
}

/// Run every applicable rule and return the rewritten source.
pub fn apply_compliance(code: &str, ctx: &ComplianceContext<'_>) -> String {
    let mut applied = Vec::new();
    let mut code = code.to_string();
    for rule in RULES {
        if (rule.when)(ctx, &code) {
            code = (rule.apply)(ctx, &code);
            applied.push(rule.name);
        }
    }
    if !applied.is_empty() {
        debug!(component = ctx.component_name, rules = ?applied, "Applied compliance rules");
    }
    code
}

pub fn comply_component(component: Component, tokens: &ThemeTokens) -> Component {
    let code = apply_compliance(
        &component.code,
        &ComplianceContext {
            component_name: &component.name,
            tokens,
        },
    );
    Component { code, ..component }
}
