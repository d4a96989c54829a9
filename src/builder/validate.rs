//! Structural validation of a generated component against its section.

use crate::blueprint::presets::{default_preset, preset_by_id};
use crate::error::SectionError;
use crate::types::{Align, Component, ListStyle, Section, Structure};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static IMPORT_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[^'";]*?\s+from\s+)?['"]([^'"]+)['"]"#).expect("valid regex")
});
static REQUIRE_SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex"));
static CLASS_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"className=(?:"([^"]*)"|'([^']*)'|\{`([^`]*)`\})"#).expect("valid regex")
});
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9a-fA-F]{3,8}\b").expect("valid regex"));
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<h[1-6][\s>]").expect("valid regex"));
static HEADINGLESS_TYPES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"footer|nav|logo|marquee|ticker").expect("valid regex"));

/// Module roots generated code may import from.
pub const ALLOWED_IMPORTS: &[&str] = &[
    "react",
    "react-dom",
    "framer-motion",
    "lucide-react",
    "react-fast-marquee",
    "clsx",
];

fn import_allowed(source: &str) -> bool {
    source.starts_with("./")
        || source.starts_with("../")
        || source.starts_with("@/")
        || ALLOWED_IMPORTS
            .iter()
            .any(|root| source == *root || source.starts_with(&format!("{}/", root)))
}

/// Every import must resolve against the allow-list.
pub fn check_imports(code: &str) -> Result<(), SectionError> {
    let sources = IMPORT_SOURCE
        .captures_iter(code)
        .chain(REQUIRE_SOURCE.captures_iter(code))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()));
    for source in sources {
        if !import_allowed(source) {
            return Err(SectionError::Module(source.to_string()));
        }
    }
    Ok(())
}

/// The component must define or export something renderable.
pub fn check_runtime(component: &Component) -> Result<(), SectionError> {
    let code = &component.code;
    let defined = code.contains("export default")
        || code.contains(&format!("function {}", component.name))
        || code.contains(&format!("const {} ", component.name))
        || code.contains(&format!("const {}=", component.name));
    if defined {
        Ok(())
    } else {
        Err(SectionError::Runtime(format!(
            "{} is not defined",
            component.name
        )))
    }
}

/// No literal hex colors may survive in class names.
pub fn check_style(code: &str) -> Result<(), SectionError> {
    for caps in CLASS_ATTR.captures_iter(code) {
        let classes = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        if let Some(hex) = HEX_COLOR.find(classes) {
            return Err(SectionError::Style(format!(
                "literal color {} in className",
                hex.as_str()
            )));
        }
    }
    Ok(())
}

fn class_tokens(code: &str) -> HashSet<&str> {
    code.split(|c: char| c.is_whitespace() || "\"'`{}()<>,;=".contains(c))
        .filter(|token| !token.is_empty())
        .collect()
}

fn has_prefix(tokens: &HashSet<&str>, prefixes: &[&str]) -> bool {
    tokens
        .iter()
        .any(|token| prefixes.iter().any(|prefix| token.starts_with(prefix)))
}

fn align_classes(align: Align) -> &'static [&'static str] {
    match align {
        Align::Start => &["text-left", "text-start", "items-start", "justify-start"],
        Align::Center => &["text-center", "items-center", "justify-center"],
        Align::End => &["text-right", "text-end", "items-end", "justify-end"],
    }
}

const BREAKOUT_PREFIXES: &[&str] = &[
    "bg-gradient",
    "backdrop-blur",
    "shadow-xl",
    "shadow-2xl",
    "ring-",
    "blur-",
    "animate-",
];

const BODY_TYPOGRAPHY: &[&str] = &[
    "text-sm",
    "text-base",
    "text-lg",
    "text-xl",
    "md:text-lg",
    "leading-",
    "text-muted-foreground",
    "prose",
];

/// Entries ending in `-` are prefixes (`rounded-` matches `rounded-2xl`).
/// Compliance widens `md:grid-cols-N` (N >= 3) to `md:grid-cols-2 lg:grid-cols-N`,
/// so the large-breakpoint form satisfies the medium one.
fn preset_class_present(tokens: &HashSet<&str>, class: &str) -> bool {
    if class.ends_with('-') {
        return has_prefix(tokens, &[class]);
    }
    if tokens.contains(class) {
        return true;
    }
    match class.strip_prefix("md:grid-cols-") {
        Some(cols) if cols.parse::<u32>().is_ok_and(|n| n >= 3) => {
            tokens.contains(format!("lg:grid-cols-{}", cols).as_str())
        }
        _ => false,
    }
}

/// Run the layout battery and return every violation.
pub fn layout_issues(code: &str, section: &Section, breakout_eligible: bool) -> Vec<String> {
    let tokens = class_tokens(code);
    let hint = &section.layout_hint;
    let preset = preset_by_id(&hint.composition_preset).unwrap_or_else(default_preset);
    let mut issues = Vec::new();

    if !tokens.iter().any(|t| matches!(*t, "grid" | "flex" | "inline-flex")) {
        issues.push("missing_container:grid_or_flex".to_string());
    }

    match hint.structure {
        Structure::Grid => {
            if !has_prefix(&tokens, &["md:grid-cols-", "lg:grid-cols-"]) {
                issues.push("missing_breakpoint:grid_columns".to_string());
            }
        }
        Structure::Split => {
            if !has_prefix(
                &tokens,
                &["md:grid-cols-", "lg:grid-cols-", "md:flex-row", "lg:flex-row"],
            ) {
                issues.push("missing_breakpoint:split_columns".to_string());
            }
        }
        _ => {}
    }

    let list_layout = matches!(
        hint.list,
        Some(ListStyle::Cards) | Some(ListStyle::Tiles) | Some(ListStyle::Rows)
    );
    let expected = align_classes(hint.align);
    let has_expected = expected.iter().any(|class| tokens.contains(class));
    if hint.align_locked {
        if !has_expected {
            issues.push(format!("align_locked:{}", hint.align.as_str()));
        }
        if hint.align != Align::Center && tokens.contains("text-center") {
            issues.push(format!("align_conflict:{}:text-center", hint.align.as_str()));
        }
    } else if !list_layout && hint.align != Align::Start && !has_expected {
        issues.push(format!("missing_align:{}", hint.align.as_str()));
    }

    for class in preset.required_classes {
        if !preset_class_present(&tokens, class) {
            issues.push(format!("missing_preset_class:{}:{}", preset.id, class));
        }
    }

    if breakout_eligible && !has_prefix(&tokens, BREAKOUT_PREFIXES) && !code.contains("motion.") {
        issues.push("missing_breakout_emphasis".to_string());
    }

    if !has_prefix(&tokens, &["py-", "p-", "pt-", "md:py-", "lg:py-"]) {
        issues.push("missing_shell:padding".to_string());
    }
    if !has_prefix(&tokens, &["max-w-", "container"]) {
        issues.push("missing_shell:container".to_string());
    }
    if !HEADINGLESS_TYPES.is_match(&section.section_type) && !HEADING.is_match(code) {
        issues.push("missing_shell:heading".to_string());
    }
    if !has_prefix(&tokens, BODY_TYPOGRAPHY) {
        issues.push("missing_shell:body_text".to_string());
    }

    issues
}

/// Module, runtime, layout and style checks, in that order.
pub fn validate_component(
    component: &Component,
    section: &Section,
    breakout_eligible: bool,
) -> Result<(), SectionError> {
    check_imports(&component.code)?;
    check_runtime(component)?;
    let issues = layout_issues(&component.code, section, breakout_eligible);
    if !issues.is_empty() {
        return Err(SectionError::Layout(issues));
    }
    check_style(&component.code)
}
