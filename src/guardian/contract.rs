//! Theme contract normalization and pre-generation validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeTokens {
    pub primary: String,
    pub accent: String,
    pub neutral: String,
    pub bg: String,
    pub text: String,
    pub text_secondary: String,
    /// Any additional tokens the planner supplied
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRules {
    pub columns: u32,
    pub gap: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRules {
    pub max_width: String,
    pub section_padding: String,
    pub grid: GridRules,
    /// Section id or type -> alignment
    pub section_align_overrides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionRules {
    pub level: String,
    pub duration_ms: u32,
    pub easing: String,
    pub presets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakoutBudget {
    /// Section ids or types allowed extra emphasis
    pub allowed_sections: Vec<String>,
    pub color_boost: f64,
    pub motion_boost: f64,
    pub layout_variants: u32,
}

/// Normalized design contract. Every field is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeContract {
    pub voice: String,
    pub tokens: ThemeTokens,
    pub layout_rules: LayoutRules,
    pub motion_rules: MotionRules,
    pub breakout_budget: BreakoutBudget,
}

impl Default for ThemeContract {
    fn default() -> Self {
        Self {
            voice: "confident".to_string(),
            tokens: ThemeTokens {
                primary: "#2563eb".to_string(),
                accent: "#f59e0b".to_string(),
                neutral: "#64748b".to_string(),
                bg: "#ffffff".to_string(),
                text: "#0f172a".to_string(),
                text_secondary: "#475569".to_string(),
                extra: Map::new(),
            },
            layout_rules: LayoutRules {
                max_width: "7xl".to_string(),
                section_padding: "py-16 md:py-24".to_string(),
                grid: GridRules {
                    columns: 12,
                    gap: "gap-6".to_string(),
                },
                section_align_overrides: BTreeMap::new(),
            },
            motion_rules: MotionRules {
                level: "subtle".to_string(),
                duration_ms: 400,
                easing: "easeOut".to_string(),
                presets: vec![
                    "fadeUp".to_string(),
                    "fadeIn".to_string(),
                    "staggerChildren".to_string(),
                ],
            },
            breakout_budget: BreakoutBudget {
                allowed_sections: vec!["hero".to_string()],
                color_boost: 0.2,
                motion_boost: 0.3,
                layout_variants: 1,
            },
        }
    }
}

/// Overlay `overlay` onto `base`. Objects merge recursively; a leaf replaces the
/// base only when it has the same JSON kind, so defaults keep their shape.
fn deep_merge(base: &mut Value, overlay: &Value) {
    if let (Value::Object(base_map), Value::Object(overlay_map)) = (&mut *base, overlay) {
        for (key, value) in overlay_map {
            match base_map.get_mut(key) {
                Some(existing) => deep_merge(existing, value),
                None if !value.is_null() => {
                    base_map.insert(key.clone(), value.clone());
                }
                None => {}
            }
        }
        return;
    }
    if same_kind(base, overlay) {
        *base = overlay.clone();
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::String(_), Value::String(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Array(_), Value::Array(_))
    )
}

/// Deep-merge a caller-supplied contract over the defaults. Idempotent.
pub fn normalize_theme_contract(raw: &Value) -> ThemeContract {
    let mut merged = match serde_json::to_value(ThemeContract::default()) {
        Ok(value) => value,
        Err(_) => return ThemeContract::default(),
    };
    deep_merge(&mut merged, raw);
    match serde_json::from_value(merged) {
        Ok(contract) => contract,
        Err(err) => {
            warn!(error = %err, "Theme contract has unusable fields, using defaults");
            ThemeContract::default()
        }
    }
}

/// Outcome of the pre-generation contract check. Never blocks a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContractReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

fn non_empty_str(value: &Value, pointer: &str) -> bool {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}

/// Check the raw contract before defaults paper over gaps, and log the result.
pub fn pre_generate_validation(raw: &Value) -> ContractReport {
    let mut report = ContractReport::default();

    if !non_empty_str(raw, "/voice") {
        report.errors.push("contract.voice is missing".to_string());
    }
    for token in ["primary", "accent"] {
        if !non_empty_str(raw, &format!("/tokens/{}", token)) {
            report
                .errors
                .push(format!("contract.tokens.{} is missing", token));
        }
    }

    match raw.get("layoutRules") {
        Some(Value::Object(rules)) => {
            for key in ["maxWidth", "sectionPadding", "grid"] {
                if !rules.contains_key(key) {
                    report
                        .warnings
                        .push(format!("contract.layoutRules.{} is not set", key));
                }
            }
        }
        _ => report
            .warnings
            .push("contract.layoutRules is not set".to_string()),
    }
    if !raw.get("motionRules").is_some_and(Value::is_object) {
        report
            .warnings
            .push("contract.motionRules is not set".to_string());
    }

    for error in &report.errors {
        warn!(problem = %error, "Theme contract error");
    }
    for warning in &report.warnings {
        tracing::debug!(problem = %warning, "Theme contract warning");
    }
    report
}

/// Token -> utility classes the builder should use instead of literal colors.
pub const THEME_CLASS_MAP: &[(&str, &[&str])] = &[
    ("primary", &["bg-primary", "text-primary", "border-primary", "text-primary-foreground"]),
    ("accent", &["bg-accent", "text-accent", "border-accent"]),
    ("neutral", &["bg-muted", "border-border"]),
    ("bg", &["bg-background"]),
    ("text", &["text-foreground"]),
    ("textSecondary", &["text-muted-foreground"]),
];

pub fn theme_class_map_text() -> String {
    THEME_CLASS_MAP
        .iter()
        .map(|(token, classes)| format!("- {}: {}", token, classes.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Typed view of the blueprint theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteTheme {
    pub mode: String,
    pub radius: String,
    pub font_heading: String,
    pub font_body: String,
    pub motion: String,
    pub contract: ThemeContract,
}

impl SiteTheme {
    pub fn from_value(theme: &Value) -> Self {
        let field = |key: &str, default: &str| {
            theme
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let contract_raw = theme.get("contract").cloned().unwrap_or(Value::Null);
        Self {
            mode: field("mode", "light"),
            radius: field("radius", "lg"),
            font_heading: field("fontHeading", "Inter"),
            font_body: field("fontBody", "Inter"),
            motion: field("motion", "subtle"),
            contract: normalize_theme_contract(&contract_raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_contract_gets_defaults() {
        let contract = normalize_theme_contract(&json!({}));
        assert_eq!(contract, ThemeContract::default());
        assert_eq!(normalize_theme_contract(&Value::Null), ThemeContract::default());
    }

    #[test]
    fn test_partial_contract_merges_deeply() {
        let contract = normalize_theme_contract(&json!({
            "voice": "playful",
            "tokens": { "primary": "#ff0066", "brandGlow": "#ffee00" },
            "layoutRules": { "grid": { "gap": "gap-8" }, "sectionAlignOverrides": { "hero": "center" } }
        }));
        assert_eq!(contract.voice, "playful");
        assert_eq!(contract.tokens.primary, "#ff0066");
        assert_eq!(contract.tokens.accent, "#f59e0b");
        assert_eq!(contract.tokens.extra.get("brandGlow"), Some(&json!("#ffee00")));
        assert_eq!(contract.layout_rules.grid.gap, "gap-8");
        assert_eq!(contract.layout_rules.grid.columns, 12);
        assert_eq!(
            contract.layout_rules.section_align_overrides.get("hero").map(String::as_str),
            Some("center")
        );
    }

    #[test]
    fn test_wrong_kinds_are_ignored() {
        let contract = normalize_theme_contract(&json!({
            "voice": 42,
            "tokens": "red",
            "motionRules": { "durationMs": "fast" }
        }));
        assert_eq!(contract.voice, "confident");
        assert_eq!(contract.tokens.primary, "#2563eb");
        assert_eq!(contract.motion_rules.duration_ms, 400);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_theme_contract(&json!({
            "voice": "luxury",
            "tokens": { "accent": "#111111", "extraToken": "#222222" },
            "breakoutBudget": { "allowedSections": ["hero", "pricing"] }
        }));
        let twice = normalize_theme_contract(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_pre_generate_validation() {
        let report = pre_generate_validation(&json!({ "tokens": { "primary": "#000000" } }));
        assert_eq!(
            report.errors,
            vec![
                "contract.voice is missing".to_string(),
                "contract.tokens.accent is missing".to_string()
            ]
        );
        assert_eq!(report.warnings.len(), 2);

        let report = pre_generate_validation(&serde_json::to_value(ThemeContract::default()).unwrap());
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_site_theme_from_value() {
        let theme = SiteTheme::from_value(&json!({ "mode": "dark", "contract": { "voice": "minimal" } }));
        assert_eq!(theme.mode, "dark");
        assert_eq!(theme.font_body, "Inter");
        assert_eq!(theme.contract.voice, "minimal");
    }
}
