//! Layered parsing of untrusted model output.
//!
//! Layers, in order: newline-delimited objects, a single (possibly fenced)
//! object, brace-balanced extraction, rule-based JSON repair, and finally regex
//! extraction of the `component` and `block` objects.

use crate::error::SectionError;
use crate::types::{Block, Component};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Outcome of the strict layers.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Valid(T),
    /// Something object-shaped was found but is not valid JSON
    NeedsRepair(String),
    Invalid(String),
}

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n?(.*?)\n?\s*```\s*$").expect("valid regex")
});
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)//[^\n]*$").expect("valid regex"));
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));
static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$-]*)\s*:").expect("valid regex")
});
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));
static PY_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(True|False|None)\b").expect("valid regex"));
static PAYLOAD_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']?\b(component|block)\b["']?\s*:\s*"#).expect("valid regex"));
static NAME_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\\?["']?\bname\b\\?["']?\s*:\s*\\?"((?:[^"\\]|\\[^"])*)\\?""#).expect("valid regex")
});
static CODE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\\?["']?\bcode\b\\?["']?\s*:\s*\\?"(.*?)\\?"(?:\s|,|\}|$)"#)
        .expect("valid regex")
});

/// One repair rule. Rules flagged `outside_strings` only touch text outside
/// double-quoted string literals.
struct RepairRule {
    name: &'static str,
    outside_strings: bool,
    apply: fn(&str) -> String,
}

const REPAIR_RULES: &[RepairRule] = &[
    RepairRule {
        name: "single_to_double_quotes",
        outside_strings: false,
        apply: convert_single_quotes,
    },
    RepairRule {
        name: "strip_block_comments",
        outside_strings: true,
        apply: strip_block_comments,
    },
    RepairRule {
        name: "strip_line_comments",
        outside_strings: true,
        apply: strip_line_comments,
    },
    RepairRule {
        name: "quote_bare_keys",
        outside_strings: true,
        apply: quote_bare_keys,
    },
    RepairRule {
        name: "drop_trailing_commas",
        outside_strings: true,
        apply: drop_trailing_commas,
    },
    RepairRule {
        name: "python_literals",
        outside_strings: true,
        apply: python_literals,
    },
];

fn strip_block_comments(s: &str) -> String {
    BLOCK_COMMENT.replace_all(s, "").into_owned()
}

fn strip_line_comments(s: &str) -> String {
    LINE_COMMENT.replace_all(s, "").into_owned()
}

fn quote_bare_keys(s: &str) -> String {
    UNQUOTED_KEY.replace_all(s, "$1\"$2\":").into_owned()
}

fn drop_trailing_commas(s: &str) -> String {
    TRAILING_COMMA.replace_all(s, "$1").into_owned()
}

fn python_literals(s: &str) -> String {
    PY_LITERAL
        .replace_all(s, |caps: &regex::Captures| match &caps[1] {
            "True" => "true",
            "False" => "false",
            _ => "null",
        })
        .into_owned()
}

/// Split `text` into (inside_string, segment) runs on double-quoted literals.
fn string_segments(text: &str) -> Vec<(bool, &str)> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                segments.push((true, &text[start..=i]));
                start = i + 1;
                in_string = false;
            }
        } else if c == '"' {
            if start < i {
                segments.push((false, &text[start..i]));
            }
            start = i;
            in_string = true;
        }
    }
    if start < text.len() {
        segments.push((in_string, &text[start..]));
    }
    segments
}

fn map_outside_strings(text: &str, apply: fn(&str) -> String) -> String {
    string_segments(text)
        .into_iter()
        .map(|(inside, segment)| {
            if inside {
                segment.to_string()
            } else {
                apply(segment)
            }
        })
        .collect()
}

/// Rewrite single-quoted literals as double-quoted ones, leaving apostrophes
/// inside double-quoted strings alone.
fn convert_single_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in text.chars() {
        match quote {
            None => {
                if c == '\'' {
                    quote = Some('\'');
                    out.push('"');
                } else {
                    if c == '"' {
                        quote = Some('"');
                    }
                    out.push(c);
                }
            }
            Some(q) => {
                if escaped {
                    escaped = false;
                    if q == '\'' && c == '\'' {
                        out.pop();
                        out.push('\'');
                    } else {
                        out.push(c);
                    }
                } else if c == '\\' {
                    escaped = true;
                    out.push(c);
                } else if c == q {
                    quote = None;
                    out.push('"');
                } else if q == '\'' && c == '"' {
                    out.push_str("\\\"");
                } else {
                    out.push(c);
                }
            }
        }
    }
    out
}

/// Run every repair rule in order.
pub fn repair_json(raw: &str) -> String {
    REPAIR_RULES.iter().fold(raw.trim().to_string(), |text, rule| {
        let next = if rule.outside_strings {
            map_outside_strings(&text, rule.apply)
        } else {
            (rule.apply)(&text)
        };
        if next != text {
            tracing::trace!(rule = rule.name, "Applied JSON repair rule");
        }
        next
    })
}

fn strip_code_fence(text: &str) -> &str {
    CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim()
}

/// The first brace-balanced `{...}` starting at or after `from`.
fn balanced_object(text: &str, from: usize) -> Option<&str> {
    let start = from + text.get(from..)?.find('{')?;
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if let Some(q) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn as_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// Merge the first line-object carrying `component` with the first carrying
/// `block`.
fn parse_ndjson(text: &str) -> Option<Value> {
    let objects: Vec<Value> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .filter_map(as_object)
        .collect();
    if objects.len() < 2 {
        return None;
    }
    let component = objects.iter().find_map(|o| o.get("component").cloned());
    let block = objects.iter().find_map(|o| o.get("block").cloned());
    if component.is_none() && block.is_none() {
        return None;
    }
    let mut merged = Map::new();
    if let Some(component) = component {
        merged.insert("component".into(), component);
    }
    if let Some(block) = block {
        merged.insert("block".into(), block);
    }
    Some(Value::Object(merged))
}

/// Strict layers only: NDJSON, single object, brace-balanced extraction.
pub fn parse_strict(text: &str) -> ParseOutcome<Value> {
    if let Some(value) = parse_ndjson(text) {
        return ParseOutcome::Valid(value);
    }
    let body = strip_code_fence(text);
    if let Some(value) = as_object(body) {
        return ParseOutcome::Valid(value);
    }
    match balanced_object(body, 0) {
        Some(candidate) => match as_object(candidate) {
            Some(value) => ParseOutcome::Valid(value),
            None => ParseOutcome::NeedsRepair(candidate.to_string()),
        },
        None => match body.find('{') {
            Some(start) => ParseOutcome::NeedsRepair(body[start..].to_string()),
            None => ParseOutcome::Invalid("no JSON object in response".to_string()),
        },
    }
}

/// Every layer, including repair and regex extraction.
pub fn parse_lenient(text: &str) -> Option<Value> {
    match parse_strict(text) {
        ParseOutcome::Valid(value) => Some(value),
        ParseOutcome::NeedsRepair(raw) => {
            as_object(&repair_json(&raw)).or_else(|| extract_payload_objects(text))
        }
        ParseOutcome::Invalid(_) => None,
    }
}

/// Locate `component: {...}` and `block: {...}` anywhere in the text.
fn extract_payload_objects(text: &str) -> Option<Value> {
    let mut merged = Map::new();
    for caps in PAYLOAD_KEY.captures_iter(text) {
        let (Some(key), Some(whole)) = (caps.get(1), caps.get(0)) else {
            continue;
        };
        if merged.contains_key(key.as_str()) {
            continue;
        }
        let rest = &text[whole.end()..];
        if !rest.starts_with('{') {
            continue;
        }
        let Some(candidate) = balanced_object(text, whole.end()) else {
            continue;
        };
        let parsed = as_object(candidate).or_else(|| as_object(&repair_json(candidate)));
        if let Some(value) = parsed {
            merged.insert(key.as_str().to_string(), value);
        }
    }
    (!merged.is_empty()).then_some(Value::Object(merged))
}

/// Schema-checked builder output.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionPayload {
    pub component: Component,
    pub block: Block,
}

impl SectionPayload {
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let component = match value.get("component") {
            Some(Value::Object(_)) => component_from_object(&value["component"])?,
            Some(Value::String(raw)) => component_from_string(raw)?,
            _ => return Err("missing component".to_string()),
        };
        let block = match value.get("block") {
            Some(Value::Object(map)) => {
                let block_type = map
                    .get("type")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or("block.type is missing")?;
                let props = map
                    .get("props")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                Block::new(block_type, props)
            }
            _ => return Err("missing block".to_string()),
        };
        Ok(Self { component, block })
    }
}

fn component_from_object(value: &Value) -> Result<Component, String> {
    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    let name = text("name").ok_or("component.name is missing")?;
    let code = text("code").ok_or("component.code is missing")?;
    Ok(Component {
        name: name.trim().to_string(),
        code,
        default_props: value.get("defaultProps").filter(|v| v.is_object()).cloned(),
    })
}

/// A component that arrived as a JSON string. Re-parse it; failing that, pull
/// `name` and `code` out with regexes.
fn component_from_string(raw: &str) -> Result<Component, String> {
    if let Some(value) = parse_lenient(raw) {
        if let Ok(component) = component_from_object(&value) {
            return Ok(component);
        }
    }
    let name = NAME_FIELD
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| unescape(m.as_str()))
        .filter(|s| !s.trim().is_empty())
        .ok_or("component string has no name")?;
    let code = CODE_FIELD
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| unescape(m.as_str()))
        .filter(|s| !s.trim().is_empty())
        .ok_or("component string has no code")?;
    Ok(Component {
        name,
        code,
        default_props: None,
    })
}

fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.replace("\\\"", "\""))
}

/// Full pipeline from response text to a schema-checked payload.
pub fn parse_section_payload(text: &str) -> Result<SectionPayload, SectionError> {
    let value = match parse_strict(text) {
        ParseOutcome::Valid(value) => value,
        ParseOutcome::NeedsRepair(raw) => as_object(&repair_json(&raw))
            .or_else(|| extract_payload_objects(text))
            .ok_or_else(|| SectionError::Parse("unrepairable JSON".to_string()))?,
        ParseOutcome::Invalid(reason) => return Err(SectionError::Parse(reason)),
    };
    match SectionPayload::from_value(&value) {
        Ok(payload) => Ok(payload),
        Err(reason) => extract_payload_objects(text)
            .and_then(|value| SectionPayload::from_value(&value).ok())
            .ok_or(SectionError::Parse(reason)),
    }
}
