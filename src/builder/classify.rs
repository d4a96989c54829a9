//! Maps attempt failures onto the section failure taxonomy.

use crate::error::{GatewayError, SectionError};
use crate::types::FailureType;
use regex::Regex;
use std::sync::LazyLock;

/// Message patterns checked in order when the error variant alone is not
/// conclusive.
static MESSAGE_RULES: LazyLock<Vec<(Regex, FailureType)>> = LazyLock::new(|| {
    [
        (r"(?i)rate.?limit|too many requests|quota", FailureType::RateLimit),
        (
            r"(?i)network|econn|etimedout|socket|fetch failed|connection|timed? ?out|dns",
            FailureType::Network,
        ),
        (r"(?i)cannot find module|failed to resolve import|module not found", FailureType::Module),
        (
            r"(?i)typeerror|referenceerror|is not defined|is not a function|cannot read propert",
            FailureType::Runtime,
        ),
        (r"(?i)json|unexpected token|unexpected end|parse", FailureType::Parse),
        (r"(?i)layout|grid|breakpoint", FailureType::Layout),
        (r"(?i)color|style|token", FailureType::Style),
    ]
    .into_iter()
    .map(|(pattern, failure)| (Regex::new(pattern).expect("valid regex"), failure))
    .collect()
});

pub fn classify_message(message: &str) -> FailureType {
    MESSAGE_RULES
        .iter()
        .find(|(re, _)| re.is_match(message))
        .map(|(_, failure)| *failure)
        .unwrap_or(FailureType::Unknown)
}

fn classify_gateway(err: &GatewayError) -> FailureType {
    if err.status == Some(429) || err.name == "rate_limit" {
        return FailureType::RateLimit;
    }
    if matches!(err.name.as_str(), "connection_error" | "timeout") {
        return FailureType::Network;
    }
    if let Some(code) = err.code.as_deref() {
        let by_code = classify_message(code);
        if by_code != FailureType::Unknown {
            return by_code;
        }
    }
    classify_message(&err.message)
}

pub fn classify_failure(err: &SectionError) -> FailureType {
    match err {
        SectionError::Parse(_) | SectionError::EmptyResponse => FailureType::Parse,
        SectionError::Layout(_) => FailureType::Layout,
        SectionError::Style(_) => FailureType::Style,
        SectionError::Module(_) => FailureType::Module,
        SectionError::Runtime(_) => FailureType::Runtime,
        SectionError::Gateway(gateway) => classify_gateway(gateway),
    }
}

/// Failures worth backing off for before the next attempt.
pub fn is_transient(failure: FailureType) -> bool {
    matches!(failure, FailureType::RateLimit | FailureType::Network)
}

/// Failures the final repair prompt can plausibly fix.
pub fn is_repairable(failure: FailureType) -> bool {
    matches!(failure, FailureType::Parse | FailureType::Layout)
}
