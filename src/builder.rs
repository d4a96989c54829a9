//! Section Build Worker Pool
//!
//! Synthesizes every section concurrently. Each section runs its own state
//! machine: request, parse, validate, then ok, retry, repair or fallback.

pub mod classify;
pub mod compliance;
pub mod fallback_block;
pub mod parse;
pub mod prompt;
pub mod validate;
pub mod worker;

pub use classify::classify_failure;
pub use fallback_block::build_deterministic_fallback_block;
pub use parse::{parse_lenient, parse_section_payload, repair_json, ParseOutcome, SectionPayload};
pub use worker::{BuildJob, BuildSettings, SectionBuilder};
