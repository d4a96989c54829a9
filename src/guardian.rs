//! Consistency Guardian
//!
//! Owns the shared design contract: normalizes it, derives per-section constraints
//! and creative latitude for the builder, and scores the finished site.

pub mod constraints;
pub mod contract;
pub mod creative;
pub mod postcheck;

pub use constraints::{build_constraints, LayoutPattern, SectionConstraints};
pub use contract::{
    normalize_theme_contract, pre_generate_validation, ContractReport, SiteTheme, ThemeContract,
};
pub use creative::{build_creative_guidance, is_breakout_eligible, CreativeGuidance, Importance};
pub use postcheck::{post_generate_check, PostcheckReport, StunningScore};
