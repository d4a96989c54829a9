//! Sitesmith: Prompt-to-Site Generation
//!
//! Turns a natural-language prompt into a multi-page marketing site. An
//! architect call plans the site, the normalizer bounds it, a worker pool builds
//! every section under a shared design contract, and assembly merges the results
//! into renderable pages. Every model failure degrades to deterministic content.

pub mod architect;
pub mod assembly;
pub mod blueprint;
pub mod builder;
pub mod cache;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guardian;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod template;
pub mod types;

pub use pipeline::{GenerationOutput, SiteGenerator};
