//! CLI domain: parse, route and presentation only.
//! No pipeline logic; the route table dispatches to library services.

mod parse;
mod presentation;
mod route;

pub use parse::{Cli, Commands};
pub use presentation::{format_config, format_generation_summary, format_preset_table};
pub use route::RunContext;
