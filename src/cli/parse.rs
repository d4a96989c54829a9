//! CLI parse: clap types for sitesmith. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sitesmith CLI - prompt-to-site generation
#[derive(Parser)]
#[command(name = "sitesmith")]
#[command(about = "Generate a multi-page marketing site from a natural-language prompt")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and print the generated site as JSON
    Generate {
        /// Site brief
        #[arg(long, conflicts_with = "prompt_file")]
        prompt: Option<String>,
        /// Read the site brief from a file
        #[arg(long)]
        prompt_file: Option<PathBuf>,
        /// Allowed component catalog (JSON)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Checkpoint directory (default: platform data dir)
        #[arg(long)]
        planning_dir: Option<PathBuf>,
        /// Disable checkpointing
        #[arg(long)]
        no_checkpoint: bool,
        /// Run identity; derived from the prompt when omitted
        #[arg(long)]
        request_id: Option<String>,
        /// Section records between checkpoint flushes
        #[arg(long, default_value = "1")]
        batch_size: usize,
        /// Write the result JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the effective configuration (api key masked)
    Config {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// List the composition preset registry
    Presets {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Normalize a blueprint file and print the resulting pages
    Normalize {
        /// Blueprint JSON file
        blueprint: PathBuf,
    },
    /// Print the deterministic fallback block for a section
    FallbackBlock {
        /// Section type
        #[arg(long = "type")]
        section_type: String,
        /// Section id
        #[arg(long)]
        id: String,
    },
}
