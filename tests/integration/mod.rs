//! Integration tests for the sitesmith generation pipeline

mod binary;
mod cli_commands;
mod config_layering;
mod normalizer_budget;
mod pipeline_scenarios;
mod resumability;
mod test_utils;
mod worker_pool;
