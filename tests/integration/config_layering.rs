//! Configuration layering: defaults, workspace files, then environment.

use sitesmith::config::{ConfigLoader, ProviderType};
use tempfile::TempDir;

use crate::integration::test_utils::with_env;

fn isolated(dir: &TempDir) -> Vec<(&'static str, String)> {
    vec![
        ("XDG_CONFIG_HOME", dir.path().join("xdg").display().to_string()),
        ("HOME", dir.path().join("home").display().to_string()),
    ]
}

fn write_workspace_config(dir: &TempDir, body: &str) {
    let config_dir = dir.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), body).unwrap();
}

#[test]
fn test_defaults_without_any_files() {
    let dir = TempDir::new().unwrap();
    let vars = isolated(&dir);
    let vars: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let config = with_env(&vars, || ConfigLoader::load(dir.path()).unwrap());

    assert_eq!(config.provider.provider_type, ProviderType::OpenRouter);
    assert_eq!(config.generation.section_concurrency, 3);
    assert_eq!(config.generation.max_sections_total, 10);
    assert_eq!(config.logging.output, "stderr");
}

#[test]
fn test_workspace_file_then_environment() {
    let dir = TempDir::new().unwrap();
    write_workspace_config(
        &dir,
        r#"
[provider]
model = "anthropic/claude-sonnet"
fallback_model = "openai/gpt-4o-mini"

[generation]
section_concurrency = 5
max_pages = 2
"#,
    );
    let mut vars = isolated(&dir);
    vars.push(("SITESMITH_SECTION_CONCURRENCY", "7".to_string()));
    vars.push(("OPENROUTER_MODEL", "meta/llama".to_string()));
    let vars: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let config = with_env(&vars, || ConfigLoader::load(dir.path()).unwrap());

    assert_eq!(config.generation.section_concurrency, 7);
    assert_eq!(config.generation.max_pages, 2);
    assert_eq!(config.provider.model, "meta/llama");
    assert_eq!(
        config.provider.fallback_model.as_deref(),
        Some("openai/gpt-4o-mini")
    );
}

#[test]
fn test_primary_env_name_wins_over_alias() {
    let dir = TempDir::new().unwrap();
    let mut vars = isolated(&dir);
    vars.push(("SITESMITH_MODEL", "primary/model".to_string()));
    vars.push(("OPENROUTER_MODEL", "alias/model".to_string()));
    let vars: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let config = with_env(&vars, || ConfigLoader::load(dir.path()).unwrap());
    assert_eq!(config.provider.model, "primary/model");
}

#[test]
fn test_invalid_values_are_collected() {
    let dir = TempDir::new().unwrap();
    write_workspace_config(
        &dir,
        r#"
[provider]
provider_type = "local"

[generation]
section_concurrency = 0

[logging]
format = "yaml"
"#,
    );
    let vars = isolated(&dir);
    let vars: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let config = with_env(&vars, || ConfigLoader::load(dir.path()).unwrap());

    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 3);
    let err = config.validated().unwrap_err().to_string();
    assert!(err.contains("local provider requires an endpoint"));
    assert!(err.contains("section_concurrency"));
}

#[test]
fn test_non_numeric_env_value_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    let mut vars = isolated(&dir);
    vars.push(("SITESMITH_MAX_PAGES", "many".to_string()));
    let vars: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let result = with_env(&vars, || ConfigLoader::load(dir.path()));
    assert!(result.is_err());
}
