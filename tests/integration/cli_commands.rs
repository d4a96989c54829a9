//! CLI route table against a temporary workspace.

use sitesmith::blueprint::PRESETS;
use sitesmith::cli::{Commands, RunContext};
use tempfile::TempDir;

use crate::integration::test_utils::with_env;

fn context(dir: &TempDir) -> RunContext {
    let xdg = dir.path().join("xdg").display().to_string();
    let home = dir.path().join("home").display().to_string();
    with_env(&[("XDG_CONFIG_HOME", xdg.as_str()), ("HOME", home.as_str())], || {
        RunContext::new(dir.path().to_path_buf(), None).unwrap()
    })
}

#[tokio::test]
async fn test_presets_table_and_json() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let text = ctx
        .execute(&Commands::Presets { format: "text".into() })
        .await
        .unwrap();
    assert!(text.starts_with(&format!("Composition presets ({})", PRESETS.len())));
    assert!(text.contains("H01"));

    let json = ctx
        .execute(&Commands::Presets { format: "json".into() })
        .await
        .unwrap();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(rows.len(), PRESETS.len());
}

#[tokio::test]
async fn test_fallback_block_command() {
    let dir = TempDir::new().unwrap();
    let out = context(&dir)
        .execute(&Commands::FallbackBlock {
            section_type: "faq".into(),
            id: "Common Questions".into(),
        })
        .await
        .unwrap();
    let block: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(block["type"], "Faq");
    assert_eq!(block["props"]["id"], "common-questions");
}

#[tokio::test]
async fn test_normalize_applies_configured_limits() {
    let dir = TempDir::new().unwrap();
    let sections: Vec<_> = ["a", "b", "c", "d", "e", "f", "g"]
        .iter()
        .map(|id| serde_json::json!({ "id": id, "type": "features", "intent": "x" }))
        .collect();
    std::fs::write(
        dir.path().join("bp.json"),
        serde_json::json!({ "pages": [{ "path": "/", "name": "Home", "sections": sections }] }).to_string(),
    )
    .unwrap();

    let out = context(&dir)
        .execute(&Commands::Normalize {
            blueprint: "bp.json".into(),
        })
        .await
        .unwrap();
    let pages: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(pages[0]["sections"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_generate_requires_a_prompt() {
    let dir = TempDir::new().unwrap();
    let err = context(&dir)
        .execute(&Commands::Generate {
            prompt: Some("   ".into()),
            prompt_file: None,
            manifest: None,
            planning_dir: None,
            no_checkpoint: true,
            request_id: None,
            batch_size: 1,
            out: None,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Prompt is empty"));
}

#[tokio::test]
async fn test_config_command_masks_the_api_key() {
    let dir = TempDir::new().unwrap();
    let xdg = dir.path().join("xdg").display().to_string();
    let home = dir.path().join("home").display().to_string();
    let ctx = with_env(
        &[
            ("XDG_CONFIG_HOME", xdg.as_str()),
            ("HOME", home.as_str()),
            ("OPENROUTER_API_KEY", "sk-secret"),
        ],
        || RunContext::new(dir.path().to_path_buf(), None).unwrap(),
    );
    assert_eq!(ctx.config().provider.api_key.as_deref(), Some("sk-secret"));

    let out = ctx
        .execute(&Commands::Config { format: "toml".into() })
        .await
        .unwrap();
    assert!(out.contains("[generation]"));
    assert!(out.contains("section_concurrency = 3"));
    assert!(!out.contains("sk-secret"));
}
