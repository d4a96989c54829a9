//! Checkpointed runs resume without rebuilding finished sections.

use std::sync::Arc;

use sitesmith::checkpoint::{CheckpointStore, PlanningOptions, SledCheckpointStore};
use sitesmith::types::ComponentManifest;
use tempfile::TempDir;

use crate::integration::test_utils::{blueprint_json, fast_settings, generator, ScriptedProvider};

const PROMPT: &str = "A coffee roastery with a subscription plan";

const SECTIONS: &[(&str, &str)] = &[
    ("hero", "hero"),
    ("beans", "catalog"),
    ("pricing", "pricing"),
    ("footer", "footer"),
];

fn block_ids(output: &sitesmith::GenerationOutput) -> Vec<String> {
    output
        .pages
        .iter()
        .flat_map(|p| p.content.iter().filter_map(|b| b.id().map(str::to_string)))
        .collect()
}

#[tokio::test]
async fn test_second_run_regenerates_nothing() {
    let dir = TempDir::new().unwrap();
    let manifest = ComponentManifest::default();

    let first = Arc::new(ScriptedProvider::new(blueprint_json(&[("/", SECTIONS)])));
    let out1 = generator(first.clone(), fast_settings())
        .generate(PROMPT, &manifest, Some(PlanningOptions::new(dir.path())))
        .await;
    assert_eq!(first.calls(), 1 + SECTIONS.len());
    assert_eq!(out1.resumed_sections, 0);
    assert!(out1.request_id.is_some());

    let second = Arc::new(ScriptedProvider::new(blueprint_json(&[("/", &[("other", "hero")])])));
    let out2 = generator(second.clone(), fast_settings())
        .generate(PROMPT, &manifest, Some(PlanningOptions::new(dir.path())))
        .await;

    assert_eq!(second.calls(), 0);
    assert_eq!(out2.resumed_sections, SECTIONS.len());
    assert_eq!(out2.request_id, out1.request_id);
    assert_eq!(block_ids(&out1), block_ids(&out2));
    assert_eq!(out1.pages, out2.pages);
    assert_eq!(out1.components, out2.components);
}

#[tokio::test]
async fn test_fallback_sections_are_retried_on_resume() {
    let dir = TempDir::new().unwrap();
    let manifest = ComponentManifest::default();
    let planning = || PlanningOptions::new(dir.path()).with_request_id("roastery");

    let first = Arc::new(
        ScriptedProvider::new(blueprint_json(&[("/", SECTIONS)])).with_broken_sections(&["beans"]),
    );
    let out1 = generator(first, fast_settings())
        .generate(PROMPT, &manifest, Some(planning()))
        .await;
    assert_eq!(out1.errors, vec!["builder_section_fallback:layout:/:beans"]);

    let second = Arc::new(ScriptedProvider::new(blueprint_json(&[("/", SECTIONS)])));
    let out2 = generator(second.clone(), fast_settings())
        .generate(PROMPT, &manifest, Some(planning()))
        .await;
    assert_eq!(second.section_calls(), vec!["beans"]);
    assert!(out2.errors.is_empty(), "errors: {:?}", out2.errors);
    assert_eq!(block_ids(&out1), block_ids(&out2));

    let store = SledCheckpointStore::open(dir.path(), "roastery").unwrap();
    assert_eq!(store.get_completed_section_keys().unwrap().len(), SECTIONS.len());
    assert!(store.phases().unwrap().postcheck_complete);
}

#[tokio::test]
async fn test_small_batches_still_persist_everything() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(blueprint_json(&[("/", SECTIONS)])));
    generator(provider, fast_settings())
        .generate(
            PROMPT,
            &ComponentManifest::default(),
            Some(PlanningOptions::new(dir.path()).with_request_id("batched").with_batch_size(3)),
        )
        .await;

    let store = SledCheckpointStore::open(dir.path(), "batched").unwrap();
    assert!(store.get_blueprint().unwrap().is_some());
    assert_eq!(store.get_section_outputs().unwrap().len(), SECTIONS.len());
}
