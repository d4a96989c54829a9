//! Worker pool concurrency bound.

use std::sync::Arc;
use std::time::Duration;

use sitesmith::types::ComponentManifest;

use crate::integration::test_utils::{blueprint_json, fast_settings, generator, ScriptedProvider};

const SECTIONS: &[(&str, &str)] = &[
    ("hero", "hero"),
    ("features", "features"),
    ("catalog", "catalog"),
    ("stats", "stats"),
    ("faq", "faq"),
    ("contact", "contact"),
    ("footer", "footer"),
];

async fn run_with_pool(size: usize) -> (Arc<ScriptedProvider>, Vec<String>) {
    let provider = Arc::new(
        ScriptedProvider::new(blueprint_json(&[("/", SECTIONS)]))
            .with_delay(Duration::from_millis(25)),
    );
    let mut settings = fast_settings();
    settings.section_concurrency = size;
    settings.max_sections_per_page = 10;
    let output = generator(provider.clone(), settings)
        .generate("A hardware store", &ComponentManifest::default(), None)
        .await;
    let ids = output.pages[0].content[1..]
        .iter()
        .filter_map(|b| b.id().map(str::to_string))
        .collect();
    (provider, ids)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_never_exceeds_its_size() {
    for size in [1, 2, 3] {
        let (provider, _) = run_with_pool(size).await;
        assert!(
            provider.max_in_flight() <= size,
            "pool of {} had {} calls in flight",
            size,
            provider.max_in_flight()
        );
        assert_eq!(provider.section_calls().len(), SECTIONS.len());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_runs_sections_in_parallel() {
    let (provider, _) = run_with_pool(3).await;
    assert!(provider.max_in_flight() > 1);
}

#[tokio::test]
async fn test_output_order_is_blueprint_order() {
    let (_, ids) = run_with_pool(4).await;
    let expected: Vec<_> = SECTIONS.iter().map(|(id, _)| id.to_string()).collect();
    assert_eq!(ids, expected);
}
