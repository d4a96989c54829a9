//! End-to-end pipeline scenarios against a scripted backend.

use std::collections::HashSet;
use std::sync::Arc;

use sitesmith::types::ComponentManifest;

use crate::integration::test_utils::{blueprint_json, fast_settings, generator, ScriptedProvider};

const HOME: &[(&str, &str)] = &[
    ("hero", "hero"),
    ("features", "features"),
    ("pricing", "pricing"),
    ("contact", "contact"),
    ("footer", "footer"),
];

#[tokio::test]
async fn test_happy_path_builds_every_section() {
    let provider = Arc::new(ScriptedProvider::new(blueprint_json(&[("/", HOME)])));
    let output = generator(provider.clone(), fast_settings())
        .generate("A budgeting app for students", &ComponentManifest::default(), None)
        .await;

    assert!(output.errors.is_empty(), "errors: {:?}", output.errors);
    assert_eq!(output.components.len(), 5);
    let content = &output.pages[0].content;
    assert_eq!(content.len(), 6);
    assert_eq!(content[0].block_type, "Navbar");
    let types: Vec<_> = content[1..].iter().map(|b| b.block_type.as_str()).collect();
    assert_eq!(
        types,
        [
            "HeroSection",
            "FeaturesSection",
            "PricingSection",
            "ContactSection",
            "FooterSection"
        ]
    );
    // One planning call plus one call per section
    assert_eq!(provider.calls(), 6);
    assert_eq!(output.theme.contract.voice, "warm");
}

#[tokio::test]
async fn test_cta_sections_build_on_the_first_attempt() {
    let page: &[(&str, &str)] = &[("hero", "hero"), ("newsletter", "newsletter"), ("cta", "cta")];
    let provider = Arc::new(ScriptedProvider::new(blueprint_json(&[("/", page)])));
    let output = generator(provider.clone(), fast_settings())
        .generate("A coffee subscription", &ComponentManifest::default(), None)
        .await;

    assert!(output.errors.is_empty(), "errors: {:?}", output.errors);
    assert_eq!(provider.section_calls_for("newsletter"), 1);
    assert_eq!(provider.section_calls_for("cta"), 1);
    assert_eq!(output.pages[0].content[3].block_type, "CtaSection");
}

#[tokio::test]
async fn test_scenario_c_layout_failures_end_in_fallback() {
    let provider = Arc::new(
        ScriptedProvider::new(blueprint_json(&[("/", HOME)])).with_broken_sections(&["features"]),
    );
    let output = generator(provider.clone(), fast_settings())
        .generate("A budgeting app for students", &ComponentManifest::default(), None)
        .await;

    // Three attempts plus one repair prompt
    assert_eq!(provider.section_calls_for("features"), 4);
    assert_eq!(provider.section_calls_for("hero"), 1);
    assert_eq!(
        output.errors,
        vec!["builder_section_fallback:layout:/:features"]
    );
    let features = &output.pages[0].content[2];
    assert_eq!(features.block_type, "FeatureGrid");
    assert_eq!(features.id(), Some("features"));
    assert_eq!(output.components.len(), 4);
}

#[tokio::test]
async fn test_scenario_d_component_conflict_keeps_first() {
    let provider = Arc::new(
        ScriptedProvider::new(blueprint_json(&[(
            "/",
            &[("hero", "hero"), ("intro", "hero"), ("footer", "footer")],
        )]))
        .with_component_name("hero", "Hero")
        .with_component_name("intro", "Hero"),
    );
    let output = generator(provider, fast_settings())
        .generate("A yoga studio", &ComponentManifest::default(), None)
        .await;

    assert_eq!(output.errors, vec!["builder_component_conflict:Hero"]);
    let heroes: Vec<_> = output.components.iter().filter(|c| c.name == "Hero").collect();
    assert_eq!(heroes.len(), 1);
    assert!(heroes[0].code.ends_with("// hero"));
}

#[tokio::test]
async fn test_block_ids_unique_per_page_across_pages() {
    let provider = Arc::new(ScriptedProvider::new(blueprint_json(&[
        ("/", &[("hero", "hero"), ("hero", "hero"), ("nav", "features")]),
        ("/about", &[("story", "about"), ("team", "team")]),
    ])));
    let output = generator(provider, fast_settings())
        .generate("A design agency", &ComponentManifest::default(), None)
        .await;

    assert_eq!(output.pages.len(), 2);
    for page in &output.pages {
        let ids: Vec<_> = page.content.iter().filter_map(|b| b.id()).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len(), "duplicate ids on {}: {:?}", page.path, ids);
        assert_eq!(page.content[0].block_type, "Navbar");
    }
    let about_nav = &output.pages[1].content[0];
    assert_eq!(about_nav.props["pages"][0]["href"], "/");
}

#[tokio::test]
async fn test_unusable_plan_uses_generic_blueprint() {
    let provider = Arc::new(ScriptedProvider::new(serde_json::json!("not a plan")));
    let output = generator(provider, fast_settings())
        .generate("A bakery in Lisbon", &ComponentManifest::default(), None)
        .await;

    let ids: Vec<_> = output.pages[0].content[1..]
        .iter()
        .filter_map(|b| b.id())
        .collect();
    assert_eq!(ids, ["hero", "features", "catalog", "contact", "footer"]);
    assert!(output.errors.is_empty(), "errors: {:?}", output.errors);
}
