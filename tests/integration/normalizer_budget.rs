//! Blueprint budget invariants.

use proptest::prelude::*;
use sitesmith::blueprint::{normalize_pages, SiteLimits};
use sitesmith::types::{Blueprint, BlueprintPage, BlueprintSection};

fn blueprint(page_sizes: &[usize]) -> Blueprint {
    Blueprint {
        design_north_star: None,
        theme: serde_json::Value::Null,
        pages: page_sizes
            .iter()
            .enumerate()
            .map(|(p, &n)| BlueprintPage {
                path: Some(if p == 0 { "/".to_string() } else { format!("/p{}", p) }),
                name: Some(format!("Page {}", p)),
                sections: (0..n)
                    .map(|s| BlueprintSection::new(&format!("s{}", s), "features", "x"))
                    .collect(),
            })
            .collect(),
    }
}

#[test]
fn test_scenario_a_single_page_keeps_first_three() {
    let bp = Blueprint {
        pages: vec![BlueprintPage {
            path: Some("/".into()),
            name: Some("Home".into()),
            sections: ["A", "B", "C", "D", "E", "F", "G"]
                .iter()
                .map(|id| BlueprintSection::new(id, "features", "x"))
                .collect(),
        }],
        ..blueprint(&[])
    };
    let pages = normalize_pages(&bp, &SiteLimits::new(3, 3, 5));
    let ids: Vec<_> = pages[0].sections.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

proptest! {
    #[test]
    fn test_budget_invariant(
        page_sizes in prop::collection::vec(0usize..9, 0..6),
        max_pages in 1usize..5,
        per_page in 1usize..6,
        total in 1usize..12,
    ) {
        let limits = SiteLimits::new(max_pages, per_page, total);
        let pages = normalize_pages(&blueprint(&page_sizes), &limits);

        prop_assert!(!pages.is_empty());
        prop_assert!(pages.len() <= max_pages);
        prop_assert!(!pages[0].sections.is_empty());
        for page in &pages {
            prop_assert!(page.sections.len() <= per_page);
        }
        let sum: usize = pages.iter().map(|p| p.sections.len()).sum();
        prop_assert!(sum <= total);
    }
}
