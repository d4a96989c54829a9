//! Blueprint Normalizer
//!
//! Turns raw planning output into canonical pages with resolved composition
//! presets and layout hints, bounded by the site limits. Also hosts the
//! deterministic blueprints used when planning fails.

pub mod fallback;
pub mod layout_hint;
pub mod normalize;
pub mod presets;

pub use fallback::{generic_blueprint, reference_profile_blueprint, ReferenceProfile};
pub use normalize::{humanize, normalize_pages, slugify};
pub use presets::{preset_by_id, CompositionPreset, PRESETS};

/// Size limits for one site. Every limit is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteLimits {
    pub max_pages: usize,
    pub max_sections_per_page: usize,
    pub max_sections_total: usize,
}

impl SiteLimits {
    pub fn new(max_pages: usize, max_sections_per_page: usize, max_sections_total: usize) -> Self {
        Self {
            max_pages: max_pages.max(1),
            max_sections_per_page: max_sections_per_page.max(1),
            max_sections_total: max_sections_total.max(1),
        }
    }
}

impl Default for SiteLimits {
    fn default() -> Self {
        Self::new(3, 6, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_are_clamped() {
        let limits = SiteLimits::new(0, 0, 0);
        assert_eq!(limits, SiteLimits::new(1, 1, 1));
    }
}
