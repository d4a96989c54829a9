//! Layout-hint vocabulary normalization.
//!
//! Planners describe layouts with many synonyms. Each table maps a set of
//! spellings onto one closed enum value; unrecognized spellings take the safe
//! default for that dimension.

use crate::types::{Align, Density, ListStyle, Media, RawLayoutHint, Structure};

type Vocab<T> = &'static [(&'static [&'static str], T)];

const STRUCTURE_VOCAB: Vocab<Structure> = &[
    (
        &["single", "one-column", "single-column", "centered", "full", "full-width", "fullwidth", "hero"],
        Structure::Single,
    ),
    (
        &[
            "split", "two-column", "2-column", "two-col", "2-col", "side-by-side", "50-50", "half",
            "media-left", "media-right", "asymmetric",
        ],
        Structure::Split,
    ),
    (
        &[
            "grid", "masonry", "bento", "cards", "columns", "three-column", "3-column", "four-column",
            "4-column", "mosaic", "tiles", "matrix",
        ],
        Structure::Grid,
    ),
    (
        &["carousel", "slider", "slideshow", "marquee", "scroller", "horizontal-scroll", "tabs"],
        Structure::Carousel,
    ),
    (
        &["stacked", "stack", "vertical", "list", "rows", "timeline", "accordion"],
        Structure::Stacked,
    ),
];

const DENSITY_VOCAB: Vocab<Density> = &[
    (&["compact", "tight", "dense", "condensed", "small", "minimal"], Density::Compact),
    (&["normal", "regular", "default", "medium", "balanced", "comfortable", "standard"], Density::Normal),
    (&["airy", "spacious", "loose", "relaxed", "generous", "roomy", "large", "open"], Density::Airy),
];

const ALIGN_VOCAB: Vocab<Align> = &[
    (&["start", "left", "leading", "flex-start", "top"], Align::Start),
    (&["center", "centre", "centered", "centred", "middle"], Align::Center),
    (&["end", "right", "trailing", "flex-end", "bottom"], Align::End),
];

const MEDIA_VOCAB: Vocab<Media> = &[
    (&["none", "no-media", "text", "text-only", "typography"], Media::None),
    (
        &["image", "images", "photo", "photos", "photography", "picture", "imagery", "screenshot", "screenshots"],
        Media::Image,
    ),
    (&["video", "videos", "film", "clip", "reel"], Media::Video),
    (
        &["illustration", "illustrations", "graphic", "graphics", "icon", "icons", "svg", "3d", "diagram"],
        Media::Illustration,
    ),
];

const LIST_VOCAB: Vocab<ListStyle> = &[
    (&["cards", "card", "card-grid", "panels"], ListStyle::Cards),
    (&["tiles", "tile", "bento", "mosaic"], ListStyle::Tiles),
    (&["rows", "row", "list", "table", "accordion", "stacked"], ListStyle::Rows),
    (&["bullets", "bullet", "checklist", "icon-list", "icons-list"], ListStyle::Bullets),
];

/// Canonical spelling: lowercase, `-` separated.
fn canonical(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '/')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn lookup<T: Copy>(vocab: Vocab<T>, raw: &str) -> Option<T> {
    let key = canonical(raw);
    vocab
        .iter()
        .find(|(spellings, _)| spellings.contains(&key.as_str()))
        .map(|(_, value)| *value)
}

pub fn parse_structure(raw: &str) -> Option<Structure> {
    lookup(STRUCTURE_VOCAB, raw)
}

pub fn parse_density(raw: &str) -> Option<Density> {
    lookup(DENSITY_VOCAB, raw)
}

pub fn parse_align(raw: &str) -> Option<Align> {
    lookup(ALIGN_VOCAB, raw)
}

pub fn parse_media(raw: &str) -> Option<Media> {
    lookup(MEDIA_VOCAB, raw)
}

pub fn parse_list(raw: &str) -> Option<ListStyle> {
    lookup(LIST_VOCAB, raw)
}

/// A raw hint mapped into the closed vocabulary. `None` means the planner said
/// nothing for that dimension; an unrecognized value becomes the safe default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialHint {
    pub structure: Option<Structure>,
    pub density: Option<Density>,
    pub align: Option<Align>,
    pub media: Option<Media>,
    pub list: Option<ListStyle>,
    pub preset: Option<String>,
    /// Raw structure spelling, kept for semantic upgrades ("bento")
    pub structure_raw: Option<String>,
}

impl PartialHint {
    pub fn from_raw(raw: Option<&RawLayoutHint>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        Self {
            structure: raw
                .structure
                .as_deref()
                .map(|s| parse_structure(s).unwrap_or(Structure::Single)),
            density: raw
                .density
                .as_deref()
                .map(|s| parse_density(s).unwrap_or(Density::Normal)),
            align: raw
                .align
                .as_deref()
                .map(|s| parse_align(s).unwrap_or(Align::Start)),
            media: raw
                .media
                .as_deref()
                .map(|s| parse_media(s).unwrap_or(Media::None)),
            list: raw.list.as_deref().and_then(parse_list),
            preset: raw.composition_preset.clone(),
            structure_raw: raw.structure.as_deref().map(canonical),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonyms_collapse() {
        assert_eq!(parse_structure("Masonry"), Some(Structure::Grid));
        assert_eq!(parse_structure("bento"), Some(Structure::Grid));
        assert_eq!(parse_structure("Two Column"), Some(Structure::Split));
        assert_eq!(parse_structure("two_column"), Some(Structure::Split));
        assert_eq!(parse_structure("slider"), Some(Structure::Carousel));
        assert_eq!(parse_align("left"), Some(Align::Start));
        assert_eq!(parse_align("Centre"), Some(Align::Center));
        assert_eq!(parse_density("spacious"), Some(Density::Airy));
        assert_eq!(parse_media("photos"), Some(Media::Image));
        assert_eq!(parse_list("checklist"), Some(ListStyle::Bullets));
    }

    #[test]
    fn test_unrecognized_values_take_safe_defaults() {
        let raw = RawLayoutHint {
            structure: Some("zigzag-spiral".into()),
            density: Some("???".into()),
            align: Some("diagonal".into()),
            media: Some("hologram".into()),
            list: Some("pyramid".into()),
            composition_preset: None,
        };
        let hint = PartialHint::from_raw(Some(&raw));
        assert_eq!(hint.structure, Some(Structure::Single));
        assert_eq!(hint.density, Some(Density::Normal));
        assert_eq!(hint.align, Some(Align::Start));
        assert_eq!(hint.media, Some(Media::None));
        assert_eq!(hint.list, None);
    }

    #[test]
    fn test_missing_hint_is_empty() {
        assert_eq!(PartialHint::from_raw(None), PartialHint::default());
    }
}
