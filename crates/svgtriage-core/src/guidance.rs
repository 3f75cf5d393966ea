//! Implementation guidance: where to look and what to search for when implementing a
//! missing feature.

use crate::features::{FeatureCategory, FeatureRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceCategory {
    TextStyling,
    TextPositioning,
    TextElements,
    TextLayout,
}

impl GuidanceCategory {
    pub const ALL: [GuidanceCategory; 4] = [
        GuidanceCategory::TextStyling,
        GuidanceCategory::TextPositioning,
        GuidanceCategory::TextElements,
        GuidanceCategory::TextLayout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GuidanceCategory::TextStyling => "text_styling",
            GuidanceCategory::TextPositioning => "text_positioning",
            GuidanceCategory::TextElements => "text_elements",
            GuidanceCategory::TextLayout => "text_layout",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GuidanceCategory::TextStyling => {
                "Text styling properties (font-weight, letter-spacing, etc.)"
            }
            GuidanceCategory::TextPositioning => {
                "Text positioning attributes (x, y, dx, dy, rotate)"
            }
            GuidanceCategory::TextElements => "Text element types (tspan, textPath)",
            GuidanceCategory::TextLayout => "Text layout properties (writing-mode, baseline-shift)",
        }
    }

    /// Glob patterns for files likely to be touched by a feature of this category.
    pub fn file_patterns(self) -> &'static [&'static str] {
        match self {
            GuidanceCategory::TextStyling => &[
                "**/ComputedTextStyleComponent.h",
                "**/SVGTextElement.h",
                "**/svg/properties/PresentationAttribute.h",
            ],
            GuidanceCategory::TextPositioning => &[
                "**/SVGTextElement.h",
                "**/SVGTextPositioningElement.h",
                "**/text/*.cc",
            ],
            GuidanceCategory::TextElements => &[
                "**/SVGTSpanElement.h",
                "**/SVGTextPathElement.h",
                "**/svg/components/text/*.h",
            ],
            GuidanceCategory::TextLayout => &[
                "**/SVGTextElement.h",
                "**/text/*.cc",
                "**/ComputedTextStyleComponent.h",
            ],
        }
    }

    fn hints(self) -> &'static [&'static str] {
        match self {
            GuidanceCategory::TextStyling => &[
                "Text styling properties are typically CSS properties that need to be parsed and applied.",
                "Check PresentationAttribute.h for existing property definitions.",
                "Look for similar properties like font-size or font-family as examples.",
            ],
            GuidanceCategory::TextPositioning => &[
                "Positioning attributes often involve parsing space-separated number lists.",
                "Check how existing attributes like 'x' and 'y' are handled in SVGTextElement.",
                "May need to update text layout code to apply positioning values.",
            ],
            GuidanceCategory::TextElements => &[
                "New elements require a class definition (e.g., SVGTSpanElement).",
                "Elements need to be registered in the SVG element factory.",
                "Check existing text elements for implementation patterns.",
            ],
            GuidanceCategory::TextLayout => &[
                "Layout properties often affect how text is measured and positioned.",
                "May require changes to text rendering pipeline.",
                "Check ComputedTextStyleComponent for text layout state.",
            ],
        }
    }
}

impl From<FeatureCategory> for GuidanceCategory {
    fn from(category: FeatureCategory) -> Self {
        match category {
            FeatureCategory::Styling => GuidanceCategory::TextStyling,
            FeatureCategory::Positioning => GuidanceCategory::TextPositioning,
            FeatureCategory::Element => GuidanceCategory::TextElements,
            FeatureCategory::Text => GuidanceCategory::TextLayout,
        }
    }
}

impl fmt::Display for GuidanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuidanceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| format!("unknown guidance category: {s}"))
    }
}

/// Guidance category for a registry feature, or `None` for unknown names.
pub fn guidance_category_for(
    registry: &FeatureRegistry,
    feature_name: &str,
) -> Option<GuidanceCategory> {
    registry.get(feature_name).map(|f| f.category.into())
}

/// Spellings under which a feature's implementation is likely to appear in source code.
///
/// For `letter-spacing` that is `letter-spacing`, `LetterSpacing` and `letterspacing`;
/// attribute features additionally get their quoted XML name (`"dx"`).
pub fn search_keywords(feature_name: &str) -> Vec<String> {
    let snake = feature_name.trim().replace('-', "_");
    let stem = snake.strip_suffix("_attribute").unwrap_or(&snake);

    let kebab = stem.replace('_', "-");
    let camel: String = stem.split('_').map(upper_first).collect();
    let squashed = snake.replace('_', "").to_lowercase();

    let mut keywords = vec![kebab.clone(), camel, squashed];
    if snake.contains("attribute") {
        keywords.push(format!("\"{kebab}\""));
    }

    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for k in keywords {
        if !k.is_empty() && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Hints keyed by the feature's normalized stem (lowercase, `_attribute` dropped, `-` as `_`).
const FEATURE_HINTS: &[(&str, &[&str])] = &[
    (
        "letter_spacing",
        &[
            "letter-spacing is a CSS property that adds space between characters.",
            "Look at how font-size is implemented as a reference.",
        ],
    ),
    (
        "dx",
        &[
            "dx provides relative positioning offsets for each character.",
            "Similar to x attribute but applies offsets instead of absolute positions.",
        ],
    ),
    (
        "dy",
        &[
            "dy provides vertical offsets for each character.",
            "Works in conjunction with dx for full positional control.",
        ],
    ),
    (
        "textpath",
        &[
            "textPath requires path parsing and text-on-path layout.",
            "Complex feature that may need path position calculation utilities.",
        ],
    ),
];

fn hint_key(feature_name: &str) -> String {
    let snake = feature_name.trim().replace('-', "_").to_lowercase();
    match snake.strip_suffix("_attribute") {
        Some(stem) => stem.to_string(),
        None => snake,
    }
}

/// Category-level hints followed by feature-specific ones.
pub fn implementation_hints(feature_name: &str, category: GuidanceCategory) -> Vec<String> {
    let key = hint_key(feature_name);
    let specific = FEATURE_HINTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, hints)| *hints)
        .unwrap_or_default();

    category
        .hints()
        .iter()
        .chain(specific)
        .map(|h| h.to_string())
        .collect()
}
