//! Catalog of detectable SVG/CSS features.
//!
//! The registry is a plain value: build it once (usually via
//! [`FeatureRegistry::resvg_text_defaults`]) and hand references to the detector and the
//! categorizer.

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Text,
    Styling,
    Positioning,
    Element,
}

impl FeatureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureCategory::Text => "text",
            FeatureCategory::Styling => "styling",
            FeatureCategory::Positioning => "positioning",
            FeatureCategory::Element => "element",
        }
    }
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub category: FeatureCategory,
    pub description: String,
}

impl Feature {
    pub fn new(
        name: impl Into<String>,
        category: FeatureCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            description: description.into(),
        }
    }
}

/// Built-in text features, in registration order.
const RESVG_TEXT_FEATURES: &[(&str, FeatureCategory, &str)] = &[
    // Text positioning
    (
        "multiple_x_values",
        FeatureCategory::Positioning,
        "Multiple x values for per-glyph positioning",
    ),
    (
        "multiple_y_values",
        FeatureCategory::Positioning,
        "Multiple y values for per-glyph positioning",
    ),
    (
        "dx_attribute",
        FeatureCategory::Positioning,
        "dx attribute for relative positioning",
    ),
    (
        "dy_attribute",
        FeatureCategory::Positioning,
        "dy attribute for relative positioning",
    ),
    (
        "rotate_attribute",
        FeatureCategory::Positioning,
        "rotate attribute for glyph rotation",
    ),
    (
        "textLength",
        FeatureCategory::Text,
        "textLength attribute for text stretching",
    ),
    // Text elements
    (
        "tspan",
        FeatureCategory::Element,
        "<tspan> element for inline text spans",
    ),
    (
        "textPath",
        FeatureCategory::Element,
        "<textPath> element for text on paths",
    ),
    // Text styling
    (
        "text-anchor",
        FeatureCategory::Styling,
        "text-anchor attribute for alignment",
    ),
    (
        "letter-spacing",
        FeatureCategory::Styling,
        "letter-spacing attribute",
    ),
    ("word-spacing", FeatureCategory::Styling, "word-spacing attribute"),
    (
        "text-decoration",
        FeatureCategory::Styling,
        "text-decoration attribute",
    ),
    ("font-weight", FeatureCategory::Styling, "font-weight attribute"),
    ("font-style", FeatureCategory::Styling, "font-style attribute"),
    ("font-variant", FeatureCategory::Styling, "font-variant attribute"),
    // Text layout
    (
        "writing-mode",
        FeatureCategory::Text,
        "writing-mode attribute for vertical text",
    ),
    (
        "baseline-shift",
        FeatureCategory::Text,
        "baseline-shift attribute",
    ),
    (
        "alignment-baseline",
        FeatureCategory::Text,
        "alignment-baseline attribute",
    ),
    (
        "dominant-baseline",
        FeatureCategory::Text,
        "dominant-baseline attribute",
    ),
    (
        "color_emoji",
        FeatureCategory::Text,
        "Color emoji font (Noto Color Emoji)",
    ),
];

/// Immutable-after-construction set of features keyed by unique name.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: IndexMap<String, Feature>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The text-rendering features exercised by the resvg conformance suite.
    pub fn resvg_text_defaults() -> Self {
        let features = RESVG_TEXT_FEATURES
            .iter()
            .map(|&(name, category, description)| {
                (name.to_string(), Feature::new(name, category, description))
            })
            .collect();
        Self { features }
    }

    /// Adds a feature. Names are unique; re-registering a name is an error.
    pub fn register(&mut self, feature: Feature) -> Result<()> {
        if self.features.contains_key(&feature.name) {
            return Err(Error::DuplicateFeature { name: feature.name });
        }
        self.features.insert(feature.name.clone(), feature);
        Ok(())
    }

    pub fn with_feature(mut self, feature: Feature) -> Result<Self> {
        self.register(feature)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> + '_ {
        self.features.values()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_unique_names() {
        let registry = FeatureRegistry::resvg_text_defaults();
        assert_eq!(registry.len(), RESVG_TEXT_FEATURES.len());
        assert_eq!(
            registry.get("tspan").map(|f| f.category),
            Some(FeatureCategory::Element)
        );
    }

    #[test]
    fn registering_a_duplicate_name_fails() {
        let mut registry = FeatureRegistry::resvg_text_defaults();
        let err = registry
            .register(Feature::new("tspan", FeatureCategory::Element, "again"))
            .unwrap_err();
        assert_eq!(err.to_string(), "duplicate feature in registry: tspan");
        assert_eq!(
            registry.get("tspan").unwrap().description,
            "<tspan> element for inline text spans"
        );
    }

    #[test]
    fn custom_registry_keeps_registration_order() {
        let registry = FeatureRegistry::new()
            .with_feature(Feature::new("b", FeatureCategory::Text, "B"))
            .and_then(|r| r.with_feature(Feature::new("a", FeatureCategory::Text, "A")))
            .unwrap();
        let names: Vec<&str> = registry.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }
}
