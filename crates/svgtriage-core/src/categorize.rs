//! Maps a pixel diff plus detected features to a [`FailureClassification`].

use crate::features::{Feature, FeatureCategory, FeatureRegistry};
use crate::model::{FailureCategory, FailureClassification, Severity};
use crate::options::{CategoryThresholds, SeverityThresholds, TriageOptions};

pub const THRESHOLD_COMMENT: &str = "Larger threshold due to anti-aliasing artifacts";
pub const FONT_DIFFERENCE_COMMENT: &str =
    "Expected font rendering difference (CoreText vs FreeType)";
pub const BUG_COMMENT: &str = "Bug: Rendering issue";

#[derive(Debug, Clone, Copy)]
pub struct Categorizer<'a> {
    registry: &'a FeatureRegistry,
    severity: SeverityThresholds,
    category: CategoryThresholds,
}

impl<'a> Categorizer<'a> {
    pub fn new(registry: &'a FeatureRegistry, options: &TriageOptions) -> Self {
        Self {
            registry,
            severity: options.severity,
            category: options.category,
        }
    }

    pub fn severity(&self, pixel_diff: u64) -> Severity {
        if pixel_diff < self.severity.moderate_from {
            Severity::Minor
        } else if pixel_diff < self.severity.major_from {
            Severity::Moderate
        } else {
            Severity::Major
        }
    }

    /// Small diffs are noise first; feature presence only matters above the noise floor.
    pub fn category(&self, pixel_diff: u64, features: &[Feature]) -> FailureCategory {
        if pixel_diff <= self.category.noise_max {
            FailureCategory::ThresholdNeeded
        } else if !features.is_empty() {
            FailureCategory::NotImplemented
        } else if pixel_diff < self.category.font_difference_below {
            FailureCategory::FontDifference
        } else {
            FailureCategory::Bug
        }
    }

    pub fn classify(&self, pixel_diff: u64, features: Vec<Feature>) -> FailureClassification {
        let category = self.category(pixel_diff, &features);
        let severity = self.severity(pixel_diff);
        let suggested_skip_comment = skip_comment(category, &features);
        tracing::debug!(pixel_diff, %category, ?severity, "classified failure");
        FailureClassification {
            category,
            severity,
            features,
            suggested_skip_comment,
        }
    }

    /// Resolves feature names against the registry, returning the known features in input
    /// order and the names the registry does not know.
    pub fn resolve_features<S: AsRef<str>>(&self, names: &[S]) -> (Vec<Feature>, Vec<String>) {
        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for name in names {
            let name = name.as_ref();
            match self.registry.get(name) {
                Some(feature) => known.push(feature.clone()),
                None => unknown.push(name.to_string()),
            }
        }
        (known, unknown)
    }
}

/// Reason text for a skip-registry entry.
///
/// Only `not_implemented` gets feature-specific phrasing, derived from the first feature;
/// the detector reports the most specific feature first.
pub fn skip_comment(category: FailureCategory, features: &[Feature]) -> String {
    match category {
        FailureCategory::NotImplemented => match features.first() {
            Some(feature) => not_implemented_comment(feature),
            None => BUG_COMMENT.to_string(),
        },
        FailureCategory::ThresholdNeeded => THRESHOLD_COMMENT.to_string(),
        FailureCategory::FontDifference => FONT_DIFFERENCE_COMMENT.to_string(),
        FailureCategory::Bug => BUG_COMMENT.to_string(),
    }
}

fn not_implemented_comment(feature: &Feature) -> String {
    match feature.category {
        FeatureCategory::Element => format!("Not impl: <{}>", feature.name),
        FeatureCategory::Positioning => {
            let phrase = feature.name.replace('_', " ").replace(" attribute", "");
            if phrase.contains("multiple") {
                format!("Not impl: {}", capitalize(&phrase))
            } else {
                format!("Not impl: `{phrase}` attribute")
            }
        }
        FeatureCategory::Styling => format!("Not impl: `{}`", feature.name.replace('_', "-")),
        FeatureCategory::Text => format!("Not impl: {}", feature.description),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(name: &str) -> Feature {
        FeatureRegistry::resvg_text_defaults()
            .get(name)
            .cloned()
            .unwrap()
    }

    #[test]
    fn noise_floor_wins_over_features() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let c = Categorizer::new(&registry, &TriageOptions::default());
        let features = vec![feature("tspan")];
        for diff in [0, 1, 50, 100] {
            assert_eq!(c.category(diff, &features), FailureCategory::ThresholdNeeded);
        }
        assert_eq!(c.category(101, &features), FailureCategory::NotImplemented);
    }

    #[test]
    fn feature_free_diffs_split_at_one_thousand() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let c = Categorizer::new(&registry, &TriageOptions::default());
        assert_eq!(c.category(101, &[]), FailureCategory::FontDifference);
        assert_eq!(c.category(999, &[]), FailureCategory::FontDifference);
        assert_eq!(c.category(1000, &[]), FailureCategory::Bug);
    }

    #[test]
    fn severity_boundaries() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let c = Categorizer::new(&registry, &TriageOptions::default());
        assert_eq!(c.severity(0), Severity::Minor);
        assert_eq!(c.severity(499), Severity::Minor);
        assert_eq!(c.severity(500), Severity::Moderate);
        assert_eq!(c.severity(4999), Severity::Moderate);
        assert_eq!(c.severity(5000), Severity::Major);
    }

    #[test]
    fn severity_is_monotonic() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let c = Categorizer::new(&registry, &TriageOptions::default());
        let mut prev = Severity::Minor;
        for diff in (0..12_000).step_by(7) {
            let s = c.severity(diff);
            assert!(s >= prev, "severity dropped at {diff}");
            prev = s;
        }
    }

    #[test]
    fn skip_comments_per_feature_category() {
        let nyi = FailureCategory::NotImplemented;
        assert_eq!(skip_comment(nyi, &[feature("tspan")]), "Not impl: <tspan>");
        assert_eq!(
            skip_comment(nyi, &[feature("dx_attribute")]),
            "Not impl: `dx` attribute"
        );
        assert_eq!(
            skip_comment(nyi, &[feature("multiple_x_values")]),
            "Not impl: Multiple x values"
        );
        assert_eq!(
            skip_comment(nyi, &[feature("letter-spacing")]),
            "Not impl: `letter-spacing`"
        );
        assert_eq!(
            skip_comment(nyi, &[feature("color_emoji")]),
            "Not impl: Color emoji font (Noto Color Emoji)"
        );
    }

    #[test]
    fn only_the_first_feature_drives_the_comment() {
        let comment = skip_comment(
            FailureCategory::NotImplemented,
            &[feature("rotate_attribute"), feature("tspan")],
        );
        assert_eq!(comment, "Not impl: `rotate` attribute");
    }

    #[test]
    fn canned_comments_for_other_categories() {
        let features = [feature("tspan")];
        assert_eq!(
            skip_comment(FailureCategory::ThresholdNeeded, &features),
            THRESHOLD_COMMENT
        );
        assert_eq!(
            skip_comment(FailureCategory::FontDifference, &[]),
            FONT_DIFFERENCE_COMMENT
        );
        assert_eq!(skip_comment(FailureCategory::Bug, &[]), BUG_COMMENT);
    }

    #[test]
    fn resolve_features_reports_unknown_names() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let c = Categorizer::new(&registry, &TriageOptions::default());
        let (known, unknown) = c.resolve_features(&["tspan", "marquee", "dy_attribute"]);
        let names: Vec<&str> = known.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["tspan", "dy_attribute"]);
        assert_eq!(unknown, ["marquee"]);
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let mut options = TriageOptions::default();
        options.category.noise_max = 10;
        options.severity.moderate_from = 50;
        let c = Categorizer::new(&registry, &options);
        let classification = c.classify(60, Vec::new());
        assert_eq!(classification.category, FailureCategory::FontDifference);
        assert_eq!(classification.severity, Severity::Moderate);
        assert_eq!(classification.suggested_skip_comment, FONT_DIFFERENCE_COMMENT);
    }
}
