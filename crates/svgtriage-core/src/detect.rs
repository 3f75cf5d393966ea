//! Detects which registry features an SVG test input exercises.
//!
//! Detection runs in two passes. The structural pass walks the parsed XML tree and checks
//! element names and text-positioning attributes; the lexical pass searches the raw source for
//! CSS property names. If the source is not well-formed XML only the lexical pass runs.

use crate::features::{Feature, FeatureRegistry};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Elements that are features in their own right.
const ELEMENT_PROBES: &[(&str, &str)] = &[("tspan", "tspan"), ("textPath", "textPath")];

/// Elements whose positioning attributes are inspected.
const TEXT_BEARING_ELEMENTS: &[&str] = &["text", "tspan"];

struct AttributeProbe {
    attribute: &'static str,
    feature: &'static str,
    matches: fn(&str) -> bool,
}

const ATTRIBUTE_PROBES: &[AttributeProbe] = &[
    AttributeProbe {
        attribute: "x",
        feature: "multiple_x_values",
        matches: is_value_list,
    },
    AttributeProbe {
        attribute: "y",
        feature: "multiple_y_values",
        matches: is_value_list,
    },
    AttributeProbe {
        attribute: "dx",
        feature: "dx_attribute",
        matches: is_present,
    },
    AttributeProbe {
        attribute: "dy",
        feature: "dy_attribute",
        matches: is_present,
    },
    AttributeProbe {
        attribute: "rotate",
        feature: "rotate_attribute",
        matches: is_present,
    },
    AttributeProbe {
        attribute: "textLength",
        feature: "textLength",
        matches: is_present,
    },
    AttributeProbe {
        attribute: "text-anchor",
        feature: "text-anchor",
        matches: is_non_default_anchor,
    },
];

struct LexicalProbe {
    needles: &'static [&'static str],
    feature: &'static str,
    /// Only count `<needle>:`, for names that also show up as attribute values.
    declaration_only: bool,
}

const LEXICAL_PROBES: &[LexicalProbe] = &[
    LexicalProbe {
        needles: &["letter-spacing"],
        feature: "letter-spacing",
        declaration_only: false,
    },
    LexicalProbe {
        needles: &["word-spacing"],
        feature: "word-spacing",
        declaration_only: false,
    },
    LexicalProbe {
        needles: &["text-decoration"],
        feature: "text-decoration",
        declaration_only: false,
    },
    LexicalProbe {
        needles: &["font-weight"],
        feature: "font-weight",
        declaration_only: false,
    },
    LexicalProbe {
        needles: &["font-style"],
        feature: "font-style",
        declaration_only: true,
    },
    LexicalProbe {
        needles: &["font-variant"],
        feature: "font-variant",
        declaration_only: false,
    },
    LexicalProbe {
        needles: &["writing-mode"],
        feature: "writing-mode",
        declaration_only: false,
    },
    LexicalProbe {
        needles: &["baseline-shift"],
        feature: "baseline-shift",
        declaration_only: false,
    },
    LexicalProbe {
        needles: &["alignment-baseline"],
        feature: "alignment-baseline",
        declaration_only: false,
    },
    LexicalProbe {
        needles: &["dominant-baseline"],
        feature: "dominant-baseline",
        declaration_only: false,
    },
    LexicalProbe {
        needles: &["noto color emoji", "noto-color-emoji"],
        feature: "color_emoji",
        declaration_only: false,
    },
];

fn is_present(_: &str) -> bool {
    true
}

fn is_value_list(value: &str) -> bool {
    value
        .trim()
        .contains(|c: char| c.is_whitespace() || c == ',')
}

fn is_non_default_anchor(value: &str) -> bool {
    matches!(value.trim(), "middle" | "end")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    /// Detected features, structural hits first, de-duplicated by name.
    pub features: Vec<Feature>,
    /// Set when the structural pass was skipped because the source is not well-formed XML.
    pub degraded: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureDetector<'a> {
    registry: &'a FeatureRegistry,
}

impl<'a> FeatureDetector<'a> {
    pub fn new(registry: &'a FeatureRegistry) -> Self {
        Self { registry }
    }

    pub fn detect(&self, svg: &str) -> Vec<Feature> {
        self.detect_with_report(svg).features
    }

    pub fn detect_with_report(&self, svg: &str) -> DetectionReport {
        let mut hits: Vec<&'static str> = Vec::new();

        let degraded = match structural_scan(svg, &mut hits) {
            Ok(()) => None,
            Err(err) => {
                tracing::debug!(
                    error = %err,
                    "svg is not well-formed; using lexical detection only"
                );
                Some(err.to_string())
            }
        };
        lexical_scan(svg, &mut hits);

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let features = hits
            .into_iter()
            .filter(|name| seen.insert(*name))
            .filter_map(|name| self.registry.get(name).cloned())
            .collect();

        DetectionReport { features, degraded }
    }
}

fn structural_scan(svg: &str, hits: &mut Vec<&'static str>) -> Result<(), roxmltree::Error> {
    let mut opt = roxmltree::ParsingOptions::default();
    opt.allow_dtd = true;
    let doc = roxmltree::Document::parse_with_options(svg, opt)?;

    for node in doc.descendants().filter(|n| n.is_element()) {
        let tag = node.tag_name().name();

        for &(element, feature) in ELEMENT_PROBES {
            if tag == element {
                hits.push(feature);
            }
        }

        if !TEXT_BEARING_ELEMENTS.contains(&tag) {
            continue;
        }
        for probe in ATTRIBUTE_PROBES {
            if node
                .attribute(probe.attribute)
                .is_some_and(|v| (probe.matches)(v))
            {
                hits.push(probe.feature);
            }
        }
    }
    Ok(())
}

fn lexical_scan(svg: &str, hits: &mut Vec<&'static str>) {
    let lower = svg.to_lowercase();
    for probe in LEXICAL_PROBES {
        let found = probe.needles.iter().any(|needle| {
            if probe.declaration_only {
                lower.contains(&format!("{needle}:"))
            } else {
                lower.contains(needle)
            }
        });
        if found {
            hits.push(probe.feature);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(features: &[Feature]) -> Vec<&str> {
        features.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn structural_hits_precede_lexical_hits() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <text x="20" y="100" style="letter-spacing: 5px">Text <tspan>span</tspan></text>
</svg>"#;
        let detected = FeatureDetector::new(&registry).detect(svg);
        assert_eq!(names(&detected), ["tspan", "letter-spacing"]);
    }

    #[test]
    fn attribute_probes_follow_document_order() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <text x="10 20 30" dy="5" text-anchor="middle">abc</text>
  <text x="10" rotate="15" text-anchor="start" textLength="100">abc</text>
</svg>"#;
        let detected = FeatureDetector::new(&registry).detect(svg);
        assert_eq!(
            names(&detected),
            [
                "multiple_x_values",
                "dy_attribute",
                "text-anchor",
                "rotate_attribute",
                "textLength"
            ]
        );
    }

    #[test]
    fn comma_separated_coordinates_count_as_a_list() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><text y="10,20">ab</text></svg>"#;
        let detected = FeatureDetector::new(&registry).detect(svg);
        assert_eq!(names(&detected), ["multiple_y_values"]);
    }

    #[test]
    fn positioning_attributes_outside_text_are_ignored() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect x="1 2" dx="3" width="4" height="5"/></svg>"#;
        assert!(FeatureDetector::new(&registry).detect(svg).is_empty());
    }

    #[test]
    fn font_style_requires_a_declaration() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let detector = FeatureDetector::new(&registry);
        let attr_only = r#"<svg xmlns="http://www.w3.org/2000/svg"><text font-style="italic">a</text></svg>"#;
        assert!(detector.detect(attr_only).is_empty());

        let declared = r#"<svg xmlns="http://www.w3.org/2000/svg"><text style="FONT-STYLE:italic">a</text></svg>"#;
        assert_eq!(names(&detector.detect(declared)), ["font-style"]);
    }

    #[test]
    fn malformed_xml_degrades_to_lexical_scan() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let svg = r#"<svg><text style="word-spacing: 4px"><tspan>unclosed</text>"#;
        let report = FeatureDetector::new(&registry).detect_with_report(svg);
        assert!(report.degraded.is_some());
        assert_eq!(names(&report.features), ["word-spacing"]);
    }

    #[test]
    fn repeated_features_are_reported_once() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <text dx="1"><tspan dx="2">a</tspan><tspan>b</tspan></text>
</svg>"#;
        let detected = FeatureDetector::new(&registry).detect(svg);
        assert_eq!(names(&detected), ["dx_attribute", "tspan"]);
    }

    #[test]
    fn detection_is_idempotent() {
        let registry = FeatureRegistry::resvg_text_defaults();
        let detector = FeatureDetector::new(&registry);
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg">
  <text font-family="Noto Color Emoji" style="writing-mode: tb">
    <textPath href="#p">a</textPath>
  </text>
</svg>"##;
        let first = detector.detect(svg);
        assert_eq!(first, detector.detect(svg));
        assert_eq!(names(&first), ["textPath", "writing-mode", "color_emoji"]);
    }

    #[test]
    fn features_missing_from_the_registry_are_not_reported() {
        let registry = FeatureRegistry::new()
            .with_feature(Feature::new(
                "letter-spacing",
                crate::FeatureCategory::Styling,
                "custom",
            ))
            .unwrap();
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><text letter-spacing="2"><tspan>a</tspan></text></svg>"#;
        let detected = FeatureDetector::new(&registry).detect(svg);
        assert_eq!(names(&detected), ["letter-spacing"]);
        assert_eq!(detected[0].description, "custom");
    }
}
