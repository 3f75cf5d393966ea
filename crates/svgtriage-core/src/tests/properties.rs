use crate::*;

fn categorizer_fixture() -> (FeatureRegistry, TriageOptions) {
    (FeatureRegistry::resvg_text_defaults(), TriageOptions::default())
}

#[test]
fn small_diffs_are_threshold_needed_whatever_the_features() {
    let (registry, options) = categorizer_fixture();
    let categorizer = Categorizer::new(&registry, &options);
    let feature_sets: Vec<Vec<Feature>> = vec![
        Vec::new(),
        registry.iter().take(1).cloned().collect(),
        registry.iter().cloned().collect(),
    ];
    for diff in 0..=100 {
        for features in &feature_sets {
            let c = categorizer.classify(diff, features.clone());
            assert_eq!(c.category, FailureCategory::ThresholdNeeded, "diff={diff}");
            assert_eq!(c.severity, Severity::Minor);
        }
    }
}

#[test]
fn severity_boundaries_match_the_table() {
    let (registry, options) = categorizer_fixture();
    let categorizer = Categorizer::new(&registry, &options);
    let cases = [
        (499, Severity::Minor),
        (500, Severity::Moderate),
        (4999, Severity::Moderate),
        (5000, Severity::Major),
        (u64::MAX, Severity::Major),
    ];
    for (diff, expected) in cases {
        assert_eq!(categorizer.severity(diff), expected, "diff={diff}");
    }
}

#[test]
fn detection_is_idempotent() {
    let registry = FeatureRegistry::resvg_text_defaults();
    let detector = FeatureDetector::new(&registry);
    let inputs = [
        r#"<svg xmlns="http://www.w3.org/2000/svg"><text rotate="5" writing-mode="tb">a<tspan dy="3">b</tspan></text></svg>"#,
        "<svg><text style='font-weight: bold; font-style: italic'>unclosed",
        "",
    ];
    for svg in inputs {
        assert_eq!(detector.detect_with_report(svg), detector.detect_with_report(svg));
    }
}

#[test]
fn duplicate_skip_entries_keep_the_last_reason() {
    let registry = SkipRegistry::parse(
        r#"
  {"e-text-010.svg", Params::Skip()},  // Not impl: `font-variant`
  {"e-text-011.svg", Params::Skip()},  // Bug: Rendering issue
  {"e-text-010.svg", Params::Skip()},  // Not impl: <textPath>
"#,
    );
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("e-text-010.svg"), Some("Not impl: <textPath>"));
}

#[test]
fn ranking_confidence_is_clamped() {
    let paths = [
        "",
        "/",
        "test",
        "tests/text/test_text_layout_tests.cc",
        "donner/svg/components/text/TextComponent.h",
        "LETTER-SPACING/letter_spacing_component.hpp",
    ];
    for feature in ["", "letter-spacing", "tspan", "dx_attribute"] {
        for ranked in rank_files(&paths, feature) {
            assert!(
                (0.0..=1.0).contains(&ranked.confidence),
                "{feature}: {ranked:?}"
            );
        }
    }
    assert_eq!(rank_files(&[""], "tspan")[0].confidence, 0.0);
}
