use crate::*;
use serde_json::json;

const TWO_TEST_RUN: &str = "\
[==========] Running 2 tests from 1 test suite.
[ RUN      ] ResvgTest/e_text_002
[  COMPARE ] e-text-002.svg: FAIL (1234 pixels differ, with 100 max)
Actual rendering: /tmp/e-text-002.png
Expected: resvg-test-suite/png/e-text-002.png
Diff: /tmp/diff_e-text-002.png
[  FAILED  ] ResvgTest/e_text_002 (12 ms)
[ RUN      ] ResvgTest/e_text_003
[  COMPARE ] e-text-003.svg: PASS (12 pixels differ, out of 100 max)
[       OK ] ResvgTest/e_text_003 (8 ms)
[==========] 2 tests from 1 test suite ran. (20 ms total)
[  PASSED  ] 1 test.
[  FAILED  ] 1 test, listed below:
[  FAILED  ] ResvgTest/e_text_002
";

#[test]
fn one_failing_one_passing_transcript() {
    let parsed = parse_transcript(TWO_TEST_RUN);
    assert_eq!(
        parsed.summary,
        TestSummary {
            total: 2,
            passed: 1,
            failed: 1,
            skipped: 0,
            completion_rate: 0.5,
        }
    );
    assert_eq!(
        parsed.results[0],
        TestResult {
            test_name: "e-text-002.svg".to_string(),
            status: TestStatus::Failed,
            pixel_diff: Some(1234),
            category_prefix: Some("e-text".to_string()),
        }
    );
    assert_eq!(parsed.results[1].pixel_diff, None);
    assert!(parsed.warnings.is_empty());
    assert!(parsed.artifacts["e-text-002.svg"].is_complete());
}

#[test]
fn interrupted_run_drops_the_unfinished_test() {
    let text = "\
[ RUN      ] ResvgTest/e_text_001
[       OK ] ResvgTest/e_text_001
[ RUN      ] ResvgTest/e_text_002
[  COMPARE ] e-text-002.svg: FAIL (400 pixels differ, with 100 max)
";
    let parsed = parse_transcript(text);
    assert_eq!(parsed.results.len(), 1);
    assert_eq!(parsed.summary.completion_rate, 1.0);
    assert_eq!(
        serde_json::to_value(&parsed.warnings).unwrap(),
        json!([{ "kind": "unterminated_test", "test_name": "e-text-002.svg", "line": 3 }])
    );
}

#[test]
fn skip_registry_drives_next_priority_feature() {
    let registry = SkipRegistry::parse(
        r#"
static const TestParams kSkips[] = {
  {"e-text-002.svg", Params::Skip()},  // Not impl: dx attribute
  {"e-text-005.svg", Params::Skip()},  // Not impl: dx attribute
  {"e-text-009.svg", Params::Skip()},  // Not impl: `letter-spacing`
};
"#,
    );
    let missing = identify_missing_features(&registry, None);
    assert_eq!(missing["dx attribute"], ["e-text-002.svg", "e-text-005.svg"]);
    assert_eq!(missing["letter-spacing"], ["e-text-009.svg"]);

    let next = next_priority_feature(&missing).unwrap();
    assert_eq!(
        next,
        PriorityFeature {
            feature: "dx attribute".to_string(),
            test_count: 2,
        }
    );
}

#[test]
fn tspan_and_letter_spacing_are_detected_in_order() {
    let registry = FeatureRegistry::resvg_text_defaults();
    let svg = r#"<svg id="svg1" viewBox="0 0 200 200" xmlns="http://www.w3.org/2000/svg">
    <text x="30" y="100" font-size="32" style="letter-spacing: 4px">
        Te<tspan fill="green">x</tspan>t
    </text>
</svg>"#;
    let detector = FeatureDetector::new(&registry);
    let names: Vec<String> = detector.detect(svg).into_iter().map(|f| f.name).collect();
    assert_eq!(names, ["tspan", "letter-spacing"]);
}

#[test]
fn detected_features_flow_into_the_skip_line() {
    let registry = FeatureRegistry::resvg_text_defaults();
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><text x="1" dx="5 5">ab</text></svg>"#;
    let features = FeatureDetector::new(&registry).detect(svg);
    let options = TriageOptions::default();
    let classification = Categorizer::new(&registry, &options).classify(2400, features);

    assert_eq!(classification.category, FailureCategory::NotImplemented);
    assert_eq!(classification.severity, Severity::Moderate);
    assert_eq!(
        format_skip_entry("e-text-020.svg", &classification.suggested_skip_comment),
        r#"{"e-text-020.svg", Params::Skip()},  // Not impl: `dx` attribute"#
    );
}

#[test]
fn category_reports_from_a_transcript() {
    let parsed = parse_transcript(TWO_TEST_RUN);
    let reports = group_by_category(&parsed.results);
    assert_eq!(reports.len(), 1);
    let report = &reports["e-text"];
    assert_eq!(report.total, 2);
    assert_eq!(report.failing, 1);
    assert_eq!(report.test_results[0].test_name, "e-text-002.svg");
}
